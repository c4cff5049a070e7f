//! Small statistics helpers used by the inference engine

/// Population variance (mean squared deviation, divided by N).
///
/// Returns 0 for an empty slice.
pub fn population_variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Sum of every increase between consecutive samples. Decreases are ignored.
pub fn positive_delta_sum(samples: &[f64]) -> f64 {
    samples
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .sum()
}

/// Linear interpolation: `(1 - alpha) * start + alpha * end`
pub fn lerp(start: f64, end: f64, alpha: f64) -> f64 {
    start + (end - start) * alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_of_constant_is_zero() {
        assert_eq!(population_variance(&[2000.0; 20]), 0.0);
    }

    #[test]
    fn test_variance_divides_by_n() {
        // mean 5, squared deviations 9+1+1+9 = 20, /4 = 5
        assert_eq!(population_variance(&[2.0, 4.0, 6.0, 8.0]), 5.0);
    }

    #[test]
    fn test_variance_empty() {
        assert_eq!(population_variance(&[]), 0.0);
    }

    #[test]
    fn test_positive_delta_sum_ignores_decreases() {
        assert_eq!(positive_delta_sum(&[0.0, 10.0, 4.0, 6.0, 0.0]), 12.0);
        assert_eq!(positive_delta_sum(&[5.0]), 0.0);
        assert_eq!(positive_delta_sum(&[9.0, 7.0, 3.0]), 0.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.1), 1.0);
        assert_eq!(lerp(4.0, 4.0, 0.5), 4.0);
        assert_eq!(lerp(1.0, 3.0, 1.0), 3.0);
    }
}
