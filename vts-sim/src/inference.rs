//! Heuristic diagnostics over the simulated telemetry
//!
//! None of this is learned: every score is a fixed threshold rule over the
//! current snapshot and the rolling history.

use crate::stats::{population_variance, positive_delta_sum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{trace, warn};
use vts_core::model::*;
use vts_core::{Channel, History, VehicleState};

/// Starting wear budget in km
pub const INITIAL_RUL_KM: f64 = 15_000.0;

/// Number of most recent RPM samples the variance is taken over
pub const ANOMALY_WINDOW: usize = 20;

/// RPM variance (rpm²) above which a reading is flagged as anomalous
pub const ANOMALY_VARIANCE_THRESHOLD: f64 = 5000.0;

const RUL_WEAR_PER_CALL: f64 = 0.1;
const RUL_LOAD_FACTOR: f64 = 2.0;
const HIGH_FAILURE_COOLANT: f64 = 102.0;
/// NORMAL confidence band is [85, 95); 85 + 10 can round up to 95 in f64
const NORMAL_CONFIDENCE_CEILING: f64 = 95.0 - 95.0 * f64::EPSILON;

const AGGRESSIVE_INSIGHT: &str =
    "Frequent hard throttle inputs detected. Smoother acceleration would reduce engine wear and fuel use.";
const ECO_INSIGHT: &str =
    "Gentle throttle at cruising speed. Driving pattern is close to optimal for fuel economy.";
const ERRATIC_INSIGHT: &str =
    "Engine speed is fluctuating heavily. Check for inconsistent pedal input or gear selection.";
const NORMAL_INSIGHT: &str = "Driving pattern is within normal parameters.";

/// Subsystem health from a single snapshot
pub fn health_scores(state: &VehicleState) -> HealthScores {
    let thermal = 100.0 - (state.coolant.0 - 100.0).max(0.0) * 5.0;

    let mut engine = 100.0;
    if state.rpm.0 > 4500.0 {
        engine -= 5.0;
    }
    if state.load.0 > 90.0 {
        engine -= 2.0;
    }

    let electrical = if state.battery.0 < 12.8 { 90.0 } else { 100.0 };

    let hygiene = (0.4 * thermal + 0.4 * engine + 0.2 * electrical).round() as i64;

    HealthScores {
        thermal,
        engine,
        electrical,
        hygiene,
    }
}

/// Variance of the last [`ANOMALY_WINDOW`] RPM samples
pub fn rpm_variance(history: &History) -> f64 {
    population_variance(&history.recent(Channel::Rpm, ANOMALY_WINDOW))
}

/// 0-100 score summing every throttle increase in the history window
pub fn throttle_aggression(history: &History) -> f64 {
    let throttle = history.channel(Channel::Throttle).to_vec();
    (positive_delta_sum(&throttle) * 2.0).min(100.0)
}

/// Turns a state snapshot and its history into a diagnostic result.
///
/// The only thing carried between calls is the remaining-useful-life
/// counter, so two engines never share wear.
pub struct InferenceEngine<R = StdRng> {
    remaining_km: f64,
    rng: R,
}

impl InferenceEngine<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for InferenceEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> InferenceEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            remaining_km: INITIAL_RUL_KM,
            rng,
        }
    }

    /// Remaining useful life without consuming any
    pub fn remaining_km(&self) -> f64 {
        self.remaining_km
    }

    /// Run every heuristic over `state` and `history`.
    ///
    /// Each call wears the RUL counter down in proportion to engine load.
    pub fn infer(&mut self, state: &VehicleState, history: &History) -> InferenceResult {
        let health = health_scores(state);

        let variance = rpm_variance(history);
        let anomaly = AnomalyReport {
            detected: variance > ANOMALY_VARIANCE_THRESHOLD,
            rpm_variance: variance,
        };
        if anomaly.detected {
            warn!(rpm_variance = variance, "RPM anomaly detected");
        }

        let rul = self.consume_rul(state);
        let driver = self.classify_driver(state, history, variance);

        trace!(
            hygiene = health.hygiene,
            remaining_km = rul.remaining_km,
            style = driver.style.label(),
            "Inference complete"
        );

        InferenceResult {
            health,
            rul,
            anomaly,
            driver,
        }
    }

    fn consume_rul(&mut self, state: &VehicleState) -> RulEstimate {
        let wear = RUL_WEAR_PER_CALL * state.load.as_fraction() * RUL_LOAD_FACTOR;
        // A negative load must never give wear back
        self.remaining_km -= wear.max(0.0);

        let failure_probability = if state.coolant.0 > HIGH_FAILURE_COOLANT {
            FailureProbability::High
        } else {
            FailureProbability::Low
        };

        RulEstimate {
            remaining_km: self.remaining_km,
            failure_probability,
        }
    }

    fn classify_driver(
        &mut self,
        state: &VehicleState,
        history: &History,
        variance: f64,
    ) -> DriverProfile {
        let aggression = throttle_aggression(history);
        let volatility = variance.sqrt() / 100.0;

        let (style, confidence, insight) = if aggression > 60.0 {
            (DriverStyle::Aggressive, 92.0, AGGRESSIVE_INSIGHT)
        } else if aggression < 20.0 && state.speed.0 > 30.0 {
            (DriverStyle::EcoOptimal, 96.0, ECO_INSIGHT)
        } else if volatility > 8.0 {
            (DriverStyle::Erratic, 78.0, ERRATIC_INSIGHT)
        } else {
            let jitter: f64 = self.rng.gen_range(0.0..10.0);
            (
                DriverStyle::Normal,
                (85.0 + jitter).min(NORMAL_CONFIDENCE_CEILING),
                NORMAL_INSIGHT,
            )
        };

        DriverProfile {
            style,
            confidence,
            insight: insight.to_string(),
            throttle_aggression: aggression.round() as i64,
            rpm_volatility: volatility,
            efficiency_score: (100.0 - aggression * 0.6).round() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vts_core::units::*;

    fn state_with(f: impl FnOnce(&mut VehicleState)) -> VehicleState {
        let mut state = VehicleState::initial();
        f(&mut state);
        state
    }

    #[test]
    fn test_health_all_nominal() {
        let health = health_scores(&VehicleState::initial());
        assert_eq!(health.thermal, 100.0);
        assert_eq!(health.engine, 100.0);
        assert_eq!(health.electrical, 100.0);
        assert_eq!(health.hygiene, 100);
    }

    #[test]
    fn test_hot_coolant_scenario() {
        let health = health_scores(&state_with(|s| s.coolant = Celsius(105.0)));
        assert_eq!(health.thermal, 75.0);
        assert_eq!(health.hygiene, 90);
    }

    #[test]
    fn test_thermal_health_is_not_clamped() {
        let health = health_scores(&state_with(|s| s.coolant = Celsius(130.0)));
        assert_eq!(health.thermal, -50.0);
    }

    #[test]
    fn test_engine_penalties_stack() {
        let health = health_scores(&state_with(|s| {
            s.rpm = Rpm(5000.0);
            s.load = Percent(93.0);
        }));
        assert_eq!(health.engine, 93.0);

        let health = health_scores(&state_with(|s| s.rpm = Rpm(4600.0)));
        assert_eq!(health.engine, 95.0);
    }

    #[test]
    fn test_low_battery_penalty() {
        let health = health_scores(&state_with(|s| s.battery = Volts(12.5)));
        assert_eq!(health.electrical, 90.0);
        assert_eq!(health.hygiene, 98);
    }

    #[test]
    fn test_rul_wear_is_proportional_to_load() {
        let mut engine = InferenceEngine::seeded(3);
        let state = state_with(|s| s.load = Percent(50.0));
        let history = History::new(&state);
        let result = engine.infer(&state, &history);
        assert!((result.rul.remaining_km - (INITIAL_RUL_KM - 0.1)).abs() < 1e-9);
        assert_eq!(result.rul.failure_probability, FailureProbability::Low);
    }

    #[test]
    fn test_negative_load_does_not_restore_rul() {
        let mut engine = InferenceEngine::seeded(3);
        let state = state_with(|s| s.load = Percent(-40.0));
        let history = History::new(&VehicleState::initial());
        engine.infer(&state, &history);
        assert_eq!(engine.remaining_km(), INITIAL_RUL_KM);
    }

    #[test]
    fn test_failure_probability_high_when_hot() {
        let mut engine = InferenceEngine::seeded(3);
        let state = state_with(|s| s.coolant = Celsius(102.5));
        let result = engine.infer(&state, &History::new(&state));
        assert_eq!(result.rul.failure_probability, FailureProbability::High);
    }

    #[test]
    fn test_eco_requires_speed() {
        let mut engine = InferenceEngine::seeded(9);
        let cruising = state_with(|s| s.speed = KilometersPerHour(80.0));
        let result = engine.infer(&cruising, &History::new(&cruising));
        assert_eq!(result.driver.style, DriverStyle::EcoOptimal);
        assert_eq!(result.driver.confidence, 96.0);

        let parked = VehicleState::initial();
        let result = engine.infer(&parked, &History::new(&parked));
        assert_eq!(result.driver.style, DriverStyle::Normal);
    }

    #[test]
    fn test_engines_wear_independently() {
        let state = state_with(|s| s.load = Percent(100.0));
        let history = History::new(&state);
        let mut a = InferenceEngine::seeded(1);
        let b = InferenceEngine::seeded(2);
        for _ in 0..10 {
            a.infer(&state, &history);
        }
        assert!(a.remaining_km() < INITIAL_RUL_KM);
        assert_eq!(b.remaining_km(), INITIAL_RUL_KM);
    }
}
