//! Rolling per-channel telemetry history
//!
//! Every channel holds exactly [`HISTORY_LEN`] samples from construction
//! onwards. A `History` can only be built pre-filled, so statistics over it
//! never divide by zero.

use crate::error::TelemetryError;
use crate::model::VehicleState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

/// Samples kept per channel
pub const HISTORY_LEN: usize = 100;

/// The telemetry channels that are tracked over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Rpm,
    Speed,
    Load,
    Coolant,
    Throttle,
    FuelEfficiency,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Rpm,
        Channel::Speed,
        Channel::Load,
        Channel::Coolant,
        Channel::Throttle,
        Channel::FuelEfficiency,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Rpm => "rpm",
            Channel::Speed => "speed",
            Channel::Load => "load",
            Channel::Coolant => "coolant",
            Channel::Throttle => "throttle",
            Channel::FuelEfficiency => "fuel_efficiency",
        }
    }

    /// Read this channel's value out of a state snapshot
    pub fn value_of(&self, state: &VehicleState) -> f64 {
        match self {
            Channel::Rpm => state.rpm.0,
            Channel::Speed => state.speed.0,
            Channel::Load => state.load.0,
            Channel::Coolant => state.coolant.0,
            Channel::Throttle => state.throttle.0,
            Channel::FuelEfficiency => state.fuel_efficiency.0,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == needle || (needle == "fuelefficiency" && *c == Channel::FuelEfficiency))
            .ok_or_else(|| TelemetryError::UnknownChannel(s.to_string()))
    }
}

/// Fixed-length FIFO of samples for one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChannelHistory {
    samples: VecDeque<f64>,
}

impl ChannelHistory {
    /// A full buffer where every slot holds `value`
    pub fn filled(value: f64) -> Self {
        Self {
            samples: std::iter::repeat(value).take(HISTORY_LEN).collect(),
        }
    }

    /// Build from explicit samples, padding at the front with the first
    /// sample (or keeping only the newest `HISTORY_LEN`) so the length
    /// invariant holds.
    pub fn from_samples(samples: &[f64]) -> Self {
        let pad = samples.first().copied().unwrap_or(0.0);
        let mut buf: VecDeque<f64> = samples
            .iter()
            .copied()
            .skip(samples.len().saturating_sub(HISTORY_LEN))
            .collect();
        while buf.len() < HISTORY_LEN {
            buf.push_front(pad);
        }
        Self { samples: buf }
    }

    fn push(&mut self, value: f64) {
        self.samples.pop_front();
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample
    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or_default()
    }

    /// The newest `n` samples, oldest first. `n` is clamped to the capacity.
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let n = n.min(self.samples.len());
        self.samples.iter().skip(self.samples.len() - n).copied().collect()
    }

    /// All samples, oldest first
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Samples rescaled into [0, 1] for sparkline display.
    ///
    /// A flat series (max == min) maps every sample to 0.5.
    pub fn normalized(&self) -> Vec<f64> {
        let (min, max) = self
            .samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;
        if range <= f64::EPSILON {
            return vec![0.5; self.samples.len()];
        }
        self.samples.iter().map(|v| (v - min) / range).collect()
    }
}

/// Rolling history for all tracked channels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    rpm: ChannelHistory,
    speed: ChannelHistory,
    load: ChannelHistory,
    coolant: ChannelHistory,
    throttle: ChannelHistory,
    fuel_efficiency: ChannelHistory,
}

impl History {
    /// Pre-fill every channel from `state`
    pub fn new(state: &VehicleState) -> Self {
        Self {
            rpm: ChannelHistory::filled(state.rpm.0),
            speed: ChannelHistory::filled(state.speed.0),
            load: ChannelHistory::filled(state.load.0),
            coolant: ChannelHistory::filled(state.coolant.0),
            throttle: ChannelHistory::filled(state.throttle.0),
            fuel_efficiency: ChannelHistory::filled(state.fuel_efficiency.0),
        }
    }

    /// Append one sample of every channel, evicting the oldest of each.
    ///
    /// # Panics
    ///
    /// Panics if any channel value is NaN or infinite.
    pub fn push(&mut self, state: &VehicleState) {
        for channel in Channel::ALL {
            let value = channel.value_of(state);
            assert!(
                value.is_finite(),
                "non-finite {} sample: {}",
                channel,
                value
            );
        }
        for channel in Channel::ALL {
            let value = channel.value_of(state);
            self.channel_mut(channel).push(value);
        }
    }

    /// Replace one channel wholesale. Used to build fixtures for analysis.
    pub fn with_channel(mut self, channel: Channel, samples: &[f64]) -> Self {
        *self.channel_mut(channel) = ChannelHistory::from_samples(samples);
        self
    }

    pub fn channel(&self, channel: Channel) -> &ChannelHistory {
        match channel {
            Channel::Rpm => &self.rpm,
            Channel::Speed => &self.speed,
            Channel::Load => &self.load,
            Channel::Coolant => &self.coolant,
            Channel::Throttle => &self.throttle,
            Channel::FuelEfficiency => &self.fuel_efficiency,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut ChannelHistory {
        match channel {
            Channel::Rpm => &mut self.rpm,
            Channel::Speed => &mut self.speed,
            Channel::Load => &mut self.load,
            Channel::Coolant => &mut self.coolant,
            Channel::Throttle => &mut self.throttle,
            Channel::FuelEfficiency => &mut self.fuel_efficiency,
        }
    }

    pub fn latest(&self, channel: Channel) -> f64 {
        self.channel(channel).latest()
    }

    pub fn recent(&self, channel: Channel, n: usize) -> Vec<f64> {
        self.channel(channel).recent(n)
    }

    /// Channel name -> samples (oldest first)
    pub fn to_map(&self) -> BTreeMap<&'static str, Vec<f64>> {
        Channel::ALL
            .into_iter()
            .map(|c| (c.name(), self.channel(c).to_vec()))
            .collect()
    }

    /// Channel name -> samples rescaled to [0, 1]
    pub fn to_normalized_map(&self) -> BTreeMap<&'static str, Vec<f64>> {
        Channel::ALL
            .into_iter()
            .map(|c| (c.name(), self.channel(c).normalized()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_full() {
        let history = History::new(&VehicleState::initial());
        for channel in Channel::ALL {
            assert_eq!(history.channel(channel).len(), HISTORY_LEN);
        }
        assert_eq!(history.latest(Channel::Rpm), 1000.0);
        assert_eq!(history.latest(Channel::FuelEfficiency), 8.5);
    }

    #[test]
    fn test_push_evicts_oldest_and_keeps_length() {
        let initial = VehicleState::initial();
        let mut history = History::new(&initial);
        let mut next = initial;
        next.rpm.0 = 1500.0;
        history.push(&next);

        let rpm = history.channel(Channel::Rpm);
        assert_eq!(rpm.len(), HISTORY_LEN);
        assert_eq!(rpm.latest(), 1500.0);
        assert_eq!(rpm.recent(2), vec![1000.0, 1500.0]);
    }

    #[test]
    #[should_panic(expected = "non-finite rpm sample")]
    fn test_push_rejects_nan() {
        let initial = VehicleState::initial();
        let mut history = History::new(&initial);
        let mut bad = initial;
        bad.rpm.0 = f64::NAN;
        history.push(&bad);
    }

    #[test]
    fn test_recent_clamps_to_capacity() {
        let history = History::new(&VehicleState::initial());
        assert_eq!(history.recent(Channel::Speed, 500).len(), HISTORY_LEN);
        assert!(history.recent(Channel::Speed, 0).is_empty());
    }

    #[test]
    fn test_from_samples_pads_short_input() {
        let ch = ChannelHistory::from_samples(&[3.0, 4.0]);
        assert_eq!(ch.len(), HISTORY_LEN);
        assert_eq!(ch.recent(3), vec![3.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_samples_keeps_newest() {
        let samples: Vec<f64> = (0..150).map(f64::from).collect();
        let ch = ChannelHistory::from_samples(&samples);
        assert_eq!(ch.len(), HISTORY_LEN);
        assert_eq!(ch.to_vec()[0], 50.0);
        assert_eq!(ch.latest(), 149.0);
    }

    #[test]
    fn test_normalized_flat_series() {
        let ch = ChannelHistory::filled(90.0);
        assert!(ch.normalized().iter().all(|v| *v == 0.5));
    }

    #[test]
    fn test_normalized_range() {
        let samples: Vec<f64> = (0..HISTORY_LEN).map(|i| i as f64 * 2.0).collect();
        let norm = ChannelHistory::from_samples(&samples).normalized();
        assert_eq!(norm[0], 0.0);
        assert_eq!(norm[HISTORY_LEN - 1], 1.0);
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("RPM".parse::<Channel>(), Ok(Channel::Rpm));
        assert_eq!(" fuel_efficiency ".parse::<Channel>(), Ok(Channel::FuelEfficiency));
        assert_eq!(
            "boost".parse::<Channel>(),
            Err(TelemetryError::UnknownChannel("boost".to_string()))
        );
    }

    #[test]
    fn test_to_map_has_all_channels() {
        let map = History::new(&VehicleState::initial()).to_map();
        assert_eq!(map.len(), 6);
        assert!(map.values().all(|v| v.len() == HISTORY_LEN));
        assert_eq!(map["coolant"][0], 90.0);
    }
}
