//! Vehicle telemetry data model
//!
//! Defines the state snapshot the simulator exposes, the diagnostic result
//! the inference engine produces, and the frame broadcast to dashboards.

use crate::units::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Snapshot of the simulated vehicle.
///
/// `Copy` on purpose: readers always get their own copy and can never reach
/// the simulator's live record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Engine speed, 800-5500 rpm
    pub rpm: Rpm,

    /// Road speed, 0-140 km/h
    pub speed: KilometersPerHour,

    /// Throttle opening, 0-85 %
    pub throttle: Percent,

    /// Engine load, 15-95 %
    pub load: Percent,

    /// Coolant temperature, never below 88 °C once warmed
    pub coolant: Celsius,

    /// Battery voltage, oscillates within 13.3-13.7 V
    pub battery: Volts,

    /// Fuel consumption rate, 4.5-25 L/100km (lower is better)
    pub fuel_efficiency: LitersPer100Km,
}

impl VehicleState {
    /// State of a warm engine idling at a standstill
    pub fn initial() -> Self {
        Self {
            rpm: Rpm(1000.0),
            speed: KilometersPerHour(0.0),
            throttle: Percent(0.0),
            load: Percent(20.0),
            coolant: Celsius(90.0),
            battery: Volts(13.5),
            fuel_efficiency: LitersPer100Km(8.5),
        }
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Direction the simulator is currently pushing its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriveMode {
    Accelerating,
    Decelerating,
}

impl DriveMode {
    pub fn flipped(self) -> Self {
        match self {
            DriveMode::Accelerating => DriveMode::Decelerating,
            DriveMode::Decelerating => DriveMode::Accelerating,
        }
    }
}

// === Inference Output ===

/// Diagnostic result of one inference pass. Not stored anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub health: HealthScores,
    pub rul: RulEstimate,
    pub anomaly: AnomalyReport,
    pub driver: DriverProfile,
}

/// Subsystem health scores.
///
/// Not clamped: extreme coolant readings push `thermal` below zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthScores {
    pub thermal: f64,
    pub engine: f64,
    pub electrical: f64,
    /// Weighted composite: 0.4 thermal + 0.4 engine + 0.2 electrical
    pub hygiene: i64,
}

/// Remaining useful life estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RulEstimate {
    pub remaining_km: f64,
    pub failure_probability: FailureProbability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureProbability {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub detected: bool,
    /// Population variance of the recent RPM window (rpm²)
    pub rpm_variance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverStyle {
    #[serde(rename = "AGGRESSIVE")]
    Aggressive,
    #[serde(rename = "ECO-OPTIMAL")]
    EcoOptimal,
    #[serde(rename = "ERRATIC")]
    Erratic,
    #[serde(rename = "NORMAL")]
    Normal,
}

impl DriverStyle {
    pub fn label(&self) -> &'static str {
        match self {
            DriverStyle::Aggressive => "AGGRESSIVE",
            DriverStyle::EcoOptimal => "ECO-OPTIMAL",
            DriverStyle::Erratic => "ERRATIC",
            DriverStyle::Normal => "NORMAL",
        }
    }
}

/// Driver behaviour classification and the features behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub style: DriverStyle,
    /// Confidence in percent
    pub confidence: f64,
    pub insight: String,
    /// 0-100, rounded
    pub throttle_aggression: i64,
    /// Normalized RPM standard deviation
    pub rpm_volatility: f64,
    pub efficiency_score: i64,
}

// === Dashboard Frames ===

/// One simulator tick as broadcast to dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Wall-clock time the frame was produced
    pub timestamp: DateTime<Utc>,

    /// Number of simulator steps taken so far
    pub tick: u64,

    pub mode: DriveMode,

    pub state: VehicleState,
}

impl TelemetryFrame {
    pub fn new(tick: u64, mode: DriveMode, state: VehicleState) -> Self {
        Self {
            timestamp: Utc::now(),
            tick,
            mode,
            state,
        }
    }
}

/// Slow-changing fields refreshed at a lower cadence than the gauges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondaryReadout {
    pub coolant: Celsius,
    pub battery: Volts,
    pub fuel_efficiency: LitersPer100Km,
    pub mode: DriveMode,
}

impl SecondaryReadout {
    pub fn from_state(state: &VehicleState, mode: DriveMode) -> Self {
        Self {
            coolant: state.coolant,
            battery: state.battery,
            fuel_efficiency: state.fuel_efficiency,
            mode,
        }
    }
}

// === Field Masking for Selective Output ===

/// Specifies which state fields to include in serialized frames
///
/// Lets a dashboard that only draws an RPM gauge skip the rest of the
/// payload.
#[derive(Debug, Clone, Default)]
pub struct FieldMask {
    fields: HashSet<String>,
    include_all: bool,
}

impl FieldMask {
    /// Create a mask that includes all fields
    pub fn all() -> Self {
        Self {
            fields: HashSet::new(),
            include_all: true,
        }
    }

    /// Create a mask from a comma-separated list of field names
    pub fn parse(fields: &str) -> Self {
        let fields: HashSet<String> = fields
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            fields,
            include_all: false,
        }
    }

    pub fn builder() -> FieldMaskBuilder {
        FieldMaskBuilder::default()
    }

    /// Check if a field should be included
    pub fn includes(&self, field: &str) -> bool {
        self.include_all || self.fields.contains(&field.to_lowercase())
    }

    pub fn is_all(&self) -> bool {
        self.include_all
    }
}

impl FromStr for FieldMask {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Builder for FieldMask
#[derive(Debug, Default)]
pub struct FieldMaskBuilder {
    fields: HashSet<String>,
}

impl FieldMaskBuilder {
    pub fn with_field(mut self, field: &str) -> Self {
        self.fields.insert(field.to_lowercase());
        self
    }

    pub fn rpm(self) -> Self {
        self.with_field("rpm")
    }

    pub fn speed(self) -> Self {
        self.with_field("speed")
    }

    pub fn throttle(self) -> Self {
        self.with_field("throttle")
    }

    pub fn load(self) -> Self {
        self.with_field("load")
    }

    pub fn coolant(self) -> Self {
        self.with_field("coolant")
    }

    pub fn battery(self) -> Self {
        self.with_field("battery")
    }

    pub fn fuel_efficiency(self) -> Self {
        self.with_field("fuel_efficiency")
    }

    pub fn build(self) -> FieldMask {
        FieldMask {
            fields: self.fields,
            include_all: false,
        }
    }
}

impl TelemetryFrame {
    /// Serialize this frame respecting the given field mask
    ///
    /// `timestamp`, `tick` and `mode` are always present; only the state
    /// fields are filtered.
    pub fn to_json_filtered(&self, mask: Option<&FieldMask>) -> serde_json::Result<String> {
        let mask = match mask {
            Some(m) if !m.is_all() => m,
            _ => return serde_json::to_string(self),
        };

        let mut state = serde_json::Map::new();
        if let serde_json::Value::Object(fields) = serde_json::to_value(self.state)? {
            for (name, value) in fields {
                if mask.includes(&name) {
                    state.insert(name, value);
                }
            }
        }

        let mut map = serde_json::Map::new();
        map.insert(
            "timestamp".to_string(),
            serde_json::to_value(self.timestamp)?,
        );
        map.insert("tick".to_string(), serde_json::to_value(self.tick)?);
        map.insert("mode".to_string(), serde_json::to_value(self.mode)?);
        map.insert("state".to_string(), serde_json::Value::Object(state));

        serde_json::to_string(&map)
    }
}
