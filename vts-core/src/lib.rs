//! Vehicle Telemetry Simulator Core Library
//!
//! This crate provides the data model shared by the simulator, the
//! inference engine and the dashboard server: unit types, the vehicle state
//! snapshot, the rolling channel history and the source trait.

pub mod error;
pub mod history;
pub mod model;
pub mod source;
pub mod units;

pub use error::TelemetryError;
pub use history::{Channel, ChannelHistory, History, HISTORY_LEN};
pub use model::{DriveMode, FieldMask, InferenceResult, TelemetryFrame, VehicleState};
pub use source::TelemetrySource;
