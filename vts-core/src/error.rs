//! Error types for the core model

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TelemetryError {
    /// A channel name that isn't one of the six tracked history channels
    #[error("unknown telemetry channel: {0}")]
    UnknownChannel(String),
}
