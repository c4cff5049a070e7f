//! Telemetry simulation and heuristic inference for the vehicle telemetry simulator

pub mod drive_mode;
pub mod inference;
pub mod simulator;
pub mod stats;

pub use drive_mode::ModeController;
pub use inference::InferenceEngine;
pub use simulator::Simulator;
