//! Telemetry source trait definition

use crate::history::History;
use crate::model::{DriveMode, VehicleState};

/// Anything that can produce an evolving vehicle state on demand
///
/// A source is driven from outside: the scheduler calls [`step`] at a fixed
/// cadence and readers pull snapshots between steps. Implementations must
/// finish updating both the state and the history inside `step` so that a
/// reader never sees one without the other.
///
/// [`step`]: TelemetrySource::step
pub trait TelemetrySource: Send + Sync {
    /// Display name (e.g. "Simulator")
    fn name(&self) -> &str;

    /// Advance the source by one discrete step
    fn step(&mut self);

    /// Copy of the current state
    fn current_state(&self) -> VehicleState;

    /// Read-only view of the rolling history
    fn history(&self) -> &History;

    /// Current drive mode
    fn mode(&self) -> DriveMode;

    /// Number of steps taken since construction
    fn tick(&self) -> u64;
}
