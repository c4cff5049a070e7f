//! Telemetry simulator that fabricates a continuous, bounded vehicle signal
//!
//! A drive-mode state machine pushes a shadow target record up or down
//! every step, and the visible state chases that target with per-channel
//! exponential smoothing. Throttle reacts fastest and road speed slowest,
//! which gives the gauges a plausible sense of inertia without any real
//! sensor behind them.

use crate::drive_mode::ModeController;
use crate::stats::lerp;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;
use vts_core::units::*;
use vts_core::{DriveMode, History, TelemetrySource, VehicleState};

// =============================================================================
// Channel limits and dynamics
// =============================================================================

/// Per-step target change and the bound it is pushed towards
#[derive(Debug, Clone, Copy)]
struct Ramp {
    rise: f64,
    ceiling: f64,
    fall: f64,
    floor: f64,
}

impl Ramp {
    fn apply(&self, value: f64, mode: DriveMode) -> f64 {
        match mode {
            DriveMode::Accelerating => (value + self.rise).min(self.ceiling),
            DriveMode::Decelerating => (value - self.fall).max(self.floor),
        }
    }
}

const THROTTLE_RAMP: Ramp = Ramp { rise: 2.0, ceiling: 85.0, fall: 3.0, floor: 0.0 };
const RPM_RAMP: Ramp = Ramp { rise: 60.0, ceiling: 5500.0, fall: 80.0, floor: 800.0 };
const SPEED_RAMP: Ramp = Ramp { rise: 0.8, ceiling: 140.0, fall: 0.4, floor: 0.0 };
const LOAD_RAMP: Ramp = Ramp { rise: 1.5, ceiling: 95.0, fall: 2.0, floor: 15.0 };
const FUEL_RAMP: Ramp = Ramp { rise: 0.5, ceiling: 25.0, fall: 0.2, floor: 4.5 };

/// Half-width of the uniform noise added to the RPM target each step
pub const RPM_JITTER: f64 = 15.0;

/// Load above which the coolant target starts creeping up
const COOLANT_HOT_LOAD: f64 = 70.0;
const COOLANT_RISE: f64 = 0.02;
const COOLANT_DECAY: f64 = 0.01;
/// Thermostat floor the coolant target decays to
pub const COOLANT_FLOOR: f64 = 88.0;

// Smoothing factors: larger reacts faster
const RPM_ALPHA: f64 = 0.08;
const SPEED_ALPHA: f64 = 0.04;
const THROTTLE_ALPHA: f64 = 0.10;
const LOAD_ALPHA: f64 = 0.08;
const COOLANT_ALPHA: f64 = 0.05;
const FUEL_ALPHA: f64 = 0.05;

const BATTERY_NOMINAL: f64 = 13.5;
const BATTERY_RIPPLE: f64 = 0.2;

/// Documented [min, max] for each bounded channel
pub mod limits {
    pub const RPM: (f64, f64) = (800.0, 5500.0);
    pub const SPEED: (f64, f64) = (0.0, 140.0);
    pub const THROTTLE: (f64, f64) = (0.0, 85.0);
    pub const LOAD: (f64, f64) = (15.0, 95.0);
    pub const FUEL_EFFICIENCY: (f64, f64) = (4.5, 25.0);
    pub const BATTERY: (f64, f64) = (13.3, 13.7);
}

// =============================================================================
// Target state
// =============================================================================

/// Values the simulator is currently driving the state towards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    pub rpm: f64,
    pub speed: f64,
    pub throttle: f64,
    pub load: f64,
    pub coolant: f64,
    pub fuel_efficiency: f64,
}

impl TargetState {
    fn from_state(state: &VehicleState) -> Self {
        Self {
            rpm: state.rpm.0,
            speed: state.speed.0,
            throttle: state.throttle.0,
            load: state.load.0,
            coolant: state.coolant.0,
            fuel_efficiency: state.fuel_efficiency.0,
        }
    }
}

// =============================================================================
// Simulator
// =============================================================================

/// Owns the single evolving vehicle state and its rolling history
pub struct Simulator<R = StdRng> {
    state: VehicleState,
    target: TargetState,
    history: History,
    modes: ModeController,
    rng: R,
    started: Instant,
    tick: u64,
}

impl Simulator<StdRng> {
    /// Simulator seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Simulator with a reproducible random stream
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Simulator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Simulator<R> {
    /// Simulator starting from [`VehicleState::initial`], accelerating
    pub fn with_rng(rng: R) -> Self {
        let state = VehicleState::initial();
        Self {
            state,
            target: TargetState::from_state(&state),
            history: History::new(&state),
            modes: ModeController::default(),
            rng,
            started: Instant::now(),
            tick: 0,
        }
    }

    /// Start in `mode` instead of accelerating
    pub fn in_mode(mut self, mode: DriveMode) -> Self {
        self.modes = ModeController::new(mode);
        self
    }

    /// Advance one step using wall-clock time since construction
    pub fn step(&mut self) {
        let elapsed = self.started.elapsed();
        self.step_at(elapsed);
    }

    /// Advance one step as if `elapsed` had passed since construction
    pub fn step_at(&mut self, elapsed: Duration) {
        if self.modes.advance(&mut self.rng) {
            debug!(tick = self.tick + 1, mode = ?self.modes.mode(), "Drive mode flipped");
        }

        self.update_targets();
        self.interpolate();
        self.state.battery =
            Volts(BATTERY_NOMINAL + BATTERY_RIPPLE * elapsed.as_secs_f64().sin());

        self.history.push(&self.state);
        self.tick += 1;
    }

    fn update_targets(&mut self) {
        let mode = self.modes.mode();
        let t = &mut self.target;

        t.throttle = THROTTLE_RAMP.apply(t.throttle, mode);
        t.rpm = RPM_RAMP.apply(t.rpm, mode);
        t.speed = SPEED_RAMP.apply(t.speed, mode);
        t.load = LOAD_RAMP.apply(t.load, mode);
        t.fuel_efficiency = FUEL_RAMP.apply(t.fuel_efficiency, mode);

        // Jitter is re-clamped so the rpm bounds hold at the extremes too
        let jitter = self.rng.gen_range(-RPM_JITTER..=RPM_JITTER);
        t.rpm = (t.rpm + jitter).clamp(limits::RPM.0, limits::RPM.1);

        t.coolant = if self.state.load.0 > COOLANT_HOT_LOAD {
            t.coolant + COOLANT_RISE
        } else {
            (t.coolant - COOLANT_DECAY).max(COOLANT_FLOOR)
        };
    }

    fn interpolate(&mut self) {
        let s = &mut self.state;
        let t = &self.target;

        s.rpm = Rpm(lerp(s.rpm.0, t.rpm, RPM_ALPHA));
        s.speed = KilometersPerHour(lerp(s.speed.0, t.speed, SPEED_ALPHA));
        s.throttle = Percent(lerp(s.throttle.0, t.throttle, THROTTLE_ALPHA));
        s.load = Percent(lerp(s.load.0, t.load, LOAD_ALPHA));
        s.coolant = Celsius(lerp(s.coolant.0, t.coolant, COOLANT_ALPHA));
        s.fuel_efficiency = LitersPer100Km(lerp(s.fuel_efficiency.0, t.fuel_efficiency, FUEL_ALPHA));
    }

    /// Copy of the current state
    pub fn current_state(&self) -> VehicleState {
        self.state
    }

    /// Copy of the current targets
    pub fn target(&self) -> TargetState {
        self.target
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mode(&self) -> DriveMode {
        self.modes.mode()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

impl<R: Rng + Send + Sync> TelemetrySource for Simulator<R> {
    fn name(&self) -> &str {
        "Simulator"
    }

    fn step(&mut self) {
        Self::step(self);
    }

    fn current_state(&self) -> VehicleState {
        Self::current_state(self)
    }

    fn history(&self) -> &History {
        Self::history(self)
    }

    fn mode(&self) -> DriveMode {
        Self::mode(self)
    }

    fn tick(&self) -> u64 {
        Self::tick(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use vts_core::Channel;

    #[test]
    fn test_ramp_accelerating_caps_at_ceiling() {
        assert_eq!(THROTTLE_RAMP.apply(84.0, DriveMode::Accelerating), 85.0);
        assert_eq!(RPM_RAMP.apply(1000.0, DriveMode::Accelerating), 1060.0);
    }

    #[test]
    fn test_ramp_decelerating_floors() {
        assert_eq!(THROTTLE_RAMP.apply(0.0, DriveMode::Decelerating), 0.0);
        assert_eq!(LOAD_RAMP.apply(16.0, DriveMode::Decelerating), 15.0);
        assert!((FUEL_RAMP.apply(8.5, DriveMode::Decelerating) - 8.3).abs() < 1e-12);
    }

    #[test]
    fn test_decelerating_step_keeps_idle_throttle() {
        let mut sim = Simulator::with_rng(StepRng::new(0, 0)).in_mode(DriveMode::Decelerating);
        sim.step_at(Duration::ZERO);

        assert_eq!(sim.target().throttle, 0.0);
        assert_eq!(sim.current_state().throttle.0, 0.0);
        assert_eq!(sim.target().speed, 0.0);
        assert_eq!(sim.current_state().speed.0, 0.0);
    }

    #[test]
    fn test_accelerating_step_moves_towards_target() {
        let mut sim = Simulator::with_rng(StepRng::new(0, 0));
        sim.step_at(Duration::ZERO);

        // throttle target 0 -> 2, state 0 + 0.1 * 2
        assert_eq!(sim.target().throttle, 2.0);
        assert!((sim.current_state().throttle.0 - 0.2).abs() < 1e-12);
        // load target 20 -> 21.5, state 20 + 0.08 * 1.5
        assert!((sim.current_state().load.0 - 20.12).abs() < 1e-12);
    }

    #[test]
    fn test_battery_follows_elapsed_time() {
        let mut sim = Simulator::seeded(1);
        sim.step_at(Duration::from_secs_f64(std::f64::consts::FRAC_PI_2));
        assert!((sim.current_state().battery.0 - 13.7).abs() < 1e-9);
        sim.step_at(Duration::ZERO);
        assert!((sim.current_state().battery.0 - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_coolant_decays_to_floor_at_low_load() {
        let mut sim = Simulator::with_rng(StepRng::new(0, 0)).in_mode(DriveMode::Decelerating);
        for _ in 0..1000 {
            sim.step_at(Duration::ZERO);
        }
        assert_eq!(sim.target().coolant, COOLANT_FLOOR);
        assert!(sim.current_state().coolant.0 >= COOLANT_FLOOR);
    }

    #[test]
    fn test_step_appends_to_history() {
        let mut sim = Simulator::with_rng(StepRng::new(0, 0));
        sim.step_at(Duration::ZERO);
        assert_eq!(sim.tick(), 1);
        assert_eq!(
            sim.history().latest(Channel::Throttle),
            sim.current_state().throttle.0
        );
        assert_eq!(sim.history().latest(Channel::Rpm), sim.current_state().rpm.0);
    }
}
