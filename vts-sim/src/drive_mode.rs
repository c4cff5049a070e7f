//! Debounced, probabilistic drive-mode state machine

use rand::Rng;
use vts_core::DriveMode;

/// Ticks a mode must last before a flip is even considered
pub const MODE_DEBOUNCE_TICKS: u32 = 50;

/// A uniform draw must exceed this for the mode to flip
pub const MODE_FLIP_PROBABILITY: f64 = 0.95;

/// Holds the current drive mode and how long it has lasted.
///
/// Each `advance` bumps the counter; once the counter is past
/// [`MODE_DEBOUNCE_TICKS`] every tick has a 5% chance to flip. Mode runs are
/// therefore at least 51 ticks long and geometric beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeController {
    mode: DriveMode,
    ticks_in_mode: u32,
}

impl ModeController {
    pub fn new(mode: DriveMode) -> Self {
        Self {
            mode,
            ticks_in_mode: 0,
        }
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    pub fn ticks_in_mode(&self) -> u32 {
        self.ticks_in_mode
    }

    /// Advance one tick. Returns `true` if the mode flipped.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.ticks_in_mode += 1;
        // Only draw once the debounce window has passed, so the RNG stream
        // isn't consumed while a flip is impossible.
        if self.ticks_in_mode > MODE_DEBOUNCE_TICKS && rng.gen::<f64>() > MODE_FLIP_PROBABILITY {
            self.mode = self.mode.flipped();
            self.ticks_in_mode = 0;
            return true;
        }
        false
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(DriveMode::Accelerating)
    }
}
