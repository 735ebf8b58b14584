//! Power-bar oscillator.
//!
//! The bar climbs linearly from 0 to 100 over one ramp, falls back to 0 over
//! the next, and repeats until the shot is committed.

use crate::constants::{POWER_RAMP_MS, POWER_SCALE_MAX};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerOscillator {
    ramp_ms: f64,
    elapsed_ms: f64,
}

impl Default for PowerOscillator {
    fn default() -> Self {
        Self::new(POWER_RAMP_MS)
    }
}

impl PowerOscillator {
    /// Non-positive or non-finite ramps fall back to the default ramp.
    #[must_use]
    pub fn new(ramp_ms: f64) -> Self {
        let ramp_ms = if ramp_ms.is_finite() && ramp_ms > 0.0 {
            ramp_ms
        } else {
            POWER_RAMP_MS
        };
        Self {
            ramp_ms,
            elapsed_ms: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
    }

    /// Advance the oscillator. Negative or non-finite steps are ignored.
    pub fn advance(&mut self, dt_ms: f64) {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.elapsed_ms += dt_ms;
        }
    }

    #[must_use]
    pub const fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[must_use]
    pub const fn ramp_ms(&self) -> f64 {
        self.ramp_ms
    }

    /// Current bar value in `[0, 100]`.
    #[must_use]
    pub fn value(&self) -> f64 {
        value_at(self.elapsed_ms, self.ramp_ms)
    }

    /// Current bar value scaled to `[0.0, 1.0]`.
    #[must_use]
    pub fn normalized(&self) -> f64 {
        self.value() / POWER_SCALE_MAX
    }
}

/// Triangle wave sampled `elapsed_ms` after the bar started.
#[must_use]
pub fn value_at(elapsed_ms: f64, ramp_ms: f64) -> f64 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 || ramp_ms <= 0.0 {
        return 0.0;
    }
    let phase = elapsed_ms % (ramp_ms * 2.0);
    let rising = if phase <= ramp_ms {
        phase
    } else {
        ramp_ms * 2.0 - phase
    };
    (rising / ramp_ms * POWER_SCALE_MAX).clamp(0.0, POWER_SCALE_MAX)
}
