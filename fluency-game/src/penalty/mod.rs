//! Penalty-kick attempt engine.
//!
//! One [`PenaltyKickEngine`] drives one attempt at a time through
//! `Setup -> Aiming -> Power -> Resolved`. The host advances it with discrete
//! triggers, samples the directional input every frame and ticks it with the
//! elapsed frame time. Rendering is left entirely to the host.

mod engine;
mod event;
mod phase;
mod resolve;

pub use engine::{AttemptState, PenaltyKickEngine};
pub use event::PenaltyEvent;
pub use phase::AttemptPhase;
pub use resolve::{
    AttemptResult, KeeperDecision, Outcome, flight_duration_ms, keeper_decision, outcome_for,
};

use serde::{Deserialize, Serialize};

use crate::constants::{POWER_RAMP_MS, RUN_UP_MS};
use crate::numbers::clamp_unit;

/// Per-match tuning for a penalty attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Chance that the keeper reads the shot and dives to the same side.
    pub save_probability: f64,
    #[serde(default = "default_run_up_ms")]
    pub run_up_ms: u32,
    #[serde(default = "default_power_ramp_ms")]
    pub power_ramp_ms: f64,
    /// Ignore aim input until the run-up has finished.
    #[serde(default)]
    pub gate_aim_during_run_up: bool,
}

const fn default_run_up_ms() -> u32 {
    RUN_UP_MS
}

const fn default_power_ramp_ms() -> f64 {
    POWER_RAMP_MS
}

impl PenaltyConfig {
    #[must_use]
    pub fn with_save_probability(save_probability: f64) -> Self {
        Self {
            save_probability: clamp_unit(save_probability),
            run_up_ms: RUN_UP_MS,
            power_ramp_ms: POWER_RAMP_MS,
            gate_aim_during_run_up: false,
        }
    }

    #[must_use]
    pub const fn gated(mut self) -> Self {
        self.gate_aim_during_run_up = true;
        self
    }
}
