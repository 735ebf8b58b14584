//! Balance and timing values for the penalty engine and the quiz.
//!
//! The JSON tables under `assets/` fall back to these when they fail to load.

// Penalty timing -----------------------------------------------------------
pub(crate) const RUN_UP_MS: u32 = 1_500;
pub(crate) const POWER_RAMP_MS: f64 = 1_000.0;
pub(crate) const POWER_SCALE_MAX: f64 = 100.0;
pub(crate) const FLIGHT_BASE_MS: f64 = 1_000.0;
pub(crate) const FLIGHT_POWER_SPEEDUP_MS: f64 = 400.0;
pub(crate) const FLIGHT_FLOOR_MS: f64 = 400.0;
pub(crate) const DEFAULT_FRAME_MS: f64 = 1_000.0 / 60.0;

// Keeper balance -----------------------------------------------------------
pub(crate) const SAVE_PROBABILITY_NORMAL: f64 = 0.2;
pub(crate) const SAVE_PROBABILITY_FINAL: f64 = 0.1;

// Quiz tuning --------------------------------------------------------------
pub(crate) const QUIZ_TIME_PER_QUESTION_MS: u32 = 30_000;
pub(crate) const QUIZ_FEEDBACK_MS: u32 = 1_500;
pub(crate) const QUIZ_SUCCESS_PERFECT: f64 = 0.9;
pub(crate) const QUIZ_SUCCESS_GOOD: f64 = 0.7;
pub(crate) const QUIZ_SUCCESS_FAIR: f64 = 0.5;
pub(crate) const QUIZ_SUCCESS_POOR: f64 = 0.3;

// Session -----------------------------------------------------------------
pub(crate) const PLAYER_NAME_MAX_LEN: usize = 10;

// RNG stream tags ----------------------------------------------------------
pub(crate) const RNG_TAG_KEEPER: &[u8] = b"keeper";
pub(crate) const RNG_TAG_ATTEMPT: &[u8] = b"attempt";

// Event keys ---------------------------------------------------------------
pub(crate) const LOG_RUN_UP: &str = "log.penalty.run-up";
pub(crate) const LOG_POWER_BAR: &str = "log.penalty.power-bar";
pub(crate) const LOG_GOAL: &str = "log.penalty.goal";
pub(crate) const LOG_SAVED: &str = "log.penalty.saved";
