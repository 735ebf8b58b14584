//! Keeper decision and outcome resolution.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{FLIGHT_BASE_MS, FLIGHT_FLOOR_MS, FLIGHT_POWER_SPEEDUP_MS};
use crate::direction::Direction;
use crate::numbers::{clamp_unit, round_f64_to_u32};

/// Terminal outcome of a penalty attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Goal,
    Saved,
}

impl Outcome {
    #[must_use]
    pub const fn is_goal(self) -> bool {
        matches!(self, Self::Goal)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Goal => write!(f, "goal"),
            Self::Saved => write!(f, "saved"),
        }
    }
}

/// Keeper's dive for one shot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeeperDecision {
    /// Uniform draw compared against the save probability.
    pub roll: f64,
    /// `roll < save_probability`.
    pub guessed: bool,
    pub dive: Direction,
}

/// Decide where the keeper dives given the shooter's aim and a uniform roll.
///
/// A correct guess mirrors the shot side, including the centre. A wrong
/// guess always dives to a post, so a central shot can only be saved by a
/// correct guess.
#[must_use]
pub fn keeper_decision(aim: Direction, roll: f64, save_probability: f64) -> KeeperDecision {
    let guessed = roll < save_probability;
    let dive = if guessed { aim } else { aim.wrong_guess_dive() };
    KeeperDecision {
        roll,
        guessed,
        dive,
    }
}

#[must_use]
pub fn outcome_for(aim: Direction, dive: Direction) -> Outcome {
    if aim == dive {
        Outcome::Saved
    } else {
        Outcome::Goal
    }
}

/// Ball flight time in milliseconds: `max(400, 1000 - power * 400)`.
#[must_use]
pub fn flight_duration_ms(power: f64) -> u32 {
    let power = clamp_unit(power);
    round_f64_to_u32((FLIGHT_BASE_MS - power * FLIGHT_POWER_SPEEDUP_MS).max(FLIGHT_FLOOR_MS))
}

/// Everything the host needs to animate and route a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub outcome: Outcome,
    pub shooter: Direction,
    pub keeper: Direction,
    pub power: f64,
    pub keeper_guessed: bool,
    pub save_roll: f64,
    pub flight_ms: u32,
}

impl AttemptResult {
    #[must_use]
    pub fn resolve(aim: Direction, power: f64, roll: f64, save_probability: f64) -> Self {
        let power = clamp_unit(power);
        let decision = keeper_decision(aim, roll, save_probability);
        Self {
            outcome: outcome_for(aim, decision.dive),
            shooter: aim,
            keeper: decision.dive,
            power,
            keeper_guessed: decision.guessed,
            save_roll: decision.roll,
            flight_ms: flight_duration_ms(power),
        }
    }

    /// Signed shooter aim in `{-1, 0, +1}`.
    #[must_use]
    pub const fn aim_direction(&self) -> i8 {
        self.shooter.signed()
    }
}
