//! Deterministic randomness for penalty resolution.
//!
//! Each engine owns its own stream. Stream seeds are derived from the
//! user-visible seed with a domain tag so that the keeper's rolls never share
//! state with any other consumer of the same seed.

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;
use std::collections::VecDeque;

use crate::constants::{RNG_TAG_ATTEMPT, RNG_TAG_KEEPER};
use crate::numbers::clamp_unit;

/// Source of uniform draws in `[0, 1)` used for the keeper's save roll.
pub trait RollSource {
    fn roll_unit(&mut self) -> f64;
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Stream dedicated to keeper decisions for a given user seed.
    #[must_use]
    pub fn keeper_stream(user_seed: u64) -> Self {
        Self::new(derive_stream_seed(user_seed, RNG_TAG_KEEPER))
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

impl<R: RngCore> RollSource for CountingRng<R> {
    fn roll_unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Pre-scripted rolls, replayed in order. An exhausted script repeats its last roll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    rolls: VecDeque<f64>,
    last: f64,
}

impl ScriptedRolls {
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().map(clamp_unit).collect(),
            last: 0.0,
        }
    }

    /// A script that always returns `roll`.
    #[must_use]
    pub fn constant(roll: f64) -> Self {
        Self {
            rolls: VecDeque::new(),
            last: clamp_unit(roll),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RollSource for ScriptedRolls {
    fn roll_unit(&mut self) -> f64 {
        if let Some(next) = self.rolls.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Derive the per-attempt seed used when a session builds consecutive engines.
#[must_use]
pub fn attempt_seed(user_seed: u64, attempt_index: u32) -> u64 {
    let mut tag = Vec::with_capacity(RNG_TAG_ATTEMPT.len() + 4);
    tag.extend_from_slice(RNG_TAG_ATTEMPT);
    tag.extend_from_slice(&attempt_index.to_le_bytes());
    derive_stream_seed(user_seed, &tag)
}

/// HMAC-SHA256 of the domain tag keyed by the user seed, truncated to 64 bits.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeper_stream_uses_domain_hmac() {
        let seed = 0xFEED_FACE;
        let mut stream = CountingRng::keeper_stream(seed);
        let mut expected = SmallRng::seed_from_u64(derive_stream_seed(seed, b"keeper"));
        assert_eq!(stream.next_u64(), expected.next_u64());
        assert_eq!(stream.draws(), 1);
    }

    #[test]
    fn rolls_are_unit_interval_and_counted() {
        let mut stream = CountingRng::new(7);
        for _ in 0..1_000 {
            let roll = stream.roll_unit();
            assert!((0.0..1.0).contains(&roll));
        }
        assert!(stream.draws() >= 1_000);
    }

    #[test]
    fn scripted_rolls_replay_then_hold() {
        let mut script = ScriptedRolls::new([0.05, 0.9]);
        assert!((script.roll_unit() - 0.05).abs() < f64::EPSILON);
        assert!((script.roll_unit() - 0.9).abs() < f64::EPSILON);
        assert!((script.roll_unit() - 0.9).abs() < f64::EPSILON);
        assert_eq!(script.remaining(), 0);
        let mut constant = ScriptedRolls::constant(0.42);
        assert!((constant.roll_unit() - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn attempt_seeds_differ_per_index() {
        assert_ne!(attempt_seed(11, 0), attempt_seed(11, 1));
        assert_eq!(attempt_seed(11, 3), attempt_seed(11, 3));
        assert_ne!(attempt_seed(11, 0), attempt_seed(12, 0));
    }
}
