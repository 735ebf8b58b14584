use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{AttemptPhase, AttemptResult, PenaltyConfig, PenaltyEvent};
use crate::direction::Direction;
use crate::input::DirectionalInput;
use crate::numbers::clamp_unit;
use crate::oscillator::PowerOscillator;
use crate::rng::{CountingRng, RollSource};

/// Mutable state of the attempt in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptState {
    phase: AttemptPhase,
    aim: Direction,
    power: f64,
    oscillator: PowerOscillator,
    run_up_remaining_ms: f64,
    result: Option<AttemptResult>,
}

impl AttemptState {
    fn fresh(config: &PenaltyConfig) -> Self {
        Self {
            phase: AttemptPhase::Setup,
            aim: Direction::Centre,
            power: 0.0,
            oscillator: PowerOscillator::new(config.power_ramp_ms),
            run_up_remaining_ms: 0.0,
            result: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> AttemptPhase {
        self.phase
    }

    #[must_use]
    pub const fn aim(&self) -> Direction {
        self.aim
    }

    /// Committed power; zero until the shot is taken.
    #[must_use]
    pub const fn power(&self) -> f64 {
        self.power
    }

    #[must_use]
    pub const fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }
}

pub type PendingEvents = SmallVec<[PenaltyEvent; 4]>;

/// Resolves one penalty kick from timing and direction input.
#[derive(Debug, Clone)]
pub struct PenaltyKickEngine<R = CountingRng<SmallRng>> {
    config: PenaltyConfig,
    rolls: R,
    attempt: AttemptState,
    events: PendingEvents,
}

impl PenaltyKickEngine<CountingRng<SmallRng>> {
    /// Engine whose keeper rolls come from the keeper stream of `seed`.
    #[must_use]
    pub fn seeded(config: PenaltyConfig, seed: u64) -> Self {
        Self::new(config, CountingRng::keeper_stream(seed))
    }
}

impl<R: RollSource> PenaltyKickEngine<R> {
    #[must_use]
    pub fn new(mut config: PenaltyConfig, rolls: R) -> Self {
        config.save_probability = clamp_unit(config.save_probability);
        let attempt = AttemptState::fresh(&config);
        Self {
            config,
            rolls,
            attempt,
            events: PendingEvents::new(),
        }
    }

    /// Discard the current attempt and return to `Setup`.
    pub fn reset(&mut self) {
        log::debug!(
            "penalty reset from {} (p={:.2})",
            self.attempt.phase,
            self.config.save_probability
        );
        self.attempt = AttemptState::fresh(&self.config);
        self.events.clear();
    }

    /// Apply one advance trigger. Returns the new phase, or `None` when the
    /// attempt is already resolved.
    pub fn advance(&mut self) -> Option<AttemptPhase> {
        let from = self.attempt.phase;
        let to = from.next()?;
        self.attempt.phase = to;
        log::debug!("penalty phase {from} -> {to}");
        self.events.push(PenaltyEvent::PhaseChanged { from, to });
        match to {
            AttemptPhase::Aiming => self.start_run_up(),
            AttemptPhase::Power => self.start_power_bar(),
            AttemptPhase::Resolved => self.take_shot(),
            AttemptPhase::Setup => {}
        }
        Some(to)
    }

    /// Record the current directional intent. Ignored outside `Aiming` and
    /// `Power`, and during the run-up when gating is enabled.
    pub fn sample(&mut self, direction: Direction) -> bool {
        if !self.accepts_aim() {
            return false;
        }
        if self.attempt.aim != direction {
            log::trace!("aim {} -> {direction}", self.attempt.aim);
        }
        self.attempt.aim = direction;
        true
    }

    pub fn sample_input<I: DirectionalInput + ?Sized>(&mut self, input: &I) -> bool {
        self.sample(input.direction())
    }

    /// Step timers by one frame.
    pub fn tick(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        if self.attempt.phase.samples_direction() && self.attempt.run_up_remaining_ms > 0.0 {
            self.attempt.run_up_remaining_ms = (self.attempt.run_up_remaining_ms - dt_ms).max(0.0);
            if self.attempt.run_up_remaining_ms <= 0.0 {
                self.events.push(PenaltyEvent::RunUpFinished);
            }
        }
        if self.attempt.phase == AttemptPhase::Power {
            self.attempt.oscillator.advance(dt_ms);
        }
    }

    fn accepts_aim(&self) -> bool {
        match self.attempt.phase {
            AttemptPhase::Aiming => {
                !(self.config.gate_aim_during_run_up && self.attempt.run_up_remaining_ms > 0.0)
            }
            AttemptPhase::Power => true,
            AttemptPhase::Setup | AttemptPhase::Resolved => false,
        }
    }

    fn start_run_up(&mut self) {
        self.attempt.aim = Direction::Centre;
        self.attempt.run_up_remaining_ms = f64::from(self.config.run_up_ms);
        self.events.push(PenaltyEvent::RunUpStarted {
            duration_ms: self.config.run_up_ms,
        });
    }

    fn start_power_bar(&mut self) {
        self.attempt.oscillator.reset();
        self.events.push(PenaltyEvent::PowerBarStarted {
            ramp_ms: self.attempt.oscillator.ramp_ms(),
        });
    }

    fn take_shot(&mut self) {
        self.attempt.power = clamp_unit(self.attempt.oscillator.normalized());
        let roll = self.rolls.roll_unit();
        let result = AttemptResult::resolve(
            self.attempt.aim,
            self.attempt.power,
            roll,
            self.config.save_probability,
        );
        log::debug!(
            "penalty resolved: {} shooter={} keeper={} power={:.2} roll={:.3} p={:.2}",
            result.outcome,
            result.shooter,
            result.keeper,
            result.power,
            roll,
            self.config.save_probability
        );
        self.attempt.result = Some(result);
        self.events.push(PenaltyEvent::Resolved { result });
    }

    #[must_use]
    pub const fn phase(&self) -> AttemptPhase {
        self.attempt.phase
    }

    /// Latest sampled (or, once resolved, committed) aim.
    #[must_use]
    pub const fn aim(&self) -> Direction {
        self.attempt.aim
    }

    /// Live power-bar value in `[0.0, 1.0]` for drawing the bar.
    #[must_use]
    pub fn power_preview(&self) -> f64 {
        match self.attempt.phase {
            AttemptPhase::Power => clamp_unit(self.attempt.oscillator.normalized()),
            AttemptPhase::Resolved => self.attempt.power,
            AttemptPhase::Setup | AttemptPhase::Aiming => 0.0,
        }
    }

    #[must_use]
    pub const fn run_up_remaining_ms(&self) -> f64 {
        self.attempt.run_up_remaining_ms
    }

    #[must_use]
    pub const fn result(&self) -> Option<&AttemptResult> {
        self.attempt.result.as_ref()
    }

    #[must_use]
    pub const fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    #[must_use]
    pub const fn config(&self) -> &PenaltyConfig {
        &self.config
    }

    #[must_use]
    pub const fn rolls(&self) -> &R {
        &self.rolls
    }

    /// Take every notification emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> PendingEvents {
        std::mem::take(&mut self.events)
    }
}
