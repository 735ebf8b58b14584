use std::fmt;

use fluency_game::{City, Direction, QuizQuestion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// How long to hold the power bar (ms) and where to aim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotPlan {
    pub aim: Direction,
    pub hold_ms: f64,
}

/// What to do with a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMove {
    Answer(usize),
    /// Let the timer run out.
    Wait,
}

/// Policy interface for automated players.
pub trait ShooterPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Plan the next penalty in `city`; `attempt` counts from zero.
    fn plan_shot(&mut self, city: City, attempt: u32) -> ShotPlan;

    /// Respond to one quiz question.
    fn quiz_move(&mut self, question: &QuizQuestion) -> QuizMove;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Centre shot at full power, knows every answer.
    Centre,
    /// Alternates posts, answers with the first option.
    Corners,
    /// Random aim and power, random answers.
    Random,
    /// Random aim and power, lets every question time out.
    Idle,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Centre, Self::Corners, Self::Random, Self::Idle];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Centre => "Centre",
            GameplayStrategy::Corners => "Corners",
            GameplayStrategy::Random => "Random",
            GameplayStrategy::Idle => "Idle",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn ShooterPolicy + Send> {
        match self {
            GameplayStrategy::Centre => Box::new(CentrePolicy),
            GameplayStrategy::Corners => Box::new(CornersPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed, false)),
            GameplayStrategy::Idle => Box::new(RandomPolicy::new(seed, true)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for GameplayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}

// Peak of the power bar.
const FULL_POWER_HOLD_MS: f64 = 1_000.0;

struct CentrePolicy;
struct CornersPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
    idle_quiz: bool,
}

impl RandomPolicy {
    fn new(seed: u64, idle_quiz: bool) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            idle_quiz,
        }
    }
}

impl ShooterPolicy for CentrePolicy {
    fn name(&self) -> &'static str {
        "Centre"
    }

    fn plan_shot(&mut self, _city: City, _attempt: u32) -> ShotPlan {
        ShotPlan {
            aim: Direction::Centre,
            hold_ms: FULL_POWER_HOLD_MS,
        }
    }

    fn quiz_move(&mut self, question: &QuizQuestion) -> QuizMove {
        QuizMove::Answer(question.correct)
    }
}

impl ShooterPolicy for CornersPolicy {
    fn name(&self) -> &'static str {
        "Corners"
    }

    fn plan_shot(&mut self, city: City, attempt: u32) -> ShotPlan {
        let attempt = usize::try_from(attempt).unwrap_or(0);
        let aim = if (city.index() + attempt) % 2 == 0 {
            Direction::Left
        } else {
            Direction::Right
        };
        ShotPlan {
            aim,
            hold_ms: FULL_POWER_HOLD_MS * 0.75,
        }
    }

    fn quiz_move(&mut self, _question: &QuizQuestion) -> QuizMove {
        QuizMove::Answer(0)
    }
}

impl ShooterPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        if self.idle_quiz { "Idle" } else { "Random" }
    }

    fn plan_shot(&mut self, _city: City, _attempt: u32) -> ShotPlan {
        let aim = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        ShotPlan {
            aim,
            hold_ms: self.rng.gen_range(0.0..FULL_POWER_HOLD_MS * 2.0),
        }
    }

    fn quiz_move(&mut self, question: &QuizQuestion) -> QuizMove {
        if self.idle_quiz || question.options.is_empty() {
            return QuizMove::Wait;
        }
        QuizMove::Answer(self.rng.gen_range(0..question.options.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuizQuestion {
        QuizQuestion {
            prompt: "?".to_string(),
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct: 2,
        }
    }

    #[test]
    fn centre_policy_knows_answers() {
        let mut policy = GameplayStrategy::Centre.create_policy(1);
        assert_eq!(policy.quiz_move(&question()), QuizMove::Answer(2));
        assert_eq!(policy.plan_shot(City::Madrid, 0).aim, Direction::Centre);
    }

    #[test]
    fn corners_alternate_posts() {
        let mut policy = GameplayStrategy::Corners.create_policy(1);
        let first = policy.plan_shot(City::Sevilla, 0).aim;
        let second = policy.plan_shot(City::Sevilla, 1).aim;
        assert_ne!(first, second);
        assert_ne!(first, Direction::Centre);
    }

    #[test]
    fn random_policy_is_seeded() {
        let plans = |seed| {
            let mut policy = GameplayStrategy::Random.create_policy(seed);
            (0..8)
                .map(|attempt| policy.plan_shot(City::Barcelona, attempt))
                .collect::<Vec<_>>()
        };
        assert_eq!(plans(5), plans(5));
        let mut idle = GameplayStrategy::Idle.create_policy(5);
        assert_eq!(idle.quiz_move(&question()), QuizMove::Wait);
    }

    #[test]
    fn parses_labels() {
        assert_eq!("corners".parse(), Ok(GameplayStrategy::Corners));
        assert!("sweeper".parse::<GameplayStrategy>().is_err());
    }
}
