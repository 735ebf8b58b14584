//! Fluency FC Game Engine
//!
//! Platform-agnostic core logic for Fluency FC, a penalty-shootout trivia
//! tour of Spanish cities. The crate owns the penalty-kick decision engine,
//! the keeper model, the pre-match quiz and the screen flow of the
//! tournament. Rendering, audio and input capture belong to the host.

pub(crate) mod constants;
pub mod direction;
pub mod error;
pub mod flow;
pub mod input;
pub mod numbers;
pub mod oscillator;
pub mod penalty;
pub mod quiz;
pub mod rng;
pub mod session;
pub mod tournament;

// Re-export commonly used types
pub use direction::Direction;
pub use error::{ConfigError, QuizError, SessionError};
pub use flow::{FlowEvent, Screen, next_screen};
pub use input::{DirectionalInput, HeldKeys, KeyIntent, KeyboardState, key_code_to_intent};
pub use oscillator::PowerOscillator;
pub use penalty::{
    AttemptPhase, AttemptResult, AttemptState, KeeperDecision, Outcome, PenaltyConfig,
    PenaltyEvent, PenaltyKickEngine, flight_duration_ms, keeper_decision, outcome_for,
};
pub use quiz::{
    AnswerFeedback, QuizBank, QuizQuestion, QuizRating, QuizRound, QuizScore, QuizThresholds,
    QuizTiming,
};
pub use rng::{CountingRng, RollSource, ScriptedRolls, attempt_seed};
pub use session::{CityRecord, SessionSummary, TournamentSession, normalize_player_name};
pub use tournament::{City, MatchConfig, MatchTable};

/// Frame step a host should assume when it has no real clock.
pub const DEFAULT_FRAME_MS: f64 = constants::DEFAULT_FRAME_MS;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the per-city keeper table.
    ///
    /// # Errors
    ///
    /// Returns an error if the match table cannot be loaded or validated.
    fn load_match_table(&self) -> Result<MatchTable, Self::Error>;

    /// Load the quiz questions for every city.
    ///
    /// # Errors
    ///
    /// Returns an error if the quiz bank cannot be loaded or validated.
    fn load_quiz_bank(&self) -> Result<QuizBank, Self::Error>;
}

/// Loader serving the JSON tables compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedData;

impl DataLoader for EmbeddedData {
    type Error = ConfigError;

    fn load_match_table(&self) -> Result<MatchTable, Self::Error> {
        MatchTable::embedded()
    }

    fn load_quiz_bank(&self) -> Result<QuizBank, Self::Error> {
        QuizBank::embedded()
    }
}

/// Main game engine for creating tournament sessions
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Start a new tournament at the title screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the match table or quiz bank cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<TournamentSession, L::Error> {
        let matches = self.data_loader.load_match_table()?;
        let quizzes = self.data_loader.load_quiz_bank()?;
        Ok(TournamentSession::new(seed, matches, quizzes))
    }

    /// Start a tournament with the player's name already entered.
    ///
    /// # Errors
    ///
    /// Returns an error if the match table or quiz bank cannot be loaded.
    pub fn create_named_session(
        &self,
        seed: u64,
        player_name: &str,
    ) -> Result<TournamentSession, L::Error> {
        let mut session = self.create_session(seed)?;
        session.set_player_name(player_name);
        Ok(session)
    }

    /// Standalone engine for the given city's match, outside any session.
    ///
    /// # Errors
    ///
    /// Returns an error if the match table cannot be loaded.
    pub fn penalty_for(&self, city: City, seed: u64) -> Result<PenaltyKickEngine, L::Error> {
        let matches = self.data_loader.load_match_table()?;
        Ok(PenaltyKickEngine::seeded(matches.penalty_config(city), seed))
    }
}
