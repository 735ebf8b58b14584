use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::PLAYER_NAME_MAX_LEN;
use crate::error::SessionError;
use crate::flow::{FlowEvent, Screen, next_screen};
use crate::penalty::{AttemptResult, Outcome, PenaltyKickEngine};
use crate::quiz::{AnswerFeedback, QuizBank, QuizRating, QuizRound, QuizScore};
use crate::rng::attempt_seed;
use crate::tournament::{City, MatchTable};

/// Penalty tally for one city.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRecord {
    pub attempts: u32,
    pub goals: u32,
    pub saves: u32,
}

/// Serializable snapshot of a session for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub player_name: String,
    pub seed: u64,
    pub screen: Screen,
    pub city: City,
    pub champion: bool,
    pub total_attempts: u32,
    pub records: BTreeMap<City, CityRecord>,
    pub quiz_scores: BTreeMap<City, QuizScore>,
}

/// Uppercase the name and cut it to the on-screen limit. Control characters
/// are dropped.
#[must_use]
pub fn normalize_player_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_control())
        .flat_map(char::to_uppercase)
        .take(PLAYER_NAME_MAX_LEN)
        .collect()
}

/// One player's run through the tournament: current screen, the city being
/// played, quiz results and penalty attempts.
#[derive(Debug, Clone)]
pub struct TournamentSession {
    player_name: String,
    seed: u64,
    matches: MatchTable,
    quizzes: QuizBank,
    screen: Screen,
    city: City,
    quiz: Option<QuizRound>,
    engine: Option<PenaltyKickEngine>,
    total_attempts: u32,
    records: BTreeMap<City, CityRecord>,
    quiz_scores: BTreeMap<City, QuizScore>,
}

impl TournamentSession {
    #[must_use]
    pub fn new(seed: u64, matches: MatchTable, quizzes: QuizBank) -> Self {
        Self {
            player_name: String::new(),
            seed,
            matches,
            quizzes,
            screen: Screen::Title,
            city: City::Sevilla,
            quiz: None,
            engine: None,
            total_attempts: 0,
            records: BTreeMap::new(),
            quiz_scores: BTreeMap::new(),
        }
    }

    /// Session with the embedded match table and quiz bank.
    #[must_use]
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(seed, MatchTable::default(), QuizBank::default())
    }

    /// Store the player's name in its display form and return it.
    pub fn set_player_name(&mut self, raw: &str) -> &str {
        self.player_name = normalize_player_name(raw);
        &self.player_name
    }

    /// Apply a flow event and return the screen that is now showing.
    ///
    /// `QuizFinished` and `AttemptFinished` are routed through
    /// [`Self::finish_quiz`] and [`Self::finish_attempt`] so that the
    /// recorded results always match the screen change.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the event does not apply to the current
    /// screen, or its preconditions (a name, a finished quiz, a resolved
    /// attempt with the same outcome) are not met.
    pub fn handle(&mut self, event: FlowEvent) -> Result<Screen, SessionError> {
        match event {
            FlowEvent::QuizFinished => {
                self.finish_quiz()?;
                Ok(self.screen)
            }
            FlowEvent::AttemptFinished(outcome) => {
                let resolved = self
                    .engine
                    .as_ref()
                    .and_then(PenaltyKickEngine::result)
                    .map(|result| result.outcome);
                if resolved.is_some_and(|actual| actual != outcome) {
                    return Err(self.invalid(event));
                }
                self.finish_attempt()?;
                Ok(self.screen)
            }
            FlowEvent::Continue if self.screen == Screen::Title && self.player_name.is_empty() => {
                Err(SessionError::MissingPlayerName)
            }
            FlowEvent::Continue | FlowEvent::Retry | FlowEvent::Quit => self.transition(event),
        }
    }

    fn invalid(&self, event: FlowEvent) -> SessionError {
        SessionError::InvalidTransition {
            screen: self.screen,
            event,
        }
    }

    fn transition(&mut self, event: FlowEvent) -> Result<Screen, SessionError> {
        let from = self.screen;
        let to = next_screen(from, event).ok_or_else(|| self.invalid(event))?;
        log::debug!("screen {from} -> {to} on {event}");
        self.screen = to;
        self.enter(to);
        Ok(to)
    }

    fn enter(&mut self, screen: Screen) {
        if let Some(city) = screen.city() {
            self.city = city;
        }
        self.engine = None;
        self.quiz = match screen {
            Screen::Welcome(city) => Some(self.quizzes.round(city)),
            _ => None,
        };
    }

    /// Build a fresh engine for the current city's match.
    ///
    /// Each call starts a new attempt with its own keeper stream.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAtPenalty`] outside a penalty screen.
    pub fn start_attempt(&mut self) -> Result<&mut PenaltyKickEngine, SessionError> {
        let Screen::Penalty(city) = self.screen else {
            return Err(SessionError::NotAtPenalty(self.screen));
        };
        let seed = attempt_seed(self.seed, self.total_attempts);
        self.total_attempts = self.total_attempts.saturating_add(1);
        let record = self.records.entry(city).or_default();
        record.attempts = record.attempts.saturating_add(1);
        log::debug!(
            "{city} attempt {} (p={:.2})",
            record.attempts,
            self.matches.save_probability(city)
        );
        Ok(self
            .engine
            .insert(PenaltyKickEngine::seeded(self.matches.penalty_config(city), seed)))
    }

    /// Record the resolved attempt and move to the goal or miss screen.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if no attempt was started here, or it has not
    /// been resolved yet.
    pub fn finish_attempt(&mut self) -> Result<AttemptResult, SessionError> {
        let Screen::Penalty(city) = self.screen else {
            return Err(SessionError::NotAtPenalty(self.screen));
        };
        let engine = self.engine.as_ref().ok_or(SessionError::NoAttempt)?;
        let result = *engine.result().ok_or(SessionError::AttemptUnresolved)?;
        let record = self.records.entry(city).or_default();
        match result.outcome {
            Outcome::Goal => record.goals = record.goals.saturating_add(1),
            Outcome::Saved => record.saves = record.saves.saturating_add(1),
        }
        log::info!(
            "{city}: {} (shot {}, keeper {}, power {:.2})",
            result.outcome,
            result.shooter,
            result.keeper,
            result.power
        );
        self.transition(FlowEvent::AttemptFinished(result.outcome))?;
        Ok(result)
    }

    /// Answer the current quiz question.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] outside the welcome screen or when the quiz
    /// rejects the answer.
    pub fn answer_quiz(&mut self, index: usize) -> Result<AnswerFeedback, SessionError> {
        Ok(self.quiz_round_mut()?.answer(index)?)
    }

    /// Record the quiz score and move on to the match.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] outside the welcome screen or while questions
    /// remain.
    pub fn finish_quiz(&mut self) -> Result<QuizScore, SessionError> {
        let round = self.quiz_round_mut()?;
        if !round.is_finished() {
            return Err(SessionError::QuizUnfinished);
        }
        let city = round.city();
        let score = round.score();
        log::info!("{city} quiz: {score} ({})", score.rating());
        self.quiz_scores.insert(city, score);
        self.transition(FlowEvent::QuizFinished)?;
        Ok(score)
    }

    fn quiz_round_mut(&mut self) -> Result<&mut QuizRound, SessionError> {
        if !matches!(self.screen, Screen::Welcome(_)) {
            return Err(SessionError::NotAtQuiz(self.screen));
        }
        self.quiz.as_mut().ok_or(SessionError::NoQuiz)
    }

    /// Step whichever timer the current screen runs.
    pub fn tick(&mut self, dt_ms: f64) -> Option<AnswerFeedback> {
        if let Some(engine) = self.engine.as_mut() {
            engine.tick(dt_ms);
        }
        self.quiz.as_mut().and_then(|round| round.tick(dt_ms))
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub const fn current_city(&self) -> City {
        self.city
    }

    #[must_use]
    pub const fn matches(&self) -> &MatchTable {
        &self.matches
    }

    #[must_use]
    pub const fn attempt(&self) -> Option<&PenaltyKickEngine> {
        self.engine.as_ref()
    }

    pub fn attempt_mut(&mut self) -> Option<&mut PenaltyKickEngine> {
        self.engine.as_mut()
    }

    #[must_use]
    pub const fn quiz(&self) -> Option<&QuizRound> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn quiz_score(&self, city: City) -> Option<QuizScore> {
        self.quiz_scores.get(&city).copied()
    }

    #[must_use]
    pub fn quiz_rating(&self, city: City) -> Option<QuizRating> {
        self.quiz_score(city).map(QuizScore::rating)
    }

    #[must_use]
    pub fn record(&self, city: City) -> CityRecord {
        self.records.get(&city).copied().unwrap_or_default()
    }

    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    #[must_use]
    pub fn is_champion(&self) -> bool {
        matches!(self.screen, Screen::VictoryTrophy | Screen::Champion)
            || (self.screen == Screen::Exit && self.record(City::Barcelona).goals > 0)
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            player_name: self.player_name.clone(),
            seed: self.seed,
            screen: self.screen,
            city: self.city,
            champion: self.is_champion(),
            total_attempts: self.total_attempts,
            records: self.records.clone(),
            quiz_scores: self.quiz_scores.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn at_sevilla_penalty() -> TournamentSession {
        let mut session = TournamentSession::with_defaults(42);
        session.set_player_name("ana");
        for _ in 0..5 {
            session.handle(FlowEvent::Continue).expect("intro");
        }
        assert_eq!(session.screen(), Screen::Welcome(City::Sevilla));
        for choice in [0, 1, 2] {
            session.answer_quiz(choice).expect("answer");
            session.tick(1_500.0);
        }
        session.handle(FlowEvent::QuizFinished).expect("quiz");
        session.handle(FlowEvent::Continue).expect("versus");
        session
    }

    fn shoot(session: &mut TournamentSession, aim: Direction) -> AttemptResult {
        let engine = session.start_attempt().expect("attempt");
        engine.advance();
        engine.sample(aim);
        engine.advance();
        engine.tick(500.0);
        engine.advance();
        session.finish_attempt().expect("finish")
    }

    #[test]
    fn names_are_uppercased_and_truncated() {
        assert_eq!(normalize_player_name("  maria jose garcia "), "MARIA JOSE");
        assert_eq!(normalize_player_name("ñu\n"), "ÑU");
        let mut session = TournamentSession::with_defaults(1);
        assert_eq!(
            session.handle(FlowEvent::Continue),
            Err(SessionError::MissingPlayerName)
        );
        session.set_player_name("leo");
        assert_eq!(session.handle(FlowEvent::Continue), Ok(Screen::Contract));
    }

    #[test]
    fn quiz_score_is_recorded_on_finish() {
        let session = at_sevilla_penalty();
        assert_eq!(session.screen(), Screen::Penalty(City::Sevilla));
        assert_eq!(session.quiz_rating(City::Sevilla), Some(QuizRating::Perfect));
        assert!(session.quiz().is_none());
    }

    #[test]
    fn quiz_cannot_finish_early() {
        let mut session = TournamentSession::with_defaults(3);
        session.set_player_name("x");
        for _ in 0..5 {
            session.handle(FlowEvent::Continue).expect("intro");
        }
        session.answer_quiz(0).expect("answer");
        assert_eq!(
            session.handle(FlowEvent::QuizFinished),
            Err(SessionError::QuizUnfinished)
        );
        assert_eq!(
            session.answer_quiz(1),
            Err(SessionError::Quiz(crate::error::QuizError::FeedbackPending))
        );
    }

    #[test]
    fn attempt_requires_penalty_screen() {
        let mut session = TournamentSession::with_defaults(9);
        assert!(matches!(
            session.start_attempt(),
            Err(SessionError::NotAtPenalty(Screen::Title))
        ));
        let mut session = at_sevilla_penalty();
        assert_eq!(session.finish_attempt(), Err(SessionError::NoAttempt));
        session.start_attempt().expect("attempt").advance();
        assert_eq!(session.finish_attempt(), Err(SessionError::AttemptUnresolved));
    }

    #[test]
    fn resolved_attempt_routes_to_goal_or_miss() {
        let mut session = at_sevilla_penalty();
        let result = shoot(&mut session, Direction::Left);
        let record = session.record(City::Sevilla);
        assert_eq!(record.attempts, 1);
        match result.outcome {
            Outcome::Goal => {
                assert_eq!(session.screen(), Screen::Goal(City::Sevilla));
                assert_eq!(record.goals, 1);
                assert_eq!(session.handle(FlowEvent::Continue), Ok(Screen::CityMap(City::Mallorca)));
                assert_eq!(session.current_city(), City::Mallorca);
            }
            Outcome::Saved => {
                assert_eq!(session.screen(), Screen::Miss(City::Sevilla));
                assert_eq!(record.saves, 1);
                assert_eq!(session.handle(FlowEvent::Retry), Ok(Screen::Penalty(City::Sevilla)));
                assert!(session.attempt().is_none());
            }
        }
        assert_eq!(session.total_attempts(), 1);
    }

    #[test]
    fn attempt_finished_event_must_match_engine() {
        let mut session = at_sevilla_penalty();
        let engine = session.start_attempt().expect("attempt");
        engine.advance();
        engine.advance();
        engine.advance();
        let actual = engine.result().expect("resolved").outcome;
        let wrong = if actual.is_goal() {
            Outcome::Saved
        } else {
            Outcome::Goal
        };
        assert!(matches!(
            session.handle(FlowEvent::AttemptFinished(wrong)),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(session.handle(FlowEvent::AttemptFinished(actual)).is_ok());
    }

    #[test]
    fn same_seed_replays_same_attempts() {
        let run = || {
            let mut session = at_sevilla_penalty();
            shoot(&mut session, Direction::Right)
        };
        assert_eq!(run(), run());
    }
}
