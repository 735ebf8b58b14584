//! Pre-match trivia quiz.
//!
//! Every city opens with a short multiple-choice round about the host city
//! and its club. Each question has a time limit; a question that runs out of
//! time counts as a wrong answer. After each answer the round pauses for a
//! feedback window before moving on.
//!
//! The resulting [`QuizRating`] is recorded on the session and reported by
//! the tester. It does not change the keeper's save probability.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{
    QUIZ_FEEDBACK_MS, QUIZ_SUCCESS_FAIR, QUIZ_SUCCESS_GOOD, QUIZ_SUCCESS_PERFECT,
    QUIZ_SUCCESS_POOR, QUIZ_TIME_PER_QUESTION_MS,
};
use crate::error::{ConfigError, QuizError};
use crate::numbers::ratio;
use crate::tournament::City;

const DEFAULT_QUIZ_DATA: &str = include_str!("../assets/quiz.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the single correct answer.
    pub correct: usize,
}

impl QuizQuestion {
    /// Answer label as shown on screen: `A`, `B`, `C`, ...
    #[must_use]
    pub fn option_label(index: usize) -> char {
        u8::try_from(index)
            .ok()
            .and_then(|offset| b'A'.checked_add(offset))
            .map_or('?', char::from)
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTiming {
    #[serde(default = "QuizTiming::default_time_per_question_ms")]
    pub time_per_question_ms: u32,
    #[serde(default = "QuizTiming::default_feedback_ms")]
    pub feedback_ms: u32,
}

impl QuizTiming {
    const fn default_time_per_question_ms() -> u32 {
        QUIZ_TIME_PER_QUESTION_MS
    }

    const fn default_feedback_ms() -> u32 {
        QUIZ_FEEDBACK_MS
    }
}

impl Default for QuizTiming {
    fn default() -> Self {
        Self {
            time_per_question_ms: Self::default_time_per_question_ms(),
            feedback_ms: Self::default_feedback_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuizBankFile {
    #[serde(flatten)]
    timing: QuizTiming,
    cities: BTreeMap<City, Vec<QuizQuestion>>,
}

/// Questions for every city plus the shared round timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizBank {
    timing: QuizTiming,
    cities: BTreeMap<City, Vec<QuizQuestion>>,
}

impl Default for QuizBank {
    fn default() -> Self {
        Self::embedded().unwrap_or_else(|err| {
            log::warn!("embedded quiz bank rejected ({err}); quizzes will be skipped");
            Self::empty()
        })
    }
}

impl QuizBank {
    /// A bank with no questions; every round finishes immediately.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            timing: QuizTiming::default(),
            cities: BTreeMap::new(),
        }
    }

    /// Strictly parse the bank compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded JSON is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_QUIZ_DATA)
    }

    /// Parse and validate a quiz bank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the JSON is malformed, a city has no
    /// questions, or a question does not mark a valid correct answer.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: QuizBankFile =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                table: "quiz bank",
                source,
            })?;
        let bank = Self {
            timing: file.timing,
            cities: file.cities,
        };
        bank.validate()?;
        Ok(bank)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for city in City::ALL {
            let questions = self.questions(city);
            if questions.is_empty() {
                return Err(ConfigError::EmptyQuiz(city));
            }
            for (index, question) in questions.iter().enumerate() {
                if question.options.len() < 2 {
                    return Err(ConfigError::TooFewAnswers { city, index });
                }
                if question.correct >= question.options.len() {
                    return Err(ConfigError::CorrectAnswerOutOfRange {
                        city,
                        index,
                        correct: question.correct,
                        options: question.options.len(),
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn questions(&self, city: City) -> &[QuizQuestion] {
        self.cities.get(&city).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub const fn timing(&self) -> QuizTiming {
        self.timing
    }

    /// Start a fresh round for `city`.
    #[must_use]
    pub fn round(&self, city: City) -> QuizRound {
        QuizRound::new(city, self.questions(city).to_vec(), self.timing)
    }
}

/// What the player sees after answering (or running out of time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub question: usize,
    /// `None` when the question timed out.
    pub chosen: Option<usize>,
    pub correct_option: usize,
    pub is_correct: bool,
}

impl AnswerFeedback {
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        self.chosen.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum RoundState {
    Asking { elapsed_ms: f64 },
    Feedback { remaining_ms: f64 },
    Finished,
}

/// One city's question round, driven by answers and frame ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRound {
    city: City,
    questions: Vec<QuizQuestion>,
    timing: QuizTiming,
    current: usize,
    state: RoundState,
    answers: Vec<AnswerFeedback>,
}

impl QuizRound {
    #[must_use]
    pub fn new(city: City, questions: Vec<QuizQuestion>, timing: QuizTiming) -> Self {
        let state = if questions.is_empty() {
            RoundState::Finished
        } else {
            RoundState::Asking { elapsed_ms: 0.0 }
        };
        Self {
            city,
            questions,
            timing,
            current: 0,
            state,
            answers: Vec::new(),
        }
    }

    #[must_use]
    pub const fn city(&self) -> City {
        self.city
    }

    /// Question awaiting an answer, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.state {
            RoundState::Asking { .. } => self.questions.get(self.current),
            RoundState::Feedback { .. } | RoundState::Finished => None,
        }
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Time left on the current question.
    #[must_use]
    pub fn time_remaining_ms(&self) -> f64 {
        match self.state {
            RoundState::Asking { elapsed_ms } => {
                (f64::from(self.timing.time_per_question_ms) - elapsed_ms).max(0.0)
            }
            RoundState::Feedback { .. } | RoundState::Finished => 0.0,
        }
    }

    #[must_use]
    pub const fn is_showing_feedback(&self) -> bool {
        matches!(self.state, RoundState::Feedback { .. })
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, RoundState::Finished)
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerFeedback] {
        &self.answers
    }

    /// Answer the current question with option `index`.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError`] if the round is over, the previous feedback is
    /// still showing, or `index` is not one of the options.
    pub fn answer(&mut self, index: usize) -> Result<AnswerFeedback, QuizError> {
        match self.state {
            RoundState::Finished => return Err(QuizError::RoundFinished),
            RoundState::Feedback { .. } => return Err(QuizError::FeedbackPending),
            RoundState::Asking { .. } => {}
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(QuizError::RoundFinished)?;
        if index >= question.options.len() {
            return Err(QuizError::AnswerOutOfRange {
                index,
                options: question.options.len(),
            });
        }
        Ok(self.record(Some(index)))
    }

    /// Step the question timer or the feedback window. Returns feedback when
    /// the current question expires during this tick.
    pub fn tick(&mut self, dt_ms: f64) -> Option<AnswerFeedback> {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return None;
        }
        match self.state {
            RoundState::Asking { elapsed_ms } => {
                let elapsed_ms = elapsed_ms + dt_ms;
                if elapsed_ms >= f64::from(self.timing.time_per_question_ms) {
                    log::debug!("quiz {} question {} timed out", self.city, self.current);
                    Some(self.record(None))
                } else {
                    self.state = RoundState::Asking { elapsed_ms };
                    None
                }
            }
            RoundState::Feedback { remaining_ms } => {
                let remaining_ms = remaining_ms - dt_ms;
                if remaining_ms <= 0.0 {
                    self.next_question();
                } else {
                    self.state = RoundState::Feedback { remaining_ms };
                }
                None
            }
            RoundState::Finished => None,
        }
    }

    fn record(&mut self, chosen: Option<usize>) -> AnswerFeedback {
        let correct_option = self.questions.get(self.current).map_or(0, |q| q.correct);
        let feedback = AnswerFeedback {
            question: self.current,
            chosen,
            correct_option,
            is_correct: chosen == Some(correct_option),
        };
        self.answers.push(feedback);
        if self.timing.feedback_ms == 0 {
            self.next_question();
        } else {
            self.state = RoundState::Feedback {
                remaining_ms: f64::from(self.timing.feedback_ms),
            };
        }
        feedback
    }

    fn next_question(&mut self) {
        self.current += 1;
        self.state = if self.current < self.questions.len() {
            RoundState::Asking { elapsed_ms: 0.0 }
        } else {
            RoundState::Finished
        };
    }

    #[must_use]
    pub fn score(&self) -> QuizScore {
        QuizScore {
            correct: self.answers.iter().filter(|a| a.is_correct).count(),
            total: self.questions.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    #[must_use]
    pub fn fraction(self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// One rating step down per missed question.
    #[must_use]
    pub const fn rating(self) -> QuizRating {
        match self.total.saturating_sub(self.correct) {
            0 => QuizRating::Perfect,
            1 => QuizRating::Good,
            2 => QuizRating::Fair,
            _ => QuizRating::Poor,
        }
    }
}

impl fmt::Display for QuizScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizRating {
    Perfect,
    Good,
    Fair,
    Poor,
}

impl QuizRating {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for QuizRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success value attached to each rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizThresholds {
    pub perfect: f64,
    pub good: f64,
    pub fair: f64,
    pub poor: f64,
}

impl Default for QuizThresholds {
    fn default() -> Self {
        Self {
            perfect: QUIZ_SUCCESS_PERFECT,
            good: QUIZ_SUCCESS_GOOD,
            fair: QUIZ_SUCCESS_FAIR,
            poor: QUIZ_SUCCESS_POOR,
        }
    }
}

impl QuizThresholds {
    #[must_use]
    pub const fn success(&self, rating: QuizRating) -> f64 {
        match rating {
            QuizRating::Perfect => self.perfect,
            QuizRating::Good => self.good,
            QuizRating::Fair => self.fair,
            QuizRating::Poor => self.poor,
        }
    }

    #[must_use]
    pub const fn success_for(&self, score: QuizScore) -> f64 {
        self.success(score.rating())
    }
}
