//! Error types for the fallible edges of the crate.
//!
//! The penalty engine itself never fails; misuse is a no-op. Errors only
//! arise when loading data tables and when driving a session or quiz round
//! out of order.

use thiserror::Error;

use crate::flow::{FlowEvent, Screen};
use crate::tournament::City;

/// Errors raised while parsing or validating embedded data tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {table}: {source}")]
    Parse {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("save probability for {city} must be between 0.00 and 1.00 (got {value:.2})")]
    SaveProbability { city: City, value: f64 },
    #[error("match table has no entry for {0}")]
    MissingCity(City),
    #[error("match table lists {0} more than once")]
    DuplicateCity(City),
    #[error("quiz bank has no questions for {0}")]
    EmptyQuiz(City),
    #[error("question {index} for {city} marks option {correct} correct but has {options} options")]
    CorrectAnswerOutOfRange {
        city: City,
        index: usize,
        correct: usize,
        options: usize,
    },
    #[error("question {index} for {city} needs at least two answers")]
    TooFewAnswers { city: City, index: usize },
}

/// Errors raised when a tournament session is driven out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot start a penalty attempt from the {0} screen")]
    NotAtPenalty(Screen),
    #[error("cannot start a quiz from the {0} screen")]
    NotAtQuiz(Screen),
    #[error("penalty attempt has not been resolved yet")]
    AttemptUnresolved,
    #[error("no penalty attempt in progress")]
    NoAttempt,
    #[error("no quiz round in progress")]
    NoQuiz,
    #[error("quiz round still has unanswered questions")]
    QuizUnfinished,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("enter a player name before continuing")]
    MissingPlayerName,
    #[error("{event} is not valid on the {screen} screen")]
    InvalidTransition { screen: Screen, event: FlowEvent },
}

/// Errors raised while answering quiz questions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("answer {index} out of range (question has {options} options)")]
    AnswerOutOfRange { index: usize, options: usize },
    #[error("quiz round is already finished")]
    RoundFinished,
    #[error("previous answer is still being shown")]
    FeedbackPending,
}
