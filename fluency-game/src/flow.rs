//! Screen-to-screen progression through the tournament.
//!
//! [`next_screen`] is a pure transition table. It only knows about screens
//! and events; the session decides when events happen and keeps the
//! counters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::penalty::Outcome;
use crate::tournament::City;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "screen", content = "city", rename_all = "snake_case")]
pub enum Screen {
    /// Name entry.
    #[default]
    Title,
    Contract,
    Newspaper,
    ChangingRoom,
    CityMap(City),
    /// City introduction followed by the quiz.
    Welcome(City),
    Versus(City),
    Penalty(City),
    Goal(City),
    Miss(City),
    VictoryTrophy,
    Champion,
    Exit,
}

impl Screen {
    /// City the screen belongs to, if any.
    #[must_use]
    pub const fn city(self) -> Option<City> {
        match self {
            Self::CityMap(city)
            | Self::Welcome(city)
            | Self::Versus(city)
            | Self::Penalty(city)
            | Self::Goal(city)
            | Self::Miss(city) => Some(city),
            Self::Title
            | Self::Contract
            | Self::Newspaper
            | Self::ChangingRoom
            | Self::VictoryTrophy
            | Self::Champion
            | Self::Exit => None,
        }
    }

    #[must_use]
    pub const fn is_penalty(self) -> bool {
        matches!(self, Self::Penalty(_))
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exit)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Contract => "contract",
            Self::Newspaper => "newspaper",
            Self::ChangingRoom => "changing room",
            Self::CityMap(_) => "map",
            Self::Welcome(_) => "welcome",
            Self::Versus(_) => "versus",
            Self::Penalty(_) => "penalty",
            Self::Goal(_) => "goal",
            Self::Miss(_) => "miss",
            Self::VictoryTrophy => "victory trophy",
            Self::Champion => "champion",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.city() {
            Some(city) => write!(f, "{city} {}", self.as_str()),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Inputs that move the game between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", content = "outcome", rename_all = "snake_case")]
pub enum FlowEvent {
    /// Space/Enter on a screen that only waits for the player.
    Continue,
    QuizFinished,
    AttemptFinished(Outcome),
    Retry,
    Quit,
}

impl fmt::Display for FlowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::QuizFinished => f.write_str("quiz finished"),
            Self::AttemptFinished(outcome) => write!(f, "attempt finished ({outcome})"),
            Self::Retry => f.write_str("retry"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// Screen reached from `screen` on `event`, or `None` if the event does not
/// apply there.
#[must_use]
pub fn next_screen(screen: Screen, event: FlowEvent) -> Option<Screen> {
    use FlowEvent::{AttemptFinished, Continue, Quit, QuizFinished, Retry};

    let next = match (screen, event) {
        (Screen::Title, Continue) => Screen::Contract,
        (Screen::Contract, Continue) => Screen::Newspaper,
        (Screen::Newspaper, Continue) => Screen::ChangingRoom,
        (Screen::ChangingRoom, Continue) => Screen::CityMap(City::Sevilla),
        (Screen::CityMap(city), Continue) => Screen::Welcome(city),
        (Screen::Welcome(city), QuizFinished) => Screen::Versus(city),
        (Screen::Versus(city), Continue) => Screen::Penalty(city),
        (Screen::Penalty(city), AttemptFinished(Outcome::Goal)) if city.is_final() => {
            Screen::VictoryTrophy
        }
        (Screen::Penalty(city), AttemptFinished(Outcome::Goal)) => Screen::Goal(city),
        (Screen::Penalty(city), AttemptFinished(Outcome::Saved)) => Screen::Miss(city),
        (Screen::Goal(city), Continue) => Screen::CityMap(city.next()?),
        (Screen::Miss(city), Retry) => Screen::Penalty(city),
        (Screen::VictoryTrophy, Continue) => Screen::Champion,
        (Screen::Miss(_) | Screen::Champion, Quit) | (Screen::Champion, Continue) => Screen::Exit,
        _ => return None,
    };
    Some(next)
}
