//! Shot and dive directions.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Horizontal side of the goal, shared by the shooter's aim and the keeper's dive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    #[default]
    Centre,
    Right,
}

impl Direction {
    pub const ALL: [Self; 3] = [Self::Left, Self::Centre, Self::Right];

    /// Map a signed aim value onto a side by its sign.
    #[must_use]
    pub const fn from_signed(value: i8) -> Self {
        if value < 0 {
            Self::Left
        } else if value > 0 {
            Self::Right
        } else {
            Self::Centre
        }
    }

    /// Signed aim value in `{-1, 0, +1}`.
    #[must_use]
    pub const fn signed(self) -> i8 {
        match self {
            Self::Left => -1,
            Self::Centre => 0,
            Self::Right => 1,
        }
    }

    /// Resolve two held buttons into a direction. Left wins when both are held.
    #[must_use]
    pub const fn from_held(left: bool, right: bool) -> Self {
        if left {
            Self::Left
        } else if right {
            Self::Right
        } else {
            Self::Centre
        }
    }

    /// Side a keeper dives to after guessing wrong against this aim.
    ///
    /// A central or left shot sends the keeper right, a right shot sends
    /// the keeper left. The result is never [`Direction::Centre`].
    #[must_use]
    pub const fn wrong_guess_dive(self) -> Self {
        if self.signed() <= 0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Centre => "centre",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "-1" => Ok(Self::Left),
            "centre" | "center" | "c" | "0" => Ok(Self::Centre),
            "right" | "r" | "1" | "+1" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

impl From<Direction> for i8 {
    fn from(value: Direction) -> Self {
        value.signed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_roundtrip_and_sign_mapping() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_signed(direction.signed()), direction);
        }
        assert_eq!(Direction::from_signed(-7), Direction::Left);
        assert_eq!(Direction::from_signed(42), Direction::Right);
    }

    #[test]
    fn left_beats_right_when_both_held() {
        assert_eq!(Direction::from_held(true, true), Direction::Left);
        assert_eq!(Direction::from_held(false, true), Direction::Right);
        assert_eq!(Direction::from_held(false, false), Direction::Centre);
    }

    #[test]
    fn wrong_guess_never_dives_centre() {
        assert_eq!(Direction::Left.wrong_guess_dive(), Direction::Right);
        assert_eq!(Direction::Centre.wrong_guess_dive(), Direction::Right);
        assert_eq!(Direction::Right.wrong_guess_dive(), Direction::Left);
    }

    #[test]
    fn parses_labels() {
        assert_eq!("Center".parse::<Direction>(), Ok(Direction::Centre));
        assert_eq!("r".parse::<Direction>(), Ok(Direction::Right));
        assert!("up".parse::<Direction>().is_err());
        assert_eq!(Direction::Left.to_string(), "left");
    }
}
