//! Cities of the tournament and the per-match keeper table.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{SAVE_PROBABILITY_FINAL, SAVE_PROBABILITY_NORMAL};
use crate::error::ConfigError;
use crate::penalty::PenaltyConfig;

const DEFAULT_MATCH_DATA: &str = include_str!("../assets/matches.json");

/// Host city of one match, in tournament order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum City {
    Sevilla,
    Mallorca,
    Madrid,
    Barcelona,
}

impl City {
    pub const ALL: [Self; 4] = [Self::Sevilla, Self::Mallorca, Self::Madrid, Self::Barcelona];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Sevilla => 0,
            Self::Mallorca => 1,
            Self::Madrid => 2,
            Self::Barcelona => 3,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// City of the following match; `None` after the final.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Barcelona)
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sevilla => "sevilla",
            Self::Mallorca => "mallorca",
            Self::Madrid => "madrid",
            Self::Barcelona => "barcelona",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sevilla => "Sevilla",
            Self::Mallorca => "Mallorca",
            Self::Madrid => "Madrid",
            Self::Barcelona => "Barcelona",
        }
    }

    /// Home club faced in this city.
    #[must_use]
    pub const fn club(self) -> &'static str {
        match self {
            Self::Sevilla => "Sevilla FC",
            Self::Mallorca => "RCD Mallorca",
            Self::Madrid => "Real Madrid",
            Self::Barcelona => "FC Barcelona",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for City {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|city| city.key().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Keeper tuning and presentation metadata for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub city: City,
    pub opponent: String,
    pub save_probability: f64,
}

impl MatchConfig {
    #[must_use]
    pub fn penalty_config(&self) -> PenaltyConfig {
        PenaltyConfig::with_save_probability(self.save_probability)
    }
}

#[derive(Debug, Deserialize)]
struct MatchTableFile {
    matches: Vec<MatchConfig>,
}

/// One validated [`MatchConfig`] per city, stored in tournament order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTable {
    matches: Vec<MatchConfig>,
}

impl Default for MatchTable {
    fn default() -> Self {
        Self::embedded().unwrap_or_else(|err| {
            log::warn!("embedded match table rejected ({err}); using built-in values");
            Self::builtin()
        })
    }
}

impl MatchTable {
    /// Strictly parse the table compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded JSON is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_MATCH_DATA)
    }

    /// Table compiled into the binary from the constants module.
    #[must_use]
    pub fn builtin() -> Self {
        let matches = City::ALL
            .into_iter()
            .map(|city| MatchConfig {
                city,
                opponent: city.club().to_string(),
                save_probability: if city.is_final() {
                    SAVE_PROBABILITY_FINAL
                } else {
                    SAVE_PROBABILITY_NORMAL
                },
            })
            .collect();
        Self { matches }
    }

    /// Parse and validate a table from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed, a probability lies
    /// outside `[0, 1]`, or a city is missing or duplicated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: MatchTableFile =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                table: "match table",
                source,
            })?;
        Self::from_matches(file.matches)
    }

    /// Validate a list of matches and order it by city.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid entry.
    pub fn from_matches(mut matches: Vec<MatchConfig>) -> Result<Self, ConfigError> {
        matches.sort_by_key(|entry| entry.city);
        for pair in matches.windows(2) {
            if pair[0].city == pair[1].city {
                return Err(ConfigError::DuplicateCity(pair[0].city));
            }
        }
        for city in City::ALL {
            let Some(entry) = matches.iter().find(|entry| entry.city == city) else {
                return Err(ConfigError::MissingCity(city));
            };
            let value = entry.save_probability;
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(ConfigError::SaveProbability { city, value });
            }
        }
        Ok(Self { matches })
    }

    #[must_use]
    pub fn get(&self, city: City) -> &MatchConfig {
        // validated: exactly one entry per city, sorted by index
        &self.matches[city.index()]
    }

    #[must_use]
    pub fn save_probability(&self, city: City) -> f64 {
        self.get(city).save_probability
    }

    #[must_use]
    pub fn penalty_config(&self, city: City) -> PenaltyConfig {
        self.get(city).penalty_config()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchConfig> {
        self.matches.iter()
    }
}
