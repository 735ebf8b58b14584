use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a single penalty attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    #[default]
    Setup,
    Aiming,
    Power,
    Resolved,
}

impl AttemptPhase {
    /// Phase reached by one advance trigger. `Resolved` is terminal.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Setup => Some(Self::Aiming),
            Self::Aiming => Some(Self::Power),
            Self::Power => Some(Self::Resolved),
            Self::Resolved => None,
        }
    }

    /// Whether directional input is sampled in this phase.
    #[must_use]
    pub const fn samples_direction(self) -> bool {
        matches!(self, Self::Aiming | Self::Power)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Aiming => "aiming",
            Self::Power => "power",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order_and_stop() {
        let mut phase = AttemptPhase::Setup;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            assert!(next > phase);
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                AttemptPhase::Setup,
                AttemptPhase::Aiming,
                AttemptPhase::Power,
                AttemptPhase::Resolved
            ]
        );
        assert!(phase.is_terminal());
    }

    #[test]
    fn only_aim_and_power_sample() {
        assert!(!AttemptPhase::Setup.samples_direction());
        assert!(AttemptPhase::Aiming.samples_direction());
        assert!(AttemptPhase::Power.samples_direction());
        assert!(!AttemptPhase::Resolved.samples_direction());
    }
}
