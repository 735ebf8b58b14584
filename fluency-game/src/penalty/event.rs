//! Notifications emitted by the penalty engine.
//!
//! Hosts drain these once per frame and sequence their own animations from
//! them: the run-up tween on [`PenaltyEvent::RunUpStarted`], the power bar on
//! [`PenaltyEvent::PowerBarStarted`], the ball flight and keeper dive on
//! [`PenaltyEvent::Resolved`].

use serde::{Deserialize, Serialize};

use crate::constants::{LOG_GOAL, LOG_POWER_BAR, LOG_RUN_UP, LOG_SAVED};
use crate::penalty::{AttemptPhase, AttemptResult, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PenaltyEvent {
    PhaseChanged {
        from: AttemptPhase,
        to: AttemptPhase,
    },
    RunUpStarted {
        duration_ms: u32,
    },
    /// The run-up timer elapsed; aim input is live from here when gating is on.
    RunUpFinished,
    PowerBarStarted {
        ramp_ms: f64,
    },
    Resolved {
        result: AttemptResult,
    },
}

impl PenaltyEvent {
    /// Presentation key for hosts that surface a text log.
    #[must_use]
    pub const fn ui_key(&self) -> Option<&'static str> {
        match self {
            Self::RunUpStarted { .. } => Some(LOG_RUN_UP),
            Self::PowerBarStarted { .. } => Some(LOG_POWER_BAR),
            Self::Resolved { result } => match result.outcome {
                Outcome::Goal => Some(LOG_GOAL),
                Outcome::Saved => Some(LOG_SAVED),
            },
            Self::PhaseChanged { .. } | Self::RunUpFinished => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    #[test]
    fn resolved_event_roundtrips_and_maps_key() {
        let result = AttemptResult::resolve(Direction::Right, 1.0, 0.9, 0.2);
        let event = PenaltyEvent::Resolved { result };
        assert_eq!(event.ui_key(), Some("log.penalty.goal"));

        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"kind\":\"resolved\""));
        let restored: PenaltyEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, event);
    }

    #[test]
    fn phase_change_has_no_ui_key() {
        let event = PenaltyEvent::PhaseChanged {
            from: AttemptPhase::Setup,
            to: AttemptPhase::Aiming,
        };
        assert!(event.ui_key().is_none());
    }
}
