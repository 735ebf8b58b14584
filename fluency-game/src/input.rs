//! Keyboard and directional input surface consumed by the penalty engine.

use crate::direction::Direction;
use serde::{Deserialize, Serialize};

/// Anything that can report the player's current directional intent.
pub trait DirectionalInput {
    fn direction(&self) -> Direction;
}

impl DirectionalInput for Direction {
    fn direction(&self) -> Direction {
        *self
    }
}

/// Two held buttons, resolved left-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldKeys {
    pub left: bool,
    pub right: bool,
}

impl DirectionalInput for HeldKeys {
    fn direction(&self) -> Direction {
        Direction::from_held(self.left, self.right)
    }
}

/// Logical meaning of a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyIntent {
    Left,
    Right,
    Advance,
}

// Maps KeyboardEvent.code such as "ArrowLeft" or "KeyD"
#[must_use]
pub fn key_code_to_intent(code: &str) -> Option<KeyIntent> {
    match code {
        "ArrowLeft" | "KeyA" => Some(KeyIntent::Left),
        "ArrowRight" | "KeyD" => Some(KeyIntent::Right),
        "Space" | "Enter" | "NumpadEnter" => Some(KeyIntent::Advance),
        _ => None,
    }
}

// Bit per physical advance key
fn advance_bit(code: &str) -> u8 {
    match code {
        "Space" => 0b001,
        "Enter" => 0b010,
        "NumpadEnter" => 0b100,
        _ => 0,
    }
}

/// Tracks held keys and turns advance presses into one-shot triggers.
///
/// Repeated `keydown` events for a key that is already held are dropped, so
/// operating-system key repeat cannot fire more than one advance per press.
/// Each advance key is tracked on its own, so pressing Enter while Space is
/// held still counts as a press.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HeldKeys,
    advance_held: u8,
    pending_advances: u32,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns `true` when the press produced a new advance trigger.
    pub fn key_down(&mut self, code: &str) -> bool {
        match key_code_to_intent(code) {
            Some(KeyIntent::Left) => {
                self.held.left = true;
                false
            }
            Some(KeyIntent::Right) => {
                self.held.right = true;
                false
            }
            Some(KeyIntent::Advance) => {
                let bit = advance_bit(code);
                if self.advance_held & bit != 0 {
                    return false;
                }
                self.advance_held |= bit;
                self.pending_advances = self.pending_advances.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, code: &str) {
        match key_code_to_intent(code) {
            Some(KeyIntent::Left) => self.held.left = false,
            Some(KeyIntent::Right) => self.held.right = false,
            Some(KeyIntent::Advance) => self.advance_held &= !advance_bit(code),
            None => {}
        }
    }

    /// Consume one queued advance trigger.
    pub fn take_advance(&mut self) -> bool {
        if self.pending_advances == 0 {
            return false;
        }
        self.pending_advances -= 1;
        true
    }

    #[must_use]
    pub const fn held(&self) -> HeldKeys {
        self.held
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl DirectionalInput for KeyboardState {
    fn direction(&self) -> Direction {
        self.held.direction()
    }
}
