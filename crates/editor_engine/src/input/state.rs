//! Declarative input trigger descriptors
//!
//! An [`InputState`] names exactly one trigger condition: a (key, state)
//! pair or a (button, state) pair. Manipulators declare their activation and
//! deactivation triggers as values of this type so a host can compare and
//! deduplicate them uniformly across the two device axes.

use super::edge::EdgeState;
use super::keyboard::Key;
use super::mouse::MouseButton;

/// A single keyboard or mouse trigger condition.
///
/// Exactly one of the two sides is populated; the other stays at its `None`
/// sentinel. Two values are equal iff every field matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    key: Option<Key>,
    key_state: EdgeState,
    button: Option<MouseButton>,
    button_state: EdgeState,
}

impl InputState {
    /// A trigger that fires when `key` reaches `state`.
    pub fn key(key: Key, state: EdgeState) -> Self {
        Self {
            key: Some(key),
            key_state: state,
            button: None,
            button_state: EdgeState::Up,
        }
    }

    /// A trigger that fires when `button` reaches `state`.
    pub fn button(button: MouseButton, state: EdgeState) -> Self {
        Self {
            key: None,
            key_state: EdgeState::Up,
            button: Some(button),
            button_state: state,
        }
    }

    /// The key side of the trigger, if this is a key trigger.
    pub fn get_key(&self) -> Option<Key> {
        self.key
    }

    /// The state the key side triggers on.
    pub fn key_state(&self) -> EdgeState {
        self.key_state
    }

    /// The button side of the trigger, if this is a button trigger.
    pub fn get_button(&self) -> Option<MouseButton> {
        self.button
    }

    /// The state the button side triggers on.
    pub fn button_state(&self) -> EdgeState {
        self.button_state
    }

    /// `true` if this trigger names exactly (`key`, `state`).
    pub fn matches_key(&self, key: Key, state: EdgeState) -> bool {
        self.key == Some(key) && self.key_state == state
    }

    /// `true` if this trigger names exactly (`button`, `state`).
    pub fn matches_button(&self, button: MouseButton, state: EdgeState) -> bool {
        self.button == Some(button) && self.button_state == state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_trigger_matches_only_its_pair() {
        let trigger = InputState::key(Key::R, EdgeState::Pressed);
        assert!(trigger.matches_key(Key::R, EdgeState::Pressed));
        assert!(!trigger.matches_key(Key::R, EdgeState::Released));
        assert!(!trigger.matches_key(Key::T, EdgeState::Pressed));
        assert!(!trigger.matches_button(MouseButton::LEFT, EdgeState::Pressed));
    }

    #[test]
    fn test_button_trigger_matches_only_its_pair() {
        let trigger = InputState::button(MouseButton::RIGHT, EdgeState::Released);
        assert!(trigger.matches_button(MouseButton::RIGHT, EdgeState::Released));
        assert!(!trigger.matches_button(MouseButton::RIGHT, EdgeState::Pressed));
        assert!(!trigger.matches_key(Key::W, EdgeState::Released));
    }

    #[test]
    fn test_equality_is_field_wise() {
        assert_eq!(
            InputState::key(Key::T, EdgeState::Pressed),
            InputState::key(Key::T, EdgeState::Pressed)
        );
        assert_ne!(
            InputState::key(Key::T, EdgeState::Pressed),
            InputState::key(Key::T, EdgeState::Released)
        );
        assert_ne!(
            InputState::key(Key::T, EdgeState::Pressed),
            InputState::button(MouseButton::LEFT, EdgeState::Pressed)
        );
    }
}
