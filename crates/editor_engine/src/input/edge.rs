//! Edge-classified control states
//!
//! Every key and mouse button carries one of four states per frame. `Pressed`
//! and `Released` are one-frame transition markers: a control that stays held
//! reads `Down` on the frame after `Pressed`, and a control that stays
//! released reads `Up` on the frame after `Released`. The platform backend is
//! responsible for producing this classification from raw polling each frame;
//! the devices only store and dispatch it.

/// State of a key or mouse button, classified against the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeState {
    /// The control is up and was up last frame.
    #[default]
    Up,
    /// The control was up and is now down.
    Pressed,
    /// The control is down and was down last frame.
    Down,
    /// The control was down and is now up.
    Released,
}

impl EdgeState {
    /// Number of distinct states.
    pub const COUNT: usize = 4;

    /// All states, in dispatch-table order.
    pub const ALL: [EdgeState; Self::COUNT] = [
        EdgeState::Up,
        EdgeState::Pressed,
        EdgeState::Down,
        EdgeState::Released,
    ];

    /// Classify a control from two consecutive boolean polls.
    ///
    /// This is the transition table a polling backend applies to every
    /// control once per frame before handing the result to
    /// [`crate::input::InputSubsystem`].
    pub fn from_poll(was_down: bool, is_down: bool) -> Self {
        match (was_down, is_down) {
            (false, false) => EdgeState::Up,
            (false, true) => EdgeState::Pressed,
            (true, true) => EdgeState::Down,
            (true, false) => EdgeState::Released,
        }
    }

    /// `true` for `Down` or `Pressed`.
    pub fn is_down(self) -> bool {
        matches!(self, EdgeState::Down | EdgeState::Pressed)
    }

    /// `true` for `Up` or `Released`.
    pub fn is_up(self) -> bool {
        matches!(self, EdgeState::Up | EdgeState::Released)
    }

    /// Name of the state as a string.
    pub fn name(self) -> &'static str {
        match self {
            EdgeState::Up => "Up",
            EdgeState::Pressed => "Pressed",
            EdgeState::Down => "Down",
            EdgeState::Released => "Released",
        }
    }
}

impl std::fmt::Display for EdgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
