//! # Input-event core
//!
//! Turns raw per-frame hardware polling into typed, edge-classified events.
//!
//! A platform backend classifies every control once per frame ([`EdgeState`]),
//! writes the result through the [`InputSubsystem`], and the subsystem then
//! dispatches one pass of callbacks to whatever listeners are registered for
//! each (control, state) pair. Dispatch is frame-synchronous and serial;
//! listeners may re-register during the pass (see the device modules for the
//! exact safety contract).

pub mod edge;
pub mod keyboard;
pub mod mouse;
pub mod state;
pub mod subsystem;

pub use edge::EdgeState;
pub use keyboard::{Key, Keyboard, KeyboardListener, Modifiers, SharedKeyboardListener};
pub use mouse::{Mouse, MouseAxis, MouseButton, MouseListener, SharedMouseListener};
pub use state::InputState;
pub use subsystem::{DeviceWriter, InputBackend, InputError, InputSubsystem};
