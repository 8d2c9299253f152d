//! Input subsystem
//!
//! Owns the one [`Keyboard`] and one [`Mouse`] instance and drives the
//! per-frame dispatch. A platform backend implements [`InputBackend`] and is
//! handed a [`DeviceWriter`] once per frame; the writer is the only path to
//! the devices' state setters, so every write for a frame necessarily
//! completes before [`InputSubsystem::update`] fires that frame's events.
//!
//! The subsystem is singleton-scoped: one active viewport's input at a time,
//! on the thread driving the render loop. Construction installs the instance
//! in a thread-local slot so collaborators reach the devices through the
//! [`InputSubsystem::keyboard`] / [`InputSubsystem::mouse`] accessors, which
//! fail with [`InputError::NotInitialized`] when no instance is alive.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

use super::edge::EdgeState;
use super::keyboard::{Key, Keyboard};
use super::mouse::{Mouse, MouseAxis, MouseButton};

/// Input subsystem errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// A device accessor was called before an [`InputSubsystem`] existed.
    #[error("input subsystem has not been initialized")]
    NotInitialized,
}

/// Per-frame hardware poller.
///
/// Implementations poll the platform, classify every control with
/// [`EdgeState::from_poll`] (or equivalent), and write the result through
/// the supplied [`DeviceWriter`]. Each control must be written once per
/// frame.
pub trait InputBackend {
    /// Poll hardware and write this frame's control states.
    fn poll(&mut self, writer: &mut DeviceWriter<'_>);
}

/// Write access to the devices, valid for a single frame.
///
/// Only handed out by [`InputSubsystem::update`], which keeps the frame
/// protocol honest: all writes happen strictly before dispatch.
pub struct DeviceWriter<'a> {
    keyboard: &'a Keyboard,
    mouse: &'a Mouse,
}

impl DeviceWriter<'_> {
    /// Update the state of a keyboard key.
    pub fn set_key_state(&mut self, key: Key, state: EdgeState) {
        self.keyboard.set_state(key, state);
    }

    /// Update the state of a mouse button.
    pub fn set_mouse_button_state(&mut self, button: MouseButton, state: EdgeState) {
        self.mouse.set_button_state(button, state);
    }

    /// Update the relative motion of a mouse axis for this frame.
    pub fn set_mouse_axis(&mut self, axis: MouseAxis, value: i32) {
        self.mouse.set_axis(axis, value);
    }

    /// Update the absolute cursor position in global screen coordinates.
    pub fn set_mouse_position(&mut self, x: i32, y: i32) {
        self.mouse.set_position(x, y);
    }
}

thread_local! {
    static ACTIVE: RefCell<Weak<InputSubsystem>> = RefCell::new(Weak::new());
}

/// Manages access to the input devices.
pub struct InputSubsystem {
    keyboard: Rc<Keyboard>,
    mouse: Rc<Mouse>,
}

impl InputSubsystem {
    /// Create the subsystem and install it as the thread's active instance.
    ///
    /// A later instance replaces an earlier one in the accessor slot; the
    /// accessors fail again once the returned handle is dropped.
    pub fn new() -> Rc<Self> {
        let subsystem = Rc::new(Self {
            keyboard: Rc::new(Keyboard::new()),
            mouse: Rc::new(Mouse::new()),
        });
        ACTIVE.with(|slot| *slot.borrow_mut() = Rc::downgrade(&subsystem));
        log::debug!("input subsystem initialized");
        subsystem
    }

    /// The thread's active subsystem.
    pub fn instance() -> Result<Rc<Self>, InputError> {
        ACTIVE.with(|slot| slot.borrow().upgrade().ok_or(InputError::NotInitialized))
    }

    /// The keyboard device of the active subsystem.
    pub fn keyboard() -> Result<Rc<Keyboard>, InputError> {
        Ok(Self::instance()?.keyboard.clone())
    }

    /// The mouse device of the active subsystem.
    pub fn mouse() -> Result<Rc<Mouse>, InputError> {
        Ok(Self::instance()?.mouse.clone())
    }

    /// The keyboard device of this subsystem.
    pub fn keyboard_device(&self) -> &Rc<Keyboard> {
        &self.keyboard
    }

    /// The mouse device of this subsystem.
    pub fn mouse_device(&self) -> &Rc<Mouse> {
        &self.mouse
    }

    /// Run one input frame: poll the backend, then fire events exactly once.
    ///
    /// Axis deltas are reset before polling so a backend that reports no
    /// motion leaves them at zero.
    pub fn update(&self, backend: &mut dyn InputBackend) {
        self.mouse.reset_axes();
        let mut writer = DeviceWriter {
            keyboard: &self.keyboard,
            mouse: &self.mouse,
        };
        backend.poll(&mut writer);
        self.fire_events();
    }

    /// Notify the device listeners of the changes to the devices.
    pub fn fire_events(&self) {
        self.keyboard.fire_events();
        self.mouse.fire_events();
    }
}
