//! Mouse device
//!
//! Tracks the [`EdgeState`] of eight buttons, the per-frame relative motion
//! of three axes (X, Y and the wheel), and the absolute cursor position.
//! Button listeners are registered per (button, state) pair; move listeners
//! are a separate list fired once per frame when the X or Y delta is nonzero.
//!
//! Dispatch uses the same snapshot strategy as the keyboard: each listener
//! list is copied immediately before its callbacks run, so callbacks are free
//! to register and unregister listeners mid-pass.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::foundation::math::Vec2i;

use super::edge::EdgeState;

/// Buttons of the mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Button 0, the left mouse button.
    Button0,
    /// Button 1, the right mouse button.
    Button1,
    /// Button 2, the middle mouse button.
    Button2,
    /// Extra button 3.
    Button3,
    /// Extra button 4.
    Button4,
    /// Extra button 5.
    Button5,
    /// Extra button 6.
    Button6,
    /// Extra button 7.
    Button7,
}

impl MouseButton {
    /// Number of distinct buttons.
    pub const COUNT: usize = Self::ALL.len();

    /// Every button, in registry order.
    pub const ALL: [MouseButton; 8] = [
        MouseButton::Button0,
        MouseButton::Button1,
        MouseButton::Button2,
        MouseButton::Button3,
        MouseButton::Button4,
        MouseButton::Button5,
        MouseButton::Button6,
        MouseButton::Button7,
    ];

    /// Left mouse button.
    pub const LEFT: MouseButton = MouseButton::Button0;
    /// Right mouse button.
    pub const RIGHT: MouseButton = MouseButton::Button1;
    /// Middle mouse button.
    pub const MIDDLE: MouseButton = MouseButton::Button2;

    /// Name of the button as a display string.
    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Button0 => "Left Button",
            MouseButton::Button1 => "Right Button",
            MouseButton::Button2 => "Middle Button",
            MouseButton::Button3 => "Button 3",
            MouseButton::Button4 => "Button 4",
            MouseButton::Button5 => "Button 5",
            MouseButton::Button6 => "Button 6",
            MouseButton::Button7 => "Button 7",
        }
    }
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Axes of the mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAxis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
    /// Wheel axis.
    Wheel,
}

impl MouseAxis {
    /// Number of distinct axes.
    pub const COUNT: usize = 3;

    /// Name of the axis as a display string.
    pub fn name(self) -> &'static str {
        match self {
            MouseAxis::X => "Axis X",
            MouseAxis::Y => "Axis Y",
            MouseAxis::Wheel => "Wheel",
        }
    }
}

/// Callbacks for classes that wish to be notified of mouse changes.
///
/// All methods default to no-ops so implementors only override the events
/// they registered for.
pub trait MouseListener {
    /// Called when the mouse moved this frame, with the motion relative to
    /// the previous frame.
    fn on_mouse_move(&mut self, _rel_x: i32, _rel_y: i32) {}

    /// Called when the given button is up.
    fn on_mouse_button_up(&mut self, _button: MouseButton) {}

    /// Called when the given button is pressed.
    fn on_mouse_button_pressed(&mut self, _button: MouseButton) {}

    /// Called when the given button is down.
    fn on_mouse_button_down(&mut self, _button: MouseButton) {}

    /// Called when the given button is released.
    fn on_mouse_button_released(&mut self, _button: MouseButton) {}
}

/// Shared handle to a mouse listener.
pub type SharedMouseListener = Rc<RefCell<dyn MouseListener>>;

type ListenerSlot = Vec<Weak<RefCell<dyn MouseListener>>>;

/// Access information about the mouse state.
///
/// Created by [`crate::input::InputSubsystem`]; state writes go through the
/// subsystem's frame writer.
pub struct Mouse {
    button_states: RefCell<[EdgeState; MouseButton::COUNT]>,
    axes: [Cell<i32>; MouseAxis::COUNT],
    position: Cell<Vec2i>,
    move_listeners: RefCell<ListenerSlot>,
    button_listeners: RefCell<Vec<[ListenerSlot; EdgeState::COUNT]>>,
}

impl Mouse {
    pub(crate) fn new() -> Self {
        Self {
            button_states: RefCell::new([EdgeState::Up; MouseButton::COUNT]),
            axes: [Cell::new(0), Cell::new(0), Cell::new(0)],
            position: Cell::new(Vec2i::zeros()),
            move_listeners: RefCell::new(Vec::new()),
            button_listeners: RefCell::new(
                (0..MouseButton::COUNT).map(|_| Default::default()).collect(),
            ),
        }
    }

    /// Get the state of a given button.
    pub fn state(&self, button: MouseButton) -> EdgeState {
        self.button_states.borrow()[button as usize]
    }

    /// `true` if the given button is down (or was pressed this frame).
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.state(button).is_down()
    }

    /// `true` if the given button is up (or was released this frame).
    pub fn is_up(&self, button: MouseButton) -> bool {
        self.state(button).is_up()
    }

    /// `true` if the given button went down this frame.
    pub fn was_pressed(&self, button: MouseButton) -> bool {
        self.state(button) == EdgeState::Pressed
    }

    /// `true` if the given button went up this frame.
    pub fn was_released(&self, button: MouseButton) -> bool {
        self.state(button) == EdgeState::Released
    }

    /// Relative motion on the X axis this frame.
    pub fn rel_x(&self) -> i32 {
        self.axes[MouseAxis::X as usize].get()
    }

    /// Relative motion on the Y axis this frame.
    pub fn rel_y(&self) -> i32 {
        self.axes[MouseAxis::Y as usize].get()
    }

    /// Relative motion on the wheel axis this frame.
    pub fn rel_wheel(&self) -> i32 {
        self.axes[MouseAxis::Wheel as usize].get()
    }

    /// Relative motion on the given axis this frame.
    pub fn rel_axis(&self, axis: MouseAxis) -> i32 {
        self.axes[axis as usize].get()
    }

    /// Absolute cursor position in global screen coordinates.
    pub fn position(&self) -> Vec2i {
        self.position.get()
    }

    pub(crate) fn set_button_state(&self, button: MouseButton, state: EdgeState) {
        self.button_states.borrow_mut()[button as usize] = state;
    }

    pub(crate) fn set_axis(&self, axis: MouseAxis, value: i32) {
        self.axes[axis as usize].set(value);
    }

    pub(crate) fn set_position(&self, x: i32, y: i32) {
        self.position.set(Vec2i::new(x, y));
    }

    pub(crate) fn reset_axes(&self) {
        for axis in &self.axes {
            axis.set(0);
        }
    }

    /// Register a listener to be notified of mouse movement.
    pub fn add_move_listener(&self, listener: &SharedMouseListener) {
        let mut slot = self.move_listeners.borrow_mut();
        debug_assert!(
            !slot
                .iter()
                .any(|w| Weak::ptr_eq(w, &Rc::downgrade(listener))),
            "duplicate mouse move listener registration",
        );
        slot.push(Rc::downgrade(listener));
    }

    /// Remove a listener from the move listeners. No-op if absent.
    pub fn remove_move_listener(&self, listener: &SharedMouseListener) {
        self.move_listeners
            .borrow_mut()
            .retain(|w| !Weak::ptr_eq(w, &Rc::downgrade(listener)));
    }

    /// Register a listener for all four states of a button.
    pub fn add_button_listener_all(&self, listener: &SharedMouseListener, button: MouseButton) {
        for state in EdgeState::ALL {
            self.add_button_listener(listener, button, state);
        }
    }

    /// Register a listener to be notified when `button` is in `state`.
    ///
    /// Registering the same listener twice for one (button, state) pair is a
    /// caller error.
    pub fn add_button_listener(
        &self,
        listener: &SharedMouseListener,
        button: MouseButton,
        state: EdgeState,
    ) {
        let mut table = self.button_listeners.borrow_mut();
        let slot = &mut table[button as usize][state as usize];
        debug_assert!(
            !slot
                .iter()
                .any(|w| Weak::ptr_eq(w, &Rc::downgrade(listener))),
            "duplicate mouse listener registration for {button} {state}",
        );
        slot.push(Rc::downgrade(listener));
    }

    /// Remove a listener from all four states of a button.
    pub fn remove_button_listener_all(&self, listener: &SharedMouseListener, button: MouseButton) {
        for state in EdgeState::ALL {
            self.remove_button_listener(listener, button, state);
        }
    }

    /// Remove a listener from one (button, state) pair.
    ///
    /// Removing a listener that is not registered is a no-op. Safe to call
    /// from inside a dispatch callback.
    pub fn remove_button_listener(
        &self,
        listener: &SharedMouseListener,
        button: MouseButton,
        state: EdgeState,
    ) {
        let mut table = self.button_listeners.borrow_mut();
        let slot = &mut table[button as usize][state as usize];
        slot.retain(|w| !Weak::ptr_eq(w, &Rc::downgrade(listener)));
    }

    /// Notify listeners of the current state of every button, then of mouse
    /// movement when the X or Y delta is nonzero.
    pub(crate) fn fire_events(&self) {
        for button in MouseButton::ALL {
            let state = self.state(button);
            for listener in self.snapshot_buttons(button, state) {
                let mut listener = listener.borrow_mut();
                match state {
                    EdgeState::Up => listener.on_mouse_button_up(button),
                    EdgeState::Pressed => listener.on_mouse_button_pressed(button),
                    EdgeState::Down => listener.on_mouse_button_down(button),
                    EdgeState::Released => listener.on_mouse_button_released(button),
                }
            }
        }

        let (rel_x, rel_y) = (self.rel_x(), self.rel_y());
        if rel_x != 0 || rel_y != 0 {
            for listener in self.snapshot_movers() {
                listener.borrow_mut().on_mouse_move(rel_x, rel_y);
            }
        }
    }

    fn snapshot_buttons(&self, button: MouseButton, state: EdgeState) -> Vec<SharedMouseListener> {
        let mut table = self.button_listeners.borrow_mut();
        let slot = &mut table[button as usize][state as usize];
        slot.retain(|w| w.strong_count() > 0);
        slot.iter().filter_map(Weak::upgrade).collect()
    }

    fn snapshot_movers(&self) -> Vec<SharedMouseListener> {
        let mut slot = self.move_listeners.borrow_mut();
        slot.retain(|w| w.strong_count() > 0);
        slot.iter().filter_map(Weak::upgrade).collect()
    }
}
