//! Keyboard device
//!
//! Stores the [`EdgeState`] of every key for the current frame and owns the
//! per-(key, state) listener registry. State is only written through the
//! [`crate::input::InputSubsystem`] frame writer; everything else reads.
//!
//! The registry uses interior mutability so listeners may add or remove
//! registrations from inside a dispatch callback. `fire_events` snapshots
//! each (key, state) list immediately before invoking it, which guarantees
//! every listener registered at dispatch time fires exactly once no matter
//! what the callbacks do to the registry.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use super::edge::EdgeState;

/// Keys of the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // variant names are the documentation
pub enum Key {
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,

    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,

    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,

    Escape,

    NumLock,
    NumPad0,
    NumPad1,
    NumPad2,
    NumPad3,
    NumPad4,
    NumPad5,
    NumPad6,
    NumPad7,
    NumPad8,
    NumPad9,
    NumPadEnter,
    /// (-) on numeric keypad
    NumSubtract,
    /// (+) on numeric keypad
    NumAdd,
    /// (*) on numeric keypad
    NumMultiply,
    /// (/) on numeric keypad
    NumDivide,
    /// Decimal point on numeric keypad
    NumPoint,

    /// Left square bracket [
    LeftBracket,
    LeftCtrl,
    LeftAlt,
    LeftShift,
    /// Left OS logo key
    LeftSuper,

    /// Right square bracket ]
    RightBracket,
    RightCtrl,
    RightAlt,
    RightShift,
    /// Right OS logo key
    RightSuper,

    PrintScreen,
    ScrollLock,
    Pause,

    Spacebar,
    Backspace,
    /// Enter on the main keyboard
    Enter,
    Tab,

    /// Application (context menu) key
    Apps,
    CapsLock,

    /// (/) on the main keyboard
    Slash,
    Backslash,
    Comma,
    Semicolon,
    /// (.) on the main keyboard
    Period,
    /// (`) grave accent
    Grave,
    Apostrophe,
    /// (-) on the main keyboard
    Minus,
    /// (=) on the main keyboard
    Equals,
}

impl Key {
    /// Number of distinct keys.
    pub const COUNT: usize = Self::ALL.len();

    /// Every key, in registry order.
    pub const ALL: [Key; 107] = [
        Key::Num0,
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Num5,
        Key::Num6,
        Key::Num7,
        Key::Num8,
        Key::Num9,
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
        Key::G,
        Key::H,
        Key::I,
        Key::J,
        Key::K,
        Key::L,
        Key::M,
        Key::N,
        Key::O,
        Key::P,
        Key::Q,
        Key::R,
        Key::S,
        Key::T,
        Key::U,
        Key::V,
        Key::W,
        Key::X,
        Key::Y,
        Key::Z,
        Key::F1,
        Key::F2,
        Key::F3,
        Key::F4,
        Key::F5,
        Key::F6,
        Key::F7,
        Key::F8,
        Key::F9,
        Key::F10,
        Key::F11,
        Key::F12,
        Key::F13,
        Key::F14,
        Key::F15,
        Key::UpArrow,
        Key::DownArrow,
        Key::LeftArrow,
        Key::RightArrow,
        Key::Home,
        Key::End,
        Key::PageUp,
        Key::PageDown,
        Key::Insert,
        Key::Delete,
        Key::Escape,
        Key::NumLock,
        Key::NumPad0,
        Key::NumPad1,
        Key::NumPad2,
        Key::NumPad3,
        Key::NumPad4,
        Key::NumPad5,
        Key::NumPad6,
        Key::NumPad7,
        Key::NumPad8,
        Key::NumPad9,
        Key::NumPadEnter,
        Key::NumSubtract,
        Key::NumAdd,
        Key::NumMultiply,
        Key::NumDivide,
        Key::NumPoint,
        Key::LeftBracket,
        Key::LeftCtrl,
        Key::LeftAlt,
        Key::LeftShift,
        Key::LeftSuper,
        Key::RightBracket,
        Key::RightCtrl,
        Key::RightAlt,
        Key::RightShift,
        Key::RightSuper,
        Key::PrintScreen,
        Key::ScrollLock,
        Key::Pause,
        Key::Spacebar,
        Key::Backspace,
        Key::Enter,
        Key::Tab,
        Key::Apps,
        Key::CapsLock,
        Key::Slash,
        Key::Backslash,
        Key::Comma,
        Key::Semicolon,
        Key::Period,
        Key::Grave,
        Key::Apostrophe,
        Key::Minus,
        Key::Equals,
    ];

    /// Name of the key as a display string.
    pub fn name(self) -> &'static str {
        match self {
            Key::Num0 => "0",
            Key::Num1 => "1",
            Key::Num2 => "2",
            Key::Num3 => "3",
            Key::Num4 => "4",
            Key::Num5 => "5",
            Key::Num6 => "6",
            Key::Num7 => "7",
            Key::Num8 => "8",
            Key::Num9 => "9",
            Key::A => "A",
            Key::B => "B",
            Key::C => "C",
            Key::D => "D",
            Key::E => "E",
            Key::F => "F",
            Key::G => "G",
            Key::H => "H",
            Key::I => "I",
            Key::J => "J",
            Key::K => "K",
            Key::L => "L",
            Key::M => "M",
            Key::N => "N",
            Key::O => "O",
            Key::P => "P",
            Key::Q => "Q",
            Key::R => "R",
            Key::S => "S",
            Key::T => "T",
            Key::U => "U",
            Key::V => "V",
            Key::W => "W",
            Key::X => "X",
            Key::Y => "Y",
            Key::Z => "Z",
            Key::F1 => "F1",
            Key::F2 => "F2",
            Key::F3 => "F3",
            Key::F4 => "F4",
            Key::F5 => "F5",
            Key::F6 => "F6",
            Key::F7 => "F7",
            Key::F8 => "F8",
            Key::F9 => "F9",
            Key::F10 => "F10",
            Key::F11 => "F11",
            Key::F12 => "F12",
            Key::F13 => "F13",
            Key::F14 => "F14",
            Key::F15 => "F15",
            Key::UpArrow => "Up Arrow",
            Key::DownArrow => "Down Arrow",
            Key::LeftArrow => "Left Arrow",
            Key::RightArrow => "Right Arrow",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "Page Up",
            Key::PageDown => "Page Down",
            Key::Insert => "Insert",
            Key::Delete => "Delete",
            Key::Escape => "Escape",
            Key::NumLock => "NumLock",
            Key::NumPad0 => "NumPad 0",
            Key::NumPad1 => "NumPad 1",
            Key::NumPad2 => "NumPad 2",
            Key::NumPad3 => "NumPad 3",
            Key::NumPad4 => "NumPad 4",
            Key::NumPad5 => "NumPad 5",
            Key::NumPad6 => "NumPad 6",
            Key::NumPad7 => "NumPad 7",
            Key::NumPad8 => "NumPad 8",
            Key::NumPad9 => "NumPad 9",
            Key::NumPadEnter => "NumPad Enter",
            Key::NumSubtract => "NumPad -",
            Key::NumAdd => "NumPad +",
            Key::NumMultiply => "NumPad *",
            Key::NumDivide => "NumPad /",
            Key::NumPoint => "NumPad .",
            Key::LeftBracket => "[",
            Key::LeftCtrl => "Left Ctrl",
            Key::LeftAlt => "Left Alt",
            Key::LeftShift => "Left Shift",
            Key::LeftSuper => "Left Super",
            Key::RightBracket => "]",
            Key::RightCtrl => "Right Ctrl",
            Key::RightAlt => "Right Alt",
            Key::RightShift => "Right Shift",
            Key::RightSuper => "Right Super",
            Key::PrintScreen => "Print Screen",
            Key::ScrollLock => "Scroll Lock",
            Key::Pause => "Pause",
            Key::Spacebar => "Spacebar",
            Key::Backspace => "Backspace",
            Key::Enter => "Enter",
            Key::Tab => "Tab",
            Key::Apps => "Application Key",
            Key::CapsLock => "Caps Lock",
            Key::Slash => "/",
            Key::Backslash => "\\",
            Key::Comma => ",",
            Key::Semicolon => ";",
            Key::Period => ".",
            Key::Grave => "`",
            Key::Apostrophe => "'",
            Key::Minus => "-",
            Key::Equals => "=",
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Modifier keys currently held, derived from the per-key states.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        /// Either Ctrl key is down.
        const CTRL = 1;
        /// Either Alt key is down.
        const ALT = 1 << 1;
        /// Either Shift key is down.
        const SHIFT = 1 << 2;
    }
}

/// Callbacks for classes that wish to be notified of keyboard changes.
///
/// All methods default to no-ops so implementors only override the states
/// they registered for.
pub trait KeyboardListener {
    /// Called when the given key is up.
    fn on_key_up(&mut self, _key: Key) {}

    /// Called when the given key is pressed.
    fn on_key_pressed(&mut self, _key: Key) {}

    /// Called when the given key is down.
    fn on_key_down(&mut self, _key: Key) {}

    /// Called when the given key is released.
    fn on_key_released(&mut self, _key: Key) {}
}

/// Shared handle to a keyboard listener.
pub type SharedKeyboardListener = Rc<RefCell<dyn KeyboardListener>>;

type ListenerSlot = Vec<Weak<RefCell<dyn KeyboardListener>>>;

/// Access information about the keyboard state.
///
/// Created by [`crate::input::InputSubsystem`]; state writes go through the
/// subsystem's frame writer.
pub struct Keyboard {
    states: RefCell<[EdgeState; Key::COUNT]>,
    listeners: RefCell<Vec<[ListenerSlot; EdgeState::COUNT]>>,
}

impl Keyboard {
    pub(crate) fn new() -> Self {
        Self {
            states: RefCell::new([EdgeState::Up; Key::COUNT]),
            listeners: RefCell::new((0..Key::COUNT).map(|_| Default::default()).collect()),
        }
    }

    /// Get the state of a given key.
    pub fn state(&self, key: Key) -> EdgeState {
        self.states.borrow()[key as usize]
    }

    /// `true` if the given key is down (or was pressed this frame).
    pub fn is_down(&self, key: Key) -> bool {
        self.state(key).is_down()
    }

    /// `true` if the given key is up (or was released this frame).
    pub fn is_up(&self, key: Key) -> bool {
        self.state(key).is_up()
    }

    /// `true` if the given key went down this frame.
    pub fn was_pressed(&self, key: Key) -> bool {
        self.state(key) == EdgeState::Pressed
    }

    /// `true` if the given key went up this frame.
    pub fn was_released(&self, key: Key) -> bool {
        self.state(key) == EdgeState::Released
    }

    /// `true` if one of the two Ctrl keys is down.
    pub fn is_ctrl_down(&self) -> bool {
        self.is_down(Key::LeftCtrl) || self.is_down(Key::RightCtrl)
    }

    /// `true` if one of the two Alt keys is down.
    pub fn is_alt_down(&self) -> bool {
        self.is_down(Key::LeftAlt) || self.is_down(Key::RightAlt)
    }

    /// `true` if one of the two Shift keys is down.
    pub fn is_shift_down(&self) -> bool {
        self.is_down(Key::LeftShift) || self.is_down(Key::RightShift)
    }

    /// The set of modifier keys currently held.
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        if self.is_ctrl_down() {
            mods |= Modifiers::CTRL;
        }
        if self.is_alt_down() {
            mods |= Modifiers::ALT;
        }
        if self.is_shift_down() {
            mods |= Modifiers::SHIFT;
        }
        mods
    }

    pub(crate) fn set_state(&self, key: Key, state: EdgeState) {
        self.states.borrow_mut()[key as usize] = state;
    }

    /// Register a listener for all four states of a key.
    pub fn add_key_listener_all(&self, listener: &SharedKeyboardListener, key: Key) {
        for state in EdgeState::ALL {
            self.add_key_listener(listener, key, state);
        }
    }

    /// Register a listener to be notified when `key` is in `state`.
    ///
    /// Registering the same listener twice for one (key, state) pair is a
    /// caller error.
    pub fn add_key_listener(&self, listener: &SharedKeyboardListener, key: Key, state: EdgeState) {
        let mut table = self.listeners.borrow_mut();
        let slot = &mut table[key as usize][state as usize];
        debug_assert!(
            !slot
                .iter()
                .any(|w| Weak::ptr_eq(w, &Rc::downgrade(listener))),
            "duplicate keyboard listener registration for {key} {state}",
        );
        slot.push(Rc::downgrade(listener));
    }

    /// Remove a listener from all four states of a key.
    pub fn remove_key_listener_all(&self, listener: &SharedKeyboardListener, key: Key) {
        for state in EdgeState::ALL {
            self.remove_key_listener(listener, key, state);
        }
    }

    /// Remove a listener from one (key, state) pair.
    ///
    /// Removing a listener that is not registered is a no-op. Safe to call
    /// from inside a dispatch callback.
    pub fn remove_key_listener(
        &self,
        listener: &SharedKeyboardListener,
        key: Key,
        state: EdgeState,
    ) {
        let mut table = self.listeners.borrow_mut();
        let slot = &mut table[key as usize][state as usize];
        slot.retain(|w| !Weak::ptr_eq(w, &Rc::downgrade(listener)));
    }

    /// Notify listeners of the current state of every key.
    ///
    /// Each (key, state) list is snapshotted before its callbacks run, so a
    /// callback mutating any registration list never invalidates the pass.
    pub(crate) fn fire_events(&self) {
        for key in Key::ALL {
            let state = self.state(key);
            for listener in self.snapshot(key, state) {
                let mut listener = listener.borrow_mut();
                match state {
                    EdgeState::Up => listener.on_key_up(key),
                    EdgeState::Pressed => listener.on_key_pressed(key),
                    EdgeState::Down => listener.on_key_down(key),
                    EdgeState::Released => listener.on_key_released(key),
                }
            }
        }
    }

    fn snapshot(&self, key: Key, state: EdgeState) -> Vec<SharedKeyboardListener> {
        let mut table = self.listeners.borrow_mut();
        let slot = &mut table[key as usize][state as usize];
        slot.retain(|w| w.strong_count() > 0);
        slot.iter().filter_map(Weak::upgrade).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<(Key, EdgeState)>,
    }

    impl KeyboardListener for Recorder {
        fn on_key_up(&mut self, key: Key) {
            self.events.push((key, EdgeState::Up));
        }
        fn on_key_pressed(&mut self, key: Key) {
            self.events.push((key, EdgeState::Pressed));
        }
        fn on_key_down(&mut self, key: Key) {
            self.events.push((key, EdgeState::Down));
        }
        fn on_key_released(&mut self, key: Key) {
            self.events.push((key, EdgeState::Released));
        }
    }

    fn shared(recorder: Recorder) -> (Rc<RefCell<Recorder>>, SharedKeyboardListener) {
        let rc = Rc::new(RefCell::new(recorder));
        let listener: SharedKeyboardListener = rc.clone();
        (rc, listener)
    }

    #[test]
    fn test_key_table_is_closed() {
        assert_eq!(Key::COUNT, Key::ALL.len());
        // Indices must be dense and in declaration order for the registry.
        for (index, key) in Key::ALL.iter().enumerate() {
            assert_eq!(*key as usize, index);
        }
    }

    #[test]
    fn test_edge_round_trip_fires_once_each() {
        let keyboard = Keyboard::new();
        let (rc, listener) = shared(Recorder::default());
        keyboard.add_key_listener(&listener, Key::W, EdgeState::Pressed);
        keyboard.add_key_listener(&listener, Key::W, EdgeState::Down);

        keyboard.set_state(Key::W, EdgeState::Pressed);
        keyboard.fire_events();
        keyboard.set_state(Key::W, EdgeState::Down);
        keyboard.fire_events();

        assert_eq!(
            rc.borrow().events,
            vec![(Key::W, EdgeState::Pressed), (Key::W, EdgeState::Down)]
        );
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let keyboard = Keyboard::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        struct Tagged {
            tag: u32,
            order: Rc<RefCell<Vec<u32>>>,
        }
        impl KeyboardListener for Tagged {
            fn on_key_pressed(&mut self, _key: Key) {
                self.order.borrow_mut().push(self.tag);
            }
        }

        let listeners: Vec<SharedKeyboardListener> = (0..3)
            .map(|tag| {
                Rc::new(RefCell::new(Tagged {
                    tag,
                    order: order.clone(),
                })) as SharedKeyboardListener
            })
            .collect();
        for listener in &listeners {
            keyboard.add_key_listener(listener, Key::Spacebar, EdgeState::Pressed);
        }

        keyboard.set_state(Key::Spacebar, EdgeState::Pressed);
        keyboard.fire_events();

        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_unregistered_is_noop() {
        let keyboard = Keyboard::new();
        let (_rc, listener) = shared(Recorder::default());
        // Never registered for this pair; must not panic or disturb anything.
        keyboard.remove_key_listener(&listener, Key::A, EdgeState::Down);
    }

    #[test]
    fn test_listener_removing_itself_during_dispatch() {
        let keyboard = Rc::new(Keyboard::new());

        struct SelfRemover {
            keyboard: Rc<Keyboard>,
            me: Option<SharedKeyboardListener>,
            fired: u32,
        }
        impl KeyboardListener for SelfRemover {
            fn on_key_pressed(&mut self, key: Key) {
                self.fired += 1;
                let me = self.me.take().expect("fired twice");
                self.keyboard
                    .remove_key_listener(&me, key, EdgeState::Pressed);
            }
        }

        let remover = Rc::new(RefCell::new(SelfRemover {
            keyboard: keyboard.clone(),
            me: None,
            fired: 0,
        }));
        let handle: SharedKeyboardListener = remover.clone();
        remover.borrow_mut().me = Some(handle.clone());

        let (after_rc, after) = shared(Recorder::default());
        keyboard.add_key_listener(&handle, Key::E, EdgeState::Pressed);
        keyboard.add_key_listener(&after, Key::E, EdgeState::Pressed);

        keyboard.set_state(Key::E, EdgeState::Pressed);
        keyboard.fire_events();

        // The remover fired exactly once and the listener after it still ran.
        assert_eq!(remover.borrow().fired, 1);
        assert_eq!(after_rc.borrow().events, vec![(Key::E, EdgeState::Pressed)]);

        // Next frame the remover is gone.
        keyboard.set_state(Key::E, EdgeState::Pressed);
        keyboard.fire_events();
        assert_eq!(remover.borrow().fired, 1);
        assert_eq!(after_rc.borrow().events.len(), 2);
    }

    #[test]
    fn test_listener_added_mid_dispatch_waits_a_frame() {
        let keyboard = Rc::new(Keyboard::new());

        struct Adder {
            keyboard: Rc<Keyboard>,
            to_add: Option<SharedKeyboardListener>,
        }
        impl KeyboardListener for Adder {
            fn on_key_pressed(&mut self, key: Key) {
                if let Some(listener) = self.to_add.take() {
                    self.keyboard
                        .add_key_listener(&listener, key, EdgeState::Pressed);
                }
            }
        }

        let (late_rc, late) = shared(Recorder::default());
        let adder = Rc::new(RefCell::new(Adder {
            keyboard: keyboard.clone(),
            to_add: Some(late),
        }));
        let adder_handle: SharedKeyboardListener = adder.clone();
        keyboard.add_key_listener(&adder_handle, Key::G, EdgeState::Pressed);

        keyboard.set_state(Key::G, EdgeState::Pressed);
        keyboard.fire_events();
        // The newly added listener is not part of this frame's snapshot.
        assert!(late_rc.borrow().events.is_empty());

        keyboard.set_state(Key::G, EdgeState::Pressed);
        keyboard.fire_events();
        assert_eq!(late_rc.borrow().events, vec![(Key::G, EdgeState::Pressed)]);
    }

    #[test]
    fn test_modifier_flags() {
        let keyboard = Keyboard::new();
        assert_eq!(keyboard.modifiers(), Modifiers::empty());

        keyboard.set_state(Key::LeftCtrl, EdgeState::Down);
        keyboard.set_state(Key::RightShift, EdgeState::Pressed);
        assert!(keyboard.is_ctrl_down());
        assert!(keyboard.is_shift_down());
        assert!(!keyboard.is_alt_down());
        assert_eq!(keyboard.modifiers(), Modifiers::CTRL | Modifiers::SHIFT);
    }
}
