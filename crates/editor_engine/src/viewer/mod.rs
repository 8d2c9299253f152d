//! # Viewer — manipulator arbitration
//!
//! The [`Viewer`] owns an ordered collection of manipulators, registers
//! itself on the devices for every activation/deactivation trigger they
//! declare, and enforces the exclusivity invariant: at most one manipulator
//! is active per viewport at any time.
//!
//! Activation is gated by click origin. On every press the viewer recomputes
//! whether the cursor sits inside its surface; presses that originate
//! outside never activate anything, and button presses additionally push the
//! focus flag to every manipulator so their own drag handlers can ignore
//! input that started elsewhere.

pub mod surface;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::input::{
    EdgeState, InputError, InputState, InputSubsystem, Key, Keyboard, KeyboardListener, Mouse,
    MouseButton, MouseListener, SharedKeyboardListener, SharedMouseListener,
};
use crate::manipulator::{ActiveBindings, Manipulator};
use crate::scene::{EntityId, World};

pub use surface::{FixedRect, ViewportSurface};

/// One registered manipulator, with the pre-coerced listener handles the
/// devices need.
struct ManipulatorEntry {
    manipulator: Rc<RefCell<dyn Manipulator>>,
    keyboard_listener: SharedKeyboardListener,
    mouse_listener: SharedMouseListener,
}

/// A key or button event being arbitrated.
#[derive(Clone, Copy)]
enum TriggerEvent {
    Key(Key, EdgeState),
    Button(MouseButton, EdgeState),
}

impl TriggerEvent {
    fn matches(self, input: &InputState) -> bool {
        match self {
            TriggerEvent::Key(key, state) => input.matches_key(key, state),
            TriggerEvent::Button(button, state) => input.matches_button(button, state),
        }
    }
}

fn same_manipulator(a: &Rc<RefCell<dyn Manipulator>>, b: &Rc<RefCell<dyn Manipulator>>) -> bool {
    std::ptr::eq(Rc::as_ptr(a).cast::<u8>(), Rc::as_ptr(b).cast::<u8>())
}

/// Manages manipulator activation and deactivation for one viewport.
pub struct Viewer {
    keyboard: Rc<Keyboard>,
    mouse: Rc<Mouse>,
    surface: Rc<dyn ViewportSurface>,
    self_weak: Weak<RefCell<Viewer>>,
    entries: Vec<ManipulatorEntry>,
    active: Option<Rc<RefCell<dyn Manipulator>>>,
    key_press_in_viewport: bool,
    button_press_in_viewport: bool,
    // Host-side registration set: one device registration per distinct
    // trigger pair, shared across manipulators. Not reference counted, so
    // removing one of two manipulators sharing a pair unregisters it for
    // both.
    registered_key_pairs: Vec<(Key, EdgeState)>,
    registered_button_pairs: Vec<(MouseButton, EdgeState)>,
}

impl Viewer {
    /// Create a viewer over the given surface, wired to the active input
    /// subsystem.
    pub fn new(surface: Rc<dyn ViewportSurface>) -> Result<Rc<RefCell<Self>>, InputError> {
        let keyboard = InputSubsystem::keyboard()?;
        let mouse = InputSubsystem::mouse()?;
        let viewer = Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                keyboard,
                mouse,
                surface,
                self_weak: weak.clone(),
                entries: Vec::new(),
                active: None,
                key_press_in_viewport: false,
                button_press_in_viewport: false,
                registered_key_pairs: Vec::new(),
                registered_button_pairs: Vec::new(),
            })
        });
        // Focus tracking needs every left press, whether or not any
        // manipulator triggers on it.
        viewer
            .borrow_mut()
            .listen_button_pair(MouseButton::LEFT, EdgeState::Pressed);
        Ok(viewer)
    }

    /// Unregister every device listener this viewer holds.
    pub fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            self.deactivate_manipulator(&active);
        }
        for (key, state) in std::mem::take(&mut self.registered_key_pairs) {
            if let Some(listener) = self.self_keyboard_listener() {
                self.keyboard.remove_key_listener(&listener, key, state);
            }
        }
        for (button, state) in std::mem::take(&mut self.registered_button_pairs) {
            if let Some(listener) = self.self_mouse_listener() {
                self.mouse.remove_button_listener(&listener, button, state);
            }
        }
    }

    /// Register a manipulator and start listening for its triggers.
    ///
    /// For each trigger pair the viewer registers itself at most once, even
    /// when several manipulators share the pair; a deactivation trigger
    /// identical to the same manipulator's activation trigger is skipped
    /// outright.
    pub fn add_manipulator<M: Manipulator + 'static>(&mut self, manipulator: &Rc<RefCell<M>>) {
        let entry = ManipulatorEntry {
            manipulator: Rc::clone(manipulator) as Rc<RefCell<dyn Manipulator>>,
            keyboard_listener: Rc::clone(manipulator) as SharedKeyboardListener,
            mouse_listener: Rc::clone(manipulator) as SharedMouseListener,
        };
        let activation = entry.manipulator.borrow().activation_input();
        let deactivation = entry.manipulator.borrow().deactivation_input();
        log::debug!("added manipulator '{}'", entry.manipulator.borrow().name());
        self.entries.push(entry);

        if let Some(key) = activation.get_key() {
            self.listen_key_pair(key, activation.key_state());
        }
        if let Some(button) = activation.get_button() {
            self.listen_button_pair(button, activation.button_state());
        }
        if let Some(key) = deactivation.get_key() {
            if !activation.matches_key(key, deactivation.key_state()) {
                self.listen_key_pair(key, deactivation.key_state());
            }
        }
        if let Some(button) = deactivation.get_button() {
            if !activation.matches_button(button, deactivation.button_state()) {
                self.listen_button_pair(button, deactivation.button_state());
            }
        }
    }

    /// Remove a manipulator and stop listening for its triggers.
    ///
    /// The trigger pairs are unregistered wholesale; another manipulator
    /// still sharing one of them loses its trigger too.
    pub fn remove_manipulator<M: Manipulator + 'static>(&mut self, manipulator: &Rc<RefCell<M>>) {
        let as_dyn = Rc::clone(manipulator) as Rc<RefCell<dyn Manipulator>>;
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| same_manipulator(&entry.manipulator, &as_dyn))
        else {
            return;
        };

        if self
            .active
            .as_ref()
            .is_some_and(|active| same_manipulator(active, &as_dyn))
        {
            self.deactivate_manipulator(&as_dyn);
        }
        self.entries.remove(index);
        log::debug!("removed manipulator '{}'", as_dyn.borrow().name());

        let activation = as_dyn.borrow().activation_input();
        let deactivation = as_dyn.borrow().deactivation_input();

        if let Some(key) = activation.get_key() {
            self.unlisten_key_pair(key, activation.key_state());
        }
        if let Some(button) = activation.get_button() {
            self.unlisten_button_pair(button, activation.button_state());
        }
        if let Some(key) = deactivation.get_key() {
            if !activation.matches_key(key, deactivation.key_state()) {
                self.unlisten_key_pair(key, deactivation.key_state());
            }
        }
        if let Some(button) = deactivation.get_button() {
            if !activation.matches_button(button, deactivation.button_state()) {
                self.unlisten_button_pair(button, deactivation.button_state());
            }
        }
    }

    /// The active manipulator, if any.
    pub fn active_manipulator(&self) -> Option<Rc<RefCell<dyn Manipulator>>> {
        self.active.clone()
    }

    /// Hand the selection to every manipulator whose capability predicate
    /// accepts it.
    pub fn set_manipulated_entities(&self, world: &World, entities: &[EntityId]) {
        for entry in &self.entries {
            let mut manipulator = entry.manipulator.borrow_mut();
            if manipulator.can_manipulate_all(world, entities) {
                manipulator.set_manipulated_entities(entities);
            } else {
                log::debug!("manipulator '{}' rejected the selection", manipulator.name());
            }
        }
    }

    fn self_keyboard_listener(&self) -> Option<SharedKeyboardListener> {
        self.self_weak
            .upgrade()
            .map(|viewer| viewer as SharedKeyboardListener)
    }

    fn self_mouse_listener(&self) -> Option<SharedMouseListener> {
        self.self_weak
            .upgrade()
            .map(|viewer| viewer as SharedMouseListener)
    }

    fn listen_key_pair(&mut self, key: Key, state: EdgeState) {
        if self.registered_key_pairs.contains(&(key, state)) {
            return;
        }
        if let Some(listener) = self.self_keyboard_listener() {
            self.keyboard.add_key_listener(&listener, key, state);
            self.registered_key_pairs.push((key, state));
        }
    }

    fn unlisten_key_pair(&mut self, key: Key, state: EdgeState) {
        if let Some(index) = self
            .registered_key_pairs
            .iter()
            .position(|pair| *pair == (key, state))
        {
            self.registered_key_pairs.remove(index);
            if let Some(listener) = self.self_keyboard_listener() {
                self.keyboard.remove_key_listener(&listener, key, state);
            }
        }
    }

    fn listen_button_pair(&mut self, button: MouseButton, state: EdgeState) {
        if self.registered_button_pairs.contains(&(button, state)) {
            return;
        }
        if let Some(listener) = self.self_mouse_listener() {
            self.mouse.add_button_listener(&listener, button, state);
            self.registered_button_pairs.push((button, state));
        }
    }

    fn unlisten_button_pair(&mut self, button: MouseButton, state: EdgeState) {
        if let Some(index) = self
            .registered_button_pairs
            .iter()
            .position(|pair| *pair == (button, state))
        {
            self.registered_button_pairs.remove(index);
            if let Some(listener) = self.self_mouse_listener() {
                self.mouse.remove_button_listener(&listener, button, state);
            }
        }
    }

    fn register_bindings(
        &self,
        keyboard_listener: &SharedKeyboardListener,
        mouse_listener: &SharedMouseListener,
        bindings: &ActiveBindings,
    ) {
        for &(key, state) in &bindings.keys {
            self.keyboard.add_key_listener(keyboard_listener, key, state);
        }
        for &(button, state) in &bindings.buttons {
            self.mouse.add_button_listener(mouse_listener, button, state);
        }
        if bindings.mouse_move {
            self.mouse.add_move_listener(mouse_listener);
        }
    }

    fn unregister_bindings(
        &self,
        keyboard_listener: &SharedKeyboardListener,
        mouse_listener: &SharedMouseListener,
        bindings: &ActiveBindings,
    ) {
        for &(key, state) in &bindings.keys {
            self.keyboard
                .remove_key_listener(keyboard_listener, key, state);
        }
        for &(button, state) in &bindings.buttons {
            self.mouse
                .remove_button_listener(mouse_listener, button, state);
        }
        if bindings.mouse_move {
            self.mouse.remove_move_listener(mouse_listener);
        }
    }

    /// Deactivate the current manipulator or activate the first match, in
    /// registration order.
    fn arbitrate(&mut self, event: TriggerEvent) {
        if let Some(active) = self.active.clone() {
            let deactivation = active.borrow().deactivation_input();
            if event.matches(&deactivation) {
                self.deactivate_manipulator(&active);
                return;
            }
        }

        let candidate = self.entries.iter().position(|entry| {
            let manipulator = entry.manipulator.borrow();
            !manipulator.is_activated() && event.matches(&manipulator.activation_input())
        });
        if let Some(index) = candidate {
            self.activate_by_index(index);
        }
    }

    fn activate_by_index(&mut self, index: usize) {
        // Exclusivity: whoever was active goes down before the newcomer
        // comes up.
        if let Some(previous) = self.active.take() {
            self.deactivate_manipulator(&previous);
        }

        let manipulator = Rc::clone(&self.entries[index].manipulator);
        let keyboard_listener = self.entries[index].keyboard_listener.clone();
        let mouse_listener = self.entries[index].mouse_listener.clone();

        manipulator.borrow_mut().base_mut().set_activated(true);
        let bindings = manipulator.borrow().active_bindings();
        self.register_bindings(&keyboard_listener, &mouse_listener, &bindings);
        manipulator.borrow_mut().on_activate();
        log::debug!("activated manipulator '{}'", manipulator.borrow().name());
        self.active = Some(manipulator);
    }

    fn deactivate_manipulator(&mut self, manipulator: &Rc<RefCell<dyn Manipulator>>) {
        manipulator.borrow_mut().base_mut().set_activated(false);

        let listeners = self
            .entries
            .iter()
            .find(|entry| same_manipulator(&entry.manipulator, manipulator))
            .map(|entry| {
                (
                    entry.keyboard_listener.clone(),
                    entry.mouse_listener.clone(),
                )
            });
        if let Some((keyboard_listener, mouse_listener)) = listeners {
            let bindings = manipulator.borrow().active_bindings();
            self.unregister_bindings(&keyboard_listener, &mouse_listener, &bindings);
        }

        manipulator.borrow_mut().on_deactivate();
        log::debug!("deactivated manipulator '{}'", manipulator.borrow().name());

        if self
            .active
            .as_ref()
            .is_some_and(|active| same_manipulator(active, manipulator))
        {
            self.active = None;
        }
    }
}

impl KeyboardListener for Viewer {
    fn on_key_pressed(&mut self, key: Key) {
        let position = self.mouse.position();
        self.key_press_in_viewport = self.surface.contains_global(position);
        if !self.key_press_in_viewport {
            return;
        }

        self.arbitrate(TriggerEvent::Key(key, EdgeState::Pressed));
    }

    fn on_key_released(&mut self, key: Key) {
        if !self.key_press_in_viewport {
            return;
        }

        self.arbitrate(TriggerEvent::Key(key, EdgeState::Released));
    }
}

impl MouseListener for Viewer {
    fn on_mouse_button_pressed(&mut self, button: MouseButton) {
        let position = self.mouse.position();
        self.button_press_in_viewport = self.surface.contains_global(position);

        // Every manipulator learns where this press originated, whether or
        // not anything activates.
        for entry in &self.entries {
            entry
                .manipulator
                .borrow_mut()
                .set_focus(self.button_press_in_viewport);
        }

        if !self.button_press_in_viewport {
            return;
        }

        self.arbitrate(TriggerEvent::Button(button, EdgeState::Pressed));
    }

    fn on_mouse_button_released(&mut self, button: MouseButton) {
        if !self.button_press_in_viewport {
            return;
        }

        self.arbitrate(TriggerEvent::Button(button, EdgeState::Released));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlySettings;
    use crate::foundation::math::Vec3;
    use crate::input::{DeviceWriter, InputBackend, MouseAxis};
    use crate::manipulator::{CameraFlyManipulator, EditorContext, ManipulatorBase};
    use crate::render::Camera;
    use approx::assert_relative_eq;

    struct FnBackend<F: FnMut(&mut DeviceWriter<'_>)>(F);

    impl<F: FnMut(&mut DeviceWriter<'_>)> InputBackend for FnBackend<F> {
        fn poll(&mut self, writer: &mut DeviceWriter<'_>) {
            (self.0)(writer);
        }
    }

    fn frame(subsystem: &InputSubsystem, poll: impl FnMut(&mut DeviceWriter<'_>)) {
        subsystem.update(&mut FnBackend(poll));
    }

    struct TestManipulator {
        base: ManipulatorBase,
        name: &'static str,
        activation: InputState,
        deactivation: InputState,
        activations: u32,
        deactivations: u32,
    }

    impl TestManipulator {
        fn new(name: &'static str, activation: InputState, deactivation: InputState) -> Self {
            Self {
                base: ManipulatorBase::default(),
                name,
                activation,
                deactivation,
                activations: 0,
                deactivations: 0,
            }
        }
    }

    impl KeyboardListener for TestManipulator {}
    impl MouseListener for TestManipulator {}

    impl Manipulator for TestManipulator {
        fn base(&self) -> &ManipulatorBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ManipulatorBase {
            &mut self.base
        }
        fn name(&self) -> &'static str {
            self.name
        }
        fn activation_input(&self) -> InputState {
            self.activation
        }
        fn deactivation_input(&self) -> InputState {
            self.deactivation
        }
        fn on_activate(&mut self) {
            self.activations += 1;
        }
        fn on_deactivate(&mut self) {
            self.deactivations += 1;
        }
        fn can_manipulate(&self, _world: &World, _entity: EntityId) -> bool {
            true
        }
        fn set_manipulated_entities(&mut self, _entities: &[EntityId]) {}
    }

    fn active_count(viewer: &Viewer) -> usize {
        viewer
            .entries
            .iter()
            .filter(|entry| entry.manipulator.borrow().is_activated())
            .count()
    }

    const INSIDE: (i32, i32) = (400, 300);
    const OUTSIDE: (i32, i32) = (2000, 300);

    fn rig() -> (Rc<InputSubsystem>, Rc<RefCell<Viewer>>) {
        let subsystem = InputSubsystem::new();
        let viewer = Viewer::new(Rc::new(FixedRect::new(0, 0, 800, 600))).unwrap();
        (subsystem, viewer)
    }

    #[test]
    fn test_viewer_requires_input_subsystem() {
        assert!(matches!(
            Viewer::new(Rc::new(FixedRect::new(0, 0, 1, 1))),
            Err(InputError::NotInitialized)
        ));
    }

    #[test]
    fn test_press_inside_activates_and_release_deactivates() {
        let (subsystem, viewer) = rig();
        let manipulator = Rc::new(RefCell::new(TestManipulator::new(
            "a",
            InputState::key(Key::Q, EdgeState::Pressed),
            InputState::key(Key::Q, EdgeState::Released),
        )));
        viewer.borrow_mut().add_manipulator(&manipulator);

        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_key_state(Key::Q, EdgeState::Pressed);
        });
        assert!(manipulator.borrow().is_activated());
        assert_eq!(manipulator.borrow().activations, 1);

        frame(&subsystem, |writer| {
            writer.set_key_state(Key::Q, EdgeState::Released);
        });
        assert!(!manipulator.borrow().is_activated());
        assert_eq!(manipulator.borrow().deactivations, 1);
        assert!(viewer.borrow().active_manipulator().is_none());
    }

    #[test]
    fn test_focus_gating_blocks_outside_presses() {
        let (subsystem, viewer) = rig();
        let manipulator = Rc::new(RefCell::new(TestManipulator::new(
            "a",
            InputState::key(Key::Q, EdgeState::Pressed),
            InputState::key(Key::Q, EdgeState::Released),
        )));
        viewer.borrow_mut().add_manipulator(&manipulator);

        frame(&subsystem, |writer| {
            writer.set_mouse_position(OUTSIDE.0, OUTSIDE.1);
            writer.set_key_state(Key::Q, EdgeState::Pressed);
        });
        assert!(!manipulator.borrow().is_activated());
        assert_eq!(manipulator.borrow().activations, 0);
    }

    #[test]
    fn test_focus_flag_follows_press_origin() {
        let (subsystem, viewer) = rig();
        let manipulator = Rc::new(RefCell::new(TestManipulator::new(
            "a",
            InputState::key(Key::Q, EdgeState::Pressed),
            InputState::key(Key::Q, EdgeState::Released),
        )));
        viewer.borrow_mut().add_manipulator(&manipulator);

        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_mouse_button_state(MouseButton::LEFT, EdgeState::Pressed);
        });
        assert!(manipulator.borrow().has_focus());

        frame(&subsystem, |writer| {
            writer.set_mouse_button_state(MouseButton::LEFT, EdgeState::Released);
        });
        frame(&subsystem, |writer| {
            writer.set_mouse_position(OUTSIDE.0, OUTSIDE.1);
            writer.set_mouse_button_state(MouseButton::LEFT, EdgeState::Pressed);
        });
        assert!(!manipulator.borrow().has_focus());
    }

    #[test]
    fn test_exclusive_takeover() {
        let (subsystem, viewer) = rig();
        let first = Rc::new(RefCell::new(TestManipulator::new(
            "first",
            InputState::key(Key::Q, EdgeState::Pressed),
            InputState::key(Key::Q, EdgeState::Released),
        )));
        let second = Rc::new(RefCell::new(TestManipulator::new(
            "second",
            InputState::key(Key::E, EdgeState::Pressed),
            InputState::key(Key::E, EdgeState::Released),
        )));
        viewer.borrow_mut().add_manipulator(&first);
        viewer.borrow_mut().add_manipulator(&second);

        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_key_state(Key::Q, EdgeState::Pressed);
        });
        assert!(first.borrow().is_activated());
        assert_eq!(active_count(&viewer.borrow()), 1);

        // An event matching second's activation (and not first's
        // deactivation) hands over ownership within one dispatch step.
        frame(&subsystem, |writer| {
            writer.set_key_state(Key::Q, EdgeState::Down);
            writer.set_key_state(Key::E, EdgeState::Pressed);
        });
        assert!(!first.borrow().is_activated());
        assert!(second.borrow().is_activated());
        assert_eq!(first.borrow().deactivations, 1);
        assert_eq!(active_count(&viewer.borrow()), 1);
    }

    #[test]
    fn test_shared_trigger_first_registered_wins() {
        let (subsystem, viewer) = rig();
        let trigger = InputState::key(Key::Q, EdgeState::Pressed);
        let release = InputState::key(Key::Q, EdgeState::Released);
        let first = Rc::new(RefCell::new(TestManipulator::new("first", trigger, release)));
        let second = Rc::new(RefCell::new(TestManipulator::new(
            "second", trigger, release,
        )));
        viewer.borrow_mut().add_manipulator(&first);
        viewer.borrow_mut().add_manipulator(&second);

        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_key_state(Key::Q, EdgeState::Pressed);
        });
        assert!(first.borrow().is_activated());
        assert!(!second.borrow().is_activated());
        assert_eq!(active_count(&viewer.borrow()), 1);
    }

    #[test]
    fn test_remove_manipulator_drops_shared_trigger() {
        let (subsystem, viewer) = rig();
        let trigger = InputState::key(Key::Q, EdgeState::Pressed);
        let release = InputState::key(Key::Q, EdgeState::Released);
        let first = Rc::new(RefCell::new(TestManipulator::new("first", trigger, release)));
        let second = Rc::new(RefCell::new(TestManipulator::new(
            "second", trigger, release,
        )));
        viewer.borrow_mut().add_manipulator(&first);
        viewer.borrow_mut().add_manipulator(&second);
        viewer.borrow_mut().remove_manipulator(&first);

        // The shared pair was unregistered wholesale, so the surviving
        // manipulator's trigger is gone with it. Known gap, kept as-is.
        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_key_state(Key::Q, EdgeState::Pressed);
        });
        assert!(!second.borrow().is_activated());
    }

    #[test]
    fn test_toggle_trigger_flips_activation() {
        let (subsystem, viewer) = rig();
        // Activation and deactivation share one trigger, like the drag and
        // trackball manipulators.
        let toggle = InputState::key(Key::T, EdgeState::Pressed);
        let manipulator = Rc::new(RefCell::new(TestManipulator::new("toggle", toggle, toggle)));
        viewer.borrow_mut().add_manipulator(&manipulator);

        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_key_state(Key::T, EdgeState::Pressed);
        });
        assert!(manipulator.borrow().is_activated());

        frame(&subsystem, |writer| {
            writer.set_key_state(Key::T, EdgeState::Up);
        });
        frame(&subsystem, |writer| {
            writer.set_key_state(Key::T, EdgeState::Pressed);
        });
        assert!(!manipulator.borrow().is_activated());
    }

    #[test]
    fn test_camera_fly_scenario() {
        let (subsystem, viewer) = rig();

        let world = Rc::new(RefCell::new(World::new()));
        let camera = Rc::new(RefCell::new(Camera::perspective(
            Vec3::new(0.0, 0.0, 10.0),
            60.0,
            800.0 / 600.0,
            0.1,
            100.0,
        )));
        let surface = Rc::new(FixedRect::new(0, 0, 800, 600));
        let context = EditorContext::new(world, camera.clone(), surface).unwrap();
        let fly = Rc::new(RefCell::new(CameraFlyManipulator::new(
            &context,
            FlySettings::default(),
        )));
        viewer.borrow_mut().add_manipulator(&fly);

        let start = camera.borrow().position;
        let forward = camera.borrow().forward();

        // Right press inside the viewport turns the fly mode on.
        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_mouse_button_state(MouseButton::RIGHT, EdgeState::Pressed);
        });
        assert!(fly.borrow().is_activated());

        // Holding W moves the camera forward by the configured speed.
        frame(&subsystem, |writer| {
            writer.set_mouse_button_state(MouseButton::RIGHT, EdgeState::Down);
            writer.set_key_state(Key::W, EdgeState::Down);
        });
        assert_relative_eq!(
            camera.borrow().position,
            start + forward * 50.0,
            epsilon = 1e-3
        );

        // Mouse motion steers the view.
        frame(&subsystem, |writer| {
            writer.set_mouse_button_state(MouseButton::RIGHT, EdgeState::Down);
            writer.set_key_state(Key::W, EdgeState::Up);
            writer.set_mouse_axis(MouseAxis::X, 40);
        });
        assert!(camera.borrow().forward().dot(&forward) < 1.0 - 1e-4);

        // Releasing the right button turns the mode off; further key and
        // mouse input is ignored.
        frame(&subsystem, |writer| {
            writer.set_mouse_button_state(MouseButton::RIGHT, EdgeState::Released);
        });
        assert!(!fly.borrow().is_activated());

        let parked = camera.borrow().position;
        frame(&subsystem, |writer| {
            writer.set_mouse_button_state(MouseButton::RIGHT, EdgeState::Up);
            writer.set_key_state(Key::W, EdgeState::Down);
            writer.set_mouse_axis(MouseAxis::X, 40);
        });
        assert_eq!(camera.borrow().position, parked);
    }

    #[test]
    fn test_shutdown_unregisters_everything() {
        let (subsystem, viewer) = rig();
        let manipulator = Rc::new(RefCell::new(TestManipulator::new(
            "a",
            InputState::key(Key::Q, EdgeState::Pressed),
            InputState::key(Key::Q, EdgeState::Released),
        )));
        viewer.borrow_mut().add_manipulator(&manipulator);
        viewer.borrow_mut().shutdown();

        frame(&subsystem, |writer| {
            writer.set_mouse_position(INSIDE.0, INSIDE.1);
            writer.set_key_state(Key::Q, EdgeState::Pressed);
        });
        assert!(!manipulator.borrow().is_activated());
    }
}
