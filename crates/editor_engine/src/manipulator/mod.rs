//! # Manipulators
//!
//! A manipulator is one mutually-exclusive viewport interaction mode:
//! fly the camera, drag the selection, rotate it like a trackball. Each one
//! declares the trigger that turns it on and the trigger that turns it off
//! as [`InputState`] values; a [`crate::viewer::Viewer`] arbitrates so that
//! at most one manipulator is active per viewport at any time.
//!
//! While active, a manipulator needs extra device subscriptions (WASD keys,
//! mouse motion). Those are declared through [`Manipulator::active_bindings`]
//! and registered by the host only for the duration of the activation, which
//! keeps per-frame dispatch cost proportional to what is actually in use.

pub mod camera_fly;
pub mod drag;
pub mod trackball;

use std::cell::RefCell;
use std::rc::Rc;

use crate::input::{
    EdgeState, InputError, InputState, InputSubsystem, Key, KeyboardListener, Mouse, MouseButton,
    MouseListener,
};
use crate::render::Camera;
use crate::scene::{EntityId, World};
use crate::viewer::surface::ViewportSurface;

pub use camera_fly::CameraFlyManipulator;
pub use drag::DragManipulator;
pub use trackball::TrackballManipulator;

/// Flags shared by every manipulator: the Active state and the orthogonal
/// Focus flag.
///
/// Focus tracks whether the most recent button press originated over the
/// owning viewport; move/drag handlers consult it to ignore input that
/// started outside their surface.
#[derive(Debug, Default, Clone)]
pub struct ManipulatorBase {
    activated: bool,
    has_focus: bool,
}

impl ManipulatorBase {
    /// `true` while the manipulator owns the viewport's input.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub(crate) fn set_activated(&mut self, activated: bool) {
        self.activated = activated;
    }

    /// `true` if the last button press originated over the viewport.
    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Record whether the last button press originated over the viewport.
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }
}

/// Device subscriptions a manipulator holds only while active.
#[derive(Debug, Clone, Default)]
pub struct ActiveBindings {
    /// Extra (key, state) subscriptions.
    pub keys: Vec<(Key, EdgeState)>,
    /// Extra (button, state) subscriptions.
    pub buttons: Vec<(MouseButton, EdgeState)>,
    /// Whether the manipulator listens to mouse motion.
    pub mouse_move: bool,
}

impl ActiveBindings {
    /// No extra subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a (key, state) subscription.
    #[must_use]
    pub fn with_key(mut self, key: Key, state: EdgeState) -> Self {
        self.keys.push((key, state));
        self
    }

    /// Add a (button, state) subscription.
    #[must_use]
    pub fn with_button(mut self, button: MouseButton, state: EdgeState) -> Self {
        self.buttons.push((button, state));
        self
    }

    /// Subscribe to mouse motion.
    #[must_use]
    pub fn with_mouse_move(mut self) -> Self {
        self.mouse_move = true;
        self
    }
}

/// Shared editor collaborators handed to manipulator constructors.
///
/// Everything here is a non-owning handle: the world owns the entities, the
/// application owns the camera and surface, the input subsystem owns the
/// mouse.
pub struct EditorContext {
    /// The entity world manipulators act on.
    pub world: Rc<RefCell<World>>,
    /// The active viewport camera.
    pub camera: Rc<RefCell<Camera>>,
    /// The viewport surface, for global-to-local cursor mapping.
    pub surface: Rc<dyn ViewportSurface>,
    /// The mouse device, for position and button queries outside dispatch.
    pub mouse: Rc<Mouse>,
}

impl EditorContext {
    /// Assemble a context from the application's shared handles and the
    /// active input subsystem.
    pub fn new(
        world: Rc<RefCell<World>>,
        camera: Rc<RefCell<Camera>>,
        surface: Rc<dyn ViewportSurface>,
    ) -> Result<Self, InputError> {
        Ok(Self {
            world,
            camera,
            surface,
            mouse: InputSubsystem::mouse()?,
        })
    }
}

impl Clone for EditorContext {
    fn clone(&self) -> Self {
        Self {
            world: Rc::clone(&self.world),
            camera: Rc::clone(&self.camera),
            surface: Rc::clone(&self.surface),
            mouse: Rc::clone(&self.mouse),
        }
    }
}

/// A mutually-exclusive viewport interaction mode.
///
/// Implementors are also device listeners; the host registers them for their
/// [`Manipulator::active_bindings`] while they are active, so the listener
/// callbacks only run between activation and deactivation (plus the guard
/// checks the callbacks themselves perform).
pub trait Manipulator: KeyboardListener + MouseListener {
    /// The shared Active/Focus flags.
    fn base(&self) -> &ManipulatorBase;

    /// Mutable access to the shared flags.
    fn base_mut(&mut self) -> &mut ManipulatorBase;

    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// The trigger that turns this manipulator on. Constant per instance.
    fn activation_input(&self) -> InputState;

    /// The trigger that turns this manipulator off. Constant per instance.
    fn deactivation_input(&self) -> InputState;

    /// Device subscriptions to hold while active.
    fn active_bindings(&self) -> ActiveBindings {
        ActiveBindings::new()
    }

    /// Hook run right after activation (flag set, bindings registered).
    fn on_activate(&mut self) {}

    /// Hook run right after deactivation (flag cleared, bindings removed).
    fn on_deactivate(&mut self) {}

    /// `true` if this manipulator supports the given entity.
    fn can_manipulate(&self, world: &World, entity: EntityId) -> bool;

    /// `true` if this manipulator supports every given entity.
    fn can_manipulate_all(&self, world: &World, entities: &[EntityId]) -> bool {
        entities
            .iter()
            .all(|&entity| self.can_manipulate(world, entity))
    }

    /// Replace the manipulated entities. Handles only; the world keeps
    /// ownership.
    fn set_manipulated_entities(&mut self, entities: &[EntityId]);

    /// `true` while the manipulator owns the viewport's input.
    fn is_activated(&self) -> bool {
        self.base().is_activated()
    }

    /// `true` if the last button press originated over the viewport.
    fn has_focus(&self) -> bool {
        self.base().has_focus()
    }

    /// Record whether the last button press originated over the viewport.
    fn set_focus(&mut self, has_focus: bool) {
        self.base_mut().set_focus(has_focus);
    }
}
