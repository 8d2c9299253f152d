//! # Editor Engine
//!
//! The input-event core of an interactive 3D editor: raw per-frame hardware
//! polling becomes typed, edge-classified events, and a viewer arbitrates
//! which single manipulator (camera-fly, drag, trackball-rotate) owns the
//! viewport's input at any instant.
//!
//! ## Architecture
//!
//! - **Input**: [`input::Keyboard`] and [`input::Mouse`] store per-control
//!   [`input::EdgeState`]s and dispatch per-(control, state) listener lists;
//!   [`input::InputSubsystem`] is the only writer, fed once per frame by a
//!   platform [`input::InputBackend`]
//! - **Manipulators**: [`manipulator::Manipulator`] implementations declare
//!   activation/deactivation triggers as [`input::InputState`] values and
//!   the extra device subscriptions they hold while active
//! - **Arbitration**: [`viewer::Viewer`] enforces single-active-manipulator
//!   exclusivity and gates activation by click-origin focus
//! - **Scene & Camera**: [`scene::World`] owns the entities; the
//!   [`render::Camera`] supplies the projection math the drag and trackball
//!   manipulators need
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use editor_engine::prelude::*;
//!
//! struct IdleBackend;
//!
//! impl InputBackend for IdleBackend {
//!     fn poll(&mut self, _writer: &mut DeviceWriter<'_>) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = InputSubsystem::new();
//!     let world = Rc::new(RefCell::new(World::new()));
//!     let camera = Rc::new(RefCell::new(Camera::default()));
//!     let surface = Rc::new(FixedRect::new(0, 0, 800, 600));
//!
//!     let viewer = Viewer::new(surface.clone())?;
//!     let context = EditorContext::new(world, camera, surface)?;
//!     let fly = Rc::new(RefCell::new(CameraFlyManipulator::new(
//!         &context,
//!         FlySettings::default(),
//!     )));
//!     viewer.borrow_mut().add_manipulator(&fly);
//!
//!     let mut backend = IdleBackend;
//!     loop {
//!         input.update(&mut backend); // once per rendered frame
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod input;
pub mod manipulator;
pub mod render;
pub mod scene;
pub mod viewer;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{Config, ConfigError, EditorConfig, FlySettings, TrackballSettings};
    pub use crate::foundation::math::{Quat, Transform, Vec2, Vec2i, Vec3};
    pub use crate::input::{
        DeviceWriter, EdgeState, InputBackend, InputError, InputState, InputSubsystem, Key,
        Keyboard, KeyboardListener, Mouse, MouseAxis, MouseButton, MouseListener,
    };
    pub use crate::manipulator::{
        CameraFlyManipulator, DragManipulator, EditorContext, Manipulator, TrackballManipulator,
    };
    pub use crate::render::Camera;
    pub use crate::scene::{Aabb, EntityId, EntityKind, World};
    pub use crate::viewer::{FixedRect, Viewer, ViewportSurface};
}
