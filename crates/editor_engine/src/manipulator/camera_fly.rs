//! Camera-fly manipulator
//!
//! Free-look navigation: hold the right mouse button to fly. While active,
//! W/S move the camera along the view direction, A/D strafe, and mouse
//! motion yaws and pitches the view.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::FlySettings;
use crate::input::{EdgeState, InputState, Key, KeyboardListener, MouseButton, MouseListener};
use crate::render::Camera;
use crate::scene::{EntityId, EntityKind, World};

use super::{ActiveBindings, EditorContext, Manipulator, ManipulatorBase};

/// Flies the viewport camera while the right mouse button is held.
pub struct CameraFlyManipulator {
    base: ManipulatorBase,
    camera: Rc<RefCell<Camera>>,
    activation: InputState,
    deactivation: InputState,
    move_speed: f32,
    look_speed: f32,
}

impl CameraFlyManipulator {
    /// Create a fly manipulator driving the context's camera.
    pub fn new(context: &EditorContext, settings: FlySettings) -> Self {
        Self {
            base: ManipulatorBase::default(),
            camera: Rc::clone(&context.camera),
            activation: InputState::button(MouseButton::RIGHT, EdgeState::Pressed),
            deactivation: InputState::button(MouseButton::RIGHT, EdgeState::Released),
            move_speed: settings.move_speed,
            look_speed: settings.look_speed,
        }
    }
}

impl KeyboardListener for CameraFlyManipulator {
    fn on_key_down(&mut self, key: Key) {
        if !self.is_activated() {
            return;
        }

        let mut camera = self.camera.borrow_mut();
        match key {
            Key::W => camera.move_forward(self.move_speed),
            Key::S => camera.move_forward(-self.move_speed),
            Key::D => camera.pan(self.move_speed),
            Key::A => camera.pan(-self.move_speed),
            _ => {}
        }
    }
}

impl MouseListener for CameraFlyManipulator {
    fn on_mouse_move(&mut self, rel_x: i32, rel_y: i32) {
        if !self.is_activated() {
            return;
        }

        let mut camera = self.camera.borrow_mut();
        camera.pitch(-rel_y as f32 * self.look_speed);
        camera.yaw(-rel_x as f32 * self.look_speed);
    }
}

impl Manipulator for CameraFlyManipulator {
    fn base(&self) -> &ManipulatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ManipulatorBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "camera-fly"
    }

    fn activation_input(&self) -> InputState {
        self.activation
    }

    fn deactivation_input(&self) -> InputState {
        self.deactivation
    }

    fn active_bindings(&self) -> ActiveBindings {
        ActiveBindings::new()
            .with_key(Key::W, EdgeState::Down)
            .with_key(Key::S, EdgeState::Down)
            .with_key(Key::A, EdgeState::Down)
            .with_key(Key::D, EdgeState::Down)
            .with_mouse_move()
    }

    fn can_manipulate(&self, world: &World, entity: EntityId) -> bool {
        world.kind(entity) == Some(EntityKind::Camera)
    }

    fn set_manipulated_entities(&mut self, _entities: &[EntityId]) {
        // The fly manipulator always drives the viewport camera it was
        // constructed with.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::input::InputSubsystem;
    use crate::scene::Aabb;
    use crate::viewer::surface::FixedRect;
    use approx::assert_relative_eq;

    fn fly_fixture() -> (CameraFlyManipulator, Rc<RefCell<Camera>>) {
        let _subsystem = InputSubsystem::new();
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
        let fly = CameraFlyManipulator::new(&context, FlySettings::default());
        (fly, camera)
    }

    #[test]
    fn test_ignores_input_while_inactive() {
        let (mut fly, camera) = fly_fixture();
        let before = camera.borrow().position;
        fly.on_key_down(Key::W);
        fly.on_mouse_move(10, 5);
        assert_eq!(camera.borrow().position, before);
    }

    #[test]
    fn test_wasd_moves_camera() {
        let (mut fly, camera) = fly_fixture();
        fly.base_mut().set_activated(true);

        let forward = camera.borrow().forward();
        let before = camera.borrow().position;
        fly.on_key_down(Key::W);
        let after = camera.borrow().position;
        assert_relative_eq!(after - before, forward * 50.0, epsilon = 1e-4);

        let right = camera.borrow().right();
        let before = camera.borrow().position;
        fly.on_key_down(Key::A);
        let after = camera.borrow().position;
        assert_relative_eq!(after - before, -right * 50.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mouse_move_turns_view() {
        let (mut fly, camera) = fly_fixture();
        fly.base_mut().set_activated(true);

        let before = camera.borrow().forward();
        fly.on_mouse_move(40, 0);
        let after = camera.borrow().forward();
        // A 40 px motion at 0.3 deg/px yaws the view 12 degrees.
        let expected = (40.0 * 0.3_f32).to_radians().cos();
        assert_relative_eq!(before.dot(&after), expected, epsilon = 1e-4);
        // Position never changes while looking around.
        assert_eq!(camera.borrow().position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_capability_is_camera_only() {
        let (fly, _camera) = fly_fixture();
        let mut world = World::new();
        let object = world.spawn(
            EntityKind::Object,
            Default::default(),
            Aabb::default(),
        );
        let cam = world.spawn(EntityKind::Camera, Default::default(), Aabb::default());
        assert!(!fly.can_manipulate(&world, object));
        assert!(fly.can_manipulate(&world, cam));
    }
}
