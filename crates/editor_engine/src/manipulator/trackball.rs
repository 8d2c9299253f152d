//! Trackball rotate manipulator
//!
//! Toggled with the R key. While active, left-dragging rotates the
//! manipulated entities as if spinning a ball centered on the group: the
//! cursor is mapped onto a sphere around the group center and the rotation
//! is the shortest arc between the press point and the current point,
//! composed in the ball's un-rotated local frame so successive drags
//! accumulate instead of drifting.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::TrackballSettings;
use crate::foundation::math::{Quat, Vec2, Vec3};
use crate::input::{
    EdgeState, InputState, Key, KeyboardListener, Mouse, MouseButton, MouseListener,
};
use crate::render::Camera;
use crate::scene::{EntityId, EntityKind, World};
use crate::viewer::surface::ViewportSurface;

use super::{ActiveBindings, EditorContext, Manipulator, ManipulatorBase};

/// Rotates the selected entities around their common center.
pub struct TrackballManipulator {
    base: ManipulatorBase,
    world: Rc<RefCell<World>>,
    camera: Rc<RefCell<Camera>>,
    surface: Rc<dyn ViewportSurface>,
    mouse: Rc<Mouse>,
    activation: InputState,
    deactivation: InputState,
    entities: Vec<EntityId>,
    radius: f32,
    ball_position: Vec3,
    ball_rotation: Quat,
    drag_start: Vec3,
    drag_position: Vec3,
}

impl TrackballManipulator {
    /// Create a trackball manipulator over the context's world and camera.
    pub fn new(context: &EditorContext, settings: TrackballSettings) -> Self {
        Self {
            base: ManipulatorBase::default(),
            world: Rc::clone(&context.world),
            camera: Rc::clone(&context.camera),
            surface: Rc::clone(&context.surface),
            mouse: Rc::clone(&context.mouse),
            activation: InputState::key(Key::R, EdgeState::Pressed),
            deactivation: InputState::key(Key::R, EdgeState::Pressed),
            entities: Vec::new(),
            radius: settings.radius,
            ball_position: Vec3::zeros(),
            ball_rotation: Quat::identity(),
            drag_start: Vec3::zeros(),
            drag_position: Vec3::zeros(),
        }
    }

    /// Latch the ball center, starting orientation and press point.
    fn begin_drag(&mut self) {
        let (center, rotation) = {
            let world = self.world.borrow();
            let mut center = Vec3::zeros();
            let mut count = 0;
            let mut rotation = Quat::identity();
            for &entity in &self.entities {
                let (Some(bounds), Some(position)) =
                    (world.bounding_box(entity), world.position(entity))
                else {
                    continue;
                };
                center += bounds.center() + position;
                count += 1;
                if let Some(orientation) = world.orientation(entity) {
                    rotation = orientation;
                }
            }
            if count > 0 {
                center /= count as f32;
            }
            (center, rotation)
        };

        self.ball_position = center;
        self.ball_rotation = rotation;
        self.drag_start = self.cursor_to_sphere_pos();
        self.drag_position = self.drag_start;
    }

    /// Map the cursor onto the ball's surface.
    ///
    /// Casts the camera ray through the cursor out to the far plane and
    /// intersects it with the ball sphere; a miss falls back to the closest
    /// point on the segment. The result is normalized onto the sphere.
    fn cursor_to_sphere_pos(&self) -> Vec3 {
        let camera = self.camera.borrow();
        let position = self.mouse.position();
        let local = self.surface.map_from_global(position);
        let viewport = (
            self.surface.width() as u32,
            self.surface.height() as u32,
        );

        let ray = camera.screen_ray(Vec2::new(local.x as f32, local.y as f32), viewport);
        let segment_start = camera.position;
        let segment_end = camera.position + ray.direction * camera.far;

        let on_sphere = self.sphere_segment_intersection(
            segment_start,
            segment_end,
            self.ball_position,
            self.radius,
            camera.position,
        );

        (on_sphere - self.ball_position)
            .try_normalize(1e-6)
            .map_or(self.ball_position + Vec3::z() * self.radius, |direction| {
                self.ball_position + direction * self.radius
            })
    }

    /// Intersect the segment with a sphere, picking the intersection nearest
    /// to the camera; fall back to the closest point on the segment when the
    /// segment misses the sphere.
    fn sphere_segment_intersection(
        &self,
        start: Vec3,
        end: Vec3,
        sphere_center: Vec3,
        radius: f32,
        camera_position: Vec3,
    ) -> Vec3 {
        let direction = end - start;

        let a = direction.norm_squared();
        let b = 2.0 * direction.dot(&(start - sphere_center));
        let c = sphere_center.norm_squared() + start.norm_squared()
            - 2.0 * sphere_center.dot(&start)
            - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return Self::closest_point_on_segment(start, end, sphere_center);
        }

        let sqrt_discriminant = discriminant.sqrt();
        let first = start + direction * ((-b + sqrt_discriminant) / (2.0 * a));
        let second = start + direction * ((-b - sqrt_discriminant) / (2.0 * a));

        if (first - camera_position).norm() < (second - camera_position).norm() {
            first
        } else {
            second
        }
    }

    /// Closest point on the segment to `point`.
    fn closest_point_on_segment(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
        let to_point = point - start;
        let segment = end - start;
        let length_squared = segment.norm_squared();
        if length_squared == 0.0 {
            return start;
        }

        let direction = segment / length_squared.sqrt();
        let t = to_point.dot(&direction);
        if t <= 0.0 {
            start
        } else if t * t >= length_squared {
            end
        } else {
            start + direction * t
        }
    }
}

impl KeyboardListener for TrackballManipulator {}

impl MouseListener for TrackballManipulator {
    fn on_mouse_move(&mut self, _rel_x: i32, _rel_y: i32) {
        if !self.is_activated()
            || self.entities.is_empty()
            || !self.has_focus()
            || self.mouse.is_up(MouseButton::LEFT)
        {
            return;
        }

        self.drag_position = self.cursor_to_sphere_pos();

        // Express both sphere points in the ball's un-rotated local frame
        // and take the shortest arc between them.
        let inverse = self.ball_rotation.inverse();
        let local_start = inverse * (self.drag_start - self.ball_position);
        let local_position = inverse * (self.drag_position - self.ball_position);
        let arc = Quat::rotation_between(&local_start, &local_position)
            .unwrap_or_else(Quat::identity);
        let new_rotation = self.ball_rotation * arc;

        let mut world = self.world.borrow_mut();
        for &entity in &self.entities {
            world.set_orientation(entity, new_rotation);
        }
    }

    fn on_mouse_button_pressed(&mut self, button: MouseButton) {
        if button != MouseButton::LEFT || !self.has_focus() {
            return;
        }

        self.begin_drag();
    }

    fn on_mouse_button_released(&mut self, button: MouseButton) {
        if button != MouseButton::LEFT || !self.has_focus() {
            return;
        }

        log::debug!(
            "trackball drag finished on {} entities",
            self.entities.len()
        );
    }
}

impl Manipulator for TrackballManipulator {
    fn base(&self) -> &ManipulatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ManipulatorBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "trackball"
    }

    fn activation_input(&self) -> InputState {
        self.activation
    }

    fn deactivation_input(&self) -> InputState {
        self.deactivation
    }

    fn active_bindings(&self) -> ActiveBindings {
        ActiveBindings::new()
            .with_mouse_move()
            .with_button(MouseButton::LEFT, EdgeState::Pressed)
            .with_button(MouseButton::LEFT, EdgeState::Released)
    }

    fn can_manipulate(&self, world: &World, entity: EntityId) -> bool {
        world.contains(entity)
    }

    fn can_manipulate_all(&self, world: &World, entities: &[EntityId]) -> bool {
        entities.iter().all(|&entity| {
            matches!(
                world.kind(entity),
                Some(EntityKind::Object | EntityKind::Camera)
            )
        })
    }

    fn set_manipulated_entities(&mut self, entities: &[EntityId]) {
        self.entities = entities.to_vec();
    }
}
