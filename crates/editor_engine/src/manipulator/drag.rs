//! Drag manipulator
//!
//! Toggled with the T key. While active, left-dragging moves the manipulated
//! entities in the camera's right/up plane so the group follows the cursor
//! exactly: the world offset per pixel is derived by projecting the group
//! centroid and one-unit offsets along the camera axes into the viewport.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::{Vec2, Vec3};
use crate::input::{
    EdgeState, InputState, Key, KeyboardListener, Mouse, MouseButton, MouseListener,
};
use crate::render::Camera;
use crate::scene::{EntityId, EntityKind, World};
use crate::viewer::surface::ViewportSurface;

use super::{ActiveBindings, EditorContext, Manipulator, ManipulatorBase};

/// Moves the selected entities with the cursor.
pub struct DragManipulator {
    base: ManipulatorBase,
    world: Rc<RefCell<World>>,
    camera: Rc<RefCell<Camera>>,
    surface: Rc<dyn ViewportSurface>,
    mouse: Rc<Mouse>,
    activation: InputState,
    deactivation: InputState,
    entities: Vec<EntityId>,
    origin_positions: Vec<Vec3>,
    group_position: Vec3,
    screen_click_pos: Vec2,
}

impl DragManipulator {
    /// Create a drag manipulator over the context's world and camera.
    pub fn new(context: &EditorContext) -> Self {
        Self {
            base: ManipulatorBase::default(),
            world: Rc::clone(&context.world),
            camera: Rc::clone(&context.camera),
            surface: Rc::clone(&context.surface),
            mouse: Rc::clone(&context.mouse),
            activation: InputState::key(Key::T, EdgeState::Pressed),
            deactivation: InputState::key(Key::T, EdgeState::Pressed),
            entities: Vec::new(),
            origin_positions: Vec::new(),
            group_position: Vec3::zeros(),
            screen_click_pos: Vec2::zeros(),
        }
    }

    /// Mean position of the manipulated group.
    fn center_position(&self) -> Vec3 {
        let world = self.world.borrow();
        let positions: Vec<Vec3> = self
            .entities
            .iter()
            .filter_map(|&entity| world.position(entity))
            .collect();
        if positions.is_empty() {
            return Vec3::zeros();
        }
        positions.iter().fold(Vec3::zeros(), |acc, p| acc + p) / positions.len() as f32
    }

    /// Latch the current position of every target as its drag origin.
    fn update_origin_positions(&mut self) {
        let world = self.world.borrow();
        self.origin_positions = self
            .entities
            .iter()
            .map(|&entity| world.position(entity).unwrap_or_else(Vec3::zeros))
            .collect();
    }
}

impl KeyboardListener for DragManipulator {}

impl MouseListener for DragManipulator {
    fn on_mouse_move(&mut self, _rel_x: i32, _rel_y: i32) {
        if !self.is_activated()
            || self.entities.is_empty()
            || !self.has_focus()
            || self.mouse.is_up(MouseButton::LEFT)
        {
            return;
        }

        let viewport = (
            self.surface.width() as u32,
            self.surface.height() as u32,
        );

        let (right, up, pixels_per_right, pixels_per_up) = {
            let camera = self.camera.borrow();
            let origin_px = camera.world_to_screen(self.group_position, viewport);
            let right = camera.right();
            let up = camera.up_vector();
            let right_px = camera.world_to_screen(self.group_position + right, viewport);
            let up_px = camera.world_to_screen(self.group_position + up, viewport);
            (right, up, right_px.x - origin_px.x, up_px.y - origin_px.y)
        };
        if pixels_per_right == 0.0 || pixels_per_up == 0.0 {
            return;
        }

        let position = self.mouse.position();
        let offset_right = position.x as f32 - self.screen_click_pos.x;
        let offset_up = position.y as f32 - self.screen_click_pos.y;

        let mut world = self.world.borrow_mut();
        for (&entity, origin) in self.entities.iter().zip(&self.origin_positions) {
            let new_position = origin
                + right * (offset_right / pixels_per_right)
                + up * (offset_up / pixels_per_up);
            world.set_position(entity, new_position);
        }
    }

    fn on_mouse_button_pressed(&mut self, button: MouseButton) {
        if button != MouseButton::LEFT || !self.has_focus() {
            return;
        }

        let position = self.mouse.position();
        self.screen_click_pos = Vec2::new(position.x as f32, position.y as f32);
        self.group_position = self.center_position();
        self.update_origin_positions();
    }

    fn on_mouse_button_released(&mut self, button: MouseButton) {
        if button != MouseButton::LEFT || !self.has_focus() {
            return;
        }

        let moved = self.center_position() - self.group_position;
        if moved != Vec3::zeros() {
            log::debug!(
                "drag finished: {} entities moved by {moved:?}",
                self.entities.len()
            );
        }
    }
}

impl Manipulator for DragManipulator {
    fn base(&self) -> &ManipulatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ManipulatorBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "drag"
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

    fn on_activate(&mut self) {
        self.update_origin_positions();
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
        self.origin_positions.clear();
    }
}
