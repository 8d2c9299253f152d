//! Scripted editor session demo
//!
//! Drives the editor input core without a window: a scripted backend feeds
//! per-frame key/button hold sets and cursor positions, the subsystem
//! classifies them into edge states, and the viewer arbitrates the camera,
//! drag and trackball manipulators exactly as it would in the real editor.
//!
//! Run with `RUST_LOG=debug` to watch activation and dispatch decisions.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use editor_engine::prelude::*;

/// One scripted frame: the controls held down and where the cursor sits.
#[derive(Debug, Clone, Default)]
struct ScriptFrame {
    keys: Vec<Key>,
    buttons: Vec<MouseButton>,
    position: Option<(i32, i32)>,
}

impl ScriptFrame {
    fn new() -> Self {
        Self::default()
    }

    fn hold_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    fn hold_button(mut self, button: MouseButton) -> Self {
        self.buttons.push(button);
        self
    }

    fn cursor(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }
}

/// Backend that replays scripted hold sets, classifying every control
/// against the previous frame the way a polling backend would.
struct ScriptedBackend {
    frames: VecDeque<ScriptFrame>,
    held_keys: HashSet<Key>,
    held_buttons: HashSet<MouseButton>,
    touched_keys: HashSet<Key>,
    touched_buttons: HashSet<MouseButton>,
    position: (i32, i32),
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            held_keys: HashSet::new(),
            held_buttons: HashSet::new(),
            touched_keys: HashSet::new(),
            touched_buttons: HashSet::new(),
            position: (0, 0),
        }
    }

    fn queue(&mut self, frames: Vec<ScriptFrame>) {
        self.frames.extend(frames);
    }

    /// `true` while scripted frames remain or controls still need to settle
    /// back to `Up`.
    fn has_work(&self) -> bool {
        !self.frames.is_empty() || !self.touched_keys.is_empty() || !self.touched_buttons.is_empty()
    }
}

impl InputBackend for ScriptedBackend {
    fn poll(&mut self, writer: &mut DeviceWriter<'_>) {
        let frame = self.frames.pop_front().unwrap_or_default();

        let next_keys: HashSet<Key> = frame.keys.iter().copied().collect();
        let previous_keys = std::mem::take(&mut self.held_keys);
        for key in &(&previous_keys | &next_keys) | &self.touched_keys {
            writer.set_key_state(
                key,
                EdgeState::from_poll(previous_keys.contains(&key), next_keys.contains(&key)),
            );
        }
        self.touched_keys = &previous_keys | &next_keys;
        self.held_keys = next_keys;

        let next_buttons: HashSet<MouseButton> = frame.buttons.iter().copied().collect();
        let previous_buttons = std::mem::take(&mut self.held_buttons);
        for button in &(&previous_buttons | &next_buttons) | &self.touched_buttons {
            writer.set_mouse_button_state(
                button,
                EdgeState::from_poll(
                    previous_buttons.contains(&button),
                    next_buttons.contains(&button),
                ),
            );
        }
        self.touched_buttons = &previous_buttons | &next_buttons;
        self.held_buttons = next_buttons;

        if let Some((x, y)) = frame.position {
            writer.set_mouse_axis(MouseAxis::X, x - self.position.0);
            writer.set_mouse_axis(MouseAxis::Y, y - self.position.1);
            writer.set_mouse_position(x, y);
            self.position = (x, y);
        }
    }
}

/// Hold the right button and fly: W forward for a few frames, then a look
/// around, then release.
fn fly_script() -> Vec<ScriptFrame> {
    vec![
        ScriptFrame::new().cursor(400, 300),
        ScriptFrame::new().hold_button(MouseButton::RIGHT),
        ScriptFrame::new().hold_button(MouseButton::RIGHT).hold_key(Key::W),
        ScriptFrame::new().hold_button(MouseButton::RIGHT).hold_key(Key::W),
        ScriptFrame::new().hold_button(MouseButton::RIGHT).hold_key(Key::W),
        ScriptFrame::new()
            .hold_button(MouseButton::RIGHT)
            .cursor(460, 280),
        ScriptFrame::new(),
    ]
}

/// Toggle drag mode with T, drag the selection 100 px to the right, then
/// toggle the mode back off.
fn drag_script() -> Vec<ScriptFrame> {
    vec![
        ScriptFrame::new().cursor(400, 300),
        ScriptFrame::new().hold_key(Key::T),
        ScriptFrame::new(),
        ScriptFrame::new().hold_button(MouseButton::LEFT),
        ScriptFrame::new()
            .hold_button(MouseButton::LEFT)
            .cursor(450, 300),
        ScriptFrame::new()
            .hold_button(MouseButton::LEFT)
            .cursor(500, 300),
        ScriptFrame::new(),
        ScriptFrame::new().hold_key(Key::T),
        ScriptFrame::new(),
    ]
}

/// Toggle trackball mode with R, spin the selection, then toggle it off.
fn trackball_script() -> Vec<ScriptFrame> {
    vec![
        ScriptFrame::new().cursor(350, 300),
        ScriptFrame::new().hold_key(Key::R),
        ScriptFrame::new(),
        ScriptFrame::new().hold_button(MouseButton::LEFT),
        ScriptFrame::new()
            .hold_button(MouseButton::LEFT)
            .cursor(420, 280),
        ScriptFrame::new()
            .hold_button(MouseButton::LEFT)
            .cursor(470, 260),
        ScriptFrame::new(),
        ScriptFrame::new().hold_key(Key::R),
        ScriptFrame::new(),
    ]
}

fn drain(input: &InputSubsystem, backend: &mut ScriptedBackend) {
    while backend.has_work() {
        input.update(backend);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = EditorConfig::load_from_file("editor.toml").unwrap_or_else(|err| {
        log::info!("using default editor config ({err})");
        EditorConfig::default()
    });

    let input = InputSubsystem::new();

    let mut world = World::new();
    let crate_box = world.spawn(
        EntityKind::Object,
        Transform::from_position(Vec3::new(0.0, 0.0, 0.0)),
        Aabb::from_half_extent(0.5),
    );
    let barrel = world.spawn(
        EntityKind::Object,
        Transform::from_position(Vec3::new(2.0, 0.0, 0.0)),
        Aabb::from_half_extent(0.4),
    );
    world.spawn(
        EntityKind::Terrain,
        Transform::identity(),
        Aabb::from_half_extent(100.0),
    );
    let world = Rc::new(RefCell::new(world));

    let camera = Rc::new(RefCell::new(Camera::perspective(
        Vec3::new(0.0, 2.0, 10.0),
        60.0,
        800.0 / 600.0,
        0.1,
        100.0,
    )));
    let surface = Rc::new(FixedRect::new(0, 0, 800, 600));

    let viewer = Viewer::new(surface.clone())?;
    let context = EditorContext::new(world.clone(), camera.clone(), surface)?;

    let fly = Rc::new(RefCell::new(CameraFlyManipulator::new(&context, config.fly)));
    let drag = Rc::new(RefCell::new(DragManipulator::new(&context)));
    let trackball = Rc::new(RefCell::new(TrackballManipulator::new(
        &context,
        config.trackball,
    )));
    viewer.borrow_mut().add_manipulator(&fly);
    viewer.borrow_mut().add_manipulator(&drag);
    viewer.borrow_mut().add_manipulator(&trackball);

    viewer
        .borrow()
        .set_manipulated_entities(&world.borrow(), &[crate_box, barrel]);

    let mut backend = ScriptedBackend::new();

    log::info!("crate starts at {:?}", world.borrow().position(crate_box));
    backend.queue(drag_script());
    drain(&input, &mut backend);
    log::info!(
        "crate after drag pass: {:?}, barrel: {:?}",
        world.borrow().position(crate_box),
        world.borrow().position(barrel)
    );

    backend.queue(trackball_script());
    drain(&input, &mut backend);
    log::info!(
        "crate orientation after trackball pass: {:?}",
        world.borrow().orientation(crate_box)
    );

    log::info!("camera starts at {:?}", camera.borrow().position);
    backend.queue(fly_script());
    drain(&input, &mut backend);
    log::info!("camera after fly pass: {:?}", camera.borrow().position);

    viewer.borrow_mut().shutdown();
    Ok(())
}
