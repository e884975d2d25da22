//! Pointer input for the viewer.
//!
//! Tracks the pointer in pixels and normalized device coordinates, collects
//! pointer-down events (mouse or touch) together with a flag saying whether
//! they landed on a registered UI region, and accumulates drag and scroll
//! deltas between frames.

use std::collections::HashSet;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::error::{ConfigError, ConfigResult};
use crate::layout::check_unit;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// A rectangle of the window occupied by UI, in window fractions with the
/// origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiRegion {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl UiRegion {
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    /// Whether a point in window fractions lies inside the region.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min[0] && point.x <= self.max[0] && point.y >= self.min[1] && point.y <= self.max[1]
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for v in self.min.iter().chain(&self.max) {
            check_unit("viewer.ui_regions", *v)?;
        }
        if self.min[0] > self.max[0] || self.min[1] > self.max[1] {
            return Err(ConfigError::invalid("viewer.ui_regions min must not exceed max"));
        }
        Ok(())
    }
}

/// One pointer-down, as the animation controller wants it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerDown {
    /// Session time of the event itself, not of the frame that reads it.
    pub timestamp: Duration,
    /// Landed on a UI region.
    pub over_ui: bool,
}

/// Input state tracking for the pointer and a few keys.
#[derive(Debug, Default)]
pub struct Input {
    keys_pressed: HashSet<KeyCode>,
    mouse_held: HashSet<MouseButton>,

    pointer_position: Vec2,
    pointer_ndc: Vec2,
    drag_delta: Vec2,
    scroll_delta: f32,
    pointer_downs: Vec<PointerDown>,
    /// The current drag started on UI and must not orbit the camera.
    drag_captured_by_ui: bool,

    window_size: (u32, u32),
    ui_regions: Vec<UiRegion>,
}

impl Input {
    pub fn new(ui_regions: Vec<UiRegion>) -> Self {
        Self {
            window_size: (800, 600),
            ui_regions,
            ..Default::default()
        }
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Pointer position in screen pixels.
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer_position
    }

    /// Pointer position in normalized device coordinates (-1 to 1).
    ///
    /// Origin is at center of window. X increases to the right, Y increases upward.
    pub fn pointer_ndc(&self) -> Vec2 {
        self.pointer_ndc
    }

    /// Pixels dragged with the left button since the last frame, excluding
    /// drags that started on UI.
    pub fn drag_delta(&self) -> Vec2 {
        self.drag_delta
    }

    /// Scroll wheel delta this frame. Positive values scroll up/forward.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Pointer-downs since the last call, oldest first.
    pub fn take_pointer_downs(&mut self) -> Vec<PointerDown> {
        std::mem::take(&mut self.pointer_downs)
    }

    /// Clear per-frame state. Call after the frame consumed it.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.drag_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    fn window_fraction(&self, position: Vec2) -> Option<Vec2> {
        let (w, h) = self.window_size;
        (w > 0 && h > 0).then(|| position / Vec2::new(w as f32, h as f32))
    }

    fn over_ui(&self, position: Vec2) -> bool {
        self.window_fraction(position)
            .is_some_and(|p| self.ui_regions.iter().any(|r| r.contains(p)))
    }

    fn move_pointer(&mut self, position: Vec2) {
        if self.mouse_held(MouseButton::Left) && !self.drag_captured_by_ui {
            self.drag_delta += position - self.pointer_position;
        }
        self.pointer_position = position;
        if let Some(f) = self.window_fraction(position) {
            self.pointer_ndc = Vec2::new(f.x * 2.0 - 1.0, 1.0 - f.y * 2.0);
        }
    }

    fn press_pointer(&mut self, timestamp: Duration) {
        let over_ui = self.over_ui(self.pointer_position);
        self.drag_captured_by_ui = over_ui;
        self.pointer_downs.push(PointerDown {
            timestamp,
            over_ui,
        });
    }

    /// Process a winit window event received at session time `now`.
    pub fn handle_event(&mut self, event: &WindowEvent, now: Duration) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if event.state == ElementState::Pressed && !event.repeat {
                        self.keys_pressed.insert(code);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                match state {
                    ElementState::Pressed => {
                        self.mouse_held.insert(btn);
                        if btn == MouseButton::Left {
                            self.press_pointer(now);
                        }
                    }
                    ElementState::Released => {
                        self.mouse_held.remove(&btn);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.move_pointer(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => {
                        self.move_pointer(position);
                        self.mouse_held.insert(MouseButton::Left);
                        self.press_pointer(now);
                    }
                    TouchPhase::Moved => self.move_pointer(position),
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        self.mouse_held.remove(&MouseButton::Left);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            _ => {}
        }
    }
}
