// Virtual joystick drag tracking: pointer position -> knob offset and normalized stick vector.

use wasm_bindgen::prelude::*;

use crate::types::{ClientPoint, GestureVector, JoystickSettings, RelayConfig};

/// Pointer identity. Touch identifiers for touch input, a fixed id for the mouse.
pub type PointerId = i32;

/// Result of feeding a pointer event to the joystick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoystickOutput {
    /// Stick moved: knob offset in CSS pixels and the normalized vector.
    Move {
        knob: ClientPoint,
        vector: GestureVector,
    },
    /// Stick released and returned to center.
    Stop,
    /// Event belongs to another pointer or arrived while inactive.
    Ignored,
}

/// Single-pointer joystick state.
#[derive(Debug, Clone)]
pub struct JoystickTracker {
    max_distance: f64,
    pointer: Option<PointerId>,
    knob: ClientPoint,
}

impl JoystickTracker {
    pub fn new(settings: &JoystickSettings) -> Self {
        JoystickTracker {
            max_distance: settings.max_distance(),
            pointer: None,
            knob: ClientPoint::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.pointer.is_some()
    }

    /// Current knob offset from center, for drawing.
    pub fn knob(&self) -> ClientPoint {
        self.knob
    }

    /// Pointer down on the widget. Claims the pointer; a second concurrent pointer is ignored.
    pub fn begin(&mut self, pointer: PointerId, center: ClientPoint, at: ClientPoint) -> JoystickOutput {
        if self.pointer.is_some_and(|active| active != pointer) {
            return JoystickOutput::Ignored;
        }
        self.pointer = Some(pointer);
        self.track(center, at)
    }

    pub fn move_to(&mut self, pointer: PointerId, center: ClientPoint, at: ClientPoint) -> JoystickOutput {
        if self.pointer != Some(pointer) {
            return JoystickOutput::Ignored;
        }
        self.track(center, at)
    }

    /// Pointer up or cancelled. Only the claiming pointer releases the stick.
    pub fn end(&mut self, pointer: PointerId) -> JoystickOutput {
        if self.pointer != Some(pointer) {
            return JoystickOutput::Ignored;
        }
        self.pointer = None;
        self.knob = ClientPoint::default();
        JoystickOutput::Stop
    }

    fn track(&mut self, center: ClientPoint, at: ClientPoint) -> JoystickOutput {
        if self.max_distance <= 0.0 {
            self.knob = ClientPoint::default();
            return JoystickOutput::Move {
                knob: self.knob,
                vector: GestureVector::zero(),
            };
        }

        let mut dx = at.x - center.x;
        let mut dy = at.y - center.y;
        let distance = dx.hypot(dy);
        if distance > self.max_distance {
            let angle = dy.atan2(dx);
            dx = angle.cos() * self.max_distance;
            dy = angle.sin() * self.max_distance;
        }

        self.knob = ClientPoint::new(dx, dy);
        JoystickOutput::Move {
            knob: self.knob,
            vector: GestureVector::new(dx / self.max_distance, dy / self.max_distance),
        }
    }
}

/// WASM wrapper for the joystick widget.
///
/// Positions are client coordinates; `center_x`/`center_y` is the widget's center.
/// Move results come back as `[x, y, knob_x, knob_y]`; an empty array means the event was ignored.
#[wasm_bindgen(js_name = VirtualJoystick)]
pub struct WasmJoystick {
    inner: JoystickTracker,
}

#[wasm_bindgen(js_class = VirtualJoystick)]
impl WasmJoystick {
    /// Create from the relay config JSON; only the `joystick` section is read.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmJoystick, JsValue> {
        let config = RelayConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmJoystick {
            inner: JoystickTracker::new(&config.joystick),
        })
    }

    pub fn begin(&mut self, pointer_id: i32, center_x: f64, center_y: f64, x: f64, y: f64) -> Vec<f64> {
        let output = self.inner.begin(
            pointer_id,
            ClientPoint::new(center_x, center_y),
            ClientPoint::new(x, y),
        );
        move_to_array(output)
    }

    pub fn move_to(&mut self, pointer_id: i32, center_x: f64, center_y: f64, x: f64, y: f64) -> Vec<f64> {
        let output = self.inner.move_to(
            pointer_id,
            ClientPoint::new(center_x, center_y),
            ClientPoint::new(x, y),
        );
        move_to_array(output)
    }

    /// Returns true when this pointer released the stick.
    pub fn end(&mut self, pointer_id: i32) -> bool {
        self.inner.end(pointer_id) == JoystickOutput::Stop
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }
}

fn move_to_array(output: JoystickOutput) -> Vec<f64> {
    match output {
        JoystickOutput::Move { knob, vector } => vec![vector.x, vector.y, knob.x, knob.y],
        JoystickOutput::Stop | JoystickOutput::Ignored => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: ClientPoint = ClientPoint { x: 100.0, y: 100.0 };

    fn tracker() -> JoystickTracker {
        // size 112, stick 46 -> radius 33
        JoystickTracker::new(&JoystickSettings::default())
    }

    fn vector(output: JoystickOutput) -> GestureVector {
        match output {
            JoystickOutput::Move { vector, .. } => vector,
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn inside_radius_normalizes_linearly() {
        let mut stick = tracker();
        let v = vector(stick.begin(1, CENTER, ClientPoint::new(116.5, 100.0)));
        assert!((v.x - 0.5).abs() < 1e-12);
        assert_eq!(v.y, 0.0);
        assert!(stick.is_active());
    }

    #[test]
    fn outside_radius_clamps_along_angle() {
        let mut stick = tracker();
        let v = vector(stick.begin(1, CENTER, ClientPoint::new(100.0, 0.0)));
        assert!(v.x.abs() < 1e-12);
        assert!((v.y + 1.0).abs() < 1e-12, "up is negative y");

        let v = vector(stick.move_to(1, CENTER, ClientPoint::new(300.0, 300.0)));
        assert!((v.x - v.y).abs() < 1e-12);
        assert!((v.x.hypot(v.y) - 1.0).abs() < 1e-9);
        assert!((stick.knob().x.hypot(stick.knob().y) - 33.0).abs() < 1e-9);
    }

    #[test]
    fn other_pointers_are_ignored() {
        let mut stick = tracker();
        stick.begin(7, CENTER, CENTER);
        assert_eq!(stick.begin(8, CENTER, CENTER), JoystickOutput::Ignored);
        assert_eq!(stick.move_to(8, CENTER, CENTER), JoystickOutput::Ignored);
        assert_eq!(stick.end(8), JoystickOutput::Ignored);
        assert!(stick.is_active());
    }

    #[test]
    fn end_recenters_and_deactivates() {
        let mut stick = tracker();
        stick.begin(1, CENTER, ClientPoint::new(120.0, 90.0));
        assert_eq!(stick.end(1), JoystickOutput::Stop);
        assert!(!stick.is_active());
        assert_eq!(stick.knob(), ClientPoint::default());
        assert_eq!(stick.move_to(1, CENTER, CENTER), JoystickOutput::Ignored);
    }

    #[test]
    fn wasm_wrapper_reports_vector_and_knob() {
        let mut stick = WasmJoystick::new("{}").unwrap();
        let out = stick.begin(3, 100.0, 100.0, 133.0, 100.0);
        assert_eq!(out, vec![1.0, 0.0, 33.0, 0.0]);
        assert!(stick.move_to(4, 100.0, 100.0, 0.0, 0.0).is_empty());
        assert!(!stick.end(4));
        assert!(stick.end(3));
        assert!(!stick.is_active());
    }

    #[test]
    fn degenerate_widget_reports_zero() {
        let mut stick = JoystickTracker::new(&JoystickSettings {
            size: 40.0,
            stick_size: 40.0,
        });
        let v = vector(stick.begin(1, CENTER, ClientPoint::new(150.0, 150.0)));
        assert_eq!(v, GestureVector::zero());
    }
}
