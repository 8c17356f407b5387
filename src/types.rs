// Strong typing for the relay: gesture vectors, pixel deltas, frame times, target geometry.
// Config structs carry serde defaults so `{}` from JS is always a usable config.

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Center of the remote protocol's 0..=65535 fixed-point axis.
pub const PROTOCOL_CENTER: i32 = 32768;

/// Largest magnitude a fixed-point delta may carry either side of center.
pub const PROTOCOL_HALF_RANGE: i32 = 32767;

/// Animation-frame timestamp in milliseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct FrameTime(f64);

impl FrameTime {
    pub fn from_millis(ms: f64) -> Self {
        FrameTime(ms)
    }

    pub fn as_millis(&self) -> f64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`. Never negative.
    pub fn since(&self, earlier: FrameTime) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

/// Raw stick deflection, each axis in [-1, 1]. Screen space: up is negative Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GestureVector {
    pub x: f64,
    pub y: f64,
}

impl GestureVector {
    pub fn new(x: f64, y: f64) -> Self {
        GestureVector {
            x: sanitize_axis(x),
            y: sanitize_axis(y),
        }
    }

    pub fn zero() -> Self {
        GestureVector { x: 0.0, y: 0.0 }
    }

    /// Largest absolute axis value.
    pub fn max_abs(&self) -> f64 {
        self.x.abs().max(self.y.abs())
    }
}

fn sanitize_axis(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Per-frame look motion in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PixelDelta {
    pub dx: f64,
    pub dy: f64,
}

impl PixelDelta {
    pub fn new(dx: f64, dy: f64) -> Self {
        PixelDelta { dx, dy }
    }
}

/// Absolute viewport position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClientPoint {
    pub x: f64,
    pub y: f64,
}

impl ClientPoint {
    pub fn new(x: f64, y: f64) -> Self {
        ClientPoint { x, y }
    }
}

/// Bounding box of the element hosting the remote video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TargetRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TargetRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        TargetRect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Zero-area (collapsed or hidden) targets cannot normalize deltas.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> ClientPoint {
        ClientPoint::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn clamp_point(&self, point: ClientPoint) -> ClientPoint {
        ClientPoint::new(
            point.x.clamp(self.left, self.right()),
            point.y.clamp(self.top, self.bottom()),
        )
    }

    /// Scale a pixel delta against half the target size into the protocol's fixed-point range.
    pub fn normalize_delta(&self, delta: PixelDelta) -> (i32, i32) {
        (
            to_fixed_point(delta.dx, self.width),
            to_fixed_point(delta.dy, self.height),
        )
    }
}

fn to_fixed_point(delta: f64, extent: f64) -> i32 {
    let half_range = PROTOCOL_HALF_RANGE as f64;
    ((delta / (extent * 0.5)) * half_range)
        .round()
        .clamp(-half_range, half_range) as i32
}

/// Named messages understood by the remote streamer's input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamerMessage {
    MouseEnter,
    MouseMove,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
}

impl StreamerMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamerMessage::MouseEnter => "MouseEnter",
            StreamerMessage::MouseMove => "MouseMove",
            StreamerMessage::MouseDown => "MouseDown",
            StreamerMessage::MouseUp => "MouseUp",
            StreamerMessage::KeyDown => "KeyDown",
            StreamerMessage::KeyUp => "KeyUp",
        }
    }
}

/// The four movement keys relayed from the move stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovementKey {
    W,
    A,
    S,
    D,
}

impl MovementKey {
    pub const ALL: [MovementKey; 4] = [MovementKey::W, MovementKey::A, MovementKey::S, MovementKey::D];

    /// `KeyboardEvent.key`.
    pub fn key(&self) -> &'static str {
        match self {
            MovementKey::W => "w",
            MovementKey::A => "a",
            MovementKey::S => "s",
            MovementKey::D => "d",
        }
    }

    /// `KeyboardEvent.code`.
    pub fn code(&self) -> &'static str {
        match self {
            MovementKey::W => "KeyW",
            MovementKey::A => "KeyA",
            MovementKey::S => "KeyS",
            MovementKey::D => "KeyD",
        }
    }

    /// Legacy `keyCode` / `which`.
    pub fn key_code(&self) -> u32 {
        match self {
            MovementKey::W => 87,
            MovementKey::A => 65,
            MovementKey::S => 83,
            MovementKey::D => 68,
        }
    }
}

/// Key transition direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    Down,
    Up,
}

impl KeyAction {
    pub fn event_type(&self) -> &'static str {
        match self {
            KeyAction::Down => "keydown",
            KeyAction::Up => "keyup",
        }
    }
}

/// Synthetic DOM mouse event kinds the transport can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    Move,
    Down,
    Up,
    Click,
}

impl MouseEventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            MouseEventKind::Move => "mousemove",
            MouseEventKind::Down => "mousedown",
            MouseEventKind::Up => "mouseup",
            MouseEventKind::Click => "click",
        }
    }
}

/// A mouse event to dispatch on the look target when the direct channel is missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMouseEvent {
    pub kind: MouseEventKind,
    pub client: ClientPoint,
    pub movement: PixelDelta,
    pub button: i16,
    pub buttons: u16,
}

/// A keyboard event to dispatch on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticKeyEvent {
    pub action: KeyAction,
    pub key: MovementKey,
}

/// Relay configuration passed from JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub look: LookSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub joystick: JoystickSettings,
}

impl RelayConfig {
    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        let config: RelayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        self.look.validate()?;
        self.movement.validate()?;
        self.joystick.validate()
    }
}

/// Look stick tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookSettings {
    /// Axis magnitude treated as no input.
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,
    /// Response curve exponent applied after the dead-zone remap.
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    /// Low-pass factor per tick. Smaller is smoother but laggier.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Curved magnitude below which the fine sensitivity applies.
    #[serde(default = "default_fine_zone")]
    pub fine_zone: f64,
    #[serde(default = "default_fine_sensitivity_px")]
    pub fine_sensitivity_px: f64,
    #[serde(default = "default_sensitivity_px")]
    pub sensitivity_px: f64,
    /// Per-axis clamp on the emitted delta.
    #[serde(default = "default_max_delta_px")]
    pub max_delta_px: f64,
    /// Raw magnitude that starts the look loop.
    #[serde(default = "default_start_epsilon")]
    pub start_epsilon: f64,
    /// Baseline frame period for motion scaling (60 Hz).
    #[serde(default = "default_frame_period_ms")]
    pub frame_period_ms: f64,
    #[serde(default = "default_min_frame_scale")]
    pub min_frame_scale: f64,
    #[serde(default = "default_max_frame_scale")]
    pub max_frame_scale: f64,
    /// Hold the primary button on the remote side for the duration of a look gesture.
    #[serde(default)]
    pub hold_button_while_looking: bool,
}

impl Default for LookSettings {
    fn default() -> Self {
        LookSettings {
            dead_zone: default_dead_zone(),
            exponent: default_exponent(),
            smoothing: default_smoothing(),
            fine_zone: default_fine_zone(),
            fine_sensitivity_px: default_fine_sensitivity_px(),
            sensitivity_px: default_sensitivity_px(),
            max_delta_px: default_max_delta_px(),
            start_epsilon: default_start_epsilon(),
            frame_period_ms: default_frame_period_ms(),
            min_frame_scale: default_min_frame_scale(),
            max_frame_scale: default_max_frame_scale(),
            hold_button_while_looking: false,
        }
    }
}

impl LookSettings {
    /// Motion scale for a frame that took `elapsed_ms`, relative to the baseline period.
    pub fn frame_scale(&self, elapsed_ms: f64) -> f64 {
        (elapsed_ms / self.frame_period_ms).clamp(self.min_frame_scale, self.max_frame_scale)
    }

    fn validate(&self) -> Result<(), RelayError> {
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(invalid("look.dead_zone must be in [0, 1)"));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(invalid("look.smoothing must be in (0, 1]"));
        }
        for (name, value) in [
            ("look.exponent", self.exponent),
            ("look.fine_sensitivity_px", self.fine_sensitivity_px),
            ("look.sensitivity_px", self.sensitivity_px),
            ("look.max_delta_px", self.max_delta_px),
            ("look.frame_period_ms", self.frame_period_ms),
            ("look.min_frame_scale", self.min_frame_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(&format!("{} must be positive", name)));
            }
        }
        if !(self.max_frame_scale >= self.min_frame_scale) {
            return Err(invalid("look.max_frame_scale must not be below look.min_frame_scale"));
        }
        if !(self.start_epsilon >= 0.0) {
            return Err(invalid("look.start_epsilon must not be negative"));
        }
        Ok(())
    }
}

fn default_dead_zone() -> f64 {
    0.06
}

fn default_exponent() -> f64 {
    2.1
}

fn default_smoothing() -> f64 {
    0.22
}

fn default_fine_zone() -> f64 {
    0.45
}

fn default_fine_sensitivity_px() -> f64 {
    4.5
}

fn default_sensitivity_px() -> f64 {
    10.0
}

fn default_max_delta_px() -> f64 {
    14.0
}

fn default_start_epsilon() -> f64 {
    0.01
}

fn default_frame_period_ms() -> f64 {
    16.6667
}

fn default_min_frame_scale() -> f64 {
    0.5
}

fn default_max_frame_scale() -> f64 {
    2.0
}

/// Move stick tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSettings {
    /// Per-axis deflection past which a movement key is held.
    #[serde(default = "default_movement_threshold")]
    pub threshold: f64,
}

impl Default for MovementSettings {
    fn default() -> Self {
        MovementSettings {
            threshold: default_movement_threshold(),
        }
    }
}

impl MovementSettings {
    fn validate(&self) -> Result<(), RelayError> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(invalid("movement.threshold must be in (0, 1)"));
        }
        Ok(())
    }
}

fn default_movement_threshold() -> f64 {
    0.5
}

/// Virtual joystick widget geometry, in CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoystickSettings {
    #[serde(default = "default_joystick_size")]
    pub size: f64,
    #[serde(default = "default_stick_size")]
    pub stick_size: f64,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        JoystickSettings {
            size: default_joystick_size(),
            stick_size: default_stick_size(),
        }
    }
}

impl JoystickSettings {
    /// Radius the knob may travel from center.
    pub fn max_distance(&self) -> f64 {
        (self.size - self.stick_size) / 2.0
    }

    fn validate(&self) -> Result<(), RelayError> {
        if !(self.stick_size >= 0.0 && self.size > self.stick_size) {
            return Err(invalid("joystick.size must exceed joystick.stick_size"));
        }
        Ok(())
    }
}

fn default_joystick_size() -> f64 {
    112.0
}

fn default_stick_size() -> f64 {
    46.0
}

fn invalid(message: &str) -> RelayError {
    RelayError::InvalidConfig(message.to_string())
}
