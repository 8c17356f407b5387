// stream_relay: Rust/WASM input relay for the pixel-streamed exhibition scene.
// All shaping and protocol mapping lives here; JS only forwards stick vectors and button presses.

mod channel;
mod curve;
mod error;
mod joystick;
mod look;
mod movement;
mod scheduler;
mod session;
mod smoothing;
mod surface;
mod transport;
mod types;
mod web;

#[cfg(test)]
mod testing;

use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

pub use channel::{InputChannel, StreamerHandler};
pub use curve::LookCurve;
pub use error::RelayError;
pub use joystick::{JoystickOutput, JoystickTracker, PointerId, WasmJoystick};
pub use look::{LookState, LookStick};
pub use movement::MovementRelay;
pub use scheduler::{FrameCallback, FrameHandle, FrameScheduler, ManualScheduler};
pub use session::{input_label, normalize_signaling_url, InputFlags, StreamInputMode};
pub use smoothing::SmoothingFilter;
pub use surface::InputSurface;
pub use transport::{InputTransport, RemoteInputTransport};
pub use types::*;
pub use web::{install_console_logging, DomSurface, JsChannel, RafScheduler};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Route `tracing` output to the browser console at the given level ("warn", "debug", ...).
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) -> Result<(), JsValue> {
    install_console_logging(level).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Signaling address -> WebSocket URL, honoring the page's security context.
#[wasm_bindgen(js_name = normalizeSignalingUrl)]
pub fn normalize_signaling_url_js(input: &str, page_is_secure: bool) -> String {
    normalize_signaling_url(input, page_is_secure)
}

/// Player input flags as JSON, plus a status label.
/// `mode` is "joystick" or "touch". Pass `keyboard_enabled = false` while chat has focus.
#[wasm_bindgen(js_name = resolveInputFlags)]
pub fn resolve_input_flags(is_mobile: bool, mode: &str, keyboard_enabled: bool) -> Result<String, JsValue> {
    let mode: StreamInputMode = serde_json::from_value(serde_json::Value::String(mode.to_string()))
        .map_err(|e| JsValue::from_str(&format!("Invalid input mode: {}", e)))?;

    let flags = InputFlags::resolve(is_mobile, mode, keyboard_enabled);
    let mut value = serde_json::to_value(flags)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
    value["label"] = serde_json::Value::from(input_label(is_mobile, mode));

    serde_json::to_string(&value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

type WebTransport = RemoteInputTransport<Rc<JsChannel>, Rc<DomSurface>>;

/// Mobile stream controls exposed to JavaScript: move stick, look stick, interact button.
#[wasm_bindgen]
pub struct StreamControls {
    surface: Rc<DomSurface>,
    channel: Rc<JsChannel>,
    transport: Rc<WebTransport>,
    movement: MovementRelay<Rc<WebTransport>>,
    look: LookStick<Rc<WebTransport>, RafScheduler>,
}

#[wasm_bindgen]
impl StreamControls {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, video: Option<HtmlVideoElement>) -> Result<StreamControls, JsValue> {
        let config = RelayConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let surface = Rc::new(DomSurface::new(video).map_err(|e| JsValue::from_str(&e.to_string()))?);
        let scheduler = RafScheduler::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let channel = Rc::new(JsChannel::new());
        let transport = Rc::new(RemoteInputTransport::new(channel.clone(), surface.clone()));

        Ok(StreamControls {
            movement: MovementRelay::new(&config.movement, transport.clone()),
            look: LookStick::new(config.look, transport.clone(), scheduler),
            surface,
            channel,
            transport,
        })
    }

    /// Point the look target at the stream's video element once it exists.
    pub fn set_video_element(&self, video: Option<HtmlVideoElement>) {
        self.surface.set_video(video);
    }

    /// Attach the player's remote input handler map (message name -> function).
    pub fn attach_channel(&self, handlers: js_sys::Map) {
        self.channel.attach(handlers);
    }

    pub fn detach_channel(&self) {
        self.channel.detach();
    }

    pub fn is_channel_attached(&self) -> bool {
        self.channel.is_attached()
    }

    /// Move stick vector, each axis in [-1, 1].
    pub fn move_stick(&mut self, x: f64, y: f64) {
        self.movement.update(GestureVector::new(x, y));
    }

    pub fn stop_move(&mut self) {
        self.movement.release_all();
    }

    /// Look stick vector, each axis in [-1, 1].
    pub fn look_stick(&self, x: f64, y: f64) {
        self.look.update(GestureVector::new(x, y));
    }

    pub fn stop_look(&self) {
        self.look.stop();
    }

    pub fn is_looking(&self) -> bool {
        self.look.is_running()
    }

    /// Click whatever sits under the crosshair at the center of the stream.
    pub fn interact(&self) {
        self.transport.send_center_interaction();
    }

    /// Release everything this component holds. Call on unmount.
    pub fn dispose(&mut self) {
        self.look.stop();
        self.movement.release_all();
        self.channel.detach();
        debug!("stream controls disposed");
    }
}
