// Browser implementations of the relay capabilities: DOM surface, JS handler channel,
// requestAnimationFrame scheduler, and a tracing writer that targets the console.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use js_sys::{Array, Function, Map, Reflect};
use tracing::{debug, warn, Level, Metadata};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    console, Document, HtmlElement, HtmlVideoElement, KeyboardEvent, KeyboardEventInit, MouseEvent,
    MouseEventInit, Window,
};

use crate::channel::{InputChannel, StreamerHandler};
use crate::error::RelayError;
use crate::scheduler::{FrameCallback, FrameHandle, FrameScheduler};
use crate::surface::InputSurface;
use crate::types::*;

/// Container the streaming player mounts into.
const PLAYER_CONTAINER: &str = "#player-container";
const PLAYER_VIDEO: &str = "#player-container video";

fn browser() -> Result<(Window, Document), RelayError> {
    let window = web_sys::window().ok_or_else(|| RelayError::Dom("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| RelayError::Dom("no document".to_string()))?;
    Ok((window, document))
}

fn set_number(target: &JsValue, field: &str, value: f64) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(field), &JsValue::from_f64(value)).map(|_| ())
}

/// The page around the remote video.
pub struct DomSurface {
    window: Window,
    document: Document,
    video: RefCell<Option<HtmlVideoElement>>,
}

impl DomSurface {
    pub fn new(video: Option<HtmlVideoElement>) -> Result<Self, RelayError> {
        let (window, document) = browser()?;
        Ok(DomSurface {
            window,
            document,
            video: RefCell::new(video),
        })
    }

    pub fn set_video(&self, video: Option<HtmlVideoElement>) {
        *self.video.borrow_mut() = video;
    }

    /// Resolve the look target: the video's parent, the player's video parent,
    /// the player container, then the whole page.
    pub fn look_target(&self) -> Option<HtmlElement> {
        let from_video = self
            .video
            .borrow()
            .as_ref()
            .and_then(|video| video.parent_element())
            .and_then(|parent| parent.dyn_into::<HtmlElement>().ok());

        from_video
            .or_else(|| {
                self.query(PLAYER_VIDEO)
                    .and_then(|video| video.parent_element())
                    .and_then(|parent| parent.dyn_into::<HtmlElement>().ok())
            })
            .or_else(|| {
                self.query(PLAYER_CONTAINER)
                    .and_then(|container| container.dyn_into::<HtmlElement>().ok())
            })
            .or_else(|| self.document.body())
    }

    fn query(&self, selector: &str) -> Option<web_sys::Element> {
        self.document.query_selector(selector).ok().flatten()
    }
}

impl InputSurface for DomSurface {
    fn target_rect(&self) -> Option<TargetRect> {
        let rect = self.look_target()?.get_bounding_client_rect();
        Some(TargetRect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn dispatch_mouse(&self, event: &SyntheticMouseEvent) {
        let Some(target) = self.look_target() else {
            return;
        };

        let init = MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_view(Some(&self.window));
        init.set_button(event.button);
        init.set_buttons(event.buttons);
        init.set_movement_x(event.movement.dx.round() as i32);
        init.set_movement_y(event.movement.dy.round() as i32);

        // The typed setters take whole pixels; the target center can be fractional.
        let dispatched = set_number(&init, "clientX", event.client.x)
            .and_then(|()| set_number(&init, "clientY", event.client.y))
            .and_then(|()| MouseEvent::new_with_mouse_event_init_dict(event.kind.event_type(), &init))
            .and_then(|mouse| target.dispatch_event(&mouse));
        if let Err(err) = dispatched {
            warn!(kind = event.kind.event_type(), ?err, "synthetic mouse event failed");
        }
    }

    fn dispatch_key(&self, event: &SyntheticKeyEvent) {
        let init = KeyboardEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_view(Some(&self.window));
        init.set_key(event.key.key());
        init.set_code(event.key.code());
        // Legacy fields some remote players still read.
        init.set_key_code(event.key.key_code());
        init.set_which(event.key.key_code());

        let dispatched =
            KeyboardEvent::new_with_keyboard_event_init_dict(event.action.event_type(), &init)
                .and_then(|key| self.document.dispatch_event(&key));
        if let Err(err) = dispatched {
            warn!(key = event.key.code(), ?err, "synthetic keyboard event failed");
        }
    }
}

/// Remote input handlers attached explicitly by the host once the stream connects.
#[derive(Default)]
pub struct JsChannel {
    handlers: RefCell<Option<Map>>,
}

impl JsChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the player's `toStreamerHandlers` map. Replaces any previous map.
    pub fn attach(&self, handlers: Map) {
        debug!(handlers = handlers.size(), "remote input channel attached");
        *self.handlers.borrow_mut() = Some(handlers);
    }

    pub fn detach(&self) {
        if self.handlers.borrow_mut().take().is_some() {
            debug!("remote input channel detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.handlers.borrow().is_some()
    }
}

impl InputChannel for JsChannel {
    type Handler = Function;

    fn try_get_handler(&self, message: StreamerMessage) -> Option<Function> {
        let handlers = self.handlers.borrow();
        let value = handlers.as_ref()?.get(&JsValue::from_str(message.as_str()));
        value.dyn_into::<Function>().ok()
    }
}

impl StreamerHandler for Function {
    fn call(&self, args: &[i32]) {
        let result = if args.is_empty() {
            self.call0(&JsValue::NULL)
        } else {
            let tuple: Array = args.iter().map(|value| JsValue::from(*value)).collect();
            self.call1(&JsValue::NULL, &tuple)
        };
        if let Err(err) = result {
            warn!(?err, "remote input handler threw");
        }
    }
}

type PendingFrames = Rc<RefCell<HashMap<i32, Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` scheduler.
///
/// Scheduled closures stay owned here until they fire or are cancelled, so a cancelled
/// frame frees its callback instead of leaving it behind in JS.
pub struct RafScheduler {
    window: Window,
    pending: PendingFrames,
}

impl RafScheduler {
    pub fn new() -> Result<Self, RelayError> {
        let (window, _) = browser()?;
        Ok(RafScheduler {
            window,
            pending: Rc::new(RefCell::new(HashMap::new())),
        })
    }

    /// Frames requested but not yet fired or cancelled.
    pub fn pending_frames(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, RelayError> {
        let slot = Rc::new(Cell::new(None::<i32>));
        let registry = Rc::downgrade(&self.pending);
        let own_handle = slot.clone();

        let closure: Closure<dyn FnMut(f64)> = Closure::once(move |timestamp: f64| {
            // Taken out before running so the callback may schedule the next frame.
            // Dropping it mid-call only releases JS's handle; the box is freed on return.
            let _finished = match (registry.upgrade(), own_handle.get()) {
                (Some(pending), Some(handle)) => pending.borrow_mut().remove(&handle),
                _ => None,
            };
            callback(FrameTime::from_millis(timestamp));
        });

        let handle = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(|err| RelayError::Scheduler(format!("{err:?}")))?;
        slot.set(Some(handle));
        self.pending.borrow_mut().insert(handle, closure);
        Ok(FrameHandle(handle))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if let Err(err) = self.window.cancel_animation_frame(handle.0) {
            warn!(?err, "cancelAnimationFrame failed");
        }
        self.pending.borrow_mut().remove(&handle.0);
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        for (handle, _closure) in self.pending.borrow_mut().drain() {
            if let Err(err) = self.window.cancel_animation_frame(handle) {
                warn!(?err, "cancelAnimationFrame failed");
            }
        }
    }
}

/// One formatted event, flushed to the console method matching its level.
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buffer);
        let line = JsValue::from_str(text.trim_end());
        match self.level {
            Level::ERROR => console::error_1(&line),
            Level::WARN => console::warn_1(&line),
            Level::INFO => console::info_1(&line),
            _ => console::debug_1(&line),
        }
    }
}

pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}

/// Install the console tracing subscriber. A second install keeps the first one.
pub fn install_console_logging(level: &str) -> Result<(), RelayError> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| RelayError::InvalidConfig(format!("unknown log level: {level}")))?;

    let subscriber = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_target(false)
        .with_max_level(filter)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("console logging already installed");
    }
    Ok(())
}
