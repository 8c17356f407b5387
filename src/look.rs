// Look stick: per-frame loop turning the latest stick vector into relative camera motion.
//
// Each tick: frame scale -> smoothing -> look curve -> fine/coarse sensitivity -> clamp -> send.
// The loop holds at most one pending frame, parks itself once no further motion is possible,
// and a stop (or drop) cancels the frame and clears every piece of per-gesture state.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::curve::LookCurve;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::smoothing::SmoothingFilter;
use crate::transport::InputTransport;
use crate::types::*;

/// Scheduler-independent look state: raw input, filter, frame timing.
#[derive(Debug, Clone)]
pub struct LookState {
    settings: LookSettings,
    curve: LookCurve,
    raw: GestureVector,
    filter: SmoothingFilter,
    last_frame: Option<FrameTime>,
}

impl LookState {
    pub fn new(settings: LookSettings) -> Self {
        LookState {
            curve: LookCurve::from_settings(&settings),
            filter: SmoothingFilter::new(settings.smoothing),
            settings,
            raw: GestureVector::zero(),
            last_frame: None,
        }
    }

    pub fn settings(&self) -> &LookSettings {
        &self.settings
    }

    pub fn raw(&self) -> GestureVector {
        self.raw
    }

    pub fn smoothed(&self) -> GestureVector {
        self.filter.value()
    }

    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last_frame
    }

    /// Store the latest stick vector. Returns true when it is strong enough to start the loop.
    pub fn set_raw(&mut self, raw: GestureVector) -> bool {
        self.raw = raw;
        raw.max_abs() > self.settings.start_epsilon
    }

    /// Run one frame. Returns the pixel delta to send, if any.
    pub fn advance(&mut self, now: FrameTime) -> Option<PixelDelta> {
        let previous = self.last_frame.unwrap_or(now);
        let frame_scale = self.settings.frame_scale(now.since(previous));
        self.last_frame = Some(now);

        let smoothed = self.filter.update(self.raw);
        let x = self.curve.apply(smoothed.x);
        let y = self.curve.apply(smoothed.y);
        if x == 0.0 && y == 0.0 {
            return None;
        }

        Some(PixelDelta::new(
            self.axis_delta(x, frame_scale),
            self.axis_delta(y, frame_scale),
        ))
    }

    /// True once both raw and smoothed input sit inside the dead zone: the filter only moves
    /// between the two, so every later frame would produce zero output.
    pub fn is_idle(&self) -> bool {
        let dead_zone = self.curve.dead_zone();
        self.raw.max_abs() <= dead_zone && self.filter.value().max_abs() <= dead_zone
    }

    /// Forget frame timing so a restarted loop does not see a huge elapsed time.
    pub fn park(&mut self) {
        self.last_frame = None;
    }

    pub fn reset(&mut self) {
        self.raw = GestureVector::zero();
        self.filter.reset();
        self.last_frame = None;
    }

    fn axis_delta(&self, curved: f64, frame_scale: f64) -> f64 {
        let sensitivity = if curved.abs() < self.settings.fine_zone {
            self.settings.fine_sensitivity_px
        } else {
            self.settings.sensitivity_px
        };
        let max = self.settings.max_delta_px;
        (curved * sensitivity * frame_scale).clamp(-max, max)
    }
}

struct LookShared<T: InputTransport, S: FrameScheduler> {
    state: RefCell<LookState>,
    frame: Cell<Option<FrameHandle>>,
    holding: Cell<bool>,
    transport: T,
    scheduler: S,
}

/// Look stick driven by an injected frame scheduler.
pub struct LookStick<T: InputTransport + 'static, S: FrameScheduler + 'static> {
    shared: Rc<LookShared<T, S>>,
}

impl<T: InputTransport + 'static, S: FrameScheduler + 'static> LookStick<T, S> {
    pub fn new(settings: LookSettings, transport: T, scheduler: S) -> Self {
        LookStick {
            shared: Rc::new(LookShared {
                state: RefCell::new(LookState::new(settings)),
                frame: Cell::new(None),
                holding: Cell::new(false),
                transport,
                scheduler,
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.shared.scheduler
    }

    /// Whether a frame is pending.
    pub fn is_running(&self) -> bool {
        self.shared.frame.get().is_some()
    }

    /// Whether the remote primary button is held for this gesture.
    pub fn is_holding(&self) -> bool {
        self.shared.holding.get()
    }

    pub fn state(&self) -> LookState {
        self.shared.state.borrow().clone()
    }

    /// Feed the latest stick vector (last write wins) and start the loop if needed.
    pub fn update(&self, vector: GestureVector) {
        let should_start = self.shared.state.borrow_mut().set_raw(vector);
        if should_start {
            start(&self.shared);
        }
    }

    /// Stop the loop and clear per-gesture state. Safe to call repeatedly.
    pub fn stop(&self) {
        let shared = &self.shared;
        if let Some(handle) = shared.frame.take() {
            shared.scheduler.cancel_frame(handle);
            debug!("look loop stopped");
        }

        if shared.holding.replace(false) {
            shared.transport.release_primary();
        }

        shared.state.borrow_mut().reset();
        shared.transport.reset_virtual_cursor();
    }
}

impl<T: InputTransport + 'static, S: FrameScheduler + 'static> Drop for LookStick<T, S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn start<T: InputTransport + 'static, S: FrameScheduler + 'static>(shared: &Rc<LookShared<T, S>>) {
    if shared.frame.get().is_some() {
        return;
    }

    let hold = shared.state.borrow().settings().hold_button_while_looking;
    if hold && !shared.holding.get() {
        shared.transport.press_primary();
        shared.holding.set(true);
    }

    debug!("look loop started");
    schedule_tick(shared);
}

fn schedule_tick<T: InputTransport + 'static, S: FrameScheduler + 'static>(
    shared: &Rc<LookShared<T, S>>,
) {
    let weak: Weak<LookShared<T, S>> = Rc::downgrade(shared);
    let request = shared.scheduler.request_frame(Box::new(move |now| {
        if let Some(shared) = weak.upgrade() {
            tick(&shared, now);
        }
    }));

    match request {
        Ok(handle) => shared.frame.set(Some(handle)),
        Err(err) => {
            warn!(%err, "look loop could not schedule a frame");
            shared.frame.set(None);
            shared.state.borrow_mut().park();
        }
    }
}

fn tick<T: InputTransport + 'static, S: FrameScheduler + 'static>(
    shared: &Rc<LookShared<T, S>>,
    now: FrameTime,
) {
    // The handle that brought us here is spent.
    shared.frame.set(None);

    let (delta, idle) = {
        let mut state = shared.state.borrow_mut();
        let delta = state.advance(now);
        (delta, state.is_idle())
    };

    if let Some(delta) = delta {
        shared.transport.send_look_delta(delta);
    }

    // The transport may have re-entered `update` and already rescheduled.
    if shared.frame.get().is_some() {
        return;
    }

    if idle {
        debug!("look input settled; parking loop");
        shared.state.borrow_mut().park();
        return;
    }

    schedule_tick(shared);
}
