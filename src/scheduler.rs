// Frame scheduling capability for the look loop.
// The browser wraps requestAnimationFrame; tests drive frames by hand with ManualScheduler.

use std::cell::{Cell, RefCell};

use crate::error::RelayError;
use crate::types::FrameTime;

/// Callback run once on the next frame.
pub type FrameCallback = Box<dyn FnOnce(FrameTime)>;

/// Opaque handle for a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Render-synchronized one-shot timer.
pub trait FrameScheduler {
    /// Run `callback` on the next frame.
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, RelayError>;

    /// Cancel a pending request. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for std::rc::Rc<S> {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, RelayError> {
        (**self).request_frame(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        (**self).cancel_frame(handle)
    }
}

/// Deterministic scheduler: frames fire only when `fire` is called.
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    next_id: Cell<i32>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run every callback queued before this call. Returns how many ran.
    pub fn fire(&self, now: FrameTime) -> usize {
        let due: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        let count = due.len();
        for (_, callback) in due {
            callback(now);
        }
        count
    }

    /// Fire `frames` consecutive frames `period_ms` apart, starting at `start_ms`.
    /// Returns the time of the last frame fired.
    pub fn run_frames(&self, start_ms: f64, period_ms: f64, frames: usize) -> FrameTime {
        let mut now = FrameTime::from_millis(start_ms);
        for i in 0..frames {
            now = FrameTime::from_millis(start_ms + period_ms * i as f64);
            self.fire(now);
        }
        now
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, RelayError> {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        let handle = FrameHandle(id);
        self.pending.borrow_mut().push((handle, callback));
        Ok(handle)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|(pending, _)| *pending != handle);
    }
}
