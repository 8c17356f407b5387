// Test doubles for the channel, surface, and transport seams.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::channel::{InputChannel, StreamerHandler};
use crate::surface::InputSurface;
use crate::transport::InputTransport;
use crate::types::*;

type CallLog = Rc<RefCell<Vec<(StreamerMessage, Vec<i32>)>>>;

/// Channel with a fixed set of registered handlers that records every call.
pub struct FakeChannel {
    registered: RefCell<HashSet<StreamerMessage>>,
    calls: CallLog,
}

pub struct FakeHandler {
    message: StreamerMessage,
    calls: CallLog,
}

impl StreamerHandler for FakeHandler {
    fn call(&self, args: &[i32]) {
        self.calls.borrow_mut().push((self.message, args.to_vec()));
    }
}

impl FakeChannel {
    pub fn empty() -> Self {
        FakeChannel::with(&[])
    }

    pub fn with(messages: &[StreamerMessage]) -> Self {
        FakeChannel {
            registered: RefCell::new(messages.iter().copied().collect()),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(StreamerMessage, Vec<i32>)> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, message: StreamerMessage) -> Vec<Vec<i32>> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| *m == message)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn unregister_all(&self) {
        self.registered.borrow_mut().clear();
    }
}

impl InputChannel for FakeChannel {
    type Handler = FakeHandler;

    fn try_get_handler(&self, message: StreamerMessage) -> Option<FakeHandler> {
        self.registered
            .borrow()
            .contains(&message)
            .then(|| FakeHandler {
                message,
                calls: self.calls.clone(),
            })
    }
}

/// Surface with a configurable target that records dispatched events.
#[derive(Default)]
pub struct RecordingSurface {
    rect: Option<TargetRect>,
    mouse: RefCell<Vec<SyntheticMouseEvent>>,
    keys: RefCell<Vec<SyntheticKeyEvent>>,
}

impl RecordingSurface {
    pub fn with_rect(rect: TargetRect) -> Self {
        RecordingSurface {
            rect: Some(rect),
            ..Default::default()
        }
    }

    pub fn detached() -> Self {
        RecordingSurface::default()
    }

    pub fn mouse_events(&self) -> Vec<SyntheticMouseEvent> {
        self.mouse.borrow().clone()
    }

    pub fn key_events(&self) -> Vec<SyntheticKeyEvent> {
        self.keys.borrow().clone()
    }
}

impl InputSurface for RecordingSurface {
    fn target_rect(&self) -> Option<TargetRect> {
        self.rect
    }

    fn dispatch_mouse(&self, event: &SyntheticMouseEvent) {
        self.mouse.borrow_mut().push(*event);
    }

    fn dispatch_key(&self, event: &SyntheticKeyEvent) {
        self.keys.borrow_mut().push(*event);
    }
}

/// Semantic transport call, as seen by the look loop and movement mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCall {
    LookDelta(PixelDelta),
    CenterInteraction,
    Key(MovementKey, KeyAction),
    PressPrimary,
    ReleasePrimary,
    ResetCursor,
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: RefCell<Vec<TransportCall>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.borrow().clone()
    }

    pub fn look_deltas(&self) -> Vec<PixelDelta> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                TransportCall::LookDelta(delta) => Some(*delta),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: TransportCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl InputTransport for RecordingTransport {
    fn send_look_delta(&self, delta: PixelDelta) {
        self.record(TransportCall::LookDelta(delta));
    }

    fn send_center_interaction(&self) {
        self.record(TransportCall::CenterInteraction);
    }

    fn send_key(&self, key: MovementKey, action: KeyAction) {
        self.record(TransportCall::Key(key, action));
    }

    fn press_primary(&self) {
        self.record(TransportCall::PressPrimary);
    }

    fn release_primary(&self) {
        self.record(TransportCall::ReleasePrimary);
    }

    fn reset_virtual_cursor(&self) {
        self.record(TransportCall::ResetCursor);
    }
}
