// Remote input transport: semantic input -> remote channel messages, with a synthetic DOM
// fallback whenever the channel lacks the needed handler. Nothing here ever fails the caller.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::channel::{InputChannel, StreamerHandler};
use crate::surface::InputSurface;
use crate::types::*;

/// Primary mouse button index in channel tuples and DOM events.
const PRIMARY_BUTTON: i32 = 0;

/// Semantic input sink used by the look loop and the movement mapper.
pub trait InputTransport {
    /// Relative look motion for one frame.
    fn send_look_delta(&self, delta: PixelDelta);

    /// Click at the exact center of the video target.
    fn send_center_interaction(&self);

    /// Emit one key transition. Deduplication is the caller's job.
    fn send_key(&self, key: MovementKey, action: KeyAction);

    /// Press the primary button on the remote side (hold-while-looking mode).
    fn press_primary(&self);

    fn release_primary(&self);

    /// Forget the emulated cursor position.
    fn reset_virtual_cursor(&self);
}

impl<T: InputTransport + ?Sized> InputTransport for Rc<T> {
    fn send_look_delta(&self, delta: PixelDelta) {
        (**self).send_look_delta(delta)
    }

    fn send_center_interaction(&self) {
        (**self).send_center_interaction()
    }

    fn send_key(&self, key: MovementKey, action: KeyAction) {
        (**self).send_key(key, action)
    }

    fn press_primary(&self) {
        (**self).press_primary()
    }

    fn release_primary(&self) {
        (**self).release_primary()
    }

    fn reset_virtual_cursor(&self) {
        (**self).reset_virtual_cursor()
    }
}

/// Transport over a remote input channel and a DOM surface.
pub struct RemoteInputTransport<C: InputChannel, S: InputSurface> {
    channel: C,
    surface: S,
    cursor: Cell<Option<ClientPoint>>,
}

impl<C: InputChannel, S: InputSurface> RemoteInputTransport<C, S> {
    pub fn new(channel: C, surface: S) -> Self {
        RemoteInputTransport {
            channel,
            surface,
            cursor: Cell::new(None),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Emulated absolute cursor, if the DOM fallback has been used since the last reset.
    pub fn virtual_cursor(&self) -> Option<ClientPoint> {
        self.cursor.get()
    }

    fn resolve_rect(&self) -> Option<TargetRect> {
        let rect = self.surface.target_rect();
        match rect {
            Some(rect) if !rect.is_empty() => Some(rect),
            _ => {
                trace!(?rect, "look target unavailable; dropping input");
                None
            }
        }
    }

    fn center_tuple() -> [i32; 3] {
        [PRIMARY_BUTTON, PROTOCOL_CENTER, PROTOCOL_CENTER]
    }
}

impl<C: InputChannel, S: InputSurface> InputTransport for RemoteInputTransport<C, S> {
    fn send_look_delta(&self, delta: PixelDelta) {
        let Some(rect) = self.resolve_rect() else {
            return;
        };

        if let Some(handler) = self.channel.try_get_handler(StreamerMessage::MouseMove) {
            let (nx, ny) = rect.normalize_delta(delta);
            handler.call(&[PROTOCOL_CENTER, PROTOCOL_CENTER, nx, ny]);
            return;
        }

        let start = self.cursor.get().unwrap_or_else(|| rect.center());
        let client = rect.clamp_point(ClientPoint::new(start.x + delta.dx, start.y + delta.dy));
        self.cursor.set(Some(client));

        self.surface.dispatch_mouse(&SyntheticMouseEvent {
            kind: MouseEventKind::Move,
            client,
            movement: delta,
            button: PRIMARY_BUTTON as i16,
            buttons: 0,
        });
    }

    fn send_center_interaction(&self) {
        let Some(rect) = self.surface.target_rect() else {
            trace!("no look target; interaction dropped");
            return;
        };

        let down = self.channel.try_get_handler(StreamerMessage::MouseDown);
        let up = self.channel.try_get_handler(StreamerMessage::MouseUp);
        if let (Some(down), Some(up)) = (down, up) {
            self.channel.send_if_present(StreamerMessage::MouseEnter, &[]);
            down.call(&Self::center_tuple());
            up.call(&Self::center_tuple());
            return;
        }

        let client = rect.center();
        for (kind, buttons) in [
            (MouseEventKind::Down, 1),
            (MouseEventKind::Up, 0),
            (MouseEventKind::Click, 0),
        ] {
            self.surface.dispatch_mouse(&SyntheticMouseEvent {
                kind,
                client,
                movement: PixelDelta::default(),
                button: PRIMARY_BUTTON as i16,
                buttons,
            });
        }
    }

    fn send_key(&self, key: MovementKey, action: KeyAction) {
        self.surface.dispatch_key(&SyntheticKeyEvent { action, key });
    }

    fn press_primary(&self) {
        self.channel.send_if_present(StreamerMessage::MouseEnter, &[]);
        self.channel
            .send_if_present(StreamerMessage::MouseDown, &Self::center_tuple());
    }

    fn release_primary(&self) {
        self.channel
            .send_if_present(StreamerMessage::MouseUp, &Self::center_tuple());
    }

    fn reset_virtual_cursor(&self) {
        self.cursor.set(None);
    }
}
