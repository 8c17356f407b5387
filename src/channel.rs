// Capability view of the remote streamer's input channel.
// The registry may be absent (not connected yet), so every lookup is an Option.

use std::rc::Rc;

use crate::types::StreamerMessage;

/// One registered sender on the remote input channel.
pub trait StreamerHandler {
    /// Send a message. Delivery is fire-and-forget.
    fn call(&self, args: &[i32]);
}

/// Named handler registry of the remote rendering server.
pub trait InputChannel {
    type Handler: StreamerHandler;

    fn try_get_handler(&self, message: StreamerMessage) -> Option<Self::Handler>;

    fn has_handler(&self, message: StreamerMessage) -> bool {
        self.try_get_handler(message).is_some()
    }

    /// Send to `message` if it is registered. Returns whether a handler was found.
    fn send_if_present(&self, message: StreamerMessage, args: &[i32]) -> bool {
        match self.try_get_handler(message) {
            Some(handler) => {
                handler.call(args);
                true
            }
            None => false,
        }
    }
}

impl<C: InputChannel + ?Sized> InputChannel for Rc<C> {
    type Handler = C::Handler;

    fn try_get_handler(&self, message: StreamerMessage) -> Option<Self::Handler> {
        (**self).try_get_handler(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChannel;

    #[test]
    fn send_if_present_reports_missing_handler() {
        let channel = FakeChannel::with(&[StreamerMessage::MouseDown]);
        assert!(channel.send_if_present(StreamerMessage::MouseDown, &[0, 1, 2]));
        assert!(!channel.send_if_present(StreamerMessage::MouseUp, &[0, 1, 2]));
        assert_eq!(channel.calls(), vec![(StreamerMessage::MouseDown, vec![0, 1, 2])]);
    }

    #[test]
    fn rc_channel_delegates() {
        let channel = Rc::new(FakeChannel::with(&[StreamerMessage::MouseMove]));
        assert!(channel.has_handler(StreamerMessage::MouseMove));
        assert!(!channel.has_handler(StreamerMessage::KeyDown));
    }
}
