// Move stick relay: continuous stick vector -> held WASD keys.
// Key state is deduplicated here so the remote side never sees a repeat or an orphan keyup.

use std::collections::BTreeSet;

use tracing::debug;

use crate::transport::InputTransport;
use crate::types::*;

/// Turns move-stick deflection into sustained key holds.
pub struct MovementRelay<T: InputTransport> {
    transport: T,
    threshold: f64,
    held: BTreeSet<MovementKey>,
}

impl<T: InputTransport> MovementRelay<T> {
    pub fn new(settings: &MovementSettings, transport: T) -> Self {
        MovementRelay {
            transport,
            threshold: settings.threshold,
            held: BTreeSet::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_held(&self, key: MovementKey) -> bool {
        self.held.contains(&key)
    }

    pub fn held_keys(&self) -> Vec<MovementKey> {
        self.held.iter().copied().collect()
    }

    /// Emit a key transition unless it would be redundant.
    /// Returns whether an event was dispatched.
    pub fn simulate_key(&mut self, key: MovementKey, action: KeyAction) -> bool {
        let changed = match action {
            KeyAction::Down => self.held.insert(key),
            KeyAction::Up => self.held.remove(&key),
        };
        if changed {
            self.transport.send_key(key, action);
        }
        changed
    }

    /// Apply the latest stick vector. Each axis is handled independently.
    pub fn update(&mut self, vector: GestureVector) {
        self.apply_axis(vector.y, MovementKey::W, MovementKey::S);
        self.apply_axis(vector.x, MovementKey::A, MovementKey::D);
    }

    /// Release all four keys regardless of last known state.
    pub fn release_all(&mut self) {
        if !self.held.is_empty() {
            debug!(held = ?self.held, "releasing movement keys");
        }
        for key in MovementKey::ALL {
            self.simulate_key(key, KeyAction::Up);
        }
    }

    fn apply_axis(&mut self, value: f64, negative: MovementKey, positive: MovementKey) {
        if value < -self.threshold {
            self.simulate_key(negative, KeyAction::Down);
            self.simulate_key(positive, KeyAction::Up);
        } else if value > self.threshold {
            self.simulate_key(positive, KeyAction::Down);
            self.simulate_key(negative, KeyAction::Up);
        } else {
            self.simulate_key(negative, KeyAction::Up);
            self.simulate_key(positive, KeyAction::Up);
        }
    }
}

impl<T: InputTransport> Drop for MovementRelay<T> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, TransportCall};
    use std::rc::Rc;

    fn relay() -> (MovementRelay<Rc<RecordingTransport>>, Rc<RecordingTransport>) {
        let transport = Rc::new(RecordingTransport::default());
        (
            MovementRelay::new(&MovementSettings::default(), transport.clone()),
            transport,
        )
    }

    #[test]
    fn keydown_twice_dispatches_once() {
        let (mut relay, transport) = relay();
        assert!(relay.simulate_key(MovementKey::W, KeyAction::Down));
        assert!(!relay.simulate_key(MovementKey::W, KeyAction::Down));
        assert_eq!(
            transport.calls(),
            vec![TransportCall::Key(MovementKey::W, KeyAction::Down)]
        );
    }

    #[test]
    fn keyup_without_keydown_dispatches_nothing() {
        let (mut relay, transport) = relay();
        assert!(!relay.simulate_key(MovementKey::W, KeyAction::Up));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn forward_then_backward_swaps_keys() {
        let (mut relay, transport) = relay();
        relay.update(GestureVector::new(0.0, -0.9));
        assert_eq!(relay.held_keys(), vec![MovementKey::W]);

        relay.update(GestureVector::new(0.0, 0.9));
        assert_eq!(relay.held_keys(), vec![MovementKey::S]);
        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Key(MovementKey::W, KeyAction::Down),
                TransportCall::Key(MovementKey::S, KeyAction::Down),
                TransportCall::Key(MovementKey::W, KeyAction::Up),
            ]
        );
    }

    #[test]
    fn axes_are_independent_and_dead_band_releases() {
        let (mut relay, _transport) = relay();
        relay.update(GestureVector::new(-0.7, -0.7));
        assert!(relay.is_held(MovementKey::W));
        assert!(relay.is_held(MovementKey::A));

        relay.update(GestureVector::new(-0.7, 0.2));
        assert_eq!(relay.held_keys(), vec![MovementKey::A]);

        relay.update(GestureVector::new(0.5, 0.0));
        assert!(relay.held_keys().is_empty());
    }

    #[test]
    fn release_all_clears_held_keys() {
        let (mut relay, transport) = relay();
        relay.update(GestureVector::new(0.9, -0.9));
        transport.clear();

        relay.release_all();

        assert!(relay.held_keys().is_empty());
        let released: Vec<_> = transport.calls();
        assert_eq!(released.len(), 2);
        assert!(released.contains(&TransportCall::Key(MovementKey::W, KeyAction::Up)));
        assert!(released.contains(&TransportCall::Key(MovementKey::D, KeyAction::Up)));
    }

    #[test]
    fn drop_releases_keys() {
        let (mut relay, transport) = relay();
        relay.update(GestureVector::new(0.0, -1.0));
        drop(relay);
        assert_eq!(
            transport.calls().last(),
            Some(&TransportCall::Key(MovementKey::W, KeyAction::Up))
        );
    }
}
