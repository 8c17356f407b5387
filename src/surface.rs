// DOM-side capability: where the remote video lives and how synthetic events reach it.

use std::rc::Rc;

use crate::types::{SyntheticKeyEvent, SyntheticMouseEvent, TargetRect};

/// The element hosting the remote video, plus the document for keyboard events.
pub trait InputSurface {
    /// Bounding box of the resolved look target, or `None` when nothing resolves.
    fn target_rect(&self) -> Option<TargetRect>;

    /// Dispatch a bubbling mouse event on the look target.
    fn dispatch_mouse(&self, event: &SyntheticMouseEvent);

    /// Dispatch a bubbling keyboard event on the document.
    fn dispatch_key(&self, event: &SyntheticKeyEvent);
}

impl<S: InputSurface + ?Sized> InputSurface for Rc<S> {
    fn target_rect(&self) -> Option<TargetRect> {
        (**self).target_rect()
    }

    fn dispatch_mouse(&self, event: &SyntheticMouseEvent) {
        (**self).dispatch_mouse(event)
    }

    fn dispatch_key(&self, event: &SyntheticKeyEvent) {
        (**self).dispatch_key(event)
    }
}
