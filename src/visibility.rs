//! Host visibility signal.
//!
//! The monitor must learn when the host is backgrounded so that elapsed
//! wall time is not misread as a slow frame. Rather than binding to a
//! global document listener, the signal is injected at construction; each
//! monitor owns its subscription and releases it on `destroy()`/drop.

use std::cell::RefCell;
use std::rc::Rc;

/// Opaque subscription token returned by [`VisibilitySignal::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibilityToken(u64);

impl VisibilityToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Source of "is the host currently hidden" transitions.
///
/// Implementations invoke every subscribed callback with the new hidden
/// state, synchronously, whenever visibility changes.
pub trait VisibilitySignal {
    /// Register a callback; returns a token for later removal.
    fn subscribe(&self, callback: Rc<dyn Fn(bool)>) -> VisibilityToken;

    /// Remove a previously registered callback. Unknown tokens are ignored.
    fn unsubscribe(&self, token: VisibilityToken);
}

/// A signal that never fires. Suitable for hosts without a visibility
/// concept (headless rendering, benchmarks).
#[derive(Debug, Default)]
pub struct NullVisibility;

impl VisibilitySignal for NullVisibility {
    fn subscribe(&self, _callback: Rc<dyn Fn(bool)>) -> VisibilityToken {
        VisibilityToken::new(0)
    }

    fn unsubscribe(&self, _token: VisibilityToken) {}
}

/// Host-driven visibility signal.
///
/// The host wires its platform's visibility event (a window-focus or
/// page-visibility callback) to [`ManualVisibility::set_hidden`]; all
/// subscribed monitors are notified synchronously. Clone handles share the
/// same subscriber list.
#[derive(Clone, Default)]
pub struct ManualVisibility {
    inner: Rc<RefCell<ManualVisibilityInner>>,
}

#[derive(Default)]
struct ManualVisibilityInner {
    subscribers: Vec<(VisibilityToken, Rc<dyn Fn(bool)>)>,
    next_id: u64,
    hidden: bool,
}

impl ManualVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hidden state.
    pub fn is_hidden(&self) -> bool {
        self.inner.borrow().hidden
    }

    /// Report a visibility transition, notifying all subscribers.
    pub fn set_hidden(&self, hidden: bool) {
        // Snapshot the callbacks so subscribers may unsubscribe reentrantly
        // without hitting a live borrow.
        let callbacks: Vec<Rc<dyn Fn(bool)>> = {
            let mut inner = self.inner.borrow_mut();
            inner.hidden = hidden;
            inner.subscribers.iter().map(|(_, cb)| Rc::clone(cb)).collect()
        };

        for callback in callbacks {
            callback(hidden);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl VisibilitySignal for ManualVisibility {
    fn subscribe(&self, callback: Rc<dyn Fn(bool)>) -> VisibilityToken {
        let mut inner = self.inner.borrow_mut();
        let token = VisibilityToken::new(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((token, callback));
        token
    }

    fn unsubscribe(&self, token: VisibilityToken) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|(t, _)| *t != token);
    }
}

impl std::fmt::Debug for ManualVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ManualVisibility")
            .field("subscribers", &inner.subscribers.len())
            .field("hidden", &inner.hidden)
            .finish()
    }
}
