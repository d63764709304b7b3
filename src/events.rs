//! Synchronous change-listener registry.
//!
//! Listeners are invoked in registration order and removed by handle.
//! Emission runs to completion before returning to the caller; there is no
//! queueing and no asynchrony.

/// Opaque handle returned by [`ListenerSet::add`], used to remove a
/// listener later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Ordered set of level-change callbacks.
pub(crate) struct ListenerSet {
    listeners: Vec<(ListenerHandle, Box<dyn FnMut(i32)>)>,
    next_id: u64,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a callback; returns the handle for later removal.
    pub(crate) fn add(&mut self, callback: Box<dyn FnMut(i32)>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_id);
        self.next_id += 1;
        self.listeners.push((handle, callback));
        handle
    }

    /// Remove a previously registered callback. Returns `false` if the
    /// handle is unknown (already removed, or from another monitor).
    pub(crate) fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(h, _)| *h != handle);
        self.listeners.len() != before
    }

    /// Invoke every callback with `level`, in registration order.
    pub(crate) fn emit(&mut self, level: i32) {
        for (_, callback) in self.listeners.iter_mut() {
            callback(level);
        }
    }

    /// Drop all callbacks.
    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
