//! Explicit observer registration.

use std::fmt;

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Ordered list of callbacks interested in events of type `E`.
///
/// Callbacks run synchronously, in registration order, on the thread that
/// publishes the event. A callback must not register or unregister observers
/// on the registry that is calling it.
pub struct Observers<E> {
    next_id: u64,
    entries: Vec<(ObserverId, Callback<E>)>,
}

impl<E> Observers<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Registers `callback` and returns its handle.
    pub fn subscribe(&mut self, callback: impl Fn(&E) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Removes a callback. Returns `false` when `id` was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Delivers `event` to every callback.
    pub fn notify(&self, event: &E) {
        for (_, callback) in &self.entries {
            callback(event);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("registered", &self.entries.len())
            .finish()
    }
}
