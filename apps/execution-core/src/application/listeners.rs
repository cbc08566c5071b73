//! Listener registry owned by each service.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Shared callback.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Callbacks registered on one service.
///
/// Listeners run on the emitting thread after the service has released its
/// own locks.
pub struct Listeners<E> {
    inner: RwLock<Vec<Listener<E>>>,
}

impl<E> Listeners<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener.
    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) {
        self.inner.write().push(Arc::new(listener));
    }

    /// Deliver `event` to every listener.
    pub fn emit(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self.inner.read().clone();
        for listener in listeners {
            listener(event);
        }
    }

    /// Deliver each event in order.
    pub fn emit_all<'a>(&self, events: impl IntoIterator<Item = &'a E>)
    where
        E: 'a,
    {
        for event in events {
            self.emit(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
