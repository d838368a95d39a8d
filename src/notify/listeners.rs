//! Change listeners and ordered fan-out.

use crate::error::{BoxError, ReloadError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A callback invoked with the new data whenever the content changes.
///
/// Returning an error aborts the fan-out and prevents the new data from
/// being committed. Listeners run while the refresh is in progress, so they
/// should be fast and must be safe to run again on the next refresh.
///
/// Any `Fn(&Bytes) -> Result<(), BoxError>` closure is a listener.
pub trait ReloadListener: Send + Sync {
    /// Handle a content change.
    fn on_reload(&self, data: &Bytes) -> std::result::Result<(), BoxError>;
}

impl<F> ReloadListener for F
where
    F: Fn(&Bytes) -> std::result::Result<(), BoxError> + Send + Sync,
{
    fn on_reload(&self, data: &Bytes) -> std::result::Result<(), BoxError> {
        self(data)
    }
}

/// Opaque handle identifying a registered listener.
///
/// Handles are never reused, and removing one listener never changes the
/// handles of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The numeric value of this handle.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ListenerRegistryInner {
    listeners: BTreeMap<ListenerId, Arc<dyn ReloadListener>>,
    next_id: u64,
}

/// Ordered registry of change listeners.
///
/// Listeners are invoked in registration order. Cloning the registry yields
/// another handle to the same set of listeners.
///
/// # Examples
///
/// ```rust
/// use hotswap_reload::notify::ListenerRegistry;
/// use bytes::Bytes;
///
/// let registry = ListenerRegistry::new();
/// let id = registry.add(|data: &Bytes| {
///     println!("new data: {} bytes", data.len());
///     Ok(())
/// });
///
/// registry.notify(&Bytes::from_static(b"{}")).unwrap();
/// registry.remove(id);
/// assert!(registry.is_empty());
/// ```
pub struct ListenerRegistry {
    inner: Arc<Mutex<ListenerRegistryInner>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListenerRegistryInner {
                listeners: BTreeMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a closure listener and return its handle.
    pub fn add<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Bytes) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(callback))
    }

    /// Register a listener object and return its handle.
    pub fn add_listener(&self, listener: Arc<dyn ReloadListener>) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.insert(id, listener);
        id
    }

    /// Remove a listener. Unknown handles are ignored.
    pub fn remove(&self, id: ListenerId) {
        self.inner.lock().listeners.remove(&id);
    }

    /// Remove every listener. Handles already issued stay retired.
    pub fn clear(&self) {
        self.inner.lock().listeners.clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener in registration order with `data`.
    ///
    /// Stops at the first listener that fails and returns its error; later
    /// listeners are not invoked.
    ///
    /// The lock is not held while a listener runs, so listeners may add or
    /// remove listeners. Listeners added during the fan-out first run on the
    /// next one. A listener removed during the fan-out is not invoked once
    /// `remove` has returned; an invocation already running finishes.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Listener`] carrying the failing handle.
    pub fn notify(&self, data: &Bytes) -> Result<()> {
        let ids: Vec<ListenerId> = self.inner.lock().listeners.keys().copied().collect();

        for id in ids {
            let Some(listener) = self.inner.lock().listeners.get(&id).cloned() else {
                continue;
            };
            listener
                .on_reload(data)
                .map_err(|source| ReloadError::Listener { id, source })?;
        }
        Ok(())
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ListenerRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
