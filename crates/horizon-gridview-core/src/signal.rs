//! Change notification.
//!
//! A [`Signal<Args>`] keeps a list of subscribers and calls each of them, in
//! subscription order, whenever a value is emitted. Subscribers run on the
//! emitting thread.
//!
//! ```
//! use horizon_gridview_core::Signal;
//!
//! let columns_ready = Signal::<usize>::new();
//! let id = columns_ready.connect(|count| println!("{count} columns resolved"));
//!
//! columns_ready.emit(3);
//! assert!(columns_ready.disconnect(id));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle to one subscription, used to [`disconnect`](Signal::disconnect) it.
    pub struct ConnectionId;
}

type Subscriber<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of subscribers notified with `&Args` on every [`emit`](Self::emit).
///
/// The list is not locked while subscribers run, so a subscriber may connect
/// or disconnect others (itself included) during an emission.
pub struct Signal<Args> {
    subscribers: Mutex<SlotMap<ConnectionId, Subscriber<Args>>>,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.connection_count())
            .finish()
    }
}

impl<Args> Signal<Args> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Subscribes `callback`.
    pub fn connect<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.subscribers.lock().insert(Arc::new(callback))
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.subscribers.lock().remove(id).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Calls every subscriber with `args`.
    pub fn emit(&self, args: Args) {
        let subscribers: Vec<Subscriber<Args>> =
            self.subscribers.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, subscribers = subscribers.len(), "emit");

        for subscriber in subscribers {
            subscriber(&args);
        }
    }
}
