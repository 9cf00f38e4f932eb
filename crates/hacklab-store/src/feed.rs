//! Storage-change notifications between views.
//!
//! A browser only delivers a storage event to the *other* tabs of an
//! origin. Each [`Persistence`](crate::Persistence) handle gets its own
//! [`ViewId`] and publishes every successful write here; subscribers skip
//! their own writes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Identity of one open view over the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// A key changed in the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    /// View that performed the write.
    pub source: ViewId,
}

/// Broadcast channel for storage changes, shared by every view on a store.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<StorageChange>,
    next_view: Arc<AtomicU64>,
}

impl ChangeFeed {
    /// Create a feed with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_view: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate a fresh view id.
    pub fn register_view(&self) -> ViewId {
        ViewId(self.next_view.fetch_add(1, Ordering::SeqCst))
    }

    /// Publish a change to every subscriber.
    pub fn publish(&self, change: StorageChange) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(change);
    }

    /// Subscribe to every change, including the subscriber's own.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}
