//! The persistence port.
//!
//! Every engine component reads and writes through [`Persistence`]. Storage
//! failures and malformed JSON never escape this module: reads fall back to
//! defaults and writes report `false` after logging.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::feed::{ChangeFeed, StorageChange, ViewId};
use crate::memory::MemoryStore;
use crate::{KvStore, Result, StoreError};

/// One view's handle on the shared store.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KvStore>,
    feed: ChangeFeed,
    view: ViewId,
}

impl Persistence {
    /// Open a view on `store`, publishing writes to `feed`.
    pub fn new(store: Arc<dyn KvStore>, feed: ChangeFeed) -> Self {
        let view = feed.register_view();
        Self { store, feed, view }
    }

    /// A view on a fresh in-memory store. Returns the store for inspection.
    pub fn in_memory() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let port = Self::new(store.clone(), ChangeFeed::default());
        (port, store)
    }

    /// Open another view (another tab) on the same store and feed.
    pub fn open_view(&self) -> Self {
        Self::new(self.store.clone(), self.feed.clone())
    }

    /// This handle's view id.
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Raw string value. `None` when absent or when storage is unreadable.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, "storage read failed, using default: {e}");
                None
            }
        }
    }

    /// Best-effort write. Returns whether the value was stored.
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => {
                self.publish(key, Some(value.to_string()));
                true
            }
            Err(e) => {
                warn!(key, "storage write dropped: {e}");
                false
            }
        }
    }

    /// Best-effort delete. Returns whether the key is now absent.
    pub fn remove(&self, key: &str) -> bool {
        match self.store.remove(key) {
            Ok(()) => {
                self.publish(key, None);
                true
            }
            Err(e) => {
                warn!(key, "storage delete dropped: {e}");
                false
            }
        }
    }

    /// Keys starting with `prefix`. Empty when storage is unreadable.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.store.keys_with_prefix(prefix).unwrap_or_else(|e| {
            warn!(prefix, "storage scan failed: {e}");
            Vec::new()
        })
    }

    /// Decode a JSON value, falling back to `T::default()` when the key is
    /// absent, unreadable or malformed.
    pub fn get_json<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.get(key) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(key, "malformed JSON in store, using default: {e}");
                T::default()
            }
        }
    }

    /// Encode and store a JSON value. Returns whether it was stored.
    pub fn set_json<T>(&self, key: &str, value: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        match encode(value) {
            Ok(raw) => self.set(key, &raw),
            Err(e) => {
                warn!(key, "{e}");
                false
            }
        }
    }

    /// Read-modify-write of a JSON blob. Last writer wins across views.
    ///
    /// `f` returns `true` when it changed the value; only then is the
    /// result written back. Returns the (possibly updated) value.
    pub fn update_json<T, F>(&self, key: &str, f: F) -> T
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        let mut value: T = self.get_json(key);
        if f(&mut value) {
            self.set_json(key, &value);
        }
        value
    }

    /// Changes made by other views.
    pub fn subscribe(&self) -> ExternalChanges {
        ExternalChanges {
            rx: self.feed.subscribe(),
            view: self.view,
        }
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        self.feed.publish(StorageChange {
            key: key.to_string(),
            new_value,
            source: self.view,
        });
    }
}

fn encode<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Receiver of storage changes originating from other views.
pub struct ExternalChanges {
    rx: broadcast::Receiver<StorageChange>,
    view: ViewId,
}

impl ExternalChanges {
    /// Wait for the next foreign change. `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.source == self.view => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "storage change feed lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next foreign change already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.source == self.view => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
