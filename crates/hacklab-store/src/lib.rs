//! # hacklab-store
//!
//! Persistence layer for the Hacklab puzzle engine.
//!
//! ## Layers
//!
//! - [`KvStore`]: raw get/set/remove against a durable key-value store.
//!   [`SqliteStore`] is the durable implementation (one `kv` table, WAL
//!   mode, schema version in `PRAGMA user_version`); [`MemoryStore`] backs
//!   tests and can simulate unavailable storage.
//! - [`ChangeFeed`]: storage-change notifications shared by every view
//!   (tab) opened on the same store.
//! - [`Persistence`]: the port every engine component talks to. It owns
//!   JSON (de)serialization and degrades gracefully: reads fail open to
//!   defaults and writes are best-effort.

pub mod feed;
pub mod memory;
pub mod migrations;
pub mod port;
pub mod queries;
pub mod schema;
pub mod sqlite;

use rusqlite::Connection;
use std::path::Path;

pub use feed::{ChangeFeed, StorageChange, ViewId};
pub use memory::MemoryStore;
pub use port::{ExternalChanges, Persistence};
pub use sqlite::SqliteStore;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Raw key-value storage.
///
/// Implementations are shared between views, so every method takes `&self`.
pub trait KvStore: Send + Sync {
    /// Value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Open or create the lab database at the given path.
///
/// Configures WAL mode and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Current Unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
