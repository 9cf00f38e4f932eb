//! Key-value query functions.

use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// Get a value by key. `None` when absent.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

/// Insert or replace a value.
pub fn set(conn: &Connection, key: &str, value: &str, now: u64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![key, value, now as i64],
    )?;
    Ok(())
}

/// Remove a key. Removing an absent key is not an error.
pub fn remove(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
    Ok(())
}

/// All keys starting with `prefix`, sorted.
pub fn keys_with_prefix(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
    let keys = stmt
        .query_map([prefix], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(keys)
}
