//! SQL schema definitions.

/// Complete schema for the v1 lab database.
///
/// One flat key-value table mirrors the per-origin browser store the
/// puzzle layer was designed against.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
