//! SQL schema for the SQLite ledger backend.

/// Schema v1: one row per registered idea hash.
///
/// `timestamp` holds the JSON encoding of the submitted timestamp so numbers
/// and strings round-trip unchanged.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS idea_hashes (
    idea_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
"#;
