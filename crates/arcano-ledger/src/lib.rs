//! # arcano-ledger
//!
//! Idea-collision registry for the Arcano daemon.
//!
//! The ledger maps an idea hash to the first user who submitted it and the
//! time of that submission. Entries are written once and never updated.
//!
//! ## Storage
//!
//! The registry is storage-agnostic; it talks to a [`LedgerStore`]:
//! - [`JsonFileStore`]: pretty-printed JSON object at `$ARCANO_DATA_DIR/idea_hashes.json`
//! - [`SqliteStore`]: single table in `$ARCANO_DATA_DIR/arcano.db`
//! - [`MemoryStore`]: in-process, for tests
//!
//! Every operation loads the full ledger and, on insert, rewrites it in full.

pub mod entry;
pub mod migrations;
pub mod registry;
pub mod schema;
pub mod store;

pub use entry::{Entry, Ledger, Timestamp};
pub use registry::{CollisionNotice, CollisionRegistry};
pub use store::json::JsonFileStore;
pub use store::memory::MemoryStore;
pub use store::sqlite::SqliteStore;
pub use store::LedgerStore;

/// Current SQLite schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// File name of the JSON ledger inside the data directory.
pub const JSON_LEDGER_FILE: &str = "idea_hashes.json";

/// File name of the SQLite ledger inside the data directory.
pub const SQLITE_LEDGER_FILE: &str = "arcano.db";

/// Ledger error types.
///
/// A read failure is fatal for the operation: the registry never falls back
/// to an empty ledger, so existing collision history cannot be masked. A
/// write failure means the hash was observed but is not durably recorded.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger read failed: {0}")]
    Read(String),

    #[error("ledger write failed: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
