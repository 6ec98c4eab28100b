//! Durable ledger backends.
//!
//! A store only knows how to read and write the whole ledger. Deciding what
//! to write is the registry's job.

pub mod json;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use crate::{Ledger, Result};

/// Whole-ledger persistence.
pub trait LedgerStore: Send + Sync {
    /// Read the full ledger. A store that has never been written is empty.
    fn load(&self) -> Result<Ledger>;

    /// Replace the persisted ledger with `ledger`.
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn load(&self) -> Result<Ledger> {
        (**self).load()
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        (**self).save(ledger)
    }
}
