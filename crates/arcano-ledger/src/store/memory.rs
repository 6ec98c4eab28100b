//! In-memory backend (for testing).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::store::LedgerStore;
use crate::{Ledger, LedgerError, Result};

/// Ledger held in process memory.
///
/// Counts saves and can be told to fail reads or writes, so callers can
/// observe exactly when the registry persists.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
    saves: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `ledger`.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            ..Self::default()
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the stored ledger, bypassing failure injection.
    pub fn snapshot(&self) -> Ledger {
        match self.ledger.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Ledger> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LedgerError::Read("injected read failure".into()));
        }
        let guard = self
            .ledger
            .lock()
            .map_err(|_| LedgerError::Read("memory store poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Write("injected write failure".into()));
        }
        let mut guard = self
            .ledger
            .lock()
            .map_err(|_| LedgerError::Write("memory store poisoned".into()))?;
        *guard = ledger.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
