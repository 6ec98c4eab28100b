//! Check-and-register over a [`LedgerStore`].

use std::fmt;
use std::sync::Mutex;

use crate::store::LedgerStore;
use crate::{Entry, Ledger, LedgerError, Result, Timestamp};

/// Returned when an idea hash has been submitted before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionNotice {
    pub idea_hash: String,
    /// The first submission, as stored.
    pub original: Entry,
}

impl fmt::Display for CollisionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Idea collision: previously submitted by {} at {}",
            self.original.submitter_id, self.original.submitted_at
        )
    }
}

/// Registry of first submissions, keyed by idea hash.
///
/// Each call reloads the ledger from the store; nothing is cached between
/// calls. The whole load-check-insert-save sequence runs under one lock, so
/// two callers racing on the same new hash cannot both record it.
pub struct CollisionRegistry {
    store: Box<dyn LedgerStore>,
    lock: Mutex<()>,
}

impl CollisionRegistry {
    pub fn new(store: impl LedgerStore + 'static) -> Self {
        Self::from_boxed(Box::new(store))
    }

    pub fn from_boxed(store: Box<dyn LedgerStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Record `idea_hash` as submitted by `submitter_id` at `submitted_at`,
    /// unless it was already recorded.
    ///
    /// Returns `Ok(None)` when the hash is new and has been persisted, or a
    /// notice naming the original submitter and time when it was seen
    /// before. A repeat submission never modifies or rewrites the ledger,
    /// even when it comes from the original submitter.
    pub fn check_and_register(
        &self,
        submitter_id: &str,
        idea_hash: &str,
        submitted_at: Timestamp,
    ) -> Result<Option<CollisionNotice>> {
        debug_assert!(!idea_hash.is_empty(), "idea hash must be non-empty");
        debug_assert!(!submitter_id.is_empty(), "submitter id must be non-empty");

        let _guard = self.lock.lock().map_err(|_| {
            LedgerError::Read("registry lock poisoned by an earlier panic".into())
        })?;

        let mut ledger = self.store.load()?;

        if let Some(existing) = ledger.get(idea_hash) {
            tracing::warn!(
                idea_hash,
                submitter = submitter_id,
                original = %existing.submitter_id,
                "idea collision"
            );
            return Ok(Some(CollisionNotice {
                idea_hash: idea_hash.to_string(),
                original: existing.clone(),
            }));
        }

        ledger.insert(idea_hash.to_string(), Entry::new(submitter_id, submitted_at));
        if let Err(e) = self.store.save(&ledger) {
            tracing::error!(idea_hash, "idea observed but not recorded: {e}");
            return Err(e);
        }

        tracing::info!(idea_hash, submitter = submitter_id, "idea registered");
        Ok(None)
    }

    /// The stored entry for `idea_hash`, if any.
    pub fn lookup(&self, idea_hash: &str) -> Result<Option<Entry>> {
        Ok(self.store.load()?.remove(idea_hash))
    }

    /// Number of registered ideas.
    pub fn len(&self) -> Result<usize> {
        Ok(self.store.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Full copy of the current ledger.
    pub fn ledger(&self) -> Result<Ledger> {
        self.store.load()
    }
}
