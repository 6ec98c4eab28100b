//! JSON file backend.
//!
//! The ledger is one JSON object, idea hash to `{"user_id", "timestamp"}`,
//! pretty-printed with two-space indentation.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::store::LedgerStore;
use crate::{Ledger, LedgerError, Result, JSON_LEDGER_FILE};

/// Ledger kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/idea_hashes.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(JSON_LEDGER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| JSON_LEDGER_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Ledger> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ledger::new()),
            Err(e) => {
                return Err(LedgerError::Read(format!("{}: {e}", self.path.display())));
            }
        };

        serde_json::from_str(&content)
            .map_err(|e| LedgerError::Read(format!("{}: corrupt ledger: {e}", self.path.display())))
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)
            .map_err(|e| LedgerError::Write(format!("encode: {e}")))?;

        // Write beside the target and rename over it so readers never see a
        // half-written ledger.
        let tmp = self.tmp_path();
        let write_err = |e: std::io::Error| LedgerError::Write(format!("{}: {e}", tmp.display()));

        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .map_err(|e| LedgerError::Write(format!("{}: {e}", self.path.display())))?;

        tracing::debug!(entries = ledger.len(), path = %self.path.display(), "ledger saved");
        Ok(())
    }
}
