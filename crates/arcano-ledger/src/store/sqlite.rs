//! SQLite backend.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::store::LedgerStore;
use crate::{migrations, Entry, Ledger, LedgerError, Result, Timestamp, SQLITE_LEDGER_FILE};

/// Ledger kept in the `idea_hashes` table of a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`, running pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::Read(format!("{}: {e}", path.display())))?;
        Self::from_connection(conn)
    }

    /// Open `<data_dir>/arcano.db`.
    pub fn in_dir(data_dir: &Path) -> Result<Self> {
        Self::open(&data_dir.join(SQLITE_LEDGER_FILE))
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::Read(format!("in-memory: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| LedgerError::Read(format!("configure: {e}")))?;
    Ok(())
}

impl LedgerStore for SqliteStore {
    fn load(&self) -> Result<Ledger> {
        let read_err = |e: rusqlite::Error| LedgerError::Read(e.to_string());
        let conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::Read("connection poisoned".into()))?;

        let mut stmt = conn
            .prepare("SELECT idea_hash, user_id, timestamp FROM idea_hashes")
            .map_err(read_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(read_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(read_err)?;

        let mut ledger = Ledger::new();
        for (idea_hash, user_id, timestamp) in rows {
            let submitted_at: Timestamp = serde_json::from_str(&timestamp).map_err(|e| {
                LedgerError::Read(format!("corrupt timestamp for {idea_hash}: {e}"))
            })?;
            ledger.insert(idea_hash, Entry::new(user_id, submitted_at));
        }
        Ok(ledger)
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let write_err = |e: rusqlite::Error| LedgerError::Write(e.to_string());
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::Write("connection poisoned".into()))?;

        let tx = conn.transaction().map_err(write_err)?;
        tx.execute("DELETE FROM idea_hashes", []).map_err(write_err)?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO idea_hashes (idea_hash, user_id, timestamp) VALUES (?1, ?2, ?3)")
                .map_err(write_err)?;
            for (idea_hash, entry) in ledger {
                let timestamp = serde_json::to_string(&entry.submitted_at)
                    .map_err(|e| LedgerError::Write(format!("encode timestamp: {e}")))?;
                stmt.execute(rusqlite::params![idea_hash, entry.submitter_id, timestamp])
                    .map_err(write_err)?;
            }
        }
        tx.commit().map_err(write_err)?;

        tracing::debug!(entries = ledger.len(), "ledger saved to sqlite");
        Ok(())
    }
}
