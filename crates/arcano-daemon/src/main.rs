//! arcano-daemon: chat backend with idea-collision tracking.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! daemon with newline-delimited JSON-RPC 2.0 over TCP.

mod auth;
mod commands;
mod config;
mod llm;
mod rpc;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use arcano_ledger::{CollisionRegistry, JsonFileStore, SqliteStore};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::auth::{StaticTokenVerifier, TokenVerifier};
use crate::config::{DaemonConfig, StorageBackend};
use crate::llm::{EchoResponder, Responder};
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Idea-collision registry. Synchronous; call it off the executor.
    pub registry: Arc<CollisionRegistry>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Bearer token verification.
    pub verifier: Box<dyn TokenVerifier>,
    /// Chat reply generation.
    pub responder: Box<dyn Responder>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
    /// Distinct users authenticated since start.
    pub active_users: Mutex<HashSet<String>>,
}

impl DaemonState {
    pub fn new(
        config: DaemonConfig,
        registry: CollisionRegistry,
        verifier: Box<dyn TokenVerifier>,
        responder: Box<dyn Responder>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
            verifier,
            responder,
            started_at: Instant::now(),
            active_users: Mutex::new(HashSet::new()),
        }
    }
}

/// Open the ledger backend named in the config.
fn open_registry(config: &DaemonConfig) -> anyhow::Result<CollisionRegistry> {
    let data_dir = config.data_dir();
    let registry = match config.storage.backend {
        StorageBackend::Json => CollisionRegistry::new(JsonFileStore::in_dir(&data_dir)),
        StorageBackend::Sqlite => CollisionRegistry::new(SqliteStore::in_dir(&data_dir)?),
    };
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    let level = &config.advanced.log_level;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("arcano_daemon={level}").parse()?)
                .add_directive(format!("arcano_ledger={level}").parse()?),
        )
        .init();

    info!(app = %config.app.name, env = %config.app.env, "Arcano daemon starting");

    // Ensure data directory exists
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open ledger
    let registry = open_registry(&config)?;
    info!(
        backend = ?config.storage.backend,
        entries = registry.len()?,
        "Idea ledger ready in {:?}",
        data_dir
    );

    // 3. Build daemon state
    let verifier = StaticTokenVerifier::new(config.auth.tokens.clone());
    let state = Arc::new(DaemonState::new(
        config,
        registry,
        Box::new(verifier),
        Box::new(EchoResponder),
    ));

    // 4. Start RPC server
    let addr = state.config.listen_addr();
    let rpc_server = RpcServer::bind(state.clone(), &addr).await?;
    info!("JSON-RPC server listening on {}", rpc_server.local_addr()?);

    // 5. Run until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_registry_backends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = DaemonConfig::default();
        config.storage.data_dir = dir.path().to_string_lossy().into_owned();

        let json = open_registry(&config).expect("json registry");
        assert!(json.is_empty().expect("empty"));

        config.storage.backend = StorageBackend::Sqlite;
        let sqlite = open_registry(&config).expect("sqlite registry");
        assert!(sqlite.is_empty().expect("empty"));
        assert!(dir.path().join(arcano_ledger::SQLITE_LEDGER_FILE).exists());
    }
}
