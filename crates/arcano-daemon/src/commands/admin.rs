//! Admin & diagnostics command handlers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::commands::authorize;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Liveness check. No authentication.
pub async fn ping(_state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!({
        "pong": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Report daemon status to an admin user.
pub async fn admin_status(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = authorize(state, params).await?;
    if !state.config.is_admin(&user.uid) {
        return Err(RpcError::forbidden("admin privileges required"));
    }

    let registry = state.registry.clone();
    let ideas = tokio::task::spawn_blocking(move || registry.len())
        .await
        .map_err(|e| RpcError::internal_error(&format!("registry task failed: {e}")))??;

    let active_users = state.active_users.lock().await.len();

    Ok(serde_json::json!({
        "status": "running",
        "uptime": format_uptime(state.started_at.elapsed()),
        "active_users": active_users,
        "ideas": ideas,
    }))
}

/// `H:MM:SS`, hours unbounded.
fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
