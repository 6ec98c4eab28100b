//! RPC command handlers.
//!
//! Each submodule implements the commands for one category.

pub mod admin;
pub mod chat;

use std::sync::Arc;

use serde_json::Value;

use crate::auth::{self, VerifiedUser};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Authenticate the `authorization` param and remember the caller as active.
pub(crate) async fn authorize(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<VerifiedUser, RpcError> {
    let authorization = params.get("authorization").and_then(|v| v.as_str());
    let user = auth::authenticate(state.verifier.as_ref(), authorization)?;
    state.active_users.lock().await.insert(user.uid.clone());
    Ok(user)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use arcano_ledger::{CollisionRegistry, MemoryStore};

    use crate::auth::StaticTokenVerifier;
    use crate::config::DaemonConfig;
    use crate::llm::EchoResponder;
    use crate::DaemonState;

    /// Daemon state over an in-memory ledger with tokens for alice and bob.
    pub fn test_state() -> (Arc<MemoryStore>, Arc<DaemonState>) {
        test_state_with(DaemonConfig::default())
    }

    pub fn test_state_with(config: DaemonConfig) -> (Arc<MemoryStore>, Arc<DaemonState>) {
        let store = Arc::new(MemoryStore::new());
        let verifier = StaticTokenVerifier::new(HashMap::from([
            ("tok-alice".to_string(), "alice".to_string()),
            ("tok-bob".to_string(), "bob".to_string()),
        ]));
        let state = DaemonState::new(
            config,
            CollisionRegistry::new(store.clone()),
            Box::new(verifier),
            Box::new(EchoResponder),
        );
        (store, Arc::new(state))
    }
}
