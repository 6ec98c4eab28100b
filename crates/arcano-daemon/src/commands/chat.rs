//! Chat command handler.

use std::sync::Arc;

use arcano_ledger::Timestamp;
use serde_json::Value;

use crate::commands::authorize;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Reply to a chat message, checking the attached idea hash for collisions.
///
/// The registry is consulted only when both `idea_hash` and `timestamp` are
/// present and non-empty; otherwise the submission is not tracked.
pub async fn chat(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = authorize(state, params).await?;

    let message = match params.get("message") {
        None | Some(Value::Null) => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(RpcError::invalid_params("message must be a string")),
    };

    let idea_hash = params
        .get("idea_hash")
        .and_then(|v| v.as_str())
        .filter(|h| !h.is_empty());
    let timestamp = params.get("timestamp").and_then(Timestamp::from_json);

    let collision_notice = match (idea_hash, timestamp) {
        (Some(idea_hash), Some(timestamp)) => {
            let registry = state.registry.clone();
            let uid = user.uid.clone();
            let idea_hash = idea_hash.to_string();
            tokio::task::spawn_blocking(move || {
                registry.check_and_register(&uid, &idea_hash, timestamp)
            })
            .await
            .map_err(|e| RpcError::internal_error(&format!("registry task failed: {e}")))??
        }
        _ => None,
    };

    let reply = state.responder.respond(message, &user.uid);

    let mut response = serde_json::json!({"reply": reply});
    if let Some(notice) = collision_notice {
        response["collision_notice"] = Value::String(notice.to_string());
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use arcano_ledger::{Entry, LedgerStore};

    use super::*;
    use crate::commands::test_support::test_state;

    fn params(token: &str, extra: Value) -> Value {
        let mut p = serde_json::json!({"authorization": format!("Bearer {token}")});
        if let (Some(obj), Value::Object(extra)) = (p.as_object_mut(), extra) {
            obj.extend(extra);
        }
        p
    }

    #[tokio::test]
    async fn test_chat_reply_without_idea() {
        let (store, state) = test_state();
        let result = chat(&state, &params("tok-alice", serde_json::json!({"message": "hello"})))
            .await
            .expect("chat");

        assert_eq!(result, serde_json::json!({"reply": "[User alice] LLM says: You said 'hello'"}));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_scenario() {
        let (store, state) = test_state();

        let first = chat(
            &state,
            &params(
                "tok-alice",
                serde_json::json!({"message": "m", "idea_hash": "h1", "timestamp": 1000.0}),
            ),
        )
        .await
        .expect("first");
        assert!(first.get("collision_notice").is_none());

        let second = chat(
            &state,
            &params(
                "tok-bob",
                serde_json::json!({"message": "m", "idea_hash": "h1", "timestamp": 2000.0}),
            ),
        )
        .await
        .expect("second");
        assert_eq!(
            second["collision_notice"],
            "Idea collision: previously submitted by alice at 1000.0"
        );
        assert_eq!(second["reply"], "[User bob] LLM says: You said 'm'");

        chat(
            &state,
            &params(
                "tok-alice",
                serde_json::json!({"idea_hash": "h2", "timestamp": 3000.0}),
            ),
        )
        .await
        .expect("third");

        let ledger = store.load().expect("load");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("h1"), Some(&Entry::new("alice", 1000.0)));
        assert_eq!(ledger.get("h2"), Some(&Entry::new("alice", 3000.0)));
    }

    #[tokio::test]
    async fn test_missing_hash_or_timestamp_skips_registry() {
        let (store, state) = test_state();

        for extra in [
            serde_json::json!({"idea_hash": "h1"}),
            serde_json::json!({"timestamp": 5}),
            serde_json::json!({"idea_hash": "", "timestamp": 5}),
            serde_json::json!({"idea_hash": "h1", "timestamp": ""}),
            serde_json::json!({"idea_hash": "h1", "timestamp": null}),
        ] {
            let result = chat(&state, &params("tok-alice", extra)).await.expect("chat");
            assert!(result.get("collision_notice").is_none());
        }
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_string_timestamp_kept_verbatim() {
        let (store, state) = test_state();
        chat(
            &state,
            &params(
                "tok-alice",
                serde_json::json!({"idea_hash": "h1", "timestamp": "2024-05-01T12:00:00Z"}),
            ),
        )
        .await
        .expect("chat");

        let again = chat(
            &state,
            &params(
                "tok-alice",
                serde_json::json!({"idea_hash": "h1", "timestamp": "2024-06-01T00:00:00Z"}),
            ),
        )
        .await
        .expect("chat again");
        assert_eq!(
            again["collision_notice"],
            "Idea collision: previously submitted by alice at 2024-05-01T12:00:00Z"
        );
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_chat_requires_auth() {
        let (store, state) = test_state();

        let err = chat(&state, &serde_json::json!({"idea_hash": "h1", "timestamp": 1}))
            .await
            .expect_err("no header");
        assert_eq!(err.code, -32001);

        let err = chat(&state, &params("tok-eve", serde_json::json!({"idea_hash": "h1", "timestamp": 1})))
            .await
            .expect_err("bad token");
        assert_eq!(err.code, -32003);

        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_surfaces() {
        let (store, state) = test_state();
        store.set_fail_writes(true);

        let err = chat(
            &state,
            &params("tok-alice", serde_json::json!({"idea_hash": "h1", "timestamp": 1})),
        )
        .await
        .expect_err("write failure");
        assert_eq!(err.code, -32603);
        assert_eq!(err.data.expect("data")["kind"], "ledger_write");
    }

    #[tokio::test]
    async fn test_non_string_message_rejected() {
        let (_store, state) = test_state();
        let err = chat(&state, &params("tok-alice", serde_json::json!({"message": 5})))
            .await
            .expect_err("invalid");
        assert_eq!(err.code, -32602);
    }
}
