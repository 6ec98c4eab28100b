//! JSON-RPC server over TCP.
//!
//! Accepts connections, reads one JSON-RPC request per line, and dispatches
//! method calls to the command handlers. Each response is written as a
//! single line.

use std::net::SocketAddr;
use std::sync::Arc;

use arcano_ledger::LedgerError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

use crate::auth::AuthError;
use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Missing or malformed bearer token (-32001).
    pub fn unauthenticated(detail: &str) -> Self {
        Self {
            code: -32001,
            message: "UNAUTHENTICATED".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Token rejected or caller not permitted (-32003).
    pub fn forbidden(detail: &str) -> Self {
        Self {
            code: -32003,
            message: "FORBIDDEN".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }
}

impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingBearer => Self::unauthenticated(&err.to_string()),
            AuthError::Rejected(_) => Self::forbidden(&err.to_string()),
        }
    }
}

impl From<LedgerError> for RpcError {
    fn from(err: LedgerError) -> Self {
        let (kind, recorded) = match err {
            LedgerError::Read(_) => ("ledger_read", serde_json::Value::Null),
            // The hash was seen but may not be on disk; the client may retry.
            LedgerError::Write(_) => ("ledger_write", serde_json::Value::Bool(false)),
        };
        let mut data = serde_json::json!({"detail": err.to_string(), "kind": kind});
        if !recorded.is_null() {
            data["recorded"] = recorded;
        }
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(data),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    listener: TcpListener,
}

impl RpcServer {
    /// Bind the listening socket.
    pub async fn bind(state: Arc<DaemonState>, addr: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { state, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server, accepting connections.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(state: Arc<DaemonState>, stream: TcpStream) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    let method = request.method.as_str();
    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        "chat" => commands::chat::chat(&state, &request.params).await,
        "admin_status" => commands::admin::admin_status(&state, &request.params).await,
        "ping" => commands::admin::ping(&state).await,
        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::test_state;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::unauthenticated("x");
        assert_eq!(err.code, -32001);
        assert_eq!(err.message, "UNAUTHENTICATED");

        let err = RpcError::forbidden("x");
        assert_eq!(err.code, -32003);

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: RpcError = AuthError::MissingBearer.into();
        assert_eq!(err.code, -32001);

        let err: RpcError = AuthError::Rejected("bad token".into()).into();
        assert_eq!(err.code, -32003);
        assert_eq!(err.data, Some(serde_json::json!({"detail": "bad token"})));
    }

    #[test]
    fn test_ledger_error_mapping() {
        let err: RpcError = LedgerError::Write("disk full".into()).into();
        assert_eq!(err.code, -32603);
        let data = err.data.expect("data");
        assert_eq!(data["kind"], "ledger_write");
        assert_eq!(data["recorded"], false);

        let err: RpcError = LedgerError::Read("corrupt".into()).into();
        let data = err.data.expect("data");
        assert_eq!(data["kind"], "ledger_read");
        assert!(data.get("recorded").is_none());
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"pong": true}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let (_store, state) = test_state();
        let request = RpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::json!(7),
            method: "nope".into(),
            params: serde_json::Value::Null,
        };
        let resp = dispatch_request(state, request).await;
        assert_eq!(resp.id, serde_json::json!(7));
        assert_eq!(resp.error.expect("error").code, -32601);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_wrong_version() {
        let (_store, state) = test_state();
        let request = RpcRequest {
            jsonrpc: "1.0".into(),
            id: serde_json::json!(1),
            method: "ping".into(),
            params: serde_json::Value::Null,
        };
        let resp = dispatch_request(state, request).await;
        assert_eq!(resp.error.expect("error").code, -32600);
    }

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let (_store, state) = test_state();
        let server = RpcServer::bind(state, "127.0.0.1:0").await.expect("bind");
        let addr = server.local_addr().expect("addr");
        tokio::spawn(server.run());

        let stream = TcpStream::connect(addr).await.expect("connect");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let requests = concat!(
            "not json\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"chat","params":{"authorization":"Bearer tok-alice","message":"hi","idea_hash":"h1","timestamp":1000.0}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"chat","params":{"authorization":"Bearer tok-bob","message":"hi","idea_hash":"h1","timestamp":2000.0}}"#,
            "\n",
        );
        writer.write_all(requests.as_bytes()).await.expect("write");

        let mut responses = Vec::new();
        for _ in 0..3 {
            let mut line = String::new();
            reader.read_line(&mut line).await.expect("read");
            let resp: RpcResponse = serde_json::from_str(&line).expect("response json");
            responses.push(resp);
        }

        assert_eq!(responses[0].error.as_ref().expect("parse error").code, -32700);

        let first = responses[1].result.as_ref().expect("first result");
        assert!(first.get("collision_notice").is_none());

        let second = responses[2].result.as_ref().expect("second result");
        assert_eq!(
            second["collision_notice"],
            "Idea collision: previously submitted by alice at 1000.0"
        );
    }
}
