//! Bearer token verification.
//!
//! The daemon only needs an opaque user id per request. How a token is
//! checked is behind [`TokenVerifier`]; the built-in verifier is a static
//! token table from the config file.

use std::collections::HashMap;

/// A caller whose token was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingBearer,

    #[error("{0}")]
    Rejected(String),
}

/// Turns a bearer token into a user id.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError>;
}

/// Verifier backed by a fixed token -> uid table.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        self.tokens
            .get(token)
            .map(|uid| VerifiedUser { uid: uid.clone() })
            .ok_or_else(|| AuthError::Rejected("invalid or expired token".into()))
    }
}

/// Check an `Authorization` value of the form `Bearer <token>`.
pub fn authenticate(
    verifier: &dyn TokenVerifier,
    authorization: Option<&str>,
) -> Result<VerifiedUser, AuthError> {
    let token = authorization
        .filter(|h| h.starts_with("Bearer "))
        .and_then(|h| h.split_whitespace().nth(1))
        .ok_or(AuthError::MissingBearer)?;
    verifier.verify(token)
}
