//! Ledger records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The full set of registered ideas, keyed by idea hash.
///
/// Sorted so that the persisted form is stable across rewrites.
pub type Ledger = BTreeMap<String, Entry>;

/// Submission time as sent by the client.
///
/// Clients send either a number (epoch seconds, possibly fractional) or a
/// string. The value is kept verbatim so it round-trips exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(serde_json::Number),
    Text(String),
}

impl Timestamp {
    /// Convert a JSON value into a timestamp.
    ///
    /// Returns `None` for anything that is not a number or a non-empty string.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Self::Number(n.clone())),
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<f64> for Timestamp {
    fn from(secs: f64) -> Self {
        match serde_json::Number::from_f64(secs) {
            Some(n) => Self::Number(n),
            // NaN and infinities have no JSON number form
            None => Self::Text(secs.to_string()),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self::Number(secs.into())
    }
}

impl From<&str> for Timestamp {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole floats keep their trailing ".0" so 1000.0 is not shown as 1000
            Self::Number(n) => match n.as_f64() {
                Some(v) if n.is_f64() && v.fract() == 0.0 && v.abs() < 1e16 => {
                    write!(f, "{v:.1}")
                }
                _ => write!(f, "{n}"),
            },
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// First submission of an idea hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "user_id", alias = "submitter_id")]
    pub submitter_id: String,
    #[serde(rename = "timestamp")]
    pub submitted_at: Timestamp,
}

impl Entry {
    pub fn new(submitter_id: impl Into<String>, submitted_at: impl Into<Timestamp>) -> Self {
        Self {
            submitter_id: submitter_id.into(),
            submitted_at: submitted_at.into(),
        }
    }
}
