//! Integration test crate for the Arcano ledger.
//!
//! This crate has no library code; it only contains integration tests that
//! exercise the registry against the real durable backends.
//!
//! ```sh
//! cargo test -p arcano-integration-tests
//! ```
