//! Chat reply generation.

/// Produces the reply text for a chat message.
pub trait Responder: Send + Sync {
    fn respond(&self, prompt: &str, uid: &str) -> String;
}

/// Placeholder responder that echoes the prompt back.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoResponder;

impl Responder for EchoResponder {
    fn respond(&self, prompt: &str, uid: &str) -> String {
        format!("[User {uid}] LLM says: You said '{prompt}'")
    }
}
