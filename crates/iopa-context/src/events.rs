//! Per-context lifecycle events.

use serde::Serialize;

/// Lifecycle notifications a context broadcasts to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextEvent {
    Request,
    Response,
    Finish,
    Disconnect,
}

impl ContextEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Finish => "finish",
            Self::Disconnect => "disconnect",
        }
    }
}
