use serde::Serialize;

/// Where a chat reply should be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DeliveryTarget {
    /// Single-use token attached to an inbound event.
    ReplyToken(String),
    /// Push delivery to a known user.
    User(String),
}

/// Outbound messaging hook (chat platform adapters, logging, tests).
pub trait MessageRelay: Send + Sync {
    fn deliver(&self, target: &DeliveryTarget, text: &str) -> Result<(), RelayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay transport unavailable: {0}")]
    Transport(String),
}
