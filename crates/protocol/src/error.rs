//! Protocol-level error types.

/// Errors decoding data received from the hub.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed stanza: {0}")]
    Malformed(String),
}

/// A reply stanza that broke the one-element/success-code contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    #[error("expected exactly one action element in reply, got {0}")]
    ElementCount(usize),

    #[error("hub returned status {code}: {message}")]
    Status { code: String, message: String },

    #[error("hub rejected the request: {0}")]
    Rejected(String),
}
