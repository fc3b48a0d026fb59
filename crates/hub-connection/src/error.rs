//! Hub connection error types.

use harmony_protocol::{ProtocolError, ReplyError};

/// Errors from a hub session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("hub refused authentication: {0}")]
    Auth(String),

    #[error("stream negotiation failed: {0}")]
    Negotiation(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Function(#[from] ReplyError),
}

impl From<quick_xml::Error> for SessionError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Protocol(e.into())
    }
}

/// Errors from swapping a login token for a session token.
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("pairing session failed: {0}")]
    Session(#[from] SessionError),

    #[error("pairing reply rejected: {0}")]
    Reply(ReplyError),

    #[error("pairing reply has no identity: {0}")]
    MissingIdentity(String),
}
