//! Controller error types.

use std::fmt;

use harmony_auth::CredentialError;
use harmony_hub_connection::{PairingError, SessionError};

/// Errors surfaced by [`HarmonyController`](crate::HarmonyController).
///
/// None of them is fatal: the controller stays usable after any failure.
#[derive(Debug, thiserror::Error)]
pub enum HarmonyError {
    #[error("credential exchange failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("token swap failed: {0}")]
    Pairing(#[from] PairingError),

    #[error("hub request failed: {0}")]
    Function(SessionError),

    #[error("could not open a hub session: {0}")]
    Connection(SessionError),

    #[error("hub did not answer in time")]
    Timeout,

    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

impl HarmonyError {
    /// Classifies a failure of a request made on an open session.
    pub(crate) fn from_request(e: SessionError) -> Self {
        match e {
            SessionError::Timeout => Self::Timeout,
            other => Self::Function(other),
        }
    }
}

/// Which index a directory lookup used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Label,
    Name,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Label => "label",
            Self::Name => "name",
        })
    }
}

/// A directory lookup miss. Callers log it and carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device {device_id} has no function with {lookup} {key:?}")]
pub struct NotFound {
    pub device_id: String,
    pub lookup: Lookup,
    pub key: String,
}

impl NotFound {
    pub(crate) fn new(device_id: &str, lookup: Lookup, key: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            lookup,
            key: key.to_string(),
        }
    }
}
