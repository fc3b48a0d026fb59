//! Public types for hub sessions.

use std::fmt;
use std::time::Duration;

use harmony_protocol::constants::{
    CONNECT_TIMEOUT, GUEST_USER, PAIRING_RESOURCE, REQUEST_TIMEOUT, SESSION_RESOURCE,
};
use harmony_protocol::{LoginToken, SessionToken};

/// Bounded waits applied to a hub session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Covers TCP connect plus the whole stream negotiation.
    pub connect: Duration,
    /// Covers one request/reply round-trip.
    pub request: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            connect: CONNECT_TIMEOUT,
            request: REQUEST_TIMEOUT,
        }
    }
}

/// Who the session authenticates as.
#[derive(Clone, PartialEq, Eq)]
pub struct XmppIdentity {
    pub user: String,
    pub password: String,
    pub resource: String,
}

impl XmppIdentity {
    /// Fixed guest identity used for pairing; the login token is the password.
    pub fn pairing(login: &LoginToken) -> Self {
        Self {
            user: GUEST_USER.into(),
            password: login.expose().into(),
            resource: PAIRING_RESOURCE.into(),
        }
    }

    /// Identity for an operating session: the token is both user and password.
    pub fn session(token: &SessionToken) -> Self {
        Self {
            user: token.expose().into(),
            password: token.expose().into(),
            resource: SESSION_RESOURCE.into(),
        }
    }
}

impl fmt::Debug for XmppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let user: String = self.user.chars().take(4).collect();
        f.debug_struct("XmppIdentity")
            .field("user", &format_args!("{user}…"))
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
