//! Hub session client for Logitech Harmony hubs.
//!
//! Speaks the hub's XMPP dialect over plain TCP: negotiates an
//! authenticated stream, correlates action requests with their replies,
//! and swaps cloud login tokens for hub session tokens.

pub mod error;
pub mod pairing;
mod pumps;
pub mod session;
mod stream;
#[cfg(test)]
mod test_support;
pub mod types;
pub mod wire;

pub use error::{PairingError, SessionError};
pub use pairing::swap_token;
pub use session::HubSession;
pub use types::{SessionTimeouts, XmppIdentity};
