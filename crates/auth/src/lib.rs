//! Logitech cloud authentication.
//!
//! Exchanges account credentials for the short-lived login token that the
//! hub accepts as a pairing credential.

pub mod client;

pub use client::{AuthClient, Credential, CredentialError};
