//! Wire protocol for the Logitech Harmony hub.
//!
//! The hub speaks a small XMPP dialect: every request is an `iq` stanza
//! carrying one `oa` action element whose `mime` attribute names the
//! engine command and whose text is a `key=value:key=value` body.
//! This crate holds the stanza model, the payload templates, and the
//! JSON configuration model returned by the hub. It does no I/O.

pub mod action;
pub mod config;
pub mod constants;
pub mod element;
pub mod error;
pub mod stanza;
pub mod types;

// Re-export primary types for convenience.
pub use config::{Activity, ActionDescriptor, ControlGroup, Device, Function, HubConfiguration};
pub use element::Element;
pub use error::{ProtocolError, ReplyError};
pub use stanza::ActionReply;
pub use types::{LoginToken, SessionToken};
