//! Harmony controller for remote-control hosts.
//!
//! Turns one Logitech Harmony hub into a set of entities: a remote per
//! device and a switchable entity per activity. Every operation opens a
//! fresh hub session, runs one request and disconnects again; the
//! session token behind it is derived on demand and refreshed on a
//! schedule.

pub mod capability;
pub mod connector;
pub mod controller;
pub mod directory;
pub mod entity;
pub mod error;
pub mod intent;
#[cfg(test)]
mod mock;
pub mod refresh;
pub mod types;

pub use capability::{Capability, CapabilitySet};
pub use connector::{HubConnector, HubLink, LiveConnector};
pub use controller::HarmonyController;
pub use directory::{DeviceDirectory, DirectoryEntry};
pub use entity::{ActivityState, EntityId, EntityKind, PowerState, RemoteState};
pub use error::{HarmonyError, NotFound};
pub use intent::{IntentCommand, IntentParseError, RemoteIntent};
pub use refresh::{RefreshSchedule, spawn_refresh};
pub use types::{CommandOutcome, HarmonyEvent};
