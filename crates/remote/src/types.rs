//! Public types for the Harmony controller.

use crate::entity::{EntityId, EntityKind, PowerState};

/// Events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarmonyEvent {
    /// An entity was registered by `initialize`.
    Registered { entity: EntityId, kind: EntityKind },
    /// Observed power state of an entity changed.
    PowerChanged { entity: EntityId, power: PowerState },
    /// A remote switched to another source.
    SourceChanged { entity: EntityId, source: String },
    /// A fresh session token replaced the previous one.
    TokenRefreshed,
    /// A refresh failed; the previous token stays in place.
    TokenRefreshFailed { reason: String },
}

/// What happened to one intent on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The hub acknowledged the request.
    Sent,
    /// The entity has no function for the intent; nothing was sent.
    Unsupported,
}
