//! Entities exposed to the hosting application and their observed state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilitySet;

/// What kind of hub object an entity stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A physical device driven by IR commands.
    Remote,
    /// A hub activity such as "Watch TV".
    Activity,
}

impl EntityKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Activity => "activity",
        }
    }
}

/// Entity identifier (`remote.living_room_tv`, `activity.watch_tv`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Builds the id of a device entity from its hub label.
    pub fn remote(label: &str) -> Self {
        Self::new(EntityKind::Remote, label)
    }

    /// Builds the id of an activity entity from its hub label.
    pub fn activity(label: &str) -> Self {
        Self::new(EntityKind::Activity, label)
    }

    fn new(kind: EntityKind, label: &str) -> Self {
        Self(format!("{}.{}", kind.prefix(), slug(label)))
    }

    pub fn kind(&self) -> EntityKind {
        if self.0.starts_with("activity.") {
            EntityKind::Activity
        } else {
            EntityKind::Remote
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error parsing an entity id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id {0:?}: expected remote.<name> or activity.<name>")]
pub struct InvalidEntityId(pub String);

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s
            .split_once('.')
            .is_some_and(|(kind, name)| matches!(kind, "remote" | "activity") && !name.is_empty());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidEntityId(s.to_string()))
        }
    }
}

/// Lower-cases a label and turns spaces and dashes into underscores.
pub fn slug(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Observed power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

/// Published state of a device entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteState {
    pub entity: EntityId,
    pub device_id: String,
    pub label: String,
    pub power: PowerState,
    pub capabilities: CapabilitySet,
    pub source: Option<String>,
    pub source_list: Vec<String>,
}

/// Published state of an activity entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityState {
    pub entity: EntityId,
    pub activity_id: String,
    pub label: String,
    pub power: PowerState,
}
