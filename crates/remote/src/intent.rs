//! Intents the hosting application sends to entities.

use std::str::FromStr;

use crate::capability::Capability;
use crate::entity::{EntityId, InvalidEntityId};

/// A high-level command addressed to one or more entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteIntent {
    TurnOn,
    TurnOff,
    Toggle,
    Play,
    Pause,
    PlayPause,
    Stop,
    NextTrack,
    PreviousTrack,
    VolumeUp,
    VolumeDown,
    Mute,
    SelectSource(String),
}

impl RemoteIntent {
    /// Name of the device function a symbolic intent presses.
    ///
    /// `Toggle` and `SelectSource` resolve differently and return `None`.
    pub fn function_name(&self) -> Option<&'static str> {
        Some(match self {
            Self::TurnOn => "PowerOn",
            Self::TurnOff => "PowerOff",
            Self::Play => "Play",
            // The hub has no separate play/pause button.
            Self::Pause | Self::PlayPause => "Pause",
            Self::Stop => "Stop",
            Self::NextTrack => "SkipForward",
            Self::PreviousTrack => "SkipBackward",
            Self::VolumeUp => "VolumeUp",
            Self::VolumeDown => "VolumeDown",
            Self::Mute => "Mute",
            Self::Toggle | Self::SelectSource(_) => return None,
        })
    }

    /// Capability flag advertised for this intent, if the host has one.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Self::TurnOn => Some(Capability::TurnOn),
            Self::TurnOff => Some(Capability::TurnOff),
            Self::Pause => Some(Capability::Pause),
            Self::PlayPause => Some(Capability::PlayPause),
            Self::Stop => Some(Capability::Stop),
            Self::NextTrack => Some(Capability::NextTrack),
            Self::PreviousTrack => Some(Capability::PreviousTrack),
            Self::VolumeUp | Self::VolumeDown => Some(Capability::VolumeStep),
            Self::Mute => Some(Capability::VolumeMute),
            Self::SelectSource(_) => Some(Capability::SelectSource),
            Self::Toggle | Self::Play => None,
        }
    }
}

/// Error parsing an intent command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown intent {0:?}")]
    UnknownIntent(String),

    #[error("missing target entity")]
    MissingTarget,

    #[error("select_source needs a source label")]
    MissingSource,

    #[error(transparent)]
    Entity(#[from] InvalidEntityId),
}

impl FromStr for RemoteIntent {
    type Err = IntentParseError;

    /// Parses a bare intent verb; `select_source` takes its label after a space.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(' ').unwrap_or((s, ""));
        Ok(match verb {
            "" => return Err(IntentParseError::Empty),
            "turn_on" => Self::TurnOn,
            "turn_off" => Self::TurnOff,
            "toggle" => Self::Toggle,
            "play" => Self::Play,
            "pause" => Self::Pause,
            "play_pause" => Self::PlayPause,
            "stop" => Self::Stop,
            "next_track" => Self::NextTrack,
            "previous_track" => Self::PreviousTrack,
            "volume_up" => Self::VolumeUp,
            "volume_down" => Self::VolumeDown,
            "mute" => Self::Mute,
            "select_source" => {
                let label = rest.trim();
                if label.is_empty() {
                    return Err(IntentParseError::MissingSource);
                }
                Self::SelectSource(label.to_string())
            }
            other => return Err(IntentParseError::UnknownIntent(other.to_string())),
        })
    }
}

/// An intent with its targets, as typed on the console:
/// `<intent> <entity>[,<entity>...] [source label]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCommand {
    pub intent: RemoteIntent,
    pub targets: Vec<EntityId>,
}

impl FromStr for IntentCommand {
    type Err = IntentParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(IntentParseError::Empty)?;
        let targets = parts
            .next()
            .ok_or(IntentParseError::MissingTarget)?
            .split(',')
            .filter(|t| !t.is_empty())
            .map(EntityId::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if targets.is_empty() {
            return Err(IntentParseError::MissingTarget);
        }

        let rest = parts.collect::<Vec<_>>().join(" ");
        let intent = if rest.is_empty() {
            verb.parse()?
        } else {
            format!("{verb} {rest}").parse()?
        };
        Ok(Self { intent, targets })
    }
}
