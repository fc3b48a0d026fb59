//! Supported-command flags published for each entity.

use serde::Serialize;

use crate::directory::DirectoryEntry;

/// One supported command. Values follow the host framework's bit numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Capability {
    Pause = 1,
    Stop = 2,
    PlayPause = 4,
    VolumeMute = 8,
    PreviousTrack = 16,
    NextTrack = 32,
    TurnOn = 128,
    TurnOff = 256,
    VolumeStep = 1024,
    SelectSource = 2048,
}

impl Capability {
    pub const fn bit(self) -> u32 {
        self as u32
    }
}

/// A set of [`Capability`] flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    #[must_use]
    pub fn with(mut self, cap: Capability) -> Self {
        self.insert(cap);
        self
    }

    /// Activities can only be started and stopped.
    pub fn activity() -> Self {
        Self::empty()
            .with(Capability::TurnOn)
            .with(Capability::TurnOff)
    }

    /// Derives a device's set from the functions it actually has.
    pub fn for_device(entry: &DirectoryEntry) -> Self {
        const BY_FUNCTION: &[(&str, Capability)] = &[
            ("Pause", Capability::Pause),
            ("Pause", Capability::PlayPause),
            ("Stop", Capability::Stop),
            ("Mute", Capability::VolumeMute),
            ("SkipBackward", Capability::PreviousTrack),
            ("SkipForward", Capability::NextTrack),
            ("PowerOn", Capability::TurnOn),
            ("PowerOff", Capability::TurnOff),
            ("VolumeUp", Capability::VolumeStep),
            ("VolumeDown", Capability::VolumeStep),
        ];

        let mut set = Self::empty();
        for (name, cap) in BY_FUNCTION {
            if entry.has_function(name) {
                set.insert(*cap);
            }
        }
        if !entry.is_empty() {
            set.insert(Capability::SelectSource);
        }
        set
    }
}
