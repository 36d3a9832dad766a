//! Channel, program and filler definitions as consumed by the resolver.
//!
//! These records are owned by external channel-configuration storage and
//! are treated as read-only here. Enums serialize in lowercase.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ChannelId, FillerListId, ProgramId};

/// Kind of program backing a lineup slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    Movie,
    Episode,
    Track,
    #[default]
    Other,
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Episode => write!(f, "episode"),
            Self::Track => write!(f, "track"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ProgramKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "episode" => Ok(Self::Episode),
            "track" => Ok(Self::Track),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid program kind: {}", s)),
        }
    }
}

/// Media source a program was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Plex,
    Jellyfin,
    Emby,
    Local,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plex => write!(f, "plex"),
            Self::Jellyfin => write!(f, "jellyfin"),
            Self::Emby => write!(f, "emby"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plex" => Ok(Self::Plex),
            "jellyfin" => Ok(Self::Jellyfin),
            "emby" => Ok(Self::Emby),
            "local" => Ok(Self::Local),
            _ => Err(format!("Invalid source type: {}", s)),
        }
    }
}

/// Identifier of a program inside an external media source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId {
    pub source_type: SourceType,
    pub external_key: String,
}

/// A playable library item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub title: String,
    pub duration_ms: i64,
    /// Playable location handed to the transcoder (path or URL).
    pub location: String,
    #[serde(default)]
    pub kind: ProgramKind,
}

impl Program {
    /// A program is playable when it has a location and a positive runtime.
    pub fn is_playable(&self) -> bool {
        self.duration_ms > 0 && !self.location.is_empty()
    }
}

/// What a channel shows when nothing concrete is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OfflineMode {
    /// A still picture (with optional sound).
    #[default]
    Pic,
    /// A fallback clip from the channel's fallback programs.
    Clip,
}

impl fmt::Display for OfflineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pic => write!(f, "pic"),
            Self::Clip => write!(f, "clip"),
        }
    }
}

impl std::str::FromStr for OfflineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pic" => Ok(Self::Pic),
            "clip" => Ok(Self::Clip),
            _ => Err(format!("Invalid offline mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OfflineSettings {
    #[serde(default)]
    pub mode: OfflineMode,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
}

/// A channel as consumed by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub number: u32,
    pub name: String,
    /// Absolute start of the first lineup cycle, epoch milliseconds.
    pub start_time_ms: i64,
    /// Total duration of one lineup cycle.
    pub duration_ms: i64,
    #[serde(default)]
    pub offline: OfflineSettings,
    /// Minimum gap before the same filler clip may repeat on this channel.
    #[serde(default)]
    pub filler_repeat_cooldown_ms: i64,
}

/// A filler list attached to a channel, with its rotation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFillerList {
    pub filler_list_id: FillerListId,
    pub weight: u32,
    /// Minimum gap between two plays of any clip from this list.
    pub cooldown_ms: i64,
    pub programs: Vec<Program>,
}
