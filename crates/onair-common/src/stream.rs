//! Resolved stream items handed to the transcoding pipeline.
//!
//! A [`StreamLineupItem`] is what a channel airs at a given instant, with the
//! offsets the player needs: where to start inside the backing media
//! (`start_offset_ms`) and how long to play before asking again
//! (`stream_duration_ms`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ChannelId, CustomShowId, FillerListId, ProgramId};
use crate::types::ExternalId;

/// A scheduled program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramItem {
    pub program_id: ProgramId,
    pub title: String,
    pub location: String,
    #[serde(default)]
    pub external_ids: Vec<ExternalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_show_id: Option<CustomShowId>,
    pub start_offset_ms: i64,
    pub stream_duration_ms: i64,
    pub duration_ms: i64,
}

/// Filler (or fallback) content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialItem {
    pub program_id: ProgramId,
    pub title: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filler_list_id: Option<FillerListId>,
    pub start_offset_ms: i64,
    pub stream_duration_ms: i64,
    pub duration_ms: i64,
    /// The backing clip is shorter than the slot; the player must loop it.
    pub infinite_loop: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineItem {
    pub title: String,
    pub start_offset_ms: i64,
    pub stream_duration_ms: i64,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectItem {
    pub channel: ChannelId,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorItem {
    pub reason: String,
    pub duration_ms: i64,
    pub stream_duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingItem {
    pub duration_ms: i64,
}

/// Discriminant of a [`StreamLineupItem`], for logging and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamItemKind {
    Program,
    Commercial,
    Offline,
    Redirect,
    Error,
    Loading,
}

impl fmt::Display for StreamItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program => write!(f, "program"),
            Self::Commercial => write!(f, "commercial"),
            Self::Offline => write!(f, "offline"),
            Self::Redirect => write!(f, "redirect"),
            Self::Error => write!(f, "error"),
            Self::Loading => write!(f, "loading"),
        }
    }
}

/// A fully resolved item for one channel at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamLineupItem {
    Program(ProgramItem),
    Commercial(CommercialItem),
    Offline(OfflineItem),
    Redirect(RedirectItem),
    Error(ErrorItem),
    Loading(LoadingItem),
}

impl StreamLineupItem {
    /// Build an offline placeholder that plays from its start.
    pub fn offline(title: impl Into<String>, duration_ms: i64) -> Self {
        Self::Offline(OfflineItem {
            title: title.into(),
            start_offset_ms: 0,
            stream_duration_ms: duration_ms,
            duration_ms,
        })
    }

    /// Build an error item shown to the viewer for `duration_ms`.
    pub fn error(reason: impl Into<String>, duration_ms: i64) -> Self {
        Self::Error(ErrorItem {
            reason: reason.into(),
            duration_ms,
            stream_duration_ms: duration_ms,
        })
    }

    pub fn kind(&self) -> StreamItemKind {
        match self {
            Self::Program(_) => StreamItemKind::Program,
            Self::Commercial(_) => StreamItemKind::Commercial,
            Self::Offline(_) => StreamItemKind::Offline,
            Self::Redirect(_) => StreamItemKind::Redirect,
            Self::Error(_) => StreamItemKind::Error,
            Self::Loading(_) => StreamItemKind::Loading,
        }
    }

    /// Full runtime of the backing content (or of the slot).
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::Program(p) => p.duration_ms,
            Self::Commercial(c) => c.duration_ms,
            Self::Offline(o) => o.duration_ms,
            Self::Redirect(r) => r.duration_ms,
            Self::Error(e) => e.duration_ms,
            Self::Loading(l) => l.duration_ms,
        }
    }

    pub fn start_offset_ms(&self) -> i64 {
        match self {
            Self::Program(p) => p.start_offset_ms,
            Self::Commercial(c) => c.start_offset_ms,
            Self::Offline(o) => o.start_offset_ms,
            Self::Redirect(_) | Self::Error(_) | Self::Loading(_) => 0,
        }
    }

    /// Time until the next decision point.
    pub fn stream_duration_ms(&self) -> i64 {
        match self {
            Self::Program(p) => p.stream_duration_ms,
            Self::Commercial(c) => c.stream_duration_ms,
            Self::Offline(o) => o.stream_duration_ms,
            Self::Redirect(r) => r.duration_ms,
            Self::Error(e) => e.stream_duration_ms,
            Self::Loading(l) => l.duration_ms,
        }
    }

    /// Playable time left: the stream duration, further bounded by what is
    /// left of the backing content unless the item loops.
    pub fn remaining_ms(&self) -> i64 {
        let stream = self.stream_duration_ms();
        match self {
            Self::Commercial(c) if c.infinite_loop => stream,
            _ => stream.min(self.duration_ms() - self.start_offset_ms()),
        }
    }

    /// Lower the stream duration to at most `bound_ms`.
    pub fn cap_stream_duration(&mut self, bound_ms: i64) {
        match self {
            Self::Program(p) => p.stream_duration_ms = p.stream_duration_ms.min(bound_ms),
            Self::Commercial(c) => c.stream_duration_ms = c.stream_duration_ms.min(bound_ms),
            Self::Offline(o) => o.stream_duration_ms = o.stream_duration_ms.min(bound_ms),
            Self::Redirect(r) => r.duration_ms = r.duration_ms.min(bound_ms),
            Self::Error(e) => e.stream_duration_ms = e.stream_duration_ms.min(bound_ms),
            Self::Loading(l) => l.duration_ms = l.duration_ms.min(bound_ms),
        }
    }

    /// Move the item forward by `delta_ms` of wall-clock time.
    pub fn advance(&mut self, delta_ms: i64) {
        match self {
            Self::Program(p) => {
                p.start_offset_ms += delta_ms;
                p.stream_duration_ms -= delta_ms;
            }
            Self::Commercial(c) => {
                c.start_offset_ms += delta_ms;
                c.stream_duration_ms -= delta_ms;
            }
            Self::Offline(o) => {
                o.start_offset_ms += delta_ms;
                o.stream_duration_ms -= delta_ms;
            }
            Self::Redirect(r) => r.duration_ms -= delta_ms,
            Self::Error(e) => e.stream_duration_ms -= delta_ms,
            Self::Loading(l) => l.duration_ms -= delta_ms,
        }
    }

    /// Backing program of Program and Commercial items.
    pub fn program_id(&self) -> Option<ProgramId> {
        match self {
            Self::Program(p) => Some(p.program_id),
            Self::Commercial(c) => Some(c.program_id),
            _ => None,
        }
    }

    pub fn filler_list_id(&self) -> Option<FillerListId> {
        match self {
            Self::Commercial(c) => c.filler_list_id,
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commercial(duration_ms: i64, stream_duration_ms: i64, infinite_loop: bool) -> StreamLineupItem {
        StreamLineupItem::Commercial(CommercialItem {
            program_id: ProgramId::new(),
            title: "Bumper".to_string(),
            location: "/filler/bumper.mp4".to_string(),
            filler_list_id: Some(FillerListId::new()),
            start_offset_ms: 0,
            stream_duration_ms,
            duration_ms,
            infinite_loop,
        })
    }

    #[test]
    fn advance_moves_offsets() {
        let mut item = StreamLineupItem::offline("Offline", 60_000);
        item.advance(15_000);
        assert_eq!(item.start_offset_ms(), 15_000);
        assert_eq!(item.stream_duration_ms(), 45_000);
        assert_eq!(item.remaining_ms(), 45_000);
    }

    #[test]
    fn looping_filler_remaining_ignores_backing_runtime() {
        let mut item = commercial(10_000, 30_000, true);
        item.advance(12_000);
        assert_eq!(item.remaining_ms(), 18_000);

        let mut item = commercial(10_000, 10_000, false);
        item.advance(4_000);
        assert_eq!(item.remaining_ms(), 6_000);
    }

    #[test]
    fn cap_only_lowers() {
        let mut item = StreamLineupItem::error("boom", 60_000);
        item.cap_stream_duration(90_000);
        assert_eq!(item.stream_duration_ms(), 60_000);
        item.cap_stream_duration(5_000);
        assert_eq!(item.stream_duration_ms(), 5_000);
        assert_eq!(item.duration_ms(), 60_000);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(StreamLineupItem::offline("Offline", 1000)).unwrap();
        assert_eq!(json["type"], "offline");
        assert_eq!(json["stream_duration_ms"], 1000);

        let back: StreamLineupItem = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), StreamItemKind::Offline);
    }

    #[test]
    fn filler_accessors() {
        let item = commercial(1000, 1000, false);
        assert!(item.program_id().is_some());
        assert!(item.filler_list_id().is_some());
        assert_eq!(item.kind().to_string(), "commercial");
    }
}
