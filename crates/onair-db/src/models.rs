//! Rows of the playback continuity tables.
//!
//! Catalog tables map directly onto the `onair_common` types; these are the
//! rows that only exist in the database.

use onair_common::{ChannelId, FillerListId, ProgramId, StreamLineupItem};
use serde::{Deserialize, Serialize};

/// Last resolved item for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStateRow {
    pub channel_id: ChannelId,
    /// When the row was last written.
    pub recorded_at_ms: i64,
    /// When the item's offsets were last true.
    pub anchored_at_ms: i64,
    pub item: StreamLineupItem,
}

/// When a program last finished playing on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPlayRow {
    pub channel_id: ChannelId,
    pub program_id: ProgramId,
    pub played_until_ms: i64,
}

/// When a clip from a filler list last finished playing on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerPlayRow {
    pub channel_id: ChannelId,
    pub filler_list_id: FillerListId,
    pub played_until_ms: i64,
}
