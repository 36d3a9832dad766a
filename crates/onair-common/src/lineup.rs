//! Materialized channel lineups.
//!
//! A lineup is an ordered, cyclic sequence of items with a parallel array of
//! cumulative start offsets. After the last item the first one repeats.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::{ChannelId, CustomShowId, FillerListId, ProgramId};

/// Schema version written for newly materialized lineups.
pub const LINEUP_SCHEMA_VERSION: u32 = 1;

/// One slot of a lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineupItem {
    /// A concrete program, optionally played as part of a custom show or
    /// as filler from a filler list.
    Content {
        id: ProgramId,
        duration_ms: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_show_id: Option<CustomShowId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filler_list_id: Option<FillerListId>,
    },
    /// Flex time, filled at resolution time.
    Offline { duration_ms: i64 },
    /// Play whatever another channel is airing for this long.
    Redirect { channel: ChannelId, duration_ms: i64 },
}

impl LineupItem {
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::Content { duration_ms, .. }
            | Self::Offline { duration_ms }
            | Self::Redirect { duration_ms, .. } => *duration_ms,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline { .. })
    }
}

/// Ordered lineup items plus their cumulative start offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineup {
    pub schema_version: u32,
    items: Vec<LineupItem>,
    offsets: Vec<i64>,
}

impl Lineup {
    /// Materialize a lineup from its items, computing the offset array.
    pub fn new(items: Vec<LineupItem>) -> Self {
        let mut offsets = Vec::with_capacity(items.len());
        let mut acc = 0i64;
        for item in &items {
            offsets.push(acc);
            acc += item.duration_ms();
        }

        Self {
            schema_version: LINEUP_SCHEMA_VERSION,
            items,
            offsets,
        }
    }

    /// Rebuild a stored lineup, rejecting offsets that do not match the items.
    pub fn from_parts(schema_version: u32, items: Vec<LineupItem>, offsets: Vec<i64>) -> Result<Self> {
        if schema_version > LINEUP_SCHEMA_VERSION {
            return Err(Error::invalid_input(format!(
                "lineup schema version {} is newer than supported version {}",
                schema_version, LINEUP_SCHEMA_VERSION
            )));
        }
        if items.len() != offsets.len() {
            return Err(Error::invalid_input(format!(
                "lineup has {} items but {} offsets",
                items.len(),
                offsets.len()
            )));
        }

        let mut expected = 0i64;
        for (i, (item, offset)) in items.iter().zip(&offsets).enumerate() {
            if item.duration_ms() < 0 {
                return Err(Error::invalid_input(format!(
                    "lineup item {} has negative duration {}",
                    i,
                    item.duration_ms()
                )));
            }
            if *offset != expected {
                return Err(Error::invalid_input(format!(
                    "lineup offset {} is {} but items imply {}",
                    i, offset, expected
                )));
            }
            expected += item.duration_ms();
        }

        Ok(Self {
            schema_version,
            items,
            offsets,
        })
    }

    pub fn items(&self) -> &[LineupItem] {
        &self.items
    }

    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all item durations (one full cycle).
    pub fn total_duration_ms(&self) -> i64 {
        match (self.offsets.last(), self.items.last()) {
            (Some(offset), Some(item)) => offset + item.duration_ms(),
            _ => 0,
        }
    }

    /// True when the whole lineup is a single flex slot.
    pub fn is_permanently_offline(&self) -> bool {
        self.items.len() == 1 && self.items[0].is_offline()
    }
}
