//! Current-item location.
//!
//! Locating never fails for a playable lineup: a content slot whose program
//! has gone missing is reported as an offline slot for its remaining time,
//! so the filler path can cover it.

use onair_common::{
    Channel, ChannelId, CustomShowId, FillerListId, Lineup, LineupItem, Program, ProgramId,
};

use super::clock::{cycle_elapsed, CyclePosition};
use super::index::position_in;
use crate::error::{ResolveError, ResolveResult};
use crate::storage::ProgramStore;

/// What occupies the located slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatedSlot {
    Content {
        program: Program,
        /// Length of the slot in the lineup.
        slot_duration_ms: i64,
        custom_show_id: Option<CustomShowId>,
        filler_list_id: Option<FillerListId>,
    },
    /// Flex time, an unplayable program, or time before the channel starts.
    Offline { duration_ms: i64 },
    Redirect { channel: ChannelId, duration_ms: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedItem {
    pub slot: LocatedSlot,
    /// How far into the slot the timestamp is.
    pub time_elapsed_ms: i64,
    /// Lineup index, `None` for the synthetic pre-start slot.
    pub index: Option<usize>,
    /// Time until the slot ends.
    pub stream_duration_ms: i64,
    /// Set when a content slot was downgraded because its program is gone.
    pub missing_program: Option<ProgramId>,
}

/// Resolves timestamps to lineup slots.
pub struct Locator<'a> {
    programs: &'a dyn ProgramStore,
    slack_ms: i64,
}

impl<'a> Locator<'a> {
    pub fn new(programs: &'a dyn ProgramStore, slack_ms: i64) -> Self {
        Self { programs, slack_ms }
    }

    pub async fn locate(
        &self,
        channel: &Channel,
        lineup: &Lineup,
        timestamp_ms: i64,
    ) -> ResolveResult<LocatedItem> {
        let total_ms = lineup.total_duration_ms();
        if lineup.is_empty() || total_ms <= 0 {
            return Err(ResolveError::NoCurrentProgram {
                channel: channel.id,
                reason: format!(
                    "lineup has {} items and a cycle of {}ms",
                    lineup.len(),
                    total_ms
                ),
            });
        }
        if channel.duration_ms != total_ms {
            tracing::debug!(
                channel_id = %channel.id,
                channel_duration_ms = channel.duration_ms,
                lineup_duration_ms = total_ms,
                "Channel duration differs from lineup, using lineup"
            );
        }

        let elapsed_ms = match cycle_elapsed(timestamp_ms, channel.start_time_ms, total_ms) {
            CyclePosition::NotStarted { remaining_ms } => {
                return Ok(LocatedItem {
                    slot: LocatedSlot::Offline {
                        duration_ms: remaining_ms,
                    },
                    time_elapsed_ms: 0,
                    index: None,
                    stream_duration_ms: remaining_ms,
                    missing_program: None,
                });
            }
            CyclePosition::Elapsed(elapsed_ms) => elapsed_ms,
        };

        let position = position_in(lineup, elapsed_ms, self.slack_ms).ok_or_else(|| {
            ResolveError::NoCurrentProgram {
                channel: channel.id,
                reason: format!("no lineup item at {}ms into the cycle", elapsed_ms),
            }
        })?;

        let mut missing_program = None;
        let slot = match &lineup.items()[position.index] {
            LineupItem::Content {
                id,
                duration_ms,
                custom_show_id,
                filler_list_id,
            } => match self.programs.get_program_by_id(*id).await? {
                Some(program) if program.is_playable() => LocatedSlot::Content {
                    program,
                    slot_duration_ms: *duration_ms,
                    custom_show_id: *custom_show_id,
                    filler_list_id: *filler_list_id,
                },
                found => {
                    tracing::warn!(
                        channel_id = %channel.id,
                        program_id = %id,
                        index = position.index,
                        exists = found.is_some(),
                        "Lineup points at a missing or unplayable program, treating slot as flex"
                    );
                    missing_program = Some(*id);
                    LocatedSlot::Offline {
                        duration_ms: *duration_ms,
                    }
                }
            },
            LineupItem::Offline { duration_ms } => LocatedSlot::Offline {
                duration_ms: *duration_ms,
            },
            LineupItem::Redirect {
                channel: target,
                duration_ms,
            } => LocatedSlot::Redirect {
                channel: *target,
                duration_ms: *duration_ms,
            },
        };

        Ok(LocatedItem {
            slot,
            time_elapsed_ms: position.elapsed_ms,
            index: Some(position.index),
            stream_duration_ms: position.stream_duration_ms,
            missing_program,
        })
    }
}
