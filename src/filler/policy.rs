//! Flex substitution: what airs during gaps and unplayable slots.

use onair_common::{
    Channel, CommercialItem, FillerListId, Lineup, OfflineMode, Program, StreamLineupItem,
};

use super::picker::{FillerPick, FillerPicker};
use crate::config::PlaybackConfig;
use crate::continuity::PlayHistory;
use crate::error::ResolveResult;
use crate::storage::{ChannelStore, FillerStore};

pub const OFFLINE_TITLE: &str = "Channel Offline";

/// Decides what fills a flex gap on a channel.
///
/// In order: a channel whose whole lineup is flex goes permanently offline;
/// otherwise a filler clip is picked; otherwise a fallback clip plays in clip
/// mode; otherwise an offline placeholder is shown.
pub struct FlexPolicy<'a> {
    pub channels: &'a dyn ChannelStore,
    pub fillers: &'a dyn FillerStore,
    pub picker: &'a dyn FillerPicker,
    pub history: &'a dyn PlayHistory,
    pub settings: &'a PlaybackConfig,
}

impl FlexPolicy<'_> {
    /// Fill `remaining_ms` of flex time on `channel` starting at `now_ms`.
    pub async fn fill(
        &self,
        channel: &Channel,
        lineup: &Lineup,
        remaining_ms: i64,
        now_ms: i64,
    ) -> ResolveResult<StreamLineupItem> {
        if lineup.is_permanently_offline() {
            tracing::debug!(channel_id = %channel.id, "Channel lineup is a single flex slot");
            return Ok(StreamLineupItem::offline(
                OFFLINE_TITLE,
                self.settings.permanent_offline_ms,
            ));
        }

        let mut remaining_ms = remaining_ms;

        let candidates = self.fillers.get_fillers_from_channel(channel.id).await?;
        let pick = if candidates.is_empty() {
            FillerPick::none()
        } else {
            self.picker
                .pick_filler(channel, &candidates, remaining_ms, now_ms, self.history)
        };

        if let Some(picked) = pick.filler {
            tracing::debug!(
                channel_id = %channel.id,
                program_id = %picked.program.id,
                filler_list_id = %picked.filler_list_id,
                "Filling flex with filler clip"
            );
            return Ok(filler_item(
                &picked.program,
                Some(picked.filler_list_id),
                0,
                remaining_ms,
            ));
        }

        if let Some(wait_ms) = pick.minimum_wait_ms {
            if remaining_ms > wait_ms {
                // Come back when a filler clip becomes eligible.
                remaining_ms = wait_ms;
            }
        }

        if channel.offline.mode == OfflineMode::Clip {
            let fallbacks = self
                .channels
                .get_channel_fallback_programs(channel.id)
                .await?;
            if let Some(special) = fallbacks.into_iter().find(Program::is_playable) {
                let start_ms = (special.duration_ms - remaining_ms).max(0);
                tracing::debug!(
                    channel_id = %channel.id,
                    program_id = %special.id,
                    start_ms,
                    "Filling flex with fallback clip"
                );
                return Ok(filler_item(&special, None, start_ms, remaining_ms));
            }
        }

        Ok(StreamLineupItem::offline(
            OFFLINE_TITLE,
            remaining_ms.min(self.settings.offline_cap_ms),
        ))
    }
}

/// Commercial item playing `program` from `start_ms` for at most
/// `required_ms`.
fn filler_item(
    program: &Program,
    filler_list_id: Option<FillerListId>,
    start_ms: i64,
    required_ms: i64,
) -> StreamLineupItem {
    let stream_duration_ms = (program.duration_ms - start_ms).min(required_ms).max(1);

    StreamLineupItem::Commercial(CommercialItem {
        program_id: program.id,
        title: program.title.clone(),
        location: program.location.clone(),
        filler_list_id,
        start_offset_ms: start_ms,
        stream_duration_ms,
        duration_ms: program.duration_ms,
        infinite_loop: program.duration_ms < required_ms,
    })
}
