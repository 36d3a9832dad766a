//! Playback continuity.
//!
//! Remembers, per channel, the last item handed to a viewer so that a quick
//! reconnect resumes the same stream instead of recomputing it, along with
//! when each program and filler list last finished playing. The in-memory
//! state is authoritative; every mutation is written through to a
//! [`ContinuityStore`] so a restart can pick up where it left off.

mod store;

pub use store::{ContinuitySnapshot, ContinuityStore, MemoryContinuityStore, SqliteContinuityStore};

use dashmap::DashMap;
use onair_common::{ChannelId, FillerListId, ProgramId, Result, StreamLineupItem};
use onair_db::models::StreamStateRow;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only view of play history, used when picking filler.
pub trait PlayHistory: Send + Sync {
    /// When `program` last finished (or will finish) on `channel`.
    fn program_last_played(&self, channel: ChannelId, program: ProgramId) -> Option<i64>;

    /// When a clip from `list` last finished (or will finish) on `channel`.
    fn filler_last_played(&self, channel: ChannelId, list: FillerListId) -> Option<i64>;
}

/// The last item handed out on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackContinuityRecord {
    /// When the record was last written.
    pub timestamp_ms: i64,
    /// When the item's offsets were true.
    pub anchored_at_ms: i64,
    pub item: StreamLineupItem,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelPlaybackState {
    pub stream: Option<PlaybackContinuityRecord>,
    pub program_plays: HashMap<ProgramId, i64>,
    pub filler_plays: HashMap<FillerListId, i64>,
}

/// An item recovered from the continuity cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumedItem {
    pub item: StreamLineupItem,
    /// Instant at which `item`'s offsets are true.
    pub anchored_at_ms: i64,
    /// The item is exactly the one handed out before.
    pub unchanged: bool,
}

pub struct ContinuityCache {
    channels: DashMap<ChannelId, ChannelPlaybackState>,
    store: Arc<dyn ContinuityStore>,
    slack_ms: i64,
}

impl ContinuityCache {
    /// Empty cache writing through to `store`.
    pub fn new(store: Arc<dyn ContinuityStore>, slack_ms: i64) -> Self {
        Self {
            channels: DashMap::new(),
            store,
            slack_ms,
        }
    }

    /// Cache backed only by memory.
    pub fn in_memory(slack_ms: i64) -> Self {
        Self::new(Arc::new(MemoryContinuityStore::new()), slack_ms)
    }

    /// Hydrate a cache from everything `store` holds.
    pub fn load(store: Arc<dyn ContinuityStore>, slack_ms: i64) -> Result<Self> {
        let snapshot = store.load()?;
        let cache = Self::new(store, slack_ms);

        for row in snapshot.streams {
            cache.channels.entry(row.channel_id).or_default().stream =
                Some(PlaybackContinuityRecord {
                    timestamp_ms: row.recorded_at_ms,
                    anchored_at_ms: row.anchored_at_ms,
                    item: row.item,
                });
        }
        for play in snapshot.program_plays {
            cache
                .channels
                .entry(play.channel_id)
                .or_default()
                .program_plays
                .insert(play.program_id, play.played_until_ms);
        }
        for play in snapshot.filler_plays {
            cache
                .channels
                .entry(play.channel_id)
                .or_default()
                .filler_plays
                .insert(play.filler_list_id, play.played_until_ms);
        }

        tracing::info!(channels = cache.channels.len(), "Loaded playback continuity");
        Ok(cache)
    }

    pub fn slack_ms(&self) -> i64 {
        self.slack_ms
    }

    /// Last record of a channel, if any.
    pub fn stream_record(&self, channel: ChannelId) -> Option<PlaybackContinuityRecord> {
        self.channels
            .get(&channel)
            .and_then(|state| state.stream.clone())
    }

    /// The item a viewer reconnecting to `channel` at `now_ms` should get,
    /// if the last one is still current.
    ///
    /// Within the slack window the previous item is returned untouched.
    /// Otherwise its offsets are moved forward to `now_ms`; if that leaves
    /// less than the slack of stream time, `None` forces a fresh resolution.
    pub fn get_resumable(&self, channel: ChannelId, now_ms: i64) -> Option<ResumedItem> {
        let record = self.stream_record(channel)?;
        let delta = now_ms - record.timestamp_ms;
        if delta < 0 {
            tracing::debug!(channel_id = %channel, delta, "Continuity record is from the future");
            return None;
        }

        let since_anchor = now_ms - record.anchored_at_ms;
        if delta <= self.slack_ms
            && since_anchor <= self.slack_ms
            && record.item.remaining_ms() >= self.slack_ms
        {
            return Some(ResumedItem {
                item: record.item,
                anchored_at_ms: record.anchored_at_ms,
                unchanged: true,
            });
        }

        let mut item = record.item;
        item.advance(since_anchor);
        if item.stream_duration_ms() < self.slack_ms || item.remaining_ms() <= 0 {
            tracing::trace!(channel_id = %channel, "Continuity record exhausted");
            return None;
        }

        Some(ResumedItem {
            item,
            anchored_at_ms: now_ms,
            unchanged: false,
        })
    }

    /// Remember `item` as what `channel` airs, with offsets true at
    /// `anchored_at_ms`.
    ///
    /// Also records when the backing program (and filler list, for filler
    /// clips) will finish. Error and loading items are not recorded.
    pub fn record(
        &self,
        channel: ChannelId,
        now_ms: i64,
        item: &StreamLineupItem,
        anchored_at_ms: i64,
    ) -> Result<()> {
        if item.is_error() || item.is_loading() {
            tracing::trace!(channel_id = %channel, kind = %item.kind(), "Not recording transient item");
            return Ok(());
        }

        let played_until_ms = anchored_at_ms + item.remaining_ms();

        // Hold the entry for the whole update so memory and store agree.
        let mut state = self.channels.entry(channel).or_default();
        state.stream = Some(PlaybackContinuityRecord {
            timestamp_ms: now_ms,
            anchored_at_ms,
            item: item.clone(),
        });
        if let Some(program) = item.program_id() {
            state.program_plays.insert(program, played_until_ms);
        }
        if let Some(list) = item.filler_list_id() {
            state.filler_plays.insert(list, played_until_ms);
        }

        let written = self
            .store
            .put_stream(&StreamStateRow {
                channel_id: channel,
                recorded_at_ms: now_ms,
                anchored_at_ms,
                item: item.clone(),
            })
            .and_then(|()| match item.program_id() {
                Some(program) => self.store.put_program_play(channel, program, played_until_ms),
                None => Ok(()),
            })
            .and_then(|()| match item.filler_list_id() {
                Some(list) => self.store.put_filler_play(channel, list, played_until_ms),
                None => Ok(()),
            });

        if let Err(e) = &written {
            tracing::error!(channel_id = %channel, "Failed to persist playback continuity: {}", e);
        }
        written
    }

    /// Forget the last item of `channel`. Play history is kept.
    ///
    /// Returns `true` if a record was removed.
    pub fn stop(&self, channel: ChannelId) -> Result<bool> {
        let removed = match self.channels.get_mut(&channel) {
            Some(mut state) => state.stream.take().is_some(),
            None => false,
        };
        self.store.remove_stream(channel)?;
        Ok(removed)
    }
}

impl PlayHistory for ContinuityCache {
    fn program_last_played(&self, channel: ChannelId, program: ProgramId) -> Option<i64> {
        self.channels
            .get(&channel)
            .and_then(|state| state.program_plays.get(&program).copied())
    }

    fn filler_last_played(&self, channel: ChannelId, list: FillerListId) -> Option<i64> {
        self.channels
            .get(&channel)
            .and_then(|state| state.filler_plays.get(&list).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::{CommercialItem, ProgramItem};

    const SLACK: i64 = 9_999;

    fn program_item(start_offset_ms: i64, stream_duration_ms: i64) -> StreamLineupItem {
        StreamLineupItem::Program(ProgramItem {
            program_id: ProgramId::new(),
            title: "Feature".to_string(),
            location: "/media/feature.mkv".to_string(),
            external_ids: vec![],
            custom_show_id: None,
            start_offset_ms,
            stream_duration_ms,
            duration_ms: start_offset_ms + stream_duration_ms,
        })
    }

    #[test]
    fn test_reconnect_within_slack_is_identical() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        let item = program_item(0, 60_000);
        cache.record(channel, 0, &item, 0).unwrap();

        let resumed = cache.get_resumable(channel, 5_000).unwrap();
        assert!(resumed.unchanged);
        assert_eq!(resumed.item, item);
        assert_eq!(resumed.anchored_at_ms, 0);
    }

    #[test]
    fn test_reconnect_after_slack_advances() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        cache.record(channel, 0, &program_item(1_000, 60_000), 0).unwrap();

        let resumed = cache.get_resumable(channel, 20_000).unwrap();
        assert!(!resumed.unchanged);
        assert_eq!(resumed.item.start_offset_ms(), 21_000);
        assert_eq!(resumed.item.stream_duration_ms(), 40_000);
        assert_eq!(resumed.anchored_at_ms, 20_000);
    }

    #[test]
    fn test_reconnect_after_exhaustion() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        cache.record(channel, 0, &program_item(0, 60_000), 0).unwrap();

        assert!(cache.get_resumable(channel, 70_000).is_none());
        // Less than the slack left is treated as exhausted too.
        assert!(cache.get_resumable(channel, 55_000).is_none());
    }

    #[test]
    fn test_short_item_is_not_reused_unchanged() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        cache.record(channel, 0, &program_item(0, 5_000), 0).unwrap();

        assert!(cache.get_resumable(channel, 1_000).is_none());
    }

    #[test]
    fn test_rerecording_keeps_anchor() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        let item = program_item(0, 60_000);
        cache.record(channel, 0, &item, 0).unwrap();

        // Repeated reconnects inside the window keep the original anchor,
        // so the item drifts no further than the slack.
        let resumed = cache.get_resumable(channel, 8_000).unwrap();
        cache.record(channel, 8_000, &resumed.item, resumed.anchored_at_ms).unwrap();
        let resumed = cache.get_resumable(channel, 16_000).unwrap();
        assert!(!resumed.unchanged);
        assert_eq!(resumed.item.start_offset_ms(), 16_000);
    }

    #[test]
    fn test_record_is_idempotent() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        let item = program_item(0, 60_000);
        cache.record(channel, 1_000, &item, 1_000).unwrap();
        let first = cache.stream_record(channel);
        cache.record(channel, 1_000, &item, 1_000).unwrap();
        assert_eq!(cache.stream_record(channel), first);
        assert_eq!(
            cache.program_last_played(channel, item.program_id().unwrap()),
            Some(61_000)
        );
    }

    #[test]
    fn test_commercial_records_filler_list() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        let list = FillerListId::new();
        let item = StreamLineupItem::Commercial(CommercialItem {
            program_id: ProgramId::new(),
            title: "Bumper".to_string(),
            location: "/filler/bumper.mp4".to_string(),
            filler_list_id: Some(list),
            start_offset_ms: 0,
            stream_duration_ms: 30_000,
            duration_ms: 30_000,
            infinite_loop: false,
        });
        cache.record(channel, 100, &item, 100).unwrap();

        assert_eq!(cache.filler_last_played(channel, list), Some(30_100));
        assert_eq!(cache.program_last_played(channel, item.program_id().unwrap()), Some(30_100));
        assert_eq!(cache.filler_last_played(ChannelId::new(), list), None);
    }

    #[test]
    fn test_errors_are_not_recorded() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        cache
            .record(channel, 0, &StreamLineupItem::error("Recursive channel redirect", 60_000), 0)
            .unwrap();
        assert!(cache.stream_record(channel).is_none());
    }

    #[test]
    fn test_stop_keeps_history() {
        let cache = ContinuityCache::in_memory(SLACK);
        let channel = ChannelId::new();
        let item = program_item(0, 60_000);
        cache.record(channel, 0, &item, 0).unwrap();

        assert!(cache.stop(channel).unwrap());
        assert!(!cache.stop(channel).unwrap());
        assert!(cache.get_resumable(channel, 1_000).is_none());
        assert!(cache.program_last_played(channel, item.program_id().unwrap()).is_some());
    }

    #[test]
    fn test_load_restores_state() {
        let store: Arc<dyn ContinuityStore> = Arc::new(MemoryContinuityStore::new());
        let channel = ChannelId::new();
        let item = program_item(0, 60_000);
        {
            let cache = ContinuityCache::new(store.clone(), SLACK);
            cache.record(channel, 0, &item, 0).unwrap();
        }

        let restored = ContinuityCache::load(store, SLACK).unwrap();
        assert_eq!(restored.get_resumable(channel, 2_000).unwrap().item, item);
        assert_eq!(
            restored.program_last_played(channel, item.program_id().unwrap()),
            Some(60_000)
        );
    }
}
