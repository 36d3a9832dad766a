//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory catalog, an in-memory
//! continuity cache and default playback settings into a calculator.

#![allow(dead_code)]

use std::sync::Arc;

use onair::calculator::StreamProgramCalculator;
use onair::config::PlaybackConfig;
use onair::continuity::ContinuityCache;
use onair::filler::WeightedFillerPicker;
use onair::storage::MemoryCatalog;
use onair::throttle::AttemptThrottle;
use onair_common::{
    Channel, ChannelId, Lineup, LineupItem, OfflineSettings, Program, ProgramId, ProgramKind,
};

/// Start of every test channel's first cycle.
pub const START: i64 = 1_700_000_000_000;

pub struct TestHarness {
    pub catalog: Arc<MemoryCatalog>,
    pub cache: Arc<ContinuityCache>,
    pub settings: PlaybackConfig,
}

impl TestHarness {
    /// Create a new harness with default playback settings.
    pub fn new() -> Self {
        Self::with_settings(PlaybackConfig::default())
    }

    pub fn with_settings(settings: PlaybackConfig) -> Self {
        Self {
            catalog: Arc::new(MemoryCatalog::new()),
            cache: Arc::new(ContinuityCache::in_memory(settings.slack_ms)),
            settings,
        }
    }

    /// Calculator over the harness stores with a seeded filler picker.
    pub fn calculator(&self) -> StreamProgramCalculator {
        StreamProgramCalculator::new(self.catalog.clone(), self.cache.clone(), self.settings.clone())
            .with_picker(Arc::new(WeightedFillerPicker::with_seed(11)))
    }

    pub fn calculator_with_throttle(&self, throttle: AttemptThrottle) -> StreamProgramCalculator {
        self.calculator().with_throttle(throttle)
    }

    /// Insert a playable program.
    pub fn program(&self, title: &str, duration_ms: i64) -> Program {
        let program = Program {
            id: ProgramId::new(),
            title: title.to_string(),
            duration_ms,
            location: format!("/media/{}.mkv", title.to_lowercase().replace(' ', "_")),
            kind: ProgramKind::Episode,
        };
        self.catalog.insert_program(program.clone());
        program
    }

    /// Insert a channel starting at [`START`] with the given lineup.
    pub fn channel(&self, number: u32, items: Vec<LineupItem>) -> Channel {
        self.channel_with(number, items, OfflineSettings::default(), 0)
    }

    pub fn channel_with(
        &self,
        number: u32,
        items: Vec<LineupItem>,
        offline: OfflineSettings,
        filler_repeat_cooldown_ms: i64,
    ) -> Channel {
        self.channel_with_id(ChannelId::new(), number, items, offline, filler_repeat_cooldown_ms)
    }

    pub fn channel_with_id(
        &self,
        id: ChannelId,
        number: u32,
        items: Vec<LineupItem>,
        offline: OfflineSettings,
        filler_repeat_cooldown_ms: i64,
    ) -> Channel {
        let lineup = Lineup::new(items);
        let channel = Channel {
            id,
            number,
            name: format!("Channel {}", number),
            start_time_ms: START,
            duration_ms: lineup.total_duration_ms(),
            offline,
            filler_repeat_cooldown_ms,
        };
        self.catalog.insert_channel(channel.clone(), lineup);
        channel
    }
}

pub fn content(program: &Program) -> LineupItem {
    LineupItem::Content {
        id: program.id,
        duration_ms: program.duration_ms,
        custom_show_id: None,
        filler_list_id: None,
    }
}

pub fn offline(duration_ms: i64) -> LineupItem {
    LineupItem::Offline { duration_ms }
}

pub fn redirect(channel: ChannelId, duration_ms: i64) -> LineupItem {
    LineupItem::Redirect {
        channel,
        duration_ms,
    }
}
