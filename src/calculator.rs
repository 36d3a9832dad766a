//! Stream program calculation.
//!
//! Given a channel and an instant, decide what the channel airs: reuse the
//! continuity record when a viewer reconnects quickly, otherwise locate the
//! current lineup slot, follow redirects, fill flex time and apply the
//! attempt throttle. Resolution leaves the continuity cache alone;
//! [`StreamProgramCalculator::commit`] records the decision. A request carrying
//! a session token does count as an attempt against the throttle.

use onair_common::{
    Channel, ChannelId, CommercialItem, CustomShowId, Lineup, Program, ProgramItem, RedirectItem,
    StreamLineupItem,
};
use std::sync::Arc;

use crate::config::PlaybackConfig;
use crate::continuity::ContinuityCache;
use crate::error::{RecoveredCondition, ResolveError, ResolveResult};
use crate::filler::{FillerPicker, FlexPolicy, WeightedFillerPicker};
use crate::lineup::{LocatedItem, LocatedSlot, Locator};
use crate::redirect::{RedirectOutcome, RedirectResolver};
use crate::storage::{ChannelStore, FillerStore, ProgramStore};
use crate::throttle::AttemptThrottle;

pub const RECURSIVE_REDIRECT_REASON: &str = "Recursive channel redirect found";
pub const THROTTLED_REASON: &str = "Too many attempts, throttling";

/// A stream-start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub channel_id: ChannelId,
    pub timestamp_ms: i64,
    pub session_token: Option<String>,
}

impl StreamRequest {
    pub fn new(channel_id: ChannelId, timestamp_ms: i64) -> Self {
        Self {
            channel_id,
            timestamp_ms,
            session_token: None,
        }
    }

    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

/// The outcome of resolving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub item: StreamLineupItem,
    /// Channel the item was actually found on, after redirects.
    pub channel_context: Channel,
    /// Channel that was requested.
    pub source_channel: Channel,
    /// Request time.
    pub decided_at_ms: i64,
    /// Instant at which the item's offsets are true.
    pub anchored_at_ms: i64,
    pub from_cache: bool,
    pub conditions: Vec<RecoveredCondition>,
}

pub struct StreamProgramCalculator {
    channels: Arc<dyn ChannelStore>,
    programs: Arc<dyn ProgramStore>,
    fillers: Arc<dyn FillerStore>,
    picker: Arc<dyn FillerPicker>,
    cache: Arc<ContinuityCache>,
    throttle: AttemptThrottle,
    settings: PlaybackConfig,
}

impl StreamProgramCalculator {
    /// Calculator reading everything from one catalog.
    pub fn new<S>(catalog: Arc<S>, cache: Arc<ContinuityCache>, settings: PlaybackConfig) -> Self
    where
        S: ChannelStore + ProgramStore + FillerStore + 'static,
    {
        Self {
            channels: catalog.clone(),
            programs: catalog.clone(),
            fillers: catalog,
            picker: Arc::new(WeightedFillerPicker::new()),
            cache,
            throttle: AttemptThrottle::disabled(),
            settings,
        }
    }

    pub fn with_picker(mut self, picker: Arc<dyn FillerPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_throttle(mut self, throttle: AttemptThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn cache(&self) -> &Arc<ContinuityCache> {
        &self.cache
    }

    /// Resolve and record what the requested channel airs right now.
    pub async fn get_current_lineup_item(
        &self,
        request: &StreamRequest,
    ) -> ResolveResult<ResolvedStream> {
        let resolved = self.resolve(request).await?;
        self.commit(&resolved)?;
        Ok(resolved)
    }

    /// Decide what the requested channel airs without recording it.
    ///
    /// With a session token the request still counts as an attempt for
    /// throttling, committed or not.
    pub async fn resolve(&self, request: &StreamRequest) -> ResolveResult<ResolvedStream> {
        let now = request.timestamp_ms;
        let source = self
            .channels
            .get_channel(request.channel_id)
            .await?
            .ok_or(ResolveError::ChannelNotFound(request.channel_id))?;

        let mut resolved = match self.cache.get_resumable(source.id, now) {
            Some(resumed) => {
                tracing::debug!(
                    channel_id = %source.id,
                    kind = %resumed.item.kind(),
                    unchanged = resumed.unchanged,
                    "Resuming from continuity cache"
                );
                ResolvedStream {
                    item: resumed.item,
                    channel_context: source.clone(),
                    source_channel: source,
                    decided_at_ms: now,
                    anchored_at_ms: resumed.anchored_at_ms,
                    from_cache: true,
                    conditions: Vec::new(),
                }
            }
            None => self.compute(source, now).await?,
        };

        if let Some(token) = &request.session_token {
            if self.throttle.too_many_attempts(token, &resolved.item) {
                resolved.item =
                    StreamLineupItem::error(THROTTLED_REASON, self.throttle.error_duration_ms());
                resolved.conditions.push(RecoveredCondition::ThrottledAttempt);
            }
        }

        tracing::debug!(
            channel_id = %resolved.source_channel.id,
            context_id = %resolved.channel_context.id,
            kind = %resolved.item.kind(),
            start_offset_ms = resolved.item.start_offset_ms(),
            stream_duration_ms = resolved.item.stream_duration_ms(),
            "Resolved stream"
        );
        Ok(resolved)
    }

    /// Record a resolution in the continuity cache.
    ///
    /// Error and loading items are skipped.
    pub fn commit(&self, resolved: &ResolvedStream) -> ResolveResult<()> {
        self.cache.record(
            resolved.source_channel.id,
            resolved.decided_at_ms,
            &resolved.item,
            resolved.anchored_at_ms,
        )?;
        Ok(())
    }

    /// Forget the continuity record of a channel.
    pub fn stop_playback(&self, channel: ChannelId) -> ResolveResult<bool> {
        Ok(self.cache.stop(channel)?)
    }

    async fn compute(&self, source: Channel, now: i64) -> ResolveResult<ResolvedStream> {
        let lineup = self.load_lineup(&source).await?;
        let locator = Locator::new(self.programs.as_ref(), self.settings.slack_ms);
        let outcome = RedirectResolver::new(self.channels.as_ref(), &locator)
            .resolve(source.clone(), lineup, now)
            .await?;

        let mut conditions = Vec::new();
        let (item, channel_context) = match outcome {
            RedirectOutcome::Recursive { chain } => {
                conditions.push(RecoveredCondition::RecursiveRedirect { chain });
                let item = StreamLineupItem::error(
                    RECURSIVE_REDIRECT_REASON,
                    self.settings.error_duration_ms,
                );
                (item, source.clone())
            }
            RedirectOutcome::Resolved {
                channel,
                lineup,
                located,
                bound_ms,
            } => {
                if let Some(program) = located.missing_program {
                    conditions.push(RecoveredCondition::MissingBackingProgram { program });
                }
                // Filler and fallback are sized against the bound as well.
                let required_ms = bound_ms.map_or(located.stream_duration_ms, |bound| {
                    bound.min(located.stream_duration_ms)
                });
                let mut item = self
                    .materialize(&channel, &lineup, located, required_ms, now)
                    .await?;
                if let Some(bound_ms) = bound_ms {
                    item.cap_stream_duration(bound_ms);
                }
                (item, channel)
            }
        };

        Ok(ResolvedStream {
            item,
            channel_context,
            source_channel: source,
            decided_at_ms: now,
            anchored_at_ms: now,
            from_cache: false,
            conditions,
        })
    }

    async fn load_lineup(&self, channel: &Channel) -> ResolveResult<Lineup> {
        match self.channels.load_lineup(channel.id).await {
            Ok(Some(lineup)) => Ok(lineup),
            Ok(None) => Err(ResolveError::NoCurrentProgram {
                channel: channel.id,
                reason: "channel has no lineup".to_string(),
            }),
            Err(onair_common::Error::InvalidInput(reason)) => {
                tracing::error!(channel_id = %channel.id, "Corrupt lineup: {}", reason);
                Err(ResolveError::NoCurrentProgram {
                    channel: channel.id,
                    reason,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn materialize(
        &self,
        channel: &Channel,
        lineup: &Lineup,
        located: LocatedItem,
        required_ms: i64,
        now: i64,
    ) -> ResolveResult<StreamLineupItem> {
        let start_offset_ms = located.time_elapsed_ms;
        match located.slot {
            LocatedSlot::Content {
                program,
                slot_duration_ms,
                filler_list_id: Some(list),
                ..
            } => Ok(StreamLineupItem::Commercial(CommercialItem {
                program_id: program.id,
                title: program.title,
                location: program.location,
                filler_list_id: Some(list),
                start_offset_ms,
                stream_duration_ms: required_ms,
                duration_ms: program.duration_ms,
                infinite_loop: program.duration_ms < slot_duration_ms,
            })),
            LocatedSlot::Content {
                program,
                custom_show_id,
                filler_list_id: None,
                ..
            } => {
                let program_left_ms = program.duration_ms - start_offset_ms;
                if program_left_ms <= 0 {
                    // Slot outlasts its program; the overrun airs as flex.
                    tracing::debug!(
                        channel_id = %channel.id,
                        program_id = %program.id,
                        overrun_ms = -program_left_ms,
                        "Slot is past the end of its program"
                    );
                    return self.fill_flex(channel, lineup, required_ms, now).await;
                }
                self.program_item(
                    program,
                    custom_show_id,
                    start_offset_ms,
                    required_ms.min(program_left_ms),
                )
                .await
            }
            LocatedSlot::Offline { .. } => self.fill_flex(channel, lineup, required_ms, now).await,
            LocatedSlot::Redirect {
                channel: target,
                duration_ms,
            } => Ok(StreamLineupItem::Redirect(RedirectItem {
                channel: target,
                duration_ms: duration_ms.min(required_ms),
            })),
        }
    }

    async fn fill_flex(
        &self,
        channel: &Channel,
        lineup: &Lineup,
        required_ms: i64,
        now: i64,
    ) -> ResolveResult<StreamLineupItem> {
        let policy = FlexPolicy {
            channels: self.channels.as_ref(),
            fillers: self.fillers.as_ref(),
            picker: self.picker.as_ref(),
            history: self.cache.as_ref(),
            settings: &self.settings,
        };
        policy.fill(channel, lineup, required_ms, now).await
    }

    async fn program_item(
        &self,
        program: Program,
        custom_show_id: Option<CustomShowId>,
        start_offset_ms: i64,
        stream_duration_ms: i64,
    ) -> ResolveResult<StreamLineupItem> {
        let external_ids = self
            .programs
            .get_program_external_ids(program.id, &self.settings.external_id_sources)
            .await?;

        Ok(StreamLineupItem::Program(ProgramItem {
            program_id: program.id,
            title: program.title,
            location: program.location,
            external_ids,
            custom_show_id,
            start_offset_ms,
            stream_duration_ms,
            duration_ms: program.duration_ms,
        }))
    }
}
