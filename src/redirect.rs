//! Following redirect slots across channels.
//!
//! A redirect slot airs whatever its target channel is airing. Chains are
//! followed until a non-redirect slot is found. The stream duration handed
//! back never exceeds the shortest redirect window crossed on the way, so
//! the viewer comes back in time for the next decision on the source
//! channel.

use onair_common::{Channel, ChannelId, Lineup};

use crate::error::{ResolveError, ResolveResult};
use crate::lineup::{LocatedItem, LocatedSlot, Locator};
use crate::storage::ChannelStore;

/// Result of following a redirect chain.
#[derive(Debug, Clone)]
pub enum RedirectOutcome {
    /// A non-redirect slot was reached on `channel`.
    Resolved {
        channel: Channel,
        lineup: Lineup,
        located: LocatedItem,
        /// Shortest redirect window crossed, if any redirect was followed.
        bound_ms: Option<i64>,
    },
    /// The chain revisited a channel or ran past the hop limit.
    Recursive { chain: Vec<ChannelId> },
}

impl RedirectOutcome {
    pub fn is_recursive(&self) -> bool {
        matches!(self, Self::Recursive { .. })
    }
}

pub struct RedirectResolver<'a> {
    channels: &'a dyn ChannelStore,
    locator: &'a Locator<'a>,
}

impl<'a> RedirectResolver<'a> {
    pub fn new(channels: &'a dyn ChannelStore, locator: &'a Locator<'a>) -> Self {
        Self { channels, locator }
    }

    /// Locate the item airing on `channel` at `timestamp_ms`, following
    /// redirects.
    ///
    /// A chain is cut off when it revisits a channel or after as many hops
    /// as there are channels. A missing redirect target is an error.
    pub async fn resolve(
        &self,
        channel: Channel,
        lineup: Lineup,
        timestamp_ms: i64,
    ) -> ResolveResult<RedirectOutcome> {
        let mut located = self.locator.locate(&channel, &lineup, timestamp_ms).await?;
        if !matches!(located.slot, LocatedSlot::Redirect { .. }) {
            return Ok(RedirectOutcome::Resolved {
                channel,
                lineup,
                located,
                bound_ms: None,
            });
        }

        let max_hops = self.channels.channel_count().await?.max(1);
        let mut chain = vec![channel.id];
        let mut bound_ms: Option<i64> = None;
        let mut current = (channel, lineup);

        while let LocatedSlot::Redirect { channel: target, .. } = located.slot {
            bound_ms = Some(bound_ms.map_or(located.stream_duration_ms, |b| {
                b.min(located.stream_duration_ms)
            }));

            if chain.contains(&target) || chain.len() > max_hops {
                chain.push(target);
                tracing::warn!(
                    channel_id = %chain[0],
                    hops = chain.len() - 1,
                    "Recursive channel redirect"
                );
                return Ok(RedirectOutcome::Recursive { chain });
            }

            tracing::debug!(from = %current.0.id, to = %target, "Following redirect");
            current = self
                .channels
                .load_channel_and_lineup(target)
                .await?
                .ok_or(ResolveError::ChannelNotFound(target))?;
            chain.push(target);

            located = self
                .locator
                .locate(&current.0, &current.1, timestamp_ms)
                .await?;
        }

        let (channel, lineup) = current;
        Ok(RedirectOutcome::Resolved {
            channel,
            lineup,
            located,
            bound_ms,
        })
    }
}
