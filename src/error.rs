//! Resolution errors and recovered conditions.

use onair_common::{ChannelId, ProgramId};
use thiserror::Error;

/// Failures that abort a stream-start request.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    /// The channel's lineup cannot be located against: empty, zero length
    /// or corrupt stored offsets.
    #[error("No current program on channel {channel}: {reason}")]
    NoCurrentProgram { channel: ChannelId, reason: String },

    #[error(transparent)]
    Storage(#[from] onair_common::Error),
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Conditions the resolver recovered from while still producing a playable
/// item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredCondition {
    /// A redirect chain looped back on itself or exceeded the hop limit.
    RecursiveRedirect { chain: Vec<ChannelId> },
    /// A content slot points at a program that is missing or unplayable.
    MissingBackingProgram { program: ProgramId },
    /// The session asked for the same item too often.
    ThrottledAttempt,
}
