//! Offset index lookups.

use onair_common::Lineup;

/// Index of the last item whose start offset is `<= elapsed_ms`.
///
/// Zero-length items share their offset with the next item and are never
/// selected over it. Returns `None` for an empty offset array.
pub fn locate_index(offsets: &[i64], elapsed_ms: i64) -> Option<usize> {
    if offsets.is_empty() {
        return None;
    }
    if offsets.len() == 1 {
        return Some(0);
    }
    let after = offsets.partition_point(|&offset| offset <= elapsed_ms);
    Some(after.saturating_sub(1))
}

/// A resolved slot inside a lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPosition {
    pub index: usize,
    /// How far into the slot the position is.
    pub elapsed_ms: i64,
    /// Time until the slot ends.
    pub stream_duration_ms: i64,
}

/// Map a position within the cycle onto a lineup slot.
///
/// When the located slot ends within `slack_ms`, playback starts at the
/// beginning of the next non-empty slot instead (wrapping past the last one),
/// so a stream never opens on the last few seconds of an item.
pub fn position_in(lineup: &Lineup, elapsed_ms: i64, slack_ms: i64) -> Option<SlotPosition> {
    let items = lineup.items();
    let mut index = locate_index(lineup.offsets(), elapsed_ms)?;
    let mut into = elapsed_ms - lineup.offsets()[index];

    if items[index].duration_ms() - into <= slack_ms {
        index = (1..=items.len())
            .map(|step| (index + step) % items.len())
            .find(|&i| items[i].duration_ms() > 0)
            .unwrap_or((index + 1) % items.len());
        into = 0;
    }

    Some(SlotPosition {
        index,
        elapsed_ms: into,
        stream_duration_ms: items[index].duration_ms() - into,
    })
}
