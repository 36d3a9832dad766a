/// Where a timestamp falls relative to a channel's repeating cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePosition {
    /// The channel has not started yet; nothing airs for `remaining_ms`.
    NotStarted { remaining_ms: i64 },
    /// Milliseconds into the current cycle, in `[0, total)`.
    Elapsed(i64),
}

/// Fold `timestamp_ms` into the channel's cycle.
///
/// `total_ms` must be positive.
pub fn cycle_elapsed(timestamp_ms: i64, channel_start_ms: i64, total_ms: i64) -> CyclePosition {
    debug_assert!(total_ms > 0, "cycle length must be positive");

    if timestamp_ms < channel_start_ms {
        return CyclePosition::NotStarted {
            remaining_ms: channel_start_ms - timestamp_ms,
        };
    }

    let since = timestamp_ms - channel_start_ms;
    if since < total_ms {
        CyclePosition::Elapsed(since)
    } else {
        CyclePosition::Elapsed(since % total_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_start() {
        assert_eq!(
            cycle_elapsed(1_000, 5_000, 9_000),
            CyclePosition::NotStarted { remaining_ms: 4_000 }
        );
    }

    #[test]
    fn test_within_first_cycle() {
        assert_eq!(cycle_elapsed(5_000, 5_000, 9_000), CyclePosition::Elapsed(0));
        assert_eq!(cycle_elapsed(13_999, 5_000, 9_000), CyclePosition::Elapsed(8_999));
    }

    #[test]
    fn test_wraps_after_cycle() {
        assert_eq!(cycle_elapsed(14_000, 5_000, 9_000), CyclePosition::Elapsed(0));
        assert_eq!(cycle_elapsed(5_000 + 9_000 * 1_000 + 3_000, 5_000, 9_000), CyclePosition::Elapsed(3_000));
    }
}
