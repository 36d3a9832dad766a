//! Per-session attempt throttling.
//!
//! Players that fail to start a stream tend to retry in a tight loop. The
//! throttle counts attempts per (session, item) and reports when a session
//! keeps asking for the same item too quickly.

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use onair_common::StreamLineupItem;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::ThrottleConfig;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Keys kept before idle entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

pub struct AttemptThrottle {
    limiter: Option<KeyedLimiter>,
    error_duration_ms: i64,
}

impl AttemptThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        let limiter = if config.enabled {
            Self::quota(config).map(RateLimiter::keyed)
        } else {
            None
        };
        if config.enabled && limiter.is_none() {
            tracing::warn!(
                max_attempts = config.max_attempts,
                window_secs = config.window_secs,
                "Invalid throttle settings, throttling disabled"
            );
        }

        Self {
            limiter,
            error_duration_ms: config.error_duration_ms,
        }
    }

    /// A throttle that never trips.
    pub fn disabled() -> Self {
        Self {
            limiter: None,
            error_duration_ms: ThrottleConfig::default().error_duration_ms,
        }
    }

    fn quota(config: &ThrottleConfig) -> Option<Quota> {
        let burst = NonZeroU32::new(config.max_attempts)?;
        let period = Duration::from_secs(config.window_secs) / burst.get();
        Some(Quota::with_period(period)?.allow_burst(burst))
    }

    /// How long the throttle error item is shown.
    pub fn error_duration_ms(&self) -> i64 {
        self.error_duration_ms
    }

    /// Count an attempt by `session_token` to start `item` and report whether
    /// the session is over its limit.
    pub fn too_many_attempts(&self, session_token: &str, item: &StreamLineupItem) -> bool {
        let Some(limiter) = &self.limiter else {
            return false;
        };

        if limiter.len() > PRUNE_THRESHOLD {
            limiter.retain_recent();
        }

        let key = attempt_key(session_token, item);
        let throttled = limiter.check_key(&key).is_err();
        if throttled {
            tracing::warn!(session = session_token, kind = %item.kind(), "Too many attempts");
        }
        throttled
    }
}

fn attempt_key(session_token: &str, item: &StreamLineupItem) -> String {
    match item.program_id() {
        Some(program) => format!("{}|{}|{}", session_token, item.kind(), program),
        None => format!("{}|{}", session_token, item.kind()),
    }
}
