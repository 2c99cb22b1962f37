use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

type KeyedLimiter<C> =
    RateLimiter<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Keyed attempt limiter for login endpoints: `max_attempts` per `window`, per key.
///
/// The whole allowance refills one attempt per `window`, so no span shorter than the window
/// admits more than `max_attempts`.
pub struct LoginThrottle<C: Clock = DefaultClock> {
    limiter: KeyedLimiter<C>,
    clock: C,
}

impl LoginThrottle {
    pub fn new(max_attempts: NonZeroU32, window: Duration) -> Self {
        Self::with_clock(max_attempts, window, &DefaultClock::default())
    }

    /// Five attempts per fifteen minutes.
    pub fn admin_default() -> Self {
        Self::new(NonZeroU32::MIN.saturating_add(4), Duration::from_secs(15 * 60))
    }
}

impl<C: Clock> LoginThrottle<C> {
    pub fn with_clock(max_attempts: NonZeroU32, window: Duration, clock: &C) -> Self {
        let quota = Quota::with_period(window)
            .unwrap_or_else(|| Quota::per_second(max_attempts))
            .allow_burst(max_attempts);

        Self {
            limiter: RateLimiter::new(quota, DefaultKeyedStateStore::default(), clock),
            clock: clock.clone(),
        }
    }

    /// Records an attempt; on exhaustion returns how long the caller must wait.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

/// Whole minutes to report to a throttled client, never zero.
pub fn minutes_remaining(wait: Duration) -> u64 {
    wait.as_secs().div_ceil(60).max(1)
}

impl<C: Clock> std::fmt::Debug for LoginThrottle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginThrottle").finish_non_exhaustive()
    }
}
