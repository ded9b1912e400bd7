use super::types::RateLimitStat;

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Interval after which a bucket is topped up by its full rpm.
pub const REFILL_PERIOD: Duration = Duration::from_secs(60);

/// Token bucket with interval refill.
///
/// Starts full. Tokens are not dripped in continuously: each complete
/// [`REFILL_PERIOD`] since the last refill adds `rpm` tokens, capped at `rpm`.
#[derive(Debug)]
pub struct TokenBucket {
    rpm: u64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    available: u64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rpm: u64) -> Self {
        Self::starting_at(rpm, Instant::now())
    }

    pub fn starting_at(rpm: u64, now: Instant) -> Self {
        Self {
            rpm,
            state: Mutex::new(BucketState {
                available: rpm,
                last_refill: now,
            }),
        }
    }

    pub fn rpm(&self) -> u64 {
        self.rpm
    }

    pub fn try_consume(&self) -> RateLimitStat {
        self.try_consume_at(Instant::now())
    }

    pub fn try_consume_at(&self, now: Instant) -> RateLimitStat {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refill(self.rpm, now);

        if state.available > 0 {
            state.available -= 1;
            return RateLimitStat {
                consumed: true,
                rpm: self.rpm,
                available: state.available,
                nanos_until_refill: 0,
            };
        }

        let wait = (state.last_refill + REFILL_PERIOD).saturating_duration_since(now);
        RateLimitStat {
            consumed: false,
            rpm: self.rpm,
            available: 0,
            nanos_until_refill: u64::try_from(wait.as_nanos()).unwrap_or(u64::MAX),
        }
    }
}

impl BucketState {
    fn refill(&mut self, rpm: u64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let periods = elapsed.as_secs() / REFILL_PERIOD.as_secs();
        if periods == 0 {
            return;
        }
        self.available = self
            .available
            .saturating_add(periods.saturating_mul(rpm))
            .min(rpm);
        self.last_refill += Duration::from_secs(periods.saturating_mul(REFILL_PERIOD.as_secs()));
    }
}
