use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};
use std::hash::Hash;
use std::num::NonZeroU32;
use std::time::Duration;

#[derive(Debug, PartialEq, Eq)]
pub enum RatelimitResult {
    Allowed,
    Disallowed { retry_after: Duration },
}

/// Tracked keys above which fully replenished entries are dropped.
const PRUNE_ABOVE: usize = 4096;

/// Keyed token bucket; each key gets `per_second` cells with the same burst.
pub struct Ratelimiter<K: Hash + Eq + Clone> {
    limiter: RateLimiter<K, DashMapStateStore<K>, DefaultClock>,
    retry_time: Duration,
    prune_above: usize,
}

impl<K> Ratelimiter<K>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    pub fn new(per_second: NonZeroU32, retry_time: Duration) -> Self {
        let quota = Quota::per_second(per_second);
        let limiter = RateLimiter::keyed(quota);
        Ratelimiter {
            limiter,
            retry_time,
            prune_above: PRUNE_ABOVE,
        }
    }

    /// Builds a limiter from a configured rate, where `0` means unlimited.
    pub fn from_rate(per_second: u32) -> Option<Self> {
        NonZeroU32::new(per_second).map(|rate| Self::new(rate, Duration::from_secs(1)))
    }

    pub fn check(&self, key: &K) -> RatelimitResult {
        if self.limiter.len() > self.prune_above {
            self.limiter.retain_recent();
        }
        match self.limiter.check_key(key) {
            Ok(_) => RatelimitResult::Allowed,
            Err(negative) => {
                let calculated_retry = negative.wait_time_from(DefaultClock::default().now());
                let retry_after = calculated_retry.max(self.retry_time);
                RatelimitResult::Disallowed { retry_after }
            }
        }
    }

    /// Number of keys currently holding state.
    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}

#[cfg(test)]
mod test {
    use super::{RatelimitResult, Ratelimiter};
    use std::net::{IpAddr, Ipv4Addr};

    fn run_test(limit: u32, keys: Vec<IpAddr>, expected: Vec<bool>) {
        let limiter = Ratelimiter::from_rate(limit).unwrap();
        let results: Vec<bool> = keys
            .iter()
            .map(|k| match limiter.check(k) {
                RatelimitResult::Allowed => true,
                RatelimitResult::Disallowed { .. } => false,
            })
            .collect();
        assert_eq!(results, expected);
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    #[test]
    fn burst_is_tracked_per_source() {
        // limit = 3 per second; the fourth event from .1 is suppressed
        let keys = vec![ip(1), ip(1), ip(1), ip(2), ip(2), ip(1), ip(2)];
        let expected = vec![true, true, true, true, true, false, true];
        run_test(3, keys, expected);
    }

    #[test]
    fn limit_one_allows_a_single_event() {
        let keys = vec![ip(1), ip(2), ip(1), ip(2), ip(1)];
        let expected = vec![true, true, false, false, false];
        run_test(1, keys, expected);
    }

    #[test]
    fn idle_keys_are_pruned_past_the_threshold() {
        let mut limiter = Ratelimiter::from_rate(1000).unwrap();
        limiter.prune_above = 2;
        limiter.check(&ip(1));
        limiter.check(&ip(2));
        limiter.check(&ip(3));
        assert_eq!(limiter.tracked(), 3);

        // one cell comes back every millisecond at this rate
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(limiter.check(&ip(4)), RatelimitResult::Allowed);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn zero_rate_disables_the_limiter() {
        assert!(Ratelimiter::<IpAddr>::from_rate(0).is_none());
    }
}
