use std::{hash::Hash, net::IpAddr, num::NonZeroU32, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};

#[derive(Debug, PartialEq, Eq)]
pub enum RatelimitResult {
    Allowed,
    Disallowed { retry_after: Duration },
}

/// Per-key connection limiter.
pub struct Ratelimiter<K: Hash + Eq + Clone> {
    limiter: RateLimiter<K, DashMapStateStore<K>, DefaultClock>,
    retry_time: Duration,
}

pub type ConnectionLimiter = Ratelimiter<IpAddr>;

impl<K> Ratelimiter<K>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    pub fn new(requests_per_second: u32, retry_time: Duration) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
        Ratelimiter {
            limiter: RateLimiter::keyed(quota),
            retry_time,
        }
    }

    pub fn check(&self, key: &K) -> RatelimitResult {
        match self.limiter.check_key(key) {
            Ok(_) => RatelimitResult::Allowed,
            Err(negative) => {
                let calculated_retry = negative.wait_time_from(DefaultClock::default().now());
                RatelimitResult::Disallowed {
                    retry_after: calculated_retry.max(self.retry_time),
                }
            }
        }
    }

    /// Drops state for keys whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn allowed(limiter: &ConnectionLimiter, ip: [u8; 4]) -> bool {
        limiter.check(&IpAddr::from(ip)) == RatelimitResult::Allowed
    }

    #[test]
    fn addresses_are_limited_independently() {
        let limiter = ConnectionLimiter::new(2, Duration::from_secs(1));
        let a = [10, 0, 0, 1];
        let b = [10, 0, 0, 2];
        let results = [
            allowed(&limiter, a),
            allowed(&limiter, a),
            allowed(&limiter, a),
            allowed(&limiter, b),
            allowed(&limiter, b),
            allowed(&limiter, a),
        ];
        assert_eq!(results, [true, true, false, true, true, false]);
    }

    #[test]
    fn rejection_reports_at_least_the_cooldown() {
        let limiter = ConnectionLimiter::new(1, Duration::from_secs(3));
        let ip = IpAddr::from([192, 168, 0, 7]);
        assert_eq!(limiter.check(&ip), RatelimitResult::Allowed);
        match limiter.check(&ip) {
            RatelimitResult::Disallowed { retry_after } => {
                assert!(retry_after >= Duration::from_secs(3))
            }
            RatelimitResult::Allowed => panic!("second connection should be limited"),
        }
    }

    #[test]
    fn zero_quota_is_treated_as_one() {
        let limiter = ConnectionLimiter::new(0, Duration::from_secs(1));
        assert!(allowed(&limiter, [1, 1, 1, 1]));
        assert!(!allowed(&limiter, [1, 1, 1, 1]));
    }
}
