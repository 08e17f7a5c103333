//! Rate limiting for the data endpoint.
//!
//! Each client IP gets its own token bucket from the `governor` crate. A
//! refused request is not an error: the handler answers it from cache.

use dashmap::DashMap;
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::net::IpAddr;
use std::num::NonZeroU32;
use tracing::debug;

/// Type alias for governor's direct rate limiter.
type DirectRateLimiter = governor::DefaultDirectRateLimiter;

/// Entries kept before [`RequestLimiter::cleanup`] starts over.
const MAX_ENTRIES: usize = 10_000;

/// Thread-safe per-IP request limiter.
#[derive(Debug)]
pub struct RequestLimiter {
    limiters: DashMap<IpAddr, DirectRateLimiter>,
    per_second: NonZeroU32,
}

impl RequestLimiter {
    /// Allow `per_second` requests per IP per second (at least one).
    pub fn new(per_second: u32) -> Self {
        Self {
            limiters: DashMap::new(),
            per_second: NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN),
        }
    }

    /// Check if `ip` may make a request now.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    pub fn check(&self, ip: IpAddr) -> bool {
        let limiter = self
            .limiters
            .entry(ip)
            .or_insert_with(|| GovRateLimiter::direct(Quota::per_second(self.per_second)));

        let allowed = limiter.check().is_ok();
        if !allowed {
            debug!(ip = %ip, "request rate limit exceeded");
        }
        allowed
    }

    /// Cleanup old entries to prevent memory growth.
    ///
    /// Call periodically from a maintenance task.
    pub fn cleanup(&self) {
        // Simple strategy: if we have too many entries, clear them all
        if self.limiters.len() > MAX_ENTRIES {
            self.limiters.clear();
            debug!("cleared request rate limiters (exceeded {} entries)", MAX_ENTRIES);
        }
    }

    /// Number of tracked IPs.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether no IP is tracked.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

impl Default for RequestLimiter {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_request_per_second() {
        let limiter = RequestLimiter::default();
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        assert!(limiter.check(ip));
        // Second request within the same second is refused
        assert!(!limiter.check(ip));
    }

    #[test]
    fn test_ips_are_independent() {
        let limiter = RequestLimiter::default();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(limiter.check(a));
        assert!(limiter.check(b));
        assert!(!limiter.check(a));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn test_zero_rate_clamps_to_one() {
        let limiter = RequestLimiter::new(0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(limiter.check(ip));
        assert!(!limiter.check(ip));
    }

    #[test]
    fn test_cleanup_keeps_small_maps() {
        let limiter = RequestLimiter::default();
        limiter.check("127.0.0.1".parse().unwrap());
        limiter.cleanup();
        assert_eq!(limiter.len(), 1);
    }
}
