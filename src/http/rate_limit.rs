//! Outbound request throttling
//!
//! Token bucket throttle built on the governor crate. Some upstream APIs
//! (vulnerability scanners in particular) drop sessions under bursty polling,
//! so feeds can cap their request rate.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for the outbound throttle
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 10,
        }
    }
}

impl ThrottleConfig {
    /// Create a new throttle config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Config for APIs that tolerate exactly one request per second
    pub fn one_per_second() -> Self {
        Self {
            requests_per_second: 1,
            burst_size: 1,
        }
    }
}

/// Token bucket throttle for outbound requests
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl Throttle {
    /// Create a new throttle with the given config
    pub fn new(config: &ThrottleConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap()),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::new(1).unwrap()));

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle").finish()
    }
}

#[cfg(test)]
mod throttle_tests {
    use super::*;

    #[test]
    fn test_throttle_config_default() {
        let config = ThrottleConfig::default();
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.burst_size, 10);
    }

    #[test]
    fn test_throttle_config_one_per_second() {
        let config = ThrottleConfig::one_per_second();
        assert_eq!(config.requests_per_second, 1);
        assert_eq!(config.burst_size, 1);
    }

    #[tokio::test]
    async fn test_throttle_allows_burst() {
        let throttle = Throttle::new(&ThrottleConfig::new(10, 5));

        for _ in 0..5 {
            assert!(throttle.try_acquire());
        }
    }

    #[tokio::test]
    async fn test_throttle_wait() {
        let throttle = Throttle::new(&ThrottleConfig::new(100, 10));

        // Should complete without blocking (within burst)
        throttle.wait().await;
    }
}
