//! Per-client import throttling
//!
//! One token bucket per client address, created on first use and kept for
//! the life of the process. Guards the outbound FFLogs API quota; it has no
//! bearing on queue consistency.

use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Keyed rate limiter for import requests
pub struct ClientRateLimiter {
    /// `None` when throttling is disabled (zero period)
    limiter: Option<KeyedLimiter>,
}

impl ClientRateLimiter {
    /// Allow one request per `period` per client, burst of one
    pub fn new(period: Duration) -> Self {
        let limiter = Quota::with_period(period).map(RateLimiter::keyed);
        if limiter.is_none() {
            tracing::warn!("Import rate limiting disabled (zero period)");
        }
        Self { limiter }
    }

    /// Consume a token for `client`, returning whether the request may proceed
    pub fn check(&self, client: &str) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check_key(&client.to_string()).is_ok(),
            None => true,
        }
    }

    /// Number of clients with a bucket
    pub fn tracked_clients(&self) -> usize {
        self.limiter.as_ref().map(|l| l.len()).unwrap_or(0)
    }
}
