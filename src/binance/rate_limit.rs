// =============================================================================
// Rate-Limit Tracker — observes Binance request weight and 429 responses
// =============================================================================
//
// Binance limits request weight to 6000 per minute per IP; a klines request
// with limit=1000 costs 2.  The tracker reads `X-MBX-USED-WEIGHT-1M` after
// every response and counts throttled (429) responses.  Counters are atomics
// so concurrent fetch tasks can share one tracker lock-free.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Weight at which we start warning in the logs.
const WEIGHT_WARN_THRESHOLD: u32 = 4800;

/// Thread-safe usage tracker backed by atomic counters.
pub struct RateLimitTracker {
    used_weight_1m: AtomicU32,
    throttled_responses: AtomicU32,
    requests_sent: AtomicU32,
}

/// Immutable snapshot of the tracker, logged at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub used_weight_1m: u32,
    pub throttled_responses: u32,
    pub requests_sent: u32,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self {
            used_weight_1m: AtomicU32::new(0),
            throttled_responses: AtomicU32::new(0),
            requests_sent: AtomicU32::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        let total = self.throttled_responses.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(throttled_total = total, "candle source responded 429");
    }

    /// Update the weight counter from the `X-MBX-USED-WEIGHT-1M` header.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let Some(weight) = headers
            .get("X-MBX-USED-WEIGHT-1M")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            return;
        };

        let prev = self.used_weight_1m.swap(weight, Ordering::Relaxed);
        if weight >= WEIGHT_WARN_THRESHOLD && prev < WEIGHT_WARN_THRESHOLD {
            warn!(used_weight = weight, "request weight crossed warning threshold");
        }
        debug!(used_weight_1m = weight, "request weight updated from header");
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            used_weight_1m: self.used_weight_1m.load(Ordering::Relaxed),
            throttled_responses: self.throttled_responses.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("used_weight_1m", &self.used_weight_1m.load(Ordering::Relaxed))
            .field("throttled_responses", &self.throttled_responses.load(Ordering::Relaxed))
            .field("requests_sent", &self.requests_sent.load(Ordering::Relaxed))
            .finish()
    }
}
