//! Per-provider request rate limiting
//!
//! Each provider has a configured minimum interval between dispatches.
//! Callers suspend in [`RateLimiter::throttle`] until the interval since the
//! provider's last recorded dispatch has elapsed. Concurrent callers for the
//! same provider serialize their waits (the per-provider gate is held across
//! the sleep), so no two dispatches to one provider can land closer together
//! than its configured delay even under the batch scheduler's fan-out.
//! Callers for distinct providers never wait on each other.
//!
//! One `RateLimiter` instance is owned per pipeline and passed down by
//! handle; there is no process-wide singleton.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Per-provider minimum-interval gate
pub struct RateLimiter {
    /// Configured minimum delay per provider identifier
    min_delays: HashMap<String, Duration>,
    /// Per-provider gate: last dispatch time behind an async mutex.
    /// The outer lock is only held long enough to fetch or create a gate;
    /// the inner lock is held across the wait.
    gates: Mutex<HashMap<String, Arc<Mutex<Option<Instant>>>>>,
}

impl RateLimiter {
    /// Create a limiter from a provider → minimum-delay map
    #[must_use]
    pub fn new(min_delays: HashMap<String, Duration>) -> Self {
        Self {
            min_delays,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Suspend until it is safe to issue the next request to `provider`,
    /// then record the dispatch time.
    ///
    /// Unrecognized provider identifiers are logged and pass through without
    /// throttling; a misconfigured provider must not block the others.
    pub async fn throttle(&self, provider: &str) {
        let Some(min_delay) = self.min_delays.get(provider).copied() else {
            tracing::warn!(provider = %provider, "no rate limit configured, not throttling");
            return;
        };

        let gate = {
            let mut gates = self.gates.lock().await;
            gates
                .entry(provider.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };

        // Holding the gate across the sleep serializes concurrent callers
        // for this provider; the interval invariant holds under fan-out.
        let mut last_dispatch = gate.lock().await;
        if let Some(last) = *last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < min_delay {
                let wait = min_delay - elapsed;
                tracing::debug!(
                    provider = %provider,
                    wait_ms = wait.as_millis(),
                    "throttling request"
                );
                tokio::time::sleep(wait).await;
            }
        }
        *last_dispatch = Some(Instant::now());
    }

    /// Time remaining before the next call to `provider` would proceed
    /// without waiting. Side-effect free; returns zero for unknown or
    /// never-dispatched providers.
    pub async fn remaining(&self, provider: &str) -> Duration {
        let Some(min_delay) = self.min_delays.get(provider).copied() else {
            return Duration::ZERO;
        };

        let gate = {
            let gates = self.gates.lock().await;
            match gates.get(provider) {
                Some(gate) => gate.clone(),
                None => return Duration::ZERO,
            }
        };

        let last_dispatch = gate.lock().await;
        match *last_dispatch {
            Some(last) => min_delay.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Forget all recorded dispatch times (test isolation)
    pub async fn reset(&self) {
        self.gates.lock().await.clear();
    }
}
