//! Waterfall coordination: one track, providers in priority order
//!
//! The coordinator walks the provider list top to bottom, throttling before
//! each attempt, and stops at the first hit. A full miss produces a single
//! not-found result whose error names every provider tried and why it
//! missed, so operators can see which layer failed. Failures never cross
//! track boundaries: whatever happens inside one `resolve_one` call is
//! contained in that track's result.

use crate::providers::TrackProvider;
use crate::rate_limiter::RateLimiter;
use crate::types::{SearchResult, Track};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One resolution try at one provider, kept only long enough to build the
/// aggregate error message for a full miss
struct ProviderAttempt {
    provider: String,
    error: String,
    elapsed: Duration,
}

/// Tries providers in priority order until one succeeds or all fail
pub struct WaterfallCoordinator {
    providers: Vec<Arc<dyn TrackProvider>>,
    rate_limiter: Arc<RateLimiter>,
}

impl WaterfallCoordinator {
    /// Create a coordinator over a priority-ordered provider list
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn TrackProvider>>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            providers,
            rate_limiter,
        }
    }

    /// Identifiers of the configured providers, in priority order
    #[must_use]
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.id().to_string()).collect()
    }

    /// Resolve one track through the provider waterfall
    ///
    /// Returns the first provider's hit verbatim, or a synthesized not-found
    /// result concatenating every provider's failure detail. An `Err`
    /// escaping a provider (contract violation) is logged and treated as
    /// that provider's miss.
    pub async fn resolve_one(&self, track: &Track) -> SearchResult {
        let mut attempts: Vec<ProviderAttempt> = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            self.rate_limiter.throttle(provider.id()).await;

            let started = Instant::now();
            match provider.search(track).await {
                Ok(result) if result.is_found() => {
                    tracing::debug!(
                        ordinal = track.ordinal,
                        provider = %provider.id(),
                        elapsed_ms = started.elapsed().as_millis(),
                        "track resolved"
                    );
                    return result;
                }
                Ok(result) => {
                    attempts.push(ProviderAttempt {
                        provider: provider.id().to_string(),
                        error: result
                            .error()
                            .unwrap_or("no candidate found")
                            .to_string(),
                        elapsed: started.elapsed(),
                    });
                }
                Err(e) => {
                    // Providers contract to return not-found rather than
                    // raise; contain the violation to this track
                    tracing::warn!(
                        ordinal = track.ordinal,
                        provider = %provider.id(),
                        error = %e,
                        "provider raised instead of returning a result"
                    );
                    attempts.push(ProviderAttempt {
                        provider: provider.id().to_string(),
                        error: format!("internal error: {e}"),
                        elapsed: started.elapsed(),
                    });
                }
            }
        }

        for attempt in &attempts {
            tracing::debug!(
                ordinal = track.ordinal,
                provider = %attempt.provider,
                elapsed_ms = attempt.elapsed.as_millis(),
                error = %attempt.error,
                "waterfall attempt failed"
            );
        }
        let error = aggregate_error(&attempts);
        tracing::debug!(ordinal = track.ordinal, error = %error, "all providers missed");
        SearchResult::not_found(track.clone(), error)
    }
}

/// Concatenate per-provider failure detail into one diagnosable message
fn aggregate_error(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no providers configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}
