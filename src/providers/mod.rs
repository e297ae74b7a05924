//! Track source providers
//!
//! This module provides a trait-based architecture for locating download
//! candidates. The core abstraction is the [`TrackProvider`] trait; provider
//! instances are registered in a priority-ordered list, so adding, removing,
//! or reordering providers is configuration rather than a code change.
//!
//! Implementations:
//!
//! - [`NotsliderProvider`]: the primary provider, scraping a search page for
//!   quality-qualified download links
//! - [`StubProvider`]: placeholder for sources that are part of the waterfall
//!   but not yet implemented (soundcloud, bandcamp)

mod notslider;
mod stub;

pub use notslider::NotsliderProvider;
pub use stub::StubProvider;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{SearchResult, Track};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability interface for one external track source
///
/// Every provider, real or stub, exposes the same contract so the waterfall
/// coordinator can treat the priority list uniformly.
///
/// # Failure semantics
///
/// Expected failure modes (timeout, non-success status, unparseable body,
/// no candidate in the results) resolve to `Ok` with a not-found
/// [`SearchResult`] carrying a descriptive error string. `Err` is reserved
/// for unexpected internal errors and is contained at the coordinator
/// boundary.
#[async_trait]
pub trait TrackProvider: Send + Sync {
    /// Stable provider identifier used for rate limiting, priority
    /// configuration, and reporting
    fn id(&self) -> &str;

    /// Attempt to locate a download candidate for the given track
    async fn search(&self, track: &Track) -> Result<SearchResult>;
}

/// Build the provider set named by `config.resolution.provider_priority`,
/// in priority order.
///
/// # Errors
///
/// Returns a configuration error if the priority list names a provider this
/// build does not know how to construct.
pub fn build_providers(config: &Config) -> Result<Vec<Arc<dyn TrackProvider>>> {
    config
        .resolution
        .provider_priority
        .iter()
        .map(|name| -> Result<Arc<dyn TrackProvider>> {
            match name.as_str() {
                "notslider" => Ok(Arc::new(NotsliderProvider::new(config.notslider.clone())?)),
                "soundcloud" => Ok(Arc::new(StubProvider::soundcloud())),
                "bandcamp" => Ok(Arc::new(StubProvider::bandcamp())),
                other => Err(Error::Config {
                    message: format!("unknown provider '{other}' in priority list"),
                    key: Some("resolution.provider_priority".to_string()),
                }),
            }
        })
        .collect()
}
