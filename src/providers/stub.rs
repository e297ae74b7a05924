//! Stub providers for sources not yet implemented
//!
//! These hold a place in the waterfall for sources the deployment knows
//! about but cannot search yet. They expose the same contract shape as the
//! real providers, so the coordinator needs no per-provider branching and a
//! future real implementation is a drop-in replacement.

use super::TrackProvider;
use crate::error::Result;
use crate::types::{SearchResult, Track};
use async_trait::async_trait;

/// A provider that always reports not-found with a fixed explanation
pub struct StubProvider {
    id: &'static str,
    message: &'static str,
}

impl StubProvider {
    /// SoundCloud placeholder
    #[must_use]
    pub fn soundcloud() -> Self {
        Self {
            id: "soundcloud",
            message: "soundcloud search is not implemented yet",
        }
    }

    /// Bandcamp placeholder
    #[must_use]
    pub fn bandcamp() -> Self {
        Self {
            id: "bandcamp",
            message: "bandcamp search is not implemented yet",
        }
    }
}

#[async_trait]
impl TrackProvider for StubProvider {
    fn id(&self) -> &str {
        self.id
    }

    async fn search(&self, track: &Track) -> Result<SearchResult> {
        tracing::debug!(provider = %self.id, ordinal = track.ordinal, "stub provider skipped");
        Ok(SearchResult::not_found(track.clone(), self.message))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            ordinal: 2,
            artist: "Four Tet".into(),
            title: "Angel Echoes".into(),
            remix: None,
            certainty: 0.8,
        }
    }

    #[tokio::test]
    async fn soundcloud_stub_always_misses_with_fixed_message() {
        let provider = StubProvider::soundcloud();

        assert_eq!(provider.id(), "soundcloud");
        let result = provider.search(&track()).await.unwrap();
        assert!(!result.is_found());
        assert_eq!(
            result.error(),
            Some("soundcloud search is not implemented yet")
        );
    }

    #[tokio::test]
    async fn bandcamp_stub_always_misses_with_fixed_message() {
        let provider = StubProvider::bandcamp();

        assert_eq!(provider.id(), "bandcamp");
        let result = provider.search(&track()).await.unwrap();
        assert!(!result.is_found());
        assert_eq!(
            result.error(),
            Some("bandcamp search is not implemented yet")
        );
    }

    #[tokio::test]
    async fn stub_result_preserves_the_input_track() {
        let provider = StubProvider::soundcloud();
        let input = track();
        let result = provider.search(&input).await.unwrap();
        assert_eq!(result.track, input);
    }
}
