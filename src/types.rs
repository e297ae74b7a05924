//! Core types for mixtape-dl

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum certainty score for a cleaned track to be considered valid
pub const CERTAINTY_THRESHOLD: f64 = 0.5;

/// A raw tracklist entry extracted from video metadata, before cleanup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTrackEntry {
    /// Stable 1-based position in the tracklist
    pub ordinal: u32,
    /// The raw line text as it appeared in the video description
    pub raw_text: String,
    /// Offset into the mix where the track starts, if the line carried one
    pub timestamp: Option<Duration>,
}

/// A cleaned track ready for resolution
///
/// Immutable once constructed; owned exclusively by the pipeline invocation
/// that created it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable 1-based position in the tracklist
    pub ordinal: u32,
    /// Artist name as normalized by cleanup
    pub artist: String,
    /// Track title as normalized by cleanup
    pub title: String,
    /// Remix/edit annotation, if the raw text carried one
    pub remix: Option<String>,
    /// Confidence score in [0, 1] assigned by the cleanup collaborator
    pub certainty: f64,
}

impl Track {
    /// Whether cleanup was confident enough in this track's artist/title
    /// for resolution to be worth attempting
    #[must_use]
    pub fn is_confident(&self) -> bool {
        self.certainty >= CERTAINTY_THRESHOLD
    }

    /// The search query used by providers: "artist title", with the remix
    /// annotation appended when present
    #[must_use]
    pub fn query(&self) -> String {
        match &self.remix {
            Some(remix) => format!("{} {} {}", self.artist, self.title, remix),
            None => format!("{} {}", self.artist, self.title),
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.remix {
            Some(remix) => write!(f, "{} - {} ({})", self.artist, self.title, remix),
            None => write!(f, "{} - {}", self.artist, self.title),
        }
    }
}

/// Audio quality tier of a resolved download candidate
///
/// A closed set: providers report one of these tiers or `Unknown`, never a
/// free-form bitrate string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// 320 kbit/s
    #[serde(rename = "320kbps")]
    Kbps320,
    /// 256 kbit/s
    #[serde(rename = "256kbps")]
    Kbps256,
    /// 192 kbit/s
    #[serde(rename = "192kbps")]
    Kbps192,
    /// 128 kbit/s
    #[serde(rename = "128kbps")]
    Kbps128,
    /// Bitrate could not be determined
    #[serde(rename = "unknown")]
    Unknown,
}

impl QualityTier {
    /// Preference rank used to break ties when computing the modal quality
    /// tier: 320 > 256 > 192 > 128 > unknown. Lower rank wins.
    #[must_use]
    pub fn preference_rank(&self) -> u8 {
        match self {
            QualityTier::Kbps320 => 0,
            QualityTier::Kbps256 => 1,
            QualityTier::Kbps192 => 2,
            QualityTier::Kbps128 => 3,
            QualityTier::Unknown => 4,
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QualityTier::Kbps320 => "320kbps",
            QualityTier::Kbps256 => "256kbps",
            QualityTier::Kbps192 => "192kbps",
            QualityTier::Kbps128 => "128kbps",
            QualityTier::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Container format of a resolved download candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG-1 Audio Layer III
    Mp3,
    /// MPEG-4 Audio (AAC)
    M4a,
    /// Opus in an Ogg container
    Opus,
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
        };
        write!(f, "{s}")
    }
}

/// A download candidate located by a provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoundSource {
    /// Identifier of the provider that located the candidate
    pub provider: String,
    /// Resolved download URL (post-redirect when the probe succeeded)
    pub download_url: String,
    /// Quality tier the provider guarantees for this candidate
    pub quality: QualityTier,
    /// Container format of the candidate
    pub format: AudioFormat,
    /// Track duration, when the provider reported it
    pub duration: Option<Duration>,
    /// File size in bytes, when the provider reported it
    pub size_bytes: Option<u64>,
}

/// Outcome of resolving one track
///
/// The enum shape encodes the result invariant in the type system: a
/// download URL and source provider exist exactly when the track was found,
/// and a failure explanation exists exactly when it was not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResolveOutcome {
    /// A provider located a download candidate
    Found(FoundSource),
    /// Every provider was tried and none produced a candidate
    NotFound {
        /// Concatenated per-provider failure explanation
        error: String,
    },
}

/// Result of resolving one track, carrying the same ordinal as its input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The track this result belongs to
    pub track: Track,
    /// Whether and where a download candidate was located
    pub outcome: ResolveOutcome,
}

impl SearchResult {
    /// Construct a found result
    #[must_use]
    pub fn found(track: Track, source: FoundSource) -> Self {
        Self {
            track,
            outcome: ResolveOutcome::Found(source),
        }
    }

    /// Construct a not-found result with a failure explanation
    #[must_use]
    pub fn not_found(track: Track, error: impl Into<String>) -> Self {
        Self {
            track,
            outcome: ResolveOutcome::NotFound {
                error: error.into(),
            },
        }
    }

    /// Whether a download candidate was located
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, ResolveOutcome::Found(_))
    }

    /// Identifier of the providing source, if found
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match &self.outcome {
            ResolveOutcome::Found(source) => Some(&source.provider),
            ResolveOutcome::NotFound { .. } => None,
        }
    }

    /// The resolved download URL, if found
    #[must_use]
    pub fn download_url(&self) -> Option<&str> {
        match &self.outcome {
            ResolveOutcome::Found(source) => Some(&source.download_url),
            ResolveOutcome::NotFound { .. } => None,
        }
    }

    /// Quality tier of the candidate, if found
    #[must_use]
    pub fn quality(&self) -> Option<QualityTier> {
        match &self.outcome {
            ResolveOutcome::Found(source) => Some(source.quality),
            ResolveOutcome::NotFound { .. } => None,
        }
    }

    /// The failure explanation, if not found
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ResolveOutcome::Found(_) => None,
            ResolveOutcome::NotFound { error } => Some(error),
        }
    }
}

/// Summary statistics over a completed batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Total number of tracks in the batch
    pub total_tracks: usize,
    /// Number of tracks resolved to a download candidate
    pub found_tracks: usize,
    /// Number of tracks no provider could resolve
    pub failed_tracks: usize,
    /// Found-track counts per provider, over the configured provider set.
    /// Providers with zero hits appear with count 0. BTreeMap keeps the
    /// iteration order deterministic.
    pub sources_used: std::collections::BTreeMap<String, usize>,
    /// Modal quality tier among found tracks (the field keeps its legacy
    /// name; it is a mode, not an average). Ties break by preference order
    /// 320 > 256 > 192 > 128 > unknown.
    pub average_quality: QualityTier,
    /// Wall-clock time the batch took
    pub elapsed: Duration,
    /// Estimated cleanup/API cost in USD, supplied by the caller
    pub estimated_cost_usd: f64,
}

/// Ordered batch results plus their derived summary
///
/// `results[i]` corresponds to the i-th input track; the ordering is an
/// invariant of the scheduler, not incidental.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// Per-track results, in input order
    pub results: Vec<SearchResult>,
    /// Derived summary statistics
    pub summary: ProcessingSummary,
}

/// Progress events emitted by the pipeline
///
/// Consumers subscribe via [`crate::MixtapeResolver::subscribe`]; no polling
/// required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A track was resolved to a download candidate
    TrackResolved {
        /// Ordinal of the resolved track
        ordinal: u32,
        /// Provider that located the candidate
        provider: String,
    },
    /// Every provider missed on a track
    TrackFailed {
        /// Ordinal of the failed track
        ordinal: u32,
    },
    /// A concurrency chunk finished
    ChunkCompleted {
        /// Number of tracks completed so far
        completed: usize,
        /// Total number of tracks in the batch
        total: usize,
    },
    /// The whole batch finished
    BatchCompleted {
        /// Number of tracks resolved
        found: usize,
        /// Number of tracks failed
        failed: usize,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn track(ordinal: u32) -> Track {
        Track {
            ordinal,
            artist: "Boards of Canada".into(),
            title: "Roygbiv".into(),
            remix: None,
            certainty: 0.9,
        }
    }

    #[test]
    fn confidence_threshold_is_inclusive() {
        let mut t = track(1);
        t.certainty = 0.5;
        assert!(t.is_confident(), "certainty exactly 0.5 should be valid");

        t.certainty = 0.49;
        assert!(!t.is_confident());
    }

    #[test]
    fn query_includes_remix_when_present() {
        let mut t = track(1);
        assert_eq!(t.query(), "Boards of Canada Roygbiv");

        t.remix = Some("Aphex Twin Remix".into());
        assert_eq!(t.query(), "Boards of Canada Roygbiv Aphex Twin Remix");
    }

    #[test]
    fn display_formats_artist_title_and_remix() {
        let mut t = track(1);
        assert_eq!(t.to_string(), "Boards of Canada - Roygbiv");

        t.remix = Some("VIP Mix".into());
        assert_eq!(t.to_string(), "Boards of Canada - Roygbiv (VIP Mix)");
    }

    #[test]
    fn quality_tier_display_matches_closed_set() {
        assert_eq!(QualityTier::Kbps320.to_string(), "320kbps");
        assert_eq!(QualityTier::Kbps256.to_string(), "256kbps");
        assert_eq!(QualityTier::Kbps192.to_string(), "192kbps");
        assert_eq!(QualityTier::Kbps128.to_string(), "128kbps");
        assert_eq!(QualityTier::Unknown.to_string(), "unknown");
    }

    #[test]
    fn quality_tier_preference_order_is_total_and_descending() {
        let ordered = [
            QualityTier::Kbps320,
            QualityTier::Kbps256,
            QualityTier::Kbps192,
            QualityTier::Kbps128,
            QualityTier::Unknown,
        ];
        for pair in ordered.windows(2) {
            assert!(
                pair[0].preference_rank() < pair[1].preference_rank(),
                "{} should rank ahead of {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn found_result_exposes_url_and_provider() {
        let result = SearchResult::found(
            track(3),
            FoundSource {
                provider: "notslider".into(),
                download_url: "https://cdn.example.com/a.mp3".into(),
                quality: QualityTier::Kbps320,
                format: AudioFormat::Mp3,
                duration: None,
                size_bytes: None,
            },
        );

        assert!(result.is_found());
        assert_eq!(result.provider(), Some("notslider"));
        assert_eq!(result.download_url(), Some("https://cdn.example.com/a.mp3"));
        assert_eq!(result.quality(), Some(QualityTier::Kbps320));
        assert_eq!(result.error(), None);
    }

    #[test]
    fn not_found_result_exposes_error_only() {
        let result = SearchResult::not_found(track(4), "notslider: no results");

        assert!(!result.is_found());
        assert_eq!(result.provider(), None);
        assert_eq!(result.download_url(), None);
        assert_eq!(result.quality(), None);
        assert_eq!(result.error(), Some("notslider: no results"));
    }

    #[test]
    fn search_result_serializes_with_status_tag() {
        let result = SearchResult::not_found(track(2), "nothing");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["status"], "notfound");
        assert_eq!(json["outcome"]["error"], "nothing");
    }

    #[test]
    fn quality_tier_serializes_as_bitrate_string() {
        let json = serde_json::to_string(&QualityTier::Kbps320).unwrap();
        assert_eq!(json, "\"320kbps\"");
        let back: QualityTier = serde_json::from_str("\"256kbps\"").unwrap();
        assert_eq!(back, QualityTier::Kbps256);
    }
}
