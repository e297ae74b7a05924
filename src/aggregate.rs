//! Batch summary statistics
//!
//! Pure aggregation over a completed batch: counts, per-provider tallies,
//! and the modal quality tier. Nothing here touches the network or mutates
//! its input.

use crate::types::{ProcessingSummary, QualityTier, SearchResult};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Compute summary statistics for a completed batch.
///
/// `provider_ids` is the configured provider set: every listed provider
/// appears in `sources_used`, with a zero count when it contributed nothing.
///
/// The `average_quality` field is the modal tier among found results. Ties
/// break deterministically by preference order (320 > 256 > 192 > 128 >
/// unknown) rather than by map iteration order. A batch with no found
/// results reports `Unknown`.
#[must_use]
pub fn summarize(
    results: &[SearchResult],
    elapsed: Duration,
    estimated_cost_usd: f64,
    provider_ids: &[String],
) -> ProcessingSummary {
    let total_tracks = results.len();
    let found_tracks = results.iter().filter(|r| r.is_found()).count();
    let failed_tracks = total_tracks - found_tracks;

    let mut sources_used: BTreeMap<String, usize> = provider_ids
        .iter()
        .map(|id| (id.clone(), 0))
        .collect();
    for result in results {
        if let Some(provider) = result.provider() {
            *sources_used.entry(provider.to_string()).or_insert(0) += 1;
        }
    }

    let mut quality_tally: HashMap<QualityTier, usize> = HashMap::new();
    for result in results {
        if let Some(quality) = result.quality() {
            *quality_tally.entry(quality).or_insert(0) += 1;
        }
    }
    let average_quality = quality_tally
        .into_iter()
        .max_by(|(tier_a, count_a), (tier_b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| tier_b.preference_rank().cmp(&tier_a.preference_rank()))
        })
        .map(|(tier, _)| tier)
        .unwrap_or(QualityTier::Unknown);

    ProcessingSummary {
        total_tracks,
        found_tracks,
        failed_tracks,
        sources_used,
        average_quality,
        elapsed,
        estimated_cost_usd,
    }
}
