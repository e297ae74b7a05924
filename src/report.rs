//! Human-readable report formatting
//!
//! Pure serialization of a batch report into the text block shown to the
//! operator at the end of a run.

use crate::types::BatchReport;

/// Render a batch report as a human-readable summary block.
#[must_use]
pub fn format_summary(report: &BatchReport) -> String {
    let summary = &report.summary;
    let success_rate = if summary.total_tracks > 0 {
        summary.found_tracks as f64 / summary.total_tracks as f64 * 100.0
    } else {
        0.0
    };

    let mut out = String::new();
    out.push_str("Track resolution report\n");
    out.push_str(&format!(
        "  Generated: {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "  Tracks: {} total, {} found, {} failed ({success_rate:.1}% success)\n",
        summary.total_tracks, summary.found_tracks, summary.failed_tracks
    ));

    let sources = summary
        .sources_used
        .iter()
        .map(|(provider, count)| format!("{provider} {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("  Sources: {sources}\n"));
    out.push_str(&format!("  Quality: {}\n", summary.average_quality));
    out.push_str(&format!("  Elapsed: {:.1}s\n", summary.elapsed.as_secs_f64()));
    out.push_str(&format!(
        "  Estimated cost: ${:.2}\n",
        summary.estimated_cost_usd
    ));
    out.push('\n');

    for result in &report.results {
        match &result.outcome {
            crate::types::ResolveOutcome::Found(source) => {
                out.push_str(&format!(
                    "  {:02}. [{}] {}\n      {}\n",
                    result.track.ordinal, source.provider, result.track, source.download_url
                ));
            }
            crate::types::ResolveOutcome::NotFound { error } => {
                out.push_str(&format!(
                    "  {:02}. [missed] {}\n      {error}\n",
                    result.track.ordinal, result.track
                ));
            }
        }
    }

    out
}
