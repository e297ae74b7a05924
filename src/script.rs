//! Download-script generation
//!
//! Pure serialization of a batch report into POSIX shell text: one fetch
//! command per found track, comment lines for the misses. The library never
//! executes the script or downloads anything itself.

use crate::error::Result;
use crate::types::BatchReport;
use std::path::Path;

/// Directory the generated script downloads into
const TARGET_DIR: &str = "downloads";

/// Render a batch report as a runnable shell script.
///
/// Found tracks become `curl` commands with a numbered, sanitized output
/// filename; failed tracks are kept as comments so the script documents the
/// whole tracklist.
#[must_use]
pub fn generate_script(report: &BatchReport) -> String {
    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    script.push_str("# Generated by mixtape-dl\n");
    script.push_str(&format!(
        "# {} tracks: {} found, {} failed\n",
        report.summary.total_tracks, report.summary.found_tracks, report.summary.failed_tracks
    ));
    script.push_str(&format!(
        "# Generated at {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    script.push_str("set -e\n");
    script.push_str(&format!("mkdir -p \"{TARGET_DIR}\"\n\n"));

    for result in &report.results {
        match &result.outcome {
            crate::types::ResolveOutcome::Found(source) => {
                let filename = format!(
                    "{:02} - {}.{}",
                    result.track.ordinal,
                    sanitize_filename(&result.track.to_string()),
                    source.format
                );
                script.push_str(&format!("# {:02}: {} [{}]\n", result.track.ordinal, result.track, source.provider));
                script.push_str(&format!(
                    "curl -L --fail -o \"{TARGET_DIR}/{filename}\" \"{}\"\n\n",
                    source.download_url
                ));
            }
            crate::types::ResolveOutcome::NotFound { error } => {
                script.push_str(&format!(
                    "# {:02}: {} - not found ({error})\n\n",
                    result.track.ordinal, result.track
                ));
            }
        }
    }

    script
}

/// Strip characters that are unsafe in filenames or would break the quoted
/// shell string
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '$' | '`' => '_',
            c => c,
        })
        .collect()
}

/// Write the generated script to disk.
///
/// On Unix the script is marked executable.
pub fn write_script(report: &BatchReport, path: &Path) -> Result<()> {
    let script = generate_script(report);
    std::fs::write(path, &script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    tracing::info!(path = %path.display(), bytes = script.len(), "download script written");
    Ok(())
}
