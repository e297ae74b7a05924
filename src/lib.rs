//! # mixtape-dl
//!
//! Tracklist resolution library for long-form audio mixes.
//!
//! Given a mix video, mixtape-dl extracts the tracklist from the video's
//! metadata, normalizes the noisy track names through a text-completion
//! model, and resolves each track to a downloadable audio source by querying
//! providers in a fixed priority order (a waterfall search), respecting
//! per-provider rate limits and retry policy. The output is an ordered
//! result list, a processing summary, and a generated download shell script.
//! Nothing is ever downloaded or transcoded by the library itself.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Failure containment** - One track's failure never aborts its
//!   siblings; a batch with zero hits is still a successful run
//! - **Providers are configuration** - Sources implement one capability
//!   trait and are registered in a priority-ordered list
//! - **Event-driven** - Consumers subscribe to progress events, no polling
//!   required
//!
//! ## Quick Start
//!
//! ```no_run
//! use mixtape_dl::{Config, MixtapeResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = MixtapeResolver::new(Config::default())?;
//!
//!     // Subscribe to progress events
//!     let mut events = resolver.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let output = resolver
//!         .process_video("https://video.example/watch?v=abc123")
//!         .await?;
//!     println!("{}", output.summary_text);
//!     std::fs::write("download.sh", output.script)?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch summary statistics
pub mod aggregate;
/// Batch scheduling with bounded concurrent fan-out
pub mod batch;
/// Track-name cleanup via text completion
pub mod cleanup;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Video metadata fetch and tracklist extraction
pub mod extract;
/// Pipeline entry point
pub mod pipeline;
/// Track source providers
pub mod providers;
/// Per-provider request rate limiting
pub mod rate_limiter;
/// Human-readable report formatting
pub mod report;
/// Retry logic with exponential backoff
pub mod retry;
/// Download-script generation
pub mod script;
/// Core types and events
pub mod types;
/// Waterfall coordination across providers
pub mod waterfall;

// Re-export commonly used types
pub use aggregate::summarize;
pub use batch::BatchScheduler;
pub use cleanup::{LlmTrackCleaner, TrackCleaner, heuristic_split};
pub use config::{
    CleanupConfig, Config, MetadataConfig, NotsliderConfig, RateLimitConfig, ResolutionConfig,
    RetryConfig,
};
pub use error::{Error, Result};
pub use extract::{MetadataFetcher, TracklistExtractor, VideoMetadata};
pub use pipeline::{MixtapeResolver, PipelineOutput};
pub use providers::{NotsliderProvider, StubProvider, TrackProvider, build_providers};
pub use rate_limiter::RateLimiter;
pub use report::format_summary;
pub use script::{generate_script, write_script};
pub use types::{
    AudioFormat, BatchReport, CERTAINTY_THRESHOLD, Event, FoundSource, ProcessingSummary,
    QualityTier, RawTrackEntry, ResolveOutcome, SearchResult, Track,
};
pub use waterfall::WaterfallCoordinator;
