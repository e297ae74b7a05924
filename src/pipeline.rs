//! Pipeline entry point
//!
//! [`MixtapeResolver`] owns the provider registry, the rate limiter, and the
//! event channel for one deployment, and runs the stages in order: extract,
//! clean up, resolve, report. Each call is one self-contained invocation;
//! no background work outlives it. The resolver is cheap to clone (all state
//! is `Arc`-wrapped) and safe to share across tasks.

use crate::aggregate::summarize;
use crate::batch::BatchScheduler;
use crate::cleanup::{LlmTrackCleaner, TrackCleaner, heuristic_split};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{MetadataFetcher, TracklistExtractor};
use crate::providers::{TrackProvider, build_providers};
use crate::rate_limiter::RateLimiter;
use crate::report::format_summary;
use crate::script::generate_script;
use crate::types::{BatchReport, Event, Track};
use crate::waterfall::WaterfallCoordinator;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Everything a full pipeline run produces
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Ordered results plus summary statistics
    pub report: BatchReport,
    /// Generated download shell script
    pub script: String,
    /// Human-readable summary text
    pub summary_text: String,
}

/// Main pipeline instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MixtapeResolver {
    config: Arc<Config>,
    providers: Vec<Arc<dyn TrackProvider>>,
    rate_limiter: Arc<RateLimiter>,
    event_tx: broadcast::Sender<Event>,
}

impl MixtapeResolver {
    /// Create a resolver with the provider set named by the configuration's
    /// priority list.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or an unknown provider name.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let providers = build_providers(&config)?;
        Ok(Self::assemble(config, providers))
    }

    /// Create a resolver over a custom provider set, keeping the rest of the
    /// configuration.
    ///
    /// The priority order is the order of `providers`. This is the seam for
    /// embedding custom sources and for tests with scripted providers.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration.
    pub fn with_providers(
        config: Config,
        providers: Vec<Arc<dyn TrackProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, providers))
    }

    fn assemble(config: Config, providers: Vec<Arc<dyn TrackProvider>>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limits.min_delays.clone()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            providers,
            rate_limiter,
            event_tx,
        }
    }

    /// Subscribe to pipeline progress events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Resolve a cleaned track list through the provider waterfall.
    ///
    /// This is the core entry point: track list in, ordered results and
    /// summary out. The configured deadline, concurrency window, and
    /// per-provider rate limits apply.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::InvalidInput`] on an empty track list; an
    /// individual track failing to resolve is data, not an error.
    pub async fn resolve_tracks(&self, tracks: Vec<Track>) -> Result<BatchReport> {
        let started = Instant::now();

        let coordinator = Arc::new(WaterfallCoordinator::new(
            self.providers.clone(),
            self.rate_limiter.clone(),
        ));
        let provider_ids = coordinator.provider_ids();
        let scheduler = BatchScheduler::new(coordinator).with_events(self.event_tx.clone());

        let cancel = CancellationToken::new();
        let deadline_task = self.config.resolution.deadline.map(|deadline| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                token.cancel();
            })
        });

        let outcome = scheduler
            .resolve_all(&tracks, self.config.resolution.max_concurrency, &cancel)
            .await;

        if let Some(task) = deadline_task {
            task.abort();
        }
        let results = outcome?;

        let summary = summarize(
            &results,
            started.elapsed(),
            self.config.cleanup.estimated_cost_usd,
            &provider_ids,
        );
        self.event_tx
            .send(Event::BatchCompleted {
                found: summary.found_tracks,
                failed: summary.failed_tracks,
            })
            .ok();

        tracing::info!(
            total = summary.total_tracks,
            found = summary.found_tracks,
            failed = summary.failed_tracks,
            elapsed_ms = summary.elapsed.as_millis(),
            "batch resolution finished"
        );

        Ok(BatchReport { results, summary })
    }

    /// Run the full pipeline over a video description: extract the raw
    /// tracklist, clean it up (falling back to the dash split when cleanup
    /// output is unusable), resolve every track, and render the script and
    /// summary artifacts.
    ///
    /// # Errors
    ///
    /// Fails when no tracklist can be extracted, or when cleanup fails at
    /// the transport level (a cleanup *parse* failure only triggers the
    /// fallback).
    pub async fn process_description(&self, description: &str) -> Result<PipelineOutput> {
        let extractor = TracklistExtractor::new()?;
        let entries = extractor.extract(description);
        if entries.is_empty() {
            return Err(Error::Metadata(
                "no timestamped tracklist found in description".to_string(),
            ));
        }

        let cleaner = LlmTrackCleaner::new(
            self.config.cleanup.clone(),
            self.config.retry.clone(),
        )?;
        let tracks = match cleaner.clean(&entries).await {
            Ok(tracks) => tracks,
            Err(Error::Cleanup(reason)) => {
                tracing::warn!(error = %reason, "cleanup unusable, falling back to dash split");
                heuristic_split(&entries)
            }
            Err(e) => return Err(e),
        };

        let report = self.resolve_tracks(tracks).await?;
        let script = generate_script(&report);
        let summary_text = format_summary(&report);

        Ok(PipelineOutput {
            report,
            script,
            summary_text,
        })
    }

    /// Run the full pipeline over a video URL: fetch the page metadata, then
    /// process its description.
    ///
    /// # Errors
    ///
    /// Fails on metadata fetch errors in addition to the
    /// [`process_description`](Self::process_description) failure modes.
    pub async fn process_video(&self, video_url: &str) -> Result<PipelineOutput> {
        let fetcher = MetadataFetcher::new(&self.config.metadata, self.config.retry.clone())?;
        let metadata = fetcher.fetch(video_url).await?;

        tracing::info!(
            url = %video_url,
            title = metadata.title.as_deref().unwrap_or("<untitled>"),
            "processing mix video"
        );

        self.process_description(&metadata.description).await
    }
}
