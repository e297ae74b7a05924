//! Batch scheduling: bounded concurrent fan-out over a track list
//!
//! The scheduler partitions the input into contiguous chunks of
//! `max_concurrency` tracks, resolves each chunk's members concurrently, and
//! waits for the whole chunk before starting the next. The chunk barrier
//! introduces a mild head-of-line effect (a slow track delays the start of
//! the next chunk); that tradeoff is deliberate and this must stay a chunked
//! scheduler, not a continuous worker pool.
//!
//! Output order always matches input order: `join_all` yields results in
//! future order within a chunk, and chunks are appended in input order, so
//! position, not completion time, determines placement.

use crate::error::{Error, Result};
use crate::types::{Event, SearchResult, Track};
use crate::waterfall::WaterfallCoordinator;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Error text for tracks never attempted because the deadline elapsed
const DEADLINE_ERROR: &str = "deadline exceeded before this track was attempted";

/// Fan-out scheduler over the waterfall coordinator
pub struct BatchScheduler {
    coordinator: Arc<WaterfallCoordinator>,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl BatchScheduler {
    /// Create a scheduler over a coordinator
    #[must_use]
    pub fn new(coordinator: Arc<WaterfallCoordinator>) -> Self {
        Self {
            coordinator,
            event_tx: None,
        }
    }

    /// Emit progress events on the given channel as chunks complete
    #[must_use]
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Resolve every track, at most `max_concurrency` in flight at once.
    ///
    /// `results[i]` corresponds to `tracks[i]` for every `i`. Once `cancel`
    /// fires, no new chunk is started; results of completed chunks are
    /// preserved and the remaining tracks are filled with not-found results
    /// explaining the deadline.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::InvalidInput`], before any network activity,
    /// on an empty track list or a zero `max_concurrency`.
    pub async fn resolve_all(
        &self,
        tracks: &[Track],
        max_concurrency: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>> {
        if tracks.is_empty() {
            return Err(Error::InvalidInput("track list is empty".to_string()));
        }
        if max_concurrency == 0 {
            return Err(Error::InvalidInput(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        tracing::info!(
            tracks = tracks.len(),
            max_concurrency,
            "starting batch resolution"
        );

        let mut results: Vec<SearchResult> = Vec::with_capacity(tracks.len());

        for chunk in tracks.chunks(max_concurrency) {
            if cancel.is_cancelled() {
                tracing::warn!(
                    completed = results.len(),
                    remaining = tracks.len() - results.len(),
                    "deadline elapsed, not starting further chunks"
                );
                break;
            }

            let chunk_future =
                futures::future::join_all(chunk.iter().map(|t| self.coordinator.resolve_one(t)));
            let chunk_results = tokio::select! {
                // Prefer a finished chunk over a simultaneous cancellation
                biased;
                chunk_results = chunk_future => chunk_results,
                _ = cancel.cancelled() => {
                    // Dropping the chunk future aborts its in-flight
                    // provider calls; completed chunks stay intact
                    tracing::warn!(
                        completed = results.len(),
                        in_flight = chunk.len(),
                        "deadline elapsed, abandoning in-flight chunk"
                    );
                    break;
                }
            };

            if let Some(tx) = &self.event_tx {
                for result in &chunk_results {
                    let event = match result.provider() {
                        Some(provider) => Event::TrackResolved {
                            ordinal: result.track.ordinal,
                            provider: provider.to_string(),
                        },
                        None => Event::TrackFailed {
                            ordinal: result.track.ordinal,
                        },
                    };
                    tx.send(event).ok();
                }
            }

            results.extend(chunk_results);

            if let Some(tx) = &self.event_tx {
                tx.send(Event::ChunkCompleted {
                    completed: results.len(),
                    total: tracks.len(),
                })
                .ok();
            }
        }

        // Keep the length/order invariant even on a cut-short run
        for track in &tracks[results.len()..] {
            if let Some(tx) = &self.event_tx {
                tx.send(Event::TrackFailed {
                    ordinal: track.ordinal,
                })
                .ok();
            }
            results.push(SearchResult::not_found(track.clone(), DEADLINE_ERROR));
        }

        Ok(results)
    }
}
