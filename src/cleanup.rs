//! Track-name cleanup
//!
//! Raw tracklist lines are noisy: inconsistent separators, label chatter,
//! typos. The cleanup stage hands the whole list to a text-completion model
//! and gets back structured artist/title records with a per-track certainty
//! score. When the model's output cannot be parsed, the caller can fall back
//! to [`heuristic_split`], a plain dash split with a degraded certainty,
//! rather than abort the run.

use crate::config::{CleanupConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::retry_with_backoff;
use crate::types::{RawTrackEntry, Track};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Certainty assigned to fallback records that split cleanly on a dash
const HEURISTIC_SPLIT_CERTAINTY: f64 = 0.5;

/// Certainty assigned to fallback records with no recognizable separator
const HEURISTIC_OPAQUE_CERTAINTY: f64 = 0.3;

/// Capability interface for the cleanup collaborator
#[async_trait]
pub trait TrackCleaner: Send + Sync {
    /// Produce cleaned tracks for the given raw entries, ordered like the
    /// input
    async fn clean(&self, entries: &[RawTrackEntry]) -> Result<Vec<Track>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// One cleaned record as emitted by the model
#[derive(Deserialize)]
struct CleanedRecord {
    artist: String,
    title: String,
    #[serde(default)]
    remix: Option<String>,
    certainty: f64,
}

/// Cleanup implementation backed by a chat-completion API
pub struct LlmTrackCleaner {
    client: reqwest::Client,
    config: CleanupConfig,
    retry: RetryConfig,
}

impl LlmTrackCleaner {
    /// Create a cleaner from its configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an HTTP client cannot be constructed.
    pub fn new(config: CleanupConfig, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: None,
            })?;
        Ok(Self {
            client,
            config,
            retry,
        })
    }

    fn build_prompt(entries: &[RawTrackEntry]) -> String {
        let mut prompt = String::from(
            "Normalize the following mix tracklist lines. For every line, \
             emit one JSON object with keys \"artist\", \"title\", \"remix\" \
             (null unless the line names a remix/edit), and \"certainty\" \
             (0.0-1.0, your confidence in the artist/title split). Respond \
             with a JSON array only, one object per input line, same order.\n\n",
        );
        for entry in entries {
            prompt.push_str(&format!("{}. {}\n", entry.ordinal, entry.raw_text));
        }
        prompt
    }

    /// Strip a Markdown code fence if the model wrapped its JSON in one
    fn strip_fences(content: &str) -> &str {
        let trimmed = content.trim();
        trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .map(str::trim)
            .unwrap_or(trimmed)
    }

    fn parse_records(content: &str, entries: &[RawTrackEntry]) -> Result<Vec<Track>> {
        let records: Vec<CleanedRecord> = serde_json::from_str(Self::strip_fences(content))
            .map_err(|e| Error::Cleanup(format!("completion was not a valid record array: {e}")))?;

        if records.len() != entries.len() {
            return Err(Error::Cleanup(format!(
                "completion returned {} records for {} tracklist lines",
                records.len(),
                entries.len()
            )));
        }

        Ok(records
            .into_iter()
            .zip(entries)
            .map(|(record, entry)| Track {
                ordinal: entry.ordinal,
                artist: record.artist,
                title: record.title,
                remix: record.remix,
                certainty: record.certainty.clamp(0.0, 1.0),
            })
            .collect())
    }
}

#[async_trait]
impl TrackCleaner for LlmTrackCleaner {
    async fn clean(&self, entries: &[RawTrackEntry]) -> Result<Vec<Track>> {
        if entries.is_empty() {
            return Err(Error::InvalidInput("no tracklist entries to clean".into()));
        }

        let request = ChatRequest {
            model: self.config.model.as_str(),
            messages: vec![ChatMessage {
                role: "user",
                content: Self::build_prompt(entries),
            }],
            temperature: 0.0,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        let client = &self.client;
        let endpoint = url.as_str();
        let api_key = self.config.api_key.as_deref();
        let payload = &request;
        let response: ChatResponse = retry_with_backoff(&self.retry, move || async move {
            let mut builder = client.post(endpoint).json(payload);
            if let Some(key) = api_key {
                builder = builder.bearer_auth(key);
            }
            let response = builder.send().await?.error_for_status()?;
            Ok::<_, Error>(response.json().await?)
        })
        .await?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::Cleanup("completion response had no choices".into()))?;

        let tracks = Self::parse_records(content, entries)?;
        tracing::info!(tracks = tracks.len(), "tracklist cleaned");
        Ok(tracks)
    }
}

/// Degraded fallback for when cleanup fails: split each raw line on the
/// first dash separator.
///
/// Lines that split get [`HEURISTIC_SPLIT_CERTAINTY`]; lines with no
/// separator keep their whole text as the title, an empty artist, and a
/// certainty low enough to be flagged invalid downstream. No remix
/// extraction is attempted.
#[must_use]
pub fn heuristic_split(entries: &[RawTrackEntry]) -> Vec<Track> {
    entries
        .iter()
        .map(|entry| match entry.raw_text.split_once(" - ") {
            Some((artist, title)) => Track {
                ordinal: entry.ordinal,
                artist: artist.trim().to_string(),
                title: title.trim().to_string(),
                remix: None,
                certainty: HEURISTIC_SPLIT_CERTAINTY,
            },
            None => Track {
                ordinal: entry.ordinal,
                artist: String::new(),
                title: entry.raw_text.trim().to_string(),
                remix: None,
                certainty: HEURISTIC_OPAQUE_CERTAINTY,
            },
        })
        .collect()
}
