//! Video metadata fetch and raw tracklist extraction
//!
//! Mix uploads usually carry their tracklist in the video description, one
//! line per track with a timestamp. This module fetches the video page,
//! scrapes the description out of its meta tags, and turns timestamped lines
//! into ordered [`RawTrackEntry`] records for the cleanup stage.

use crate::config::{MetadataConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::retry_with_backoff;
use crate::types::RawTrackEntry;
use regex::Regex;
use std::time::Duration;

/// Scraped video metadata
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    /// Video title, when the page carried one
    pub title: Option<String>,
    /// Video description text
    pub description: String,
}

/// Fetches a video page and scrapes its title and description
pub struct MetadataFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
    og_title_re: Regex,
    og_description_re: Regex,
    meta_description_re: Regex,
}

impl MetadataFetcher {
    /// Create a fetcher from its configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an HTTP client cannot be constructed.
    pub fn new(config: &MetadataConfig, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: None,
            })?;

        let meta = |property: &str, attr: &str| -> Result<Regex> {
            Regex::new(&format!(
                r#"(?is)<meta\s[^>]*{attr}\s*=\s*"{property}"[^>]*content\s*=\s*"([^"]*)""#
            ))
            .map_err(|e| Error::Other(format!("meta pattern failed to compile: {e}")))
        };

        Ok(Self {
            client,
            retry,
            og_title_re: meta("og:title", "property")?,
            og_description_re: meta("og:description", "property")?,
            meta_description_re: meta("description", "name")?,
        })
    }

    /// Fetch the video page and scrape title and description.
    ///
    /// Transport failures are retried per the retry configuration. A page
    /// without any description meta tag is a metadata error; there is no
    /// tracklist to work with.
    pub async fn fetch(&self, video_url: &str) -> Result<VideoMetadata> {
        let client = &self.client;
        let body = retry_with_backoff(&self.retry, move || async move {
            let response = client.get(video_url).send().await?.error_for_status()?;
            Ok::<_, Error>(response.text().await?)
        })
        .await?;

        let title = self
            .og_title_re
            .captures(&body)
            .and_then(|c| c.get(1))
            .map(|m| unescape_entities(m.as_str()));

        let description = self
            .og_description_re
            .captures(&body)
            .or_else(|| self.meta_description_re.captures(&body))
            .and_then(|c| c.get(1))
            .map(|m| unescape_entities(m.as_str()))
            .ok_or_else(|| {
                Error::Metadata(format!("no description meta tag found at {video_url}"))
            })?;

        tracing::debug!(
            url = %video_url,
            title = title.as_deref().unwrap_or("<none>"),
            description_len = description.len(),
            "video metadata fetched"
        );

        Ok(VideoMetadata { title, description })
    }
}

/// Decode the handful of HTML entities that commonly appear in description
/// meta tags
fn unescape_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("\\n", "\n")
}

/// Parses timestamped description lines into ordered raw track entries
pub struct TracklistExtractor {
    timestamp_re: Regex,
    leading_ordinal_re: Regex,
}

impl TracklistExtractor {
    /// Create an extractor
    ///
    /// # Errors
    ///
    /// Returns an internal error if a parsing pattern fails to compile.
    pub fn new() -> Result<Self> {
        let timestamp_re = Regex::new(r"[\[\(]?\b(\d{1,2}:)?(\d{1,3}):(\d{2})\b[\]\)]?")
            .map_err(|e| Error::Other(format!("timestamp pattern failed to compile: {e}")))?;
        let leading_ordinal_re = Regex::new(r"^\s*\d{1,3}\s*[.):]\s*")
            .map_err(|e| Error::Other(format!("ordinal pattern failed to compile: {e}")))?;
        Ok(Self {
            timestamp_re,
            leading_ordinal_re,
        })
    }

    /// Extract the tracklist from a video description.
    ///
    /// A line is a track line when it carries a `mm:ss` or `hh:mm:ss`
    /// timestamp. The timestamp and any leading numbering decoration are
    /// stripped from the raw text; ordinals are assigned 1-based in input
    /// order.
    #[must_use]
    pub fn extract(&self, description: &str) -> Vec<RawTrackEntry> {
        let mut entries = Vec::new();

        for line in description.lines() {
            let Some(captures) = self.timestamp_re.captures(line) else {
                continue;
            };
            let Some(whole) = captures.get(0) else {
                continue;
            };

            let timestamp = parse_timestamp(&captures);
            let without_timestamp = format!("{}{}", &line[..whole.start()], &line[whole.end()..]);
            let raw_text = self
                .leading_ordinal_re
                .replace(without_timestamp.trim(), "")
                .trim_matches(|c: char| c.is_whitespace() || "-–—|:".contains(c))
                .to_string();

            if raw_text.is_empty() {
                continue;
            }

            entries.push(RawTrackEntry {
                ordinal: entries.len() as u32 + 1,
                raw_text,
                timestamp,
            });
        }

        tracing::debug!(tracks = entries.len(), "tracklist extracted");
        entries
    }
}

/// Convert captured timestamp groups into a duration
fn parse_timestamp(captures: &regex::Captures<'_>) -> Option<Duration> {
    let minutes_part: u64 = captures.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = captures.get(3)?.as_str().parse().ok()?;
    let total = match captures.get(1) {
        // hh:mm:ss, group 1 carries "hh:"
        Some(hours) => {
            let hours: u64 = hours.as_str().trim_end_matches(':').parse().ok()?;
            hours * 3600 + minutes_part * 60 + seconds
        }
        // mm:ss
        None => minutes_part * 60 + seconds,
    };
    Some(Duration::from_secs(total))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor() -> TracklistExtractor {
        TracklistExtractor::new().unwrap()
    }

    #[test]
    fn timestamped_lines_become_ordered_entries() {
        let description = "\
Best of deep dub techno, 2 hours.

Tracklist:
00:00 Basic Channel - Quadrant Dub
12:34 Rhythm & Sound - Carrier
1:02:33 Deepchord - Vantage Isle

Follow us on the socials!";

        let entries = extractor().extract(description);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].ordinal, 1);
        assert_eq!(entries[0].raw_text, "Basic Channel - Quadrant Dub");
        assert_eq!(entries[0].timestamp, Some(Duration::from_secs(0)));
        assert_eq!(entries[1].ordinal, 2);
        assert_eq!(entries[1].timestamp, Some(Duration::from_secs(12 * 60 + 34)));
        assert_eq!(
            entries[2].timestamp,
            Some(Duration::from_secs(3600 + 2 * 60 + 33))
        );
        assert_eq!(entries[2].raw_text, "Deepchord - Vantage Isle");
    }

    #[test]
    fn bracketed_timestamps_and_numbering_are_stripped() {
        let description = "\
01. Moderat - A New Error [00:00]
02. Apparat - Goodbye [05:12]";

        let entries = extractor().extract(description);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].raw_text, "Moderat - A New Error");
        assert_eq!(entries[1].raw_text, "Apparat - Goodbye");
        assert_eq!(entries[1].timestamp, Some(Duration::from_secs(5 * 60 + 12)));
    }

    #[test]
    fn lines_without_timestamps_are_ignored() {
        let description = "just chatter\nno tracklist here\nbuy our merch";
        assert!(extractor().extract(description).is_empty());
    }

    #[test]
    fn ordinals_stay_sequential_when_chatter_interleaves() {
        let description = "\
00:00 First - Track
(shoutout to the label)
03:00 Second - Track";

        let entries = extractor().extract(description);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ordinal, 1);
        assert_eq!(entries[1].ordinal, 2);
    }

    #[test]
    fn timestamp_only_lines_are_skipped() {
        let entries = extractor().extract("12:34\n56:07  ");
        assert!(entries.is_empty(), "no raw text means no entry");
    }

    #[tokio::test]
    async fn fetch_scrapes_og_tags() {
        let server = MockServer::start().await;
        let html = r#"<html><head>
            <meta property="og:title" content="Dub Techno Mix Vol. 3" />
            <meta property="og:description" content="00:00 Artist &amp; Friend - Opener" />
            </head><body></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let fetcher = MetadataFetcher::new(
            &MetadataConfig::default(),
            RetryConfig {
                max_attempts: 0,
                ..RetryConfig::default()
            },
        )
        .unwrap();

        let metadata = fetcher
            .fetch(&format!("{}/watch", server.uri()))
            .await
            .unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Dub Techno Mix Vol. 3"));
        assert_eq!(metadata.description, "00:00 Artist & Friend - Opener");
    }

    #[tokio::test]
    async fn fetch_falls_back_to_plain_description_meta() {
        let server = MockServer::start().await;
        let html = r#"<head><meta name="description" content="12:00 A - B"></head>"#;

        Mock::given(method("GET"))
            .and(path("/v"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let fetcher =
            MetadataFetcher::new(&MetadataConfig::default(), RetryConfig::default()).unwrap();
        let metadata = fetcher.fetch(&format!("{}/v", server.uri())).await.unwrap();

        assert_eq!(metadata.title, None);
        assert_eq!(metadata.description, "12:00 A - B");
    }

    #[tokio::test]
    async fn fetch_without_description_is_a_metadata_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher =
            MetadataFetcher::new(&MetadataConfig::default(), RetryConfig::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/v", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Metadata(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn fetch_surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher =
            MetadataFetcher::new(&MetadataConfig::default(), RetryConfig::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/v", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)), "got {err:?}");
    }

    #[test]
    fn entities_are_unescaped() {
        assert_eq!(
            unescape_entities("Mogwai &amp; Friends &#39;Live&#39; &quot;Set&quot;"),
            "Mogwai & Friends 'Live' \"Set\""
        );
    }
}
