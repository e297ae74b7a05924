//! Primary provider: notslider search-page scraping
//!
//! Notslider serves an HTML results page for a free-text query. Each attempt
//! fetches that page, picks the most promising anchor (quality-marked links
//! first, then any link with the expected file extension), and resolves the
//! pick through HTTP redirects so the report carries the final CDN URL.
//! Hits are always 320kbps MP3, the tier the service guarantees.

use super::TrackProvider;
use crate::config::NotsliderConfig;
use crate::error::{Error, Result};
use crate::types::{AudioFormat, FoundSource, QualityTier, SearchResult, Track};
use async_trait::async_trait;
use regex::Regex;

/// Markers in an anchor's text or href that signal a direct high-quality
/// download link
const QUALITY_MARKERS: &[&str] = &["320", "download"];

/// File extension expected on fallback candidate links
const EXPECTED_EXTENSION: &str = ".mp3";

/// Primary track provider scraping the notslider search page
pub struct NotsliderProvider {
    config: NotsliderConfig,
    client: reqwest::Client,
    anchor_re: Regex,
}

impl NotsliderProvider {
    /// Create a provider from its configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an HTTP client cannot be constructed.
    pub fn new(config: NotsliderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: None,
            })?;

        // Anchor href plus inner text; inner text may contain markup
        let anchor_re = Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#)
            .map_err(|e| Error::Other(format!("anchor pattern failed to compile: {e}")))?;

        Ok(Self {
            config,
            client,
            anchor_re,
        })
    }

    /// URL of the search results page for a query
    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    /// Pick the best candidate link from a results page
    ///
    /// Preference order: the first anchor whose visible text or href carries
    /// a quality/download marker, else the first anchor whose href ends in
    /// the expected extension. Relative hrefs are resolved against the
    /// provider base URL.
    fn find_candidate(&self, body: &str) -> Option<String> {
        let mut fallback: Option<&str> = None;

        for capture in self.anchor_re.captures_iter(body) {
            let Some(href) = capture.get(1).map(|m| m.as_str()) else {
                continue;
            };
            let text = capture.get(2).map(|m| m.as_str()).unwrap_or_default();

            let haystack = format!("{} {}", href, text).to_lowercase();
            if QUALITY_MARKERS.iter().any(|m| haystack.contains(m)) {
                return self.absolutize(href);
            }

            let path_part = href.split(['?', '#']).next().unwrap_or(href);
            if fallback.is_none() && path_part.to_lowercase().ends_with(EXPECTED_EXTENSION) {
                fallback = Some(href);
            }
        }

        fallback.and_then(|href| self.absolutize(href))
    }

    /// Resolve a possibly-relative href against the provider base URL
    fn absolutize(&self, href: &str) -> Option<String> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(href.to_string());
        }
        url::Url::parse(&self.config.base_url)
            .and_then(|base| base.join(href))
            .map(|joined| joined.to_string())
            .ok()
    }

    /// Follow redirects on the candidate with a read-only probe and return
    /// the final destination URL. A failed probe keeps the pre-redirect URL
    /// rather than failing the attempt.
    async fn resolve_redirects(&self, candidate: &str) -> String {
        match self.client.head(candidate).send().await {
            Ok(response) => response.url().to_string(),
            Err(e) => {
                tracing::debug!(
                    url = %candidate,
                    error = %e,
                    "redirect probe failed, keeping unresolved URL"
                );
                candidate.to_string()
            }
        }
    }
}

#[async_trait]
impl TrackProvider for NotsliderProvider {
    fn id(&self) -> &str {
        "notslider"
    }

    async fn search(&self, track: &Track) -> Result<SearchResult> {
        let query = track.query();
        let url = self.search_url(&query);
        let mut last_error = String::from("no attempt made");

        for attempt in 0..self.config.max_attempts {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.text().await {
                        Ok(body) => match self.find_candidate(&body) {
                            Some(candidate) => {
                                let download_url = self.resolve_redirects(&candidate).await;
                                tracing::debug!(
                                    ordinal = track.ordinal,
                                    url = %download_url,
                                    "notslider hit"
                                );
                                return Ok(SearchResult::found(
                                    track.clone(),
                                    FoundSource {
                                        provider: self.id().to_string(),
                                        download_url,
                                        quality: QualityTier::Kbps320,
                                        format: AudioFormat::Mp3,
                                        duration: None,
                                        size_bytes: None,
                                    },
                                ));
                            }
                            None => {
                                last_error =
                                    "no downloadable link in search results".to_string();
                            }
                        },
                        Err(e) => {
                            last_error = format!("failed to read search response: {e}");
                        }
                    }
                }
                Ok(response) => {
                    last_error = format!("search returned status {}", response.status());
                }
                Err(e) => {
                    last_error = format!("search request failed: {e}");
                }
            }

            let remaining = self.config.max_attempts - attempt - 1;
            if remaining > 0 {
                let backoff = self.config.base_delay * 2_u32.pow(attempt);
                tracing::debug!(
                    ordinal = track.ordinal,
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis(),
                    "notslider attempt missed, backing off"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        tracing::debug!(ordinal = track.ordinal, error = %last_error, "notslider miss");
        Ok(SearchResult::not_found(track.clone(), last_error))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn track() -> Track {
        Track {
            ordinal: 1,
            artist: "Burial".into(),
            title: "Archangel".into(),
            remix: None,
            certainty: 0.95,
        }
    }

    fn provider_for(server: &MockServer, max_attempts: u32) -> NotsliderProvider {
        NotsliderProvider::new(NotsliderConfig {
            base_url: server.uri(),
            max_attempts,
            base_delay: Duration::from_millis(20),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn quality_marked_link_is_preferred_over_earlier_plain_mp3() {
        let server = MockServer::start().await;
        let html = format!(
            r#"<html><body>
            <a href="{0}/files/low.mp3">cheap rip</a>
            <a href="{0}/files/good.mp3">320 kbps</a>
            </body></html>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Burial Archangel"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 2);
        let result = provider.search(&track()).await.unwrap();

        assert!(result.is_found());
        assert!(
            result.download_url().unwrap().ends_with("/files/good.mp3"),
            "should pick the 320-marked link, got {:?}",
            result.download_url()
        );
        assert_eq!(result.quality(), Some(QualityTier::Kbps320));
        assert_eq!(result.provider(), Some("notslider"));
    }

    #[tokio::test]
    async fn falls_back_to_first_mp3_link_without_markers() {
        let server = MockServer::start().await;
        let html = format!(
            r#"<a href="{0}/about.html">about us</a>
               <a href="{0}/files/first.mp3">result one</a>
               <a href="{0}/files/second.mp3">result two</a>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1);
        let result = provider.search(&track()).await.unwrap();

        assert!(result.is_found());
        assert!(result.download_url().unwrap().ends_with("/files/first.mp3"));
    }

    #[tokio::test]
    async fn relative_hrefs_resolve_against_base_url() {
        let server = MockServer::start().await;
        let html = r#"<a href="/dl/track.mp3?id=9">download</a>"#;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1);
        let result = provider.search(&track()).await.unwrap();

        assert!(result.is_found());
        let url = result.download_url().unwrap();
        assert!(
            url.starts_with(&server.uri()),
            "relative href should be joined to base, got {url}"
        );
    }

    #[tokio::test]
    async fn candidate_is_resolved_through_redirects() {
        let server = MockServer::start().await;
        let html = format!(r#"<a href="{}/go/9">download</a>"#, server.uri());

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/go/9"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/cdn/final.mp3"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/cdn/final.mp3"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1);
        let result = provider.search(&track()).await.unwrap();

        assert!(result.is_found());
        assert!(
            result.download_url().unwrap().ends_with("/cdn/final.mp3"),
            "should carry the post-redirect URL, got {:?}",
            result.download_url()
        );
    }

    #[tokio::test]
    async fn failed_probe_keeps_pre_redirect_url() {
        let server = MockServer::start().await;
        // Candidate points at a server that is not listening
        let html = r#"<a href="http://127.0.0.1:1/dead/download">download</a>"#;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1);
        let result = provider.search(&track()).await.unwrap();

        assert!(result.is_found(), "probe failure must not fail the attempt");
        assert_eq!(
            result.download_url(),
            Some("http://127.0.0.1:1/dead/download")
        );
    }

    #[tokio::test]
    async fn empty_results_retry_with_backoff_then_report_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no hits</html>"))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 2);
        let start = std::time::Instant::now();
        let result = provider.search(&track()).await.unwrap();
        let elapsed = start.elapsed();

        assert!(!result.is_found());
        assert!(
            result.error().unwrap().contains("no downloadable link"),
            "error should carry the final attempt's detail, got {:?}",
            result.error()
        );
        // One backoff between the two attempts: base_delay * 2^0 = 20ms
        assert!(
            elapsed >= Duration::from_millis(20),
            "should back off between attempts, took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn non_success_status_becomes_not_found_with_status_detail() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1);
        let result = provider.search(&track()).await.unwrap();

        assert!(!result.is_found());
        assert!(
            result.error().unwrap().contains("503"),
            "error should name the status, got {:?}",
            result.error()
        );
    }

    #[tokio::test]
    async fn transport_failure_becomes_not_found() {
        // Point at a port nobody is listening on
        let provider = NotsliderProvider::new(NotsliderConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            max_attempts: 1,
            base_delay: Duration::from_millis(10),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap();

        let result = provider.search(&track()).await.unwrap();

        assert!(!result.is_found());
        assert!(result.error().unwrap().contains("search request failed"));
    }

    #[tokio::test]
    async fn query_includes_remix_annotation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Burial Archangel Boreal Mix"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1);
        let mut t = track();
        t.remix = Some("Boreal Mix".into());
        let _result = provider.search(&t).await.unwrap();
        // Mock expectation verifies the query string on drop
    }
}
