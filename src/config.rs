//! Configuration types for mixtape-dl

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

/// Resolution pipeline behavior (concurrency, provider order, deadline)
///
/// Groups settings that shape the batched waterfall search. Used as a nested
/// sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Maximum tracks resolved concurrently per chunk (default: 3)
    ///
    /// The batch scheduler itself takes this as a required parameter; this
    /// field only supplies the value at the pipeline boundary.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Provider identifiers in waterfall priority order
    /// (default: notslider, soundcloud, bandcamp)
    #[serde(default = "default_provider_priority")]
    pub provider_priority: Vec<String>,

    /// Overall wall-clock deadline for one pipeline invocation
    /// (None = no deadline). Once elapsed, no new chunk is started;
    /// completed results are preserved.
    #[serde(default, with = "optional_duration_ms_serde")]
    pub deadline: Option<Duration>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            provider_priority: default_provider_priority(),
            deadline: None,
        }
    }
}

/// Per-provider rate limiting configuration
///
/// Maps provider identifiers to the minimum interval between successive
/// requests to that provider. Providers not present in the map are not
/// throttled (the limiter logs and passes them through).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum delay between dispatches, per provider identifier
    #[serde(default = "default_min_delays", with = "duration_map_ms_serde")]
    pub min_delays: HashMap<String, Duration>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delays: default_min_delays(),
        }
    }
}

/// Primary provider (notslider) configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotsliderConfig {
    /// Base URL of the notslider search endpoint
    #[serde(default = "default_notslider_base_url")]
    pub base_url: String,

    /// Lookup attempts per track before giving up (default: 2)
    #[serde(default = "default_notslider_attempts")]
    pub max_attempts: u32,

    /// Base delay for the between-attempt exponential backoff
    /// (attempt n waits base_delay * 2^n; default: 1 second)
    #[serde(default = "default_notslider_base_delay", with = "duration_ms_serde")]
    pub base_delay: Duration,

    /// Timeout for a single HTTP request to the provider (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,
}

impl Default for NotsliderConfig {
    fn default() -> Self {
        Self {
            base_url: default_notslider_base_url(),
            max_attempts: default_notslider_attempts(),
            base_delay: default_notslider_base_delay(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Track-name cleanup (text completion API) configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Base URL of the completion API
    #[serde(default = "default_cleanup_api_base")]
    pub api_base: String,

    /// API key sent as a bearer token (None = unauthenticated endpoint)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Completion model identifier
    #[serde(default = "default_cleanup_model")]
    pub model: String,

    /// Timeout for one completion request (default: 60 seconds)
    #[serde(default = "default_cleanup_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,

    /// Flat per-run cost estimate reported in the processing summary
    /// (the pipeline does not meter actual API usage)
    #[serde(default = "default_estimated_cost")]
    pub estimated_cost_usd: f64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            api_base: default_cleanup_api_base(),
            api_key: None,
            model: default_cleanup_model(),
            request_timeout: default_cleanup_timeout(),
            estimated_cost_usd: default_estimated_cost(),
        }
    }
}

/// Video metadata fetch configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Timeout for the metadata page fetch (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry configuration for transient collaborator failures
///
/// Applies to the metadata fetch and cleanup calls. Provider lookups carry
/// their own bounded attempt loop and do not use this.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_retry_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_ms_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Main configuration for [`crate::MixtapeResolver`]
///
/// Fields are organized into logical sub-configs:
/// - [`resolution`](ResolutionConfig): concurrency, provider order, deadline
/// - [`rate_limits`](RateLimitConfig): per-provider minimum intervals
/// - [`notslider`](NotsliderConfig): the primary provider
/// - [`cleanup`](CleanupConfig): the track-name cleanup collaborator
/// - [`metadata`](MetadataConfig): the video metadata fetch
/// - [`retry`](RetryConfig): transient-failure retry for collaborator calls
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolution pipeline behavior
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Per-provider rate limits
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Primary provider settings
    #[serde(default)]
    pub notslider: NotsliderConfig,

    /// Cleanup collaborator settings
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Metadata fetch settings
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Retry settings for collaborator calls
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Validate settings that would otherwise surface as confusing runtime
    /// failures. Called by the pipeline constructor.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.resolution.max_concurrency == 0 {
            return Err(crate::error::Error::Config {
                message: "max_concurrency must be at least 1".to_string(),
                key: Some("resolution.max_concurrency".to_string()),
            });
        }
        if self.resolution.provider_priority.is_empty() {
            return Err(crate::error::Error::Config {
                message: "provider_priority must name at least one provider".to_string(),
                key: Some("resolution.provider_priority".to_string()),
            });
        }
        Ok(())
    }
}

fn default_max_concurrency() -> usize {
    3
}

fn default_provider_priority() -> Vec<String> {
    vec![
        "notslider".to_string(),
        "soundcloud".to_string(),
        "bandcamp".to_string(),
    ]
}

fn default_min_delays() -> HashMap<String, Duration> {
    let mut delays = HashMap::new();
    delays.insert("notslider".to_string(), Duration::from_millis(1000));
    delays.insert("soundcloud".to_string(), Duration::from_millis(1000));
    delays.insert("bandcamp".to_string(), Duration::from_millis(1000));
    delays
}

fn default_notslider_base_url() -> String {
    "https://notslider.net".to_string()
}

fn default_notslider_attempts() -> u32 {
    2
}

fn default_notslider_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_cleanup_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_cleanup_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_cleanup_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_estimated_cost() -> f64 {
    0.02
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper (milliseconds)
mod optional_duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

// Duration map serialization helper (provider id -> milliseconds)
mod duration_map_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashMap;
    use std::time::Duration;

    pub fn serialize<S>(
        map: &HashMap<String, Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: HashMap<&str, u64> = map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_millis() as u64))
            .collect();
        serializer.collect_map(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<String, Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = HashMap::<String, u64>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|(k, v)| (k, Duration::from_millis(v)))
            .collect())
    }
}
