//! Configuration type definitions.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Handle the bot answers to when none is configured or discovered.
pub const DEFAULT_HANDLE: &str = "CharityRandom";

/// Fallback charity page when a record has no website.
pub const DEFAULT_DETAIL_URL: &str =
    "http://beta.charitycommission.gov.uk/charity-details/?regid={regno}&subid=0";

/// Register search page offered when a text search finds nothing.
pub const DEFAULT_SEARCH_URL: &str =
    "http://beta.charitycommission.gov.uk/charity-search/?q={query}";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub twitter: TwitterConfig,
    pub bot: BotConfig,
    pub registry: RegistryConfig,
    pub replies: RepliesConfig,
}

/// Twitter API credentials.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub api_base: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            api_base: "https://api.twitter.com/1.1".to_string(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Handle to answer to. Discovered from the credentials when unset.
    pub handle: Option<String>,
    pub poll_interval_secs: u64,
    /// Cooldown before retrying a rate-limited fetch.
    pub rate_limit_cooldown_secs: u64,
    /// Upper bound on every external call.
    pub request_timeout_secs: u64,
    /// Print replies instead of posting them, and pin the watermark.
    pub debug: bool,
    pub debug_watermark: DateTime<Utc>,
    /// JSON file of recorded mentions to replay instead of calling Twitter.
    pub fixtures: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            handle: None,
            poll_interval_secs: 3600,
            rate_limit_cooldown_secs: 900,
            request_timeout_secs: 30,
            debug: false,
            debug_watermark: default_debug_watermark(),
            fixtures: None,
        }
    }
}

impl BotConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Fixed starting watermark for replayable debug runs.
pub fn default_debug_watermark() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 5, 10, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Which charity registry backend to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    #[default]
    CharityBase,
    FindThatCharity,
}

impl std::str::FromStr for RegistryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "charitybase" => Ok(Self::CharityBase),
            "findthatcharity" | "ftc" => Ok(Self::FindThatCharity),
            other => Err(format!(
                "unknown registry backend '{}' (use: charitybase, findthatcharity)",
                other
            )),
        }
    }
}

impl std::fmt::Display for RegistryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CharityBase => f.write_str("charitybase"),
            Self::FindThatCharity => f.write_str("findthatcharity"),
        }
    }
}

/// Registry lookup settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub backend: RegistryBackend,
    /// Overrides the backend's default endpoint.
    pub base_url: Option<String>,
}

/// Reply rendering settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepliesConfig {
    /// Platform length limit, in characters.
    pub max_length: usize,
    /// Charity page used when a record has no website. Must contain `{regno}`.
    pub detail_url: String,
    /// Register search page for failed searches. Must contain `{query}`.
    pub search_url: Option<String>,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            max_length: 280,
            detail_url: DEFAULT_DETAIL_URL.to_string(),
            search_url: Some(DEFAULT_SEARCH_URL.to_string()),
        }
    }
}
