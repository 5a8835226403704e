//! Configuration types shared across the session facade and connectors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root of the hosted DataScope Select REST API.
pub const DEFAULT_BASE_URL: &str = "https://hosted.datascopeapi.reuters.com/RestApi/v1";

/// Settings for the asynchronous extraction poll loop.
///
/// The defaults reproduce the vendor guidance: poll the monitor URL every 30
/// seconds with no attempt ceiling and no overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Fixed delay before each poll of the monitor URL.
    pub interval: Duration,
    /// Optional ceiling on the number of polls.
    pub max_attempts: Option<u32>,
    /// Optional deadline for the whole wait, measured from the first poll.
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: None,
            timeout: None,
        }
    }
}

/// Instrument validation switches sent with every identifier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Accept instruments that are no longer listed but have history.
    pub allow_historical_instruments: bool,
    /// Accept inactive instruments.
    pub allow_inactive_instruments: bool,
    /// Accept instruments from open-access segments.
    pub allow_open_access_instruments: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allow_historical_instruments: true,
            allow_inactive_instruments: true,
            allow_open_access_instruments: true,
        }
    }
}

/// Configuration for a fixed-window budget of extraction submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of submissions within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(60 * 60 * 24),
        }
    }
}

/// Settings for the template metadata cache.
///
/// Field-name lists and bond schedule types change rarely, so entries live
/// for an hour by default. A zero `ttl` disables the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an entry stays valid after it is stored.
    pub ttl: Duration,
    /// Maximum number of cached entries.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_entries: 64,
        }
    }
}

/// Snapshot of a quota budget at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    /// Configured maximum units per window.
    pub limit: u64,
    /// Remaining units available in the current window.
    pub remaining: u64,
    /// Time remaining until the current window resets.
    pub reset_in: Duration,
}

/// Global configuration for a datascope session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DssConfig {
    /// REST API root, without trailing slash.
    pub base_url: String,
    /// Poll loop settings for asynchronous extractions.
    pub poll: PollConfig,
    /// Validation options attached to identifier lists.
    pub validation_options: ValidationOptions,
    /// When set, adds `wait=N` to the `Prefer` header so the vendor holds the
    /// response up to N seconds before answering 202.
    pub respond_async_wait: Option<u32>,
    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,
    /// Check content field names against the template before submitting.
    pub validate_fields_before_extract: bool,
    /// Keep duplicate identifiers when validating an instrument list.
    pub keep_duplicates: bool,
}

impl Default for DssConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollConfig::default(),
            validation_options: ValidationOptions::default(),
            respond_async_wait: None,
            request_timeout: Duration::from_secs(120),
            validate_fields_before_extract: false,
            keep_duplicates: true,
        }
    }
}

impl DssConfig {
    /// The `Prefer` header value derived from `respond_async_wait`.
    #[must_use]
    pub fn prefer_header(&self) -> String {
        self.respond_async_wait.map_or_else(
            || "respond-async".to_string(),
            |secs| format!("respond-async, wait={secs}"),
        )
    }
}
