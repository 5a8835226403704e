use std::sync::Arc;
use std::time::Duration;

use datascope_core::DssConnector;
use datascope_middleware::ConnectorBuilder;
use datascope_types::{CacheConfig, DEFAULT_BASE_URL, DssConfig};
use url::Url;

use crate::HttpConnector;
use datascope_core::DssError;

/// Builder for [`HttpConnector`].
///
/// Behavior and trade-offs:
/// - `base_url` must be an absolute `http`/`https` URL; a trailing slash is
///   ignored.
/// - `request_timeout` bounds every single HTTP exchange, including each
///   poll. It does not bound the whole extraction; see `PollConfig`.
/// - `respond_async_wait` asks the vendor to hold a submission up to N
///   seconds before answering `202`, which saves a poll for small reports.
#[derive(Debug, Clone)]
pub struct HttpConnectorBuilder {
    base_url: String,
    request_timeout: Duration,
    respond_async_wait: Option<u32>,
    client: Option<reqwest::Client>,
}

impl Default for HttpConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpConnectorBuilder {
    /// Builder targeting the hosted API with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&DssConfig::default())
    }

    /// Builder carrying the transport settings of a session config.
    #[must_use]
    pub fn from_config(cfg: &DssConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            request_timeout: cfg.request_timeout,
            respond_async_wait: cfg.respond_async_wait,
            client: None,
        }
    }

    /// API root, e.g. a local test server.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `wait=N` preference on every request.
    #[must_use]
    pub const fn respond_async_wait(mut self, seconds: Option<u32>) -> Self {
        self.respond_async_wait = seconds;
        self
    }

    /// Use a preconfigured client (proxies, TLS roots). The request timeout
    /// setting is ignored in that case.
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the connector.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` for a malformed base URL and
    /// `DssError::Connector` when the HTTP client cannot be created.
    pub fn build(self) -> Result<HttpConnector, DssError> {
        let trimmed = self.base_url.trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|e| DssError::InvalidArg(format!("base url {trimmed}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DssError::InvalidArg(format!(
                "base url {trimmed}: unsupported scheme {}",
                parsed.scheme()
            )));
        }
        let client = match self.client {
            Some(c) => c,
            None => reqwest::Client::builder()
                .timeout(self.request_timeout)
                .build()
                .map_err(|e| DssError::connector("datascope-http", e.to_string()))?,
        };
        let prefer = DssConfig {
            respond_async_wait: self.respond_async_wait,
            ..DssConfig::default()
        }
        .prefer_header();
        Ok(HttpConnector {
            client,
            base_url: trimmed.to_string(),
            prefer,
        })
    }
}

impl HttpConnector {
    /// Returns a middleware builder around a connector for the hosted API,
    /// with the metadata cache enabled.
    ///
    /// # Errors
    /// Returns the errors of [`HttpConnectorBuilder::build`].
    pub fn layered(cfg: &DssConfig) -> Result<ConnectorBuilder, DssError> {
        let raw: Arc<dyn DssConnector> = Arc::new(HttpConnectorBuilder::from_config(cfg).build()?);
        Ok(ConnectorBuilder::new(raw).with_cache(&CacheConfig::default()))
    }

    /// Expert-only: a bare connector for the hosted API at [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    /// Returns the errors of [`HttpConnectorBuilder::build`].
    pub fn new_raw() -> Result<Self, DssError> {
        HttpConnectorBuilder::new().base_url(DEFAULT_BASE_URL).build()
    }
}
