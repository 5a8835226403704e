use std::sync::Arc;
use std::time::Duration;

use datascope_core::connector::{AuthToken, Credentials, DssConnector};
use datascope_core::{
    DssConfig, DssError, ExtractEndpoint, InstrumentList, PollConfig, RequestBody,
    ValidationOptions, ValidationResponse,
};
use datascope_http::HttpConnector;

/// A logged-in conversation with DataScope Select.
///
/// Holds the connector, configuration, session token, the loaded instrument
/// list, the outcome of the last validation and the pending report request.
pub struct Session {
    pub(crate) connector: Arc<dyn DssConnector>,
    pub(crate) cfg: DssConfig,
    pub(crate) username: Option<String>,
    pub(crate) token: AuthToken,
    pub(crate) instruments: InstrumentList,
    pub(crate) validation: Option<ValidationResponse>,
    pub(crate) pending: Option<RequestBody>,
    pub(crate) endpoint: ExtractEndpoint,
}

/// Builder for a [`Session`].
pub struct SessionBuilder {
    connector: Option<Arc<dyn DssConnector>>,
    cfg: DssConfig,
    credentials: Option<Credentials>,
    token: Option<AuthToken>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a new builder with default configuration.
    ///
    /// Behavior and trade-offs:
    /// - Without [`with_connector`](Self::with_connector) the session talks to
    ///   the hosted API through an HTTP connector with the metadata cache on.
    /// - Defaults poll every 30 seconds with no ceiling; set
    ///   [`max_poll_attempts`](Self::max_poll_attempts) or
    ///   [`poll_timeout`](Self::poll_timeout) to bound long extractions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connector: None,
            cfg: DssConfig::default(),
            credentials: None,
            token: None,
        }
    }

    /// Use a specific connector (a mock, or a custom middleware stack).
    ///
    /// Transport settings of the configuration (base URL, request timeout,
    /// `Prefer` wait) only apply to the default HTTP connector.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn DssConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: DssConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Account to authenticate as.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Reuse a token obtained earlier instead of authenticating.
    ///
    /// The username, when also given with [`credentials`](Self::credentials),
    /// is kept for the preferences lookup; the password is ignored.
    #[must_use]
    pub fn token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    /// API root of the default HTTP connector.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.cfg.base_url = url.into();
        self
    }

    /// Poll loop settings.
    #[must_use]
    pub const fn poll(mut self, poll: PollConfig) -> Self {
        self.cfg.poll = poll;
        self
    }

    /// Delay between polls of a running extraction.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.poll.interval = interval;
        self
    }

    /// Give up with `PollExhausted` after this many polls.
    #[must_use]
    pub const fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.cfg.poll.max_attempts = Some(attempts);
        self
    }

    /// Give up with `PollTimeout` once this much time has passed waiting.
    #[must_use]
    pub const fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.poll.timeout = Some(timeout);
        self
    }

    /// Validation options attached to identifier lists.
    #[must_use]
    pub const fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.cfg.validation_options = options;
        self
    }

    /// Ask the vendor to hold responses up to `seconds` before answering 202.
    #[must_use]
    pub const fn respond_async_wait(mut self, seconds: Option<u32>) -> Self {
        self.cfg.respond_async_wait = seconds;
        self
    }

    /// Timeout of each HTTP request.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = timeout;
        self
    }

    /// Check content field names against the template before every
    /// extraction. Costs one metadata lookup per extraction (cached by the
    /// default connector).
    #[must_use]
    pub const fn validate_fields_before_extract(mut self, yes: bool) -> Self {
        self.cfg.validate_fields_before_extract = yes;
        self
    }

    /// Keep duplicate identifiers when validating instrument lists.
    #[must_use]
    pub const fn keep_duplicates(mut self, yes: bool) -> Self {
        self.cfg.keep_duplicates = yes;
        self
    }

    /// Build the session, authenticating unless a token was supplied.
    ///
    /// # Errors
    /// - `DssError::InvalidArg` when neither credentials nor a token are set,
    ///   or the base URL is malformed.
    /// - `DssError::Unsupported` when the connector cannot issue tokens.
    /// - `DssError::Auth` when the vendor rejects the credentials.
    pub async fn build(self) -> Result<Session, DssError> {
        let connector = match self.connector {
            Some(c) => c,
            None => HttpConnector::layered(&self.cfg)?.build(),
        };
        let username = self.credentials.as_ref().map(|c| c.username.clone());
        let token = match (self.token, self.credentials) {
            (Some(t), _) => t,
            (None, Some(creds)) => {
                let auth = connector
                    .as_auth_provider()
                    .ok_or_else(|| DssError::unsupported("auth"))?;
                let t = auth.request_token(&creds).await?;
                #[cfg(feature = "tracing")]
                tracing::info!(
                    username = %creds.username,
                    expires_at = %t.expires_at(),
                    "authenticated"
                );
                t
            }
            (None, None) => {
                return Err(DssError::InvalidArg(
                    "no credentials or token; call credentials(..) or token(..)".into(),
                ));
            }
        };
        Ok(Session {
            connector,
            cfg: self.cfg,
            username,
            token,
            instruments: InstrumentList::new(),
            validation: None,
            pending: None,
            endpoint: ExtractEndpoint::default(),
        })
    }
}

impl Session {
    /// Start configuring a session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Session over `connector` with an existing token; no authentication
    /// round trip.
    #[must_use]
    pub fn with_token(connector: Arc<dyn DssConnector>, token: AuthToken, cfg: DssConfig) -> Self {
        Self {
            connector,
            cfg,
            username: None,
            token,
            instruments: InstrumentList::new(),
            validation: None,
            pending: None,
            endpoint: ExtractEndpoint::default(),
        }
    }

    /// The session token.
    #[must_use]
    pub const fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Account the session authenticated as, when known.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &DssConfig {
        &self.cfg
    }

    /// The connector requests go through.
    #[must_use]
    pub fn connector(&self) -> &Arc<dyn DssConnector> {
        &self.connector
    }

    /// Replace the validation options used by subsequent requests.
    pub fn set_validation_options(&mut self, options: ValidationOptions) {
        self.cfg.validation_options = options;
    }

    /// Endpoint extractions are submitted to.
    pub fn set_endpoint(&mut self, endpoint: ExtractEndpoint) {
        self.endpoint = endpoint;
    }

    /// The token, unless it is past its lifetime.
    pub(crate) fn live_token(&self) -> Result<&AuthToken, DssError> {
        if self.token.is_expired() {
            return Err(DssError::Auth(format!(
                "session token expired at {}",
                self.token.expires_at()
            )));
        }
        Ok(&self.token)
    }
}
