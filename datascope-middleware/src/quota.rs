//! Fixed-window budget of extraction submissions.
//!
//! Only `submit` consumes budget. Polls, tokens and metadata lookups pass
//! through untouched.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use datascope_core::connector::{AuthToken, ExtractionProvider, ExtractionStatus};
use datascope_core::{DssConnector, DssError, ExtractEndpoint, Middleware, RequestBody};
use datascope_types::{QuotaConfig, QuotaState};
use tokio::time::Instant;

/// Wrapper that enforces a submission quota.
pub struct QuotaConnector {
    inner: Arc<dyn DssConnector>,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    limit: u64,
    window: Duration,
    calls_made_in_window: u64,
    last_reset: Instant,
}

impl QuotaRuntime {
    /// Start a new window if the current one has elapsed, keeping window
    /// boundaries aligned to the first reset.
    fn roll(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_reset);
        if self.window.is_zero() || elapsed < self.window {
            return;
        }
        self.calls_made_in_window = 0;
        let windows_passed = elapsed.as_nanos() / self.window.as_nanos();
        let boundary_offset = Duration::from_nanos(
            (windows_passed * self.window.as_nanos())
                .try_into()
                .unwrap_or(u64::MAX),
        );
        self.last_reset += boundary_offset;
    }

    fn reset_in(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.duration_since(self.last_reset))
    }
}

impl QuotaConnector {
    /// Create a new quota wrapper around an existing connector.
    pub fn new(inner: Arc<dyn DssConnector>, config: &QuotaConfig) -> Self {
        Self {
            inner,
            runtime: Mutex::new(QuotaRuntime {
                limit: config.limit,
                window: config.window,
                calls_made_in_window: 0,
                last_reset: Instant::now(),
            }),
        }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn DssConnector> {
        &self.inner
    }

    /// Consume one unit of budget.
    ///
    /// # Errors
    /// Returns `DssError::QuotaExceeded` when the current window is
    /// exhausted; `reset_in_ms` is the time until the next window opens.
    pub fn should_allow_call(&self) -> Result<(), DssError> {
        let mut rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        rt.roll(now);

        if rt.calls_made_in_window < rt.limit {
            rt.calls_made_in_window += 1;
            return Ok(());
        }

        let err = DssError::QuotaExceeded {
            remaining: rt.limit.saturating_sub(rt.calls_made_in_window),
            reset_in_ms: rt.reset_in(now).as_millis().try_into().unwrap_or(u64::MAX),
        };
        drop(rt);
        Err(err)
    }

    /// Budget snapshot without consuming anything.
    pub fn quota_state(&self) -> QuotaState {
        let mut rt = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        rt.roll(now);
        QuotaState {
            limit: rt.limit,
            remaining: rt.limit.saturating_sub(rt.calls_made_in_window),
            reset_in: rt.reset_in(now),
        }
    }
}

/// Middleware config for constructing a [`QuotaConnector`].
pub struct QuotaMiddleware {
    /// Budget applied by the layer.
    pub config: QuotaConfig,
}

impl QuotaMiddleware {
    /// Layer with the given budget.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn DssConnector>) -> Arc<dyn DssConnector> {
        Arc::new(QuotaConnector::new(inner, &self.config))
    }

    fn name(&self) -> &'static str {
        "QuotaConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": u64::try_from(self.config.window.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

impl DssConnector for QuotaConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    datascope_core::dss_connector_accessors!(inner);
}

#[async_trait]
impl ExtractionProvider for QuotaConnector {
    async fn submit(
        &self,
        token: &AuthToken,
        body: &RequestBody,
        endpoint: ExtractEndpoint,
    ) -> Result<ExtractionStatus, DssError> {
        let inner = self
            .inner
            .as_extraction_provider()
            .ok_or_else(|| DssError::unsupported("extraction/submit"))?;
        if let Err(e) = self.should_allow_call() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "extraction submission blocked by quota");
            return Err(e);
        }
        inner.submit(token, body, endpoint).await
    }

    async fn poll(&self, token: &AuthToken, location: &str) -> Result<ExtractionStatus, DssError> {
        self.inner
            .as_extraction_provider()
            .ok_or_else(|| DssError::unsupported("extraction/poll"))?
            .poll(token, location)
            .await
    }
}

datascope_core::dss_delegate_provider_impls!(QuotaConnector, inner, skip[extraction]);
