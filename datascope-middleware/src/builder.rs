//! Builder for composing connectors with middleware layers.
//!
//! Layers form an onion around the raw connector. The `layers` vector stores
//! middleware outermost-first (last added is outermost) and `build()` applies
//! them in reverse:
//!
//! ```text
//! builder.with_cache(..).with_quota(..)
//!
//! Storage: [Quota, Cache]
//! Result:  Quota(Cache(Raw))
//! ```

use std::sync::Arc;
use std::time::Duration;

use datascope_core::{DssConnector, Middleware};
use datascope_types::{CacheConfig, QuotaConfig};

use crate::cache::CacheMiddleware;
use crate::quota::QuotaMiddleware;

const QUOTA: &str = "QuotaConnector";
const CACHE: &str = "CachingConnector";

/// Generic middleware builder for composing a connector with layered wrappers.
pub struct ConnectorBuilder {
    raw: Arc<dyn DssConnector>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl ConnectorBuilder {
    /// Create a new builder from a raw, unwrapped connector.
    #[must_use]
    pub fn new(raw: Arc<dyn DssConnector>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    fn existing_quota_config(&self) -> Option<QuotaConfig> {
        let layer = self.layers.iter().find(|l| l.name() == QUOTA)?;
        let cfg = layer.config_json();
        let defaults = QuotaConfig::default();
        let limit = cfg
            .get("limit")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(defaults.limit);
        let window = cfg
            .get("window_ms")
            .and_then(serde_json::Value::as_u64)
            .map_or(defaults.window, Duration::from_millis);
        Some(QuotaConfig { limit, window })
    }

    /// Add or replace the submission quota, as the outermost layer.
    #[must_use]
    pub fn with_quota(mut self, cfg: &QuotaConfig) -> Self {
        self.layers.retain(|m| m.name() != QUOTA);
        self.layers
            .insert(0, Box::new(QuotaMiddleware::new(cfg.clone())));
        self
    }

    /// Remove the quota if present.
    #[must_use]
    pub fn without_quota(mut self) -> Self {
        self.layers.retain(|m| m.name() != QUOTA);
        self
    }

    /// Shortcut: set quota limit only (preserves an existing window).
    #[must_use]
    pub fn quota_limit(self, limit: u64) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.limit = limit;
        self.with_quota(&cfg)
    }

    /// Shortcut: set quota window only (preserves an existing limit).
    #[must_use]
    pub fn quota_window(self, window: Duration) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.window = window;
        self.with_quota(&cfg)
    }

    /// Add or replace the metadata cache, as the outermost layer.
    #[must_use]
    pub fn with_cache(mut self, cfg: &CacheConfig) -> Self {
        self.layers.retain(|m| m.name() != CACHE);
        self.layers.insert(0, Box::new(CacheMiddleware::new(*cfg)));
        self
    }

    /// Remove the cache if present.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.layers.retain(|m| m.name() != CACHE);
        self
    }

    /// Add an arbitrary middleware layer at the outermost position.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Names of the configured layers, outermost first.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Configuration snapshot of every layer, outermost first, with the raw
    /// connector appended as the innermost entry.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut out: Vec<serde_json::Value> = self
            .layers
            .iter()
            .map(|l| serde_json::json!({ "name": l.name(), "config": l.config_json() }))
            .collect();
        out.push(serde_json::json!({
            "name": "RawConnector",
            "config": { "name": self.raw.name() },
        }));
        serde_json::Value::Array(out)
    }

    /// Build the wrapped connector, applying layers innermost first.
    #[must_use]
    pub fn build(self) -> Arc<dyn DssConnector> {
        let mut acc: Arc<dyn DssConnector> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}
