//! Middleware trait for wrapping `DssConnector` implementations.

use std::sync::Arc;

use crate::connector::DssConnector;

/// Trait implemented by connector middleware layers.
///
/// A middleware consumes an inner `DssConnector` and returns a wrapped
/// connector that augments or restricts it (e.g. caching, quotas).
pub trait Middleware: Send + Sync {
    /// Wrap `inner` and return the wrapped connector.
    fn apply(self: Box<Self>, inner: Arc<dyn DssConnector>) -> Arc<dyn DssConnector>;

    /// Middleware name for introspection and logging.
    fn name(&self) -> &'static str;

    /// Configuration snapshot for inspection.
    fn config_json(&self) -> serde_json::Value;
}
