//! datascope-middleware
//!
//! Connector wrappers and the builder that stacks them.
//!
//! - [`CachingConnector`]: keeps template field names and bond schedule types
//!   for a configurable time.
//! - [`QuotaConnector`]: fixed-window budget of extraction submissions.
//! - [`ConnectorBuilder`]: composes layers around a raw connector.

mod builder;
mod cache;
mod quota;

pub use crate::builder::ConnectorBuilder;
pub use crate::cache::{CacheMiddleware, CachingConnector};
pub use crate::quota::{QuotaConnector, QuotaMiddleware};
pub use datascope_types::{CacheConfig, QuotaConfig, QuotaState};
