//! Datascope-specific error type and configuration primitives.
#![warn(missing_docs)]

mod config;
mod connector;
mod error;

pub use config::{
    CacheConfig, DEFAULT_BASE_URL, DssConfig, PollConfig, QuotaConfig, QuotaState, ValidationOptions,
};
pub use connector::ConnectorKey;
pub use error::DssError;
