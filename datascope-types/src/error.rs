use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the datascope workspace.
///
/// This wraps argument validation errors, vendor HTTP failures, connector-tagged
/// failures, session misuse (missing instruments or report template), and the
/// outcomes of the extraction poll loop.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DssError {
    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "extraction/submit").
        capability: String,
    },

    /// Issues with the returned or expected data (missing fields, malformed payloads).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Authentication failed or the token was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The vendor answered with an unexpected HTTP status.
    #[error("http status {status}: {msg}")]
    Http {
        /// HTTP status code returned by the vendor.
        status: u16,
        /// Vendor error message, or the response body when none was provided.
        msg: String,
    },

    /// An individual connector returned an error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "user preferences for 9009214".
        what: String,
    },

    /// A short template code did not match any known template of that kind.
    #[error("invalid {kind} template: {value}")]
    InvalidTemplate {
        /// Template family, e.g. "pricing" or "dividends type".
        kind: String,
        /// The rejected code.
        value: String,
    },

    /// One or more content field names are not valid for the report template.
    #[error("fields not available for {template}: {fields:?}")]
    InvalidFields {
        /// Report template type the fields were checked against.
        template: String,
        /// The rejected field names.
        fields: Vec<String>,
    },

    /// An extraction was requested before any instruments were loaded.
    #[error("missing instruments: load instruments before extracting")]
    MissingInstruments,

    /// An extraction was requested before a report template was selected.
    #[error("missing report template: select a pricing, reference or corporate actions report before extracting")]
    MissingRequest,

    /// The poll loop hit its configured attempt ceiling.
    #[error("extraction still in progress after {attempts} polls: {location}")]
    PollExhausted {
        /// Monitor URL that was being polled.
        location: String,
        /// Number of polls performed.
        attempts: u32,
    },

    /// The poll loop hit its configured overall deadline.
    #[error("extraction timed out: {location}")]
    PollTimeout {
        /// Monitor URL that was being polled.
        location: String,
    },

    /// The request exceeds the configured quota budget for the current window.
    #[error("quota exceeded: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets.
        reset_in_ms: u64,
    },

    /// Local file system failure (reading instruments, writing results).
    #[error("io error: {0}")]
    Io(String),

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl DssError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build an `Http` error.
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self::Http {
            status,
            msg: msg.into(),
        }
    }

    /// Helper: build an `InvalidTemplate` error.
    pub fn invalid_template(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Returns true if repeating the same call later may succeed.
    ///
    /// Server-side failures, poll ceilings and quota rejections are transient;
    /// argument, template and authentication problems are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::PollExhausted { .. } | Self::PollTimeout { .. } | Self::QuotaExceeded { .. } => {
                true
            }
            _ => false,
        }
    }
}

impl From<std::io::Error> for DssError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
