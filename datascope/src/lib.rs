//! datascope
//!
//! A stateful client for the DataScope Select REST extraction API.
//!
//! A [`Session`] authenticates once, loads and optionally validates an
//! instrument list, stores the selected report request and runs it:
//!
//! ```rust,ignore
//! use datascope::{ExportTarget, PricingTemplate, Session};
//!
//! let mut session = Session::builder()
//!     .credentials(std::env::var("DSS_USERNAME").unwrap_or_default(), std::env::var("DSS_PASSWORD").unwrap_or_default())
//!     .build()
//!     .await?;
//! session.load_csv("instruments.csv", true).await?;
//! session.price(PricingTemplate::EndOfDay, ["Trade Date", "Universal Close Price"], false);
//! let result = session.export(ExportTarget::contents("prices.csv")).await?;
//! println!("{} rows", result.contents.len());
//! ```
//!
//! Extractions run one at a time. A request the vendor accepts with `202` is
//! polled at the configured fixed interval until it completes; set
//! `max_poll_attempts` or `poll_timeout` on the builder to bound the wait.
//!
//! Features
//! --------
//! - `tracing`: spans and events across the session, HTTP connector and
//!   middleware.
//! - `dataframe`: `Table::to_polars`.
#![warn(missing_docs)]

mod core;
mod export;
mod session;

pub use crate::core::{Session, SessionBuilder};
pub use export::{ExportTarget, write_files};

pub use datascope_core::{
    AuthToken, CapitalChangeType, Condition, CorporateActionEvent, Credentials, DateRange,
    DividendsType, DssConfig, DssConnector, DssError, EarningsType, EquityOfferingsType,
    EventFlags, ExtractEndpoint, ExtractionRequest, ExtractionResult, ExtractionStatus,
    FieldDescriptor, IdentifierList, IdentifierType, InstrumentColumns, InstrumentIdentifier,
    InstrumentList, MergersAcquisitionsType, PollConfig, PricingTemplate, RawRequest,
    ReferenceTemplate, ReportTemplateType, RequestBody, RequestBuilder, Table, ValidationOptions,
    ValidationReport, ValidationResponse,
};
pub use datascope_http::{HttpConnector, HttpConnectorBuilder};
pub use datascope_middleware::{CacheConfig, ConnectorBuilder, QuotaConfig};
