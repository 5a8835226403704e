//! datascope-core
//!
//! Core types, traits, and utilities shared across the datascope workspace.
//!
//! - `identifiers`: instrument identifiers, type normalization and CSV loading.
//! - `templates`: short-code lookups for the vendor's report templates.
//! - `request`: the typed extraction request model and its builders.
//! - `table`: a thin column-ordered table for extraction contents.
//! - `extraction`: parsed extraction, validation and field-name responses.
//! - `connector`: the `DssConnector` trait and capability provider traits.
//! - `poll`: the asynchronous extraction poll loop.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The poll loop sleeps with `tokio::time`, so extractions must be awaited
//! under a Tokio 1.x runtime. Tests drive it with a paused clock.
#![warn(missing_docs)]

/// Connector capability traits and the primary `DssConnector` interface.
pub mod connector;
/// Parsed responses: extraction results, validation reports, field names.
pub mod extraction;
/// Instrument identifiers and instrument list loading.
pub mod identifiers;
/// Middleware trait implemented by connector wrappers.
pub mod middleware;
/// The asynchronous extraction poll loop.
pub mod poll;
/// Extraction request model and builders.
pub mod request;
/// Column-ordered tabular data with CSV output.
pub mod table;
/// Report template short codes.
pub mod templates;

mod wire;

pub use connector::{
    AuthProvider, AuthToken, Credentials, DssConnector, ExtractionProvider, ExtractionStatus,
    MetadataProvider, UserProvider, ValidationProvider,
};
pub use datascope_types::{
    CacheConfig, ConnectorKey, DEFAULT_BASE_URL, DssConfig, DssError, PollConfig, QuotaConfig,
    QuotaState, ValidationOptions,
};
pub use extraction::{
    ExtractionResult, FieldDescriptor, ValidatedInstrument, ValidationReport, ValidationResponse,
};
pub use identifiers::{IdentifierType, InstrumentColumns, InstrumentIdentifier, InstrumentList};
pub use middleware::Middleware;
pub use poll::await_completion;
pub use request::{
    Condition, CorporateActionEvent, DateRange, EventFlags, ExtractEndpoint, ExtractionRequest,
    IdentifierList, RawRequest, RequestBody, RequestBuilder,
};
pub use table::{Record, Table};
pub use templates::{
    CapitalChangeType, DividendsType, EarningsType, EquityOfferingsType, MergersAcquisitionsType,
    PricingTemplate, ReferenceTemplate, ReportTemplateType,
};
