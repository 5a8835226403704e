//! Extraction request model.
//!
//! Requests serialize to the vendor's on-demand body,
//! `{"ExtractionRequest": {"@odata.type": ..., "ContentFieldNames": [...],
//! "IdentifierList": {...}, "Condition": {...}}}`. [`RequestBuilder`] produces
//! every report the client supports; [`RawRequest`] carries a hand-written
//! body loaded from disk.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::identifiers::{IdentifierType, InstrumentList};
use crate::templates::{
    CapitalChangeType, DividendsType, EarningsType, EquityOfferingsType, MergersAcquisitionsType,
    PricingTemplate, ReferenceTemplate, ReportTemplateType,
};
use crate::wire;
use crate::{DssError, ValidationOptions};

/// Namespace prefix of every extraction request `@odata.type`.
pub const ODATA_REQUEST_PREFIX: &str = "#ThomsonReuters.Dss.Api.Extractions.ExtractionRequests.";

/// Leading fields every capital change report carries.
pub const CAPITAL_CHANGE_LEADING_FIELDS: [&str; 2] = ["RIC", "Issue Level Event ID"];

/// Lipper holdings fields requested when a fund allocation report names none.
pub const FUND_ALLOCATION_DEFAULT_FIELDS: [&str; 28] = [
    "Asset SubType Description",
    "Asset Type",
    "Asset Type Description",
    "CUSIP",
    "Identifier Segment Source",
    "Identifier Segment Source Description",
    "Instrument ID",
    "Instrument ID Type",
    "Security Description",
    "Allocation Asset Type",
    "Allocation CUSIP",
    "Allocation Date",
    "Allocation Item",
    "Allocation OrgID",
    "Allocation Percentage",
    "Allocation Rank",
    "Market Value Currency",
    "Market Value Held",
    "RIC",
    "FundSERVAC",
    "FundSERVBE",
    "FundSERVDM",
    "FundSERVDO",
    "FundSERVFE",
    "FundSERVIS",
    "FundSERVLL",
    "FundSERVNL",
    "FundSERVVS",
];

/// Allocation types requested when a fund allocation report names none.
pub const FUND_ALLOCATION_DEFAULT_TYPES: [&str; 2] = ["Currency", "FullHoldings"];

/// Extraction endpoint used to submit a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtractEndpoint {
    /// `Extractions/ExtractWithNotes`: answers `Contents` plus `Notes`.
    #[default]
    WithNotes,
    /// `Extractions/Extract`: answers a bare `value` array.
    Plain,
}

impl ExtractEndpoint {
    /// Path relative to the API root.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::WithNotes => "Extractions/ExtractWithNotes",
            Self::Plain => "Extractions/Extract",
        }
    }
}

/// Validation switches as they appear inside an identifier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListValidationOptions {
    /// Accept delisted instruments with history.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_bool_str"
    )]
    pub allow_historical_instruments: Option<bool>,
    /// Accept inactive instruments.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_bool_str"
    )]
    pub allow_inactive_instruments: Option<bool>,
    /// Accept open-access instruments.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_bool_str"
    )]
    pub allow_open_access_instruments: Option<bool>,
}

impl ListValidationOptions {
    /// Only `AllowHistoricalInstruments: "true"`.
    #[must_use]
    pub const fn historical_only() -> Self {
        Self {
            allow_historical_instruments: Some(true),
            allow_inactive_instruments: None,
            allow_open_access_instruments: None,
        }
    }
}

impl From<ValidationOptions> for ListValidationOptions {
    fn from(v: ValidationOptions) -> Self {
        Self {
            allow_historical_instruments: Some(v.allow_historical_instruments),
            allow_inactive_instruments: Some(v.allow_inactive_instruments),
            allow_open_access_instruments: Some(v.allow_open_access_instruments),
        }
    }
}

/// Filter of an instrument criteria list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "@odata.type")]
pub enum CriteriaFilter {
    /// Boolean subject filter, e.g. `"All"`.
    #[serde(rename = "#ThomsonReuters.Dss.Api.Extractions.SubjectLists.BooleanFilter")]
    Boolean {
        /// Filter value.
        #[serde(rename = "Value")]
        value: String,
    },
}

/// Instruments a request applies to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@odata.type")]
pub enum IdentifierList {
    /// Explicit identifiers.
    #[serde(
        rename = "#ThomsonReuters.Dss.Api.Extractions.ExtractionRequests.InstrumentIdentifierList",
        rename_all = "PascalCase"
    )]
    Identifiers {
        /// The instruments.
        instrument_identifiers: InstrumentList,
        /// Validation switches; `None` sends an explicit `null`.
        validation_options: Option<ListValidationOptions>,
        /// Whether the account's stored preferences override the switches.
        #[serde(
            skip_serializing_if = "Option::is_none",
            serialize_with = "wire::opt_bool_str"
        )]
        use_user_preferences_for_validation_options: Option<bool>,
    },
    /// Instruments selected by criteria rather than listed.
    #[serde(
        rename = "#ThomsonReuters.Dss.Api.Extractions.ExtractionRequests.InstrumentCriteriaList",
        rename_all = "PascalCase"
    )]
    Criteria {
        /// Subject filters.
        filters: Vec<CriteriaFilter>,
        /// Identifier type reported back for matched instruments.
        preferred_identifier_type: IdentifierType,
    },
}

impl IdentifierList {
    /// Identifier list carrying the session's validation options.
    #[must_use]
    pub fn with_options(instruments: InstrumentList, options: ValidationOptions) -> Self {
        Self::Identifiers {
            instrument_identifiers: instruments,
            validation_options: Some(options.into()),
            use_user_preferences_for_validation_options: None,
        }
    }

    /// Number of explicit identifiers; zero for criteria lists.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Identifiers {
                instrument_identifiers,
                ..
            } => instrument_identifiers.len(),
            Self::Criteria { .. } => 0,
        }
    }

    /// True when no explicit identifiers are listed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a query covers a date range or the changes since the last run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateRangeType {
    /// Between `QueryStartDate` and `QueryEndDate`.
    Range,
    /// Changes since the previous extraction.
    Delta,
}

/// Inclusive query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a window.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DssError> {
        if start > end {
            return Err(DssError::InvalidArg(format!(
                "query start {start} is after query end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// First day of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

/// `LimitReportToTodaysData` condition of the pricing templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PricingCondition {
    /// Only report prices from today.
    #[serde(serialize_with = "wire::bool_str")]
    pub limit_report_to_todays_data: bool,
}

/// Date range condition of the history templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RangeCondition {
    /// Always `Range`.
    pub report_date_range_type: DateRangeType,
    /// First day.
    #[serde(serialize_with = "wire::vendor_date")]
    pub query_start_date: NaiveDate,
    /// Last day.
    #[serde(serialize_with = "wire::vendor_date")]
    pub query_end_date: NaiveDate,
}

impl From<DateRange> for RangeCondition {
    fn from(r: DateRange) -> Self {
        Self {
            report_date_range_type: DateRangeType::Range,
            query_start_date: r.start,
            query_end_date: r.end,
        }
    }
}

/// Bond schedule type filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BondScheduleCondition {
    /// Schedule type codes, e.g. `"CALL"`.
    pub bond_schedule_type_codes: Vec<String>,
}

/// Single historical price date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceDateCondition {
    /// Day to price, sent as midnight UTC.
    #[serde(serialize_with = "wire::vendor_date")]
    pub price_date: NaiveDate,
}

/// Fund allocation breakdowns to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FundAllocationCondition {
    /// Allocation types, e.g. `"Currency"` or `"FullHoldings"`.
    pub fund_allocation_types: Vec<String>,
}

/// Condition of the standard corporate actions report.
///
/// Every event class has its own include switch; the single-event builders
/// enable exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct CorporateActionsCondition {
    pub report_date_range_type: DateRangeType,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_vendor_date"
    )]
    pub query_start_date: Option<NaiveDate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_vendor_date"
    )]
    pub query_end_date: Option<NaiveDate>,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_instruments_with_no_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_null_dates: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub exclude_deleted_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_capital_change_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_dividend_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_earnings_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_mergers_and_acquisitions_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_nominal_value_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_public_equity_offerings_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_shares_outstanding_events: bool,
    #[serde(serialize_with = "wire::bool_str")]
    pub include_voting_rights_events: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_capital_change_type: Option<CapitalChangeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_dividends_type: Option<DividendsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_earnings_type: Option<EarningsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_equity_offerings_type: Option<EquityOfferingsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_mergers_acquisitions_type: Option<MergersAcquisitionsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_shares_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corporate_actions_voting_rights_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_amount_types: Option<Vec<String>>,
}

impl CorporateActionsCondition {
    fn base(range_type: DateRangeType, range: Option<DateRange>, flags: EventFlags) -> Self {
        Self {
            report_date_range_type: range_type,
            query_start_date: range.map(|r| r.start),
            query_end_date: range.map(|r| r.end),
            include_instruments_with_no_events: flags.include_instruments_with_no_events,
            include_null_dates: flags.include_null_dates,
            exclude_deleted_events: flags.exclude_deleted_events,
            include_capital_change_events: false,
            include_dividend_events: false,
            include_earnings_events: false,
            include_mergers_and_acquisitions_events: false,
            include_nominal_value_events: false,
            include_public_equity_offerings_events: false,
            include_shares_outstanding_events: false,
            include_voting_rights_events: false,
            corporate_actions_capital_change_type: None,
            corporate_actions_dividends_type: None,
            corporate_actions_earnings_type: None,
            corporate_actions_equity_offerings_type: None,
            corporate_actions_mergers_acquisitions_type: None,
            corporate_actions_shares_type: None,
            corporate_actions_voting_rights_type: None,
            share_amount_types: None,
        }
    }

    /// Number of event classes switched on.
    #[must_use]
    pub fn enabled_event_classes(&self) -> usize {
        [
            self.include_capital_change_events,
            self.include_dividend_events,
            self.include_earnings_events,
            self.include_mergers_and_acquisitions_events,
            self.include_nominal_value_events,
            self.include_public_equity_offerings_events,
            self.include_shares_outstanding_events,
            self.include_voting_rights_events,
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }
}

/// Per-template extraction condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Condition {
    /// Pricing templates.
    Pricing(PricingCondition),
    /// Price history and historical reference.
    Range(RangeCondition),
    /// Bond schedules.
    BondSchedule(BondScheduleCondition),
    /// Single historical price.
    PriceDate(PriceDateCondition),
    /// Fund allocation.
    FundAllocation(FundAllocationCondition),
    /// Standard corporate actions.
    CorporateActions(Box<CorporateActionsCondition>),
}

/// Switches shared by every corporate actions report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFlags {
    /// Report instruments that had no event in the window.
    pub include_instruments_with_no_events: bool,
    /// Include events with no date. Only meaningful for all-history queries.
    pub include_null_dates: bool,
    /// Only currently valid records.
    pub exclude_deleted_events: bool,
}

impl Default for EventFlags {
    fn default() -> Self {
        Self {
            include_instruments_with_no_events: true,
            include_null_dates: true,
            exclude_deleted_events: true,
        }
    }
}

/// Event class of a standard corporate actions report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorporateActionEvent {
    /// Capital changes, selected by the given date.
    CapitalChange(CapitalChangeType),
    /// Dividends, selected by the given date.
    Dividends(DividendsType),
    /// Earnings, selected by the given date.
    Earnings(EarningsType),
    /// Mergers and acquisitions, selected by the given date.
    MergersAcquisitions(MergersAcquisitionsType),
    /// Nominal value changes.
    NominalValue,
    /// Public equity offerings.
    EquityOfferings(EquityOfferingsType),
    /// Shares outstanding, for the given share amount types.
    SharesOutstanding {
        /// E.g. `"Issued"`, `"Outstanding"`, `"FreeFloat"`.
        share_amount_types: Vec<String>,
    },
    /// Voting rights.
    VotingRights,
}

impl CorporateActionEvent {
    /// Flags used when the caller does not pass any.
    ///
    /// Capital change, dividend and M&A reports leave out instruments without
    /// events; the other classes keep them.
    #[must_use]
    pub fn default_flags(&self) -> EventFlags {
        let include_instruments_with_no_events = !matches!(
            self,
            Self::CapitalChange(_) | Self::Dividends(_) | Self::MergersAcquisitions(_)
        );
        EventFlags {
            include_instruments_with_no_events,
            ..EventFlags::default()
        }
    }

    /// CLI name of the event class.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CapitalChange(_) => "capital-change",
            Self::Dividends(_) => "dividends",
            Self::Earnings(_) => "earnings",
            Self::MergersAcquisitions(_) => "mergers-acquisitions",
            Self::NominalValue => "nominal-value",
            Self::EquityOfferings(_) => "equity-offerings",
            Self::SharesOutstanding { .. } => "shares-outstanding",
            Self::VotingRights => "voting-rights",
        }
    }

    fn apply(&self, c: &mut CorporateActionsCondition) {
        match self {
            Self::CapitalChange(t) => {
                c.include_capital_change_events = true;
                c.corporate_actions_capital_change_type = Some(*t);
            }
            Self::Dividends(t) => {
                c.include_dividend_events = true;
                c.corporate_actions_dividends_type = Some(*t);
            }
            Self::Earnings(t) => {
                c.include_earnings_events = true;
                c.corporate_actions_earnings_type = Some(*t);
            }
            Self::MergersAcquisitions(t) => {
                c.include_mergers_and_acquisitions_events = true;
                c.corporate_actions_mergers_acquisitions_type = Some(*t);
            }
            Self::NominalValue => c.include_nominal_value_events = true,
            Self::EquityOfferings(t) => {
                c.include_public_equity_offerings_events = true;
                c.corporate_actions_equity_offerings_type = Some(*t);
            }
            Self::SharesOutstanding { share_amount_types } => {
                c.include_shares_outstanding_events = true;
                c.corporate_actions_shares_type = Some("SharesAmountDate".to_string());
                c.share_amount_types = Some(if share_amount_types.is_empty() {
                    vec!["Issued".to_string()]
                } else {
                    share_amount_types.clone()
                });
            }
            Self::VotingRights => {
                c.include_voting_rights_events = true;
                c.corporate_actions_voting_rights_type = Some("VotingRightsDate".to_string());
            }
        }
    }
}

/// A typed on-demand extraction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtractionRequest {
    /// Fully qualified request type.
    #[serde(rename = "@odata.type")]
    pub odata_type: String,
    /// Requested fields, in report column order.
    pub content_field_names: Vec<String>,
    /// Instruments to report on.
    pub identifier_list: IdentifierList,
    /// Template condition, omitted for templates that take none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl ExtractionRequest {
    /// Build a request for a bare request type name such as
    /// `"CompositeExtractionRequest"`.
    pub fn new(
        request_type: &str,
        content_field_names: Vec<String>,
        identifier_list: IdentifierList,
        condition: Option<Condition>,
    ) -> Self {
        Self {
            odata_type: format!("{ODATA_REQUEST_PREFIX}{request_type}"),
            content_field_names,
            identifier_list,
            condition,
        }
    }

    /// Request type without the namespace prefix.
    #[must_use]
    pub fn request_type(&self) -> &str {
        self.odata_type
            .strip_prefix(ODATA_REQUEST_PREFIX)
            .unwrap_or(&self.odata_type)
    }

    /// Template family of this request, if it is one the client knows.
    #[must_use]
    pub fn report_template_type(&self) -> Option<ReportTemplateType> {
        ReportTemplateType::from_request_type(&self.odata_type)
    }
}

/// Body posted to an extraction endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Built with [`RequestBuilder`].
    Typed(ExtractionRequest),
    /// Loaded verbatim, see [`RawRequest`].
    Raw(Value),
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "ExtractionRequest")]
    extraction_request: &'a ExtractionRequest,
}

impl Serialize for RequestBody {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Typed(req) => Envelope {
                extraction_request: req,
            }
            .serialize(s),
            Self::Raw(v) => v.serialize(s),
        }
    }
}

impl From<ExtractionRequest> for RequestBody {
    fn from(r: ExtractionRequest) -> Self {
        Self::Typed(r)
    }
}

impl From<RawRequest> for RequestBody {
    fn from(r: RawRequest) -> Self {
        Self::Raw(r.0)
    }
}

impl RequestBody {
    /// The request's `@odata.type`.
    #[must_use]
    pub fn odata_type(&self) -> Option<&str> {
        match self {
            Self::Typed(r) => Some(&r.odata_type),
            Self::Raw(v) => v
                .pointer("/ExtractionRequest/@odata.type")
                .and_then(Value::as_str),
        }
    }

    /// Template family of the request, if recognised.
    #[must_use]
    pub fn report_template_type(&self) -> Option<ReportTemplateType> {
        self.odata_type()
            .and_then(ReportTemplateType::from_request_type)
    }

    /// Requested field names.
    #[must_use]
    pub fn content_field_names(&self) -> Vec<String> {
        match self {
            Self::Typed(r) => r.content_field_names.clone(),
            Self::Raw(v) => v
                .pointer("/ExtractionRequest/ContentFieldNames")
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Serialize to a JSON value.
    ///
    /// # Errors
    /// Returns `DssError::Data` if serialization fails.
    pub fn to_value(&self) -> Result<Value, DssError> {
        serde_json::to_value(self).map_err(|e| DssError::Data(format!("request body: {e}")))
    }
}

/// Builds typed requests for one instrument list.
///
/// Fields passed with [`RequestBuilder::fields`] are appended after any
/// fields the template itself mandates.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    instruments: InstrumentList,
    validation: ValidationOptions,
    fields: Vec<String>,
}

impl RequestBuilder {
    /// Start a request over `instruments` with default validation options.
    #[must_use]
    pub fn new(instruments: InstrumentList) -> Self {
        Self {
            instruments,
            validation: ValidationOptions::default(),
            fields: Vec::new(),
        }
    }

    /// Validation options attached to the identifier list.
    #[must_use]
    pub const fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation = options;
        self
    }

    /// Content field names, in report column order.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn list(&self) -> IdentifierList {
        IdentifierList::with_options(self.instruments.clone(), self.validation)
    }

    fn build(self, template: ReportTemplateType, condition: Option<Condition>) -> ExtractionRequest {
        let list = self.list();
        ExtractionRequest::new(template.request_type(), self.fields, list, condition)
    }

    /// Composite report.
    #[must_use]
    pub fn composite(self) -> ExtractionRequest {
        self.build(ReportTemplateType::Composite, None)
    }

    /// End of day or premium pricing.
    #[must_use]
    pub fn pricing(self, template: PricingTemplate, today_only: bool) -> ExtractionRequest {
        let list = self.list();
        ExtractionRequest::new(
            template.wire_name(),
            self.fields,
            list,
            Some(Condition::Pricing(PricingCondition {
                limit_report_to_todays_data: today_only,
            })),
        )
    }

    /// Price history over a window.
    #[must_use]
    pub fn price_history(self, range: DateRange) -> ExtractionRequest {
        self.build(
            ReportTemplateType::PriceHistory,
            Some(Condition::Range(range.into())),
        )
    }

    /// Intraday pricing snapshot.
    #[must_use]
    pub fn intraday_pricing(self) -> ExtractionRequest {
        self.build(ReportTemplateType::IntradayPricing, None)
    }

    /// Reference data template.
    #[must_use]
    pub fn reference(self, template: ReferenceTemplate) -> ExtractionRequest {
        let list = self.list();
        ExtractionRequest::new(template.wire_name(), self.fields, list, None)
    }

    /// Bond schedules of the given types; see the bond schedule type lookup.
    #[must_use]
    pub fn bond_schedule<I, S>(self, type_codes: I) -> ExtractionRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes = type_codes.into_iter().map(Into::into).collect();
        self.build(
            ReportTemplateType::BondSchedule,
            Some(Condition::BondSchedule(BondScheduleCondition {
                bond_schedule_type_codes: codes,
            })),
        )
    }

    /// Historical reference data over a window.
    ///
    /// Historical instruments are always allowed and the account's stored
    /// validation preferences are ignored.
    #[must_use]
    pub fn historical_reference(self, range: DateRange) -> ExtractionRequest {
        let list = IdentifierList::Identifiers {
            instrument_identifiers: self.instruments,
            validation_options: Some(ListValidationOptions::historical_only()),
            use_user_preferences_for_validation_options: Some(false),
        };
        ExtractionRequest::new(
            ReportTemplateType::HistoricalReference.request_type(),
            self.fields,
            list,
            Some(Condition::Range(range.into())),
        )
    }

    /// Price on a single past day.
    #[must_use]
    pub fn single_historical_price(self, date: NaiveDate) -> ExtractionRequest {
        self.build(
            ReportTemplateType::SingleHistoricalPrice,
            Some(Condition::PriceDate(PriceDateCondition { price_date: date })),
        )
    }

    /// Fund holdings from Lipper.
    ///
    /// With no fields set the standard Lipper holdings set is requested; with
    /// no allocation types, currency and full holdings. Identifier validation
    /// is left entirely to the vendor.
    #[must_use]
    pub fn fund_allocation(self, allocation_types: &[String]) -> ExtractionRequest {
        let fields = if self.fields.is_empty() {
            FUND_ALLOCATION_DEFAULT_FIELDS
                .iter()
                .map(|f| (*f).to_string())
                .collect()
        } else {
            self.fields
        };
        let types = if allocation_types.is_empty() {
            FUND_ALLOCATION_DEFAULT_TYPES
                .iter()
                .map(|t| (*t).to_string())
                .collect()
        } else {
            allocation_types.to_vec()
        };
        let list = IdentifierList::Identifiers {
            instrument_identifiers: self.instruments,
            validation_options: None,
            use_user_preferences_for_validation_options: Some(false),
        };
        ExtractionRequest::new(
            ReportTemplateType::FundAllocation.request_type(),
            fields,
            list,
            Some(Condition::FundAllocation(FundAllocationCondition {
                fund_allocation_types: types,
            })),
        )
    }

    /// Standard corporate actions report for one event class.
    ///
    /// Capital change reports lead with [`CAPITAL_CHANGE_LEADING_FIELDS`].
    /// Requested fields already in that list are dropped rather than sent
    /// twice; every other field keeps its requested order.
    #[must_use]
    pub fn corporate_actions(
        self,
        range: DateRange,
        event: &CorporateActionEvent,
        flags: EventFlags,
    ) -> ExtractionRequest {
        let mut condition =
            CorporateActionsCondition::base(DateRangeType::Range, Some(range), flags);
        event.apply(&mut condition);

        let mut fields: Vec<String> = Vec::new();
        if matches!(event, CorporateActionEvent::CapitalChange(_)) {
            fields.extend(CAPITAL_CHANGE_LEADING_FIELDS.iter().map(|f| (*f).to_string()));
        }
        for f in &self.fields {
            if !fields.contains(f) {
                fields.push(f.clone());
            }
        }

        let list = self.list();
        ExtractionRequest::new(
            ReportTemplateType::CorporateActions.request_type(),
            fields,
            list,
            Some(Condition::CorporateActions(Box::new(condition))),
        )
    }

    /// Capital change events; `RIC` and `Issue Level Event ID` lead the fields.
    #[must_use]
    pub fn corax_capital_change(self, range: DateRange, kind: CapitalChangeType) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::CapitalChange(kind))
    }

    /// Dividend events.
    #[must_use]
    pub fn corax_dividend(self, range: DateRange, kind: DividendsType) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::Dividends(kind))
    }

    /// Earnings events.
    #[must_use]
    pub fn corax_earnings(self, range: DateRange, kind: EarningsType) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::Earnings(kind))
    }

    /// Merger and acquisition events.
    #[must_use]
    pub fn corax_mergers_acquisitions(
        self,
        range: DateRange,
        kind: MergersAcquisitionsType,
    ) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::MergersAcquisitions(kind))
    }

    /// Nominal value events.
    #[must_use]
    pub fn corax_nominal_value(self, range: DateRange) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::NominalValue)
    }

    /// Public equity offering events.
    #[must_use]
    pub fn corax_equity_offerings(
        self,
        range: DateRange,
        kind: EquityOfferingsType,
    ) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::EquityOfferings(kind))
    }

    /// Shares outstanding; an empty type list means `["Issued"]`.
    #[must_use]
    pub fn corax_shares_outstanding(
        self,
        range: DateRange,
        share_amount_types: Vec<String>,
    ) -> ExtractionRequest {
        self.corporate_actions_default(
            range,
            CorporateActionEvent::SharesOutstanding { share_amount_types },
        )
    }

    /// Voting rights events.
    #[must_use]
    pub fn corax_voting_rights(self, range: DateRange) -> ExtractionRequest {
        self.corporate_actions_default(range, CorporateActionEvent::VotingRights)
    }

    fn corporate_actions_default(
        self,
        range: DateRange,
        event: CorporateActionEvent,
    ) -> ExtractionRequest {
        let flags = event.default_flags();
        self.corporate_actions(range, &event, flags)
    }
}

/// All-events corporate actions delta over every instrument matching `filter`.
///
/// Unlike the single-event reports this one selects instruments by criteria
/// and reports changes since the previous run, so no date window is sent.
#[must_use]
pub fn corporate_actions_delta(
    fields: Vec<String>,
    filter: &str,
    preferred_identifier_type: IdentifierType,
    flags: EventFlags,
) -> ExtractionRequest {
    let mut c = CorporateActionsCondition::base(DateRangeType::Delta, None, flags);
    for event in [
        CorporateActionEvent::CapitalChange(CapitalChangeType::Announcement),
        CorporateActionEvent::Dividends(DividendsType::Ex),
        CorporateActionEvent::Earnings(EarningsType::Announcement),
        CorporateActionEvent::MergersAcquisitions(MergersAcquisitionsType::Announcement),
        CorporateActionEvent::NominalValue,
        CorporateActionEvent::EquityOfferings(EquityOfferingsType::AllPending),
        CorporateActionEvent::SharesOutstanding {
            share_amount_types: Vec::new(),
        },
        CorporateActionEvent::VotingRights,
    ] {
        event.apply(&mut c);
    }
    let list = IdentifierList::Criteria {
        filters: vec![CriteriaFilter::Boolean {
            value: filter.to_string(),
        }],
        preferred_identifier_type,
    };
    ExtractionRequest::new(
        ReportTemplateType::CorporateActions.request_type(),
        fields,
        list,
        Some(Condition::CorporateActions(Box::new(c))),
    )
}

/// A request body loaded verbatim, typically exported from the vendor's
/// request builder.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest(Value);

impl RawRequest {
    /// Wrap a JSON body.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` unless the body has an
    /// `ExtractionRequest` object.
    pub fn from_value(value: Value) -> Result<Self, DssError> {
        if !value.get("ExtractionRequest").is_some_and(Value::is_object) {
            return Err(DssError::InvalidArg(
                "raw request must contain an ExtractionRequest object".into(),
            ));
        }
        Ok(Self(value))
    }

    /// Load a JSON body from disk.
    ///
    /// # Errors
    /// Returns `DssError::Io` when the file cannot be read and
    /// `DssError::InvalidArg` when it is not a request body.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DssError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DssError::Io(format!("{}: {e}", path.display())))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| DssError::InvalidArg(format!("{}: {e}", path.display())))?;
        Self::from_value(value)
    }

    fn extraction_request_mut(&mut self) -> Result<&mut Map<String, Value>, DssError> {
        self.0
            .get_mut("ExtractionRequest")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| DssError::InvalidArg("missing ExtractionRequest".into()))
    }

    /// Append instruments to `IdentifierList.InstrumentIdentifiers`.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when the body has no identifier list
    /// object or its identifiers are not an array.
    pub fn with_instruments(mut self, instruments: &InstrumentList) -> Result<Self, DssError> {
        let req = self.extraction_request_mut()?;
        let list = req
            .get_mut("IdentifierList")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| DssError::InvalidArg("raw request has no IdentifierList".into()))?;
        let ids = list
            .entry("InstrumentIdentifiers")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| DssError::InvalidArg("InstrumentIdentifiers is not an array".into()))?;
        for id in instruments {
            let v = serde_json::to_value(id)
                .map_err(|e| DssError::Data(format!("instrument identifier: {e}")))?;
            ids.push(v);
        }
        Ok(self)
    }

    /// Set `Condition.PriceDate`, creating the condition if needed.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when the condition is not an object.
    pub fn with_price_date(mut self, date: NaiveDate) -> Result<Self, DssError> {
        let req = self.extraction_request_mut()?;
        let cond = req
            .entry("Condition")
            .or_insert_with(|| Value::Object(Map::new()));
        if cond.is_null() {
            *cond = Value::Object(Map::new());
        }
        let cond = cond
            .as_object_mut()
            .ok_or_else(|| DssError::InvalidArg("Condition is not an object".into()))?;
        cond.insert(
            "PriceDate".into(),
            Value::String(date.format(wire::VENDOR_DATE_FORMAT).to_string()),
        );
        Ok(self)
    }

    /// Borrow the body.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Convert into a postable body.
    #[must_use]
    pub fn into_body(self) -> RequestBody {
        RequestBody::Raw(self.0)
    }
}
