//! Report selection. Each setter builds a request over the loaded
//! instruments and stores it as the pending request; the last one set wins.

use chrono::NaiveDate;

use crate::Session;
use datascope_core::request::corporate_actions_delta;
use datascope_core::{
    CapitalChangeType, CorporateActionEvent, DateRange, DividendsType, DssError, EarningsType,
    EquityOfferingsType, EventFlags, ExtractionRequest, IdentifierType, MergersAcquisitionsType,
    PricingTemplate, RawRequest, ReferenceTemplate, RequestBody, RequestBuilder,
};

impl Session {
    fn request_builder<I, S>(&self, fields: I) -> RequestBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RequestBuilder::new(self.instruments.clone())
            .validation_options(self.cfg.validation_options)
            .fields(fields)
    }

    fn set_pending(&mut self, request: ExtractionRequest) -> &mut Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            request = request.request_type(),
            fields = request.content_field_names.len(),
            "report selected"
        );
        self.pending = Some(RequestBody::Typed(request));
        self
    }

    /// Pending request, if a report has been selected.
    #[must_use]
    pub const fn pending_request(&self) -> Option<&RequestBody> {
        self.pending.as_ref()
    }

    /// Drop the pending request.
    pub fn clear_request(&mut self) {
        self.pending = None;
    }

    /// Composite report.
    pub fn composite<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).composite();
        self.set_pending(req)
    }

    /// End of day or premium pricing; `today_only` limits the report to
    /// today's prices.
    pub fn price<I, S>(&mut self, template: PricingTemplate, fields: I, today_only: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).pricing(template, today_only);
        self.set_pending(req)
    }

    /// Price history over `range`.
    pub fn price_history<I, S>(&mut self, fields: I, range: DateRange) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).price_history(range);
        self.set_pending(req)
    }

    /// Intraday pricing snapshot.
    pub fn price_intraday<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).intraday_pricing();
        self.set_pending(req)
    }

    /// Reference data template.
    pub fn reference<I, S>(&mut self, template: ReferenceTemplate, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).reference(template);
        self.set_pending(req)
    }

    /// Bond schedules of the given type codes.
    pub fn bond_schedule<I, S>(&mut self, fields: I, type_codes: &[String]) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self
            .request_builder(fields)
            .bond_schedule(type_codes.iter().cloned());
        self.set_pending(req)
    }

    /// Historical reference data over `range`.
    pub fn historical_reference<I, S>(&mut self, fields: I, range: DateRange) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).historical_reference(range);
        self.set_pending(req)
    }

    /// Price on a single past day.
    pub fn single_historical_price<I, S>(&mut self, fields: I, date: NaiveDate) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).single_historical_price(date);
        self.set_pending(req)
    }

    /// Lipper fund holdings. Empty `fields` or `allocation_types` fall back to
    /// the standard holdings set.
    pub fn fund_allocation<I, S>(&mut self, fields: I, allocation_types: &[String]) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).fund_allocation(allocation_types);
        self.set_pending(req)
    }

    /// Standard corporate actions report for one event class with explicit
    /// flags.
    pub fn corax<I, S>(
        &mut self,
        fields: I,
        range: DateRange,
        event: &CorporateActionEvent,
        flags: EventFlags,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self
            .request_builder(fields)
            .corporate_actions(range, event, flags);
        self.set_pending(req)
    }

    /// Capital change events.
    pub fn corax_capital_change<I, S>(
        &mut self,
        fields: I,
        range: DateRange,
        kind: CapitalChangeType,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).corax_capital_change(range, kind);
        self.set_pending(req)
    }

    /// Dividend events.
    pub fn corax_dividend<I, S>(&mut self, fields: I, range: DateRange, kind: DividendsType) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).corax_dividend(range, kind);
        self.set_pending(req)
    }

    /// Earnings events.
    pub fn corax_earnings<I, S>(&mut self, fields: I, range: DateRange, kind: EarningsType) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).corax_earnings(range, kind);
        self.set_pending(req)
    }

    /// Merger and acquisition events.
    pub fn corax_mergers_acquisitions<I, S>(
        &mut self,
        fields: I,
        range: DateRange,
        kind: MergersAcquisitionsType,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self
            .request_builder(fields)
            .corax_mergers_acquisitions(range, kind);
        self.set_pending(req)
    }

    /// Nominal value events.
    pub fn corax_nominal_value<I, S>(&mut self, fields: I, range: DateRange) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).corax_nominal_value(range);
        self.set_pending(req)
    }

    /// Public equity offering events.
    pub fn corax_equity_offerings<I, S>(
        &mut self,
        fields: I,
        range: DateRange,
        kind: EquityOfferingsType,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self
            .request_builder(fields)
            .corax_equity_offerings(range, kind);
        self.set_pending(req)
    }

    /// Shares outstanding; an empty type list means `Issued`.
    pub fn corax_shares_outstanding<I, S>(
        &mut self,
        fields: I,
        range: DateRange,
        share_amount_types: Vec<String>,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self
            .request_builder(fields)
            .corax_shares_outstanding(range, share_amount_types);
        self.set_pending(req)
    }

    /// Voting rights events.
    pub fn corax_voting_rights<I, S>(&mut self, fields: I, range: DateRange) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let req = self.request_builder(fields).corax_voting_rights(range);
        self.set_pending(req)
    }

    /// All-events delta since the previous run over instruments matching
    /// `filter` (e.g. `"All"`). Loaded instruments are not used.
    pub fn corax_delta<I, S>(
        &mut self,
        fields: I,
        filter: &str,
        preferred_identifier_type: IdentifierType,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(Into::into).collect();
        let req =
            corporate_actions_delta(fields, filter, preferred_identifier_type, EventFlags::default());
        self.set_pending(req)
    }

    /// Use a verbatim request body. Loaded instruments, if any, are appended
    /// to its identifier list.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when instruments are loaded but the body
    /// has no identifier list to append them to.
    pub fn raw_request(&mut self, request: RawRequest) -> Result<&mut Self, DssError> {
        let request = if self.instruments.is_empty() {
            request
        } else {
            request.with_instruments(&self.instruments)?
        };
        self.pending = Some(request.into_body());
        Ok(self)
    }
}
