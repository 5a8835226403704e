use chrono::NaiveDate;
use datascope_core::request::{
    CAPITAL_CHANGE_LEADING_FIELDS, Condition, FUND_ALLOCATION_DEFAULT_FIELDS,
    corporate_actions_delta,
};
use datascope_core::{
    CapitalChangeType, CorporateActionEvent, DateRange, DividendsType, DssError, EventFlags,
    ExtractEndpoint, IdentifierType, InstrumentList, PricingTemplate, RawRequest,
    ReferenceTemplate, ReportTemplateType, RequestBody, RequestBuilder, ValidationOptions,
};
use serde_json::{Value, json};

const PREFIX: &str = "#ThomsonReuters.Dss.Api.Extractions.ExtractionRequests.";

fn ibm() -> InstrumentList {
    InstrumentList::single("IBM.N", IdentifierType::Ric, None)
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn body(req: impl Into<RequestBody>) -> Value {
    serde_json::to_value(req.into()).unwrap()
}

fn condition(v: &Value) -> &Value {
    &v["ExtractionRequest"]["Condition"]
}

#[test]
fn composite_envelope_and_validation_options() {
    let v = body(RequestBuilder::new(ibm()).fields(["Close Price"]).composite());
    assert_eq!(
        v,
        json!({
            "ExtractionRequest": {
                "@odata.type": format!("{PREFIX}CompositeExtractionRequest"),
                "ContentFieldNames": ["Close Price"],
                "IdentifierList": {
                    "@odata.type": format!("{PREFIX}InstrumentIdentifierList"),
                    "InstrumentIdentifiers": [{"Identifier": "IBM.N", "IdentifierType": "Ric"}],
                    "ValidationOptions": {
                        "AllowHistoricalInstruments": "true",
                        "AllowInactiveInstruments": "true",
                        "AllowOpenAccessInstruments": "true"
                    }
                }
            }
        })
    );
}

#[test]
fn custom_validation_options_are_sent_as_strings() {
    let opts = ValidationOptions {
        allow_inactive_instruments: false,
        ..ValidationOptions::default()
    };
    let v = body(RequestBuilder::new(ibm()).validation_options(opts).intraday_pricing());
    assert_eq!(
        v["ExtractionRequest"]["IdentifierList"]["ValidationOptions"]["AllowInactiveInstruments"],
        "false"
    );
}

#[test]
fn pricing_condition_limits_to_today() {
    let v = body(RequestBuilder::new(ibm()).pricing(PricingTemplate::PremiumEndOfDay, true));
    assert_eq!(
        v["ExtractionRequest"]["@odata.type"],
        format!("{PREFIX}PremiumEndOfDayPricingExtractionRequest")
    );
    assert_eq!(condition(&v), &json!({"LimitReportToTodaysData": "true"}));

    let v = body(RequestBuilder::new(ibm()).pricing(PricingTemplate::EndOfDay, false));
    assert_eq!(condition(&v)["LimitReportToTodaysData"], "false");
}

#[test]
fn price_history_dates_use_vendor_midnight_format() {
    let range = DateRange::new(d(2024, 1, 2), d(2024, 3, 31)).unwrap();
    let v = body(RequestBuilder::new(ibm()).price_history(range));
    assert_eq!(
        condition(&v),
        &json!({
            "ReportDateRangeType": "Range",
            "QueryStartDate": "2024-01-02T00:00:00.000Z",
            "QueryEndDate": "2024-03-31T00:00:00.000Z"
        })
    );
}

#[test]
fn reversed_range_is_rejected() {
    let err = DateRange::new(d(2024, 5, 1), d(2024, 4, 1)).unwrap_err();
    assert!(matches!(err, DssError::InvalidArg(_)));
}

#[test]
fn reference_template_has_no_condition() {
    let v = body(RequestBuilder::new(ibm()).reference(ReferenceTemplate::Ratings));
    assert_eq!(
        v["ExtractionRequest"]["@odata.type"],
        format!("{PREFIX}RatingsExtractionRequest")
    );
    assert!(v["ExtractionRequest"].get("Condition").is_none());
}

#[test]
fn bond_schedule_sends_type_codes() {
    let v = body(RequestBuilder::new(ibm()).bond_schedule(["CALL", "PUT"]));
    assert_eq!(condition(&v), &json!({"BondScheduleTypeCodes": ["CALL", "PUT"]}));
}

#[test]
fn historical_reference_ignores_user_preferences() {
    let range = DateRange::new(d(2020, 1, 1), d(2020, 12, 31)).unwrap();
    let v = body(RequestBuilder::new(ibm()).historical_reference(range));
    let list = &v["ExtractionRequest"]["IdentifierList"];
    assert_eq!(
        list["ValidationOptions"],
        json!({"AllowHistoricalInstruments": "true"})
    );
    assert_eq!(list["UseUserPreferencesForValidationOptions"], "false");
    assert_eq!(condition(&v)["ReportDateRangeType"], "Range");
}

#[test]
fn single_historical_price_sends_price_date() {
    let req = RequestBuilder::new(ibm()).single_historical_price(d(2023, 6, 30));
    assert_eq!(
        req.report_template_type(),
        Some(ReportTemplateType::SingleHistoricalPrice)
    );
    let v = body(req);
    assert_eq!(condition(&v), &json!({"PriceDate": "2023-06-30T00:00:00.000Z"}));
}

#[test]
fn fund_allocation_defaults() {
    let funds = InstrumentList::single("60000001", IdentifierType::FundLipperId, Some("LIP"));
    let v = body(RequestBuilder::new(funds).fund_allocation(&[]));
    let req = &v["ExtractionRequest"];
    assert_eq!(req["ContentFieldNames"].as_array().unwrap().len(), 28);
    assert_eq!(req["ContentFieldNames"][0], FUND_ALLOCATION_DEFAULT_FIELDS[0]);
    assert_eq!(req["IdentifierList"]["ValidationOptions"], Value::Null);
    assert_eq!(req["IdentifierList"]["UseUserPreferencesForValidationOptions"], "false");
    assert_eq!(
        req["IdentifierList"]["InstrumentIdentifiers"][0]["Source"],
        "LIP"
    );
    assert_eq!(
        condition(&v),
        &json!({"FundAllocationTypes": ["Currency", "FullHoldings"]})
    );

    let v = body(
        RequestBuilder::new(ibm())
            .fields(["RIC"])
            .fund_allocation(&["Sector".to_string()]),
    );
    assert_eq!(v["ExtractionRequest"]["ContentFieldNames"], json!(["RIC"]));
    assert_eq!(condition(&v)["FundAllocationTypes"], json!(["Sector"]));
}

#[test]
fn capital_change_prepends_leading_fields_once() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
    let req = RequestBuilder::new(ibm())
        .fields(["RIC", "Adjustment Factor"])
        .corax_capital_change(range, CapitalChangeType::Ex);
    assert_eq!(
        req.content_field_names,
        vec![
            CAPITAL_CHANGE_LEADING_FIELDS[0].to_string(),
            CAPITAL_CHANGE_LEADING_FIELDS[1].to_string(),
            "Adjustment Factor".to_string(),
        ]
    );
    let v = body(req);
    let c = condition(&v);
    assert_eq!(c["CorporateActionsCapitalChangeType"], "CapitalChangeExDate");
    assert_eq!(c["IncludeCapitalChangeEvents"], "true");
    assert_eq!(c["IncludeInstrumentsWithNoEvents"], "false");
    assert_eq!(c["IncludeNullDates"], "true");
    assert_eq!(c["ExcludeDeletedEvents"], "true");
    assert_eq!(c["QueryStartDate"], "2024-01-01T00:00:00.000Z");
}

#[test]
fn every_single_event_request_enables_exactly_its_class() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 2, 1)).unwrap();
    let cases: Vec<(datascope_core::ExtractionRequest, &str)> = vec![
        (
            RequestBuilder::new(ibm()).corax_dividend(range, DividendsType::Pay),
            "IncludeDividendEvents",
        ),
        (
            RequestBuilder::new(ibm()).corax_earnings(range, "ead".parse().unwrap()),
            "IncludeEarningsEvents",
        ),
        (
            RequestBuilder::new(ibm()).corax_mergers_acquisitions(range, "cls".parse().unwrap()),
            "IncludeMergersAndAcquisitionsEvents",
        ),
        (
            RequestBuilder::new(ibm()).corax_nominal_value(range),
            "IncludeNominalValueEvents",
        ),
        (
            RequestBuilder::new(ibm()).corax_equity_offerings(range, "all".parse().unwrap()),
            "IncludePublicEquityOfferingsEvents",
        ),
        (
            RequestBuilder::new(ibm()).corax_shares_outstanding(range, Vec::new()),
            "IncludeSharesOutstandingEvents",
        ),
        (
            RequestBuilder::new(ibm()).corax_voting_rights(range),
            "IncludeVotingRightsEvents",
        ),
    ];
    for (req, flag) in cases {
        match &req.condition {
            Some(Condition::CorporateActions(c)) => assert_eq!(c.enabled_event_classes(), 1),
            other => panic!("unexpected condition {other:?}"),
        }
        let v = body(req);
        assert_eq!(condition(&v)[flag], "true", "{flag}");
    }
}

#[test]
fn no_events_default_depends_on_event_class() {
    assert!(!CorporateActionEvent::Dividends(DividendsType::Ex)
        .default_flags()
        .include_instruments_with_no_events);
    assert!(CorporateActionEvent::NominalValue
        .default_flags()
        .include_instruments_with_no_events);
    assert!(CorporateActionEvent::VotingRights
        .default_flags()
        .include_instruments_with_no_events);
}

#[test]
fn shares_outstanding_defaults_to_issued() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 2, 1)).unwrap();
    let v = body(RequestBuilder::new(ibm()).corax_shares_outstanding(range, Vec::new()));
    let c = condition(&v);
    assert_eq!(c["CorporateActionsSharesType"], "SharesAmountDate");
    assert_eq!(c["ShareAmountTypes"], json!(["Issued"]));
}

#[test]
fn explicit_flags_override_defaults() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 2, 1)).unwrap();
    let flags = EventFlags {
        include_instruments_with_no_events: true,
        include_null_dates: false,
        exclude_deleted_events: false,
    };
    let v = body(RequestBuilder::new(ibm()).corporate_actions(
        range,
        &CorporateActionEvent::Dividends(DividendsType::Record),
        flags,
    ));
    let c = condition(&v);
    assert_eq!(c["IncludeInstrumentsWithNoEvents"], "true");
    assert_eq!(c["IncludeNullDates"], "false");
    assert_eq!(c["ExcludeDeletedEvents"], "false");
}

#[test]
fn delta_uses_criteria_list_and_all_events() {
    let req = corporate_actions_delta(
        vec!["RIC".into()],
        "All",
        IdentifierType::Ric,
        EventFlags::default(),
    );
    match &req.condition {
        Some(Condition::CorporateActions(c)) => assert_eq!(c.enabled_event_classes(), 8),
        other => panic!("unexpected condition {other:?}"),
    }
    let v = body(req);
    let list = &v["ExtractionRequest"]["IdentifierList"];
    assert_eq!(list["@odata.type"], format!("{PREFIX}InstrumentCriteriaList"));
    assert_eq!(
        list["Filters"],
        json!([{
            "@odata.type": "#ThomsonReuters.Dss.Api.Extractions.SubjectLists.BooleanFilter",
            "Value": "All"
        }])
    );
    assert_eq!(list["PreferredIdentifierType"], "Ric");
    let c = condition(&v);
    assert_eq!(c["ReportDateRangeType"], "Delta");
    assert!(c.get("QueryStartDate").is_none());
}

#[test]
fn raw_request_appends_instruments_and_price_date() {
    let template = json!({
        "ExtractionRequest": {
            "@odata.type": format!("{PREFIX}SingleHistoricalPriceExtractionRequest"),
            "ContentFieldNames": ["Universal Close Price"],
            "IdentifierList": {
                "@odata.type": format!("{PREFIX}InstrumentIdentifierList"),
                "InstrumentIdentifiers": [{"Identifier": "VOD.L", "IdentifierType": "Ric"}]
            },
            "Condition": null
        }
    });
    let raw = RawRequest::from_value(template)
        .unwrap()
        .with_instruments(&ibm())
        .unwrap()
        .with_price_date(d(2022, 12, 30))
        .unwrap();
    let body = raw.into_body();
    assert_eq!(
        body.report_template_type(),
        Some(ReportTemplateType::SingleHistoricalPrice)
    );
    assert_eq!(body.content_field_names(), vec!["Universal Close Price"]);
    let v = body.to_value().unwrap();
    let ids = v["ExtractionRequest"]["IdentifierList"]["InstrumentIdentifiers"]
        .as_array()
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[1]["Identifier"], "IBM.N");
    assert_eq!(
        v["ExtractionRequest"]["Condition"]["PriceDate"],
        "2022-12-30T00:00:00.000Z"
    );
}

#[test]
fn raw_request_requires_extraction_request() {
    assert!(matches!(
        RawRequest::from_value(json!({"Foo": 1})),
        Err(DssError::InvalidArg(_))
    ));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(
        RawRequest::from_path(&path),
        Err(DssError::InvalidArg(_))
    ));
}

#[test]
fn endpoints() {
    assert_eq!(ExtractEndpoint::default(), ExtractEndpoint::WithNotes);
    assert_eq!(ExtractEndpoint::WithNotes.path(), "Extractions/ExtractWithNotes");
    assert_eq!(ExtractEndpoint::Plain.path(), "Extractions/Extract");
}
