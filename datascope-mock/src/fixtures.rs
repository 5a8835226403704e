//! Static data served by [`MockConnector`](crate::MockConnector).

use datascope_core::{FieldDescriptor, IdentifierType, InstrumentIdentifier, ReportTemplateType};
use serde_json::{Value, json};

const COMMON_FIELDS: &[&str] = &[
    "RIC",
    "ISIN",
    "CUSIP",
    "Currency Code",
    "Exchange Code",
    "Security Description",
];

fn template_fields(template: ReportTemplateType) -> &'static [&'static str] {
    use ReportTemplateType as T;
    match template {
        T::Composite => &["Asset Category", "Close Price", "Trade Date", "Issuer Name"],
        T::EndOfDayPricing | T::PremiumEndOfDayPricing | T::PremiumPricing => &[
            "Universal Close Price",
            "Universal Bid Price",
            "Universal Ask Price",
            "Trade Date",
        ],
        T::IntradayPricing => &["Last Price", "Bid Price", "Ask Price", "Volume"],
        T::PriceHistory | T::SingleHistoricalPrice => {
            &["Trade Date", "Universal Close Price", "High Price", "Low Price", "Volume"]
        }
        T::CorporateActions => &[
            "Issue Level Event ID",
            "Corporate Action Type",
            "Dividend Rate",
            "Dividend Ex Date",
            "Capital Change Event Type",
            "Effective Date",
        ],
        T::TermsAndConditions | T::HistoricalReference => {
            &["Issuer Name", "Maturity Date", "Coupon Rate", "Issue Date"]
        }
        T::BondSchedule => &["Schedule Type", "Schedule Date", "Call Price"],
        T::Ratings => &["Rating", "Rating Source Code", "Rating Date"],
        T::MbsFactorHistory | T::TrancheFactorHistory => &["Factor", "Factor Date"],
        T::FundAllocation => &[
            "Allocation Asset Type",
            "Allocation Item",
            "Allocation Percentage",
            "Allocation Date",
        ],
        T::Ownership => &["Holder Name", "Shares Held", "Holding Date"],
        T::SymbolCrossReference => &["Ticker", "SEDOL", "Primary Quote RIC"],
    }
}

/// Field names valid for `template`.
pub fn field_names(template: ReportTemplateType) -> Vec<FieldDescriptor> {
    COMMON_FIELDS
        .iter()
        .chain(template_fields(template))
        .enumerate()
        .map(|(i, name)| FieldDescriptor {
            code: format!("{}.{}", template.wire_name(), i + 1),
            name: (*name).to_string(),
            description: format!("{name} ({})", template.wire_name()),
            field_group: if i < COMMON_FIELDS.len() {
                "Identifiers".to_string()
            } else {
                template.wire_name().to_string()
            },
        })
        .collect()
}

pub fn bond_schedule_types() -> Vec<Value> {
    vec![
        json!({ "Code": "CALL", "Description": "Call Schedule" }),
        json!({ "Code": "PUT", "Description": "Put Schedule" }),
        json!({ "Code": "SINK", "Description": "Sinking Fund Schedule" }),
        json!({ "Code": "CPN", "Description": "Coupon Schedule" }),
    ]
}

pub fn preferences(username: &str) -> Value {
    json!({
        "UserId": username,
        "ContentFieldDisplayPreference": "FieldName",
        "TimeZone": "UTC",
        "AllowHistoricalInstruments": true,
        "AllowInactiveInstruments": true,
        "AllowOpenAccessInstruments": false,
    })
}

pub fn user_claims() -> Vec<Value> {
    vec![
        json!({ "ClaimValue": "EndOfDayPricing", "ClaimType": "Product", "Description": "End of day pricing" }),
        json!({ "ClaimValue": "CorporateActions", "ClaimType": "Product", "Description": "Corporate actions" }),
        json!({ "ClaimValue": "TermsAndConditions", "ClaimType": "Product", "Description": "Terms and conditions" }),
    ]
}

/// Deterministic cell value for one requested field of one instrument.
pub fn cell(field: &str, id: &InstrumentIdentifier, row: usize) -> Value {
    let lower = field.to_ascii_lowercase();
    if field == "RIC" {
        return match id.identifier_type {
            IdentifierType::Ric => Value::String(id.identifier.clone()),
            _ => Value::String(format!("{}.MK", id.identifier)),
        };
    }
    if field == "ISIN" && id.identifier_type == IdentifierType::Isin {
        return Value::String(id.identifier.clone());
    }
    if lower.contains("date") {
        return Value::String(format!("2024-01-{:02}T00:00:00Z", row % 28 + 1));
    }
    if lower.contains("price") || lower.contains("rate") || lower.contains("factor") {
        let step = f64::from(u32::try_from(row).unwrap_or(u32::MAX));
        return json!(100.0 + step * 0.5);
    }
    if lower.contains("volume") || lower.contains("shares") {
        return json!(1_000 * (row + 1));
    }
    Value::String(format!("{field} {}", id.identifier))
}

pub const NOTES: &str = "Extraction Services Version 16.0.43633 (806c08a4ae8f), Built May  9 2022 17:21:06\r\nProcessing started at 01/02/2024 09:00:00.\r\nUser ID: mock\r\nExtraction ID: 1000\r\nProcessing completed successfully at 01/02/2024 09:00:05.";

pub const RIC_MAINTENANCE: &str = "No RIC maintenance for this extraction.";

/// Exception message for a rejected identifier.
pub fn exception(id: &InstrumentIdentifier) -> String {
    format!("Not found ({} {})", id.identifier_type, id.identifier)
}
