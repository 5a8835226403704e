//! Serialization helpers for the vendor's wire conventions.

use chrono::NaiveDate;
use serde::Serializer;

/// Vendor date-time layout for midnight UTC on a calendar day.
pub const VENDOR_DATE_FORMAT: &str = "%Y-%m-%dT00:00:00.000Z";

/// Booleans travel as the strings `"true"` / `"false"`.
pub fn bool_str<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(if *v { "true" } else { "false" })
}

pub fn opt_bool_str<S: Serializer>(v: &Option<bool>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(b) => bool_str(b, s),
        None => s.serialize_none(),
    }
}

pub fn vendor_date<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&d.format(VENDOR_DATE_FORMAT))
}

pub fn opt_vendor_date<S: Serializer>(d: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => vendor_date(d, s),
        None => s.serialize_none(),
    }
}
