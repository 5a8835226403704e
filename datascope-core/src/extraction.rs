use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DssError;
use crate::identifiers::{IdentifierType, InstrumentIdentifier, InstrumentList};
use crate::table::Table;

/// Column that marks a row as a per-instrument exception.
pub const EXCEPTION_COLUMN: &str = "Error";

/// Parsed payload of a completed extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Report rows.
    pub contents: Table,
    /// `Notes` array: extraction notes, then RIC maintenance.
    pub notes: Vec<String>,
    /// Rows the vendor reported with an `Error` cell instead of data.
    pub exceptions: Table,
}

impl ExtractionResult {
    /// Parse a completed payload.
    ///
    /// Accepts both the `ExtractWithNotes` shape (`Contents` + `Notes`) and
    /// the plain `Extract` shape (`value`). Rows carrying an `Error` key are
    /// split off into [`ExtractionResult::exceptions`].
    ///
    /// # Errors
    /// Returns `DssError::Data` when neither `Contents` nor `value` is present
    /// or the rows are not objects.
    pub fn from_payload(payload: &Value) -> Result<Self, DssError> {
        let rows = payload
            .get("Contents")
            .or_else(|| payload.get("value"))
            .ok_or_else(|| DssError::Data("extraction payload has no Contents or value".into()))?;
        let rows: &[Value] = match rows {
            Value::Null => &[],
            Value::Array(a) => a,
            _ => return Err(DssError::Data("extraction rows are not an array".into())),
        };
        let (exceptions, contents): (Vec<Value>, Vec<Value>) = rows
            .iter()
            .cloned()
            .partition(|r| r.get(EXCEPTION_COLUMN).is_some());

        let notes = payload
            .get("Notes")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .map(|n| match n {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            contents: Table::from_records(&contents)?,
            notes,
            exceptions: Table::from_records(&exceptions)?,
        })
    }

    /// Extraction notes text (`Notes[0]`).
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.first().map(String::as_str)
    }

    /// RIC maintenance text (`Notes[1]`), absent for many templates.
    #[must_use]
    pub fn ric_maintenance(&self) -> Option<&str> {
        self.notes.get(1).map(String::as_str)
    }

    /// Extraction notes split into lines.
    #[must_use]
    pub fn note_lines(&self) -> Vec<&str> {
        self.notes()
            .map(|n| n.split("\r\n").collect())
            .unwrap_or_default()
    }

    /// Messages of the exception rows, in order.
    #[must_use]
    pub fn exception_messages(&self) -> Vec<String> {
        self.exceptions
            .iter_records()
            .filter_map(|r| r.get(EXCEPTION_COLUMN))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// One row of an identifier validation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidatedInstrument {
    /// Identifier as submitted.
    pub identifier: String,
    /// Identifier type as echoed by the vendor.
    pub identifier_type: IdentifierType,
    /// Source, when the vendor reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// `Valid` or the reason the instrument was rejected.
    #[serde(default)]
    pub status: String,
    /// Remaining vendor columns (`Key`, `Description`, `InstrumentType`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidatedInstrument {
    /// True when the vendor accepted the identifier.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == "Valid"
    }

    /// Rebuild the identifier for a request.
    #[must_use]
    pub fn to_identifier(&self) -> InstrumentIdentifier {
        let id = InstrumentIdentifier::new(self.identifier.clone(), self.identifier_type.clone());
        match &self.source {
            Some(s) => id.with_source(s.clone()),
            None => id,
        }
    }
}

/// Summary counters of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ValidationReport {
    /// Instruments the vendor accepted.
    pub valid_instrument_count: u64,
    /// Accepted instruments per standard segment.
    pub standard_segments: Vec<Value>,
    /// Accepted instruments per open-access segment.
    pub open_access_segments: Vec<Value>,
    /// Duplicate identifiers found in the input.
    pub validation_duplicates: Vec<Value>,
    /// Per-identifier messages.
    pub messages: Vec<Value>,
    /// Anything else the vendor reports.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidationReport {
    /// Human-readable lines for logs and the validation report file.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("valid instruments: {}", self.valid_instrument_count)];
        for seg in &self.standard_segments {
            lines.push(format!("standard segment: {}", compact(seg)));
        }
        for seg in &self.open_access_segments {
            lines.push(format!("open access segment: {}", compact(seg)));
        }
        if !self.validation_duplicates.is_empty() {
            lines.push(format!("duplicates: {}", self.validation_duplicates.len()));
        }
        for msg in &self.messages {
            lines.push(format!("message: {}", compact(msg)));
        }
        lines
    }
}

fn compact(v: &Value) -> String {
    match v {
        Value::Object(o) => o
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Response of `Extractions/InstrumentListValidateIdentifiers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationResponse {
    /// Every submitted identifier with its status.
    #[serde(default)]
    pub validated_instruments: Vec<ValidatedInstrument>,
    /// Summary counters.
    #[serde(default)]
    pub validation_result: ValidationReport,
}

impl ValidationResponse {
    /// Parse the vendor response.
    ///
    /// # Errors
    /// Returns `DssError::Data` when the body does not match.
    pub fn from_value(value: Value) -> Result<Self, DssError> {
        serde_json::from_value(value).map_err(|e| DssError::Data(format!("validation response: {e}")))
    }

    /// Identifiers the vendor accepted, in submission order.
    #[must_use]
    pub fn valid_instruments(&self) -> InstrumentList {
        self.validated_instruments
            .iter()
            .filter(|v| v.is_valid())
            .map(ValidatedInstrument::to_identifier)
            .collect()
    }

    /// Identifiers the vendor rejected.
    pub fn invalid_instruments(&self) -> impl Iterator<Item = &ValidatedInstrument> {
        self.validated_instruments.iter().filter(|v| !v.is_valid())
    }

    /// All validated rows as a table.
    ///
    /// # Errors
    /// Returns `DssError::Data` if a row cannot be serialized.
    pub fn instruments_table(&self) -> Result<Table, DssError> {
        let rows = self
            .validated_instruments
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DssError::Data(format!("validated instrument: {e}")))?;
        Table::from_records(&rows)
    }
}

/// One entry of `GetValidExtractionFieldNames`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDescriptor {
    /// Field code.
    #[serde(default)]
    pub code: String,
    /// Name used in `ContentFieldNames`.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Group the field belongs to.
    #[serde(default)]
    pub field_group: String,
}
