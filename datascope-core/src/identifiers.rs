//! Instrument identifiers as the vendor expects them in identifier lists.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::DssError;
use crate::table::Table;

/// Identifier scheme of an instrument identifier.
///
/// Known schemes serialize to the vendor's wire names; anything else is kept
/// verbatim in [`IdentifierType::Other`] and sent as-is, leaving it to the
/// vendor's validation to accept or reject it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentifierType {
    /// Chain RIC.
    ChainRic,
    /// CUSIP International Numbering System.
    Cin,
    /// CUSIP.
    Cusip,
    /// Vendor file code.
    FileCode,
    /// Lipper fund identifier.
    FundLipperId,
    /// ISIN.
    Isin,
    /// OCC option code.
    OccCode,
    /// Reuters Instrument Code.
    Ric,
    /// RIC root.
    RicRoot,
    /// SEDOL.
    Sedol,
    /// Any other scheme name, passed through unchanged.
    Other(String),
}

static KNOWN: [IdentifierType; 10] = [
    IdentifierType::ChainRic,
    IdentifierType::Cin,
    IdentifierType::Cusip,
    IdentifierType::FileCode,
    IdentifierType::FundLipperId,
    IdentifierType::Isin,
    IdentifierType::OccCode,
    IdentifierType::Ric,
    IdentifierType::RicRoot,
    IdentifierType::Sedol,
];

impl IdentifierType {
    /// Map a raw type cell to an identifier type.
    ///
    /// The three-letter abbreviations used in vendor instrument files
    /// (`CSP`, `ISN`, `RIC`, `CHR`, `SED`, `CIN`) and the canonical names are
    /// both accepted case-insensitively. The whole trimmed token is compared,
    /// so `RICRoot` stays `RicRoot` rather than being rewritten as a `RIC`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let token = raw.trim();
        let abbreviated = match token.to_ascii_uppercase().as_str() {
            "CSP" => Some(Self::Cusip),
            "ISN" => Some(Self::Isin),
            "RIC" => Some(Self::Ric),
            "CHR" => Some(Self::ChainRic),
            "SED" => Some(Self::Sedol),
            "CIN" => Some(Self::Cin),
            _ => None,
        };
        if let Some(t) = abbreviated {
            return t;
        }
        KNOWN
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .cloned()
            .unwrap_or_else(|| Self::Other(token.to_string()))
    }

    /// Wire name sent in `IdentifierType`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChainRic => "ChainRic",
            Self::Cin => "Cin",
            Self::Cusip => "Cusip",
            Self::FileCode => "FileCode",
            Self::FundLipperId => "FundLipperId",
            Self::Isin => "Isin",
            Self::OccCode => "OCCCode",
            Self::Ric => "Ric",
            Self::RicRoot => "RICRoot",
            Self::Sedol => "Sedol",
            Self::Other(s) => s.as_str(),
        }
    }

    /// All identifier schemes with a dedicated variant, in display order.
    #[must_use]
    pub fn all_known() -> &'static [Self] {
        &KNOWN
    }

    /// True for [`IdentifierType::Other`].
    #[must_use]
    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl Serialize for IdentifierType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdentifierType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Self::normalize(&raw))
    }
}

/// A single instrument in an identifier list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentIdentifier {
    /// Identifier value, e.g. `"IBM.N"` or `"464287309"`.
    pub identifier: String,
    /// Identifier scheme.
    pub identifier_type: IdentifierType,
    /// Optional pricing source, e.g. `"LIP"` for Lipper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl InstrumentIdentifier {
    /// Create an identifier without a source.
    pub fn new(identifier: impl Into<String>, identifier_type: IdentifierType) -> Self {
        Self {
            identifier: identifier.into(),
            identifier_type,
            source: None,
        }
    }

    /// Attach a source. Blank sources are treated as absent.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        let trimmed = source.trim();
        self.source = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

/// Column selection used when reading instruments from a [`Table`].
///
/// `None` for the type or identifier column means "first" and "second"
/// column respectively; a `None` source column means no source is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentColumns {
    /// Column holding the identifier type.
    pub type_col: Option<String>,
    /// Column holding the identifier value.
    pub id_col: Option<String>,
    /// Column holding the source.
    pub source_col: Option<String>,
}

/// Ordered list of instrument identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentList(Vec<InstrumentIdentifier>);

impl InstrumentList {
    /// Empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// A one-instrument list.
    pub fn single(
        identifier: impl Into<String>,
        identifier_type: IdentifierType,
        source: Option<&str>,
    ) -> Self {
        let mut id = InstrumentIdentifier::new(identifier, identifier_type);
        if let Some(src) = source {
            id = id.with_source(src);
        }
        Self(vec![id])
    }

    /// Append an identifier.
    pub fn push(&mut self, id: InstrumentIdentifier) {
        self.0.push(id);
    }

    /// Append every identifier of `other`.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Number of identifiers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the list holds no identifiers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the identifiers in order.
    pub fn iter(&self) -> std::slice::Iter<'_, InstrumentIdentifier> {
        self.0.iter()
    }

    /// Borrow the identifiers as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[InstrumentIdentifier] {
        &self.0
    }

    /// Read a header-less instrument file.
    ///
    /// Each row is `type,identifier[,source]`. Rows with four or more columns
    /// follow the vendor export layout, `type,identifier,description,source`,
    /// so the source is read from the fourth column. Cells are trimmed, blank
    /// rows are skipped and an empty source means none.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` naming the line of a row with fewer than
    /// two columns or a blank type or identifier, and `DssError::Data` for
    /// malformed CSV.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DssError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut out = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| DssError::Data(format!("instrument csv: {e}")))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record.position().map_or(0, csv::Position::line);
            if record.len() < 2 {
                return Err(DssError::InvalidArg(format!(
                    "instrument csv line {line}: expected `type,identifier[,source]`"
                )));
            }
            if record[0].is_empty() || record[1].is_empty() {
                return Err(DssError::InvalidArg(format!(
                    "instrument csv line {line}: missing identifier/type"
                )));
            }
            let id_type = IdentifierType::normalize(&record[0]);
            let mut id = InstrumentIdentifier::new(&record[1], id_type);
            let source = match record.len() {
                2 => None,
                3 => record.get(2),
                _ => record.get(3),
            };
            if let Some(src) = source {
                id = id.with_source(src);
            }
            out.push(id);
        }
        Ok(Self(out))
    }

    /// Read a header-less instrument file from disk.
    ///
    /// # Errors
    /// Returns `DssError::Io` when the file cannot be opened, otherwise the
    /// errors of [`InstrumentList::from_csv_reader`].
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DssError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| DssError::Io(format!("{}: {e}", path.display())))?;
        Self::from_csv_reader(file)
    }

    /// Read instruments from an in-memory table.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when a named column does not exist, the
    /// table has fewer than two columns, or a row has no identifier.
    pub fn from_table(table: &Table, columns: &InstrumentColumns) -> Result<Self, DssError> {
        let resolve = |name: Option<&String>, fallback: usize| -> Result<usize, DssError> {
            match name {
                Some(n) => table
                    .column_index(n)
                    .ok_or_else(|| DssError::InvalidArg(format!("unknown column: {n}"))),
                None if fallback < table.columns().len() => Ok(fallback),
                None => Err(DssError::InvalidArg(format!(
                    "table has {} columns; instruments need a type and an identifier column",
                    table.columns().len()
                ))),
            }
        };
        let type_idx = resolve(columns.type_col.as_ref(), 0)?;
        let id_idx = resolve(columns.id_col.as_ref(), 1)?;
        let source_idx = match columns.source_col.as_ref() {
            Some(n) => Some(
                table
                    .column_index(n)
                    .ok_or_else(|| DssError::InvalidArg(format!("unknown column: {n}")))?,
            ),
            None => None,
        };

        let mut out = Vec::with_capacity(table.len());
        for (row_no, row) in table.rows().iter().enumerate() {
            let identifier = cell_text(&row[id_idx]).ok_or_else(|| {
                DssError::InvalidArg(format!("row {row_no}: missing identifier"))
            })?;
            let id_type = cell_text(&row[type_idx])
                .map(|t| IdentifierType::normalize(&t))
                .ok_or_else(|| DssError::InvalidArg(format!("row {row_no}: missing type")))?;
            let mut id = InstrumentIdentifier::new(identifier, id_type);
            if let Some(src) = source_idx.and_then(|i| cell_text(&row[i])) {
                id = id.with_source(src);
            }
            out.push(id);
        }
        Ok(Self(out))
    }

    /// Consume the list into its identifiers.
    #[must_use]
    pub fn into_vec(self) -> Vec<InstrumentIdentifier> {
        self.0
    }
}

fn cell_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

impl From<Vec<InstrumentIdentifier>> for InstrumentList {
    fn from(v: Vec<InstrumentIdentifier>) -> Self {
        Self(v)
    }
}

impl FromIterator<InstrumentIdentifier> for InstrumentList {
    fn from_iter<I: IntoIterator<Item = InstrumentIdentifier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for InstrumentList {
    type Item = InstrumentIdentifier;
    type IntoIter = std::vec::IntoIter<InstrumentIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstrumentList {
    type Item = &'a InstrumentIdentifier;
    type IntoIter = std::slice::Iter<'a, InstrumentIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
