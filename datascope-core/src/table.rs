use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DssError;

/// Column-ordered table of JSON cells.
///
/// Built from the vendor's arrays of row objects. Columns appear in the order
/// they are first seen across the rows; cells missing from a row are `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let values = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &values[i])
    }

    /// Cell by column name when it is a string.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Cells in column order.
    #[must_use]
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Rebuild the row as a JSON object, skipping `null` cells.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .zip(self.values)
            .filter(|(_, v)| !v.is_null())
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect()
    }
}

impl Table {
    /// Empty table with the given header.
    #[must_use]
    pub const fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from row objects.
    ///
    /// # Errors
    /// Returns `DssError::Data` if any element is not a JSON object.
    pub fn from_records(records: &[Value]) -> Result<Self, DssError> {
        let mut columns: Vec<String> = Vec::new();
        for (i, rec) in records.iter().enumerate() {
            let obj = rec
                .as_object()
                .ok_or_else(|| DssError::Data(format!("row {i} is not an object")))?;
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .filter_map(Value::as_object)
            .map(|obj| {
                columns
                    .iter()
                    .map(|c| obj.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Build a table from a JSON array of row objects.
    ///
    /// # Errors
    /// Returns `DssError::Data` when `value` is not an array of objects.
    pub fn from_value(value: &Value) -> Result<Self, DssError> {
        let arr = value
            .as_array()
            .ok_or_else(|| DssError::Data("expected an array of rows".into()))?;
        Self::from_records(arr)
    }

    /// Append a row.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when the row width differs from the header.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), DssError> {
        if row.len() != self.columns.len() {
            return Err(DssError::InvalidArg(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order; each row has one cell per column.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Iterate over the rows as records.
    pub fn iter_records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|r| Record {
            columns: &self.columns,
            values: r,
        })
    }

    /// Rows matching `pred`, with the same header.
    #[must_use]
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&Record<'_>) -> bool,
    {
        let rows = self
            .iter_records()
            .filter(|r| pred(r))
            .map(|r| r.values.to_vec())
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Project onto the named columns, in the given order.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` naming the first unknown column.
    pub fn select(&self, names: &[&str]) -> Result<Self, DssError> {
        let idx = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| DssError::InvalidArg(format!("unknown column: {n}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Self {
            columns: names.iter().map(|n| (*n).to_string()).collect(),
            rows,
        })
    }

    /// Rows as JSON objects, skipping `null` cells.
    #[must_use]
    pub fn to_records(&self) -> Vec<Value> {
        self.iter_records()
            .map(|r| Value::Object(r.to_object()))
            .collect()
    }

    /// Write the table as CSV with a header row and no index column.
    ///
    /// `null` renders as an empty cell; nested arrays and objects render as
    /// compact JSON.
    ///
    /// # Errors
    /// Returns `DssError::Io` when the writer fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), DssError> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns).map_err(csv_err)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(render_cell))
                .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table as CSV to `path`, replacing any existing file.
    ///
    /// # Errors
    /// Returns `DssError::Io` when the file cannot be created or written.
    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<(), DssError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .map_err(|e| DssError::Io(format!("{}: {e}", path.display())))?;
        self.write_csv(std::io::BufWriter::new(file))
    }

    /// Convert to a polars `DataFrame` with one string column per table column.
    ///
    /// # Errors
    /// Returns `DssError::Data` if polars rejects the frame.
    #[cfg(feature = "dataframe")]
    pub fn to_polars(&self) -> Result<polars::prelude::DataFrame, DssError> {
        use polars::prelude::{Column, DataFrame, PlSmallStr};

        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells: Vec<Option<String>> = self
                    .rows
                    .iter()
                    .map(|r| match &r[i] {
                        Value::Null => None,
                        other => Some(render_cell(other)),
                    })
                    .collect();
                Column::new(PlSmallStr::from(name.as_str()), cells)
            })
            .collect::<Vec<_>>();
        DataFrame::new(columns).map_err(|e| DssError::Data(format!("dataframe: {e}")))
    }
}

fn render_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_err(e: csv::Error) -> DssError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => DssError::Io(io.to_string()),
        other => DssError::Data(format!("csv: {other:?}")),
    }
}
