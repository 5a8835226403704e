//! Writing extraction results to disk.

use std::path::{Path, PathBuf};

use crate::Session;
use datascope_core::{DssError, ExtractionResult};

/// Where [`Session::export`] puts the result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportTarget {
    /// Keep the result in memory only.
    #[default]
    Memory,
    /// Also write the parts to disk.
    Files {
        /// Contents CSV.
        contents: PathBuf,
        /// Extraction notes text, skipped when `None`.
        notes: Option<PathBuf>,
        /// RIC maintenance text, skipped when `None`.
        ric_maintenance: Option<PathBuf>,
    },
}

impl ExportTarget {
    /// Contents only.
    #[must_use]
    pub fn contents(path: impl Into<PathBuf>) -> Self {
        Self::Files {
            contents: path.into(),
            notes: None,
            ric_maintenance: None,
        }
    }
}

impl Session {
    /// Run [`Session::extract`] and deliver the result to `target`.
    ///
    /// # Errors
    /// Returns the errors of [`Session::extract`] and [`write_files`].
    pub async fn export(&mut self, target: ExportTarget) -> Result<ExtractionResult, DssError> {
        let result = self.extract().await?;
        if let ExportTarget::Files {
            contents,
            notes,
            ric_maintenance,
        } = &target
        {
            write_files(
                &result,
                contents,
                notes.as_deref(),
                ric_maintenance.as_deref(),
            )?;
        }
        Ok(result)
    }
}

/// Write the contents CSV (header row, no index column) and, when paths are
/// given, the notes and RIC maintenance text.
///
/// A path given for a part the vendor did not return is skipped with a
/// warning, as is a part returned without a path.
///
/// # Errors
/// Returns `DssError::Io` when a file cannot be written.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "datascope::export::write_files", skip(result))
)]
pub fn write_files(
    result: &ExtractionResult,
    contents: &Path,
    notes: Option<&Path>,
    ric_maintenance: Option<&Path>,
) -> Result<(), DssError> {
    result.contents.write_csv_path(contents)?;
    write_text("notes", result.notes(), notes)?;
    write_text("RIC maintenance", result.ric_maintenance(), ric_maintenance)?;
    Ok(())
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn write_text(what: &str, text: Option<&str>, path: Option<&Path>) -> Result<(), DssError> {
    match (text, path) {
        (Some(text), Some(path)) => std::fs::write(path, text)
            .map_err(|e| DssError::Io(format!("{}: {e}", path.display()))),
        (Some(_), None) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("{what} returned but no path given; not written");
            Ok(())
        }
        (None, Some(path)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(path = %path.display(), "no {what} in the extraction; file not written");
            Ok(())
        }
        (None, None) => Ok(()),
    }
}
