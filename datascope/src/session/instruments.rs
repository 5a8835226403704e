use std::io::Write;
use std::path::Path;

use crate::Session;
use datascope_core::{
    DssError, InstrumentColumns, InstrumentList, Table, ValidationReport, ValidationResponse,
};

impl Session {
    /// Load instruments from a CSV file and make them the session's list.
    ///
    /// With `validate` the list is checked by the vendor first and only the
    /// instruments it accepts are kept. Returns the number kept.
    ///
    /// # Errors
    /// Returns the CSV loader's errors and, when validating, the connector's.
    pub async fn load_csv(&mut self, path: impl AsRef<Path>, validate: bool) -> Result<usize, DssError> {
        let list = InstrumentList::from_csv_path(path)?;
        self.load_instruments(list, validate).await
    }

    /// Load instruments from table columns; see [`Session::load_csv`].
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` for unknown columns and, when
    /// validating, the connector's errors.
    pub async fn load_table(
        &mut self,
        table: &Table,
        columns: &InstrumentColumns,
        validate: bool,
    ) -> Result<usize, DssError> {
        let list = InstrumentList::from_table(table, columns)?;
        self.load_instruments(list, validate).await
    }

    /// Make `list` the session's instruments; see [`Session::load_csv`].
    ///
    /// # Errors
    /// When validating, returns the connector's errors and leaves the
    /// previous list in place.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope::session::load_instruments",
            skip(self, list),
            fields(count = list.len(), validate = validate),
        )
    )]
    pub async fn load_instruments(
        &mut self,
        list: InstrumentList,
        validate: bool,
    ) -> Result<usize, DssError> {
        if !validate {
            self.instruments = list;
            self.validation = None;
            return Ok(self.instruments.len());
        }

        let response = self
            .connector
            .as_validation_provider()
            .ok_or_else(|| DssError::unsupported("validation"))?
            .validate_identifiers(self.live_token()?, &list, self.cfg.keep_duplicates)
            .await?;
        log_validation(&response);
        self.instruments = response.valid_instruments();
        self.validation = Some(response);
        Ok(self.instruments.len())
    }

    /// Currently loaded instruments.
    #[must_use]
    pub const fn instruments(&self) -> &InstrumentList {
        &self.instruments
    }

    /// Summary of the last validation, if the list was validated.
    #[must_use]
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        self.validation.as_ref().map(|v| &v.validation_result)
    }

    /// Full response of the last validation.
    #[must_use]
    pub const fn validation_response(&self) -> Option<&ValidationResponse> {
        self.validation.as_ref()
    }

    /// Write the last validation to `path`: the summary lines, a blank line,
    /// then every validated instrument as CSV.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` when no validation has run and
    /// `DssError::Io` when the file cannot be written.
    pub fn write_validation_report(&self, path: impl AsRef<Path>) -> Result<(), DssError> {
        let response = self.validation.as_ref().ok_or_else(|| {
            DssError::InvalidArg("no validation report; load instruments with validation".into())
        })?;
        let mut file = std::fs::File::create(path.as_ref())?;
        for line in response.validation_result.summary_lines() {
            writeln!(file, "{line}")?;
        }
        writeln!(file)?;
        response.instruments_table()?.write_csv(&mut file)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_validation(response: &ValidationResponse) {
    #[cfg(feature = "tracing")]
    {
        for line in response.validation_result.summary_lines() {
            tracing::info!("{line}");
        }
        for bad in response.invalid_instruments() {
            tracing::warn!(
                identifier = %bad.identifier,
                identifier_type = %bad.identifier_type,
                status = %bad.status,
                "instrument rejected"
            );
        }
    }
}
