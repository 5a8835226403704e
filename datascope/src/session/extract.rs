use crate::Session;
use datascope_core::{
    DssError, ExtractEndpoint, ExtractionResult, IdentifierList, RequestBody, await_completion,
};

impl Session {
    /// Run the pending request over the loaded instruments.
    ///
    /// Identifier-list requests pick up the instruments loaded at call time,
    /// so a report may be selected before the list is loaded. With
    /// `validate_fields_before_extract` on, the field names are checked
    /// against the template first.
    ///
    /// # Errors
    /// - `DssError::MissingRequest` when no report has been selected.
    /// - `DssError::MissingInstruments` when an identifier-list request has
    ///   no instruments.
    /// - `DssError::InvalidFields` from the optional field check.
    /// - The errors of [`Session::extract_request`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "datascope::session::extract", skip(self))
    )]
    pub async fn extract(&mut self) -> Result<ExtractionResult, DssError> {
        let mut body = self.pending.clone().ok_or(DssError::MissingRequest)?;
        if let RequestBody::Typed(req) = &mut body {
            if let IdentifierList::Identifiers {
                instrument_identifiers,
                ..
            } = &mut req.identifier_list
            {
                if self.instruments.is_empty() {
                    return Err(DssError::MissingInstruments);
                }
                instrument_identifiers.clone_from(&self.instruments);
            }
        }

        if self.cfg.validate_fields_before_extract {
            if let Some(template) = body.report_template_type() {
                self.validate_fields(template, &body.content_field_names())
                    .await?;
            }
        }

        self.extract_request(&body, self.endpoint).await
    }

    /// Submit `body` to `endpoint`, wait for completion and parse the
    /// payload. Uses none of the session's pending state.
    ///
    /// # Errors
    /// Returns the connector's submit and poll errors, the poll loop's
    /// `PollExhausted` / `PollTimeout`, and `DssError::Data` for payloads that
    /// cannot be parsed.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope::session::extract_request",
            skip(self, body),
            fields(endpoint = endpoint.path(), request = body.odata_type().unwrap_or("raw")),
        )
    )]
    pub async fn extract_request(
        &self,
        body: &RequestBody,
        endpoint: ExtractEndpoint,
    ) -> Result<ExtractionResult, DssError> {
        let provider = self
            .connector
            .as_extraction_provider()
            .ok_or_else(|| DssError::unsupported("extraction"))?;
        let token = self.live_token()?;
        let first = provider.submit(token, body, endpoint).await?;
        let payload = await_completion(provider, token, first, &self.cfg.poll).await?;
        let result = ExtractionResult::from_payload(&payload)?;

        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                rows = result.contents.len(),
                exceptions = result.exceptions.len(),
                "extraction parsed"
            );
            for msg in result.exception_messages() {
                tracing::warn!(%msg, "instrument exception");
            }
        }
        Ok(result)
    }
}
