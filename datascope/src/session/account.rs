use serde_json::Value;

use crate::Session;
use datascope_core::{DssError, FieldDescriptor, ReportTemplateType, Table};

impl Session {
    /// Stored preferences of the session's account.
    ///
    /// # Errors
    /// Returns `DssError::InvalidArg` for token-only sessions, where the
    /// account name is unknown, and the connector's errors otherwise.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "datascope::session::preferences", skip(self))
    )]
    pub async fn preferences(&self) -> Result<Value, DssError> {
        let username = self.username.as_deref().ok_or_else(|| {
            DssError::InvalidArg("username unknown; build the session with credentials".into())
        })?;
        self.connector
            .as_user_provider()
            .ok_or_else(|| DssError::unsupported("user/preferences"))?
            .preferences(self.live_token()?, username)
            .await
    }

    /// Content rights of the account, one row per claim.
    ///
    /// # Errors
    /// Returns the connector's errors.
    pub async fn rights(&self) -> Result<Table, DssError> {
        let claims = self
            .connector
            .as_user_provider()
            .ok_or_else(|| DssError::unsupported("user/claims"))?
            .user_claims(self.live_token()?)
            .await?;
        Table::from_records(&claims)
    }

    /// Field names valid for a template family.
    ///
    /// # Errors
    /// Returns the connector's errors.
    pub async fn valid_fields(
        &self,
        template: ReportTemplateType,
    ) -> Result<Vec<FieldDescriptor>, DssError> {
        self.connector
            .as_metadata_provider()
            .ok_or_else(|| DssError::unsupported("metadata/fields"))?
            .valid_field_names(self.live_token()?, template)
            .await
    }

    /// Bond schedule type codes, one row per type.
    ///
    /// # Errors
    /// Returns the connector's errors.
    pub async fn bond_schedule_types(&self) -> Result<Table, DssError> {
        let types = self
            .connector
            .as_metadata_provider()
            .ok_or_else(|| DssError::unsupported("metadata/bond-schedule-types"))?
            .bond_schedule_types(self.live_token()?)
            .await?;
        Table::from_records(&types)
    }

    /// Check `fields` against the template's valid field names.
    ///
    /// # Errors
    /// Returns `DssError::InvalidFields` listing every unknown field, in the
    /// order given.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope::session::validate_fields",
            skip(self, fields),
            fields(template = %template, count = fields.len()),
        )
    )]
    pub async fn validate_fields(
        &self,
        template: ReportTemplateType,
        fields: &[String],
    ) -> Result<(), DssError> {
        let valid = self.valid_fields(template).await?;
        let unknown: Vec<String> = fields
            .iter()
            .filter(|f| !valid.iter().any(|v| &v.name == *f))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(?unknown, "fields not valid for template");
            Err(DssError::InvalidFields {
                template: template.to_string(),
                fields: unknown,
            })
        }
    }
}
