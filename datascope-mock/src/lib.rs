//! datascope-mock
//!
//! Connectors that stand in for the DataScope Select API in tests and offline
//! runs:
//!
//! - [`MockConnector`] answers from static fixtures.
//! - [`DynamicMockConnector`] defers every answer to a [`MockController`]
//!   and records each call.
//!
//! Fixture conventions of [`MockConnector`]:
//! - the username `FAIL` is refused a token;
//! - identifiers starting with `BAD` fail validation and come back as
//!   extraction exceptions;
//! - an identifier `FAIL` makes the submission fail;
//! - an identifier `TIMEOUT` makes the extraction never complete.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use datascope_core::connector::{
    AuthProvider, AuthToken, Credentials, DssConnector, ExtractionProvider, ExtractionStatus,
    MetadataProvider, UserProvider, ValidationProvider,
};
use datascope_core::{
    DssError, ExtractEndpoint, FieldDescriptor, InstrumentIdentifier, InstrumentList,
    ReportTemplateType, RequestBody, ValidatedInstrument, ValidationReport, ValidationResponse,
};
use serde_json::{Map, Value, json};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockConnector, MockBehavior, MockCall, MockController};

/// Token value issued by [`MockConnector`].
pub const MOCK_TOKEN: &str = "mock-token";

struct Pending {
    payload: Value,
    polls_left: Option<u32>,
}

/// Mock connector with deterministic fixture data.
pub struct MockConnector {
    polls_before_completion: u32,
    next_id: AtomicU64,
    pending: Mutex<HashMap<String, Pending>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Extractions complete on the first poll.
    #[must_use]
    pub fn new() -> Self {
        Self::with_polls(1)
    }

    /// Extractions complete after `polls` polls; `0` completes on submit.
    #[must_use]
    pub fn with_polls(polls: u32) -> Self {
        Self {
            polls_before_completion: polls,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn forced(ids: &InstrumentList) -> Result<bool, DssError> {
        let mut hang = false;
        for id in ids {
            match id.identifier.as_str() {
                "FAIL" => {
                    return Err(DssError::connector(
                        "datascope-mock",
                        "forced failure: extraction/submit",
                    ));
                }
                "TIMEOUT" => hang = true,
                _ => {}
            }
        }
        Ok(hang)
    }

    fn instruments_of(body: &Value) -> Result<InstrumentList, DssError> {
        match body.pointer("/ExtractionRequest/IdentifierList/InstrumentIdentifiers") {
            Some(ids) => serde_json::from_value(ids.clone())
                .map_err(|e| DssError::Data(format!("mock request instruments: {e}"))),
            None => Ok(InstrumentList::new()),
        }
    }

    fn payload(ids: &InstrumentList, fields: &[String], endpoint: ExtractEndpoint) -> Value {
        let rows: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Self::row(id, fields, i))
            .collect();
        match endpoint {
            ExtractEndpoint::Plain => json!({ "value": rows }),
            ExtractEndpoint::WithNotes => json!({
                "Contents": rows,
                "Notes": [fixtures::NOTES, fixtures::RIC_MAINTENANCE],
            }),
        }
    }

    fn row(id: &InstrumentIdentifier, fields: &[String], index: usize) -> Value {
        let mut row = Map::new();
        row.insert("IdentifierType".into(), json!(id.identifier_type));
        row.insert("Identifier".into(), json!(id.identifier));
        if id.identifier.starts_with("BAD") {
            row.insert("Error".into(), json!(fixtures::exception(id)));
        } else {
            for f in fields {
                row.insert(f.clone(), fixtures::cell(f, id, index));
            }
        }
        Value::Object(row)
    }
}

impl DssConnector for MockConnector {
    fn name(&self) -> &'static str {
        "datascope-mock"
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn as_auth_provider(&self) -> Option<&dyn AuthProvider> {
        Some(self as &dyn AuthProvider)
    }
    fn as_user_provider(&self) -> Option<&dyn UserProvider> {
        Some(self as &dyn UserProvider)
    }
    fn as_metadata_provider(&self) -> Option<&dyn MetadataProvider> {
        Some(self as &dyn MetadataProvider)
    }
    fn as_validation_provider(&self) -> Option<&dyn ValidationProvider> {
        Some(self as &dyn ValidationProvider)
    }
    fn as_extraction_provider(&self) -> Option<&dyn ExtractionProvider> {
        Some(self as &dyn ExtractionProvider)
    }
}

#[async_trait]
impl AuthProvider for MockConnector {
    async fn request_token(&self, credentials: &Credentials) -> Result<AuthToken, DssError> {
        if credentials.username == "FAIL" || credentials.password.is_empty() {
            return Err(DssError::Auth("Invalid username or password".into()));
        }
        Ok(AuthToken::new(MOCK_TOKEN))
    }
}

#[async_trait]
impl UserProvider for MockConnector {
    async fn preferences(&self, _token: &AuthToken, username: &str) -> Result<Value, DssError> {
        if username.is_empty() {
            return Err(DssError::not_found("user preferences for <empty>".to_string()));
        }
        Ok(fixtures::preferences(username))
    }

    async fn user_claims(&self, _token: &AuthToken) -> Result<Vec<Value>, DssError> {
        Ok(fixtures::user_claims())
    }
}

#[async_trait]
impl MetadataProvider for MockConnector {
    async fn valid_field_names(
        &self,
        _token: &AuthToken,
        template: ReportTemplateType,
    ) -> Result<Vec<FieldDescriptor>, DssError> {
        Ok(fixtures::field_names(template))
    }

    async fn bond_schedule_types(&self, _token: &AuthToken) -> Result<Vec<Value>, DssError> {
        Ok(fixtures::bond_schedule_types())
    }
}

#[async_trait]
impl ValidationProvider for MockConnector {
    async fn validate_identifiers(
        &self,
        _token: &AuthToken,
        instruments: &InstrumentList,
        keep_duplicates: bool,
    ) -> Result<ValidationResponse, DssError> {
        let mut seen: Vec<&InstrumentIdentifier> = Vec::new();
        let mut duplicates = Vec::new();
        let mut validated = Vec::new();
        for id in instruments {
            if seen.contains(&id) {
                duplicates.push(json!({ "Identifier": id.identifier, "IdentifierType": id.identifier_type }));
                if !keep_duplicates {
                    continue;
                }
            } else {
                seen.push(id);
            }
            let status = if id.identifier.starts_with("BAD") {
                "Not found"
            } else {
                "Valid"
            };
            validated.push(ValidatedInstrument {
                identifier: id.identifier.clone(),
                identifier_type: id.identifier_type.clone(),
                source: id.source.clone(),
                status: status.to_string(),
                extra: Map::new(),
            });
        }
        let valid = u64::try_from(validated.iter().filter(|v| v.is_valid()).count())
            .unwrap_or(u64::MAX);
        let messages = validated
            .iter()
            .filter(|v| !v.is_valid())
            .map(|v| json!({ "Identifier": v.identifier, "Message": v.status }))
            .collect();
        Ok(ValidationResponse {
            validated_instruments: validated,
            validation_result: ValidationReport {
                valid_instrument_count: valid,
                standard_segments: vec![json!({ "Code": "Equity", "Count": valid })],
                validation_duplicates: duplicates,
                messages,
                ..ValidationReport::default()
            },
        })
    }
}

#[async_trait]
impl ExtractionProvider for MockConnector {
    async fn submit(
        &self,
        _token: &AuthToken,
        body: &RequestBody,
        endpoint: ExtractEndpoint,
    ) -> Result<ExtractionStatus, DssError> {
        let value = body.to_value()?;
        let ids = Self::instruments_of(&value)?;
        let hang = Self::forced(&ids)?;
        let payload = Self::payload(&ids, &body.content_field_names(), endpoint);
        if self.polls_before_completion == 0 && !hang {
            return Ok(ExtractionStatus::Completed(payload));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let location = format!("mock://extractions/{id}");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                location.clone(),
                Pending {
                    payload,
                    polls_left: (!hang).then_some(self.polls_before_completion),
                },
            );
        Ok(ExtractionStatus::InProgress {
            location: Some(location),
            progress: Some("Queued".into()),
        })
    }

    async fn poll(&self, _token: &AuthToken, location: &str) -> Result<ExtractionStatus, DssError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = pending
            .get_mut(location)
            .ok_or_else(|| DssError::not_found(format!("extraction at {location}")))?;
        match entry.polls_left {
            Some(left) if left <= 1 => {
                let done = pending
                    .remove(location)
                    .map(|p| p.payload)
                    .unwrap_or_default();
                Ok(ExtractionStatus::Completed(done))
            }
            Some(left) => {
                entry.polls_left = Some(left - 1);
                Ok(ExtractionStatus::InProgress {
                    location: None,
                    progress: Some(format!("Running, {} polls to go", left - 1)),
                })
            }
            None => Ok(ExtractionStatus::InProgress {
                location: None,
                progress: Some("Running".into()),
            }),
        }
    }
}
