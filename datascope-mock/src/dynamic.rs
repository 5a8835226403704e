use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use datascope_core::connector::{
    AuthProvider, AuthToken, Credentials, DssConnector, ExtractionProvider, ExtractionStatus,
    MetadataProvider, UserProvider, ValidationProvider,
};
use datascope_core::{
    DssError, ExtractEndpoint, FieldDescriptor, InstrumentList, ReportTemplateType, RequestBody,
    ValidationResponse,
};

/// Instruction for how a method should behave.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(DssError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

/// One recorded call to a [`DynamicMockConnector`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `request_token` for a username.
    RequestToken {
        /// Username presented.
        username: String,
    },
    /// `preferences` for a username.
    Preferences {
        /// Username asked about.
        username: String,
    },
    /// `user_claims`.
    UserClaims,
    /// `valid_field_names` for a template.
    ValidFieldNames(ReportTemplateType),
    /// `bond_schedule_types`.
    BondScheduleTypes,
    /// `validate_identifiers`.
    Validate {
        /// Submitted instruments.
        instruments: InstrumentList,
        /// Duplicate handling flag.
        keep_duplicates: bool,
    },
    /// `submit`, with the serialized body.
    Submit {
        /// Body as it would be posted.
        body: Value,
        /// Target endpoint.
        endpoint: ExtractEndpoint,
    },
    /// `poll` of a monitor URL.
    Poll {
        /// Monitor URL.
        location: String,
    },
}

#[derive(Default)]
struct InternalState {
    token_rule: Option<MockBehavior<AuthToken>>,
    preferences_rule: Option<MockBehavior<Value>>,
    claims_rule: Option<MockBehavior<Vec<Value>>>,
    field_rules: HashMap<ReportTemplateType, MockBehavior<Vec<FieldDescriptor>>>,
    bond_types_rule: Option<MockBehavior<Vec<Value>>>,
    validation_rule: Option<MockBehavior<ValidationResponse>>,
    submit_script: VecDeque<MockBehavior<ExtractionStatus>>,
    poll_script: VecDeque<MockBehavior<ExtractionStatus>>,
    calls: Vec<MockCall>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct MockController {
    state: Arc<Mutex<InternalState>>,
}

impl MockController {
    /// Set the behavior of `request_token`. Without one, every credential
    /// gets a fresh token.
    pub async fn set_token_behavior(&self, behavior: MockBehavior<AuthToken>) {
        self.state.lock().await.token_rule = Some(behavior);
    }

    /// Set the behavior of `preferences`.
    pub async fn set_preferences_behavior(&self, behavior: MockBehavior<Value>) {
        self.state.lock().await.preferences_rule = Some(behavior);
    }

    /// Set the behavior of `user_claims`.
    pub async fn set_claims_behavior(&self, behavior: MockBehavior<Vec<Value>>) {
        self.state.lock().await.claims_rule = Some(behavior);
    }

    /// Set the behavior of `valid_field_names` for one template.
    pub async fn set_fields_behavior(
        &self,
        template: ReportTemplateType,
        behavior: MockBehavior<Vec<FieldDescriptor>>,
    ) {
        self.state.lock().await.field_rules.insert(template, behavior);
    }

    /// Set the behavior of `bond_schedule_types`.
    pub async fn set_bond_types_behavior(&self, behavior: MockBehavior<Vec<Value>>) {
        self.state.lock().await.bond_types_rule = Some(behavior);
    }

    /// Set the behavior of `validate_identifiers`.
    pub async fn set_validation_behavior(&self, behavior: MockBehavior<ValidationResponse>) {
        self.state.lock().await.validation_rule = Some(behavior);
    }

    /// Queue the answer to the next `submit`.
    pub async fn push_submit(&self, behavior: MockBehavior<ExtractionStatus>) {
        self.state.lock().await.submit_script.push_back(behavior);
    }

    /// Queue the answer to the next `poll`.
    pub async fn push_poll(&self, behavior: MockBehavior<ExtractionStatus>) {
        self.state.lock().await.poll_script.push_back(behavior);
    }

    /// Return a copy of the call log.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of logged calls matching `pred`.
    pub async fn count_calls(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.lock().await.calls.iter().filter(|c| pred(c)).count()
    }

    /// Clear all configured behaviors, scripts and call logs.
    pub async fn clear_all_behaviors(&self) {
        *self.state.lock().await = InternalState::default();
    }
}

/// A connector that defers all behavior to an external controller.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn DssConnector>, MockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = MockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn DssConnector>, controller)
    }

    /// Log `call` and take a behavior snapshot without holding the lock
    /// across the answer.
    async fn record<T: Clone>(
        &self,
        call: MockCall,
        pick: impl FnOnce(&mut InternalState) -> Option<MockBehavior<T>>,
    ) -> Option<MockBehavior<T>> {
        let mut guard = self.state.lock().await;
        guard.calls.push(call);
        pick(&mut guard)
    }
}

async fn resolve<T>(behavior: Option<MockBehavior<T>>, capability: &str) -> Result<T, DssError> {
    match behavior {
        Some(MockBehavior::Return(v)) => Ok(v),
        Some(MockBehavior::Fail(e)) => Err(e),
        Some(MockBehavior::Hang) => std::future::pending().await,
        None => Err(DssError::unsupported(capability.to_string())),
    }
}

impl DssConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
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
impl AuthProvider for DynamicMockConnector {
    async fn request_token(&self, credentials: &Credentials) -> Result<AuthToken, DssError> {
        let call = MockCall::RequestToken {
            username: credentials.username.clone(),
        };
        let behavior = self.record(call, |s| s.token_rule.clone()).await;
        match behavior {
            None => Ok(AuthToken::new(format!("{}-token", self.name))),
            some => resolve(some, "auth").await,
        }
    }
}

#[async_trait]
impl UserProvider for DynamicMockConnector {
    async fn preferences(&self, _token: &AuthToken, username: &str) -> Result<Value, DssError> {
        let call = MockCall::Preferences {
            username: username.to_string(),
        };
        let behavior = self.record(call, |s| s.preferences_rule.clone()).await;
        resolve(behavior, "user/preferences").await
    }

    async fn user_claims(&self, _token: &AuthToken) -> Result<Vec<Value>, DssError> {
        let behavior = self
            .record(MockCall::UserClaims, |s| s.claims_rule.clone())
            .await;
        resolve(behavior, "user/claims").await
    }
}

#[async_trait]
impl MetadataProvider for DynamicMockConnector {
    async fn valid_field_names(
        &self,
        _token: &AuthToken,
        template: ReportTemplateType,
    ) -> Result<Vec<FieldDescriptor>, DssError> {
        let behavior = self
            .record(MockCall::ValidFieldNames(template), |s| {
                s.field_rules.get(&template).cloned()
            })
            .await;
        resolve(behavior, "metadata/fields").await
    }

    async fn bond_schedule_types(&self, _token: &AuthToken) -> Result<Vec<Value>, DssError> {
        let behavior = self
            .record(MockCall::BondScheduleTypes, |s| s.bond_types_rule.clone())
            .await;
        resolve(behavior, "metadata/bond-schedule-types").await
    }
}

#[async_trait]
impl ValidationProvider for DynamicMockConnector {
    async fn validate_identifiers(
        &self,
        _token: &AuthToken,
        instruments: &InstrumentList,
        keep_duplicates: bool,
    ) -> Result<ValidationResponse, DssError> {
        let call = MockCall::Validate {
            instruments: instruments.clone(),
            keep_duplicates,
        };
        let behavior = self.record(call, |s| s.validation_rule.clone()).await;
        resolve(behavior, "validation").await
    }
}

#[async_trait]
impl ExtractionProvider for DynamicMockConnector {
    async fn submit(
        &self,
        _token: &AuthToken,
        body: &RequestBody,
        endpoint: ExtractEndpoint,
    ) -> Result<ExtractionStatus, DssError> {
        let call = MockCall::Submit {
            body: body.to_value()?,
            endpoint,
        };
        let behavior = self.record(call, |s| s.submit_script.pop_front()).await;
        resolve(behavior, "extraction/submit").await
    }

    async fn poll(&self, _token: &AuthToken, location: &str) -> Result<ExtractionStatus, DssError> {
        let call = MockCall::Poll {
            location: location.to_string(),
        };
        let behavior = self.record(call, |s| s.poll_script.pop_front()).await;
        resolve(behavior, "extraction/poll").await
    }
}
