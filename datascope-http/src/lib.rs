//! datascope-http
//!
//! Connector that implements `DssConnector` against the hosted DataScope
//! Select REST API with `reqwest`. Every capability is advertised: tokens,
//! account information, template metadata, identifier validation and
//! on-demand extractions.
#![warn(missing_docs)]

mod builder;

pub use builder::HttpConnectorBuilder;

use async_trait::async_trait;
use datascope_core::connector::{
    AuthProvider, AuthToken, ConnectorKey, Credentials, DssConnector, ExtractionProvider,
    ExtractionStatus, MetadataProvider, UserProvider, ValidationProvider,
};
use datascope_core::{
    DssError, ExtractEndpoint, FieldDescriptor, InstrumentList, ReportTemplateType, RequestBody,
    ValidationResponse,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, LOCATION};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

/// `Content-Type` of every POST body.
pub const CONTENT_TYPE_JSON: &str = "application/json; odata.metadata=minimal";

/// Response header carrying extraction progress text.
pub const STATUS_HEADER: &str = "Status";

/// Public connector type. Construct with [`HttpConnector::builder`].
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: String,
    prefer: String,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: impl reqwest::header::AsHeaderName) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn json(&self, what: &str) -> Result<Value, DssError> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| DssError::Data(format!("{what}: invalid json: {e}")))
    }

    /// Map a non-success reply to an error.
    fn error(&self, what: &str) -> DssError {
        let msg = vendor_message(&self.body);
        match self.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DssError::Auth(msg),
            StatusCode::NOT_FOUND => DssError::not_found(what.to_string()),
            s => DssError::http(s.as_u16(), msg),
        }
    }

    fn ok_json(&self, what: &str) -> Result<Value, DssError> {
        if self.status == StatusCode::OK {
            self.json(what)
        } else {
            Err(self.error(what))
        }
    }
}

/// The vendor's `error.message`, else the body text.
fn vendor_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

impl HttpConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new("datascope-http");

    /// Start configuring a connector.
    #[must_use]
    pub fn builder() -> HttpConnectorBuilder {
        HttpConnectorBuilder::new()
    }

    /// API root all relative paths are joined to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
        body: Option<String>,
    ) -> Result<Reply, DssError> {
        let mut req = self
            .client
            .request(method, self.url(path))
            .header("Prefer", &self.prefer);
        if let Some(t) = token {
            req = req.header(AUTHORIZATION, t.header_value());
        }
        if let Some(b) = body {
            req = req.header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(b);
        }
        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(transport)?.to_vec();
        #[cfg(feature = "tracing")]
        tracing::debug!(path, status = status.as_u16(), bytes = body.len(), "dss response");
        Ok(Reply {
            status,
            headers,
            body,
        })
    }

    async fn get(&self, path: &str, token: &AuthToken) -> Result<Reply, DssError> {
        self.send(Method::GET, path, Some(token), None).await
    }

    async fn post(
        &self,
        path: &str,
        token: Option<&AuthToken>,
        body: &Value,
    ) -> Result<Reply, DssError> {
        let text = serde_json::to_string(body)
            .map_err(|e| DssError::Data(format!("{path}: request body: {e}")))?;
        self.send(Method::POST, path, token, Some(text)).await
    }

    fn extraction_status(reply: &Reply, what: &str) -> Result<ExtractionStatus, DssError> {
        match reply.status {
            StatusCode::OK => Ok(ExtractionStatus::Completed(reply.json(what)?)),
            StatusCode::ACCEPTED => Ok(ExtractionStatus::InProgress {
                location: reply.header(LOCATION),
                progress: reply.header(STATUS_HEADER),
            }),
            _ => Err(reply.error(what)),
        }
    }

    fn value_array(mut v: Value, what: &str) -> Result<Vec<Value>, DssError> {
        match v.get_mut("value").map(Value::take) {
            Some(Value::Array(a)) => Ok(a),
            _ => Err(DssError::Data(format!("{what}: missing value array"))),
        }
    }
}

fn transport(e: reqwest::Error) -> DssError {
    DssError::connector("datascope-http", e.to_string())
}

impl DssConnector for HttpConnector {
    fn name(&self) -> &'static str {
        "datascope-http"
    }

    fn vendor(&self) -> &'static str {
        "DataScope Select"
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
impl AuthProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope_http::request_token",
            skip(self, credentials),
            fields(username = %credentials.username),
        )
    )]
    async fn request_token(&self, credentials: &Credentials) -> Result<AuthToken, DssError> {
        let body = json!({ "Credentials": credentials });
        let reply = self
            .post("Authentication/RequestToken", None, &body)
            .await?;
        if reply.status != StatusCode::OK {
            return Err(DssError::Auth(vendor_message(&reply.body)));
        }
        let v = reply.json("token")?;
        let token = v
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| DssError::Auth("token response has no value".into()))?;
        Ok(AuthToken::new(token))
    }
}

#[async_trait]
impl UserProvider for HttpConnector {
    async fn preferences(&self, token: &AuthToken, username: &str) -> Result<Value, DssError> {
        let path = format!("Users/Users({username})/Preferences");
        self.get(&path, token)
            .await?
            .ok_json(&format!("user preferences for {username}"))
    }

    async fn user_claims(&self, token: &AuthToken) -> Result<Vec<Value>, DssError> {
        let v = self.get("Users/UserClaims", token).await?.ok_json("user claims")?;
        Self::value_array(v, "user claims")
    }
}

#[async_trait]
impl MetadataProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope_http::valid_field_names",
            skip(self, token),
            fields(template = %template),
        )
    )]
    async fn valid_field_names(
        &self,
        token: &AuthToken,
        template: ReportTemplateType,
    ) -> Result<Vec<FieldDescriptor>, DssError> {
        let path = format!(
            "Extractions/GetValidExtractionFieldNames(ReportTemplateType={})",
            template.qualified_name()
        );
        let what = format!("field names for {template}");
        let v = self.get(&path, token).await?.ok_json(&what)?;
        Self::value_array(v, &what)?
            .into_iter()
            .map(|f| {
                serde_json::from_value(f).map_err(|e| DssError::Data(format!("{what}: {e}")))
            })
            .collect()
    }

    async fn bond_schedule_types(&self, token: &AuthToken) -> Result<Vec<Value>, DssError> {
        let what = "bond schedule types";
        let v = self
            .get(
                "Extractions/BondScheduleReportTemplateGetBondScheduleTypes",
                token,
            )
            .await?
            .ok_json(what)?;
        Self::value_array(v, what)
    }
}

#[async_trait]
impl ValidationProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope_http::validate_identifiers",
            skip(self, token, instruments),
            fields(count = instruments.len()),
        )
    )]
    async fn validate_identifiers(
        &self,
        token: &AuthToken,
        instruments: &InstrumentList,
        keep_duplicates: bool,
    ) -> Result<ValidationResponse, DssError> {
        let body = json!({
            "InputsForValidation": instruments,
            "KeepDuplicates": if keep_duplicates { "true" } else { "false" },
        });
        let v = self
            .post(
                "Extractions/InstrumentListValidateIdentifiers",
                Some(token),
                &body,
            )
            .await?
            .ok_json("identifier validation")?;
        ValidationResponse::from_value(v)
    }
}

#[async_trait]
impl ExtractionProvider for HttpConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "datascope_http::submit",
            skip(self, token, body),
            fields(endpoint = endpoint.path(), request = body.odata_type().unwrap_or("raw")),
        )
    )]
    async fn submit(
        &self,
        token: &AuthToken,
        body: &RequestBody,
        endpoint: ExtractEndpoint,
    ) -> Result<ExtractionStatus, DssError> {
        let payload = body.to_value()?;
        let reply = self.post(endpoint.path(), Some(token), &payload).await?;
        let status = Self::extraction_status(&reply, endpoint.path())?;
        if let ExtractionStatus::InProgress { location: None, .. } = status {
            return Err(DssError::Data(
                "extraction accepted without a Location header".into(),
            ));
        }
        Ok(status)
    }

    async fn poll(&self, token: &AuthToken, location: &str) -> Result<ExtractionStatus, DssError> {
        let reply = self.get(location, token).await?;
        Self::extraction_status(&reply, location)
    }
}
