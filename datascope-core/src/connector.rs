use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DssError;
use crate::extraction::{FieldDescriptor, ValidationResponse};
use crate::identifiers::InstrumentList;
use crate::request::{ExtractEndpoint, RequestBody};
use crate::templates::ReportTemplateType;
pub use datascope_types::ConnectorKey;

/// Lifetime of a session token issued by the vendor.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Account credentials.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    /// Account user id.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Build credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session token returned by `Authentication/RequestToken`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
    issued_at: DateTime<Utc>,
}

impl AuthToken {
    /// Token issued now.
    pub fn new(value: impl Into<String>) -> Self {
        Self::issued_at(value, Utc::now())
    }

    /// Token issued at a given instant.
    pub fn issued_at(value: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            issued_at,
        }
    }

    /// Raw token string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the token was issued.
    #[must_use]
    pub const fn issued(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Instant after which the vendor rejects the token.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::hours(TOKEN_LIFETIME_HOURS)
    }

    /// True once the token is past its lifetime at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// True once the token is past its lifetime.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Token {}", self.value)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// State of a submitted extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStatus {
    /// 200: the payload is ready.
    Completed(Value),
    /// 202: still running.
    InProgress {
        /// Monitor URL from the `Location` header, if the response carried one.
        location: Option<String>,
        /// Progress text from the `Status` header, if any.
        progress: Option<String>,
    },
}

/// Role trait for connectors that issue session tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a token.
    async fn request_token(&self, credentials: &Credentials) -> Result<AuthToken, DssError>;
}

/// Role trait for connectors that expose account information.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Stored preferences of `username`.
    async fn preferences(&self, token: &AuthToken, username: &str) -> Result<Value, DssError>;

    /// Claims (content rights) of the authenticated account.
    async fn user_claims(&self, token: &AuthToken) -> Result<Vec<Value>, DssError>;
}

/// Role trait for connectors that expose template metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Content field names valid for a template family.
    async fn valid_field_names(
        &self,
        token: &AuthToken,
        template: ReportTemplateType,
    ) -> Result<Vec<FieldDescriptor>, DssError>;

    /// Bond schedule type codes.
    async fn bond_schedule_types(&self, token: &AuthToken) -> Result<Vec<Value>, DssError>;
}

/// Role trait for connectors that validate identifiers.
#[async_trait]
pub trait ValidationProvider: Send + Sync {
    /// Validate `instruments` against the vendor's instrument master.
    async fn validate_identifiers(
        &self,
        token: &AuthToken,
        instruments: &InstrumentList,
        keep_duplicates: bool,
    ) -> Result<ValidationResponse, DssError>;
}

/// Role trait for connectors that run on-demand extractions.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Submit a request.
    async fn submit(
        &self,
        token: &AuthToken,
        body: &RequestBody,
        endpoint: ExtractEndpoint,
    ) -> Result<ExtractionStatus, DssError>;

    /// Check a running extraction at its monitor URL.
    async fn poll(&self, token: &AuthToken, location: &str) -> Result<ExtractionStatus, DssError>;
}

/// A connector to a DataScope Select deployment (or a stand-in).
///
/// Capabilities are advertised through the `as_*_provider` accessors; the
/// defaults advertise nothing.
pub trait DssConnector: Send + Sync {
    /// Stable identifier, e.g. `"datascope-http"`.
    fn name(&self) -> &'static str;

    /// Typed key built from [`DssConnector::name`].
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Token issuing, if supported.
    fn as_auth_provider(&self) -> Option<&dyn AuthProvider> {
        None
    }

    /// Account information, if supported.
    fn as_user_provider(&self) -> Option<&dyn UserProvider> {
        None
    }

    /// Template metadata, if supported.
    fn as_metadata_provider(&self) -> Option<&dyn MetadataProvider> {
        None
    }

    /// Identifier validation, if supported.
    fn as_validation_provider(&self) -> Option<&dyn ValidationProvider> {
        None
    }

    /// Extractions, if supported.
    fn as_extraction_provider(&self) -> Option<&dyn ExtractionProvider> {
        None
    }
}

/// Implement the `as_*_provider` accessors of a wrapper so that it advertises
/// exactly the capabilities of its inner connector field `$inner`.
///
/// The wrapper must implement every role trait itself.
#[macro_export]
macro_rules! dss_connector_accessors {
    ($inner:ident) => {
        fn as_auth_provider(&self) -> Option<&dyn $crate::connector::AuthProvider> {
            if self.$inner.as_auth_provider().is_some() {
                Some(self as &dyn $crate::connector::AuthProvider)
            } else {
                None
            }
        }
        fn as_user_provider(&self) -> Option<&dyn $crate::connector::UserProvider> {
            if self.$inner.as_user_provider().is_some() {
                Some(self as &dyn $crate::connector::UserProvider)
            } else {
                None
            }
        }
        fn as_metadata_provider(&self) -> Option<&dyn $crate::connector::MetadataProvider> {
            if self.$inner.as_metadata_provider().is_some() {
                Some(self as &dyn $crate::connector::MetadataProvider)
            } else {
                None
            }
        }
        fn as_validation_provider(&self) -> Option<&dyn $crate::connector::ValidationProvider> {
            if self.$inner.as_validation_provider().is_some() {
                Some(self as &dyn $crate::connector::ValidationProvider)
            } else {
                None
            }
        }
        fn as_extraction_provider(&self) -> Option<&dyn $crate::connector::ExtractionProvider> {
            if self.$inner.as_extraction_provider().is_some() {
                Some(self as &dyn $crate::connector::ExtractionProvider)
            } else {
                None
            }
        }
    };
}

/// Generate pass-through role trait impls for `$self_ty` that forward to the
/// inner connector field `$inner`, except the traits listed after `skip`.
///
/// Used by wrappers that only intercept some capabilities.
#[macro_export]
macro_rules! dss_delegate_provider_impls {
    ($self_ty:ty, $inner:ident, skip [$($skip:ident),* $(,)?]) => {
        $crate::__dss_delegate!(@auth $self_ty, $inner, [$($skip),*]);
        $crate::__dss_delegate!(@user $self_ty, $inner, [$($skip),*]);
        $crate::__dss_delegate!(@metadata $self_ty, $inner, [$($skip),*]);
        $crate::__dss_delegate!(@validation $self_ty, $inner, [$($skip),*]);
        $crate::__dss_delegate!(@extraction $self_ty, $inner, [$($skip),*]);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __dss_delegate {
    (@auth $t:ty, $i:ident, [$($s:ident),*]) => {
        $crate::__dss_delegate!(@emit_if auth, [$($s),*], {
            #[async_trait::async_trait]
            impl $crate::connector::AuthProvider for $t {
                async fn request_token(
                    &self,
                    credentials: &$crate::connector::Credentials,
                ) -> Result<$crate::connector::AuthToken, $crate::DssError> {
                    self.$i
                        .as_auth_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("auth"))?
                        .request_token(credentials)
                        .await
                }
            }
        });
    };
    (@user $t:ty, $i:ident, [$($s:ident),*]) => {
        $crate::__dss_delegate!(@emit_if user, [$($s),*], {
            #[async_trait::async_trait]
            impl $crate::connector::UserProvider for $t {
                async fn preferences(
                    &self,
                    token: &$crate::connector::AuthToken,
                    username: &str,
                ) -> Result<serde_json::Value, $crate::DssError> {
                    self.$i
                        .as_user_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("user/preferences"))?
                        .preferences(token, username)
                        .await
                }

                async fn user_claims(
                    &self,
                    token: &$crate::connector::AuthToken,
                ) -> Result<Vec<serde_json::Value>, $crate::DssError> {
                    self.$i
                        .as_user_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("user/claims"))?
                        .user_claims(token)
                        .await
                }
            }
        });
    };
    (@metadata $t:ty, $i:ident, [$($s:ident),*]) => {
        $crate::__dss_delegate!(@emit_if metadata, [$($s),*], {
            #[async_trait::async_trait]
            impl $crate::connector::MetadataProvider for $t {
                async fn valid_field_names(
                    &self,
                    token: &$crate::connector::AuthToken,
                    template: $crate::ReportTemplateType,
                ) -> Result<Vec<$crate::FieldDescriptor>, $crate::DssError> {
                    self.$i
                        .as_metadata_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("metadata/fields"))?
                        .valid_field_names(token, template)
                        .await
                }

                async fn bond_schedule_types(
                    &self,
                    token: &$crate::connector::AuthToken,
                ) -> Result<Vec<serde_json::Value>, $crate::DssError> {
                    self.$i
                        .as_metadata_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("metadata/bond-schedule-types"))?
                        .bond_schedule_types(token)
                        .await
                }
            }
        });
    };
    (@validation $t:ty, $i:ident, [$($s:ident),*]) => {
        $crate::__dss_delegate!(@emit_if validation, [$($s),*], {
            #[async_trait::async_trait]
            impl $crate::connector::ValidationProvider for $t {
                async fn validate_identifiers(
                    &self,
                    token: &$crate::connector::AuthToken,
                    instruments: &$crate::InstrumentList,
                    keep_duplicates: bool,
                ) -> Result<$crate::ValidationResponse, $crate::DssError> {
                    self.$i
                        .as_validation_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("validation"))?
                        .validate_identifiers(token, instruments, keep_duplicates)
                        .await
                }
            }
        });
    };
    (@extraction $t:ty, $i:ident, [$($s:ident),*]) => {
        $crate::__dss_delegate!(@emit_if extraction, [$($s),*], {
            #[async_trait::async_trait]
            impl $crate::connector::ExtractionProvider for $t {
                async fn submit(
                    &self,
                    token: &$crate::connector::AuthToken,
                    body: &$crate::RequestBody,
                    endpoint: $crate::ExtractEndpoint,
                ) -> Result<$crate::ExtractionStatus, $crate::DssError> {
                    self.$i
                        .as_extraction_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("extraction/submit"))?
                        .submit(token, body, endpoint)
                        .await
                }

                async fn poll(
                    &self,
                    token: &$crate::connector::AuthToken,
                    location: &str,
                ) -> Result<$crate::ExtractionStatus, $crate::DssError> {
                    self.$i
                        .as_extraction_provider()
                        .ok_or_else(|| $crate::DssError::unsupported("extraction/poll"))?
                        .poll(token, location)
                        .await
                }
            }
        });
    };
    (@emit_if $name:ident, [], $body:tt) => {
        $crate::__dss_strip!($body);
    };
    (@emit_if auth, [auth $(, $rest:ident)*], $body:tt) => {};
    (@emit_if user, [user $(, $rest:ident)*], $body:tt) => {};
    (@emit_if metadata, [metadata $(, $rest:ident)*], $body:tt) => {};
    (@emit_if validation, [validation $(, $rest:ident)*], $body:tt) => {};
    (@emit_if extraction, [extraction $(, $rest:ident)*], $body:tt) => {};
    (@emit_if $name:ident, [$head:ident $(, $rest:ident)*], $body:tt) => {
        $crate::__dss_delegate!(@emit_if $name, [$($rest),*], $body);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __dss_strip {
    ({ $($tt:tt)* }) => { $($tt)* };
}
