use std::sync::Arc;

use async_trait::async_trait;
use datascope_core::connector::{AuthToken, MetadataProvider};
use datascope_core::{DssConnector, DssError, FieldDescriptor, Middleware, ReportTemplateType};
use datascope_types::CacheConfig;
use moka::future::Cache;
use serde_json::Value;

/// Declarative layer that applies [`CachingConnector`] when building a stack.
pub struct CacheMiddleware {
    cfg: CacheConfig,
}

impl CacheMiddleware {
    /// Layer with the given settings.
    #[must_use]
    pub const fn new(cfg: CacheConfig) -> Self {
        Self { cfg }
    }
}

impl Middleware for CacheMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn DssConnector>) -> Arc<dyn DssConnector> {
        let Self { cfg } = *self;
        Arc::new(CachingConnector::new(inner, &cfg))
    }

    fn name(&self) -> &'static str {
        "CachingConnector"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ttl_ms": u64::try_from(self.cfg.ttl.as_millis()).unwrap_or(u64::MAX),
            "max_entries": self.cfg.max_entries,
        })
    }
}

/// Caches template metadata lookups.
///
/// Only successful answers are stored; errors always reach the caller and
/// the next call asks the inner connector again. Entries are shared across
/// tokens, since the vendor answers them the same for every account.
pub struct CachingConnector {
    inner: Arc<dyn DssConnector>,
    fields: Option<Cache<ReportTemplateType, Arc<Vec<FieldDescriptor>>>>,
    bond_types: Option<Cache<(), Arc<Vec<Value>>>>,
}

impl CachingConnector {
    /// Wrap `inner`. A zero TTL or capacity disables caching.
    #[must_use]
    pub fn new(inner: Arc<dyn DssConnector>, cfg: &CacheConfig) -> Self {
        let enabled = !cfg.ttl.is_zero() && cfg.max_entries > 0;
        let fields = enabled.then(|| {
            Cache::builder()
                .max_capacity(cfg.max_entries)
                .time_to_live(cfg.ttl)
                .build()
        });
        let bond_types = enabled.then(|| Cache::builder().max_capacity(1).time_to_live(cfg.ttl).build());
        Self {
            inner,
            fields,
            bond_types,
        }
    }

    /// Access the inner connector.
    pub fn inner(&self) -> &Arc<dyn DssConnector> {
        &self.inner
    }

    fn metadata(&self, what: &str) -> Result<&dyn MetadataProvider, DssError> {
        self.inner
            .as_metadata_provider()
            .ok_or_else(|| DssError::unsupported(what.to_string()))
    }
}

impl DssConnector for CachingConnector {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    datascope_core::dss_connector_accessors!(inner);
}

#[async_trait]
impl MetadataProvider for CachingConnector {
    async fn valid_field_names(
        &self,
        token: &AuthToken,
        template: ReportTemplateType,
    ) -> Result<Vec<FieldDescriptor>, DssError> {
        if let Some(cache) = &self.fields {
            if let Some(hit) = cache.get(&template).await {
                #[cfg(feature = "tracing")]
                tracing::debug!(template = %template, "field names served from cache");
                return Ok(hit.as_ref().clone());
            }
        }
        let fresh = self
            .metadata("metadata/fields")?
            .valid_field_names(token, template)
            .await?;
        if let Some(cache) = &self.fields {
            cache.insert(template, Arc::new(fresh.clone())).await;
        }
        Ok(fresh)
    }

    async fn bond_schedule_types(&self, token: &AuthToken) -> Result<Vec<Value>, DssError> {
        if let Some(cache) = &self.bond_types {
            if let Some(hit) = cache.get(&()).await {
                return Ok(hit.as_ref().clone());
            }
        }
        let fresh = self
            .metadata("metadata/bond-schedule-types")?
            .bond_schedule_types(token)
            .await?;
        if let Some(cache) = &self.bond_types {
            cache.insert((), Arc::new(fresh.clone())).await;
        }
        Ok(fresh)
    }
}

datascope_core::dss_delegate_provider_impls!(CachingConnector, inner, skip[metadata]);
