use std::sync::Arc;

use crate::cache::QueryCache;
use crate::client::{HttpClient, RequestContext};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::resources::{
    Contract, Entity, Forecast, InventoryItem, PurchaseOrder, Requisition, Resource, RfxEvent, SettingsApi, Supplier,
    User, Warehouse,
};
use crate::session::{Navigator, SessionStore};
use crate::tenant::{TenantError, TenantStore};

/// Everything a front end needs, wired once: the HTTP client, the shared
/// query cache, the tenant store, and typed access to each collection.
pub struct Workspace {
    config: ClientConfig,
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
    tenants: TenantStore,
}

impl Workspace {
    pub fn new(
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let client = Arc::new(HttpClient::new(&config, session, navigator)?);
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ClientConfig, client: Arc<HttpClient>) -> Self {
        let cache = Arc::new(QueryCache::new(config.stale_time()));
        let tenants = TenantStore::new(client.clone(), cache.clone());
        Self {
            config,
            client,
            cache,
            tenants,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn tenants(&self) -> &TenantStore {
        &self.tenants
    }

    /// Request context for the active tenant
    pub async fn context(&self) -> RequestContext {
        self.tenants.context().await
    }

    pub fn resource<E: Entity>(&self) -> Resource<E> {
        Resource::new(self.client.clone(), self.cache.clone(), self.config.api.max_page_size)
    }

    pub fn requisitions(&self) -> Resource<Requisition> {
        self.resource()
    }

    pub fn purchase_orders(&self) -> Resource<PurchaseOrder> {
        self.resource()
    }

    pub fn suppliers(&self) -> Resource<Supplier> {
        self.resource()
    }

    pub fn rfx(&self) -> Resource<RfxEvent> {
        self.resource()
    }

    pub fn contracts(&self) -> Resource<Contract> {
        self.resource()
    }

    pub fn users(&self) -> Resource<User> {
        self.resource()
    }

    pub fn inventory(&self) -> Resource<InventoryItem> {
        self.resource()
    }

    pub fn warehouses(&self) -> Resource<Warehouse> {
        self.resource()
    }

    pub fn forecasts(&self) -> Resource<Forecast> {
        self.resource()
    }

    pub fn settings(&self) -> SettingsApi {
        SettingsApi::new(self.client.clone(), self.cache.clone())
    }

    /// Drop tokens and cached data. The tenant selection survives unless
    /// `forget_tenant` is set.
    pub async fn logout(&self, forget_tenant: bool) -> Result<(), TenantError> {
        self.client.session().clear_tokens().await?;
        self.cache.clear().await;
        if forget_tenant {
            self.tenants.clear().await?;
        }
        tracing::info!("Logged out");
        Ok(())
    }
}
