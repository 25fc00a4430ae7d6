
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::cache::QueryCache;
use crate::client::{HttpClient, RequestContext};
use crate::error::ApiError;
use crate::session::SessionError;
use crate::types::{Audit, EntityKind, Mutation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Starter,
    Professional,
    Enterprise,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantRole {
    Owner,
    Admin,
    Member,
    Viewer,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub domain: Option<String>,
    pub plan: Plan,
    pub role: TenantRole,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Payload for creating an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub plan: Plan,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantState {
    pub current_tenant: Option<Tenant>,
    pub user_tenants: Vec<Tenant>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub struct TenantStore {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
    state: RwLock<TenantState>,
}

impl TenantStore {
    pub fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self {
            client,
            cache,
            state: RwLock::new(TenantState::default()),
        }
    }

    pub async fn snapshot(&self) -> TenantState {
        self.state.read().await.clone()
    }

    pub async fn current_tenant(&self) -> Option<Tenant> {
        self.state.read().await.current_tenant.clone()
    }

    pub async fn user_tenants(&self) -> Vec<Tenant> {
        self.state.read().await.user_tenants.clone()
    }

    /// Context for the next request; carries the active tenant id if any
    pub async fn context(&self) -> RequestContext {
        match self.state.read().await.current_tenant {
            Some(ref tenant) => RequestContext::for_tenant(tenant.id.clone()),
            None => RequestContext::anonymous(),
        }
    }

    /// Load the caller's organizations and settle on an active one.
    ///
    /// On failure the list is emptied and the error flag set; the error is
    /// also returned.
    pub async fn fetch_user_tenants(&self) -> Result<Vec<Tenant>, TenantError> {
        let ctx = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
            match state.current_tenant {
                Some(ref tenant) => RequestContext::for_tenant(tenant.id.clone()),
                None => RequestContext::anonymous(),
            }
        };

        let fetched: Result<Vec<Tenant>, ApiError> = self
            .client
            .get(&ctx, &[EntityKind::Tenant.path(), "mine"], &[])
            .await;

        let tenants = match fetched {
            Ok(tenants) => tenants,
            Err(err) => {
                tracing::error!("Failed to load tenants: {}", err);
                let mut state = self.state.write().await;
                state.user_tenants = Vec::new();
                state.loading = false;
                state.error = Some(err.message().to_string());
                return Err(err.into());
            }
        };

        let persisted = match self.client.session().load_active_tenant().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Could not read persisted tenant selection: {}", e);
                None
            }
        };

        let activated = {
            let mut state = self.state.write().await;
            state.loading = false;
            state.user_tenants = tenants.clone();

            match state.current_tenant.as_ref().map(|t| t.id.clone()) {
                Some(current_id) => {
                    // Refresh the active record if the server still knows it
                    if let Some(fresh) = tenants.iter().find(|t| t.id == current_id) {
                        state.current_tenant = Some(fresh.clone());
                    }
                    None
                }
                None => {
                    let initial = pick_initial(&tenants, persisted.as_deref());
                    state.current_tenant = initial.clone();
                    initial
                }
            }
        };

        if let Some(tenant) = activated {
            tracing::info!("Active tenant: {} ({})", tenant.name, tenant.id);
            if persisted.as_deref() != Some(tenant.id.as_str()) {
                self.persist_selection(Some(&tenant.id)).await?;
            }
        }

        Ok(tenants)
    }

    /// Activate a tenant from the loaded list.
    ///
    /// Returns `Ok(false)` and leaves the active tenant untouched when `id`
    /// is not in the list. Cached queries are dropped on success since they
    /// were fetched under the previous tenant header.
    pub async fn switch_tenant(&self, id: &str) -> Result<bool, TenantError> {
        let target = {
            let state = self.state.read().await;
            state.user_tenants.iter().find(|t| t.id == id).cloned()
        };

        let Some(tenant) = target else {
            tracing::warn!("Tenant {} is not among the loaded tenants, keeping current selection", id);
            return Ok(false);
        };

        self.persist_selection(Some(&tenant.id)).await?;

        {
            let mut state = self.state.write().await;
            state.current_tenant = Some(tenant.clone());
            state.error = None;
        }
        self.cache.clear().await;

        tracing::info!("Switched to tenant {} ({})", tenant.name, tenant.id);
        Ok(true)
    }

    /// Create an organization and make it the active one
    pub async fn create_tenant(&self, data: &NewTenant) -> Result<Tenant, TenantError> {
        let ctx = self.context().await;
        let created: Tenant = match self.client.post(&ctx, &[EntityKind::Tenant.path()], Some(data)).await {
            Ok(tenant) => tenant,
            Err(err) => {
                self.state.write().await.error = Some(err.message().to_string());
                return Err(err.into());
            }
        };

        self.persist_selection(Some(&created.id)).await?;

        {
            let mut state = self.state.write().await;
            if !state.user_tenants.iter().any(|t| t.id == created.id) {
                state.user_tenants.push(created.clone());
            }
            state.current_tenant = Some(created.clone());
            state.error = None;
        }
        self.cache.clear().await;
        self.cache.after_mutation(EntityKind::Tenant, &Mutation::Create).await;

        tracing::info!("Created and activated tenant {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Forget the active tenant, e.g. on logout
    pub async fn clear(&self) -> Result<(), TenantError> {
        self.client.session().save_active_tenant(None).await?;
        let mut state = self.state.write().await;
        *state = TenantState::default();
        Ok(())
    }

    async fn persist_selection(&self, id: Option<&str>) -> Result<(), TenantError> {
        if let Err(e) = self.client.session().save_active_tenant(id).await {
            tracing::error!("Failed to persist tenant selection: {}", e);
            self.state.write().await.error = Some(e.to_string());
            return Err(e.into());
        }
        Ok(())
    }
}

/// The persisted selection if it is still available, otherwise the first tenant
fn pick_initial(tenants: &[Tenant], persisted: Option<&str>) -> Option<Tenant> {
    persisted
        .and_then(|id| tenants.iter().find(|t| t.id == id))
        .or_else(|| tenants.first())
        .cloned()
}
