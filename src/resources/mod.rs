use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::actions::{self, Action, ActionSet};
use crate::cache::{QueryCache, QueryKey};
use crate::client::{HttpClient, RequestContext};
use crate::error::ApiError;
use crate::filter::ListFilter;
use crate::types::{EntityKind, Mutation, Page};

/// Closed set of status strings for an entity
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

mod contracts;
mod forecasts;
mod inventory;
mod procurement;
mod rfx;
mod settings;
mod suppliers;
mod users;
mod warehouses;

pub use contracts::{Contract, ContractStatus};
pub use forecasts::{Forecast, ForecastStatus};
pub use inventory::{InventoryItem, InventoryStatus, StockAdjustment};
pub use procurement::{
    LineItem, NewPurchaseOrder, NewRequisition, PurchaseOrder, PurchaseOrderStatus, Requisition, RequisitionStatus,
};
pub use rfx::{RfxEvent, RfxKind, RfxStatus};
pub use settings::{Settings, SettingsApi};
pub use suppliers::{Supplier, SupplierStatus};
pub use users::{User, UserStatus};
pub use warehouses::{Warehouse, WarehouseStatus};

/// A record type living in one collection
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Short human label for listings
    fn label(&self) -> String;

    fn status(&self) -> Option<&'static str> {
        None
    }

    fn permitted_actions(&self) -> ActionSet {
        match self.status() {
            Some(status) => actions::permitted(Self::KIND, status),
            None => ActionSet::NONE,
        }
    }
}

/// Cached reads and invalidating writes for one collection
pub struct Resource<E> {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
    max_page_size: u32,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Resource<E> {
    pub fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>, max_page_size: u32) -> Self {
        Self {
            client,
            cache,
            max_page_size,
            _entity: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    pub async fn list(&self, ctx: &RequestContext, filter: &ListFilter) -> Result<Page<E>, ApiError> {
        let mut filter = filter.clone();
        filter.cap_page_size(self.max_page_size);

        let key = QueryKey::list(ctx, E::KIND, filter.cache_key());
        let query = filter.to_query_pairs();
        let segments = [E::KIND.path()];

        self.cache
            .fetch(key, || self.client.get(ctx, &segments, &query))
            .await
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<E, ApiError> {
        let key = QueryKey::detail(ctx, E::KIND, id);
        let segments = [E::KIND.path(), id];

        self.cache
            .fetch(key, || self.client.get(ctx, &segments, &[]))
            .await
    }

    /// Several records at once; fails on the first missing one
    pub async fn get_many(&self, ctx: &RequestContext, ids: &[String]) -> Result<Vec<E>, ApiError> {
        futures::future::try_join_all(ids.iter().map(|id| self.get(ctx, id))).await
    }

    pub async fn create<D: Serialize + ?Sized>(&self, ctx: &RequestContext, dto: &D) -> Result<E, ApiError> {
        let created: E = self.client.post(ctx, &[E::KIND.path()], Some(dto)).await?;
        self.cache.after_mutation(E::KIND, &Mutation::Create).await;
        Ok(created)
    }

    pub async fn update<D: Serialize + ?Sized>(&self, ctx: &RequestContext, id: &str, dto: &D) -> Result<E, ApiError> {
        let updated: E = self.client.put(ctx, &[E::KIND.path(), id], dto).await?;
        self.cache.after_mutation(E::KIND, &Mutation::Update(id.to_string())).await;
        Ok(updated)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<(), ApiError> {
        self.client.delete(ctx, &[E::KIND.path(), id]).await?;
        self.cache.after_mutation(E::KIND, &Mutation::Delete(id.to_string())).await;
        Ok(())
    }

    /// Post a status transition such as `approve` or `send`
    pub async fn transition(
        &self,
        ctx: &RequestContext,
        id: &str,
        action: Action,
        payload: Option<&Value>,
    ) -> Result<E, ApiError> {
        if !actions::transitions(E::KIND).contains(&action) {
            return Err(ApiError::validation(
                format!("{} does not support the '{}' transition", E::KIND, action),
                None,
            ));
        }

        let segment = action.path_segment();
        let updated: E = self
            .client
            .post(ctx, &[E::KIND.path(), id, segment.as_str()], payload)
            .await?;

        self.cache
            .after_mutation(
                E::KIND,
                &Mutation::Transition {
                    id: id.to_string(),
                    action: action.as_str().to_string(),
                },
            )
            .await;
        Ok(updated)
    }
}

impl<E> Clone for Resource<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: self.cache.clone(),
            max_page_size: self.max_page_size,
            _entity: PhantomData,
        }
    }
}
