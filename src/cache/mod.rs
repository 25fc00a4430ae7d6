//! Query cache. Writes drop the affected entries, they never patch them.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::client::RequestContext;
use crate::error::ApiError;
use crate::types::{EntityKind, Mutation};

/// Cache key. Scoped by the tenant the read was issued for, so a read for one
/// organization is never answered with another organization's rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    List { tenant: Option<String>, kind: EntityKind, params: String },
    Detail { tenant: Option<String>, kind: EntityKind, id: String },
}

impl QueryKey {
    pub fn list(ctx: &RequestContext, kind: EntityKind, params: impl Into<String>) -> Self {
        QueryKey::List {
            tenant: ctx.tenant_id.clone(),
            kind,
            params: params.into(),
        }
    }

    pub fn detail(ctx: &RequestContext, kind: EntityKind, id: impl Into<String>) -> Self {
        QueryKey::Detail {
            tenant: ctx.tenant_id.clone(),
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            QueryKey::List { kind, .. } | QueryKey::Detail { kind, .. } => *kind,
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::List { tenant, kind, params } => {
                write!(f, "[{}] {}:list?{}", tenant.as_deref().unwrap_or("-"), kind, params)
            }
            QueryKey::Detail { tenant, kind, id } => {
                write!(f, "[{}] {}:detail/{}", tenant.as_deref().unwrap_or("-"), kind, id)
            }
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    fetched_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    // Bumped on every invalidation so in-flight loads started earlier
    // cannot repopulate the cache with pre-write data
    generations: HashMap<EntityKind, u64>,
}

impl State {
    fn generation(&self, kind: EntityKind) -> u64 {
        self.generations.get(&kind).copied().unwrap_or(0)
    }

    fn bump(&mut self, kind: EntityKind) {
        *self.generations.entry(kind).or_insert(0) += 1;
    }
}

#[derive(Debug)]
pub struct QueryCache {
    stale_time: Duration,
    state: RwLock<State>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            state: RwLock::new(State::default()),
        }
    }

    /// Serve a fresh cached value, otherwise run `load` and remember its result
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, load: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let generation = {
            let state = self.state.read().await;
            if let Some(entry) = state.entries.get(&key) {
                if entry.fetched_at.elapsed() < self.stale_time {
                    tracing::debug!("cache hit {}", key);
                    return Ok(serde_json::from_value(entry.value.clone())?);
                }
            }
            state.generation(key.kind())
        };

        tracing::debug!("cache miss {}", key);
        let fresh = load().await?;
        let value = serde_json::to_value(&fresh)?;

        let mut state = self.state.write().await;
        if state.generation(key.kind()) == generation {
            state.entries.insert(key, Entry { value, fetched_at: Instant::now() });
        } else {
            tracing::debug!("discarding load for {} started before an invalidation", key);
        }

        Ok(fresh)
    }

    /// Drop every list and detail entry of `kind`
    pub async fn invalidate(&self, kind: EntityKind) {
        let mut state = self.state.write().await;
        state.entries.retain(|key, _| key.kind() != kind);
        state.bump(kind);
        tracing::debug!("invalidated all {} queries", kind);
    }

    /// Drop the detail entries for one id, under every tenant
    pub async fn invalidate_detail(&self, kind: EntityKind, id: &str) {
        let mut state = self.state.write().await;
        state.entries.retain(|key, _| match key {
            QueryKey::Detail { kind: k, id: cached, .. } => *k != kind || cached.as_str() != id,
            QueryKey::List { .. } => true,
        });
        state.bump(kind);
    }

    /// Apply the invalidation a write implies: lists always, detail when an id is known.
    /// Tenants are not distinguished here; dropping too much only costs a refetch.
    pub async fn after_mutation(&self, kind: EntityKind, mutation: &Mutation) {
        let mut state = self.state.write().await;
        state.entries.retain(|key, _| match key {
            QueryKey::List { kind: k, .. } => *k != kind,
            QueryKey::Detail { kind: k, id, .. } => *k != kind || Some(id.as_str()) != mutation.entity_id(),
        });
        state.bump(kind);
        tracing::debug!("{:?} on {} invalidated cached reads", mutation, kind);
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        for kind in EntityKind::ALL {
            state.bump(kind);
        }
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.state.read().await.entries.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> RequestContext {
        RequestContext::for_tenant("t-1")
    }

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(60))
    }

    async fn load_counted(calls: &AtomicUsize, value: u32) -> Result<u32, ApiError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let key = QueryKey::list(&ctx(), EntityKind::Supplier, "page=1");

        let first: u32 = cache.fetch(key.clone(), || load_counted(&calls, 1)).await.unwrap();
        let second: u32 = cache.fetch(key, || load_counted(&calls, 2)).await.unwrap();

        assert_eq!((first, second), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_stale_time_always_refetches() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);
        let key = QueryKey::detail(&ctx(), EntityKind::Contract, "c-1");

        let _: u32 = cache.fetch(key.clone(), || load_counted(&calls, 1)).await.unwrap();
        let second: u32 = cache.fetch(key, || load_counted(&calls, 2)).await.unwrap();

        assert_eq!(second, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mutation_drops_lists_and_touched_detail_only() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let list = QueryKey::list(&ctx(), EntityKind::PurchaseOrder, "");
        let touched = QueryKey::detail(&ctx(), EntityKind::PurchaseOrder, "po-1");
        let untouched = QueryKey::detail(&ctx(), EntityKind::PurchaseOrder, "po-2");
        let other_kind = QueryKey::list(&ctx(), EntityKind::Supplier, "");

        for key in [&list, &touched, &untouched, &other_kind] {
            let _: u32 = cache.fetch(key.clone(), || load_counted(&calls, 0)).await.unwrap();
        }

        cache.after_mutation(EntityKind::PurchaseOrder, &Mutation::Update("po-1".into())).await;

        assert!(!cache.contains(&list).await);
        assert!(!cache.contains(&touched).await);
        assert!(cache.contains(&untouched).await);
        assert!(cache.contains(&other_kind).await);
    }

    #[tokio::test]
    async fn invalidate_kind_and_clear() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let _: u32 = cache.fetch(QueryKey::list(&ctx(), EntityKind::User, "a"), || load_counted(&calls, 0)).await.unwrap();
        let _: u32 = cache.fetch(QueryKey::detail(&ctx(), EntityKind::User, "u1"), || load_counted(&calls, 0)).await.unwrap();
        let _: u32 = cache.fetch(QueryKey::list(&ctx(), EntityKind::Warehouse, ""), || load_counted(&calls, 0)).await.unwrap();

        cache.invalidate(EntityKind::User).await;
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn load_racing_an_invalidation_is_not_stored() {
        let cache = cache();
        let key = QueryKey::list(&ctx(), EntityKind::Requisition, "");

        let value: u32 = cache
            .fetch(key.clone(), || async {
                cache.invalidate(EntityKind::Requisition).await;
                Ok(5)
            })
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert!(!cache.contains(&key).await);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = cache();
        let key = QueryKey::detail(&ctx(), EntityKind::Forecast, "f-1");
        let result: Result<u32, ApiError> = cache
            .fetch(key.clone(), || async { Err(ApiError::not_found("gone")) })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains(&key).await);
    }

    #[tokio::test]
    async fn tenants_do_not_share_entries() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let a = RequestContext::for_tenant("t-a");
        let b = RequestContext::for_tenant("t-b");

        let first: u32 = cache
            .fetch(QueryKey::list(&a, EntityKind::Supplier, ""), || load_counted(&calls, 1))
            .await
            .unwrap();
        let second: u32 = cache
            .fetch(QueryKey::list(&b, EntityKind::Supplier, ""), || load_counted(&calls, 2))
            .await
            .unwrap();
        let anonymous: u32 = cache
            .fetch(QueryKey::list(&RequestContext::anonymous(), EntityKind::Supplier, ""), || load_counted(&calls, 3))
            .await
            .unwrap();

        assert_eq!((first, second, anonymous), (1, 2, 3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn detail_invalidation_covers_every_tenant() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let a = QueryKey::detail(&RequestContext::for_tenant("t-a"), EntityKind::User, "u-1");
        let b = QueryKey::detail(&RequestContext::for_tenant("t-b"), EntityKind::User, "u-1");
        for key in [&a, &b] {
            let _: u32 = cache.fetch(key.clone(), || load_counted(&calls, 0)).await.unwrap();
        }

        cache.invalidate_detail(EntityKind::User, "u-1").await;

        assert!(cache.is_empty().await);
    }
}
