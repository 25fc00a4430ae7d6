use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::{QueryCache, QueryKey};
use crate::client::{HttpClient, RequestContext};
use crate::error::ApiError;
use crate::types::{EntityKind, Mutation};

// Settings are a single document per tenant
const DOCUMENT_ID: &str = "current";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub currency: String,
    pub timezone: String,
    #[serde(default = "default_fiscal_year_start")]
    pub fiscal_year_start: u32,
    #[serde(default)]
    pub approval_threshold: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_fiscal_year_start() -> u32 {
    1
}

/// Read and replace the tenant's settings document
#[derive(Clone)]
pub struct SettingsApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl SettingsApi {
    pub fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn get(&self, ctx: &RequestContext) -> Result<Settings, ApiError> {
        let segments = [EntityKind::Settings.path()];
        self.cache
            .fetch(QueryKey::detail(ctx, EntityKind::Settings, DOCUMENT_ID), || {
                self.client.get(ctx, &segments, &[])
            })
            .await
    }

    pub async fn replace(&self, ctx: &RequestContext, settings: &Settings) -> Result<Settings, ApiError> {
        if !(1..=12).contains(&settings.fiscal_year_start) {
            return Err(ApiError::validation(
                "Invalid settings",
                Some([("fiscal_year_start".to_string(), vec!["must be a month between 1 and 12".to_string()])].into()),
            ));
        }

        let saved: Settings = self.client.put(ctx, &[EntityKind::Settings.path()], settings).await?;
        self.cache
            .after_mutation(EntityKind::Settings, &Mutation::Update(DOCUMENT_ID.to_string()))
            .await;
        Ok(saved)
    }
}
