/// Shared types used across the codebase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every kind of record the client reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Tenant,
    Requisition,
    PurchaseOrder,
    Supplier,
    Rfx,
    Contract,
    User,
    InventoryItem,
    Warehouse,
    Forecast,
    Settings,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Tenant,
        EntityKind::Requisition,
        EntityKind::PurchaseOrder,
        EntityKind::Supplier,
        EntityKind::Rfx,
        EntityKind::Contract,
        EntityKind::User,
        EntityKind::InventoryItem,
        EntityKind::Warehouse,
        EntityKind::Forecast,
        EntityKind::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenant",
            EntityKind::Requisition => "requisition",
            EntityKind::PurchaseOrder => "purchase_order",
            EntityKind::Supplier => "supplier",
            EntityKind::Rfx => "rfx",
            EntityKind::Contract => "contract",
            EntityKind::User => "user",
            EntityKind::InventoryItem => "inventory_item",
            EntityKind::Warehouse => "warehouse",
            EntityKind::Forecast => "forecast",
            EntityKind::Settings => "settings",
        }
    }

    /// Collection path below the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenants",
            EntityKind::Requisition => "procurement/requisitions",
            EntityKind::PurchaseOrder => "procurement/purchase-orders",
            EntityKind::Supplier => "suppliers",
            EntityKind::Rfx => "rfx",
            EntityKind::Contract => "contracts",
            EntityKind::User => "users",
            EntityKind::InventoryItem => "inventory/items",
            EntityKind::Warehouse => "warehouses",
            EntityKind::Forecast => "forecasts",
            EntityKind::Settings => "settings",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let kind = match normalized.as_str() {
            "tenant" | "tenants" => EntityKind::Tenant,
            "requisition" | "requisitions" | "req" => EntityKind::Requisition,
            "purchase_order" | "purchase_orders" | "po" => EntityKind::PurchaseOrder,
            "supplier" | "suppliers" => EntityKind::Supplier,
            "rfx" | "rfi" | "rfp" | "rfq" => EntityKind::Rfx,
            "contract" | "contracts" => EntityKind::Contract,
            "user" | "users" => EntityKind::User,
            "inventory_item" | "inventory_items" | "inventory" | "item" => EntityKind::InventoryItem,
            "warehouse" | "warehouses" => EntityKind::Warehouse,
            "forecast" | "forecasts" => EntityKind::Forecast,
            "settings" => EntityKind::Settings,
            _ => return Err(format!("Unknown entity kind '{}'", s)),
        };
        Ok(kind)
    }
}

/// Write operations a resource can perform. Every one of them invalidates
/// cached reads for the affected entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    Create,
    Update(String),
    Delete(String),
    Transition { id: String, action: String },
}

impl Mutation {
    /// Id of the single entity touched, if any
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Mutation::Create => None,
            Mutation::Update(id) | Mutation::Delete(id) => Some(id),
            Mutation::Transition { id, .. } => Some(id),
        }
    }
}

/// Audit columns carried by every tenant-owned entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire<T> {
    Paged {
        items: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        per_page: Option<u32>,
    },
    Bare(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PageWire::deserialize(deserializer)? {
            PageWire::Paged { items, total, page, per_page } => {
                let count = items.len();
                Page {
                    total: total.unwrap_or(count as u64),
                    page: page.unwrap_or(1),
                    per_page: per_page.unwrap_or(count as u32),
                    items,
                }
            }
            PageWire::Bare(items) => {
                let count = items.len();
                Page {
                    items,
                    total: count as u64,
                    page: 1,
                    per_page: count as u32,
                }
            }
        })
    }
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Strip the `{ "success": true, "data": ... }` envelope when present
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
