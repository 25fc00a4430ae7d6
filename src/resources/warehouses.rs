use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    WarehouseStatus {
        Active => "active",
        Inactive => "inactive",
        Maintenance => "maintenance",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub capacity: Option<u64>,
    pub status: WarehouseStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for Warehouse {
    const KIND: EntityKind = EntityKind::Warehouse;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} {}", self.code, self.name)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}
