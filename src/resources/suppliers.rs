use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    SupplierStatus {
        Pending => "pending",
        Active => "active",
        Suspended => "suspended",
        Blacklisted => "blacklisted",
        Inactive => "inactive",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub status: SupplierStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for Supplier {
    const KIND: EntityKind = EntityKind::Supplier;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} [{}]", self.name, self.code)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}
