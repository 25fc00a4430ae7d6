use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    ContractStatus {
        Draft => "draft",
        PendingApproval => "pending_approval",
        Active => "active",
        Expired => "expired",
        Terminated => "terminated",
        Renewed => "renewed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub tenant_id: String,
    pub number: String,
    pub title: String,
    pub supplier_id: String,
    pub value: Decimal,
    pub currency: String,
    pub starts_on: NaiveDate,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
    pub status: ContractStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Contract {
    /// Days left until `ends_on`, negative once past; `None` for open-ended contracts
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.ends_on.map(|end| (end - today).num_days())
    }
}

impl Entity for Contract {
    const KIND: EntityKind = EntityKind::Contract;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} {}", self.number, self.title)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}
