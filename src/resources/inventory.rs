use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    InventoryStatus {
        Active => "active",
        Discontinued => "discontinued",
        OutOfStock => "out_of_stock",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub quantity_on_hand: Decimal,
    #[serde(default)]
    pub reorder_point: Option<Decimal>,
    #[serde(default)]
    pub warehouse_id: Option<String>,
    pub status: InventoryStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl InventoryItem {
    /// At or below the reorder point
    pub fn needs_reorder(&self) -> bool {
        matches!(self.reorder_point, Some(point) if self.quantity_on_hand <= point)
    }
}

impl Entity for InventoryItem {
    const KIND: EntityKind = EntityKind::InventoryItem;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} {} ({} {})", self.sku, self.name, self.quantity_on_hand, self.unit)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

/// Payload for the `adjust` transition. Positive deltas add stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub delta: Decimal,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::dec;

    fn item(on_hand: &str, reorder: Option<&str>) -> InventoryItem {
        InventoryItem {
            id: "i1".into(),
            tenant_id: "t1".into(),
            sku: "BOLT-M8".into(),
            name: "Bolt M8".into(),
            unit: "pcs".into(),
            quantity_on_hand: dec(on_hand),
            reorder_point: reorder.map(dec),
            warehouse_id: None,
            status: InventoryStatus::Active,
            audit: Audit::default(),
        }
    }

    #[test]
    fn reorder_threshold_is_inclusive() {
        assert!(item("10", Some("10")).needs_reorder());
        assert!(!item("11", Some("10")).needs_reorder());
        assert!(!item("0", None).needs_reorder());
    }
}
