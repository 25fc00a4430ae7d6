use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::types::{Audit, EntityKind};

status_enum! {
    RequisitionStatus {
        Draft => "draft",
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Converted => "converted",
        Cancelled => "cancelled",
    }
}

status_enum! {
    PurchaseOrderStatus {
        Draft => "draft",
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Sent => "sent",
        PartiallyReceived => "partially_received",
        Received => "received",
        Cancelled => "cancelled",
        Closed => "closed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    #[serde(default)]
    pub item_id: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
}

impl LineItem {
    pub fn total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: String,
    pub tenant_id: String,
    pub number: String,
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub requested_by: Option<String>,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub lines: Vec<LineItem>,
    pub status: RequisitionStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for Requisition {
    const KIND: EntityKind = EntityKind::Requisition;

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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequisition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub currency: String,
    pub lines: Vec<LineItem>,
}

impl NewRequisition {
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(LineItem::total).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: String,
    pub tenant_id: String,
    pub number: String,
    pub supplier_id: String,
    #[serde(default)]
    pub requisition_id: Option<String>,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub expected_delivery: Option<NaiveDate>,
    #[serde(default)]
    pub lines: Vec<LineItem>,
    pub status: PurchaseOrderStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for PurchaseOrder {
    const KIND: EntityKind = EntityKind::PurchaseOrder;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        format!("{} ({} {})", self.number, self.total_amount, self.currency)
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub supplier_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_id: Option<String>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<NaiveDate>,
    pub lines: Vec<LineItem>,
}
