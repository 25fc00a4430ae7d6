use rust_decimal::Decimal;

use crate::resources::{PurchaseOrder, PurchaseOrderStatus};
use crate::tenant::{Plan, Tenant, TenantRole};
use crate::types::Audit;

/// Fixtures shared by unit tests

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

pub fn tenant(id: &str) -> Tenant {
    Tenant {
        id: id.to_string(),
        name: format!("Tenant {}", id),
        slug: id.to_string(),
        domain: None,
        plan: Plan::Starter,
        role: TenantRole::Member,
        is_owner: false,
        audit: Audit::default(),
    }
}

pub fn purchase_order(id: &str, status: PurchaseOrderStatus) -> PurchaseOrder {
    PurchaseOrder {
        id: id.to_string(),
        tenant_id: "tenant-a".to_string(),
        number: format!("PO-{}", id),
        supplier_id: "supplier-1".to_string(),
        requisition_id: None,
        total_amount: dec("100.00"),
        currency: "USD".to_string(),
        expected_delivery: None,
        lines: Vec::new(),
        status,
        audit: Audit::default(),
    }
}
