mod common;

use anyhow::Result;
use serde_json::json;

use opsdesk::actions::Action;
use opsdesk::client::RequestContext;
use opsdesk::filter::ListFilter;
use opsdesk::resources::{Entity, PurchaseOrderStatus, SupplierStatus};
use opsdesk::ApiError;

const PO_PATH: &str = "/api/procurement/purchase-orders";

fn ctx() -> RequestContext {
    RequestContext::for_tenant("t-a")
}

#[tokio::test]
async fn repeated_list_is_served_from_cache() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft").with_purchase_order("po-2", "pending");
    let pos = h.workspace.purchase_orders();

    let first = pos.list(&ctx(), &ListFilter::new()).await?;
    let second = pos.list(&ctx(), &ListFilter::new()).await?;

    assert_eq!(first, second);
    assert_eq!(first.total, 2);
    assert_eq!(h.backend.requests_to("GET", PO_PATH).len(), 1);
    Ok(())
}

#[tokio::test]
async fn list_filters_become_query_parameters() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft").with_purchase_order("po-2", "pending");

    let mut filter = ListFilter::new();
    filter.status("pending").per_page(10_000)?;
    let page = h.workspace.purchase_orders().list(&ctx(), &filter).await?;

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].status, PurchaseOrderStatus::Pending);
    let seen = h.backend.requests_to("GET", PO_PATH);
    // Capped to the development preset's max page size
    assert_eq!(seen[0].query.as_deref(), Some("per_page=500&status=pending"));
    Ok(())
}

#[tokio::test]
async fn bare_array_lists_are_accepted() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.state().suppliers = vec![json!({
        "id": "s-1", "tenant_id": "t-a", "name": "Acme Metals", "code": "ACME", "status": "active"
    })];

    let page = h.workspace.suppliers().list(&ctx(), &ListFilter::new()).await?;

    assert_eq!(page.total, 1);
    assert_eq!(page.page, 1);
    assert_eq!(page.items[0].status, SupplierStatus::Active);
    Ok(())
}

#[tokio::test]
async fn create_invalidates_lists() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft");
    let pos = h.workspace.purchase_orders();

    assert_eq!(pos.list(&ctx(), &ListFilter::new()).await?.total, 1);

    let created = pos
        .create(&ctx(), &json!({ "supplier_id": "s-9", "currency": "USD", "lines": [] }))
        .await?;
    assert_eq!(created.status, PurchaseOrderStatus::Draft);
    assert_eq!(created.supplier_id, "s-9");

    // Invalidated, not patched: the list is fetched again
    assert_eq!(pos.list(&ctx(), &ListFilter::new()).await?.total, 2);
    assert_eq!(h.backend.requests_to("GET", PO_PATH).len(), 2);
    Ok(())
}

#[tokio::test]
async fn update_invalidates_the_record() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft");
    let pos = h.workspace.purchase_orders();
    let detail = format!("{}/po-1", PO_PATH);

    pos.get(&ctx(), "po-1").await?;
    pos.get(&ctx(), "po-1").await?;
    assert_eq!(h.backend.requests_to("GET", &detail).len(), 1);

    let updated = pos.update(&ctx(), "po-1", &json!({ "currency": "EUR" })).await?;
    assert_eq!(updated.currency, "EUR");
    assert_eq!(h.backend.requests_to("PUT", &detail).len(), 1);

    let fresh = pos.get(&ctx(), "po-1").await?;
    assert_eq!(fresh.currency, "EUR");
    assert_eq!(h.backend.requests_to("GET", &detail).len(), 2);
    Ok(())
}

#[tokio::test]
async fn delete_invalidates_and_record_is_gone() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft").with_purchase_order("po-2", "draft");
    let pos = h.workspace.purchase_orders();

    pos.get(&ctx(), "po-1").await?;
    pos.list(&ctx(), &ListFilter::new()).await?;

    pos.delete(&ctx(), "po-1").await?;

    let err = pos.get(&ctx(), "po-1").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(pos.list(&ctx(), &ListFilter::new()).await?.total, 1);
    assert_eq!(h.backend.requests_to("GET", PO_PATH).len(), 2);
    Ok(())
}

#[tokio::test]
async fn transition_posts_action_and_refreshes() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft");
    let pos = h.workspace.purchase_orders();

    let draft = pos.get(&ctx(), "po-1").await?;
    assert!(draft.permitted_actions().can(Action::Submit));

    let pending = pos.transition(&ctx(), "po-1", Action::Submit, None).await?;
    assert_eq!(pending.status, PurchaseOrderStatus::Pending);
    assert_eq!(h.backend.requests_to("POST", &format!("{}/po-1/submit", PO_PATH)).len(), 1);

    let refetched = pos.get(&ctx(), "po-1").await?;
    assert_eq!(refetched.status, PurchaseOrderStatus::Pending);
    assert!(refetched.permitted_actions().can(Action::Approve));
    assert!(!refetched.permitted_actions().can_edit());
    Ok(())
}

#[tokio::test]
async fn transition_payload_is_sent() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "pending");

    let rejected = h
        .workspace
        .purchase_orders()
        .transition(&ctx(), "po-1", Action::Reject, Some(&json!({ "reason": "Over budget" })))
        .await?;

    assert_eq!(rejected.status, PurchaseOrderStatus::Rejected);
    Ok(())
}

#[tokio::test]
async fn unsupported_transition_never_reaches_the_server() -> Result<()> {
    let h = common::harness(None).await?;

    let err = h
        .workspace
        .purchase_orders()
        .transition(&ctx(), "po-1", Action::Publish, None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), 400);
    assert!(h.backend.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn get_many_fetches_each_record() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft").with_purchase_order("po-2", "sent");

    let ids = vec!["po-1".to_string(), "po-2".to_string()];
    let records = h.workspace.purchase_orders().get_many(&ctx(), &ids).await?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status, PurchaseOrderStatus::Sent);

    let missing = vec!["po-1".to_string(), "po-404".to_string()];
    let err = h.workspace.purchase_orders().get_many(&ctx(), &missing).await.unwrap_err();
    assert_eq!(err.status(), 404);
    Ok(())
}

#[tokio::test]
async fn cached_reads_are_scoped_to_the_tenant() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "draft");
    let pos = h.workspace.purchase_orders();
    let a = RequestContext::for_tenant("t-a");
    let b = RequestContext::for_tenant("t-b");

    pos.list(&a, &ListFilter::new()).await?;
    pos.list(&b, &ListFilter::new()).await?;
    pos.get(&b, "po-1").await?;
    pos.get(&a, "po-1").await?;

    let tenants = |path: &str| -> Vec<Option<String>> {
        h.backend.requests_to("GET", path).into_iter().map(|r| r.tenant).collect()
    };
    let both = vec![Some("t-a".to_string()), Some("t-b".to_string())];
    assert_eq!(tenants(PO_PATH), both);
    let mut detail = tenants(&format!("{}/po-1", PO_PATH));
    detail.sort();
    assert_eq!(detail, both);

    // Same tenant again is a hit
    pos.list(&b, &ListFilter::new()).await?;
    assert_eq!(h.backend.requests_to("GET", PO_PATH).len(), 2);
    Ok(())
}

#[tokio::test]
async fn record_id_with_slash_stays_one_segment() -> Result<()> {
    let h = common::harness(None).await?;
    h.backend.with_purchase_order("po-1", "pending");
    let pos = h.workspace.purchase_orders();

    let err = pos.delete(&ctx(), "po-1/approve").await.unwrap_err();
    assert_eq!(err.status(), 404);

    let seen = h.backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].path, format!("{}/po-1%2Fapprove", PO_PATH));
    assert!(h.backend.state().purchase_orders.contains_key("po-1"));

    let err = pos.get(&ctx(), "..").await.unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(h.backend.requests().len(), 1);
    Ok(())
}
