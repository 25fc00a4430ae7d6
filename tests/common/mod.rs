#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use opsdesk::config::ClientConfig;
use opsdesk::session::{MemorySessionStore, RecordingNavigator, Tokens};
use opsdesk::Workspace;

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub tenant: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    pub requests: Vec<Recorded>,
    pub tenants: Vec<Value>,
    pub purchase_orders: BTreeMap<String, Value>,
    pub suppliers: Vec<Value>,
    pub settings: Value,
    /// Canned `(status, body)` replies served before routing, in order
    pub scripted: VecDeque<(u16, Value)>,
    pub next_id: u64,
}

/// In-process stand-in for the OpsDesk API and its identity provider
#[derive(Clone)]
pub struct StubBackend {
    pub base_url: String,
    state: Arc<Mutex<BackendState>>,
}

impl StubBackend {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind stub backend")?;

        let state = Arc::new(Mutex::new(BackendState {
            settings: json!({
                "currency": "USD",
                "timezone": "UTC",
                "fiscal_year_start": 1,
                "approval_threshold": "5000.00"
            }),
            ..Default::default()
        }));
        let backend = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        };

        let app = router(backend.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(backend)
    }

    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url)
    }

    /// Client config aimed at this backend with fast retries
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::for_base_url(self.api_url());
        config.identity.url = self.base_url.clone();
        config.retry.base_delay_ms = 1;
        config.cache.stale_time_secs = 300;
        config
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_tenants(&self, tenants: &[(&str, &str)]) -> &Self {
        self.state().tenants = tenants.iter().map(|(id, name)| tenant_json(id, name)).collect();
        self
    }

    pub fn with_purchase_order(&self, id: &str, status: &str) -> &Self {
        self.state().purchase_orders.insert(id.to_string(), purchase_order_json(id, status));
        self
    }

    pub fn fail_next(&self, status: u16, body: Value) -> &Self {
        self.state().scripted.push_back((status, body));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }
}

/// Workspace wired to the backend with an in-memory session
pub struct Harness {
    pub backend: StubBackend,
    pub session: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub workspace: Workspace,
}

pub async fn harness(tokens: Option<Tokens>) -> Result<Harness> {
    let backend = StubBackend::start().await?;
    let session = Arc::new(match tokens {
        Some(tokens) => MemorySessionStore::with_tokens(tokens),
        None => MemorySessionStore::new(),
    });
    let navigator = Arc::new(RecordingNavigator::new());
    let workspace = Workspace::new(backend.config(), session.clone(), navigator.clone())?;

    // Give the listener a moment on slow CI machines
    tokio::time::sleep(Duration::from_millis(10)).await;

    Ok(Harness {
        backend,
        session,
        navigator,
        workspace,
    })
}

pub fn tenant_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "plan": "starter",
        "role": "admin",
        "is_owner": false
    })
}

pub fn purchase_order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "tenant_id": "t-a",
        "number": format!("PO-{}", id),
        "supplier_id": "s-1",
        "total_amount": "100.00",
        "currency": "USD",
        "status": status,
        "lines": []
    })
}

fn router(backend: StubBackend) -> Router {
    let api = Router::new()
        .route("/tenants/mine", get(list_tenants))
        .route("/tenants", post(create_tenant))
        .route("/procurement/purchase-orders", get(list_purchase_orders).post(create_purchase_order))
        .route(
            "/procurement/purchase-orders/:id",
            get(get_purchase_order).put(update_purchase_order).delete(delete_purchase_order),
        )
        .route("/procurement/purchase-orders/:id/:action", post(transition_purchase_order))
        .route("/suppliers", get(list_suppliers))
        .route("/settings", get(get_settings).put(put_settings));

    Router::new()
        .nest("/api", api)
        .route("/realms/:realm/protocol/openid-connect/token", post(token))
        .layer(middleware::from_fn_with_state(backend.clone(), record_and_script))
        .layer(TraceLayer::new_for_http())
        .with_state(backend)
}

async fn record_and_script(State(backend): State<StubBackend>, request: Request, next: Next) -> Response {
    let header = |headers: &HeaderMap, name: &str| {
        headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
    };

    let scripted = {
        let mut state = backend.state();
        state.requests.push(Recorded {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            tenant: header(request.headers(), "x-tenant-id"),
            authorization: header(request.headers(), "authorization"),
        });
        state.scripted.pop_front()
    };

    match scripted {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
        None => next.run(request).await,
    }
}

async fn list_tenants(State(backend): State<StubBackend>) -> Json<Value> {
    // Enveloped on purpose
    Json(json!({ "success": true, "data": backend.state().tenants.clone() }))
}

async fn create_tenant(State(backend): State<StubBackend>, Json(body): Json<Value>) -> Response {
    let mut state = backend.state();
    let slug = body["slug"].as_str().unwrap_or_default().to_string();
    if state.tenants.iter().any(|t| t["slug"] == slug.as_str()) {
        return (StatusCode::CONFLICT, Json(json!({ "message": "Slug already taken" }))).into_response();
    }

    state.next_id += 1;
    let mut tenant = body.clone();
    tenant["id"] = json!(format!("t-new-{}", state.next_id));
    tenant["role"] = json!("owner");
    tenant["is_owner"] = json!(true);
    state.tenants.push(tenant.clone());
    (StatusCode::CREATED, Json(tenant)).into_response()
}

async fn list_purchase_orders(
    State(backend): State<StubBackend>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    let state = backend.state();
    let items: Vec<Value> = state
        .purchase_orders
        .values()
        .filter(|po| match params.get("status") {
            Some(status) => po["status"] == status.as_str(),
            None => true,
        })
        .cloned()
        .collect();
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: u32 = params.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(25);
    Json(json!({ "items": items, "total": items.len(), "page": page, "per_page": per_page }))
}

async fn create_purchase_order(State(backend): State<StubBackend>, Json(body): Json<Value>) -> Response {
    if body.get("supplier_id").and_then(Value::as_str).is_none() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": "Validation failed",
                "errors": { "supplier_id": ["is required"] }
            })),
        )
            .into_response();
    }

    let mut state = backend.state();
    state.next_id += 1;
    let id = format!("po-new-{}", state.next_id);
    let mut po = purchase_order_json(&id, "draft");
    po["supplier_id"] = body["supplier_id"].clone();
    state.purchase_orders.insert(id, po.clone());
    (StatusCode::CREATED, Json(po)).into_response()
}

async fn get_purchase_order(State(backend): State<StubBackend>, Path(id): Path<String>) -> Response {
    match backend.state().purchase_orders.get(&id) {
        Some(po) => Json(po.clone()).into_response(),
        None => not_found(&id),
    }
}

async fn update_purchase_order(
    State(backend): State<StubBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = backend.state();
    let Some(po) = state.purchase_orders.get_mut(&id) else {
        return not_found(&id);
    };
    if let (Value::Object(target), Value::Object(changes)) = (po, body) {
        target.extend(changes);
    }
    Json(state.purchase_orders[&id].clone()).into_response()
}

async fn delete_purchase_order(State(backend): State<StubBackend>, Path(id): Path<String>) -> Response {
    match backend.state().purchase_orders.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&id),
    }
}

async fn transition_purchase_order(
    State(backend): State<StubBackend>,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let next_status = match action.as_str() {
        "submit" => "pending",
        "approve" => "approved",
        "reject" => "rejected",
        "send" => "sent",
        "receive" => "received",
        "cancel" => "cancelled",
        "close" => "closed",
        _ => return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Unknown transition" }))).into_response(),
    };

    let mut state = backend.state();
    match state.purchase_orders.get_mut(&id) {
        Some(po) => {
            po["status"] = json!(next_status);
            Json(po.clone()).into_response()
        }
        None => not_found(&id),
    }
}

async fn list_suppliers(State(backend): State<StubBackend>) -> Json<Value> {
    // Bare array, no pagination wrapper
    Json(Value::Array(backend.state().suppliers.clone()))
}

async fn get_settings(State(backend): State<StubBackend>) -> Json<Value> {
    Json(json!({ "success": true, "data": backend.state().settings.clone() }))
}

async fn put_settings(State(backend): State<StubBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend.state().settings = body.clone();
    Json(body)
}

async fn token(Path(_realm): Path<String>, Form(form): Form<BTreeMap<String, String>>) -> Response {
    let grant = form.get("grant_type").map(String::as_str);
    let accepted = match grant {
        Some("password") => form.get("password").map(String::as_str) == Some("secret"),
        Some("refresh_token") => form.get("refresh_token").map(String::as_str) == Some("refresh-1"),
        _ => false,
    };

    if !accepted {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid user credentials" })),
        )
            .into_response();
    }

    Json(json!({
        "access_token": "access-from-idp",
        "refresh_token": "refresh-2",
        "token_type": "Bearer",
        "expires_in": 300
    }))
    .into_response()
}

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": format!("Record {} not found", id) }))).into_response()
}
