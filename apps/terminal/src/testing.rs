//! State wired to in-memory fakes for the command tests.
//!
//! [`test_app`] points the backend URL at a closed local port: a command that
//! reaches the network fails with a backend error instead of the validation
//! error the tests look for. [`online_app`] talks HTTP to a [`FakeBackend`]
//! serving the order procedures and views on a loopback port.

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use comanda_client::{
    AuthBackend, ClientError, ClientResult, Entity, MemoryStore, PosConfig, QueryKey, SecureStore,
    Session, TokenPair, AUTH_KEY,
};
use comanda_core::{
    NewOrderLine, Order, OrderLine, OrderStatus, OrderType, Store, StoreConfig, UserIdentity,
};
use comanda_print::{AllowAll, OpLog, RecordingTransport};

use crate::state::{AppState, ConfigState};

/// Auth server that only knows the password "secret" and never refreshes.
#[derive(Default)]
pub(crate) struct StaticAuth {
    calls: AtomicUsize,
}

impl StaticAuth {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn session(access_token: &str) -> Session {
    Session {
        tokens: TokenPair {
            access_token: access_token.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        },
        user: UserIdentity {
            id: "u-1".into(),
            email: Some("ana@example.com".into()),
            role: None,
        },
    }
}

#[async_trait]
impl AuthBackend for StaticAuth {
    async fn sign_in_with_password(&self, _email: &str, password: &str) -> ClientResult<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if password == "secret" {
            Ok(session("access-0"))
        } else {
            Err(ClientError::Unauthorized("Invalid login credentials".into()))
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> ClientResult<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::Unauthorized("Invalid Refresh Token".into()))
    }

    async fn sign_out(&self, _access_token: &str) -> ClientResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn offline_config() -> PosConfig {
    let mut config = PosConfig::default();
    config.backend.url = "http://127.0.0.1:9".into();
    config.backend.anon_key = "anon".into();
    config
}

pub(crate) struct TestApp {
    pub(crate) state: AppState,
    pub(crate) auth: Arc<StaticAuth>,
    pub(crate) secure: Arc<MemoryStore>,
    pub(crate) printer_log: OpLog,
}

/// Signed in as u-1, working in store s-1.
pub(crate) async fn test_app() -> TestApp {
    app_with(offline_config(), RecordingTransport::new()).await
}

/// Like [`test_app`], backed by `backend` over HTTP.
pub(crate) async fn online_app(backend: &FakeBackend, transport: RecordingTransport) -> TestApp {
    let mut config = offline_config();
    config.backend.url = backend.serve().await;
    app_with(config, transport).await
}

async fn app_with(config: PosConfig, transport: RecordingTransport) -> TestApp {
    let auth = Arc::new(StaticAuth::default());
    let secure = Arc::new(MemoryStore::new());
    secure
        .set(AUTH_KEY, &session("access-0").to_json().unwrap())
        .unwrap();

    let printer_log = transport.log();

    let state = AppState::new(
        ConfigState::new(config, None),
        auth.clone(),
        secure.clone(),
        Box::new(transport),
        Arc::new(AllowAll),
    )
    .unwrap();

    state.session.session().restore().await;
    state.session.set_store(Some(Store {
        id: "s-1".into(),
        name: "Centro".into(),
    }));

    TestApp {
        state,
        auth,
        secure,
        printer_log,
    }
}

pub(crate) async fn test_state() -> AppState {
    test_app().await.state
}

/// Seeds the cached store config so no request is needed to read it.
pub(crate) fn cache_store_config(state: &AppState, printer_address: Option<&str>) {
    state.session.repos().cache().put(
        QueryKey::new(Entity::Store, "s-1", "config"),
        StoreConfig {
            id: "s-1".into(),
            name: "Centro".into(),
            printer_name: printer_address.map(|_| "Cocina".to_string()),
            printer_address: printer_address.map(str::to_string),
        },
    );
}

// =============================================================================
// Fake backend
// =============================================================================

/// A request as the fake backend received it.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub(crate) path: String,
    pub(crate) apikey: Option<String>,
    pub(crate) authorization: Option<String>,
}

#[derive(Default)]
struct BackendData {
    orders: Mutex<Vec<Order>>,
    requests: Mutex<Vec<SeenRequest>>,
    bare_rows: AtomicBool,
    rpc_delay_ms: AtomicU64,
    next_order: AtomicI64,
    next_line: AtomicI64,
}

#[derive(Deserialize)]
struct CreateArgs {
    #[serde(default)]
    p_table_id: Option<String>,
    #[serde(default)]
    p_customer_name: Option<String>,
    p_items: Vec<NewOrderLine>,
}

#[derive(Deserialize)]
struct AddArgs {
    p_order_id: String,
    p_items: Vec<NewOrderLine>,
}

fn product_name(product_id: &str) -> &'static str {
    match product_id {
        "p-1" => "Taco",
        "p-2" => "Agua",
        "p-3" => "Flan",
        _ => "Producto",
    }
}

fn table_name(table_id: &str) -> Option<&'static str> {
    (table_id == "t-1").then_some("Mesa 3")
}

impl BackendData {
    fn record(&self, path: &str, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(SeenRequest {
            path: path.to_string(),
            apikey: header("apikey"),
            authorization: header("authorization"),
        });
    }

    async fn rpc_latency(&self) {
        let ms = self.rpc_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }

    fn line(&self, line: NewOrderLine) -> OrderLine {
        let n = self.next_line.fetch_add(1, Ordering::SeqCst) + 1;
        OrderLine {
            id: format!("l-{}", n),
            product_name: product_name(&line.product_id).to_string(),
            product_id: Some(line.product_id),
            quantity: line.quantity,
            base_price: line.price,
            total_price: line.price * line.quantity,
            notes: line.notes,
        }
    }

    fn create(&self, order_type: OrderType, args: CreateArgs) -> Value {
        let number = self.next_order.fetch_add(1, Ordering::SeqCst) + 1;
        let order = Order {
            id: format!("o-{}", number),
            order_number: number,
            order_type,
            status: OrderStatus::Open,
            customer_name: args.p_customer_name,
            table_name: args
                .p_table_id
                .as_deref()
                .and_then(table_name)
                .map(str::to_string),
            table_id: args.p_table_id,
            created_at: Utc::now(),
            items: args.p_items.into_iter().map(|l| self.line(l)).collect(),
        };
        self.orders.lock().unwrap().push(order.clone());

        let mut row = serde_json::to_value(&order).unwrap();
        if self.bare_rows.load(Ordering::SeqCst) {
            if let Some(fields) = row.as_object_mut() {
                fields.remove("table_name");
            }
        }
        row
    }
}

async fn create_dine_in(
    State(data): State<Arc<BackendData>>,
    headers: HeaderMap,
    Json(args): Json<CreateArgs>,
) -> Json<Value> {
    data.record("rpc/create_dine_in_order", &headers);
    data.rpc_latency().await;
    Json(data.create(OrderType::DineIn, args))
}

async fn create_takeaway(
    State(data): State<Arc<BackendData>>,
    headers: HeaderMap,
    Json(args): Json<CreateArgs>,
) -> Json<Value> {
    data.record("rpc/create_takeaway_order", &headers);
    data.rpc_latency().await;
    Json(data.create(OrderType::Takeaway, args))
}

async fn add_items(
    State(data): State<Arc<BackendData>>,
    headers: HeaderMap,
    Json(args): Json<AddArgs>,
) -> Result<Json<Vec<OrderLine>>, (StatusCode, Json<Value>)> {
    data.record("rpc/add_items_to_order", &headers);
    data.rpc_latency().await;

    let added: Vec<OrderLine> = args.p_items.into_iter().map(|l| data.line(l)).collect();
    let mut orders = data.orders.lock().unwrap();
    match orders.iter_mut().find(|o| o.id == args.p_order_id) {
        Some(order) => {
            order.items.extend(added.iter().cloned());
            Ok(Json(added))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "order not found" })),
        )),
    }
}

async fn order_detail(
    State(data): State<Arc<BackendData>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Order>> {
    data.record("order_detail", &headers);
    let id = params.get("id").and_then(|v| v.strip_prefix("eq."));
    let orders = data.orders.lock().unwrap();
    Json(
        orders
            .iter()
            .filter(|o| id.map_or(true, |id| o.id == id))
            .cloned()
            .collect(),
    )
}

async fn store_config(State(data): State<Arc<BackendData>>, headers: HeaderMap) -> Json<Value> {
    data.record("store", &headers);
    Json(json!([{
        "id": "s-1",
        "name": "Centro",
        "printer_name": "Cocina",
        "printer_address": "COM5"
    }]))
}

/// Order procedures and views over HTTP, with the store's printer at COM5.
///
/// Knows products p-1 Taco, p-2 Agua, p-3 Flan and table t-1 "Mesa 3".
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    data: Arc<BackendData>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create procedures answer with the order row alone, no table name.
    pub(crate) fn with_bare_rows(self) -> Self {
        self.data.bare_rows.store(true, Ordering::SeqCst);
        self
    }

    /// Procedures take this long to answer.
    pub(crate) fn with_rpc_delay(self, ms: u64) -> Self {
        self.data.rpc_delay_ms.store(ms, Ordering::SeqCst);
        self
    }

    /// Starts serving on a loopback port and returns the base URL.
    pub(crate) async fn serve(&self) -> String {
        let app = Router::new()
            .route("/rest/v1/rpc/create_dine_in_order", post(create_dine_in))
            .route("/rest/v1/rpc/create_takeaway_order", post(create_takeaway))
            .route("/rest/v1/rpc/add_items_to_order", post(add_items))
            .route("/rest/v1/order_detail", get(order_detail))
            .route("/rest/v1/store", get(store_config))
            .with_state(self.data.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}", addr)
    }

    pub(crate) fn orders(&self) -> Vec<Order> {
        self.data.orders.lock().unwrap().clone()
    }

    pub(crate) fn requests(&self) -> Vec<SeenRequest> {
        self.data.requests.lock().unwrap().clone()
    }
}
