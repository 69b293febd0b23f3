//! In-process treasury backend for integration tests.
//!
//! Serves the endpoints the desk consumes and applies the backend's order rules:
//! trades must fit the listing's available and minimum quantity and decrement it;
//! auction bids are stored as-is.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use treasury_desk::types::parse_iso_date;
use treasury_desk::{
    AuctionListing, OrderRecord, OrderRequest, OrderType, SecondaryListing, YieldPoint,
};

pub fn init_log() {
    let _ = env_logger::try_init();
}

#[derive(Default)]
pub struct MockBackend {
    /// Health probes answered 503 before the first 200.
    pub health_failures: AtomicUsize,
    pub health_hits: AtomicUsize,
    pub inventory_hits: AtomicUsize,
    pub order_list_hits: AtomicUsize,
    pub inventory: Mutex<Vec<SecondaryListing>>,
    pub auctions: Mutex<Vec<AuctionListing>>,
    pub yields: Mutex<Vec<YieldPoint>>,
    pub orders: Mutex<Vec<OrderRecord>>,
    /// Delay applied to every `POST /api/orders`.
    pub submit_delay: Mutex<Option<Duration>>,
    /// Delay applied to `GET /api/market/inventory`.
    pub inventory_delay: Mutex<Option<Duration>>,
    next_id: AtomicU64,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_health_failures(self: Arc<Self>, n: usize) -> Arc<Self> {
        self.health_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn set_inventory(&self, inventory: Vec<SecondaryListing>) {
        *self.inventory.lock().unwrap() = inventory;
    }

    pub fn set_auctions(&self, auctions: Vec<AuctionListing>) {
        *self.auctions.lock().unwrap() = auctions;
    }

    pub fn set_yields(&self, yields: Vec<YieldPoint>) {
        *self.yields.lock().unwrap() = yields;
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_inventory_delay(&self, delay: Duration) {
        *self.inventory_delay.lock().unwrap() = Some(delay);
    }

    pub fn available(&self, cusip: &str) -> Option<Decimal> {
        self.inventory
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.cusip == cusip)
            .map(|l| l.quantity_available)
    }

    pub fn stored_orders(&self) -> Vec<OrderRecord> {
        self.orders.lock().unwrap().clone()
    }
}

pub fn date(raw: &str) -> NaiveDate {
    parse_iso_date(raw).unwrap()
}

pub fn listing(cusip: &str, ytw: f64, maturity: &str) -> SecondaryListing {
    SecondaryListing {
        cusip: cusip.into(),
        description: format!("US TREASURY NOTE {}", cusip),
        term: None,
        coupon: Some(4.0),
        yield_to_worst: ytw,
        price_ask: 99.5,
        maturity_date: date(maturity),
        quantity_available: Decimal::from(500_000),
        quantity_min: Decimal::from(1_000),
    }
}

pub fn auction(cusip: &str, security_type: &str, term: &str, issue: &str) -> AuctionListing {
    AuctionListing {
        cusip: cusip.into(),
        security_type: security_type.into(),
        security_term: term.into(),
        auction_date: date(issue) - chrono::Duration::days(2),
        issue_date: date(issue),
        offering_amount: Decimal::from(1_000_000),
        status: Some("OPEN".into()),
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "detail": message.into() }))).into_response()
}

async fn health(Extension(backend): Extension<Arc<MockBackend>>) -> Response {
    backend.health_hits.fetch_add(1, Ordering::SeqCst);
    let failing = backend
        .health_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        detail(StatusCode::SERVICE_UNAVAILABLE, "Service initializing")
    } else {
        Json(serde_json::json!({ "status": "healthy" })).into_response()
    }
}

async fn inventory(Extension(backend): Extension<Arc<MockBackend>>) -> Response {
    backend.inventory_hits.fetch_add(1, Ordering::SeqCst);
    let delay = *backend.inventory_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let items = backend.inventory.lock().unwrap().clone();
    Json(items).into_response()
}

async fn auctions(Extension(backend): Extension<Arc<MockBackend>>) -> Response {
    let items = backend.auctions.lock().unwrap().clone();
    Json(items).into_response()
}

async fn yields(Extension(backend): Extension<Arc<MockBackend>>) -> Response {
    let items = backend.yields.lock().unwrap().clone();
    if items.is_empty() {
        return detail(StatusCode::SERVICE_UNAVAILABLE, "Yield data not available");
    }
    Json(items).into_response()
}

async fn list_orders(
    Extension(backend): Extension<Arc<MockBackend>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    backend.order_list_hits.fetch_add(1, Ordering::SeqCst);
    let skip: usize = params.get("skip").and_then(|s| s.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|s| s.parse().ok()).unwrap_or(100);
    let mut orders = backend.orders.lock().unwrap().clone();
    orders.reverse();
    let page: Vec<OrderRecord> = orders.into_iter().skip(skip).take(limit).collect();
    Json(page).into_response()
}

async fn create_order(
    Extension(backend): Extension<Arc<MockBackend>>,
    Json(req): Json<OrderRequest>,
) -> Response {
    let delay = *backend.submit_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if req.order_type == OrderType::Trade {
        let mut inventory = backend.inventory.lock().unwrap();
        let Some(item) = inventory.iter_mut().find(|l| l.cusip == req.cusip) else {
            return detail(StatusCode::NOT_FOUND, "Security not found in market inventory.");
        };
        if req.amount > item.quantity_available {
            return detail(
                StatusCode::BAD_REQUEST,
                format!(
                    "Insufficient quantity available in market inventory. Requested: {}, Available: {}",
                    req.amount, item.quantity_available
                ),
            );
        }
        if req.amount < item.quantity_min {
            return detail(
                StatusCode::BAD_REQUEST,
                format!(
                    "Order amount is below the minimum quantity. Minimum: {}",
                    item.quantity_min
                ),
            );
        }
        item.quantity_available -= req.amount;
    }
    let record = OrderRecord {
        id: backend.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        timestamp: chrono::Utc::now().naive_utc(),
        cusip: req.cusip,
        term: req.term,
        amount: req.amount,
        purchase_yield: req.purchase_yield,
        portfolio_type: req.portfolio_type,
        order_type: req.order_type,
    };
    backend.orders.lock().unwrap().push(record.clone());
    (StatusCode::OK, Json(record)).into_response()
}

pub fn router(backend: Arc<MockBackend>) -> Router<()> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/market/inventory", get(inventory))
        .route("/api/auctions", get(auctions))
        .route("/api/yields", get(yields))
        .route("/api/orders", get(list_orders).post(create_order))
        .layer(Extension(backend))
}

/// Serves `backend` on an ephemeral port; returns its base URL.
pub async fn spawn_backend(backend: Arc<MockBackend>) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let app = router(backend);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (format!("http://{}", addr), handle)
}

/// Polls `cond` every 10ms for up to two seconds.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
