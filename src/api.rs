//! REST surface of the desk, for whatever renders the order form.
//!
//! Used by the binary and by integration tests. Create with [`create_router`].
//! Uses Extension for state so the router is `Router<()>` and works with `into_make_service()`.
//! Errors come back as `{"detail": "..."}`, the same shape the treasury backend uses.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use crate::error::{DeskError, SubmitError};
use crate::filter::FilterRange;
use crate::types::{DeskMode, PortfolioType};
use crate::Desk;

/// Shared app state: one desk per process.
#[derive(Clone)]
pub struct AppState {
    pub(crate) desk: Arc<Desk>,
}

/// Builds the desk router. Returns `Router<()>` so you can call `.into_make_service()` for `axum::serve`.
pub fn create_router(desk: Arc<Desk>) -> Router<()> {
    let state = AppState { desk };
    Router::new()
        .route("/health", get(health))
        .route("/desk/inventory", get(inventory))
        .route("/desk/filter", put(set_filter))
        .route("/desk/auctions", get(auctions))
        .route("/desk/yields", get(yields))
        .route("/desk/orders", get(orders))
        .route("/desk/order", get(order_form))
        .route("/desk/options", get(options))
        .route("/desk/mode", post(set_mode))
        .route("/desk/select", post(select))
        .route("/desk/amount", put(set_amount))
        .route("/desk/portfolio", put(set_portfolio))
        .route("/desk/submit", post(submit))
        .route("/desk/refresh", post(refresh))
        .layer(Extension(state))
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "detail": message.into() })),
    )
        .into_response()
}

fn error_response(e: &DeskError) -> Response {
    let status = match e {
        DeskError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        DeskError::UnknownSecurity(_) => StatusCode::NOT_FOUND,
        DeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DeskError::Submit(SubmitError::InProgress) => StatusCode::CONFLICT,
        DeskError::Submit(SubmitError::Rejected { status, .. }) if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
        }
        DeskError::Submit(_) | DeskError::Fetch(_) => StatusCode::BAD_GATEWAY,
    };
    detail(status, e.user_message())
}

async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.desk.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    }
}

async fn inventory(Extension(state): Extension<AppState>) -> Response {
    let view = state.desk.with_state(|s| s.inventory_view());
    (StatusCode::OK, Json(view)).into_response()
}

async fn set_filter(
    Extension(state): Extension<AppState>,
    Json(range): Json<FilterRange>,
) -> Response {
    let (lo, hi) = range.yield_range;
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "invalid yield range");
    }
    let view = state.desk.update(|s| {
        s.set_filter(range);
        s.inventory_view()
    });
    (StatusCode::OK, Json(view)).into_response()
}

async fn auctions(Extension(state): Extension<AppState>) -> Response {
    let list = state
        .desk
        .with_state(|s| s.auction_list().map(|a| a.to_vec()));
    (StatusCode::OK, Json(list)).into_response()
}

async fn yields(Extension(state): Extension<AppState>) -> Response {
    let points = state.desk.with_state(|s| s.yields().map(|y| y.to_vec()));
    (StatusCode::OK, Json(points)).into_response()
}

async fn orders(Extension(state): Extension<AppState>) -> Response {
    let history = state.desk.with_state(|s| s.orders().map(|o| o.to_vec()));
    (StatusCode::OK, Json(history)).into_response()
}

async fn options(Extension(state): Extension<AppState>) -> Response {
    let options = state.desk.with_state(|s| s.selection_options());
    (StatusCode::OK, Json(options)).into_response()
}

async fn order_form(Extension(state): Extension<AppState>) -> Response {
    (StatusCode::OK, Json(state.desk.order_form())).into_response()
}

#[derive(serde::Deserialize)]
struct ModeRequest {
    mode: DeskMode,
}

async fn set_mode(
    Extension(state): Extension<AppState>,
    Json(body): Json<ModeRequest>,
) -> Response {
    state.desk.update(|s| s.set_mode(body.mode));
    (StatusCode::OK, Json(state.desk.order_form())).into_response()
}

#[derive(serde::Deserialize)]
struct SelectRequest {
    cusip: String,
}

async fn select(
    Extension(state): Extension<AppState>,
    Json(body): Json<SelectRequest>,
) -> Response {
    match state.desk.update(|s| s.select(&body.cusip)) {
        Ok(()) => (StatusCode::OK, Json(state.desk.order_form())).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(serde::Deserialize)]
struct AmountRequest {
    amount: serde_json::Value,
}

async fn set_amount(
    Extension(state): Extension<AppState>,
    Json(body): Json<AmountRequest>,
) -> Response {
    state.desk.update(|s| match &body.amount {
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(v) => s.set_amount_f64(v),
            None => s.set_amount_input(""),
        },
        serde_json::Value::String(text) => s.set_amount_input(text),
        _ => s.set_amount_input(""),
    });
    (StatusCode::OK, Json(state.desk.order_form())).into_response()
}

#[derive(serde::Deserialize)]
struct PortfolioRequest {
    portfolio_type: PortfolioType,
}

async fn set_portfolio(
    Extension(state): Extension<AppState>,
    Json(body): Json<PortfolioRequest>,
) -> Response {
    state.desk.update(|s| s.set_portfolio(body.portfolio_type));
    (StatusCode::OK, Json(state.desk.order_form())).into_response()
}

async fn submit(Extension(state): Extension<AppState>) -> Response {
    match state.desk.submit().await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn refresh(Extension(state): Extension<AppState>) -> Response {
    let errors: Vec<String> = state
        .desk
        .load_all()
        .await
        .iter()
        .map(|e| e.to_string())
        .collect();
    #[derive(serde::Serialize)]
    struct Out {
        errors: Vec<String>,
    }
    (StatusCode::OK, Json(Out { errors })).into_response()
}
