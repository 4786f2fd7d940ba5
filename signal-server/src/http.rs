//! Silent Signal HTTP API
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! returning `(StatusCode, serde_json::Value)`. The inner functions are called
//! directly from tests without going through axum dispatch.
//!
//! Endpoints:
//! - GET  /health          — service status and selected model
//! - POST /api/agent/chat  — chat orchestrator
//! - POST /api/logs        — store a vitals reading
//! - GET  /api/history     — most recent vitals readings, newest first
//! - POST /api/bookings    — book an expert consultation
//! - GET  /api/bookings    — most recent bookings, newest first
//! - POST /api/orders      — accept a pharmacy checkout (not stored)

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use signal_core::models::{BookingCreate, BookingRecord, ChatRequest, OrderCreate, VitalsSnapshot};
use signal_core::{SignalConfig, VitalsStore};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::subsystems::chat::ChatOrchestrator;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn VitalsStore>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub config: SignalConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let cors = cors_layer(&state.config.http.allowed_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/agent/chat", post(chat_handler))
        .route("/api/logs", post(create_log_handler))
        .route("/api/history", get(history_handler))
        .route(
            "/api/bookings",
            post(create_booking_handler).get(list_bookings_handler),
        )
        .route("/api/orders", post(create_order_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Silent Signal HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

fn error_body(msg: impl Into<String>) -> serde_json::Value {
    json!({
        "error": msg.into(),
        "status": "error",
    })
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health — store reachability plus which collaborators are live.
pub async fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let store = match state.store.health().await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    (
        StatusCode::OK,
        json!({
            "status": "online",
            "version": env!("CARGO_PKG_VERSION"),
            "model": state.orchestrator.model_name(),
            "sentiment": state.orchestrator.has_sentiment(),
            "speech": state.orchestrator.has_speech(),
            "store": store,
        }),
    )
}

/// Inner chat — always 200; degraded replies are visible only in the body.
pub async fn chat_inner(
    orchestrator: &ChatOrchestrator,
    req: ChatRequest,
) -> (StatusCode, serde_json::Value) {
    let response = orchestrator.handle(&req).await;
    match serde_json::to_value(&response) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())),
    }
}

pub async fn create_log_inner(
    store: &dyn VitalsStore,
    vitals: VitalsSnapshot,
) -> (StatusCode, serde_json::Value) {
    if let Err(msg) = vitals.validate() {
        return (StatusCode::BAD_REQUEST, error_body(msg));
    }

    match store.insert_log(vitals).await {
        Ok(entry) => match serde_json::to_value(&entry) {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())),
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to store behavioral log");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
    }
}

pub async fn history_inner(store: &dyn VitalsStore, limit: u32) -> (StatusCode, serde_json::Value) {
    match store.recent_logs(limit).await {
        Ok(entries) => (StatusCode::OK, json!(entries)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load history");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
    }
}

pub async fn create_booking_inner(
    store: &dyn VitalsStore,
    default_user_name: &str,
    req: BookingCreate,
) -> (StatusCode, serde_json::Value) {
    if req.expert_name.trim().is_empty() || req.consultation_date.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_body("expert_name and consultation_date are required"),
        );
    }

    let record = BookingRecord::from_create(req, default_user_name);
    match store.insert_booking(record).await {
        Ok(stored) => {
            tracing::info!(id = %stored.id, expert = %stored.expert_name, "Booking created");
            (StatusCode::OK, json!({ "status": "success", "id": stored.id }))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store booking");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
    }
}

pub async fn list_bookings_inner(
    store: &dyn VitalsStore,
    limit: u32,
) -> (StatusCode, serde_json::Value) {
    match store.recent_bookings(limit).await {
        Ok(bookings) => (StatusCode::OK, json!(bookings)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load bookings");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
    }
}

/// Inner order — validated and logged only.
pub fn create_order_inner(req: OrderCreate) -> (StatusCode, serde_json::Value) {
    if !req.total.is_finite() || req.total < 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            error_body("total must be a non-negative number"),
        );
    }

    tracing::info!(
        items = req.items.len(),
        total = req.total,
        payment_method = %req.payment_method,
        "Order received"
    );
    (StatusCode::OK, json!({ "status": "success" }))
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn chat_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let (status, body) = chat_inner(&state.orchestrator, req).await;
    (status, Json(body))
}

pub async fn create_log_handler(
    State(state): State<Arc<HttpState>>,
    Json(vitals): Json<VitalsSnapshot>,
) -> impl IntoResponse {
    let (status, body) = create_log_inner(state.store.as_ref(), vitals).await;
    (status, Json(body))
}

pub async fn history_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = history_inner(state.store.as_ref(), state.config.chat.history_limit).await;
    (status, Json(body))
}

pub async fn create_booking_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<BookingCreate>,
) -> impl IntoResponse {
    let (status, body) = create_booking_inner(
        state.store.as_ref(),
        &state.config.chat.default_user_name,
        req,
    )
    .await;
    (status, Json(body))
}

pub async fn list_bookings_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) =
        list_bookings_inner(state.store.as_ref(), state.config.chat.history_limit).await;
    (status, Json(body))
}

pub async fn create_order_handler(Json(req): Json<OrderCreate>) -> impl IntoResponse {
    let (status, body) = create_order_inner(req);
    (status, Json(body))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
