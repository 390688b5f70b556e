//! HTTP API over a ranker store.
//!
//! Exposes the remote-store operations an editing session needs, so a UI
//! shell elsewhere can load orderings, search, and submit change batches.

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ranker_core::{ChangeSet, Item, RawRecord};
use ranker_store::{ApplySummary, FileStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server state shared across handlers.
struct AppState {
    store: FileStore,
}

/// Build the router for a store.
pub fn router(store: FileStore) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/health", get(health))
        .route("/order", get(order))
        .route("/recent", get(recent))
        .route("/suggestions", get(suggestions))
        .route("/changes", post(apply_changes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server.
///
/// # Errors
/// Returns error if the store can't be opened, binding fails, or the server
/// encounters an error.
pub async fn serve(store_path: &std::path::Path, host: &str, port: u16) -> Result<()> {
    let store = FileStore::open(store_path)?;
    let app = router(store);

    let addr = format!("{host}:{port}");
    info!(address = %addr, "Starting ranker server");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Request/Response types ---

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<RawRecord>,
    count: usize,
}

impl From<Vec<Item>> for ListResponse {
    fn from(items: Vec<Item>) -> Self {
        let items: Vec<RawRecord> = items.iter().map(Item::to_record).collect();
        Self {
            count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SuggestionQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ApplyResponse {
    status: &'static str,
    #[serde(flatten)]
    summary: ApplySummary,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn order(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse>, AppError> {
    Ok(Json(state.store.order()?.into()))
}

async fn recent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.store.config().editor.recent_display_count);
    Ok(Json(state.store.recent(Some(limit))?.into()))
}

async fn suggestions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.store.config().editor.suggestion_limit);
    Ok(Json(state.store.search(&query.q, Some(limit))?.into()))
}

async fn apply_changes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChangeSet>,
) -> Result<Json<ApplyResponse>, AppError> {
    let summary = state.store.apply(&payload)?;
    Ok(Json(ApplyResponse {
        status: "ok",
        summary,
    }))
}

// --- Error handling ---

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.downcast_ref::<StoreError>() {
            Some(StoreError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
            Some(StoreError::CategoryMismatch { .. } | StoreError::Rejected(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
