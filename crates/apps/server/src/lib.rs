//! HTTP surface for the asset catalog.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use catalog::{Asset, AssetStore};
use query::{QueryParams, QueryResult, RawQueryParams};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone)]
struct AppState {
    store: Arc<AssetStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("asset {0} not found")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not_found", "id": id })),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Health<'a> {
    ok: bool,
    assets: usize,
    dataset: &'a str,
}

pub fn build_router(store: Arc<AssetStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health))
        .route("/api/assets", get(list_assets))
        .route("/api/assets/:id", get(get_asset))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

async fn health(State(state): State<AppState>) -> Response {
    let body = Health {
        ok: true,
        assets: state.store.len(),
        dataset: state.store.fingerprint(),
    };
    Json(body).into_response()
}

/// Every optional parameter parses independently; a bad one disables its
/// filter and the request still succeeds.
async fn list_assets(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<QueryResult> {
    let raw = RawQueryParams::from_pairs(pairs);
    let parsed = QueryParams::from_raw(&raw);
    for p in &parsed.ignored {
        debug!(param = p.name, raw = %p.raw, "ignoring parameter: {}", p.reason);
    }

    let result = query::query(state.store.as_ref(), &parsed.params);
    debug!(
        total = result.total,
        returned = result.items.len(),
        "asset query served"
    );
    Json(result)
}

async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Asset>, AppError> {
    query::find_by_id(state.store.as_ref(), &id)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound(id))
}
