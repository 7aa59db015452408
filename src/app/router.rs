use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::{DateTime, FixedOffset, Local};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::app::service::ReadingService;
use crate::error::FeedError;
use crate::formats::{self, EntryAnalysis};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReadingService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/trmnl-data", get(trmnl_data))
        .route("/debug", get(debug))
        .route("/debug-entries", get(debug_entries))
        .route("/test-challenge", get(test_challenge))
        .route("/clear-cache", get(clear_cache).post(clear_cache))
        .route("/test-data", get(test_data))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

async fn trmnl_data(State(state): State<AppState>) -> Response {
    match state.service.snapshot().await {
        Ok(snapshot) => Json(formats::render_payload(
            snapshot.book(),
            snapshot.challenge(),
            local_now(),
        ))
        .into_response(),
        Err(err) => {
            tracing::warn!(%err, "serving status payload");
            let payload = match &err {
                FeedError::ConfigurationMissing(reason) => {
                    formats::configuration_required_payload(reason, local_now())
                }
                FeedError::UpstreamUnavailable { .. } => formats::unavailable_payload(local_now()),
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}

async fn debug(State(state): State<AppState>) -> Json<Value> {
    let diagnostics = state.service.diagnostics().await;
    Json(json!({
        "timestamp": local_now().to_rfc3339(),
        "diagnostics": diagnostics,
    }))
}

async fn debug_entries(
    State(state): State<AppState>,
) -> Result<Json<EntryAnalysis>, (StatusCode, Json<Value>)> {
    state.service.analyze_entries().await.map(Json).map_err(|err| {
        let status = if err.downcast_ref::<FeedError>().is_some() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::BAD_GATEWAY
        };
        (status, Json(json!({ "error": format!("{err:#}") })))
    })
}

async fn test_challenge(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.service.invalidate_challenge().await;
    let cached = state.service.current_challenge().await.map_err(|err| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
    })?;

    Ok(Json(json!({
        "challenge": Option::as_ref(&cached.value),
        "freshness": cached.freshness,
        "computed_at": cached.computed_at,
    })))
}

async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    state.service.invalidate_all().await;
    Json(json!({
        "status": "cleared",
        "timestamp": local_now().to_rfc3339(),
    }))
}

async fn test_data() -> Json<formats::TrmnlPayload> {
    Json(formats::sample_payload(local_now()))
}
