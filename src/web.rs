use crate::errors::{PredictError, PredictResult};
use crate::features::RawInput;
use crate::gateway::InferenceGateway;
use crate::history::{HistoryEntry, PredictionHistory};
use crate::input_validator::InputValidator;
use crate::report::PredictionReport;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: InferenceGateway,
    pub history: Option<Arc<PredictionHistory>>,
    pub validator: InputValidator,
    pub gauge_reference: f64,
}

impl AppState {
    pub fn new(gateway: InferenceGateway, history: Option<PredictionHistory>, gauge_reference: f64) -> Self {
        Self {
            gateway,
            history: history.map(Arc::new),
            validator: InputValidator::new(),
            gauge_reference,
        }
    }
}

/// Per-request context; replaces any process-wide session state.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub math: i32,
    pub reading: i32,
    pub writing: i32,
    pub gender: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub report: PredictionReport,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Validate, derive, predict, record and report one request.
pub fn serve_prediction(
    state: &AppState,
    ctx: RequestContext,
    req: &PredictRequest,
) -> PredictResult<PredictResponse> {
    let input: RawInput = state
        .validator
        .raw_input(req.math, req.reading, req.writing, &req.gender)?;
    let record = input.derive();
    let prediction = state.gateway.predict(&record)?;

    if let Some(history) = &state.history {
        // A failed history write does not withhold a computed prediction.
        if let Err(e) = history.append(&HistoryEntry::new(&input, record.average_score, &prediction)) {
            warn!("Failed to record prediction {}: {}", ctx.request_id, e);
        }
    }

    info!("Prediction served: label={}", prediction.label);
    Ok(PredictResponse {
        request_id: ctx.request_id,
        report: PredictionReport::new(&record, &prediction, state.gauge_reference),
    })
}

/// Build the router exposing prediction, history and health endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/history", get(history))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> PredictResult<Json<PredictResponse>> {
    let ctx = RequestContext::new();
    let span = info_span!("predict", request_id = %ctx.request_id);
    // History appends flush sled to disk; keep them off the async workers.
    let response =
        tokio::task::spawn_blocking(move || span.in_scope(|| serve_prediction(&state, ctx, &req)))
            .await??;
    Ok(Json(response))
}

async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> PredictResult<Json<Vec<HistoryEntry>>> {
    let history = state
        .history
        .as_ref()
        .ok_or_else(|| PredictError::not_found("history", "disabled"))?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(history.recent(limit)?))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ready = state.gateway.check_compatibility().is_ok();
    Json(serde_json::json!({
        "ready": ready,
        "schemaWidth": state.gateway.artifacts().schema.width(),
    }))
}
