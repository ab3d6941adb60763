//! API route definitions and error mapping.

use crate::api::state::AppState;
use crate::incident::bulk::{self, BulkUpdate};
use crate::incident::query::{AssigneeFilter, StatusFilter};
use crate::incident::IncidentError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{json, Value};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/incidents", get(list_incidents))
        .route("/incidents/summary", get(incident_summary))
        .route("/incidents/{number}", get(incident_detail))
        .route("/incidents/bulk_update", post(bulk_update))
        .route("/incidents/generate", post(generate_incidents))
}

/// JSON error envelope. Domain errors map onto the status codes callers
/// expect; anything from the storage layer is a 500.
struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        ApiError(StatusCode::BAD_REQUEST, msg.into())
    }
}

impl From<IncidentError> for ApiError {
    fn from(e: IncidentError) -> Self {
        let code = match &e {
            IncidentError::NotFound(_) => StatusCode::NOT_FOUND,
            IncidentError::DuplicateNumber(_)
            | IncidentError::MissingParameters
            | IncidentError::InvalidAction(_)
            | IncidentError::MissingAssignee => StatusCode::BAD_REQUEST,
            IncidentError::Db(_) | IncidentError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %e, "Request failed");
        }
        ApiError(code, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

#[derive(Deserialize)]
struct ListParams {
    status: Option<String>,
    assigned_to: Option<String>,
}

/// `GET /incidents?status=&assigned_to=` -- the filtered dashboard view.
/// Field names and mixed-case statuses in the response are a contract
/// with export consumers.
async fn list_incidents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let status = StatusFilter::parse(params.status.as_deref())
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let assignee = AssigneeFilter::parse(params.assigned_to.as_deref());

    let incidents = state.query.filter(status, assignee)?;
    Ok(Json(json!({ "incidents": incidents })))
}

/// `GET /incidents/summary` -- aggregate counts over the whole store,
/// independent of any filter.
async fn incident_summary(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let summary = state.query.aggregate_counts()?;
    Ok(Json(serde_json::to_value(summary).map_err(|e| {
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?))
}

async fn incident_detail(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let incident = state.store.find_by_number(number)?;
    Ok(Json(json!({ "incident": incident })))
}

#[derive(Deserialize)]
struct BulkUpdateBody {
    #[serde(default)]
    incident_ids: Vec<i64>,
    action: Option<String>,
    assignee: Option<String>,
}

async fn bulk_update(
    State(state): State<AppState>,
    Json(body): Json<BulkUpdateBody>,
) -> Result<Json<Value>, ApiError> {
    let req = BulkUpdate {
        numbers: body.incident_ids,
        action: body.action,
        assignee: body.assignee,
    };
    let updated = bulk::apply(&state.store, &req)?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}

fn default_count() -> usize {
    1
}

#[derive(Deserialize)]
struct GenerateParams {
    #[serde(default = "default_count")]
    count: usize,
}

async fn generate_incidents(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
) -> Result<Json<Value>, ApiError> {
    let mut rng = StdRng::from_entropy();
    let ids = state.generator.generate(params.count, &mut rng)?;
    Ok(Json(json!({
        "message": format!("Generated {} incidents", ids.len()),
        "ids": ids
    })))
}
