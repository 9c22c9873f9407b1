//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{CoverageResponse, ErrorResponse, SeriesQuery, SeriesResponse};
use crate::engine::{ConsistencyReport, SummaryReport};
use crate::snapshot::{AggregateSnapshot, TOTAL_KEY, ViewKind};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: String) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

/// `GET /snapshot` → 200 + full snapshot JSON
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<AggregateSnapshot> {
    Json(state.snapshot.clone())
}

/// `GET /coverage` → 200 + `CoverageResponse` JSON
pub async fn get_coverage(State(state): State<Arc<AppState>>) -> Json<CoverageResponse> {
    let snap = &state.snapshot;
    Json(CoverageResponse {
        monthly: snap.coverage_rate.clone(),
        detail: snap.coverage_detail.clone(),
        hourly: snap.hourly_coverage_rate.clone(),
    })
}

/// `GET /summary` → 200 + `SummaryReport` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryReport> {
    Json(state.snapshot.summary.clone())
}

/// `GET /consistency` → 200 + `ConsistencyReport` JSON
pub async fn get_consistency(State(state): State<Arc<AppState>>) -> Json<ConsistencyReport> {
    Json(state.consistency.clone())
}

/// Returns one series of the snapshot.
///
/// `GET /series/solar` → monthly total of the `solar` group
/// `GET /series/solar?view=hourly_profile&series=plantA` → one entity
/// `GET /series/nope` → 404 + `ErrorResponse`
/// `GET /series/solar?view=weekly` → 400 + `ErrorResponse`
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let kind = match query.view.as_deref() {
        None => ViewKind::Monthly,
        Some(raw) => raw
            .parse::<ViewKind>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
    };
    let series = query.series.unwrap_or_else(|| TOTAL_KEY.to_string());

    let table = state
        .snapshot
        .view(kind)
        .get(&group)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown group \"{group}\"")))?;
    let values = table.get(&series).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("unknown series \"{series}\" in group \"{group}\""),
        )
    })?;

    Ok(Json(SeriesResponse {
        view: kind.to_string(),
        group,
        series,
        values: values.clone(),
    }))
}
