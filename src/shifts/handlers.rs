use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::ActorContext;
use crate::shifts::error::ShiftError;
use crate::shifts::models::{CloseShiftRequest, GetShiftsQuery, OpenShiftRequest, ShiftResponse};
use crate::shifts::ShiftService;
use crate::AppState;

/// POST /api/shifts/open
pub async fn open_shift(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<OpenShiftRequest>,
) -> Result<impl IntoResponse, ShiftError> {
    payload
        .validate()
        .map_err(|e| ShiftError::ValidationFailed(e.to_string()))?;

    let shift = state.shift_service.open(payload, &actor).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

/// POST /api/shifts/close
pub async fn close_shift(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CloseShiftRequest>,
) -> Result<impl IntoResponse, ShiftError> {
    payload
        .validate()
        .map_err(|e| ShiftError::ValidationFailed(e.to_string()))?;

    let response = state.shift_service.close(payload, &actor).await?;
    Ok(Json(response))
}

/// GET /api/shifts/current
pub async fn current_shift(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<impl IntoResponse, ShiftError> {
    let shift = state.shift_service.current_shift(&actor).await?;
    Ok(Json(shift))
}

/// GET /api/shifts
pub async fn get_shifts(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<GetShiftsQuery>,
) -> Result<impl IntoResponse, ShiftError> {
    let shifts = state.shift_service.list_shifts(query, &actor).await?;
    Ok(Json(shifts))
}

/// GET /api/shifts/:id
pub async fn get_shift(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(shift_id): Path<Uuid>,
) -> Result<impl IntoResponse, ShiftError> {
    let shift = state.shift_service.get_shift(shift_id, &actor).await?;
    let reconciliation_status = ShiftService::reconciliation_status(&shift);
    Ok(Json(ShiftResponse {
        shift,
        reconciliation_status,
    }))
}
