use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use shared::{
    responses::ApiResponse,
    types::{TimeOffRequest, TimeOffStatus},
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::state::WorkforceAppState, domain::time_off::CreateTimeOff, error::WorkforceServiceError,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideTimeOffRequest {
    pub decided_by: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/time-off",
    tag = "TimeOff",
    operation_id = "create_time_off",
    request_body = CreateTimeOff,
    responses(
        (status = 200, description = "Time off request created (pending)", body = ApiResponse<TimeOffRequest>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<WorkforceAppState>>,
    Json(request): Json<CreateTimeOff>,
) -> Result<Json<ApiResponse<TimeOffRequest>>, WorkforceServiceError> {
    request.validate()?;
    if state
        .employee_repo
        .find_by_id(request.employee_id)
        .await?
        .is_none()
    {
        return Err(WorkforceServiceError::NotFound(
            "Employee not found".to_string(),
        ));
    }

    let output = state.time_off_repo.create(request).await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/time-off",
    tag = "TimeOff",
    operation_id = "list_time_off",
    params(
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Time off requests for employee", body = ApiResponse<Vec<TimeOffRequest>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn for_employee(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TimeOffRequest>>>, WorkforceServiceError> {
    let output = state.time_off_repo.for_employee(id).await?;
    Ok(Json(ApiResponse::ok(output)))
}

async fn decide(
    state: &WorkforceAppState,
    id: Uuid,
    status: TimeOffStatus,
    decided_by: Option<Uuid>,
) -> Result<TimeOffRequest, WorkforceServiceError> {
    let existing = state
        .time_off_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| WorkforceServiceError::NotFound("Time off request not found".to_string()))?;

    if existing.status != TimeOffStatus::Pending {
        return Err(WorkforceServiceError::Conflict(format!(
            "Time off request is already {:?}",
            existing.status
        )));
    }

    state
        .time_off_repo
        .set_status(id, status, decided_by, Some(Utc::now()))
        .await
}

#[utoipa::path(
    patch,
    path = "/api/v1/time-off/{id}/approve",
    tag = "TimeOff",
    operation_id = "approve_time_off",
    params(
        ("id" = Uuid, Path, description = "Time off request ID")
    ),
    request_body = DecideTimeOffRequest,
    responses(
        (status = 200, description = "Time off approved", body = ApiResponse<TimeOffRequest>),
        (status = 409, description = "Request already decided")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn approve(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecideTimeOffRequest>,
) -> Result<Json<ApiResponse<TimeOffRequest>>, WorkforceServiceError> {
    let output = decide(&state, id, TimeOffStatus::Approved, Some(body.decided_by)).await?;
    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/time-off/{id}/deny",
    tag = "TimeOff",
    operation_id = "deny_time_off",
    params(
        ("id" = Uuid, Path, description = "Time off request ID")
    ),
    request_body = DecideTimeOffRequest,
    responses(
        (status = 200, description = "Time off denied", body = ApiResponse<TimeOffRequest>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn deny(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecideTimeOffRequest>,
) -> Result<Json<ApiResponse<TimeOffRequest>>, WorkforceServiceError> {
    let output = decide(&state, id, TimeOffStatus::Denied, Some(body.decided_by)).await?;
    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/time-off/{id}/cancel",
    tag = "TimeOff",
    operation_id = "cancel_time_off",
    params(
        ("id" = Uuid, Path, description = "Time off request ID")
    ),
    responses(
        (status = 200, description = "Time off cancelled", body = ApiResponse<TimeOffRequest>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TimeOffRequest>>, WorkforceServiceError> {
    let output = decide(&state, id, TimeOffStatus::Cancelled, None).await?;
    Ok(Json(ApiResponse::ok(output)))
}
