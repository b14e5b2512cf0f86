use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    api::state::SchedulingAppState, domain::compliance::ComplianceReport,
    error::SchedulingServiceError,
};
use shared::{
    responses::ApiResponse,
    types::{Schedule, Shift},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleWithShifts {
    pub schedule: Schedule,
    pub shifts: Vec<Shift>,
}

fn default_validate() -> bool {
    true
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GateQuery {
    /// Run compliance validation first.
    #[serde(default = "default_validate")]
    pub validate: bool,
    /// Proceed despite warnings (errors still block).
    #[serde(default)]
    pub force: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/schedules/{id}",
    tag = "Schedules",
    operation_id = "get_schedule",
    params(
        ("id" = Uuid, Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Schedule with its shifts", body = ApiResponse<ScheduleWithShifts>),
        (status = 404, description = "Schedule not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleWithShifts>>, SchedulingServiceError> {
    let (schedule, shifts) = state.lifecycle.get_schedule(id).await?;

    Ok(Json(ApiResponse::ok(ScheduleWithShifts { schedule, shifts })))
}

#[utoipa::path(
    get,
    path = "/api/v1/schedules/{id}/compliance",
    tag = "Schedules",
    operation_id = "schedule_compliance",
    params(
        ("id" = Uuid, Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Compliance report for the schedule", body = ApiResponse<ComplianceReport>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn compliance(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ComplianceReport>>, SchedulingServiceError> {
    let report = state.compliance.validate_schedule(id).await?;

    Ok(Json(ApiResponse::ok(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/schedules/{id}/publish",
    tag = "Schedules",
    params(
        ("id" = Uuid, Path, description = "Schedule ID"),
        GateQuery
    ),
    responses(
        (status = 200, description = "Schedule published", body = ApiResponse<Schedule>),
        (status = 409, description = "Warnings present and force not set, or schedule already published"),
        (status = 422, description = "Compliance violations block publication")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn publish(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Query(gate): Query<GateQuery>,
) -> Result<Json<ApiResponse<Schedule>>, SchedulingServiceError> {
    let schedule = state.lifecycle.publish(id, gate.validate, gate.force).await?;

    Ok(Json(ApiResponse::ok(schedule)))
}

#[utoipa::path(
    post,
    path = "/api/v1/schedules/{id}/unpublish",
    tag = "Schedules",
    params(
        ("id" = Uuid, Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Schedule reverted to draft", body = ApiResponse<Schedule>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn unpublish(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Schedule>>, SchedulingServiceError> {
    let schedule = state.lifecycle.unpublish(id).await?;

    Ok(Json(ApiResponse::ok(schedule)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/schedules/{id}",
    tag = "Schedules",
    operation_id = "delete_schedule",
    params(
        ("id" = Uuid, Path, description = "Schedule ID")
    ),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 409, description = "Published schedules cannot be deleted")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, SchedulingServiceError> {
    state.lifecycle.delete_schedule(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
