use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::handler::schedule::GateQuery,
    api::state::SchedulingAppState,
    domain::{
        compliance::ComplianceReport,
        lifecycle::{CreateShift, ReplacementCandidate},
        schedule::{ProposedShift, UpdateShift},
    },
    error::SchedulingServiceError,
};
use shared::{
    responses::ApiResponse,
    types::{Shift, ShiftStatus},
};

#[utoipa::path(
    post,
    path = "/api/v1/shifts",
    tag = "Shifts",
    operation_id = "create_shift",
    params(GateQuery),
    request_body = CreateShift,
    responses(
        (status = 200, description = "Shift created", body = ApiResponse<Shift>),
        (status = 409, description = "Compliance warnings present and force not set"),
        (status = 422, description = "Compliance violations block creation")
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create(
    State(state): State<Arc<SchedulingAppState>>,
    Query(gate): Query<GateQuery>,
    Json(request): Json<CreateShift>,
) -> Result<Json<ApiResponse<Shift>>, SchedulingServiceError> {
    let shift = state
        .lifecycle
        .create_shift(request, gate.validate, gate.force)
        .await?;

    Ok(Json(ApiResponse::ok(shift)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/shifts/{id}",
    tag = "Shifts",
    operation_id = "update_shift",
    params(
        ("id" = Uuid, Path, description = "Shift ID"),
        GateQuery
    ),
    request_body = UpdateShift,
    responses(
        (status = 200, description = "Shift updated", body = ApiResponse<Shift>)
    )
)]
#[tracing::instrument(skip(state, patch))]
pub async fn update(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Query(gate): Query<GateQuery>,
    Json(patch): Json<UpdateShift>,
) -> Result<Json<ApiResponse<Shift>>, SchedulingServiceError> {
    let shift = state
        .lifecycle
        .update_shift(id, patch, gate.validate, gate.force)
        .await?;

    Ok(Json(ApiResponse::ok(shift)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/shifts/{id}",
    tag = "Shifts",
    operation_id = "delete_shift",
    params(
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 204, description = "Shift deleted")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, SchedulingServiceError> {
    state.lifecycle.delete_shift(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShiftComplianceResponse {
    pub shift_id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub report: ComplianceReport,
}

#[utoipa::path(
    get,
    path = "/api/v1/shifts/{id}/compliance",
    tag = "Shifts",
    operation_id = "shift_compliance",
    params(
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 200, description = "Compliance report for the shift", body = ApiResponse<ShiftComplianceResponse>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn compliance(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShiftComplianceResponse>>, SchedulingServiceError> {
    let shift = state.lifecycle.get_shift(id).await?;

    let proposed = ProposedShift {
        employee_id: shift.employee_id,
        date: shift.date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        break_minutes: shift.break_minutes,
    };
    let report = state.compliance.validate_shift(&proposed, Some(id)).await?;

    Ok(Json(ApiResponse::ok(ShiftComplianceResponse {
        shift_id: id,
        employee_id: shift.employee_id,
        date: shift.date,
        report,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CallOutRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallOutResponse {
    pub shift_id: Uuid,
    pub status: ShiftStatus,
    pub callout_reason: Option<String>,
    pub callout_time: Option<DateTime<Utc>>,
    pub original_employee_id: Uuid,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/shifts/{id}/callout",
    tag = "Shifts",
    params(
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    request_body = CallOutRequest,
    responses(
        (status = 200, description = "Shift marked as called out", body = ApiResponse<CallOutResponse>),
        (status = 409, description = "Shift is not in scheduled status")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn callout(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CallOutRequest>,
) -> Result<Json<ApiResponse<CallOutResponse>>, SchedulingServiceError> {
    let shift = state.lifecycle.mark_callout(id, request.reason).await?;

    let original_employee_id = shift.original_employee_id.ok_or_else(|| {
        SchedulingServiceError::Internal("Call-out did not capture the original employee".into())
    })?;

    Ok(Json(ApiResponse::ok(CallOutResponse {
        shift_id: shift.id,
        status: shift.status,
        callout_reason: shift.callout_reason,
        callout_time: shift.callout_time,
        original_employee_id,
        message: "Shift marked as called out; replacement search is open".to_string(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/shifts/{id}/replacements",
    tag = "Shifts",
    params(
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 200, description = "Ranked replacement candidates", body = ApiResponse<Vec<ReplacementCandidate>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn replacements(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReplacementCandidate>>>, SchedulingServiceError> {
    let candidates = state.lifecycle.find_replacements(id).await?;

    Ok(Json(ApiResponse::ok(candidates)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignReplacementRequest {
    pub replacement_employee_id: Uuid,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignReplacementResponse {
    pub shift_id: Uuid,
    pub status: ShiftStatus,
    pub original_employee_id: Option<Uuid>,
    pub new_employee_id: Uuid,
    pub covered_by_id: Uuid,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/shifts/{id}/assign-replacement",
    tag = "Shifts",
    params(
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    request_body = AssignReplacementRequest,
    responses(
        (status = 200, description = "Replacement assigned", body = ApiResponse<AssignReplacementResponse>),
        (status = 409, description = "Weekly-hour cap breached and force not set")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn assign_replacement(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignReplacementRequest>,
) -> Result<Json<ApiResponse<AssignReplacementResponse>>, SchedulingServiceError> {
    let shift = state
        .lifecycle
        .assign_replacement(id, request.replacement_employee_id, request.force)
        .await?;

    let covered_by_id = shift.covered_by_id.ok_or_else(|| {
        SchedulingServiceError::Internal("Coverage did not record the replacement".into())
    })?;

    Ok(Json(ApiResponse::ok(AssignReplacementResponse {
        shift_id: shift.id,
        status: shift.status,
        original_employee_id: shift.original_employee_id,
        new_employee_id: shift.employee_id,
        covered_by_id,
        message: "Shift covered".to_string(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/shifts/{id}/revert-callout",
    tag = "Shifts",
    params(
        ("id" = Uuid, Path, description = "Shift ID")
    ),
    responses(
        (status = 200, description = "Call-out reverted", body = ApiResponse<Shift>),
        (status = 409, description = "Shift is covered or lacks its captured original employee")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn revert_callout(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Shift>>, SchedulingServiceError> {
    let shift = state.lifecycle.revert_callout(id).await?;

    Ok(Json(ApiResponse::ok(shift)))
}
