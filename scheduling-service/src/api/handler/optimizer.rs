use std::sync::Arc;
use std::time::Duration;

use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::state::SchedulingAppState,
    domain::{
        optimizer::{
            LockedShift, ManualOverride, OptimizationResult, OptimizationStatus, OptimizeParams,
        },
        templates::ShiftTemplate,
    },
    error::SchedulingServiceError,
};
use shared::responses::ApiResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OptimizeRequest {
    pub store_id: Uuid,
    /// Monday of the target week.
    pub week_start: NaiveDate,
    /// Max solve time; defaults to the preview budget, or the full budget
    /// when applying immediately.
    pub timeout_seconds: Option<u64>,
    pub min_coverage_percent: Option<f64>,
    #[serde(default)]
    pub apply_immediately: bool,
    /// Required when apply_immediately is set.
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub locked_shifts: Vec<LockedShift>,
    #[serde(default)]
    pub manual_overrides: Vec<ManualOverride>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OptimizeResponse {
    #[serde(flatten)]
    pub result: OptimizationResult,
    pub schedule_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/v1/optimizer/generate",
    tag = "Optimizer",
    operation_id = "generate_schedule",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Optimization result, optionally applied", body = ApiResponse<OptimizeResponse>),
        (status = 404, description = "Store not found"),
        (status = 409, description = "Published schedule already exists for this week"),
        (status = 422, description = "No feasible schedule under the given constraints"),
        (status = 504, description = "Solve timed out before finding any schedule")
    )
)]
#[tracing::instrument(skip(state, request), fields(store_id = %request.store_id, week_start = %request.week_start))]
pub async fn generate(
    State(state): State<Arc<SchedulingAppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<ApiResponse<OptimizeResponse>>, SchedulingServiceError> {
    let default_timeout = if request.apply_immediately {
        state.config.solve_timeout_secs
    } else {
        state.config.preview_timeout_secs
    };
    let timeout = Duration::from_secs(request.timeout_seconds.unwrap_or(default_timeout));

    let result = state
        .optimizer
        .optimize(OptimizeParams {
            store_id: request.store_id,
            week_start: request.week_start,
            timeout,
            min_coverage_percent: request
                .min_coverage_percent
                .unwrap_or(state.config.min_coverage_percent),
            locked_shifts: request.locked_shifts,
            manual_overrides: request.manual_overrides,
            solver_workers: state.config.solver_workers,
        })
        .await?;

    let mut schedule_id = None;
    if request.apply_immediately {
        match result.status {
            OptimizationStatus::Optimal | OptimizationStatus::Feasible => {
                let created_by = request.created_by.ok_or_else(|| {
                    SchedulingServiceError::BadRequest(
                        "created_by is required when apply_immediately is set".into(),
                    )
                })?;
                let proposed = result.shifts.iter().map(|s| s.to_proposed()).collect();
                let (schedule, _) = state
                    .optimizer
                    .apply_schedule(request.store_id, request.week_start, proposed, created_by)
                    .await?;
                schedule_id = Some(schedule.id);
            }
            OptimizationStatus::Infeasible => {
                return Err(SchedulingServiceError::Infeasible(result.message));
            }
            OptimizationStatus::Timeout => {
                return Err(SchedulingServiceError::TimedOut(result.message));
            }
            OptimizationStatus::Error => {
                return Err(SchedulingServiceError::BadRequest(result.message));
            }
        }
    }

    Ok(Json(ApiResponse::ok(OptimizeResponse {
        result,
        schedule_id,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyScheduleRequest {
    pub store_id: Uuid,
    pub week_start: NaiveDate,
    pub shifts: Vec<crate::domain::schedule::ProposedShift>,
    pub created_by: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplyScheduleResponse {
    pub schedule_id: Uuid,
    pub shift_count: usize,
}

#[utoipa::path(
    post,
    path = "/api/v1/optimizer/apply",
    tag = "Optimizer",
    request_body = ApplyScheduleRequest,
    responses(
        (status = 200, description = "Shifts applied as the week's draft schedule", body = ApiResponse<ApplyScheduleResponse>)
    )
)]
#[tracing::instrument(skip(state, request), fields(store_id = %request.store_id, week_start = %request.week_start))]
pub async fn apply(
    State(state): State<Arc<SchedulingAppState>>,
    Json(request): Json<ApplyScheduleRequest>,
) -> Result<Json<ApiResponse<ApplyScheduleResponse>>, SchedulingServiceError> {
    let (schedule, shifts) = state
        .optimizer
        .apply_schedule(
            request.store_id,
            request.week_start,
            request.shifts,
            request.created_by,
        )
        .await?;

    Ok(Json(ApiResponse::ok(ApplyScheduleResponse {
        schedule_id: schedule.id,
        shift_count: shifts.len(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/optimizer/templates",
    tag = "Optimizer",
    responses(
        (status = 200, description = "The shift template catalog", body = ApiResponse<Vec<ShiftTemplate>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn templates(
    State(state): State<Arc<SchedulingAppState>>,
) -> Json<ApiResponse<Vec<ShiftTemplate>>> {
    Json(ApiResponse::ok(state.optimizer.shift_templates().to_vec()))
}
