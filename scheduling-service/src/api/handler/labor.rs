use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    api::state::SchedulingAppState,
    domain::labor::{HourlyRequirements, StaffingEstimate, WeeklyLaborSummary},
    error::SchedulingServiceError,
};
use shared::responses::ApiResponse;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    pub store_id: Uuid,
    pub date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/labor/requirements",
    tag = "Labor",
    params(DayQuery),
    responses(
        (status = 200, description = "Required picker-hours per operating hour", body = ApiResponse<HourlyRequirements>),
        (status = 404, description = "Store not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn hourly_requirements(
    State(state): State<Arc<SchedulingAppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiResponse<HourlyRequirements>>, SchedulingServiceError> {
    let output = state
        .labor
        .hourly_requirements(query.store_id, query.date)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeekQuery {
    pub store_id: Uuid,
    /// Monday of the target week.
    pub week_start: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/labor/weekly-summary",
    tag = "Labor",
    params(WeekQuery),
    responses(
        (status = 200, description = "Weekly labor requirement summary", body = ApiResponse<WeeklyLaborSummary>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn weekly_summary(
    State(state): State<Arc<SchedulingAppState>>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<ApiResponse<WeeklyLaborSummary>>, SchedulingServiceError> {
    let output = state
        .labor
        .weekly_summary(query.store_id, query.week_start)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    get,
    path = "/api/v1/labor/staffing-estimate",
    tag = "Labor",
    params(DayQuery),
    responses(
        (status = 200, description = "Staffing estimate for the day", body = ApiResponse<StaffingEstimate>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn staffing_estimate(
    State(state): State<Arc<SchedulingAppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiResponse<StaffingEstimate>>, SchedulingServiceError> {
    let output = state
        .labor
        .estimate_staffing_for_day(query.store_id, query.date)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}
