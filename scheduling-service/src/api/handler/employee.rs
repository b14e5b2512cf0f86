use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    api::state::SchedulingAppState, domain::compliance::EmployeeWeekStatus,
    error::SchedulingServiceError,
};
use shared::responses::ApiResponse;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeekQuery {
    /// Monday of the target week.
    pub week_start: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/compliance-status",
    tag = "Compliance",
    params(
        ("id" = Uuid, Path, description = "Employee ID"),
        WeekQuery
    ),
    responses(
        (status = 200, description = "Weekly hour and day budget for the employee", body = ApiResponse<EmployeeWeekStatus>),
        (status = 400, description = "week_start is not a Monday"),
        (status = 404, description = "Employee not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn compliance_status(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<ApiResponse<EmployeeWeekStatus>>, SchedulingServiceError> {
    let status = state.compliance.employee_status(id, query.week_start).await?;

    Ok(Json(ApiResponse::ok(status)))
}
