use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use shared::{responses::ApiResponse, types::Availability};
use uuid::Uuid;

use crate::{
    api::state::WorkforceAppState, domain::availability::SetAvailability,
    error::WorkforceServiceError,
};

#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/availability",
    tag = "Availability",
    operation_id = "get_availability",
    params(
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Weekly availability rows", body = ApiResponse<Vec<Availability>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn for_employee(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Availability>>>, WorkforceServiceError> {
    let output = state.availability_repo.for_employee(id).await?;
    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}/availability",
    tag = "Availability",
    operation_id = "replace_availability",
    params(
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    request_body = Vec<SetAvailability>,
    responses(
        (status = 200, description = "Availability replaced", body = ApiResponse<Vec<Availability>>),
        (status = 400, description = "Invalid day_of_week or preference window")
    )
)]
#[tracing::instrument(skip(state, rows))]
pub async fn replace(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
    Json(rows): Json<Vec<SetAvailability>>,
) -> Result<Json<ApiResponse<Vec<Availability>>>, WorkforceServiceError> {
    if state.employee_repo.find_by_id(id).await?.is_none() {
        return Err(WorkforceServiceError::NotFound(
            "Employee not found".to_string(),
        ));
    }
    for row in &rows {
        row.validate()?;
    }

    let output = state.availability_repo.replace_for_employee(id, rows).await?;

    Ok(Json(ApiResponse::ok(output)))
}
