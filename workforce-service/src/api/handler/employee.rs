use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::{responses::ApiResponse, types::Employee};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    api::state::WorkforceAppState,
    domain::employee::{CreateEmployee, UpdateEmployee},
    error::WorkforceServiceError,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEmployeesQuery {
    pub store_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    tag = "Employees",
    operation_id = "list_employees",
    params(ListEmployeesQuery),
    responses(
        (status = 200, description = "List employees, optionally by store", body = ApiResponse<Vec<Employee>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn find_all(
    State(state): State<Arc<WorkforceAppState>>,
    Query(query): Query<ListEmployeesQuery>,
) -> Result<Json<ApiResponse<Vec<Employee>>>, WorkforceServiceError> {
    let output = state.employee_repo.find_all(query.store_id).await?;
    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    tag = "Employees",
    operation_id = "get_employee",
    params(
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = ApiResponse<Employee>),
        (status = 404, description = "Employee not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn find_by_id(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Employee>>, WorkforceServiceError> {
    let output = state.employee_repo.find_by_id(id).await?;

    match output {
        Some(e) => Ok(Json(ApiResponse::ok(e))),
        None => Err(WorkforceServiceError::NotFound(
            "Employee not found".to_string(),
        )),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/employees",
    tag = "Employees",
    operation_id = "create_employee",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created", body = ApiResponse<Employee>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<WorkforceAppState>>,
    Json(employee): Json<CreateEmployee>,
) -> Result<Json<ApiResponse<Employee>>, WorkforceServiceError> {
    if state
        .store_repo
        .find_by_id(employee.store_id)
        .await?
        .is_none()
    {
        return Err(WorkforceServiceError::NotFound("Store not found".to_string()));
    }

    let output = state.employee_repo.create(employee).await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    tag = "Employees",
    operation_id = "update_employee",
    params(
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = ApiResponse<Employee>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn update(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
    Json(employee): Json<UpdateEmployee>,
) -> Result<Json<ApiResponse<Employee>>, WorkforceServiceError> {
    let output = state.employee_repo.update(id, employee).await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/employees/{id}/deactivate",
    tag = "Employees",
    operation_id = "deactivate_employee",
    params(
        ("id" = Uuid, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn deactivate(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, WorkforceServiceError> {
    state.employee_repo.deactivate(id).await?;

    Ok(Json(ApiResponse::ok(())))
}
