use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use shared::{responses::ApiResponse, types::Store};
use uuid::Uuid;

use crate::{
    api::state::WorkforceAppState,
    domain::store::{CreateStore, UpdateStore},
    error::WorkforceServiceError,
};

#[utoipa::path(
    get,
    path = "/api/v1/stores",
    tag = "Stores",
    operation_id = "list_stores",
    responses(
        (status = 200, description = "List all stores", body = ApiResponse<Vec<Store>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn find_all(
    State(state): State<Arc<WorkforceAppState>>,
) -> Result<Json<ApiResponse<Vec<Store>>>, WorkforceServiceError> {
    let output = state.store_repo.find_all().await?;
    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{id}",
    tag = "Stores",
    operation_id = "get_store",
    params(
        ("id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Store found", body = ApiResponse<Store>),
        (status = 404, description = "Store not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn find_by_id(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Store>>, WorkforceServiceError> {
    let output = state.store_repo.find_by_id(id).await?;

    match output {
        Some(s) => Ok(Json(ApiResponse::ok(s))),
        None => Err(WorkforceServiceError::NotFound("Store not found".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/stores",
    tag = "Stores",
    operation_id = "create_store",
    request_body = CreateStore,
    responses(
        (status = 200, description = "Store created", body = ApiResponse<Store>),
        (status = 409, description = "Store code already exists")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<WorkforceAppState>>,
    Json(store): Json<CreateStore>,
) -> Result<Json<ApiResponse<Store>>, WorkforceServiceError> {
    let output = state.store_repo.create(store).await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    put,
    path = "/api/v1/stores/{id}",
    tag = "Stores",
    operation_id = "update_store",
    params(
        ("id" = Uuid, Path, description = "Store ID")
    ),
    request_body = UpdateStore,
    responses(
        (status = 200, description = "Store updated", body = ApiResponse<Store>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn update(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
    Json(store): Json<UpdateStore>,
) -> Result<Json<ApiResponse<Store>>, WorkforceServiceError> {
    let output = state.store_repo.update(id, store).await?;

    Ok(Json(ApiResponse::ok(output)))
}
