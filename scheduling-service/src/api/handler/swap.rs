use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::state::SchedulingAppState, domain::swap::CreateSwap, error::SchedulingServiceError,
};
use shared::{responses::ApiResponse, types::ShiftSwap};

#[utoipa::path(
    post,
    path = "/api/v1/swaps",
    tag = "Swaps",
    operation_id = "create_swap",
    request_body = CreateSwap,
    responses(
        (status = 200, description = "Swap request created", body = ApiResponse<ShiftSwap>),
        (status = 409, description = "An open swap already exists for this shift")
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn create(
    State(state): State<Arc<SchedulingAppState>>,
    Json(request): Json<CreateSwap>,
) -> Result<Json<ApiResponse<ShiftSwap>>, SchedulingServiceError> {
    let swap = state.swaps.create(request).await?;

    Ok(Json(ApiResponse::ok(swap)))
}

#[utoipa::path(
    get,
    path = "/api/v1/swaps/{id}",
    tag = "Swaps",
    operation_id = "get_swap",
    params(
        ("id" = Uuid, Path, description = "Swap ID")
    ),
    responses(
        (status = 200, description = "Swap request", body = ApiResponse<ShiftSwap>),
        (status = 404, description = "Swap not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShiftSwap>>, SchedulingServiceError> {
    let swap = state.swaps.get(id).await?;

    Ok(Json(ApiResponse::ok(swap)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptSwapRequest {
    pub accepting_shift_id: Uuid,
    pub accepting_employee_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/accept",
    tag = "Swaps",
    params(
        ("id" = Uuid, Path, description = "Swap ID")
    ),
    request_body = AcceptSwapRequest,
    responses(
        (status = 200, description = "Swap accepted, awaiting manager approval", body = ApiResponse<ShiftSwap>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn accept(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AcceptSwapRequest>,
) -> Result<Json<ApiResponse<ShiftSwap>>, SchedulingServiceError> {
    let swap = state
        .swaps
        .accept(id, request.accepting_shift_id, request.accepting_employee_id)
        .await?;

    Ok(Json(ApiResponse::ok(swap)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideSwapRequest {
    pub decided_by: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/approve",
    tag = "Swaps",
    params(
        ("id" = Uuid, Path, description = "Swap ID")
    ),
    request_body = DecideSwapRequest,
    responses(
        (status = 200, description = "Swap approved; shifts exchanged", body = ApiResponse<ShiftSwap>),
        (status = 409, description = "Swap is not in accepted status")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn approve(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecideSwapRequest>,
) -> Result<Json<ApiResponse<ShiftSwap>>, SchedulingServiceError> {
    let swap = state.swaps.approve(id, request.decided_by).await?;

    Ok(Json(ApiResponse::ok(swap)))
}

#[utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/deny",
    tag = "Swaps",
    params(
        ("id" = Uuid, Path, description = "Swap ID")
    ),
    request_body = DecideSwapRequest,
    responses(
        (status = 200, description = "Swap denied", body = ApiResponse<ShiftSwap>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn deny(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecideSwapRequest>,
) -> Result<Json<ApiResponse<ShiftSwap>>, SchedulingServiceError> {
    let swap = state.swaps.deny(id, request.decided_by).await?;

    Ok(Json(ApiResponse::ok(swap)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelSwapRequest {
    pub requester_employee_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/cancel",
    tag = "Swaps",
    params(
        ("id" = Uuid, Path, description = "Swap ID")
    ),
    request_body = CancelSwapRequest,
    responses(
        (status = 200, description = "Swap cancelled", body = ApiResponse<ShiftSwap>),
        (status = 409, description = "Only the requester can cancel")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<SchedulingAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelSwapRequest>,
) -> Result<Json<ApiResponse<ShiftSwap>>, SchedulingServiceError> {
    let swap = state.swaps.cancel(id, request.requester_employee_id).await?;

    Ok(Json(ApiResponse::ok(swap)))
}
