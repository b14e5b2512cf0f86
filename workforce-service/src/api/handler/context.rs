use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{responses::ApiResponse, types::SchedulingContext};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{api::state::WorkforceAppState, error::WorkforceServiceError};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ContextQuery {
    /// Monday of the target week.
    pub week_start: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{id}/scheduling-context",
    tag = "Stores",
    operation_id = "get_scheduling_context",
    params(
        ("id" = Uuid, Path, description = "Store ID"),
        ContextQuery
    ),
    responses(
        (status = 200, description = "Resolved workforce view for the week", body = ApiResponse<SchedulingContext>),
        (status = 400, description = "week_start is not a Monday"),
        (status = 404, description = "Store not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn scheduling_context(
    State(state): State<Arc<WorkforceAppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<ApiResponse<SchedulingContext>>, WorkforceServiceError> {
    let output = state
        .context
        .scheduling_context(id, query.week_start)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}
