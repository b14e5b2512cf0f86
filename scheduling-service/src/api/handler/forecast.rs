use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    api::state::SchedulingAppState,
    domain::forecast::{
        DailyForecast, ForecastAccuracy, ForecastMethod, NewHistoricalOrder, WeeklyForecast,
    },
    error::SchedulingServiceError,
};
use shared::responses::ApiResponse;

fn default_method() -> ForecastMethod {
    ForecastMethod::Ensemble
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateForecastRequest {
    pub store_id: Uuid,
    /// Monday of the week to forecast.
    pub week_start: NaiveDate,
    #[serde(default = "default_method")]
    pub method: ForecastMethod,
    #[serde(default = "default_true")]
    pub save_to_db: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/forecasts/generate",
    tag = "Forecasts",
    operation_id = "generate_forecast",
    request_body = GenerateForecastRequest,
    responses(
        (status = 200, description = "Weekly forecast generated", body = ApiResponse<WeeklyForecast>),
        (status = 400, description = "week_start is not a Monday"),
        (status = 404, description = "Store not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn generate(
    State(state): State<Arc<SchedulingAppState>>,
    Json(request): Json<GenerateForecastRequest>,
) -> Result<Json<ApiResponse<WeeklyForecast>>, SchedulingServiceError> {
    let weekly = state
        .forecasts
        .forecast_week(request.store_id, request.week_start, request.method)
        .await?;

    if request.save_to_db {
        state
            .forecasts
            .save_forecast(request.store_id, request.week_start, request.method)
            .await?;
    }

    Ok(Json(ApiResponse::ok(weekly)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayForecastQuery {
    pub store_id: Uuid,
    pub date: NaiveDate,
    #[serde(default = "default_method")]
    pub method: ForecastMethod,
}

#[utoipa::path(
    get,
    path = "/api/v1/forecasts/day",
    tag = "Forecasts",
    operation_id = "day_forecast",
    params(DayForecastQuery),
    responses(
        (status = 200, description = "Daily forecast", body = ApiResponse<DailyForecast>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn day(
    State(state): State<Arc<SchedulingAppState>>,
    Query(query): Query<DayForecastQuery>,
) -> Result<Json<ApiResponse<DailyForecast>>, SchedulingServiceError> {
    let output = state
        .forecasts
        .forecast_day(query.store_id, query.date, query.method)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportHistoricalRequest {
    pub store_id: Uuid,
    pub data: Vec<NewHistoricalOrder>,
}

#[utoipa::path(
    post,
    path = "/api/v1/forecasts/historical",
    tag = "Forecasts",
    request_body = ImportHistoricalRequest,
    responses(
        (status = 200, description = "Rows imported", body = ApiResponse<u64>),
        (status = 400, description = "Invalid hour or negative order count")
    )
)]
#[tracing::instrument(skip(state, request), fields(store_id = %request.store_id, rows = request.data.len()))]
pub async fn import_historical(
    State(state): State<Arc<SchedulingAppState>>,
    Json(request): Json<ImportHistoricalRequest>,
) -> Result<Json<ApiResponse<u64>>, SchedulingServiceError> {
    let count = state
        .forecasts
        .import_history(request.store_id, request.data)
        .await?;

    Ok(Json(ApiResponse::ok(count)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateActualsRequest {
    pub store_id: Uuid,
    pub date: NaiveDate,
    pub hour: i16,
    pub actual_orders: f64,
}

#[utoipa::path(
    patch,
    path = "/api/v1/forecasts/actuals",
    tag = "Forecasts",
    request_body = UpdateActualsRequest,
    responses(
        (status = 200, description = "Whether a forecast row was updated", body = ApiResponse<bool>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn update_actuals(
    State(state): State<Arc<SchedulingAppState>>,
    Json(request): Json<UpdateActualsRequest>,
) -> Result<Json<ApiResponse<bool>>, SchedulingServiceError> {
    let updated = state
        .forecasts
        .update_actuals(
            request.store_id,
            request.date,
            request.hour,
            request.actual_orders,
        )
        .await?;

    Ok(Json(ApiResponse::ok(updated)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AccuracyQuery {
    pub store_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/forecasts/accuracy",
    tag = "Forecasts",
    params(AccuracyQuery),
    responses(
        (status = 200, description = "Forecast accuracy metrics", body = ApiResponse<ForecastAccuracy>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn accuracy(
    State(state): State<Arc<SchedulingAppState>>,
    Query(query): Query<AccuracyQuery>,
) -> Result<Json<ApiResponse<ForecastAccuracy>>, SchedulingServiceError> {
    let output = state
        .forecasts
        .accuracy(query.store_id, query.start, query.end)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}
