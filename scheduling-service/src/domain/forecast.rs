use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{HistoricalOrder, OrderForecast};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SchedulingServiceError;

/// Available forecasting methods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Mean of same day-of-week/hour samples over past weeks.
    SimpleAverage,
    /// Recent weeks weighted more heavily.
    WeightedAverage,
    /// Simple exponential smoothing over the sample series.
    ExponentialSmoothing,
    /// Weighted combination of all methods.
    Ensemble,
}

impl ForecastMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimpleAverage => "simple_average",
            Self::WeightedAverage => "weighted_average",
            Self::ExponentialSmoothing => "exponential_smoothing",
            Self::Ensemble => "ensemble",
        }
    }
}

/// Method tag used when a store has no history at all.
pub const DEFAULT_PATTERN_METHOD: &str = "default_pattern";

/// Forecast for a single hour.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HourlyForecast {
    pub date: NaiveDate,
    pub hour: i16,
    pub predicted_orders: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
    pub method: String,
    pub data_points_used: usize,
}

/// Forecast for an entire day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub hourly_forecasts: Vec<HourlyForecast>,
    pub total_predicted_orders: f64,
    pub peak_hour: i16,
    pub peak_orders: f64,
}

/// Forecast for an entire week.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeeklyForecast {
    pub store_id: Uuid,
    pub week_start: NaiveDate,
    pub daily_forecasts: Vec<DailyForecast>,
    pub total_predicted_orders: f64,
    pub method: String,
    pub generated_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ForecastAccuracy {
    pub store_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data_points: usize,
    pub mape: Option<f64>,
    pub mae: Option<f64>,
    pub bias: Option<f64>,
    pub accuracy_rating: String,
}

/// A forecast row to be persisted, before it has a database-generated ID.
#[derive(Debug, Clone)]
pub struct NewForecastRow {
    pub date: NaiveDate,
    pub hour: i16,
    pub predicted_orders: f64,
}

/// An imported historical order row.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHistoricalOrder {
    pub date: NaiveDate,
    pub hour: i16,
    pub order_count: f64,
    pub day_of_week: Option<i16>,
    #[serde(default)]
    pub is_holiday: bool,
}

/// Persistence operations for historical orders and saved forecasts.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ForecastRepository: Send + Sync {
    async fn historical_since(
        &self,
        store_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<Vec<HistoricalOrder>, SchedulingServiceError>;
    async fn upsert_historical(
        &self,
        store_id: Uuid,
        rows: Vec<NewHistoricalOrder>,
    ) -> Result<u64, SchedulingServiceError>;
    /// Deletes the week's rows and inserts the fresh set in one transaction.
    async fn replace_week(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        rows: Vec<NewForecastRow>,
    ) -> Result<u64, SchedulingServiceError>;
    async fn forecasts_for_date(
        &self,
        store_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<OrderForecast>, SchedulingServiceError>;
    async fn set_actual(
        &self,
        store_id: Uuid,
        date: NaiveDate,
        hour: i16,
        actual_orders: f64,
    ) -> Result<bool, SchedulingServiceError>;
    async fn forecasts_with_actuals(
        &self,
        store_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OrderForecast>, SchedulingServiceError>;
}
