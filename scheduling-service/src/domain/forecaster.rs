use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use shared::types::Store;

use crate::config::SchedulingConfig;
use crate::domain::forecast::{
    DEFAULT_PATTERN_METHOD, DailyForecast, ForecastAccuracy, ForecastMethod, ForecastRepository,
    HourlyForecast, NewForecastRow, NewHistoricalOrder, WeeklyForecast,
};
use crate::domain::workforce::WorkforceClient;
use crate::error::SchedulingServiceError;

/// Weight decay per week of sample age in the weighted average.
const WEIGHT_DECAY: f64 = 0.85;
/// Level smoothing factor for exponential smoothing.
const ALPHA: f64 = 0.3;
/// Hours with fewer samples than this are flagged in weekly warnings.
const MIN_DATA_POINTS: usize = 3;
/// Base daily order volume assumed when a store has no history.
const BASE_DAILY_ORDERS: f64 = 100.0;

/// One historical observation for a (day-of-week, hour) bucket.
type Sample = (NaiveDate, f64);
/// Samples keyed by (day_of_week, hour).
type SampleBuckets = HashMap<(i16, i16), Vec<Sample>>;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// region: Forecasting methods

/// Arithmetic mean with a 95% CI from the sample standard error.
/// Returns (predicted, confidence_low, confidence_high).
fn simple_average(samples: &[Sample]) -> (f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.1).sum::<f64>() / n;

    let margin = if samples.len() > 1 {
        let variance = samples.iter().map(|s| (s.1 - mean).powi(2)).sum::<f64>() / (n - 1.0);
        1.96 * variance.sqrt() / n.sqrt()
    } else {
        mean * 0.3
    };

    (mean, (mean - margin).max(0.0), mean + margin)
}

/// Recency-weighted mean: a sample aged `w` weeks carries weight 0.85^w.
fn weighted_average(samples: &[Sample], reference_date: NaiveDate) -> (f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut sorted: Vec<Sample> = samples.to_vec();
    sorted.sort_by(|a, b| b.0.cmp(&a.0));

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut weighted_values = Vec::with_capacity(sorted.len());

    for (date, value) in &sorted {
        let weeks_ago = (reference_date - *date).num_days() as f64 / 7.0;
        let weight = WEIGHT_DECAY.powf(weeks_ago);
        weighted_sum += value * weight;
        weight_total += weight;
        weighted_values.push((*value, weight));
    }

    if weight_total == 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let mean = weighted_sum / weight_total;

    let margin = if weighted_values.len() > 1 {
        let variance = weighted_values
            .iter()
            .map(|(v, w)| w * (v - mean).powi(2))
            .sum::<f64>()
            / weight_total;
        1.96 * variance.sqrt()
    } else {
        mean * 0.3
    };

    (mean, (mean - margin).max(0.0), mean + margin)
}

/// Simple exponential smoothing over the samples in date order; the CI
/// margin comes from the MAE of the one-step residuals.
fn exponential_smoothing(samples: &[Sample]) -> (f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut sorted: Vec<Sample> = samples.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let values: Vec<f64> = sorted.iter().map(|s| s.1).collect();

    let mut level = values[0];
    for value in &values[1..] {
        level = ALPHA * value + (1.0 - ALPHA) * level;
    }

    let mut errors = Vec::new();
    let mut smooth = values[0];
    for value in &values[1..] {
        errors.push((value - smooth).abs());
        smooth = ALPHA * value + (1.0 - ALPHA) * smooth;
    }

    let margin = if errors.is_empty() {
        level * 0.3
    } else {
        let mae = errors.iter().sum::<f64>() / errors.len() as f64;
        1.96 * mae
    };

    (level, (level - margin).max(0.0), level + margin)
}

/// Convex combination of the three methods with the widest CI of the trio.
fn ensemble(samples: &[Sample], reference_date: NaiveDate) -> (f64, f64, f64) {
    let simple = simple_average(samples);
    let weighted = weighted_average(samples, reference_date);
    let exp_smooth = exponential_smoothing(samples);

    let predicted = 0.25 * simple.0 + 0.45 * weighted.0 + 0.30 * exp_smooth.0;
    let conf_low = simple.1.min(weighted.1).min(exp_smooth.1);
    let conf_high = simple.2.max(weighted.2).max(exp_smooth.2);

    (predicted, conf_low, conf_high)
}

fn rate_accuracy(mape: f64) -> &'static str {
    if mape < 10.0 {
        "excellent"
    } else if mape < 20.0 {
        "good"
    } else if mape < 30.0 {
        "fair"
    } else {
        "poor"
    }
}

// endregion

// region: Default pattern (cold start)

/// Share of a day's orders landing in each operating hour; sums to 1.0
/// across 08:00-22:00 and peaks at noon.
fn default_hour_share(hour: i16) -> f64 {
    match hour {
        8 => 0.04,
        9 => 0.06,
        10 => 0.08,
        11 => 0.10,
        12 => 0.12,
        13 => 0.10,
        14 => 0.08,
        15 => 0.08,
        16 => 0.09,
        17 => 0.10,
        18 => 0.08,
        19 => 0.05,
        20 => 0.02,
        21 => 0.00,
        _ => 0.05,
    }
}

/// Day-of-week multiplier against the base daily volume (Saturday peak).
fn default_day_multiplier(day_of_week: i16) -> f64 {
    match day_of_week {
        0 => 0.9,
        1 => 0.95,
        2 => 1.0,
        3 => 1.0,
        4 => 1.1,
        5 => 1.2,
        6 => 0.85,
        _ => 1.0,
    }
}

fn default_day_forecast(store: &Store, date: NaiveDate) -> DailyForecast {
    let daily_total = BASE_DAILY_ORDERS * default_day_multiplier(shared::time::day_index(date));

    let hourly_forecasts: Vec<HourlyForecast> = (store.open_hour()..store.close_hour())
        .map(|hour| {
            let predicted = daily_total * default_hour_share(hour);
            HourlyForecast {
                date,
                hour,
                predicted_orders: round2(predicted),
                confidence_low: round2(predicted * 0.7),
                confidence_high: round2(predicted * 1.3),
                method: DEFAULT_PATTERN_METHOD.to_string(),
                data_points_used: 0,
            }
        })
        .collect();

    summarize_day(date, hourly_forecasts)
}

// endregion

fn summarize_day(date: NaiveDate, hourly_forecasts: Vec<HourlyForecast>) -> DailyForecast {
    let total: f64 = hourly_forecasts.iter().map(|h| h.predicted_orders).sum();
    let peak = hourly_forecasts.iter().max_by(|a, b| {
        a.predicted_orders
            .partial_cmp(&b.predicted_orders)
            .unwrap_or(Ordering::Equal)
    });

    DailyForecast {
        date,
        total_predicted_orders: round2(total),
        peak_hour: peak.map_or(12, |h| h.hour),
        peak_orders: peak.map_or(0.0, |h| h.predicted_orders),
        hourly_forecasts,
    }
}

/// Generates demand forecasts from historical order data.
pub struct ForecastService {
    workforce: Arc<dyn WorkforceClient>,
    repo: Arc<dyn ForecastRepository>,
    lookback_weeks: u32,
    timezone: Tz,
}

impl ForecastService {
    pub fn new(
        workforce: Arc<dyn WorkforceClient>,
        repo: Arc<dyn ForecastRepository>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            workforce,
            repo,
            lookback_weeks: config.lookback_weeks,
            timezone: config.timezone(),
        }
    }

    /// Fetches the lookback window and buckets rows by (day_of_week, hour).
    async fn history_buckets(&self, store_id: Uuid) -> Result<SampleBuckets, SchedulingServiceError> {
        let cutoff = shared::time::today_in(self.timezone)
            - Duration::weeks(i64::from(self.lookback_weeks));
        let rows = self.repo.historical_since(store_id, cutoff).await?;

        let mut buckets: SampleBuckets = HashMap::new();
        for row in rows {
            let day_of_week = row
                .day_of_week
                .unwrap_or_else(|| shared::time::day_index(row.date));
            buckets
                .entry((day_of_week, row.hour))
                .or_default()
                .push((row.date, row.order_count));
        }

        Ok(buckets)
    }

    fn forecast_hour_from(
        buckets: &SampleBuckets,
        date: NaiveDate,
        hour: i16,
        method: ForecastMethod,
    ) -> HourlyForecast {
        let key = (shared::time::day_index(date), hour);
        let empty = Vec::new();
        let samples = buckets.get(&key).unwrap_or(&empty);

        let (predicted, conf_low, conf_high) = match method {
            ForecastMethod::SimpleAverage => simple_average(samples),
            ForecastMethod::WeightedAverage => weighted_average(samples, date),
            ForecastMethod::ExponentialSmoothing => exponential_smoothing(samples),
            ForecastMethod::Ensemble => ensemble(samples, date),
        };

        HourlyForecast {
            date,
            hour,
            predicted_orders: round2(predicted),
            confidence_low: round2(conf_low),
            confidence_high: round2(conf_high),
            method: method.as_str().to_string(),
            data_points_used: samples.len(),
        }
    }

    fn day_from_buckets(
        store: &Store,
        buckets: &SampleBuckets,
        date: NaiveDate,
        method: ForecastMethod,
    ) -> DailyForecast {
        let hourly: Vec<HourlyForecast> = (store.open_hour()..store.close_hour())
            .map(|hour| Self::forecast_hour_from(buckets, date, hour, method))
            .collect();

        summarize_day(date, hourly)
    }

    #[tracing::instrument(skip(self))]
    pub async fn forecast_day(
        &self,
        store_id: Uuid,
        target_date: NaiveDate,
        method: ForecastMethod,
    ) -> Result<DailyForecast, SchedulingServiceError> {
        let store = self.workforce.get_store(store_id).await?;
        let buckets = self.history_buckets(store_id).await?;

        if buckets.is_empty() {
            return Ok(default_day_forecast(&store, target_date));
        }

        Ok(Self::day_from_buckets(&store, &buckets, target_date, method))
    }

    #[tracing::instrument(skip(self))]
    pub async fn forecast_week(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        method: ForecastMethod,
    ) -> Result<WeeklyForecast, SchedulingServiceError> {
        if !shared::time::is_monday(week_start) {
            return Err(SchedulingServiceError::BadRequest(
                "week_start must be a Monday".into(),
            ));
        }

        let store = self.workforce.get_store(store_id).await?;
        let buckets = self.history_buckets(store_id).await?;

        if buckets.is_empty() {
            let daily_forecasts: Vec<DailyForecast> = shared::time::week_dates(week_start)
                .into_iter()
                .map(|date| default_day_forecast(&store, date))
                .collect();
            let total: f64 = daily_forecasts
                .iter()
                .map(|d| d.total_predicted_orders)
                .sum();

            return Ok(WeeklyForecast {
                store_id,
                week_start,
                daily_forecasts,
                total_predicted_orders: round2(total),
                method: DEFAULT_PATTERN_METHOD.to_string(),
                generated_at: Utc::now(),
                warnings: vec!["Using default pattern - no historical data available".to_string()],
            });
        }

        let mut daily_forecasts = Vec::with_capacity(7);
        let mut warnings = Vec::new();

        for date in shared::time::week_dates(week_start) {
            let day = Self::day_from_buckets(&store, &buckets, date, method);

            let low_data_hours = day
                .hourly_forecasts
                .iter()
                .filter(|h| h.data_points_used < MIN_DATA_POINTS)
                .count();
            if low_data_hours > 0 {
                warnings.push(format!(
                    "{}: {low_data_hours} hours with limited data",
                    date.format("%A")
                ));
            }

            daily_forecasts.push(day);
        }

        let total: f64 = daily_forecasts
            .iter()
            .map(|d| d.total_predicted_orders)
            .sum();

        Ok(WeeklyForecast {
            store_id,
            week_start,
            daily_forecasts,
            total_predicted_orders: round2(total),
            method: method.as_str().to_string(),
            generated_at: Utc::now(),
            warnings,
        })
    }

    /// Generates and persists a weekly forecast, replacing any rows already
    /// stored for that store and week. Returns the number of rows written.
    #[tracing::instrument(skip(self))]
    pub async fn save_forecast(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        method: ForecastMethod,
    ) -> Result<u64, SchedulingServiceError> {
        let weekly = self.forecast_week(store_id, week_start, method).await?;

        let rows: Vec<NewForecastRow> = weekly
            .daily_forecasts
            .iter()
            .flat_map(|day| {
                day.hourly_forecasts.iter().map(|h| NewForecastRow {
                    date: h.date,
                    hour: h.hour,
                    predicted_orders: h.predicted_orders,
                })
            })
            .collect();

        let count = self.repo.replace_week(store_id, week_start, rows).await?;
        tracing::info!(%store_id, %week_start, count, "Saved forecast rows");

        Ok(count)
    }

    /// Records the observed order count against a saved forecast row.
    /// Returns false when no forecast row exists for that slot.
    #[tracing::instrument(skip(self))]
    pub async fn update_actuals(
        &self,
        store_id: Uuid,
        target_date: NaiveDate,
        hour: i16,
        actual_orders: f64,
    ) -> Result<bool, SchedulingServiceError> {
        if !(0..24).contains(&hour) {
            return Err(SchedulingServiceError::BadRequest(format!(
                "hour must be 0..=23, got {hour}"
            )));
        }
        if actual_orders < 0.0 {
            return Err(SchedulingServiceError::BadRequest(
                "actual_orders must be non-negative".into(),
            ));
        }

        self.repo
            .set_actual(store_id, target_date, hour, actual_orders)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn accuracy(
        &self,
        store_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ForecastAccuracy, SchedulingServiceError> {
        let rows = self
            .repo
            .forecasts_with_actuals(store_id, start, end)
            .await?;

        if rows.is_empty() {
            return Ok(ForecastAccuracy {
                store_id,
                period_start: start,
                period_end: end,
                data_points: 0,
                mape: None,
                mae: None,
                bias: None,
                accuracy_rating: "insufficient_data".to_string(),
            });
        }

        let mut errors = Vec::with_capacity(rows.len());
        let mut absolute_errors = Vec::with_capacity(rows.len());
        let mut percentage_errors = Vec::new();

        for row in &rows {
            let Some(actual) = row.actual_orders else {
                continue;
            };
            let error = actual - row.predicted_orders;
            errors.push(error);
            absolute_errors.push(error.abs());
            if actual > 0.0 {
                percentage_errors.push(error.abs() / actual * 100.0);
            }
        }

        if absolute_errors.is_empty() {
            return Ok(ForecastAccuracy {
                store_id,
                period_start: start,
                period_end: end,
                data_points: 0,
                mape: None,
                mae: None,
                bias: None,
                accuracy_rating: "insufficient_data".to_string(),
            });
        }

        let mae = absolute_errors.iter().sum::<f64>() / absolute_errors.len() as f64;
        let bias = errors.iter().sum::<f64>() / errors.len() as f64;
        let mape = if percentage_errors.is_empty() {
            None
        } else {
            Some(percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64)
        };

        Ok(ForecastAccuracy {
            store_id,
            period_start: start,
            period_end: end,
            data_points: rows.len(),
            mape: mape.map(round2),
            mae: Some(round2(mae)),
            bias: Some(round2(bias)),
            accuracy_rating: mape
                .map_or("insufficient_data", rate_accuracy)
                .to_string(),
        })
    }

    /// Bulk-imports historical order rows, deriving day_of_week when absent.
    #[tracing::instrument(skip(self, rows))]
    pub async fn import_history(
        &self,
        store_id: Uuid,
        rows: Vec<NewHistoricalOrder>,
    ) -> Result<u64, SchedulingServiceError> {
        let mut prepared = Vec::with_capacity(rows.len());
        for mut row in rows {
            if !(0..24).contains(&row.hour) {
                return Err(SchedulingServiceError::BadRequest(format!(
                    "hour must be 0..=23, got {}",
                    row.hour
                )));
            }
            if row.order_count < 0.0 {
                return Err(SchedulingServiceError::BadRequest(
                    "order_count must be non-negative".into(),
                ));
            }
            if row.day_of_week.is_none() {
                row.day_of_week = Some(shared::time::day_index(row.date));
            }
            prepared.push(row);
        }

        self.repo.upsert_historical(store_id, prepared).await
    }
}
