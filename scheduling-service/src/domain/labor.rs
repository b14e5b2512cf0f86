use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use shared::types::LaborStandard;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::domain::forecast::{ForecastMethod, ForecastRepository};
use crate::domain::forecaster::ForecastService;
use crate::domain::workforce::WorkforceClient;
use crate::error::SchedulingServiceError;

/// Picker-hours required per hour-of-day, keyed by hour.
pub type HourlyRequirements = BTreeMap<i16, f64>;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeakHourSlot {
    pub date: NaiveDate,
    pub hour: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeeklyLaborSummary {
    pub store_id: Uuid,
    pub week_start: NaiveDate,
    pub total_required_hours: f64,
    pub avg_daily_hours: f64,
    pub peak_day: Option<NaiveDate>,
    pub peak_hour: Option<PeakHourSlot>,
    pub peak_hour_requirement: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeakHourRequirement {
    pub hour: i16,
    pub required_hours: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffingEstimate {
    pub store_id: Uuid,
    pub date: NaiveDate,
    pub total_required_hours: f64,
    pub orders_per_picker_hour: f64,
    pub recommended_8hr_shifts: u32,
    pub recommended_9hr_shifts: u32,
    pub peak_hours: Vec<PeakHourRequirement>,
    pub hourly_breakdown: HourlyRequirements,
}

/// Per-store productivity standards.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait LaborStandardsRepository: Send + Sync {
    async fn find_by_store(
        &self,
        store_id: Uuid,
    ) -> Result<Option<LaborStandard>, SchedulingServiceError>;
    async fn create(
        &self,
        store_id: Uuid,
        orders_per_picker_hour: f64,
        min_shift_hours: i32,
        max_shift_hours: i32,
    ) -> Result<LaborStandard, SchedulingServiceError>;
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn pickers_needed(required_hours: f64, shift_length: f64) -> u32 {
    if required_hours <= 0.0 {
        return 0;
    }
    (required_hours / shift_length).ceil() as u32
}

/// Converts predicted order volume into required picker-hours using the
/// store's productivity standard.
pub struct LaborPlanner {
    workforce: Arc<dyn WorkforceClient>,
    standards: Arc<dyn LaborStandardsRepository>,
    forecast_repo: Arc<dyn ForecastRepository>,
    forecaster: Arc<ForecastService>,
    default_orders_per_picker_hour: f64,
    default_min_shift_hours: i32,
    default_max_shift_hours: i32,
}

impl LaborPlanner {
    pub fn new(
        workforce: Arc<dyn WorkforceClient>,
        standards: Arc<dyn LaborStandardsRepository>,
        forecast_repo: Arc<dyn ForecastRepository>,
        forecaster: Arc<ForecastService>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            workforce,
            standards,
            forecast_repo,
            forecaster,
            default_orders_per_picker_hour: config.default_orders_per_picker_hour,
            default_min_shift_hours: config.default_min_shift_hours,
            default_max_shift_hours: config.default_max_shift_hours,
        }
    }

    /// The store's labor standard, created with configured defaults on first
    /// use.
    pub async fn standard_for(
        &self,
        store_id: Uuid,
    ) -> Result<LaborStandard, SchedulingServiceError> {
        if let Some(standard) = self.standards.find_by_store(store_id).await? {
            return Ok(standard);
        }

        self.standards
            .create(
                store_id,
                self.default_orders_per_picker_hour,
                self.default_min_shift_hours,
                self.default_max_shift_hours,
            )
            .await
    }

    /// Required picker-hours per operating hour of a day. Falls back to an
    /// on-the-fly ensemble forecast when no rows are persisted for the day.
    #[tracing::instrument(skip(self))]
    pub async fn hourly_requirements(
        &self,
        store_id: Uuid,
        target_date: NaiveDate,
    ) -> Result<HourlyRequirements, SchedulingServiceError> {
        let store = self.workforce.get_store(store_id).await?;
        let standard = self.standard_for(store_id).await?;

        let mut predicted_by_hour: BTreeMap<i16, f64> = self
            .forecast_repo
            .forecasts_for_date(store_id, target_date)
            .await?
            .into_iter()
            .map(|f| (f.hour, f.predicted_orders))
            .collect();

        if predicted_by_hour.is_empty() {
            let day = self
                .forecaster
                .forecast_day(store_id, target_date, ForecastMethod::Ensemble)
                .await?;
            predicted_by_hour = day
                .hourly_forecasts
                .into_iter()
                .map(|h| (h.hour, h.predicted_orders))
                .collect();
        }

        let mut requirements = HourlyRequirements::new();
        for hour in store.open_hour()..store.close_hour() {
            let predicted = predicted_by_hour.get(&hour).copied().unwrap_or(0.0);
            requirements.insert(
                hour,
                round2(predicted / standard.orders_per_picker_hour),
            );
        }

        Ok(requirements)
    }

    pub async fn daily_requirement(
        &self,
        store_id: Uuid,
        target_date: NaiveDate,
    ) -> Result<f64, SchedulingServiceError> {
        let hourly = self.hourly_requirements(store_id, target_date).await?;
        Ok(hourly.values().sum())
    }

    #[tracing::instrument(skip(self))]
    pub async fn weekly_summary(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<WeeklyLaborSummary, SchedulingServiceError> {
        if !shared::time::is_monday(week_start) {
            return Err(SchedulingServiceError::BadRequest(
                "week_start must be a Monday".into(),
            ));
        }

        let mut total_hours = 0.0;
        let mut peak_hour_value = 0.0;
        let mut peak_hour = None;
        let mut peak_day: Option<(NaiveDate, f64)> = None;

        for date in shared::time::week_dates(week_start) {
            let hourly = self.hourly_requirements(store_id, date).await?;
            let day_total: f64 = hourly.values().sum();
            total_hours += day_total;

            for (hour, hours_needed) in &hourly {
                if *hours_needed > peak_hour_value {
                    peak_hour_value = *hours_needed;
                    peak_hour = Some(PeakHourSlot { date, hour: *hour });
                }
            }

            if peak_day.is_none_or(|(_, best)| day_total > best) {
                peak_day = Some((date, day_total));
            }
        }

        Ok(WeeklyLaborSummary {
            store_id,
            week_start,
            total_required_hours: round2(total_hours),
            avg_daily_hours: round2(total_hours / 7.0),
            peak_day: peak_day.map(|(date, _)| date),
            peak_hour,
            peak_hour_requirement: round2(peak_hour_value),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn estimate_staffing_for_day(
        &self,
        store_id: Uuid,
        target_date: NaiveDate,
    ) -> Result<StaffingEstimate, SchedulingServiceError> {
        let standard = self.standard_for(store_id).await?;
        let hourly = self.hourly_requirements(store_id, target_date).await?;
        let total_hours: f64 = hourly.values().sum();

        let mut sorted: Vec<(i16, f64)> = hourly.iter().map(|(h, r)| (*h, *r)).collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(StaffingEstimate {
            store_id,
            date: target_date,
            total_required_hours: round2(total_hours),
            orders_per_picker_hour: standard.orders_per_picker_hour,
            recommended_8hr_shifts: pickers_needed(total_hours, 8.0),
            recommended_9hr_shifts: pickers_needed(total_hours, 9.0),
            peak_hours: sorted
                .into_iter()
                .take(3)
                .map(|(hour, required)| PeakHourRequirement {
                    hour,
                    required_hours: round2(required),
                })
                .collect(),
            hourly_breakdown: hourly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::MockForecastRepository;
    use crate::domain::workforce::MockWorkforceClient;
    use chrono::{NaiveTime, Utc};
    use shared::types::{OrderForecast, Store};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_store(id: Uuid) -> Store {
        Store {
            id,
            name: "Downtown".into(),
            code: "DT-01".into(),
            address: None,
            operating_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            operating_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_standard(store_id: Uuid, rate: f64) -> LaborStandard {
        LaborStandard {
            id: Uuid::new_v4(),
            store_id,
            orders_per_picker_hour: rate,
            min_shift_hours: 4,
            max_shift_hours: 8,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn forecast_row(store_id: Uuid, d: NaiveDate, hour: i16, predicted: f64) -> OrderForecast {
        OrderForecast {
            id: Uuid::new_v4(),
            store_id,
            date: d,
            hour,
            predicted_orders: predicted,
            actual_orders: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn planner(
        workforce: MockWorkforceClient,
        standards: MockLaborStandardsRepository,
        forecast_repo: MockForecastRepository,
    ) -> LaborPlanner {
        let config = SchedulingConfig::default();
        // The embedded forecaster is only reached when no forecast rows
        // exist; give it an always-empty history so it stays deterministic.
        let mut forecaster_repo = MockForecastRepository::new();
        forecaster_repo
            .expect_historical_since()
            .returning(|_, _| Ok(vec![]));
        let mut forecaster_client = MockWorkforceClient::new();
        let store = make_store(Uuid::new_v4());
        forecaster_client
            .expect_get_store()
            .returning(move |_| Ok(store.clone()));
        let forecaster = Arc::new(ForecastService::new(
            Arc::new(forecaster_client),
            Arc::new(forecaster_repo),
            &config,
        ));

        LaborPlanner::new(
            Arc::new(workforce),
            Arc::new(standards),
            Arc::new(forecast_repo),
            forecaster,
            &config,
        )
    }

    #[test]
    fn pickers_needed_rounds_up() {
        assert_eq!(pickers_needed(0.0, 8.0), 0);
        assert_eq!(pickers_needed(15.9, 8.0), 2);
        assert_eq!(pickers_needed(16.0, 8.0), 2);
        assert_eq!(pickers_needed(16.1, 8.0), 3);
        assert_eq!(pickers_needed(16.1, 9.0), 2);
    }

    #[tokio::test]
    async fn hourly_requirements_divide_by_productivity() {
        let store_id = Uuid::new_v4();
        let target = date(2025, 1, 8);

        let mut workforce = MockWorkforceClient::new();
        let store = make_store(store_id);
        workforce
            .expect_get_store()
            .returning(move |_| Ok(store.clone()));

        let mut standards = MockLaborStandardsRepository::new();
        standards
            .expect_find_by_store()
            .returning(move |id| Ok(Some(make_standard(id, 10.0))));

        let mut forecast_repo = MockForecastRepository::new();
        forecast_repo
            .expect_forecasts_for_date()
            .returning(move |sid, d| {
                Ok(vec![
                    forecast_row(sid, d, 10, 25.0),
                    forecast_row(sid, d, 11, 33.3),
                ])
            });

        let planner = planner(workforce, standards, forecast_repo);
        let hourly = planner.hourly_requirements(store_id, target).await.unwrap();

        assert_eq!(hourly.len(), 14, "every operating hour has an entry");
        assert_eq!(hourly[&10], 2.5);
        assert_eq!(hourly[&11], 3.33);
        assert_eq!(hourly[&12], 0.0);
    }

    #[tokio::test]
    async fn missing_store_is_not_found() {
        let mut workforce = MockWorkforceClient::new();
        workforce
            .expect_get_store()
            .returning(|id| Err(SchedulingServiceError::NotFound(format!("Store {id} not found"))));

        let planner = planner(
            workforce,
            MockLaborStandardsRepository::new(),
            MockForecastRepository::new(),
        );
        let output = planner
            .hourly_requirements(Uuid::new_v4(), date(2025, 1, 8))
            .await;

        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn unconfigured_store_gets_default_standard() {
        let store_id = Uuid::new_v4();

        let mut standards = MockLaborStandardsRepository::new();
        standards.expect_find_by_store().returning(|_| Ok(None));
        standards
            .expect_create()
            .withf(|_, rate, min, max| *rate == 10.0 && *min == 4 && *max == 8)
            .returning(|sid, rate, _, _| Ok(make_standard(sid, rate)));

        let planner = planner(
            MockWorkforceClient::new(),
            standards,
            MockForecastRepository::new(),
        );
        let standard = planner.standard_for(store_id).await.unwrap();

        assert_eq!(standard.orders_per_picker_hour, 10.0);
    }

    #[tokio::test]
    async fn staffing_estimate_reports_peaks_and_shift_counts() {
        let store_id = Uuid::new_v4();
        let target = date(2025, 1, 8);

        let mut workforce = MockWorkforceClient::new();
        let store = make_store(store_id);
        workforce
            .expect_get_store()
            .returning(move |_| Ok(store.clone()));

        let mut standards = MockLaborStandardsRepository::new();
        standards
            .expect_find_by_store()
            .returning(move |id| Ok(Some(make_standard(id, 10.0))));

        let mut forecast_repo = MockForecastRepository::new();
        forecast_repo
            .expect_forecasts_for_date()
            .returning(move |sid, d| {
                Ok(vec![
                    forecast_row(sid, d, 10, 100.0),
                    forecast_row(sid, d, 12, 180.0),
                    forecast_row(sid, d, 17, 140.0),
                ])
            });

        let planner = planner(workforce, standards, forecast_repo);
        let estimate = planner
            .estimate_staffing_for_day(store_id, target)
            .await
            .unwrap();

        assert_eq!(estimate.total_required_hours, 42.0);
        assert_eq!(estimate.recommended_8hr_shifts, 6);
        assert_eq!(estimate.recommended_9hr_shifts, 5);
        assert_eq!(estimate.peak_hours.len(), 3);
        assert_eq!(estimate.peak_hours[0].hour, 12);
        assert_eq!(estimate.peak_hours[1].hour, 17);
        assert_eq!(estimate.peak_hours[2].hour, 10);
    }
}
