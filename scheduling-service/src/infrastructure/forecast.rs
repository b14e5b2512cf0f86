use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{HistoricalOrder, OrderForecast};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::forecast::{ForecastRepository, NewForecastRow, NewHistoricalOrder},
    error::SchedulingServiceError,
};

const HISTORICAL_COLUMNS: &str =
    "id, store_id, date, hour, order_count, day_of_week, is_holiday, created_at";
const FORECAST_COLUMNS: &str =
    "id, store_id, date, hour, predicted_orders, actual_orders, created_at, updated_at";

pub struct PgForecastRepository {
    pool: PgPool,
}

impl PgForecastRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForecastRepository for PgForecastRepository {
    #[tracing::instrument(skip(self))]
    async fn historical_since(
        &self,
        store_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<Vec<HistoricalOrder>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, HistoricalOrder>(&format!(
            r#"
            SELECT {HISTORICAL_COLUMNS} FROM historical_orders
            WHERE store_id = $1 AND date >= $2
            ORDER BY date
            "#
        ))
        .bind(store_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self, rows))]
    async fn upsert_historical(
        &self,
        store_id: Uuid,
        rows: Vec<NewHistoricalOrder>,
    ) -> Result<u64, SchedulingServiceError> {
        let mut tx = self.pool.begin().await?;
        let mut count = 0u64;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO historical_orders (store_id, date, hour, order_count, day_of_week, is_holiday)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (store_id, date, hour)
                DO UPDATE SET order_count = EXCLUDED.order_count,
                              day_of_week = EXCLUDED.day_of_week,
                              is_holiday = EXCLUDED.is_holiday
                "#,
            )
            .bind(store_id)
            .bind(row.date)
            .bind(row.hour)
            .bind(row.order_count)
            .bind(row.day_of_week)
            .bind(row.is_holiday)
            .execute(&mut *tx)
            .await?;
            count += 1;
        }

        tx.commit().await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self, rows))]
    async fn replace_week(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        rows: Vec<NewForecastRow>,
    ) -> Result<u64, SchedulingServiceError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM order_forecasts WHERE store_id = $1 AND date >= $2 AND date <= $3",
        )
        .bind(store_id)
        .bind(week_start)
        .bind(shared::time::week_end(week_start))
        .execute(&mut *tx)
        .await?;

        let store_ids: Vec<Uuid> = vec![store_id; rows.len()];
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        let hours: Vec<i16> = rows.iter().map(|r| r.hour).collect();
        let predictions: Vec<f64> = rows.iter().map(|r| r.predicted_orders).collect();

        let inserted = sqlx::query(
            r#"
            INSERT INTO order_forecasts (store_id, date, hour, predicted_orders)
            SELECT * FROM UNNEST($1::uuid[], $2::date[], $3::int2[], $4::float8[])
            "#,
        )
        .bind(&store_ids)
        .bind(&dates)
        .bind(&hours)
        .bind(&predictions)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(inserted.rows_affected())
    }

    #[tracing::instrument(skip(self))]
    async fn forecasts_for_date(
        &self,
        store_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<OrderForecast>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, OrderForecast>(&format!(
            r#"
            SELECT {FORECAST_COLUMNS} FROM order_forecasts
            WHERE store_id = $1 AND date = $2
            ORDER BY hour
            "#
        ))
        .bind(store_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn set_actual(
        &self,
        store_id: Uuid,
        date: NaiveDate,
        hour: i16,
        actual_orders: f64,
    ) -> Result<bool, SchedulingServiceError> {
        let output = sqlx::query(
            r#"
            UPDATE order_forecasts
            SET actual_orders = $4, updated_at = now()
            WHERE store_id = $1 AND date = $2 AND hour = $3
            "#,
        )
        .bind(store_id)
        .bind(date)
        .bind(hour)
        .bind(actual_orders)
        .execute(&self.pool)
        .await?;

        Ok(output.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn forecasts_with_actuals(
        &self,
        store_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OrderForecast>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, OrderForecast>(&format!(
            r#"
            SELECT {FORECAST_COLUMNS} FROM order_forecasts
            WHERE store_id = $1 AND date >= $2 AND date <= $3 AND actual_orders IS NOT NULL
            ORDER BY date, hour
            "#
        ))
        .bind(store_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }
}
