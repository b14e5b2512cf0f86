use async_trait::async_trait;
use shared::types::LaborStandard;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{domain::labor::LaborStandardsRepository, error::SchedulingServiceError};

const COLUMNS: &str =
    "id, store_id, orders_per_picker_hour, min_shift_hours, max_shift_hours, created_at, updated_at";

pub struct PgLaborStandardsRepository {
    pool: PgPool,
}

impl PgLaborStandardsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LaborStandardsRepository for PgLaborStandardsRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_store(
        &self,
        store_id: Uuid,
    ) -> Result<Option<LaborStandard>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, LaborStandard>(&format!(
            "SELECT {COLUMNS} FROM labor_standards WHERE store_id = $1"
        ))
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn create(
        &self,
        store_id: Uuid,
        orders_per_picker_hour: f64,
        min_shift_hours: i32,
        max_shift_hours: i32,
    ) -> Result<LaborStandard, SchedulingServiceError> {
        // Idempotent under races: a concurrent insert wins and is returned
        let output = sqlx::query_as::<_, LaborStandard>(&format!(
            r#"
            INSERT INTO labor_standards (store_id, orders_per_picker_hour, min_shift_hours, max_shift_hours)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (store_id) DO UPDATE SET updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(store_id)
        .bind(orders_per_picker_hour)
        .bind(min_shift_hours)
        .bind(max_shift_hours)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }
}
