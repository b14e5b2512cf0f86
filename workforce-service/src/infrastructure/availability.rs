use async_trait::async_trait;
use shared::types::Availability;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::availability::{AvailabilityRepository, SetAvailability},
    error::WorkforceServiceError,
};

const COLUMNS: &str =
    "id, employee_id, day_of_week, is_available, preferred_start, preferred_end, created_at, updated_at";

pub struct PgAvailabilityRepository {
    pool: PgPool,
}

impl PgAvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PgAvailabilityRepository {
    #[tracing::instrument(skip(self))]
    async fn for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<Availability>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Availability>(&format!(
            "SELECT {COLUMNS} FROM availability WHERE employee_id = $1 ORDER BY day_of_week"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self, rows))]
    async fn replace_for_employee(
        &self,
        employee_id: Uuid,
        rows: Vec<SetAvailability>,
    ) -> Result<Vec<Availability>, WorkforceServiceError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM availability WHERE employee_id = $1")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        let mut saved = Vec::with_capacity(rows.len());
        for row in rows {
            let inserted = sqlx::query_as::<_, Availability>(&format!(
                r#"
                INSERT INTO availability (employee_id, day_of_week, is_available, preferred_start, preferred_end)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {COLUMNS}
                "#
            ))
            .bind(employee_id)
            .bind(row.day_of_week)
            .bind(row.is_available)
            .bind(row.preferred_start)
            .bind(row.preferred_end)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                WorkforceServiceError::from_db(e, "Duplicate day_of_week in availability set")
            })?;
            saved.push(inserted);
        }

        tx.commit().await?;

        Ok(saved)
    }
}
