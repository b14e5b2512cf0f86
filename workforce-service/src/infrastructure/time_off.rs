use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{TimeOffRequest, TimeOffStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::time_off::{CreateTimeOff, TimeOffRepository},
    error::WorkforceServiceError,
};

const COLUMNS: &str = "id, employee_id, start_date, end_date, reason, status, approved_by, approved_at, created_at, updated_at";

pub struct PgTimeOffRepository {
    pool: PgPool,
}

impl PgTimeOffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimeOffRepository for PgTimeOffRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeOffRequest>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, TimeOffRequest>(&format!(
            "SELECT {COLUMNS} FROM time_off_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<TimeOffRequest>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, TimeOffRequest>(&format!(
            "SELECT {COLUMNS} FROM time_off_requests WHERE employee_id = $1 ORDER BY start_date DESC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn approved_overlapping(
        &self,
        employee_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeOffRequest>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            SELECT {COLUMNS} FROM time_off_requests
            WHERE employee_id = $1
              AND status = 'APPROVED'
              AND start_date <= $3
              AND end_date >= $2
            ORDER BY start_date
            "#
        ))
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn create(
        &self,
        request: CreateTimeOff,
    ) -> Result<TimeOffRequest, WorkforceServiceError> {
        let output = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            INSERT INTO time_off_requests (employee_id, start_date, end_date, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.employee_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(
        &self,
        id: Uuid,
        status: TimeOffStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
    ) -> Result<TimeOffRequest, WorkforceServiceError> {
        let output = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            UPDATE time_off_requests
            SET status = $2, approved_by = $3, approved_at = $4, updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(decided_at)
        .fetch_optional(&self.pool)
        .await?;

        output
            .ok_or_else(|| WorkforceServiceError::NotFound("Time off request not found".to_string()))
    }
}
