use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::types::{Schedule, ScheduleStatus, Shift};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::schedule::{ProposedShift, ScheduleRepository, ShiftRepository, UpdateShift},
    error::SchedulingServiceError,
};

const SCHEDULE_COLUMNS: &str = "id, store_id, week_start_date AS week_start, status, created_by, published_at, created_at, updated_at";
const SHIFT_COLUMNS: &str = "id, schedule_id, employee_id, date, start_time, end_time, break_minutes, status, callout_reason, callout_time, original_employee_id, covered_by_id, created_at, updated_at";

pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Schedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_with_status(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        status: ScheduleStatus,
    ) -> Result<Option<Schedule>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM schedules
            WHERE store_id = $1 AND week_start_date = $2 AND status = $3
            "#
        ))
        .bind(store_id)
        .bind(week_start)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self, shifts))]
    async fn replace_draft(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        created_by: Uuid,
        shifts: Vec<ProposedShift>,
    ) -> Result<(Schedule, Vec<Shift>), SchedulingServiceError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM schedules
            WHERE store_id = $1 AND week_start_date = $2 AND status = 'DRAFT'
            FOR UPDATE
            "#
        ))
        .bind(store_id)
        .bind(week_start)
        .fetch_optional(&mut *tx)
        .await?;

        let schedule = match existing {
            Some(schedule) => {
                sqlx::query("DELETE FROM shifts WHERE schedule_id = $1")
                    .bind(schedule.id)
                    .execute(&mut *tx)
                    .await?;
                schedule
            }
            None => {
                sqlx::query_as::<_, Schedule>(&format!(
                    r#"
                    INSERT INTO schedules (store_id, week_start_date, created_by)
                    VALUES ($1, $2, $3)
                    RETURNING {SCHEDULE_COLUMNS}
                    "#
                ))
                .bind(store_id)
                .bind(week_start)
                .bind(created_by)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let schedule_ids: Vec<Uuid> = vec![schedule.id; shifts.len()];
        let employee_ids: Vec<Uuid> = shifts.iter().map(|s| s.employee_id).collect();
        let dates: Vec<NaiveDate> = shifts.iter().map(|s| s.date).collect();
        let start_times: Vec<NaiveTime> = shifts.iter().map(|s| s.start_time).collect();
        let end_times: Vec<NaiveTime> = shifts.iter().map(|s| s.end_time).collect();
        let breaks: Vec<i32> = shifts.iter().map(|s| s.break_minutes).collect();

        let created = sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shifts (schedule_id, employee_id, date, start_time, end_time, break_minutes)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::date[], $4::time[], $5::time[], $6::int4[])
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(&schedule_ids)
        .bind(&employee_ids)
        .bind(&dates)
        .bind(&start_times)
        .bind(&end_times)
        .bind(&breaks)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((schedule, created))
    }

    #[tracing::instrument(skip(self))]
    async fn publish(
        &self,
        id: Uuid,
        published_at: DateTime<Utc>,
    ) -> Result<Schedule, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            UPDATE schedules
            SET status = 'PUBLISHED', published_at = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(published_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            SchedulingServiceError::from_db(
                e,
                "A published schedule already exists for this store and week",
            )
        })?;

        output.ok_or_else(|| SchedulingServiceError::NotFound("Schedule not found".to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn unpublish(&self, id: Uuid) -> Result<Schedule, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            UPDATE schedules
            SET status = 'DRAFT', published_at = NULL, updated_at = now()
            WHERE id = $1
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or_else(|| SchedulingServiceError::NotFound("Schedule not found".to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingServiceError> {
        let output = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if output.rows_affected() == 0 {
            return Err(SchedulingServiceError::NotFound(
                "Schedule not found".to_string(),
            ));
        }

        Ok(())
    }
}

pub struct PgShiftRepository {
    pool: PgPool,
}

impl PgShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShiftRepository for PgShiftRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn for_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Vec<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE schedule_id = $1 ORDER BY date, start_time"
        ))
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn count_for_schedule(&self, schedule_id: Uuid) -> Result<i64, SchedulingServiceError> {
        let output: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shifts WHERE schedule_id = $1")
            .bind(schedule_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(output.0)
    }

    #[tracing::instrument(skip(self))]
    async fn in_week(
        &self,
        employee_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS} FROM shifts
            WHERE employee_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date, start_time
            "#
        ))
        .bind(employee_id)
        .bind(week_start)
        .bind(shared::time::week_end(week_start))
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn on_date(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT {SHIFT_COLUMNS} FROM shifts
            WHERE employee_id = $1 AND date = $2
            ORDER BY start_time
            "#
        ))
        .bind(employee_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn insert(
        &self,
        schedule_id: Uuid,
        shift: ProposedShift,
    ) -> Result<Shift, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shifts (schedule_id, employee_id, date, start_time, end_time, break_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(schedule_id)
        .bind(shift.employee_id)
        .bind(shift.date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.break_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: Uuid,
        patch: UpdateShift,
    ) -> Result<Shift, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET employee_id = COALESCE($2, employee_id),
                date = COALESCE($3, date),
                start_time = COALESCE($4, start_time),
                end_time = COALESCE($5, end_time),
                break_minutes = COALESCE($6, break_minutes),
                updated_at = now()
            WHERE id = $1
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.employee_id)
        .bind(patch.date)
        .bind(patch.start_time)
        .bind(patch.end_time)
        .bind(patch.break_minutes)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or_else(|| SchedulingServiceError::NotFound("Shift not found".to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingServiceError> {
        let output = sqlx::query("DELETE FROM shifts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if output.rows_affected() == 0 {
            return Err(SchedulingServiceError::NotFound("Shift not found".to_string()));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_called_out(
        &self,
        id: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET status = 'CALLED_OUT',
                callout_reason = $2,
                callout_time = $3,
                original_employee_id = employee_id,
                updated_at = now()
            WHERE id = $1 AND status = 'SCHEDULED'
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reason)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn assign_replacement(
        &self,
        id: Uuid,
        replacement_id: Uuid,
    ) -> Result<Option<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET status = 'COVERED',
                employee_id = $2,
                covered_by_id = $2,
                updated_at = now()
            WHERE id = $1 AND status = 'CALLED_OUT'
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(replacement_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn revert_called_out(&self, id: Uuid) -> Result<Option<Shift>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET status = 'SCHEDULED',
                employee_id = original_employee_id,
                callout_reason = NULL,
                callout_time = NULL,
                original_employee_id = NULL,
                covered_by_id = NULL,
                updated_at = now()
            WHERE id = $1 AND status = 'CALLED_OUT' AND original_employee_id IS NOT NULL
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }
}
