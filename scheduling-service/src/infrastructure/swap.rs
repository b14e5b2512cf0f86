use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::{Shift, ShiftSwap, SwapStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{domain::swap::SwapRepository, error::SchedulingServiceError};

const SWAP_COLUMNS: &str = "id, requester_shift_id, requested_shift_id, notes, status, approved_by, approved_at, created_at, updated_at";
const SHIFT_COLUMNS: &str = "id, schedule_id, employee_id, date, start_time, end_time, break_minutes, status, callout_reason, callout_time, original_employee_id, covered_by_id, created_at, updated_at";

pub struct PgSwapRepository {
    pool: PgPool,
}

impl PgSwapRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SwapRepository for PgSwapRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShiftSwap>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, ShiftSwap>(&format!(
            "SELECT {SWAP_COLUMNS} FROM shift_swaps WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn open_for_shift(
        &self,
        requester_shift_id: Uuid,
    ) -> Result<Option<ShiftSwap>, SchedulingServiceError> {
        let output = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            SELECT {SWAP_COLUMNS} FROM shift_swaps
            WHERE requester_shift_id = $1 AND status IN ('PENDING', 'ACCEPTED')
            LIMIT 1
            "#
        ))
        .bind(requester_shift_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn create(
        &self,
        requester_shift_id: Uuid,
        requested_shift_id: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let output = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            INSERT INTO shift_swaps (requester_shift_id, requested_shift_id, notes)
            VALUES ($1, $2, $3)
            RETURNING {SWAP_COLUMNS}
            "#
        ))
        .bind(requester_shift_id)
        .bind(requested_shift_id)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn set_accepted(
        &self,
        id: Uuid,
        requested_shift_id: Uuid,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let output = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            UPDATE shift_swaps
            SET status = 'ACCEPTED', requested_shift_id = $2, updated_at = now()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {SWAP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(requested_shift_id)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or_else(|| {
            SchedulingServiceError::PreconditionFailed(
                "Swap is no longer in pending status".into(),
            )
        })
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(
        &self,
        id: Uuid,
        status: SwapStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let output = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            UPDATE shift_swaps
            SET status = $2, approved_by = $3, approved_at = $4, updated_at = now()
            WHERE id = $1
            RETURNING {SWAP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(decided_at)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or_else(|| SchedulingServiceError::NotFound("Shift swap not found".to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn approve_exchange(
        &self,
        id: Uuid,
        approved_by: Uuid,
        approved_at: DateTime<Utc>,
    ) -> Result<(ShiftSwap, Shift, Shift), SchedulingServiceError> {
        let mut tx = self.pool.begin().await?;

        let swap = sqlx::query_as::<_, ShiftSwap>(&format!(
            "SELECT {SWAP_COLUMNS} FROM shift_swaps WHERE id = $1 AND status = 'ACCEPTED' FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            SchedulingServiceError::PreconditionFailed(
                "Swap is no longer in accepted status".into(),
            )
        })?;

        let requested_shift_id = swap.requested_shift_id.ok_or_else(|| {
            SchedulingServiceError::PreconditionFailed(
                "Swap has no accepted shift attached".into(),
            )
        })?;

        let requester_shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1 FOR UPDATE"
        ))
        .bind(swap.requester_shift_id)
        .fetch_one(&mut *tx)
        .await?;
        let requested_shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1 FOR UPDATE"
        ))
        .bind(requested_shift_id)
        .fetch_one(&mut *tx)
        .await?;

        // Exchange exactly the employee assignments; times and dates stay
        let updated_requester = sqlx::query_as::<_, Shift>(&format!(
            "UPDATE shifts SET employee_id = $2, updated_at = now() WHERE id = $1 RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(requester_shift.id)
        .bind(requested_shift.employee_id)
        .fetch_one(&mut *tx)
        .await?;

        let updated_requested = sqlx::query_as::<_, Shift>(&format!(
            "UPDATE shifts SET employee_id = $2, updated_at = now() WHERE id = $1 RETURNING {SHIFT_COLUMNS}"
        ))
        .bind(requested_shift.id)
        .bind(requester_shift.employee_id)
        .fetch_one(&mut *tx)
        .await?;

        let updated_swap = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            UPDATE shift_swaps
            SET status = 'APPROVED', approved_by = $2, approved_at = $3, updated_at = now()
            WHERE id = $1
            RETURNING {SWAP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(approved_by)
        .bind(approved_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((updated_swap, updated_requester, updated_requested))
    }
}
