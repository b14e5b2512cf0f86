use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{Schedule, ScheduleStatus, Shift};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SchedulingServiceError;

/// A shift that has not been persisted yet: what the optimizer emits and
/// what compliance validation runs against before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProposedShift {
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i32,
}

impl ProposedShift {
    pub fn elapsed_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_minutes() as f64 / 60.0
    }

    pub fn working_hours(&self) -> f64 {
        let minutes = (self.end_time - self.start_time).num_minutes() - self.break_minutes as i64;
        minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateShift {
    pub employee_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub break_minutes: Option<i32>,
}

/// Persistence operations for schedules.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, SchedulingServiceError>;
    async fn find_with_status(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        status: ScheduleStatus,
    ) -> Result<Option<Schedule>, SchedulingServiceError>;
    /// Reuses the week's draft schedule (dropping its shifts) or creates a
    /// new one, then inserts the given shifts. Atomic: one transaction.
    async fn replace_draft(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        created_by: Uuid,
        shifts: Vec<ProposedShift>,
    ) -> Result<(Schedule, Vec<Shift>), SchedulingServiceError>;
    async fn publish(
        &self,
        id: Uuid,
        published_at: DateTime<Utc>,
    ) -> Result<Schedule, SchedulingServiceError>;
    async fn unpublish(&self, id: Uuid) -> Result<Schedule, SchedulingServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingServiceError>;
}

/// Persistence operations for shifts.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ShiftRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, SchedulingServiceError>;
    async fn for_schedule(&self, schedule_id: Uuid)
    -> Result<Vec<Shift>, SchedulingServiceError>;
    async fn count_for_schedule(&self, schedule_id: Uuid) -> Result<i64, SchedulingServiceError>;
    /// All of the employee's shifts dated within the Monday-aligned week.
    async fn in_week(
        &self,
        employee_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<Shift>, SchedulingServiceError>;
    async fn on_date(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Shift>, SchedulingServiceError>;
    async fn insert(
        &self,
        schedule_id: Uuid,
        shift: ProposedShift,
    ) -> Result<Shift, SchedulingServiceError>;
    async fn update(
        &self,
        id: Uuid,
        patch: UpdateShift,
    ) -> Result<Shift, SchedulingServiceError>;
    async fn delete(&self, id: Uuid) -> Result<(), SchedulingServiceError>;
    /// Scheduled -> CalledOut, capturing the original employee. Returns None
    /// when the shift is no longer in Scheduled (lost race).
    async fn mark_called_out(
        &self,
        id: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<Shift>, SchedulingServiceError>;
    /// CalledOut -> Covered with the replacement on the shift.
    async fn assign_replacement(
        &self,
        id: Uuid,
        replacement_id: Uuid,
    ) -> Result<Option<Shift>, SchedulingServiceError>;
    /// CalledOut -> Scheduled, restoring the original employee and clearing
    /// call-out metadata.
    async fn revert_called_out(&self, id: Uuid) -> Result<Option<Shift>, SchedulingServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn proposed_shift_hours() {
        let shift = ProposedShift {
            employee_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            start_time: t(13, 0),
            end_time: t(22, 0),
            break_minutes: 60,
        };
        assert_eq!(shift.elapsed_hours(), 9.0);
        assert_eq!(shift.working_hours(), 8.0);
    }
}
