use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

// region: Workforce Service Types

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "employee_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    OnLeave,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub operating_start: NaiveTime,
    pub operating_end: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// First hour of the operating window (inclusive).
    pub fn open_hour(&self) -> i16 {
        use chrono::Timelike;
        self.operating_start.hour() as i16
    }

    /// Hour the store closes (exclusive when iterating hour slots).
    pub fn close_hour(&self) -> i16 {
        use chrono::Timelike;
        self.operating_end.hour() as i16
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub store_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub hire_date: NaiveDate,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Availability {
    pub id: Uuid,
    pub employee_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: i16,
    pub is_available: bool,
    pub preferred_start: Option<NaiveTime>,
    pub preferred_end: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "time_off_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOffStatus {
    Pending,
    Approved,
    Denied,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: TimeOffStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An approved absence window, as shipped inside a [`SchedulingContext`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct TimeOffWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TimeOffWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// One employee with the constraint data the scheduling side needs for a week.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeContext {
    pub employee: Employee,
    pub availability: Vec<Availability>,
    pub time_off: Vec<TimeOffWindow>,
}

/// Resolved view of a store's workforce for one Monday-aligned week.
///
/// Served by workforce-service and consumed by the optimizer, the compliance
/// engine and replacement search. Only active employees are included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchedulingContext {
    pub store: Store,
    pub week_start: NaiveDate,
    pub employees: Vec<EmployeeContext>,
}

// endregion: Workforce Service Types

// region: Scheduling Service Types

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "schedule_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Schedule {
    pub id: Uuid,
    pub store_id: Uuid,
    /// Always a Monday.
    pub week_start: NaiveDate,
    pub status: ScheduleStatus,
    pub created_by: Uuid,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "shift_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Scheduled,
    CalledOut,
    Covered,
    NoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shift {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i32,
    pub status: ShiftStatus,
    pub callout_reason: Option<String>,
    pub callout_time: Option<DateTime<Utc>>,
    pub original_employee_id: Option<Uuid>,
    pub covered_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    /// Elapsed time between start and end, in hours (break included).
    pub fn elapsed_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_minutes() as f64 / 60.0
    }

    /// Working hours: elapsed time minus the break.
    pub fn working_hours(&self) -> f64 {
        let minutes = (self.end_time - self.start_time).num_minutes() - self.break_minutes as i64;
        minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "swap_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Approved,
    Denied,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ShiftSwap {
    pub id: Uuid,
    pub requester_shift_id: Uuid,
    /// None until someone accepts with a shift of their own (open swap).
    pub requested_shift_id: Option<Uuid>,
    pub notes: Option<String>,
    pub status: SwapStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HistoricalOrder {
    pub id: Uuid,
    pub store_id: Uuid,
    pub date: NaiveDate,
    /// 0..=23
    pub hour: i16,
    pub order_count: f64,
    /// 0 = Monday .. 6 = Sunday; derived from `date` when absent on import.
    pub day_of_week: Option<i16>,
    pub is_holiday: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderForecast {
    pub id: Uuid,
    pub store_id: Uuid,
    pub date: NaiveDate,
    pub hour: i16,
    pub predicted_orders: f64,
    pub actual_orders: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LaborStandard {
    pub id: Uuid,
    pub store_id: Uuid,
    pub orders_per_picker_hour: f64,
    pub min_shift_hours: i32,
    pub max_shift_hours: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    SchedulePublished,
    ShiftAssigned,
    ShiftChanged,
    SwapRequested,
    SwapApproved,
    SwapDenied,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// endregion: Scheduling Service Types

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn shift_hours_subtract_break() {
        let shift = Shift {
            id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            start_time: t(8, 0),
            end_time: t(16, 0),
            break_minutes: 30,
            status: ShiftStatus::Scheduled,
            callout_reason: None,
            callout_time: None,
            original_employee_id: None,
            covered_by_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(shift.elapsed_hours(), 8.0);
        assert_eq!(shift.working_hours(), 7.5);
    }

    #[test]
    fn time_off_window_is_inclusive() {
        let window = TimeOffWindow {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
        };
        assert!(window.contains(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()));
        assert!(window.contains(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()));
    }
}
