use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{
    NotificationKind, Schedule, ScheduleStatus, Shift, ShiftStatus,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::compliance::ComplianceEngine;
use crate::domain::notification::{NewNotification, NotificationRepository};
use crate::domain::schedule::{ProposedShift, ScheduleRepository, ShiftRepository, UpdateShift};
use crate::domain::workforce::WorkforceClient;
use crate::error::SchedulingServiceError;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateShift {
    pub schedule_id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: i32,
}

fn default_break_minutes() -> i32 {
    30
}

/// One candidate to cover a called-out shift, annotated with everything a
/// manager needs to override an imperfect match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplacementCandidate {
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub is_available: bool,
    pub availability_note: String,
    pub current_week_hours: f64,
    pub remaining_hours: f64,
    pub conflicts: Vec<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Applies optimizer output to the world and absorbs disruptions: publish
/// gating, manual shift edits, call-outs, replacement coverage and reverts.
pub struct ShiftLifecycleService {
    schedule_repo: Arc<dyn ScheduleRepository>,
    shift_repo: Arc<dyn ShiftRepository>,
    workforce: Arc<dyn WorkforceClient>,
    compliance: Arc<ComplianceEngine>,
    notifications: Arc<dyn NotificationRepository>,
}

impl ShiftLifecycleService {
    pub fn new(
        schedule_repo: Arc<dyn ScheduleRepository>,
        shift_repo: Arc<dyn ShiftRepository>,
        workforce: Arc<dyn WorkforceClient>,
        compliance: Arc<ComplianceEngine>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            schedule_repo,
            shift_repo,
            workforce,
            compliance,
            notifications,
        }
    }

    async fn schedule(&self, id: Uuid) -> Result<Schedule, SchedulingServiceError> {
        self.schedule_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingServiceError::NotFound(format!("Schedule {id} not found")))
    }

    async fn shift(&self, id: Uuid) -> Result<Shift, SchedulingServiceError> {
        self.shift_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingServiceError::NotFound(format!("Shift {id} not found")))
    }

    pub async fn get_schedule(
        &self,
        id: Uuid,
    ) -> Result<(Schedule, Vec<Shift>), SchedulingServiceError> {
        let schedule = self.schedule(id).await?;
        let shifts = self.shift_repo.for_schedule(id).await?;
        Ok((schedule, shifts))
    }

    pub async fn get_shift(&self, id: Uuid) -> Result<Shift, SchedulingServiceError> {
        self.shift(id).await
    }

    // region: Publication

    /// Validates and publishes a draft schedule. Errors block; warnings
    /// block unless `force`. One notification per distinct assigned
    /// employee.
    #[tracing::instrument(skip(self))]
    pub async fn publish(
        &self,
        schedule_id: Uuid,
        validate: bool,
        force: bool,
    ) -> Result<Schedule, SchedulingServiceError> {
        let schedule = self.schedule(schedule_id).await?;

        if schedule.status == ScheduleStatus::Published {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Schedule is already published".into(),
            ));
        }

        let shift_count = self.shift_repo.count_for_schedule(schedule_id).await?;
        if shift_count == 0 {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Cannot publish an empty schedule".into(),
            ));
        }

        if validate {
            let report = self.compliance.validate_schedule(schedule_id).await?;
            if !report.is_compliant {
                return Err(SchedulingServiceError::ComplianceViolated(report));
            }
            if !report.warnings.is_empty() && !force {
                return Err(SchedulingServiceError::ComplianceWarning(report));
            }
        }

        let published = self.schedule_repo.publish(schedule_id, Utc::now()).await?;

        let shifts = self.shift_repo.for_schedule(schedule_id).await?;
        let employees: HashSet<Uuid> = shifts.iter().map(|s| s.employee_id).collect();
        let message = format!(
            "Schedule for week of {} has been published",
            published.week_start.format("%b %d")
        );
        self.notifications
            .enqueue(
                employees
                    .into_iter()
                    .map(|employee_id| NewNotification {
                        employee_id,
                        message: message.clone(),
                        kind: NotificationKind::SchedulePublished,
                    })
                    .collect(),
            )
            .await?;

        Ok(published)
    }

    #[tracing::instrument(skip(self))]
    pub async fn unpublish(&self, schedule_id: Uuid) -> Result<Schedule, SchedulingServiceError> {
        let schedule = self.schedule(schedule_id).await?;
        if schedule.status != ScheduleStatus::Published {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Schedule is not published".into(),
            ));
        }
        self.schedule_repo.unpublish(schedule_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_schedule(&self, schedule_id: Uuid) -> Result<(), SchedulingServiceError> {
        let schedule = self.schedule(schedule_id).await?;
        if schedule.status == ScheduleStatus::Published {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Cannot delete a published schedule".into(),
            ));
        }
        self.schedule_repo.delete(schedule_id).await
    }

    // endregion

    // region: Manual shift mutations

    #[tracing::instrument(skip(self, request))]
    pub async fn create_shift(
        &self,
        request: CreateShift,
        validate: bool,
        force: bool,
    ) -> Result<Shift, SchedulingServiceError> {
        self.schedule(request.schedule_id).await?;

        if request.start_time >= request.end_time {
            return Err(SchedulingServiceError::BadRequest(
                "start_time must be before end_time".into(),
            ));
        }

        let mut proposed = ProposedShift {
            employee_id: request.employee_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            break_minutes: request.break_minutes,
        };

        // An undersized break is raised to the legal minimum, not rejected
        let required = self
            .compliance
            .rules()
            .required_break_minutes(proposed.elapsed_hours());
        if proposed.break_minutes < required {
            proposed.break_minutes = required;
        }

        if validate {
            let report = self.compliance.validate_shift(&proposed, None).await?;
            if !report.is_compliant {
                return Err(SchedulingServiceError::ComplianceViolated(report));
            }
            if !report.warnings.is_empty() && !force {
                return Err(SchedulingServiceError::ComplianceWarning(report));
            }
        }

        self.shift_repo.insert(request.schedule_id, proposed).await
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_shift(
        &self,
        shift_id: Uuid,
        patch: UpdateShift,
        validate: bool,
        force: bool,
    ) -> Result<Shift, SchedulingServiceError> {
        let shift = self.shift(shift_id).await?;

        let mut proposed = ProposedShift {
            employee_id: patch.employee_id.unwrap_or(shift.employee_id),
            date: patch.date.unwrap_or(shift.date),
            start_time: patch.start_time.unwrap_or(shift.start_time),
            end_time: patch.end_time.unwrap_or(shift.end_time),
            break_minutes: patch.break_minutes.unwrap_or(shift.break_minutes),
        };

        if proposed.start_time >= proposed.end_time {
            return Err(SchedulingServiceError::BadRequest(
                "start_time must be before end_time".into(),
            ));
        }

        let required = self
            .compliance
            .rules()
            .required_break_minutes(proposed.elapsed_hours());
        if proposed.break_minutes < required {
            proposed.break_minutes = required;
        }

        if validate {
            let report = self
                .compliance
                .validate_shift(&proposed, Some(shift_id))
                .await?;
            if !report.is_compliant {
                return Err(SchedulingServiceError::ComplianceViolated(report));
            }
            if !report.warnings.is_empty() && !force {
                return Err(SchedulingServiceError::ComplianceWarning(report));
            }
        }

        self.shift_repo
            .update(
                shift_id,
                UpdateShift {
                    employee_id: Some(proposed.employee_id),
                    date: Some(proposed.date),
                    start_time: Some(proposed.start_time),
                    end_time: Some(proposed.end_time),
                    break_minutes: Some(proposed.break_minutes),
                },
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_shift(&self, shift_id: Uuid) -> Result<(), SchedulingServiceError> {
        self.shift(shift_id).await?;
        self.shift_repo.delete(shift_id).await
    }

    // endregion

    // region: Call-outs and coverage

    /// Marks a scheduled shift as called out, capturing the original
    /// employee. The shift keeps counting against their week until covered.
    #[tracing::instrument(skip(self))]
    pub async fn mark_callout(
        &self,
        shift_id: Uuid,
        reason: Option<String>,
    ) -> Result<Shift, SchedulingServiceError> {
        let shift = self.shift(shift_id).await?;
        if shift.status != ShiftStatus::Scheduled {
            return Err(SchedulingServiceError::PreconditionFailed(format!(
                "Only scheduled shifts can be called out (current status: {:?})",
                shift.status
            )));
        }

        self.shift_repo
            .mark_called_out(shift_id, reason, Utc::now())
            .await?
            .ok_or_else(|| {
                SchedulingServiceError::PreconditionFailed(
                    "Shift is no longer in scheduled status".into(),
                )
            })
    }

    /// Ranks the store's active employees as candidates to cover a
    /// called-out shift: available first, then most remaining weekly hours.
    /// Ineligible candidates are included with their conflicts so a manager
    /// can override.
    #[tracing::instrument(skip(self))]
    pub async fn find_replacements(
        &self,
        shift_id: Uuid,
    ) -> Result<Vec<ReplacementCandidate>, SchedulingServiceError> {
        let shift = self.shift(shift_id).await?;
        if shift.status != ShiftStatus::CalledOut {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Replacements can only be searched for called-out shifts".into(),
            ));
        }

        let schedule = self.schedule(shift.schedule_id).await?;
        let week_start = shared::time::monday_of(shift.date);
        let context = self
            .workforce
            .get_scheduling_context(schedule.store_id, week_start)
            .await?;

        let day_of_week = shared::time::day_index(shift.date);
        let weekday = shift.date.format("%A");
        let shift_hours = shift.working_hours();
        let max_hours = self.compliance.rules().max_hours_per_week;

        let mut candidates = Vec::new();

        for employee_ctx in &context.employees {
            let employee = &employee_ctx.employee;
            if employee.id == shift.employee_id
                || Some(employee.id) == shift.original_employee_id
            {
                continue;
            }

            let mut conflicts = Vec::new();
            let mut hard_conflict = false;
            let mut availability_note = "Available".to_string();

            let week_shifts = self.shift_repo.in_week(employee.id, week_start).await?;
            let current_hours: f64 = week_shifts.iter().map(Shift::working_hours).sum();

            let busy_same_date = week_shifts.iter().any(|s| {
                s.date == shift.date
                    && matches!(s.status, ShiftStatus::Scheduled | ShiftStatus::Covered)
            });
            if busy_same_date {
                conflicts.push(format!("Already scheduled on {}", shift.date));
                hard_conflict = true;
            }

            if employee_ctx.time_off.iter().any(|w| w.contains(shift.date)) {
                conflicts.push("Approved time off on this date".to_string());
                hard_conflict = true;
            }

            let day_row = employee_ctx
                .availability
                .iter()
                .find(|a| a.day_of_week == day_of_week);
            if let Some(row) = day_row {
                if !row.is_available {
                    conflicts.push(format!("Not available on {weekday}s"));
                    availability_note = format!("Not available on {weekday}s");
                    hard_conflict = true;
                } else if let (Some(pref_start), Some(pref_end)) =
                    (row.preferred_start, row.preferred_end)
                    && (shift.start_time < pref_start || shift.end_time > pref_end)
                {
                    // Preference miss is advisory only
                    conflicts.push("Outside preferred hours".to_string());
                    availability_note = "Outside preferred hours".to_string();
                }
            }

            let projected = current_hours + shift_hours;
            if projected > max_hours {
                conflicts.push(format!(
                    "Would exceed {max_hours:.0}h weekly limit (projected {projected:.1}h)"
                ));
            }

            candidates.push(ReplacementCandidate {
                employee_id: employee.id,
                first_name: employee.first_name.clone(),
                last_name: employee.last_name.clone(),
                is_available: !hard_conflict,
                availability_note,
                current_week_hours: round2(current_hours),
                remaining_hours: round2((max_hours - current_hours).max(0.0)),
                conflicts,
            });
        }

        candidates.sort_by(|a, b| {
            b.is_available
                .cmp(&a.is_available)
                .then(
                    b.remaining_hours
                        .partial_cmp(&a.remaining_hours)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then_with(|| a.last_name.cmp(&b.last_name))
        });

        Ok(candidates)
    }

    /// Covers a called-out shift with a replacement. The weekly-hour cap
    /// rejects unless `force`; store and active-status checks always apply.
    #[tracing::instrument(skip(self))]
    pub async fn assign_replacement(
        &self,
        shift_id: Uuid,
        replacement_employee_id: Uuid,
        force: bool,
    ) -> Result<Shift, SchedulingServiceError> {
        let shift = self.shift(shift_id).await?;
        if shift.status != ShiftStatus::CalledOut {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Only called-out shifts can be covered".into(),
            ));
        }

        let schedule = self.schedule(shift.schedule_id).await?;
        let replacement = self.workforce.get_employee(replacement_employee_id).await?;

        if replacement.status != shared::types::EmployeeStatus::Active {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Replacement employee must be active".into(),
            ));
        }
        if replacement.store_id != schedule.store_id {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Replacement employee must belong to the same store".into(),
            ));
        }

        if !force {
            let week_start = shared::time::monday_of(shift.date);
            let week_shifts = self
                .shift_repo
                .in_week(replacement_employee_id, week_start)
                .await?;
            let current_hours: f64 = week_shifts.iter().map(Shift::working_hours).sum();
            let projected = current_hours + shift.working_hours();
            let max_hours = self.compliance.rules().max_hours_per_week;

            if projected > max_hours {
                return Err(SchedulingServiceError::Conflict(format!(
                    "Assignment would put {} at {projected:.1}h this week (limit {max_hours:.0}h). Use force to override.",
                    replacement.full_name()
                )));
            }
        }

        let covered = self
            .shift_repo
            .assign_replacement(shift_id, replacement_employee_id)
            .await?
            .ok_or_else(|| {
                SchedulingServiceError::PreconditionFailed(
                    "Shift is no longer in called-out status".into(),
                )
            })?;

        let mut notifications = vec![NewNotification {
            employee_id: replacement_employee_id,
            message: format!("You have been assigned a shift on {}", covered.date),
            kind: NotificationKind::ShiftAssigned,
        }];
        if let Some(original) = covered.original_employee_id {
            notifications.push(NewNotification {
                employee_id: original,
                message: format!("Your shift on {} has been covered", covered.date),
                kind: NotificationKind::ShiftChanged,
            });
        }
        self.notifications.enqueue(notifications).await?;

        Ok(covered)
    }

    /// Undoes a call-out before coverage happens: the original employee is
    /// restored and the metadata cleared. A called-out shift without its
    /// captured original employee is corrupt state and fails loudly.
    #[tracing::instrument(skip(self))]
    pub async fn revert_callout(&self, shift_id: Uuid) -> Result<Shift, SchedulingServiceError> {
        let shift = self.shift(shift_id).await?;
        if shift.status != ShiftStatus::CalledOut {
            return Err(SchedulingServiceError::PreconditionFailed(format!(
                "Only called-out shifts can be reverted (current status: {:?})",
                shift.status
            )));
        }
        if shift.original_employee_id.is_none() {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Shift has no captured original employee; cannot revert".into(),
            ));
        }

        self.shift_repo
            .revert_called_out(shift_id)
            .await?
            .ok_or_else(|| {
                SchedulingServiceError::PreconditionFailed(
                    "Shift is no longer in called-out status".into(),
                )
            })
    }

    // endregion
}
