use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::json;
use shared::types::{Availability, Shift, TimeOffWindow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::domain::schedule::{ProposedShift, ScheduleRepository, ShiftRepository};
use crate::domain::workforce::WorkforceClient;
use crate::error::SchedulingServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    WeeklyHoursExceeded,
    DailyHoursExceeded,
    ConsecutiveDaysExceeded,
    InsufficientBreak,
    /// Reserved: declared for API stability, not currently raised.
    OutsideOperatingHours,
    TimeOffConflict,
    AvailabilityConflict,
    ShiftOverlap,
    /// Synthetic finding used when schedule-level validation targets an
    /// unknown schedule id.
    ScheduleNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single rule finding with a human message and structured details.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComplianceFinding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    pub employee_id: Option<Uuid>,
    pub employee_name: Option<String>,
    pub date: Option<NaiveDate>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComplianceReport {
    pub is_compliant: bool,
    pub violations: Vec<ComplianceFinding>,
    pub warnings: Vec<ComplianceFinding>,
    pub info: Vec<ComplianceFinding>,
    pub violation_count: usize,
    pub warning_count: usize,
}

impl ComplianceReport {
    pub fn from_findings(findings: Vec<ComplianceFinding>) -> Self {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        let mut info = Vec::new();

        for finding in findings {
            match finding.severity {
                Severity::Error => violations.push(finding),
                Severity::Warning => warnings.push(finding),
                Severity::Info => info.push(finding),
            }
        }

        Self {
            is_compliant: violations.is_empty(),
            violation_count: violations.len(),
            warning_count: warnings.len(),
            violations,
            warnings,
            info,
        }
    }
}

/// Labor thresholds, bound once at engine construction.
#[derive(Debug, Clone)]
pub struct ComplianceRules {
    pub max_hours_per_week: f64,
    pub max_hours_per_day: f64,
    pub max_days_per_week: u32,
    pub break_minutes_8hr: i32,
    pub break_minutes_9hr: i32,
}

impl ComplianceRules {
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            max_hours_per_week: config.max_hours_per_week,
            max_hours_per_day: config.max_hours_per_day,
            max_days_per_week: config.days_on_per_week,
            break_minutes_8hr: config.break_minutes_8hr_shift,
            break_minutes_9hr: config.break_minutes_9hr_shift,
        }
    }

    /// Minimum break for a shift of the given elapsed length.
    pub fn required_break_minutes(&self, elapsed_hours: f64) -> i32 {
        if elapsed_hours >= 9.0 {
            self.break_minutes_9hr
        } else if elapsed_hours >= 8.0 {
            self.break_minutes_8hr
        } else {
            0
        }
    }
}

/// The time-and-break footprint of a shift, persisted or proposed.
#[derive(Debug, Clone, Copy)]
pub struct ShiftSpan {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i32,
}

impl ShiftSpan {
    pub fn elapsed_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_minutes() as f64 / 60.0
    }

    pub fn working_hours(&self) -> f64 {
        let minutes = (self.end_time - self.start_time).num_minutes() - self.break_minutes as i64;
        minutes as f64 / 60.0
    }

    pub fn overlaps(&self, other: &ShiftSpan) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

impl From<&Shift> for ShiftSpan {
    fn from(shift: &Shift) -> Self {
        Self {
            date: shift.date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            break_minutes: shift.break_minutes,
        }
    }
}

impl From<&ProposedShift> for ShiftSpan {
    fn from(shift: &ProposedShift) -> Self {
        Self {
            date: shift.date,
            start_time: shift.start_time,
            end_time: shift.end_time,
            break_minutes: shift.break_minutes,
        }
    }
}

/// The employee a finding is about.
#[derive(Debug, Clone)]
pub struct EmployeeRef {
    pub id: Uuid,
    pub name: Option<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// region: Rule checks

fn weekly_hours_finding(
    rules: &ComplianceRules,
    who: &EmployeeRef,
    week_start: NaiveDate,
    spans: &[ShiftSpan],
) -> Option<ComplianceFinding> {
    let total_hours: f64 = spans.iter().map(ShiftSpan::working_hours).sum();

    if total_hours > rules.max_hours_per_week {
        Some(ComplianceFinding {
            kind: FindingKind::WeeklyHoursExceeded,
            severity: Severity::Error,
            message: format!(
                "Weekly hours ({total_hours:.1}) exceed maximum ({})",
                rules.max_hours_per_week
            ),
            employee_id: Some(who.id),
            employee_name: who.name.clone(),
            date: None,
            details: json!({
                "total_hours": round2(total_hours),
                "max_hours": rules.max_hours_per_week,
                "excess_hours": round2(total_hours - rules.max_hours_per_week),
                "week_start": week_start,
            }),
        })
    } else if total_hours > rules.max_hours_per_week - 4.0 {
        Some(ComplianceFinding {
            kind: FindingKind::WeeklyHoursExceeded,
            severity: Severity::Warning,
            message: format!(
                "Approaching weekly hour limit ({total_hours:.1}/{})",
                rules.max_hours_per_week
            ),
            employee_id: Some(who.id),
            employee_name: who.name.clone(),
            date: None,
            details: json!({
                "total_hours": round2(total_hours),
                "max_hours": rules.max_hours_per_week,
                "remaining_hours": round2(rules.max_hours_per_week - total_hours),
            }),
        })
    } else {
        None
    }
}

fn daily_hours_finding(
    rules: &ComplianceRules,
    who: &EmployeeRef,
    date: NaiveDate,
    spans: &[ShiftSpan],
) -> Option<ComplianceFinding> {
    let total_hours: f64 = spans.iter().map(ShiftSpan::working_hours).sum();

    if total_hours > rules.max_hours_per_day {
        Some(ComplianceFinding {
            kind: FindingKind::DailyHoursExceeded,
            severity: Severity::Error,
            message: format!(
                "Daily hours ({total_hours:.1}) exceed maximum ({})",
                rules.max_hours_per_day
            ),
            employee_id: Some(who.id),
            employee_name: who.name.clone(),
            date: Some(date),
            details: json!({
                "total_hours": round2(total_hours),
                "max_hours": rules.max_hours_per_day,
                "excess_hours": round2(total_hours - rules.max_hours_per_day),
            }),
        })
    } else {
        None
    }
}

fn consecutive_days_finding(
    rules: &ComplianceRules,
    who: &EmployeeRef,
    week_start: NaiveDate,
    work_dates: &BTreeSet<NaiveDate>,
) -> Option<ComplianceFinding> {
    let days_worked = work_dates.len();

    if days_worked > rules.max_days_per_week as usize {
        Some(ComplianceFinding {
            kind: FindingKind::ConsecutiveDaysExceeded,
            severity: Severity::Error,
            message: format!(
                "Scheduled {days_worked} days this week (maximum is {})",
                rules.max_days_per_week
            ),
            employee_id: Some(who.id),
            employee_name: who.name.clone(),
            date: None,
            details: json!({
                "days_scheduled": days_worked,
                "max_days": rules.max_days_per_week,
                "work_dates": work_dates.iter().collect::<Vec<_>>(),
                "week_start": week_start,
            }),
        })
    } else {
        None
    }
}

fn break_finding(
    rules: &ComplianceRules,
    who: &EmployeeRef,
    span: &ShiftSpan,
) -> Option<ComplianceFinding> {
    let elapsed = span.elapsed_hours();
    let required = rules.required_break_minutes(elapsed);

    if span.break_minutes < required {
        Some(ComplianceFinding {
            kind: FindingKind::InsufficientBreak,
            severity: Severity::Error,
            message: format!(
                "Insufficient break time ({} min) for {elapsed:.1} hour shift (requires {required} min)",
                span.break_minutes
            ),
            employee_id: Some(who.id),
            employee_name: who.name.clone(),
            date: Some(span.date),
            details: json!({
                "shift_hours": round2(elapsed),
                "break_minutes": span.break_minutes,
                "required_break_minutes": required,
            }),
        })
    } else {
        None
    }
}

fn time_off_finding(
    who: &EmployeeRef,
    date: NaiveDate,
    windows: &[TimeOffWindow],
) -> Option<ComplianceFinding> {
    let window = windows.iter().find(|w| w.contains(date))?;

    Some(ComplianceFinding {
        kind: FindingKind::TimeOffConflict,
        severity: Severity::Error,
        message: format!(
            "Shift conflicts with approved time off ({} to {})",
            window.start_date, window.end_date
        ),
        employee_id: Some(who.id),
        employee_name: who.name.clone(),
        date: Some(date),
        details: json!({
            "time_off_start": window.start_date,
            "time_off_end": window.end_date,
        }),
    })
}

fn availability_finding(
    who: &EmployeeRef,
    date: NaiveDate,
    rows: &[Availability],
) -> Option<ComplianceFinding> {
    let day_of_week = shared::time::day_index(date);
    let row = rows.iter().find(|a| a.day_of_week == day_of_week)?;

    if row.is_available {
        return None;
    }

    Some(ComplianceFinding {
        kind: FindingKind::AvailabilityConflict,
        severity: Severity::Warning,
        message: format!("Employee marked as unavailable on {}s", date.format("%A")),
        employee_id: Some(who.id),
        employee_name: who.name.clone(),
        date: Some(date),
        details: json!({
            "day_of_week": day_of_week,
            "day_name": date.format("%A").to_string(),
        }),
    })
}

fn overlap_findings(
    who: &EmployeeRef,
    span: &ShiftSpan,
    existing: &[&Shift],
) -> Vec<ComplianceFinding> {
    existing
        .iter()
        .filter(|shift| span.overlaps(&ShiftSpan::from(**shift)))
        .map(|shift| ComplianceFinding {
            kind: FindingKind::ShiftOverlap,
            severity: Severity::Error,
            message: format!(
                "Shift overlaps with existing shift ({}-{})",
                shift.start_time, shift.end_time
            ),
            employee_id: Some(who.id),
            employee_name: who.name.clone(),
            date: Some(span.date),
            details: json!({
                "proposed_start": span.start_time,
                "proposed_end": span.end_time,
                "existing_start": shift.start_time,
                "existing_end": shift.end_time,
                "existing_shift_id": shift.id,
            }),
        })
        .collect()
}

// endregion

/// One employee's week as reported by `employee_status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeWeekStatus {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub week_start: NaiveDate,
    pub total_hours: f64,
    pub max_hours: f64,
    pub hours_remaining: f64,
    pub days_worked: usize,
    pub max_days: u32,
    pub days_remaining: u32,
    pub is_at_limit: bool,
    pub shifts: Vec<ShiftSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShiftSummary {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub hours: f64,
}

/// Deterministic validator for labor-rule invariants.
///
/// Holds no state beyond its thresholds; every evaluation reads the current
/// persisted shifts through the repository and the employee constraints
/// through the workforce context.
pub struct ComplianceEngine {
    shift_repo: Arc<dyn ShiftRepository>,
    schedule_repo: Arc<dyn ScheduleRepository>,
    workforce: Arc<dyn WorkforceClient>,
    rules: ComplianceRules,
}

impl ComplianceEngine {
    pub fn new(
        shift_repo: Arc<dyn ShiftRepository>,
        schedule_repo: Arc<dyn ScheduleRepository>,
        workforce: Arc<dyn WorkforceClient>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            shift_repo,
            schedule_repo,
            workforce,
            rules: ComplianceRules::from_config(config),
        }
    }

    pub fn rules(&self) -> &ComplianceRules {
        &self.rules
    }

    /// Runs every check against a proposed shift. `exclude_shift_id` keeps
    /// an update from being compared against its own persisted row.
    #[tracing::instrument(skip(self, proposed))]
    pub async fn validate_shift(
        &self,
        proposed: &ProposedShift,
        exclude_shift_id: Option<Uuid>,
    ) -> Result<ComplianceReport, SchedulingServiceError> {
        let week_start = shared::time::monday_of(proposed.date);
        let employee = self.workforce.get_employee(proposed.employee_id).await?;
        let who = EmployeeRef {
            id: employee.id,
            name: Some(employee.full_name()),
        };

        let existing: Vec<Shift> = self
            .shift_repo
            .in_week(proposed.employee_id, week_start)
            .await?
            .into_iter()
            .filter(|s| Some(s.id) != exclude_shift_id)
            .collect();

        let context = self
            .workforce
            .get_scheduling_context(employee.store_id, week_start)
            .await?;
        let employee_ctx = context
            .employees
            .iter()
            .find(|e| e.employee.id == proposed.employee_id);
        let availability = employee_ctx.map_or(&[] as &[Availability], |e| e.availability.as_slice());
        let time_off = employee_ctx.map_or(&[] as &[TimeOffWindow], |e| e.time_off.as_slice());

        let proposed_span = ShiftSpan::from(proposed);
        let mut findings = Vec::new();

        // Daily hours: persisted same-date shifts plus the proposal
        let mut day_spans: Vec<ShiftSpan> = existing
            .iter()
            .filter(|s| s.date == proposed.date)
            .map(ShiftSpan::from)
            .collect();
        day_spans.push(proposed_span);
        findings.extend(daily_hours_finding(
            &self.rules,
            &who,
            proposed.date,
            &day_spans,
        ));

        // Weekly hours: the whole week plus the proposal
        let mut week_spans: Vec<ShiftSpan> = existing.iter().map(ShiftSpan::from).collect();
        week_spans.push(proposed_span);
        findings.extend(weekly_hours_finding(
            &self.rules,
            &who,
            week_start,
            &week_spans,
        ));

        let work_dates: BTreeSet<NaiveDate> = existing
            .iter()
            .map(|s| s.date)
            .chain(std::iter::once(proposed.date))
            .collect();
        findings.extend(consecutive_days_finding(
            &self.rules,
            &who,
            week_start,
            &work_dates,
        ));

        findings.extend(break_finding(&self.rules, &who, &proposed_span));
        findings.extend(time_off_finding(&who, proposed.date, time_off));
        findings.extend(availability_finding(&who, proposed.date, availability));

        let same_day: Vec<&Shift> = existing.iter().filter(|s| s.date == proposed.date).collect();
        findings.extend(overlap_findings(&who, &proposed_span, &same_day));

        Ok(ComplianceReport::from_findings(findings))
    }

    /// Validates every shift in a schedule, deduplicating findings by
    /// (kind, employee, date). An unknown schedule id yields a
    /// non-compliant report rather than an error.
    #[tracing::instrument(skip(self))]
    pub async fn validate_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<ComplianceReport, SchedulingServiceError> {
        let Some(schedule) = self.schedule_repo.find_by_id(schedule_id).await? else {
            return Ok(ComplianceReport::from_findings(vec![ComplianceFinding {
                kind: FindingKind::ScheduleNotFound,
                severity: Severity::Error,
                message: "Schedule not found".to_string(),
                employee_id: None,
                employee_name: None,
                date: None,
                details: json!({ "schedule_id": schedule_id }),
            }]));
        };

        let week_start = schedule.week_start;
        let shifts = self.shift_repo.for_schedule(schedule_id).await?;
        let context = self
            .workforce
            .get_scheduling_context(schedule.store_id, week_start)
            .await?;

        let mut by_employee: BTreeMap<Uuid, Vec<&Shift>> = BTreeMap::new();
        for shift in &shifts {
            by_employee.entry(shift.employee_id).or_default().push(shift);
        }

        let mut findings = Vec::new();

        for (employee_id, employee_shifts) in &by_employee {
            let employee_ctx = context
                .employees
                .iter()
                .find(|e| e.employee.id == *employee_id);
            let who = EmployeeRef {
                id: *employee_id,
                name: employee_ctx.map(|e| e.employee.full_name()),
            };
            let availability = employee_ctx.map_or(&[] as &[Availability], |e| e.availability.as_slice());
            let time_off = employee_ctx.map_or(&[] as &[TimeOffWindow], |e| e.time_off.as_slice());

            // Weekly totals consider every persisted shift in the week,
            // not only the ones belonging to this schedule.
            let week_shifts = self.shift_repo.in_week(*employee_id, week_start).await?;
            let week_spans: Vec<ShiftSpan> = week_shifts.iter().map(ShiftSpan::from).collect();
            findings.extend(weekly_hours_finding(
                &self.rules,
                &who,
                week_start,
                &week_spans,
            ));

            let work_dates: BTreeSet<NaiveDate> = week_shifts.iter().map(|s| s.date).collect();
            findings.extend(consecutive_days_finding(
                &self.rules,
                &who,
                week_start,
                &work_dates,
            ));

            let mut by_date: BTreeMap<NaiveDate, Vec<&Shift>> = BTreeMap::new();
            for shift in &week_shifts {
                by_date.entry(shift.date).or_default().push(shift);
            }
            for (date, day_shifts) in &by_date {
                let day_spans: Vec<ShiftSpan> =
                    day_shifts.iter().map(|s| ShiftSpan::from(*s)).collect();
                findings.extend(daily_hours_finding(&self.rules, &who, *date, &day_spans));

                // Pairwise overlap inside the day
                for (i, left) in day_shifts.iter().enumerate() {
                    let left_span = ShiftSpan::from(*left);
                    let later = &day_shifts[i + 1..];
                    findings.extend(overlap_findings(&who, &left_span, later));
                }
            }

            for shift in employee_shifts {
                let span = ShiftSpan::from(*shift);
                findings.extend(break_finding(&self.rules, &who, &span));
                findings.extend(time_off_finding(&who, shift.date, time_off));
                findings.extend(availability_finding(&who, shift.date, availability));
            }
        }

        // Dedup by (kind, employee, date)
        let mut seen = HashSet::new();
        let findings: Vec<ComplianceFinding> = findings
            .into_iter()
            .filter(|f| seen.insert((f.kind, f.employee_id, f.date)))
            .collect();

        Ok(ComplianceReport::from_findings(findings))
    }

    #[tracing::instrument(skip(self))]
    pub async fn employee_status(
        &self,
        employee_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<EmployeeWeekStatus, SchedulingServiceError> {
        if !shared::time::is_monday(week_start) {
            return Err(SchedulingServiceError::BadRequest(
                "week_start must be a Monday".into(),
            ));
        }

        let employee = self.workforce.get_employee(employee_id).await?;
        let mut shifts = self.shift_repo.in_week(employee_id, week_start).await?;
        shifts.sort_by_key(|s| (s.date, s.start_time));

        let total_hours: f64 = shifts.iter().map(Shift::working_hours).sum();
        let days_worked = shifts.iter().map(|s| s.date).collect::<BTreeSet<_>>().len();
        let max_days = self.rules.max_days_per_week;

        Ok(EmployeeWeekStatus {
            employee_id,
            employee_name: employee.full_name(),
            week_start,
            total_hours: round2(total_hours),
            max_hours: self.rules.max_hours_per_week,
            hours_remaining: round2((self.rules.max_hours_per_week - total_hours).max(0.0)),
            days_worked,
            max_days,
            days_remaining: max_days.saturating_sub(days_worked as u32),
            is_at_limit: total_hours >= self.rules.max_hours_per_week
                || days_worked as u32 >= max_days,
            shifts: shifts
                .iter()
                .map(|s| ShiftSummary {
                    date: s.date,
                    start_time: s.start_time,
                    end_time: s.end_time,
                    hours: round2(s.working_hours()),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::{MockScheduleRepository, MockShiftRepository};
    use crate::domain::workforce::MockWorkforceClient;
    use chrono::Utc;
    use shared::types::{
        Employee, EmployeeContext, EmployeeStatus, SchedulingContext, ShiftStatus, Store,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn span(d: NaiveDate, start: NaiveTime, end: NaiveTime, break_minutes: i32) -> ShiftSpan {
        ShiftSpan {
            date: d,
            start_time: start,
            end_time: end,
            break_minutes,
        }
    }

    fn who() -> EmployeeRef {
        EmployeeRef {
            id: Uuid::new_v4(),
            name: Some("Ana Reyes".into()),
        }
    }

    fn rules() -> ComplianceRules {
        ComplianceRules::from_config(&SchedulingConfig::default())
    }

    fn make_shift(employee_id: Uuid, d: NaiveDate, start: NaiveTime, end: NaiveTime, brk: i32) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            employee_id,
            date: d,
            start_time: start,
            end_time: end,
            break_minutes: brk,
            status: ShiftStatus::Scheduled,
            callout_reason: None,
            callout_time: None,
            original_employee_id: None,
            covered_by_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn daily_cap_reports_excess_hours() {
        // Existing five-hour shift plus a proposed four-hour one
        let d = date(2025, 1, 7);
        let spans = [
            span(d, t(9, 0), t(14, 0), 0),
            span(d, t(15, 0), t(19, 0), 0),
        ];
        let finding = daily_hours_finding(&rules(), &who(), d, &spans).unwrap();

        assert_eq!(finding.kind, FindingKind::DailyHoursExceeded);
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.details["excess_hours"], 1.0);
    }

    #[test]
    fn daily_cap_allows_exactly_eight_hours() {
        let d = date(2025, 1, 7);
        let spans = [span(d, t(8, 0), t(17, 0), 60)];
        assert!(daily_hours_finding(&rules(), &who(), d, &spans).is_none());
    }

    #[test]
    fn weekly_hours_error_above_44() {
        let monday = date(2025, 1, 6);
        // Six 8-hour working days
        let spans: Vec<ShiftSpan> = (0..6)
            .map(|i| {
                span(
                    monday + chrono::Duration::days(i),
                    t(8, 0),
                    t(17, 0),
                    60,
                )
            })
            .collect();
        let finding = weekly_hours_finding(&rules(), &who(), monday, &spans).unwrap();

        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.details["excess_hours"], 4.0);
    }

    #[test]
    fn weekly_hours_warning_above_40() {
        let monday = date(2025, 1, 6);
        let mut spans: Vec<ShiftSpan> = (0..5)
            .map(|i| span(monday + chrono::Duration::days(i), t(8, 0), t(17, 0), 60))
            .collect();
        spans.push(span(monday + chrono::Duration::days(5), t(10, 0), t(12, 0), 0));
        let finding = weekly_hours_finding(&rules(), &who(), monday, &spans).unwrap();

        assert_eq!(finding.severity, Severity::Warning);
    }

    #[test]
    fn weekly_hours_quiet_at_forty() {
        let monday = date(2025, 1, 6);
        let spans: Vec<ShiftSpan> = (0..5)
            .map(|i| span(monday + chrono::Duration::days(i), t(8, 0), t(17, 0), 60))
            .collect();
        assert!(weekly_hours_finding(&rules(), &who(), monday, &spans).is_none());
    }

    #[test]
    fn seventh_distinct_day_is_an_error() {
        let monday = date(2025, 1, 6);
        let dates: BTreeSet<NaiveDate> = (0..7)
            .map(|i| monday + chrono::Duration::days(i))
            .collect();
        let finding = consecutive_days_finding(&rules(), &who(), monday, &dates).unwrap();
        assert_eq!(finding.kind, FindingKind::ConsecutiveDaysExceeded);

        let six: BTreeSet<NaiveDate> = dates.into_iter().take(6).collect();
        assert!(consecutive_days_finding(&rules(), &who(), monday, &six).is_none());
    }

    #[test]
    fn break_requirements_follow_elapsed_hours() {
        let d = date(2025, 1, 7);
        let r = rules();

        // 9 elapsed hours demand a full hour
        let nine_short = span(d, t(8, 0), t(17, 0), 30);
        assert!(break_finding(&r, &who(), &nine_short).is_some());
        let nine_ok = span(d, t(8, 0), t(17, 0), 60);
        assert!(break_finding(&r, &who(), &nine_ok).is_none());

        // 8 elapsed hours demand 30 minutes
        let eight_short = span(d, t(8, 0), t(16, 0), 0);
        assert!(break_finding(&r, &who(), &eight_short).is_some());
        let eight_ok = span(d, t(8, 0), t(16, 0), 30);
        assert!(break_finding(&r, &who(), &eight_ok).is_none());

        // Short shifts need none
        let short = span(d, t(9, 0), t(14, 0), 0);
        assert!(break_finding(&r, &who(), &short).is_none());
    }

    #[test]
    fn time_off_blocks_the_date() {
        let windows = [TimeOffWindow {
            start_date: date(2025, 1, 7),
            end_date: date(2025, 1, 9),
        }];
        assert!(time_off_finding(&who(), date(2025, 1, 8), &windows).is_some());
        assert!(time_off_finding(&who(), date(2025, 1, 10), &windows).is_none());
    }

    #[test]
    fn unavailable_day_is_a_warning_only() {
        let employee_id = Uuid::new_v4();
        let rows = [Availability {
            id: Uuid::new_v4(),
            employee_id,
            day_of_week: 1,
            is_available: false,
            preferred_start: None,
            preferred_end: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];

        // 2025-01-07 is a Tuesday (day index 1)
        let finding = availability_finding(&who(), date(2025, 1, 7), &rows).unwrap();
        assert_eq!(finding.severity, Severity::Warning);

        // No row means available
        assert!(availability_finding(&who(), date(2025, 1, 8), &rows).is_none());
    }

    #[test]
    fn contained_shift_yields_exactly_one_overlap() {
        let d = date(2025, 1, 7);
        let existing_shift = make_shift(Uuid::new_v4(), d, t(8, 0), t(16, 0), 30);
        let existing = [&existing_shift];

        let proposed = span(d, t(10, 0), t(14, 0), 0);
        let findings = overlap_findings(&who(), &proposed, &existing);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::ShiftOverlap);

        let adjacent = span(d, t(16, 0), t(20, 0), 0);
        assert!(overlap_findings(&who(), &adjacent, &existing).is_empty());
    }

    fn make_employee(store_id: Uuid) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            store_id,
            first_name: "Ana".into(),
            last_name: "Reyes".into(),
            hire_date: date(2024, 3, 1),
            status: EmployeeStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_context(store_id: Uuid, week_start: NaiveDate, employee: Employee) -> SchedulingContext {
        SchedulingContext {
            store: Store {
                id: store_id,
                name: "Downtown".into(),
                code: "DT-01".into(),
                address: None,
                operating_start: t(8, 0),
                operating_end: t(22, 0),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            week_start,
            employees: vec![EmployeeContext {
                employee,
                availability: vec![],
                time_off: vec![],
            }],
        }
    }

    fn engine(
        shift_repo: MockShiftRepository,
        schedule_repo: MockScheduleRepository,
        workforce: MockWorkforceClient,
    ) -> ComplianceEngine {
        ComplianceEngine::new(
            Arc::new(shift_repo),
            Arc::new(schedule_repo),
            Arc::new(workforce),
            &SchedulingConfig::default(),
        )
    }

    #[tokio::test]
    async fn validate_shift_within_limits_is_compliant() {
        let store_id = Uuid::new_v4();
        let employee = make_employee(store_id);
        let employee_id = employee.id;

        let mut workforce = MockWorkforceClient::new();
        let employee_clone = employee.clone();
        workforce
            .expect_get_employee()
            .returning(move |_| Ok(employee_clone.clone()));
        workforce
            .expect_get_scheduling_context()
            .returning(move |sid, week| Ok(make_context(sid, week, employee.clone())));

        let mut shift_repo = MockShiftRepository::new();
        shift_repo.expect_in_week().returning(|_, _| Ok(vec![]));

        let engine = engine(shift_repo, MockScheduleRepository::new(), workforce);
        let proposed = ProposedShift {
            employee_id,
            date: date(2025, 1, 7),
            start_time: t(8, 0),
            end_time: t(16, 0),
            break_minutes: 30,
        };

        let report = engine.validate_shift(&proposed, None).await.unwrap();
        assert!(report.is_compliant);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn validate_shift_catches_daily_cap_breach() {
        let store_id = Uuid::new_v4();
        let employee = make_employee(store_id);
        let employee_id = employee.id;
        let d = date(2025, 1, 7);

        let mut workforce = MockWorkforceClient::new();
        let employee_clone = employee.clone();
        workforce
            .expect_get_employee()
            .returning(move |_| Ok(employee_clone.clone()));
        workforce
            .expect_get_scheduling_context()
            .returning(move |sid, week| Ok(make_context(sid, week, employee.clone())));

        let mut shift_repo = MockShiftRepository::new();
        shift_repo.expect_in_week().returning(move |eid, _| {
            Ok(vec![make_shift(eid, d, t(9, 0), t(14, 0), 0)])
        });

        let engine = engine(shift_repo, MockScheduleRepository::new(), workforce);
        let proposed = ProposedShift {
            employee_id,
            date: d,
            start_time: t(15, 0),
            end_time: t(19, 0),
            break_minutes: 0,
        };

        let report = engine.validate_shift(&proposed, None).await.unwrap();
        assert!(!report.is_compliant);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, FindingKind::DailyHoursExceeded);
        assert_eq!(report.violations[0].details["excess_hours"], 1.0);
    }

    #[tokio::test]
    async fn validate_schedule_missing_yields_synthetic_violation() {
        let mut schedule_repo = MockScheduleRepository::new();
        schedule_repo.expect_find_by_id().returning(|_| Ok(None));

        let engine = engine(
            MockShiftRepository::new(),
            schedule_repo,
            MockWorkforceClient::new(),
        );

        let report = engine.validate_schedule(Uuid::new_v4()).await.unwrap();
        assert!(!report.is_compliant);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, FindingKind::ScheduleNotFound);
    }

    #[tokio::test]
    async fn employee_status_reports_remaining_budget() {
        let store_id = Uuid::new_v4();
        let employee = make_employee(store_id);
        let employee_id = employee.id;
        let monday = date(2025, 1, 6);

        let mut workforce = MockWorkforceClient::new();
        workforce
            .expect_get_employee()
            .returning(move |_| Ok(employee.clone()));

        let mut shift_repo = MockShiftRepository::new();
        shift_repo.expect_in_week().returning(move |eid, week| {
            Ok(vec![
                make_shift(eid, week, t(8, 0), t(16, 0), 30),
                make_shift(eid, week + chrono::Duration::days(1), t(8, 0), t(17, 0), 60),
            ])
        });

        let engine = engine(shift_repo, MockScheduleRepository::new(), workforce);
        let status = engine.employee_status(employee_id, monday).await.unwrap();

        assert_eq!(status.total_hours, 15.5);
        assert_eq!(status.hours_remaining, 28.5);
        assert_eq!(status.days_worked, 2);
        assert_eq!(status.days_remaining, 4);
        assert!(!status.is_at_limit);
        assert_eq!(status.shifts.len(), 2);
    }
}
