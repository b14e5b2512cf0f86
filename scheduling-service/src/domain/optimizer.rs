use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use shared::types::{Schedule, ScheduleStatus, SchedulingContext, Shift};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::domain::labor::LaborPlanner;
use crate::domain::model::{Constraint, CpModel, VarId, VarTag};
use crate::domain::schedule::{ProposedShift, ScheduleRepository, ShiftRepository};
use crate::domain::solver::{SolveStatus, Solution, solve};
use crate::domain::templates::{SHIFT_TEMPLATES, ShiftTemplate};
use crate::domain::workforce::WorkforceClient;
use crate::error::SchedulingServiceError;

/// Reward for an assignment that fills unmet demand in a slot.
const DEMAND_REWARD: i64 = 100;
/// Penalty per assignment beyond a slot's requirement.
const OVERSTAFF_PENALTY: i64 = -10;
/// Flat encouragement to schedule at all.
const WORK_BONUS: i64 = 1;
/// Soft pull toward a must-work override's preferred template.
const PREFERRED_SHIFT_BONUS: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationStatus {
    Optimal,
    Feasible,
    Infeasible,
    Timeout,
    Error,
}

/// A manager-imposed assignment the model must honor.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LockedShift {
    pub employee_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub day_index: usize,
    /// Index into the shift template catalog.
    pub shift_template_idx: usize,
    #[serde(default)]
    pub reason: String,
}

/// A manager-imposed must-work or cannot-work constraint for one
/// (employee, day).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ManualOverride {
    pub employee_id: Uuid,
    pub day_index: usize,
    #[serde(default)]
    pub must_work: bool,
    #[serde(default)]
    pub cannot_work: bool,
    pub preferred_shift_idx: Option<usize>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlannedShift {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i32,
    pub working_hours: f64,
}

impl PlannedShift {
    pub fn to_proposed(&self) -> ProposedShift {
        ProposedShift {
            employee_id: self.employee_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            break_minutes: self.break_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OptimizationStats {
    pub total_shifts: usize,
    pub total_hours: f64,
    pub employees_scheduled: usize,
    pub total_employees: usize,
    pub coverage_percent: f64,
    pub total_demand_hours: f64,
    pub solve_time_seconds: f64,
    pub locked_shifts_count: usize,
    pub manual_overrides_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OptimizationResult {
    pub status: OptimizationStatus,
    pub message: String,
    pub shifts: Vec<PlannedShift>,
    pub stats: Option<OptimizationStats>,
    pub warnings: Vec<String>,
}

impl OptimizationResult {
    fn plain(status: OptimizationStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            shifts: Vec::new(),
            stats: None,
            warnings: Vec::new(),
        }
    }
}

/// What the week allows for one employee, after availability, approved time
/// off and already-persisted shifts are subtracted.
#[derive(Debug, Clone)]
pub struct EmployeeConstraints {
    pub employee_id: Uuid,
    pub available_days: HashSet<usize>,
    /// Day -> (start_hour, end_hour) preference window.
    pub preferred_hours: HashMap<usize, (i16, i16)>,
    pub max_hours_remaining: f64,
    pub max_days_remaining: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct DemandSlot {
    pub day_index: usize,
    pub hour: i16,
    pub required_pickers: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct OptimizerSettings {
    pub max_hours_per_week: f64,
    pub days_on_per_week: i64,
    pub store_open_hour: i16,
    pub store_close_hour: i16,
}

impl OptimizerSettings {
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            max_hours_per_week: config.max_hours_per_week,
            days_on_per_week: i64::from(config.days_on_per_week),
            store_open_hour: config.store_open_hour,
            store_close_hour: config.store_close_hour,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Templates this employee could work on this day, honoring the store
/// window, the preference window and the remaining weekly hour budget.
fn eligible_templates(
    constraints: &EmployeeConstraints,
    day: usize,
    open_hour: i16,
    close_hour: i16,
) -> Vec<usize> {
    if !constraints.available_days.contains(&day) {
        return Vec::new();
    }

    SHIFT_TEMPLATES
        .iter()
        .enumerate()
        .filter(|(_, template)| {
            if template.start_hour < open_hour || template.end_hour > close_hour {
                return false;
            }
            if let Some((pref_start, pref_end)) = constraints.preferred_hours.get(&day)
                && (template.start_hour < *pref_start || template.end_hour > *pref_end)
            {
                return false;
            }
            template.working_hours() <= constraints.max_hours_remaining
        })
        .map(|(idx, _)| idx)
        .collect()
}

fn hours_scaled(template: &ShiftTemplate) -> i64 {
    (template.working_hours() * 10.0).round() as i64
}

#[derive(Debug)]
pub struct ModelBuild {
    pub model: CpModel,
    pub vars: HashMap<(Uuid, usize, usize), VarId>,
    pub override_notes: Vec<String>,
    pub lock_notes: Vec<String>,
}

/// Assembles the boolean model per the scheme in the module docs: eligible
/// vars, override and lock constraints, the three hard constraint families
/// and the static coverage objective.
pub fn build_model(
    employee_order: &[Uuid],
    constraints_by_employee: &HashMap<Uuid, EmployeeConstraints>,
    demand_slots: &[DemandSlot],
    locked_shifts: &[LockedShift],
    manual_overrides: &[ManualOverride],
    settings: &OptimizerSettings,
) -> Result<ModelBuild, SchedulingServiceError> {
    for lock in locked_shifts {
        if lock.day_index > 6 || lock.shift_template_idx >= SHIFT_TEMPLATES.len() {
            return Err(SchedulingServiceError::BadRequest(format!(
                "Locked shift out of range: day {} template {}",
                lock.day_index, lock.shift_template_idx
            )));
        }
        if !constraints_by_employee.contains_key(&lock.employee_id) {
            return Err(SchedulingServiceError::BadRequest(format!(
                "Locked shift references employee {} not on this store's roster",
                lock.employee_id
            )));
        }
    }
    for r#override in manual_overrides {
        if r#override.day_index > 6 {
            return Err(SchedulingServiceError::BadRequest(format!(
                "Override day_index out of range: {}",
                r#override.day_index
            )));
        }
    }

    let mut model = CpModel::new();
    let mut vars: HashMap<(Uuid, usize, usize), VarId> = HashMap::new();

    // Eligible decision variables, in deterministic employee/day/template
    // order so objective enumeration is stable.
    for &employee_id in employee_order {
        let constraints = &constraints_by_employee[&employee_id];
        for day in 0..7 {
            for template_idx in eligible_templates(
                constraints,
                day,
                settings.store_open_hour,
                settings.store_close_hour,
            ) {
                let var = model.new_var(VarTag {
                    employee_id,
                    day,
                    template_idx,
                });
                vars.insert((employee_id, day, template_idx), var);
            }
        }
    }

    // Manual overrides
    let mut override_notes = Vec::new();
    for r#override in manual_overrides {
        let employee_id = r#override.employee_id;
        let day = r#override.day_index;
        let day_vars: Vec<VarId> = (0..SHIFT_TEMPLATES.len())
            .filter_map(|t| vars.get(&(employee_id, day, t)).copied())
            .collect();

        if r#override.cannot_work {
            for var in &day_vars {
                model.add(Constraint::FixFalse(*var));
            }
            if !day_vars.is_empty() {
                override_notes.push(format!("Override: employee {employee_id} blocked from day {day}"));
            }
        } else if r#override.must_work && !day_vars.is_empty() {
            model.add(Constraint::AtLeastOne(day_vars.clone()));
            override_notes.push(format!("Override: employee {employee_id} required on day {day}"));

            if let Some(preferred) = r#override.preferred_shift_idx
                && let Some(&var) = vars.get(&(employee_id, day, preferred))
            {
                model.add_objective(var, PREFERRED_SHIFT_BONUS);
            }
        }
    }

    // Locked shifts: the variable is created even if eligibility pruned it,
    // then pinned. Conflicts surface as infeasibility, not silent drops.
    let mut lock_notes = Vec::new();
    for lock in locked_shifts {
        let key = (lock.employee_id, lock.day_index, lock.shift_template_idx);
        let var = *vars.entry(key).or_insert_with(|| {
            model.new_var(VarTag {
                employee_id: lock.employee_id,
                day: lock.day_index,
                template_idx: lock.shift_template_idx,
            })
        });
        model.add(Constraint::FixTrue(var));
        lock_notes.push(format!(
            "Locked: employee {} on day {} with shift template {}",
            lock.employee_id, lock.day_index, lock.shift_template_idx
        ));
    }

    // At most one shift per employee per day; distinct-day and weekly-hour
    // caps per employee.
    for &employee_id in employee_order {
        let constraints = &constraints_by_employee[&employee_id];

        let mut day_groups: Vec<Vec<VarId>> = Vec::new();
        let mut all_vars: Vec<VarId> = Vec::new();
        let mut weights: Vec<i64> = Vec::new();

        for day in 0..7 {
            let day_vars: Vec<VarId> = (0..SHIFT_TEMPLATES.len())
                .filter_map(|t| vars.get(&(employee_id, day, t)).copied())
                .collect();
            if day_vars.is_empty() {
                continue;
            }
            if day_vars.len() > 1 {
                model.add(Constraint::AtMostOne(day_vars.clone()));
            }
            for &var in &day_vars {
                all_vars.push(var);
                weights.push(hours_scaled(&SHIFT_TEMPLATES[model.tag(var).template_idx]));
            }
            day_groups.push(day_vars);
        }

        if day_groups.is_empty() {
            continue;
        }

        let max_days = constraints
            .max_days_remaining
            .min(settings.days_on_per_week);
        model.add(Constraint::GroupCountLe {
            groups: day_groups,
            bound: max_days,
        });

        let max_hours = constraints
            .max_hours_remaining
            .min(settings.max_hours_per_week);
        model.add(Constraint::WeightedSumLe {
            vars: all_vars,
            weights,
            bound: (max_hours * 10.0).round() as i64,
        });
    }

    // Objective: fill each demand slot up to its requirement, penalize
    // overstaffing, and nudge toward scheduling at all. Covering variables
    // are enumerated in fixed employee/template order.
    for slot in demand_slots {
        let required = slot.required_pickers as i64;
        let mut position = 0;
        for &employee_id in employee_order {
            for template_idx in 0..SHIFT_TEMPLATES.len() {
                let Some(&var) = vars.get(&(employee_id, slot.day_index, template_idx)) else {
                    continue;
                };
                if !SHIFT_TEMPLATES[template_idx].covers(slot.hour) {
                    continue;
                }
                let coefficient = if position < required {
                    DEMAND_REWARD
                } else {
                    OVERSTAFF_PENALTY
                };
                model.add_objective(var, coefficient);
                position += 1;
            }
        }
    }

    for var in 0..model.num_vars() {
        model.add_objective(var, WORK_BONUS);
    }

    Ok(ModelBuild {
        model,
        vars,
        override_notes,
        lock_notes,
    })
}

/// Coverage achieved by a set of assignments: sum over slots of
/// min(assigned, required), against the total requirement.
pub fn coverage_percent(assigned_tags: &[VarTag], demand_slots: &[DemandSlot]) -> (f64, f64) {
    let total_demand: f64 = demand_slots.iter().map(|s| s.required_pickers).sum();

    let mut covered = 0.0;
    for slot in demand_slots {
        let count = assigned_tags
            .iter()
            .filter(|tag| tag.day == slot.day_index && SHIFT_TEMPLATES[tag.template_idx].covers(slot.hour))
            .count() as f64;
        covered += count.min(slot.required_pickers);
    }

    let percent = if total_demand > 0.0 {
        covered / total_demand * 100.0
    } else {
        100.0
    };
    (percent, total_demand)
}

pub struct OptimizeParams {
    pub store_id: Uuid,
    pub week_start: NaiveDate,
    pub timeout: Duration,
    pub min_coverage_percent: f64,
    pub locked_shifts: Vec<LockedShift>,
    pub manual_overrides: Vec<ManualOverride>,
    pub solver_workers: usize,
}

/// Builds and solves the weekly assignment model for one store.
pub struct ScheduleOptimizer {
    workforce: Arc<dyn WorkforceClient>,
    labor: Arc<LaborPlanner>,
    schedule_repo: Arc<dyn ScheduleRepository>,
    shift_repo: Arc<dyn ShiftRepository>,
    settings: OptimizerSettings,
}

impl ScheduleOptimizer {
    pub fn new(
        workforce: Arc<dyn WorkforceClient>,
        labor: Arc<LaborPlanner>,
        schedule_repo: Arc<dyn ScheduleRepository>,
        shift_repo: Arc<dyn ShiftRepository>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            workforce,
            labor,
            schedule_repo,
            shift_repo,
            settings: OptimizerSettings::from_config(config),
        }
    }

    pub fn shift_templates(&self) -> &'static [ShiftTemplate] {
        &SHIFT_TEMPLATES
    }

    async fn employee_constraints(
        &self,
        context: &SchedulingContext,
    ) -> Result<HashMap<Uuid, EmployeeConstraints>, SchedulingServiceError> {
        let week_start = context.week_start;
        let mut by_employee = HashMap::new();

        for employee_ctx in &context.employees {
            let employee_id = employee_ctx.employee.id;

            let mut available_days: HashSet<usize> = (0..7).collect();
            let mut preferred_hours = HashMap::new();

            for row in &employee_ctx.availability {
                let day = row.day_of_week as usize;
                if !row.is_available {
                    available_days.remove(&day);
                } else if let (Some(start), Some(end)) = (row.preferred_start, row.preferred_end) {
                    use chrono::Timelike;
                    preferred_hours.insert(day, (start.hour() as i16, end.hour() as i16));
                }
            }

            for (offset, date) in shared::time::week_dates(week_start).into_iter().enumerate() {
                if employee_ctx.time_off.iter().any(|w| w.contains(date)) {
                    available_days.remove(&offset);
                }
            }

            let existing = self.shift_repo.in_week(employee_id, week_start).await?;
            let existing_hours: f64 = existing.iter().map(Shift::working_hours).sum();
            let existing_days = existing
                .iter()
                .map(|s| s.date)
                .collect::<HashSet<_>>()
                .len() as i64;

            by_employee.insert(
                employee_id,
                EmployeeConstraints {
                    employee_id,
                    available_days,
                    preferred_hours,
                    max_hours_remaining: (self.settings.max_hours_per_week - existing_hours)
                        .max(0.0),
                    max_days_remaining: (self.settings.days_on_per_week - existing_days).max(0),
                },
            );
        }

        Ok(by_employee)
    }

    async fn demand_slots(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<DemandSlot>, SchedulingServiceError> {
        let mut slots = Vec::new();
        for (day_index, date) in shared::time::week_dates(week_start).into_iter().enumerate() {
            let requirements = self.labor.hourly_requirements(store_id, date).await?;
            for (hour, required) in requirements {
                if required > 0.0 {
                    slots.push(DemandSlot {
                        day_index,
                        hour,
                        required_pickers: required,
                    });
                }
            }
        }
        Ok(slots)
    }

    #[tracing::instrument(skip(self, params), fields(store_id = %params.store_id, week_start = %params.week_start))]
    pub async fn optimize(
        &self,
        params: OptimizeParams,
    ) -> Result<OptimizationResult, SchedulingServiceError> {
        if !shared::time::is_monday(params.week_start) {
            return Err(SchedulingServiceError::BadRequest(
                "week_start must be a Monday".into(),
            ));
        }

        if self
            .schedule_repo
            .find_with_status(params.store_id, params.week_start, ScheduleStatus::Published)
            .await?
            .is_some()
        {
            return Err(SchedulingServiceError::Conflict(
                "A published schedule already exists for this week. Unpublish it first.".into(),
            ));
        }

        let context = self
            .workforce
            .get_scheduling_context(params.store_id, params.week_start)
            .await?;

        if context.employees.is_empty() {
            return Ok(OptimizationResult::plain(
                OptimizationStatus::Error,
                "No active employees found for this store",
            ));
        }

        let employee_order: Vec<Uuid> =
            context.employees.iter().map(|e| e.employee.id).collect();
        let employee_names: HashMap<Uuid, String> = context
            .employees
            .iter()
            .map(|e| (e.employee.id, e.employee.full_name()))
            .collect();

        let constraints = self.employee_constraints(&context).await?;
        let demand_slots = self.demand_slots(params.store_id, params.week_start).await?;

        if demand_slots.is_empty() {
            let mut result = OptimizationResult::plain(
                OptimizationStatus::Feasible,
                "No demand forecast found - returning empty schedule",
            );
            result.warnings.push("No demand forecast data available".to_string());
            return Ok(result);
        }

        let build = build_model(
            &employee_order,
            &constraints,
            &demand_slots,
            &params.locked_shifts,
            &params.manual_overrides,
            &self.settings,
        )?;

        let timeout = params.timeout;
        let workers = params.solver_workers;
        let model = build.model;
        let (model, solution) = tokio::task::spawn_blocking(move || {
            let solution = solve(&model, timeout, workers);
            (model, solution)
        })
        .await
        .map_err(|e| SchedulingServiceError::Internal(format!("Solver task failed: {e}")))?;

        let (status, message) = match solution.status {
            SolveStatus::Optimal => (OptimizationStatus::Optimal, "Optimal schedule found"),
            SolveStatus::Feasible => (
                OptimizationStatus::Feasible,
                "Feasible schedule found (may not be optimal)",
            ),
            SolveStatus::Infeasible => {
                let mut result = OptimizationResult::plain(
                    OptimizationStatus::Infeasible,
                    "No feasible schedule exists with current constraints",
                );
                result.warnings.push(
                    "Consider: adding more employees, relaxing availability, or reducing demand"
                        .to_string(),
                );
                return Ok(result);
            }
            SolveStatus::Timeout => {
                return Ok(OptimizationResult::plain(
                    OptimizationStatus::Timeout,
                    format!("Optimization timed out after {} seconds", timeout.as_secs()),
                ));
            }
        };

        self.extract(
            status,
            message,
            &model,
            &solution,
            &context,
            &employee_names,
            &demand_slots,
            &params,
            &build.override_notes,
            &build.lock_notes,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn extract(
        &self,
        status: OptimizationStatus,
        message: &str,
        model: &CpModel,
        solution: &Solution,
        context: &SchedulingContext,
        employee_names: &HashMap<Uuid, String>,
        demand_slots: &[DemandSlot],
        params: &OptimizeParams,
        override_notes: &[String],
        lock_notes: &[String],
    ) -> Result<OptimizationResult, SchedulingServiceError> {
        let assigned_tags: Vec<VarTag> =
            solution.assigned.iter().map(|&v| model.tag(v)).collect();

        let mut shifts = Vec::with_capacity(assigned_tags.len());
        let mut total_hours = 0.0;
        let mut shift_counts: HashMap<Uuid, usize> = HashMap::new();

        for tag in &assigned_tags {
            let template = &SHIFT_TEMPLATES[tag.template_idx];
            let date = params.week_start + chrono::Duration::days(tag.day as i64);
            shifts.push(PlannedShift {
                employee_id: tag.employee_id,
                employee_name: employee_names
                    .get(&tag.employee_id)
                    .cloned()
                    .unwrap_or_default(),
                date,
                start_time: template.start_time(),
                end_time: template.end_time(),
                break_minutes: template.break_minutes,
                working_hours: template.working_hours(),
            });
            total_hours += template.working_hours();
            *shift_counts.entry(tag.employee_id).or_insert(0) += 1;
        }

        let (coverage, total_demand) = coverage_percent(&assigned_tags, demand_slots);

        let mut warnings = Vec::new();
        if coverage < params.min_coverage_percent * 100.0 {
            warnings.push(format!(
                "Coverage ({coverage:.1}%) below target ({:.0}%)",
                params.min_coverage_percent * 100.0
            ));
        }

        let unscheduled: Vec<String> = context
            .employees
            .iter()
            .filter(|e| !shift_counts.contains_key(&e.employee.id))
            .map(|e| e.employee.full_name())
            .collect();
        if !unscheduled.is_empty() {
            warnings.push(format!("Employees not scheduled: {}", unscheduled.join(", ")));
        }

        warnings.extend(override_notes.iter().cloned());
        warnings.extend(lock_notes.iter().cloned());

        Ok(OptimizationResult {
            status,
            message: message.to_string(),
            stats: Some(OptimizationStats {
                total_shifts: shifts.len(),
                total_hours: round1(total_hours),
                employees_scheduled: shift_counts.len(),
                total_employees: context.employees.len(),
                coverage_percent: round1(coverage),
                total_demand_hours: round1(total_demand),
                solve_time_seconds: round2(solution.wall_time.as_secs_f64()),
                locked_shifts_count: params.locked_shifts.len(),
                manual_overrides_count: params.manual_overrides.len(),
            }),
            shifts,
            warnings,
        })
    }

    /// Persists optimizer output as the week's draft schedule. Reuses an
    /// existing draft (replacing its shifts) or creates one; atomic either
    /// way.
    #[tracing::instrument(skip(self, shifts))]
    pub async fn apply_schedule(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
        shifts: Vec<ProposedShift>,
        created_by: Uuid,
    ) -> Result<(Schedule, Vec<Shift>), SchedulingServiceError> {
        if !shared::time::is_monday(week_start) {
            return Err(SchedulingServiceError::BadRequest(
                "week_start must be a Monday".into(),
            ));
        }

        self.schedule_repo
            .replace_draft(store_id, week_start, created_by, shifts)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn budget() -> Duration {
        Duration::from_secs(5)
    }

    fn settings() -> OptimizerSettings {
        OptimizerSettings {
            max_hours_per_week: 44.0,
            days_on_per_week: 6,
            store_open_hour: 8,
            store_close_hour: 22,
        }
    }

    fn open_constraints(employee_id: Uuid) -> EmployeeConstraints {
        EmployeeConstraints {
            employee_id,
            available_days: (0..7).collect(),
            preferred_hours: HashMap::new(),
            max_hours_remaining: 44.0,
            max_days_remaining: 6,
        }
    }

    fn demand(day: usize, hour: i16, required: f64) -> DemandSlot {
        DemandSlot {
            day_index: day,
            hour,
            required_pickers: required,
        }
    }

    fn solve_for(
        employees: &[Uuid],
        constraints: &HashMap<Uuid, EmployeeConstraints>,
        demand_slots: &[DemandSlot],
        locks: &[LockedShift],
        overrides: &[ManualOverride],
    ) -> (ModelBuild, Solution) {
        let build = build_model(
            employees,
            constraints,
            demand_slots,
            locks,
            overrides,
            &settings(),
        )
        .unwrap();
        let solution = solve(&build.model, budget(), 1);
        (build, solution)
    }

    #[test]
    fn eligibility_prunes_unavailable_and_window() {
        let employee_id = Uuid::new_v4();
        let mut constraints = open_constraints(employee_id);
        constraints.available_days.remove(&2);
        constraints.preferred_hours.insert(0, (9, 18));

        assert!(eligible_templates(&constraints, 2, 8, 22).is_empty());

        // Monday window 9-18 admits only 9-17 and 10-18
        let monday = eligible_templates(&constraints, 0, 8, 22);
        assert_eq!(monday, vec![1, 2]);

        // Other days admit the full catalog
        assert_eq!(eligible_templates(&constraints, 1, 8, 22).len(), 8);
    }

    #[test]
    fn eligibility_respects_remaining_hours() {
        let employee_id = Uuid::new_v4();
        let mut constraints = open_constraints(employee_id);
        constraints.max_hours_remaining = 7.6;

        // Only the 7.5-working-hour templates fit
        let templates = eligible_templates(&constraints, 0, 8, 22);
        assert_eq!(templates, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn emitted_shifts_match_catalog_and_caps() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let constraints: HashMap<_, _> =
            [(employee_id, open_constraints(employee_id))].into();

        // Demand every day at 10:00 for two pickers
        let demand_slots: Vec<DemandSlot> = (0..7).map(|d| demand(d, 10, 2.0)).collect();

        let (build, solution) = solve_for(&employees, &constraints, &demand_slots, &[], &[]);
        assert_eq!(solution.status, SolveStatus::Optimal);

        let tags: Vec<VarTag> = solution.assigned.iter().map(|&v| build.model.tag(v)).collect();
        assert!(!tags.is_empty());

        let mut hours = 0.0;
        let mut days = HashSet::new();
        for tag in &tags {
            assert!(tag.template_idx < SHIFT_TEMPLATES.len());
            hours += SHIFT_TEMPLATES[tag.template_idx].working_hours();
            days.insert(tag.day);
        }
        assert!(hours <= 44.0 + 1e-9);
        assert!(days.len() <= 6);
    }

    #[test]
    fn locked_shift_appears_in_solution() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let constraints: HashMap<_, _> =
            [(employee_id, open_constraints(employee_id))].into();

        let locks = vec![LockedShift {
            employee_id,
            day_index: 3,
            shift_template_idx: 7,
            reason: String::new(),
        }];

        let (build, solution) =
            solve_for(&employees, &constraints, &[demand(0, 10, 1.0)], &locks, &[]);
        assert_eq!(solution.status, SolveStatus::Optimal);

        let tags: Vec<VarTag> = solution.assigned.iter().map(|&v| build.model.tag(v)).collect();
        assert!(
            tags.iter().any(|t| t.day == 3 && t.template_idx == 7),
            "locked shift must be assigned"
        );
    }

    #[test]
    fn two_locks_same_day_are_infeasible() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let constraints: HashMap<_, _> =
            [(employee_id, open_constraints(employee_id))].into();

        let locks = vec![
            LockedShift {
                employee_id,
                day_index: 2,
                shift_template_idx: 0,
                reason: String::new(),
            },
            LockedShift {
                employee_id,
                day_index: 2,
                shift_template_idx: 5,
                reason: String::new(),
            },
        ];

        let (_, solution) =
            solve_for(&employees, &constraints, &[demand(2, 10, 1.0)], &locks, &[]);
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }

    #[test]
    fn cannot_work_override_blocks_the_day() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let constraints: HashMap<_, _> =
            [(employee_id, open_constraints(employee_id))].into();

        let overrides = vec![ManualOverride {
            employee_id,
            day_index: 0,
            must_work: false,
            cannot_work: true,
            preferred_shift_idx: None,
            reason: String::new(),
        }];

        let (build, solution) = solve_for(
            &employees,
            &constraints,
            &[demand(0, 10, 3.0)],
            &[],
            &overrides,
        );
        assert_eq!(solution.status, SolveStatus::Optimal);

        let tags: Vec<VarTag> = solution.assigned.iter().map(|&v| build.model.tag(v)).collect();
        assert!(tags.iter().all(|t| t.day != 0));
        assert!(!build.override_notes.is_empty());
    }

    #[test]
    fn must_work_override_forces_a_shift() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let constraints: HashMap<_, _> =
            [(employee_id, open_constraints(employee_id))].into();

        let overrides = vec![ManualOverride {
            employee_id,
            day_index: 6,
            must_work: true,
            cannot_work: false,
            preferred_shift_idx: Some(5),
            reason: String::new(),
        }];

        // No demand at all, so only the override motivates an assignment
        let (build, solution) =
            solve_for(&employees, &constraints, &[demand(0, 9, 0.5)], &[], &overrides);
        assert_eq!(solution.status, SolveStatus::Optimal);

        let tags: Vec<VarTag> = solution.assigned.iter().map(|&v| build.model.tag(v)).collect();
        assert!(tags.iter().any(|t| t.day == 6));
        // The preferred-template bonus steers the choice
        assert!(tags.iter().any(|t| t.day == 6 && t.template_idx == 5));
    }

    #[test]
    fn lock_for_unknown_employee_is_rejected() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let constraints: HashMap<_, _> =
            [(employee_id, open_constraints(employee_id))].into();

        let locks = vec![LockedShift {
            employee_id: Uuid::new_v4(),
            day_index: 0,
            shift_template_idx: 0,
            reason: String::new(),
        }];

        let output = build_model(
            &employees,
            &constraints,
            &[demand(0, 10, 1.0)],
            &locks,
            &[],
            &settings(),
        );
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::BadRequest(_)
        ));
    }

    #[test]
    fn coverage_counts_capped_assignments() {
        let employee_id = Uuid::new_v4();
        let tags = [
            VarTag { employee_id, day: 0, template_idx: 0 },
            VarTag { employee_id, day: 0, template_idx: 1 },
        ];
        // Requirement of 1 at 10:00 day 0: both templates cover it but only
        // one counts toward coverage.
        let slots = [demand(0, 10, 1.0), demand(1, 10, 1.0)];
        let (percent, total) = coverage_percent(&tags, &slots);
        assert_eq!(total, 2.0);
        assert_eq!(percent, 50.0);
    }

    #[test]
    fn time_off_day_never_gets_a_shift() {
        let employee_id = Uuid::new_v4();
        let employees = vec![employee_id];
        let mut constraints = open_constraints(employee_id);
        // Approved time off on Tuesday and Wednesday
        constraints.available_days.remove(&1);
        constraints.available_days.remove(&2);
        let constraints: HashMap<_, _> = [(employee_id, constraints)].into();

        let demand_slots: Vec<DemandSlot> = (0..7).map(|d| demand(d, 12, 1.0)).collect();
        let (build, solution) = solve_for(&employees, &constraints, &demand_slots, &[], &[]);

        let tags: Vec<VarTag> = solution.assigned.iter().map(|&v| build.model.tag(v)).collect();
        assert!(tags.iter().all(|t| t.day != 1 && t.day != 2));
    }
}
