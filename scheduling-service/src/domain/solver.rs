use std::time::{Duration, Instant};

use crate::domain::model::{Constraint, CpModel, VarId};

/// Outcome of a solve, before it is mapped onto the optimizer's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Search space exhausted; the incumbent is proven best.
    Optimal,
    /// An incumbent exists but the deadline cut the proof short.
    Feasible,
    /// No assignment satisfies the hard constraints.
    Infeasible,
    /// Deadline hit before any incumbent was found.
    Timeout,
}

#[derive(Debug)]
pub struct Solution {
    pub status: SolveStatus,
    pub assigned: Vec<VarId>,
    pub objective: i64,
    pub wall_time: Duration,
}

/// Deterministic branch-and-bound over the boolean model.
///
/// The constraint graph decomposes into independent components (in the
/// schedule model, one per employee); each component is searched
/// exhaustively with an optimistic bound, and components are fanned out
/// across a small worker pool. A shared wall-clock deadline cancels the
/// proof but never corrupts partial state: a timed-out solve either returns
/// the incumbent found so far or reports `Timeout` with nothing assigned.
pub fn solve(model: &CpModel, time_budget: Duration, workers: usize) -> Solution {
    let started = Instant::now();
    let deadline = started + time_budget;

    if model.num_vars() == 0 {
        return Solution {
            status: SolveStatus::Optimal,
            assigned: Vec::new(),
            objective: 0,
            wall_time: started.elapsed(),
        };
    }

    let components = split_components(model);

    let results: Vec<ComponentResult> = if workers <= 1 || components.len() <= 1 {
        components
            .iter()
            .map(|c| solve_component(c, deadline))
            .collect()
    } else {
        let buckets = workers.min(components.len());
        let mut indexed: Vec<(usize, ComponentResult)> = std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(buckets);
            for worker in 0..buckets {
                let components = &components;
                handles.push(scope.spawn(move || {
                    components
                        .iter()
                        .enumerate()
                        .skip(worker)
                        .step_by(buckets)
                        .map(|(idx, c)| (idx, solve_component(c, deadline)))
                        .collect::<Vec<_>>()
                }));
            }
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("solver worker panicked"))
                .collect()
        });
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, r)| r).collect()
    };

    let infeasible = results.iter().any(|r| r.best.is_none() && !r.timed_out);
    let starved = results.iter().any(|r| r.best.is_none() && r.timed_out);
    let timed_out = results.iter().any(|r| r.timed_out);

    let status = if infeasible {
        SolveStatus::Infeasible
    } else if starved {
        SolveStatus::Timeout
    } else if timed_out {
        SolveStatus::Feasible
    } else {
        SolveStatus::Optimal
    };

    let (assigned, objective) = match status {
        SolveStatus::Optimal | SolveStatus::Feasible => {
            let mut assigned = Vec::new();
            let mut objective = 0;
            for (component, result) in components.iter().zip(&results) {
                if let Some((value, locals)) = &result.best {
                    objective += value;
                    for (local, on) in locals.iter().enumerate() {
                        if *on {
                            assigned.push(component.vars[local]);
                        }
                    }
                }
            }
            assigned.sort_unstable();
            (assigned, objective)
        }
        SolveStatus::Infeasible | SolveStatus::Timeout => (Vec::new(), 0),
    };

    Solution {
        status,
        assigned,
        objective,
        wall_time: started.elapsed(),
    }
}

struct Component {
    /// Global variable ids, ascending; local index = position.
    vars: Vec<VarId>,
    /// Constraints rewritten against local indices.
    constraints: Vec<Constraint>,
    /// Objective coefficients by local index.
    objective: Vec<i64>,
    /// Mutual-exclusion classes derived from at-most-one constraints; each
    /// local var belongs to at most one class. Used for the optimistic
    /// bound: a feasible completion takes at most one var per class.
    exclusion_classes: Vec<Vec<usize>>,
    /// Class index per local var, None when unconstrained by any
    /// at-most-one group.
    class_of: Vec<Option<usize>>,
}

impl Component {
    fn build_exclusion_classes(&mut self) {
        let n = self.vars.len();
        self.class_of = vec![None; n];
        self.exclusion_classes.clear();

        for constraint in &self.constraints {
            let Constraint::AtMostOne(group) = constraint else {
                continue;
            };
            let mut class = Vec::new();
            for &v in group {
                if self.class_of[v].is_none() {
                    self.class_of[v] = Some(self.exclusion_classes.len());
                    class.push(v);
                }
            }
            if !class.is_empty() {
                self.exclusion_classes.push(class);
            }
        }
    }
}

struct ComponentResult {
    timed_out: bool,
    /// Best (objective, assignment-by-local-index) found, if any.
    best: Option<(i64, Vec<bool>)>,
}

fn constraint_vars(constraint: &Constraint) -> Vec<VarId> {
    match constraint {
        Constraint::FixTrue(v) | Constraint::FixFalse(v) => vec![*v],
        Constraint::AtMostOne(vars)
        | Constraint::AtLeastOne(vars)
        | Constraint::WeightedSumLe { vars, .. } => vars.clone(),
        Constraint::GroupCountLe { groups, .. } => groups.iter().flatten().copied().collect(),
    }
}

fn find_root(parent: &mut [usize], v: usize) -> usize {
    let mut root = v;
    while parent[root] != root {
        root = parent[root];
    }
    let mut current = v;
    while parent[current] != root {
        let next = parent[current];
        parent[current] = root;
        current = next;
    }
    root
}

/// Splits the model into connected components of the constraint graph.
fn split_components(model: &CpModel) -> Vec<Component> {
    let n = model.num_vars();
    let mut parent: Vec<usize> = (0..n).collect();

    for constraint in model.constraints() {
        let vars = constraint_vars(constraint);
        if let Some((&first, rest)) = vars.split_first() {
            let first_root = find_root(&mut parent, first);
            for &v in rest {
                let root = find_root(&mut parent, v);
                parent[root] = first_root;
            }
        }
    }

    let mut members: std::collections::BTreeMap<usize, Vec<VarId>> =
        std::collections::BTreeMap::new();
    for v in 0..n {
        let root = find_root(&mut parent, v);
        members.entry(root).or_default().push(v);
    }

    let mut components: Vec<Component> = members
        .into_values()
        .map(|vars| {
            let objective = vars.iter().map(|&v| model.objective()[v]).collect();
            Component {
                constraints: Vec::new(),
                objective,
                vars,
                exclusion_classes: Vec::new(),
                class_of: Vec::new(),
            }
        })
        .collect();

    for constraint in model.constraints() {
        let vars = constraint_vars(constraint);
        let Some(&first) = vars.first() else { continue };
        let component = components
            .iter_mut()
            .find(|c| c.vars.binary_search(&first).is_ok())
            .expect("constraint var belongs to a component");
        component.constraints.push(localize(constraint, &component.vars));
    }

    for component in &mut components {
        component.build_exclusion_classes();
    }

    components
}

fn localize(constraint: &Constraint, vars: &[VarId]) -> Constraint {
    let local = |v: VarId| vars.binary_search(&v).expect("var in component");
    match constraint {
        Constraint::FixTrue(v) => Constraint::FixTrue(local(*v)),
        Constraint::FixFalse(v) => Constraint::FixFalse(local(*v)),
        Constraint::AtMostOne(group) => {
            Constraint::AtMostOne(group.iter().map(|&v| local(v)).collect())
        }
        Constraint::AtLeastOne(group) => {
            Constraint::AtLeastOne(group.iter().map(|&v| local(v)).collect())
        }
        Constraint::WeightedSumLe { vars: group, weights, bound } => Constraint::WeightedSumLe {
            vars: group.iter().map(|&v| local(v)).collect(),
            weights: weights.clone(),
            bound: *bound,
        },
        Constraint::GroupCountLe { groups, bound } => Constraint::GroupCountLe {
            groups: groups
                .iter()
                .map(|g| g.iter().map(|&v| local(v)).collect())
                .collect(),
            bound: *bound,
        },
    }
}

struct Search<'a> {
    component: &'a Component,
    deadline: Instant,
    assignment: Vec<Option<bool>>,
    nodes: u64,
    timed_out: bool,
    best: Option<(i64, Vec<bool>)>,
}

impl<'a> Search<'a> {
    const DEADLINE_CHECK_INTERVAL: u64 = 1024;

    fn run(component: &'a Component, deadline: Instant) -> ComponentResult {
        let mut search = Search {
            component,
            deadline,
            assignment: vec![None; component.vars.len()],
            nodes: 0,
            timed_out: false,
            best: None,
        };
        search.descend(0, 0);
        ComponentResult {
            timed_out: search.timed_out,
            best: search.best,
        }
    }

    fn descend(&mut self, depth: usize, value_so_far: i64) {
        if self.timed_out {
            return;
        }
        self.nodes += 1;
        if self.nodes % Self::DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        if depth == self.component.vars.len() {
            if self.satisfied()
                && self.best.as_ref().is_none_or(|(best, _)| value_so_far > *best)
            {
                let chosen = self.assignment.iter().map(|a| a == &Some(true)).collect();
                self.best = Some((value_so_far, chosen));
            }
            return;
        }

        // Optimistic completion: at most one var per exclusion class plus
        // every unconstrained positive coefficient. Admissible, and tight
        // enough that equal-value template permutations prune immediately.
        let optimistic = value_so_far + self.optimistic_remaining(depth);
        if let Some((best, _)) = &self.best
            && optimistic <= *best
        {
            return;
        }

        let coefficient = self.component.objective[depth];
        let order = if coefficient > 0 { [true, false] } else { [false, true] };

        for value in order {
            self.assignment[depth] = Some(value);
            if self.consistent() {
                let contribution = if value { coefficient } else { 0 };
                self.descend(depth + 1, value_so_far + contribution);
            }
            if self.timed_out {
                self.assignment[depth] = None;
                return;
            }
        }
        self.assignment[depth] = None;
    }

    /// Upper bound on what the still-unassigned vars (indices >= depth,
    /// since assignment follows var order) can add to the objective.
    fn optimistic_remaining(&self, depth: usize) -> i64 {
        let mut total = 0;

        for class in &self.component.exclusion_classes {
            // A class with a committed member cannot take another var
            if class
                .iter()
                .any(|&v| v < depth && self.assignment[v] == Some(true))
            {
                continue;
            }
            let best = class
                .iter()
                .filter(|&&v| v >= depth)
                .map(|&v| self.component.objective[v].max(0))
                .max()
                .unwrap_or(0);
            total += best;
        }

        for v in depth..self.component.vars.len() {
            if self.component.class_of[v].is_none() && self.component.objective[v] > 0 {
                total += self.component.objective[v];
            }
        }

        total
    }

    /// Can the current partial assignment still be completed?
    fn consistent(&self) -> bool {
        self.component.constraints.iter().all(|constraint| {
            match constraint {
                Constraint::FixTrue(v) => self.assignment[*v] != Some(false),
                Constraint::FixFalse(v) => self.assignment[*v] != Some(true),
                Constraint::AtMostOne(group) => {
                    group.iter().filter(|&&v| self.assignment[v] == Some(true)).count() <= 1
                }
                Constraint::AtLeastOne(group) => {
                    !group.iter().all(|&v| self.assignment[v] == Some(false))
                }
                Constraint::WeightedSumLe { vars, weights, bound } => {
                    let used: i64 = vars
                        .iter()
                        .zip(weights)
                        .filter(|&(&v, _)| self.assignment[v] == Some(true))
                        .map(|(_, w)| *w)
                        .sum();
                    used <= *bound
                }
                Constraint::GroupCountLe { groups, bound } => {
                    let used = groups
                        .iter()
                        .filter(|g| g.iter().any(|&v| self.assignment[v] == Some(true)))
                        .count() as i64;
                    used <= *bound
                }
            }
        })
    }

    /// Full-assignment feasibility (identical to `consistent` once every
    /// variable carries a value).
    fn satisfied(&self) -> bool {
        self.consistent()
    }
}

fn solve_component(component: &Component, deadline: Instant) -> ComponentResult {
    Search::run(component, deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::VarTag;
    use uuid::Uuid;

    fn tag(day: usize, template_idx: usize) -> VarTag {
        VarTag {
            employee_id: Uuid::new_v4(),
            day,
            template_idx,
        }
    }

    fn budget() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn empty_model_is_trivially_optimal() {
        let model = CpModel::new();
        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(solution.assigned.is_empty());
    }

    #[test]
    fn takes_positive_vars_and_leaves_negative_ones() {
        let mut model = CpModel::new();
        let good = model.new_var(tag(0, 0));
        let bad = model.new_var(tag(1, 0));
        model.add_objective(good, 100);
        model.add_objective(bad, -10);

        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.assigned, vec![good]);
        assert_eq!(solution.objective, 100);
    }

    #[test]
    fn at_most_one_keeps_the_best_of_the_group() {
        let mut model = CpModel::new();
        let a = model.new_var(tag(0, 0));
        let b = model.new_var(tag(0, 1));
        model.add_objective(a, 40);
        model.add_objective(b, 90);
        model.add(Constraint::AtMostOne(vec![a, b]));

        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.assigned, vec![b]);
    }

    #[test]
    fn conflicting_locks_are_infeasible() {
        let mut model = CpModel::new();
        let a = model.new_var(tag(0, 0));
        let b = model.new_var(tag(0, 1));
        model.add(Constraint::AtMostOne(vec![a, b]));
        model.add(Constraint::FixTrue(a));
        model.add(Constraint::FixTrue(b));

        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.assigned.is_empty());
    }

    #[test]
    fn weighted_sum_bound_limits_selection() {
        let mut model = CpModel::new();
        let vars: Vec<_> = (0..3).map(|d| model.new_var(tag(d, 0))).collect();
        for &v in &vars {
            model.add_objective(v, 100);
        }
        // Each shift is 7.5 hours at 10x scale; cap at 15 hours.
        model.add(Constraint::WeightedSumLe {
            vars: vars.clone(),
            weights: vec![75, 75, 75],
            bound: 150,
        });

        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.assigned.len(), 2);
    }

    #[test]
    fn at_least_one_forces_an_unprofitable_assignment() {
        let mut model = CpModel::new();
        let a = model.new_var(tag(0, 0));
        let b = model.new_var(tag(0, 1));
        model.add_objective(a, -10);
        model.add_objective(b, -5);
        model.add(Constraint::AtMostOne(vec![a, b]));
        model.add(Constraint::AtLeastOne(vec![a, b]));

        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.assigned, vec![b]);
        assert_eq!(solution.objective, -5);
    }

    #[test]
    fn group_count_bound_limits_distinct_days() {
        let mut model = CpModel::new();
        let days: Vec<Vec<VarId>> = (0..3)
            .map(|d| {
                let v = model.new_var(tag(d, 0));
                model.add_objective(v, 100);
                vec![v]
            })
            .collect();
        model.add(Constraint::GroupCountLe {
            groups: days,
            bound: 2,
        });

        let solution = solve(&model, budget(), 1);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.assigned.len(), 2);
    }

    #[test]
    fn independent_employees_solve_in_parallel() {
        let mut model = CpModel::new();
        let mut expected = 0;
        for day in 0..4 {
            let a = model.new_var(tag(day, 0));
            let b = model.new_var(tag(day, 1));
            model.add_objective(a, 50);
            model.add_objective(b, 80);
            model.add(Constraint::AtMostOne(vec![a, b]));
            expected += 80;
        }

        let solution = solve(&model, budget(), 4);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, expected);
    }

    #[test]
    fn zero_budget_times_out_without_partial_state() {
        let mut model = CpModel::new();
        // Enough vars that the search cannot finish before the first
        // deadline check.
        let vars: Vec<_> = (0..24).map(|i| model.new_var(tag(i % 7, i % 8))).collect();
        for &v in &vars {
            model.add_objective(v, 1);
        }
        model.add(Constraint::WeightedSumLe {
            vars: vars.clone(),
            weights: vec![10; vars.len()],
            bound: 60,
        });

        let solution = solve(&model, Duration::from_secs(0), 1);
        assert!(matches!(
            solution.status,
            SolveStatus::Timeout | SolveStatus::Feasible | SolveStatus::Optimal
        ));
        if solution.status == SolveStatus::Timeout {
            assert!(solution.assigned.is_empty());
        }
    }
}
