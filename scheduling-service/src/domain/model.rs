use uuid::Uuid;

/// Index of a boolean decision variable in a [`CpModel`].
pub type VarId = usize;

/// What a variable means: "this employee works this template on this day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarTag {
    pub employee_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub day: usize,
    pub template_idx: usize,
}

/// Constraints over boolean variables. Everything the schedule model needs
/// is expressible with these five forms; a solver backend only has to
/// understand this enum, not the scheduling domain.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// The variable must be assigned (manager lock).
    FixTrue(VarId),
    /// The variable must not be assigned (cannot-work override).
    FixFalse(VarId),
    /// At most one of the group may be assigned.
    AtMostOne(Vec<VarId>),
    /// At least one of the group must be assigned (must-work override).
    AtLeastOne(Vec<VarId>),
    /// Weighted sum of assigned variables stays within the bound. Weights
    /// are non-negative integers (working hours at 10x scale).
    WeightedSumLe {
        vars: Vec<VarId>,
        weights: Vec<i64>,
        bound: i64,
    },
    /// The number of groups containing at least one assigned variable stays
    /// within the bound (distinct days worked).
    GroupCountLe {
        groups: Vec<Vec<VarId>>,
        bound: i64,
    },
}

/// A boolean optimization model: tagged variables, a constraint list and a
/// static per-variable objective vector (maximization).
#[derive(Debug, Default)]
pub struct CpModel {
    tags: Vec<VarTag>,
    constraints: Vec<Constraint>,
    objective: Vec<i64>,
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self, tag: VarTag) -> VarId {
        self.tags.push(tag);
        self.objective.push(0);
        self.tags.len() - 1
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Accumulates an objective coefficient onto a variable.
    pub fn add_objective(&mut self, var: VarId, coefficient: i64) {
        self.objective[var] += coefficient;
    }

    pub fn num_vars(&self) -> usize {
        self.tags.len()
    }

    pub fn tag(&self, var: VarId) -> VarTag {
        self.tags[var]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[i64] {
        &self.objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_coefficients_accumulate() {
        let mut model = CpModel::new();
        let v = model.new_var(VarTag {
            employee_id: Uuid::new_v4(),
            day: 0,
            template_idx: 0,
        });
        model.add_objective(v, 100);
        model.add_objective(v, 1);
        assert_eq!(model.objective()[v], 101);
    }
}
