//! A scriptable [`SolverControl`] implementation for channel tests.

use crate::sat::assignment::VarState;
use crate::sat::clause::Clause;
use crate::sat::cnf::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::SolverControl;
use crate::sat::trail::{Reason, Trail};

#[derive(Debug, Default)]
pub(crate) struct MockSolver {
    pub values: Vec<VarState>,
    pub hints: Vec<Option<bool>>,
    pub precedence: Vec<i32>,
    pub activity: Vec<f64>,
    pub trail: Trail,
    pub clauses: Vec<Clause>,
    pub submitted: Vec<Vec<Literal>>,
    pub values_at_submit: Vec<Vec<VarState>>,
    pub free_variables: usize,
    pub best_clause: Option<ClauseRef>,
    pub order_rebuilds: usize,
    pub propagate_calls: usize,
}

impl MockSolver {
    pub fn with_vars(num_vars: usize) -> Self {
        Self {
            values: vec![VarState::Unassigned; num_vars],
            hints: vec![None; num_vars],
            precedence: vec![0; num_vars],
            activity: vec![0.0; num_vars],
            trail: Trail::new(num_vars),
            ..Self::default()
        }
    }

    /// Assigns a literal at the current decision level.
    pub fn place(&mut self, lit: Literal) {
        self.values[lit.variable() as usize] = VarState::Assigned(lit.polarity());
        self.trail.push(lit, Reason::Decision);
    }

    /// Opens a decision level and assigns a literal in it.
    pub fn decide(&mut self, lit: Literal) {
        self.trail.new_level();
        self.place(lit);
    }

    pub fn add_clause(&mut self, dimacs: &[i32]) -> ClauseRef {
        self.clauses.push(Clause::from(dimacs));
        self.clauses.len() - 1
    }
}

impl SolverControl for MockSolver {
    fn num_variables(&self) -> usize {
        self.values.len()
    }

    fn trail(&self) -> &Trail {
        &self.trail
    }

    fn var_value(&self, var: Variable) -> VarState {
        self.values[var as usize]
    }

    fn set_var_value(&mut self, var: Variable, state: VarState) {
        self.values[var as usize] = state;
    }

    fn activity(&self) -> &[f64] {
        &self.activity
    }

    fn clause(&self, cref: ClauseRef) -> &Clause {
        &self.clauses[cref]
    }

    fn new_variable(&mut self, hint: Option<bool>) -> Variable {
        let var = self.values.len() as Variable;
        self.values.push(VarState::Unassigned);
        self.hints.push(hint);
        self.precedence.push(0);
        self.activity.push(0.0);
        self.trail.grow();
        var
    }

    fn submit_clause(&mut self, literals: Vec<Literal>) -> ClauseRef {
        self.submitted.push(literals.clone());
        self.values_at_submit.push(self.values.clone());
        self.clauses.push(Clause::new(literals));
        self.clauses.len() - 1
    }

    fn set_polarity_hint(&mut self, var: Variable, hint: Option<bool>) {
        self.hints[var as usize] = hint;
    }

    fn user_polarity_hint(&self, var: Variable) -> Option<bool> {
        self.hints[var as usize]
    }

    fn set_precedence(&mut self, var: Variable, weight: i32) {
        self.precedence[var as usize] = weight;
    }

    fn rebuild_variable_order(&mut self) {
        self.order_rebuilds += 1;
    }

    fn propagate(&mut self) -> Option<ClauseRef> {
        self.propagate_calls += 1;
        None
    }

    fn best_clause_ref(&self) -> Option<ClauseRef> {
        self.best_clause
    }

    fn free_variable_count(&self) -> usize {
        self.free_variables
    }
}
