#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The CDCL solver and the narrow interface the control channel drives.

use crate::sat::assignment::{Assignment, Solutions, VarState};
use crate::sat::clause::Clause;
use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::conflict_analysis::analyse;
use crate::sat::literal::{Literal, Variable};
use crate::sat::phase_saving::SavedPhases;
use crate::sat::restarter::{Luby, Never, Restarter};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::Vsids;
use crate::sat::watch::Watches;
use crate::tether::Tether;
use log::{debug, trace};
use rustc_hash::FxHashSet;

/// The capability surface the control channel needs from a solver.
///
/// Directive application, definition compilation and snapshot export all
/// go through this trait, so the channel can be exercised against a mock
/// as well as against [`Cdcl`].
pub trait SolverControl {
    fn num_variables(&self) -> usize;

    /// The current partial assignment in chronological order, with its
    /// decision-level limits.
    fn trail(&self) -> &Trail;

    fn var_value(&self, var: Variable) -> VarState;

    fn set_var_value(&mut self, var: Variable, state: VarState);

    /// Per-variable branching activity.
    fn activity(&self) -> &[f64];

    /// Resolves a clause reference to its body.
    fn clause(&self, cref: ClauseRef) -> &Clause;

    /// Creates a fresh variable seeded with a branching-sign hint
    /// (`Some(true)` prefers the negative literal).
    fn new_variable(&mut self, hint: Option<bool>) -> Variable;

    /// Adds a clause to the arena. May enqueue a unit consequence as a
    /// side effect.
    fn submit_clause(&mut self, literals: Vec<Literal>) -> ClauseRef;

    /// Sets the branching-sign hint for a variable (`Some(true)` prefers
    /// the negative literal, `None` clears the preference).
    fn set_polarity_hint(&mut self, var: Variable, hint: Option<bool>);

    fn user_polarity_hint(&self, var: Variable) -> Option<bool>;

    fn set_precedence(&mut self, var: Variable, weight: i32);

    /// Rebuilds the variable-order structure from scratch; required after
    /// precedence edits, which leave any cached order stale.
    fn rebuild_variable_order(&mut self);

    /// Runs unit propagation, returning the conflicting clause if one is
    /// found.
    fn propagate(&mut self) -> Option<ClauseRef>;

    /// The best-known clause, when one is tracked.
    fn best_clause_ref(&self) -> Option<ClauseRef>;

    /// Variables released for reuse. Definitions cannot be compiled while
    /// any exist.
    fn free_variable_count(&self) -> usize;
}

/// Search counters, reported after solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub restarts: usize,
    pub learnt_clauses: usize,
}

/// A conflict-driven clause-learning solver over a [`Cnf`], generic over
/// its spontaneous-restart schedule.
pub struct Cdcl<R: Restarter = Luby> {
    pub cnf: Cnf,
    assignment: Assignment,
    trail: Trail,
    watches: Watches,
    order: Vsids,
    phases: SavedPhases,
    polarity_hint: Vec<Option<bool>>,
    restarter: R,
    best_clause: Option<ClauseRef>,
    free_variables: usize,
    stats: SearchStats,
    ok: bool,
    tether: Option<Tether>,
}

impl Cdcl {
    /// A solver with the default Luby restart schedule.
    #[must_use]
    pub fn new(cnf: Cnf) -> Self {
        Self::with_schedule(cnf)
    }
}

impl Cdcl<Never> {
    /// A solver that never restarts on its own; only the control channel
    /// can force one.
    #[must_use]
    pub fn without_restarts(cnf: Cnf) -> Self {
        Self::with_schedule(cnf)
    }
}

impl<R: Restarter> Cdcl<R> {
    #[must_use]
    pub fn with_schedule(cnf: Cnf) -> Self {
        let num_vars = cnf.num_vars;
        let order = Vsids::new(num_vars, &cnf.all_variables());
        let watches = Watches::new(&cnf);

        Self {
            assignment: Assignment::new(num_vars),
            trail: Trail::new(num_vars),
            watches,
            order,
            phases: SavedPhases::new(num_vars),
            polarity_hint: vec![None; num_vars],
            restarter: R::new(),
            best_clause: None,
            free_variables: 0,
            stats: SearchStats::default(),
            ok: true,
            cnf,
            tether: None,
        }
    }

    /// Attaches a control channel whose checkpoints the search will hit.
    pub fn attach_tether(&mut self, tether: Tether) {
        self.tether = Some(tether);
    }

    pub fn detach_tether(&mut self) -> Option<Tether> {
        self.tether.take()
    }

    #[must_use]
    pub const fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Runs the search. `Some` holds a model, `None` means unsatisfiable.
    pub fn solve(&mut self) -> Option<Solutions> {
        if !self.ok || self.cnf.iter().any(Clause::is_empty) {
            return None;
        }
        if !self.enqueue_initial_units() {
            return None;
        }

        loop {
            if let Some(confl) = self.propagate() {
                self.stats.conflicts += 1;
                if self.trail.decision_level() == 0 {
                    self.ok = false;
                    return None;
                }
                self.handle_conflict(confl);
            } else {
                let forced = self.checkpoint_decision();
                if forced && self.trail.decision_level() > 0 {
                    debug!("restart forced over the control channel");
                    self.stats.restarts += 1;
                    self.backtrack_to(0);
                    continue;
                }
                if !self.ok {
                    return None;
                }
                if !self.decide() {
                    return Some(self.assignment.solutions());
                }
            }
        }
    }

    fn enqueue_initial_units(&mut self) -> bool {
        for cref in 0..self.cnf.len() {
            if self.cnf[cref].is_unit() {
                let lit = self.cnf[cref][0];
                match self.assignment.literal_value(lit) {
                    None => self.enqueue(lit, Reason::Propagated(cref)),
                    Some(false) => return false,
                    Some(true) => {}
                }
            }
        }
        true
    }

    fn handle_conflict(&mut self, confl: ClauseRef) {
        let analysis = analyse(&self.cnf, &self.trail, confl);
        self.order.bumps(analysis.bumped.iter().copied());
        self.order.decay();
        self.phases.on_conflict();

        if let Some(mut tether) = self.tether.take() {
            tether.on_conflict(self, confl, &analysis.learnt);
            self.tether = Some(tether);
        }

        let lbd = self.level_count(&analysis.learnt);
        self.backtrack_to(analysis.backtrack_level);
        let cref = self.learn(analysis.learnt, lbd);
        let assert_lit = self.cnf[cref][0];
        self.enqueue(assert_lit, Reason::Propagated(cref));

        if self.restarter.should_restart() {
            self.stats.restarts += 1;
            self.backtrack_to(0);
        }
    }

    fn checkpoint_decision(&mut self) -> bool {
        let Some(mut tether) = self.tether.take() else {
            return false;
        };
        let forced = tether.on_decision_point(self);
        self.tether = Some(tether);
        forced
    }

    fn level_count(&self, literals: &[Literal]) -> u32 {
        let levels: FxHashSet<usize> = literals
            .iter()
            .map(|l| self.trail.level_of(l.variable()))
            .collect();
        levels.len() as u32
    }

    fn learn(&mut self, literals: Vec<Literal>, lbd: u32) -> ClauseRef {
        let mut clause = Clause::new(literals);
        clause.lbd = lbd;
        let len = clause.len();

        let cref = self.cnf.add_clause(clause);
        if len >= 2 {
            let clause = self.cnf[cref].clone();
            self.watches.attach(&clause, cref);
        }

        let best_len = self.best_clause.map(|r| self.cnf[r].len());
        if best_len.is_none_or(|b| len < b) {
            self.best_clause = Some(cref);
        }

        self.stats.learnt_clauses += 1;
        trace!("learnt clause of length {len} (lbd {lbd})");
        cref
    }

    fn enqueue(&mut self, lit: Literal, reason: Reason) {
        debug_assert!(self.assignment.literal_value(lit).is_none());
        self.assignment.assign(lit);
        self.trail.push(lit, reason);
    }

    fn decide(&mut self) -> bool {
        let Some(var) = self.order.pick(&self.assignment) else {
            return false;
        };

        self.stats.decisions += 1;
        let polarity = self.polarity_hint[var as usize].map_or_else(
            || self.phases.next_for(var),
            |sign| !sign,
        );
        self.trail.new_level();
        self.enqueue(Literal::new(var, polarity), Reason::Decision);
        true
    }

    fn backtrack_to(&mut self, level: usize) {
        while self.trail.decision_level() > level {
            let start = self.trail.level_start();
            while self.trail.len() > start {
                if let Some(step) = self.trail.pop() {
                    let var = step.lit.variable();
                    self.phases.save(step.lit);
                    self.assignment.unassign(var);
                    self.order.insert(var);
                }
            }
            self.trail.pop_level();
        }
        self.trail.mark_propagated();
    }

    fn propagate(&mut self) -> Option<ClauseRef> {
        while let Some(lit) = self.trail.next_unpropagated() {
            self.stats.propagations += 1;
            let false_lit = !lit;
            let watchers = self.watches[false_lit].clone();
            for &cref in &watchers {
                if let Some(conflict) = self.process_clause(cref, false_lit) {
                    return Some(conflict);
                }
            }
        }
        None
    }

    fn process_clause(&mut self, cref: ClauseRef, false_lit: Literal) -> Option<ClauseRef> {
        if self.cnf[cref][0] == false_lit {
            self.cnf[cref].swap(0, 1);
        }

        let first = self.cnf[cref][0];
        if self.assignment.literal_value(first) == Some(true) {
            return None;
        }

        if let Some(new_idx) = self.find_new_watch(cref) {
            let new_lit = self.cnf[cref][new_idx];
            self.cnf[cref].swap(1, new_idx);
            self.watches.unwatch(false_lit, cref);
            self.watches.watch(new_lit, cref);
            return None;
        }

        match self.assignment.literal_value(first) {
            None => {
                self.enqueue(first, Reason::Propagated(cref));
                None
            }
            Some(false) => Some(cref),
            Some(true) => None,
        }
    }

    fn find_new_watch(&self, cref: ClauseRef) -> Option<usize> {
        self.cnf[cref]
            .iter()
            .skip(2)
            .position(|&l| self.assignment.literal_value(l) != Some(false))
            .map(|i| i + 2)
    }

    /// Adds a clause mid-search, choosing sound watches under the current
    /// assignment and enqueuing a unit consequence when one exists.
    fn submit(&mut self, literals: Vec<Literal>) -> ClauseRef {
        let mut clause = Clause::new(literals);

        // Move non-false literals to the watch positions.
        let mut front = 0;
        for i in 0..clause.len() {
            if self.assignment.literal_value(clause[i]) != Some(false) {
                clause.swap(front, i);
                front += 1;
                if front == 2 {
                    break;
                }
            }
        }

        let len = clause.len();
        let cref = self.cnf.add_clause(clause);

        match len {
            0 => self.ok = false,
            1 => {
                let lit = self.cnf[cref][0];
                match self.assignment.literal_value(lit) {
                    None => self.enqueue(lit, Reason::Propagated(cref)),
                    Some(false) => self.ok = false,
                    Some(true) => {}
                }
            }
            _ => {
                let clause = self.cnf[cref].clone();
                self.watches.attach(&clause, cref);

                let first = clause[0];
                let second_false = self.assignment.literal_value(clause[1]) == Some(false);
                if second_false {
                    match self.assignment.literal_value(first) {
                        None => self.enqueue(first, Reason::Propagated(cref)),
                        Some(false) => self.ok = false,
                        Some(true) => {}
                    }
                }
            }
        }

        cref
    }
}

impl<R: Restarter> SolverControl for Cdcl<R> {
    fn num_variables(&self) -> usize {
        self.cnf.num_vars
    }

    fn trail(&self) -> &Trail {
        &self.trail
    }

    fn var_value(&self, var: Variable) -> VarState {
        self.assignment[var]
    }

    fn set_var_value(&mut self, var: Variable, state: VarState) {
        self.assignment.set(var, state);
    }

    fn activity(&self) -> &[f64] {
        self.order.activity()
    }

    fn clause(&self, cref: ClauseRef) -> &Clause {
        &self.cnf[cref]
    }

    fn new_variable(&mut self, hint: Option<bool>) -> Variable {
        let var = self.cnf.num_vars as Variable;
        self.cnf.num_vars += 1;
        self.assignment.grow();
        self.trail.grow();
        self.watches.grow();
        self.order.grow();
        self.phases.grow();
        self.polarity_hint.push(hint);
        var
    }

    fn submit_clause(&mut self, literals: Vec<Literal>) -> ClauseRef {
        self.submit(literals)
    }

    fn set_polarity_hint(&mut self, var: Variable, hint: Option<bool>) {
        self.polarity_hint[var as usize] = hint;
    }

    fn user_polarity_hint(&self, var: Variable) -> Option<bool> {
        self.polarity_hint[var as usize]
    }

    fn set_precedence(&mut self, var: Variable, weight: i32) {
        self.order.set_precedence(var, weight);
    }

    fn rebuild_variable_order(&mut self) {
        self.order.rebuild(&self.assignment);
    }

    fn propagate(&mut self) -> Option<ClauseRef> {
        Self::propagate(self)
    }

    fn best_clause_ref(&self) -> Option<ClauseRef> {
        self.best_clause
    }

    fn free_variable_count(&self) -> usize {
        self.free_variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_sat() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![1, -2]]);
        let mut solver = Cdcl::new(cnf.clone());

        let solutions = solver.solve().unwrap();
        assert!(cnf.verify(&solutions));
    }

    #[test]
    fn test_solve_unsat() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]);
        let mut solver = Cdcl::new(cnf);

        assert_eq!(solver.solve(), None);
    }

    #[test]
    fn test_solve_unit_conflict() {
        let cnf = Cnf::new(vec![vec![1], vec![-1]]);
        let mut solver = Cdcl::new(cnf);

        assert_eq!(solver.solve(), None);
    }

    #[test]
    fn test_solve_empty() {
        let mut solver = Cdcl::new(Cnf::new(vec![]));
        assert!(solver.solve().is_some());
    }

    #[test]
    fn test_solve_sat_without_restarts() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 2], vec![1, -2]]);
        let mut solver = Cdcl::without_restarts(cnf.clone());

        let solutions = solver.solve().unwrap();
        assert!(cnf.verify(&solutions));
        assert_eq!(solver.stats().restarts, 0);
    }

    #[test]
    fn test_solve_pigeonhole() {
        // Three pigeons, two holes.
        let cnf = Cnf::new(vec![
            vec![1, 2],
            vec![3, 4],
            vec![5, 6],
            vec![-1, -3],
            vec![-1, -5],
            vec![-3, -5],
            vec![-2, -4],
            vec![-2, -6],
            vec![-4, -6],
        ]);
        let mut solver = Cdcl::new(cnf);

        assert_eq!(solver.solve(), None);
    }

    #[test]
    fn test_new_variable_grows_state() {
        let mut solver = Cdcl::new(Cnf::new(vec![vec![1, 2]]));

        let var = solver.new_variable(Some(true));
        assert_eq!(var, 2);
        assert_eq!(solver.num_variables(), 3);
        assert_eq!(solver.user_polarity_hint(var), Some(true));
        assert!(solver.var_value(var).is_unassigned());
    }

    #[test]
    fn test_submit_unit_enqueues() {
        let mut solver = Cdcl::new(Cnf::new(vec![vec![1, 2]]));

        solver.submit_clause(vec![Literal::from_dimacs(1)]);
        assert_eq!(solver.var_value(0), VarState::Assigned(true));
        assert_eq!(solver.trail().len(), 1);
    }

    #[test]
    fn test_submit_respects_assignment() {
        let mut solver = Cdcl::new(Cnf::new(vec![vec![1, 2]]));
        let fresh = solver.new_variable(None);
        solver.submit_clause(vec![Literal::from_dimacs(-1)]);

        // 1 is now false, so (1 v fresh) propagates fresh.
        solver.submit_clause(vec![Literal::from_dimacs(1), Literal::new(fresh, true)]);
        assert_eq!(solver.var_value(fresh), VarState::Assigned(true));
    }

    #[test]
    fn test_polarity_hint_steers_decision() {
        let cnf = Cnf::new(vec![vec![1, 2]]);
        let mut solver = Cdcl::new(cnf);

        // Prefer the positive literal of every variable.
        solver.set_polarity_hint(0, Some(false));
        solver.set_polarity_hint(1, Some(false));

        let solutions = solver.solve().unwrap();
        assert!(solutions.contains(1));
        assert!(solutions.contains(2));
    }
}
