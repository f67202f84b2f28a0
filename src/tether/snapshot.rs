#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The conflict-time state snapshot returned to clients.

use crate::sat::cnf::ClauseRef;
use crate::sat::literal::Literal;
use crate::sat::solver::SolverControl;
use serde::{Deserialize, Serialize};

/// A self-contained slice of solver state, captured at a conflict.
///
/// Every sequence is encoded in its natural order with no reordering or
/// deduplication; literals use the same integer mapping the instruction
/// protocol decodes. `best_clause` is present only while the solver tracks
/// a best-known clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub confl_clause: Vec<i32>,
    pub trail: Vec<i32>,
    pub trail_lim: Vec<usize>,
    pub learned_clause: Vec<i32>,
    pub activity: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_clause: Option<Vec<i32>>,
}

impl Snapshot {
    pub fn capture<S: SolverControl>(solver: &S, confl: ClauseRef, learnt: &[Literal]) -> Self {
        Self {
            confl_clause: solver.clause(confl).codes(),
            trail: solver.trail().literals().map(Literal::code).collect(),
            trail_lim: solver.trail().lim().to_vec(),
            learned_clause: learnt.iter().map(|l| l.code()).collect(),
            activity: solver.activity().to_vec(),
            best_clause: solver.best_clause_ref().map(|cref| solver.clause(cref).codes()),
        }
    }
}
