#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Decoding and application of directive documents.
//!
//! A directive document is a JSON object. Recognized keys are `polarity`,
//! `precedence`, `restart` and `definitions`; anything else is logged and
//! ignored so newer clients can talk to older solvers. A recognized key
//! with a malformed payload is skipped on its own, and the other keys in
//! the same document still apply.

use crate::sat::assignment::VarState;
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::SolverControl;
use crate::tether::definition::{DefNode, add_definition};
use crate::tether::error::{DirectiveError, TetherError};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// A decoded directive document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions(Map<String, Value>);

impl Instructions {
    /// Decodes a request body.
    ///
    /// # Errors
    /// Fails if the body is not a JSON object.
    pub fn decode(body: &[u8]) -> Result<Self, TetherError> {
        Ok(Self(serde_json::from_slice(body)?))
    }

    /// Applies every recognized directive to the solver, returning whether
    /// a restart was requested. Runs on the solver thread.
    pub fn apply<S: SolverControl>(&self, solver: &mut S) -> bool {
        let mut restart = false;

        for (key, value) in &self.0 {
            match key.as_str() {
                "polarity" => {
                    if let Err(e) = apply_polarity(solver, value) {
                        warn!("{e}");
                    }
                }
                "precedence" => {
                    if let Err(e) = apply_precedence(solver, value) {
                        warn!("{e}");
                    }
                }
                "restart" => match value.as_bool() {
                    Some(requested) => restart |= requested,
                    None => warn!("{}", DirectiveError::ExpectedBoolean("restart")),
                },
                "definitions" => {
                    if let Err(e) = apply_definitions(solver, value) {
                        warn!("{e}");
                    }
                }
                other => warn!("ignoring unrecognized directive key `{other}`"),
            }
        }

        restart
    }
}

/// Sets branching-polarity hints from a prefix of the variables. The
/// payload prefers a literal; the hint API expects a sign, hence the
/// negation. Elements that are not booleans clear the hint.
fn apply_polarity<S: SolverControl>(solver: &mut S, value: &Value) -> Result<(), DirectiveError> {
    let items = value
        .as_array()
        .ok_or(DirectiveError::ExpectedSequence("polarity"))?;

    for (i, item) in items.iter().take(solver.num_variables()).enumerate() {
        solver.set_polarity_hint(i as Variable, item.as_bool().map(|b| !b));
    }
    Ok(())
}

/// Sets user-precedence weights from a prefix of the variables, then
/// rebuilds the variable order, which the edits left stale. Elements that
/// are not integers weigh 0.
fn apply_precedence<S: SolverControl>(solver: &mut S, value: &Value) -> Result<(), DirectiveError> {
    let items = value
        .as_array()
        .ok_or(DirectiveError::ExpectedSequence("precedence"))?;

    for (i, item) in items.iter().take(solver.num_variables()).enumerate() {
        let weight = item.as_i64().map_or(0, |w| w as i32);
        solver.set_precedence(i as Variable, weight);
    }
    solver.rebuild_variable_order();
    Ok(())
}

/// Compiles a batch of definitions into the live search state.
///
/// Assignments from the first decision level on are masked while the
/// definitions go in: each definition is root-level structure, and adding
/// its clauses under deeper assignments could propagate against the
/// clause's unconditional reading. Root-level assignments stay visible.
/// The batch stops at the first failing definition; earlier ones are not
/// rolled back. The masked entries are always restored, propagation is
/// run so the new clauses interact with the restored assignment, and the
/// variable order is rebuilt around the fresh variables.
fn apply_definitions<S: SolverControl>(solver: &mut S, value: &Value) -> Result<(), DirectiveError> {
    let nodes: Vec<DefNode> = serde_json::from_value(value.clone())?;
    if nodes.is_empty() {
        return Ok(());
    }

    let start = solver.trail().lim().first().copied().unwrap_or(0);
    let masked: Vec<Literal> = solver.trail().literals().skip(start).collect();
    for lit in &masked {
        solver.set_var_value(lit.variable(), VarState::Unassigned);
    }

    let mut outcome = Ok(());
    for node in &nodes {
        if let Err(e) = add_definition(solver, node) {
            outcome = Err(e.into());
            break;
        }
    }

    for lit in &masked {
        solver.set_var_value(lit.variable(), VarState::Assigned(lit.polarity()));
    }
    if let Some(conflict) = solver.propagate() {
        debug!("propagation after definitions conflicts on clause {conflict}");
    }
    solver.rebuild_variable_order();

    outcome
}

/// Applies one instruction document read from disk, bypassing the socket
/// layer. Intended for one-shot startup configuration. Returns the restart
/// flag, which callers are free to ignore before search begins.
///
/// # Errors
/// Fails if the file cannot be read or is not a directive document.
pub fn load_instruction_file<S: SolverControl, P: AsRef<Path>>(
    path: P,
    solver: &mut S,
) -> Result<bool, TetherError> {
    let body = fs::read(path)?;
    let instructions = Instructions::decode(&body)?;
    Ok(instructions.apply(solver))
}
