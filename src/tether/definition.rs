#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Compilation of nested NAND-gate definitions into CNF.
//!
//! A definition node is either a literal leaf or a gate over child nodes,
//! read as the NAND of its children. [`add_definition`] allocates one fresh
//! solver variable per node and submits a full bidirectional Tseitin
//! definition for it, so the fresh variable is constrained to equal the
//! node's value under every assignment.

use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::SolverControl;
use crate::tether::error::DefinitionError;
use itertools::Itertools;
use serde::Deserialize;

/// A nested gate description as it arrives off the wire: an integer is a
/// literal code, an array is the NAND of its elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DefNode {
    Literal(i64),
    Gate(Vec<DefNode>),
}

/// `true` iff every leaf decodes to a known literal: a non-negative code
/// whose variable the solver already tracks. Any violation fails the whole
/// definition, not just the offending leaf.
pub fn validate<S: SolverControl>(solver: &S, node: &DefNode) -> bool {
    match node {
        DefNode::Literal(code) => Literal::from_code(*code)
            .is_some_and(|lit| (lit.variable() as usize) < solver.num_variables()),
        DefNode::Gate(children) => children.iter().all(|child| validate(solver, child)),
    }
}

/// A branching-preference estimate for the node, used only to seed the
/// fresh variable's initial hint. This is a heuristic over the existing
/// user hints, not a logical evaluation.
pub fn estimate_polarity<S: SolverControl>(solver: &S, node: &DefNode) -> Option<bool> {
    match node {
        DefNode::Literal(code) => {
            let lit = Literal::from_code(*code)?;
            let hint = solver.user_polarity_hint(lit.variable());
            if lit.is_negated() { hint.map(|b| !b) } else { hint }
        }
        DefNode::Gate(children) => {
            let mut saw_unknown = false;
            for child in children {
                match estimate_polarity(solver, child) {
                    // One false input already settles a NAND.
                    Some(false) => return Some(true),
                    None => saw_unknown = true,
                    Some(true) => {}
                }
            }
            if saw_unknown { None } else { Some(false) }
        }
    }
}

/// The CNF asserting the node's value: with `sign` false the clauses
/// assert the node true, with `sign` true they assert it false.
///
/// A leaf yields its literal (or the negation). A gate compiles each child
/// with the opposite sign; asserting the gate false concatenates the
/// children's clause sets, while asserting it true distributes over them:
/// one clause per way of picking a clause from each child's set, so the
/// result has the product of the children's set sizes.
///
/// # Errors
/// Fails on a leaf code with no literal reading.
pub fn compile_clauses(node: &DefNode, sign: bool) -> Result<Vec<Vec<Literal>>, DefinitionError> {
    match node {
        DefNode::Literal(code) => {
            let lit =
                Literal::from_code(*code).ok_or(DefinitionError::BadLiteralCode(*code))?;
            Ok(vec![vec![if sign { !lit } else { lit }]])
        }
        DefNode::Gate(children) => {
            let sets: Vec<Vec<Vec<Literal>>> = children
                .iter()
                .map(|child| compile_clauses(child, !sign))
                .try_collect()?;

            if sign {
                Ok(sets.into_iter().flatten().collect())
            } else if sets.is_empty() {
                // NAND of nothing is false; asserting it true is the empty
                // clause.
                Ok(vec![Vec::new()])
            } else {
                Ok(sets
                    .iter()
                    .map(|set| set.iter())
                    .multi_cartesian_product()
                    .map(|choice| choice.into_iter().flatten().copied().collect())
                    .collect())
            }
        }
    }
}

/// Validates the node, allocates a fresh variable seeded with the polarity
/// estimate, and submits both directions of its Tseitin definition.
/// Submission may unit propagate as a side effect of normal clause
/// addition.
///
/// # Errors
/// Fails without allocating when the solver has free variables registered
/// or the node is structurally invalid. Callers processing a batch stop at
/// the first failure and do not roll earlier definitions back.
pub fn add_definition<S: SolverControl>(
    solver: &mut S,
    node: &DefNode,
) -> Result<Variable, DefinitionError> {
    if solver.free_variable_count() != 0 {
        return Err(DefinitionError::UnsupportedConfiguration);
    }
    if !validate(solver, node) {
        return Err(DefinitionError::InvalidStructure);
    }

    let hint = estimate_polarity(solver, node);
    let fresh = solver.new_variable(hint);

    for sign in [false, true] {
        for mut clause in compile_clauses(node, sign)? {
            clause.push(Literal::new(fresh, sign));
            solver.submit_clause(clause);
        }
    }

    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tether::mock::MockSolver;

    fn leaf(var: Variable, polarity: bool) -> DefNode {
        DefNode::Literal(i64::from(Literal::new(var, polarity).code()))
    }

    #[test]
    fn test_compile_leaf() {
        let lit = Literal::new(3, true);
        let node = DefNode::Literal(i64::from(lit.code()));

        assert_eq!(compile_clauses(&node, false).unwrap(), vec![vec![lit]]);
        assert_eq!(compile_clauses(&node, true).unwrap(), vec![vec![!lit]]);
    }

    #[test]
    fn test_compile_bad_leaf() {
        let node = DefNode::Literal(-3);
        assert_eq!(
            compile_clauses(&node, false),
            Err(DefinitionError::BadLiteralCode(-3))
        );
    }

    #[test]
    fn test_distribution_cardinality() {
        // Inner gate contributes a two-clause set, the leaf a singleton.
        let node = DefNode::Gate(vec![
            DefNode::Gate(vec![leaf(0, true), leaf(1, true)]),
            leaf(2, true),
        ]);

        let asserting = compile_clauses(&node, false).unwrap();
        assert_eq!(asserting.len(), 2);
        assert!(asserting.iter().all(|c| c.len() == 2));

        let denying = compile_clauses(&node, true).unwrap();
        assert_eq!(denying.len(), 2);
        let lengths: Vec<usize> = denying.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2, 1]);
    }

    #[test]
    fn test_compile_empty_gate() {
        let node = DefNode::Gate(vec![]);
        assert_eq!(compile_clauses(&node, false).unwrap(), vec![Vec::new()]);
        assert!(compile_clauses(&node, true).unwrap().is_empty());
    }

    #[test]
    fn test_validate() {
        let solver = MockSolver::with_vars(2);

        assert!(validate(&solver, &leaf(0, true)));
        assert!(validate(&solver, &DefNode::Gate(vec![leaf(0, false), leaf(1, true)])));

        // Out of range and negative codes fail the whole definition.
        assert!(!validate(&solver, &leaf(2, true)));
        assert!(!validate(&solver, &DefNode::Literal(-1)));
        assert!(!validate(
            &solver,
            &DefNode::Gate(vec![leaf(0, true), DefNode::Literal(-1)])
        ));
    }

    #[test]
    fn test_estimate_polarity_leaf() {
        let mut solver = MockSolver::with_vars(2);
        solver.hints[0] = Some(true);

        assert_eq!(estimate_polarity(&solver, &leaf(0, true)), Some(true));
        assert_eq!(estimate_polarity(&solver, &leaf(0, false)), Some(false));
        assert_eq!(estimate_polarity(&solver, &leaf(1, true)), None);
    }

    #[test]
    fn test_estimate_polarity_gate() {
        let mut solver = MockSolver::with_vars(3);
        solver.hints[0] = Some(true);
        solver.hints[1] = Some(false);

        // A false child makes the gate estimate true.
        let gate = DefNode::Gate(vec![leaf(0, true), leaf(1, true)]);
        assert_eq!(estimate_polarity(&solver, &gate), Some(true));

        // All-true children estimate false.
        let gate = DefNode::Gate(vec![leaf(0, true), leaf(1, false)]);
        assert_eq!(estimate_polarity(&solver, &gate), Some(false));

        // An unknown child downgrades all-true to unknown.
        let gate = DefNode::Gate(vec![leaf(0, true), leaf(2, true)]);
        assert_eq!(estimate_polarity(&solver, &gate), None);
    }

    #[test]
    fn test_add_definition_refuses_free_variables() {
        let mut solver = MockSolver::with_vars(2);
        solver.free_variables = 1;

        assert_eq!(
            add_definition(&mut solver, &leaf(0, true)),
            Err(DefinitionError::UnsupportedConfiguration)
        );
        assert_eq!(solver.num_variables(), 2);
    }

    #[test]
    fn test_add_definition_rejects_invalid() {
        let mut solver = MockSolver::with_vars(1);

        assert_eq!(
            add_definition(&mut solver, &leaf(1, true)),
            Err(DefinitionError::InvalidStructure)
        );
        assert!(solver.submitted.is_empty());
    }

    fn satisfies(clause: &[Literal], model: &[bool]) -> bool {
        clause
            .iter()
            .any(|lit| model[lit.variable() as usize] == lit.polarity())
    }

    #[test]
    fn test_tseitin_nand_soundness() {
        let mut solver = MockSolver::with_vars(2);
        let node = DefNode::Gate(vec![leaf(0, true), leaf(1, true)]);

        let fresh = add_definition(&mut solver, &node).unwrap();
        assert_eq!(fresh, 2);

        // Under every input assignment exactly one value of the fresh
        // variable satisfies the defining clauses: the NAND of the inputs.
        for x0 in [false, true] {
            for x1 in [false, true] {
                let expected = !(x0 && x1);
                for v in [false, true] {
                    let model = [x0, x1, v];
                    let all_satisfied = solver
                        .submitted
                        .iter()
                        .all(|clause| satisfies(clause, &model));
                    assert_eq!(all_satisfied, v == expected, "model {model:?}");
                }
            }
        }
    }
}
