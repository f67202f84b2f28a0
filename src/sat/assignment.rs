#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The tri-state assignment vector.

use crate::sat::literal::{Literal, Variable};
use core::ops::Index;
use std::fmt;

/// The value of a single variable: assigned to a boolean or unassigned.
///
/// The unassigned state doubles as the "unknown / no preference" value of
/// the control channel's tri-state booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(*b),
            Self::Unassigned => None,
        }
    }
}

/// One `VarState` per variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds one unassigned slot for a freshly created variable.
    pub fn grow(&mut self) {
        self.0.push(VarState::Unassigned);
    }

    pub fn assign(&mut self, lit: Literal) {
        self.0[lit.variable() as usize] = VarState::Assigned(lit.polarity());
    }

    pub fn unassign(&mut self, var: Variable) {
        self.0[var as usize] = VarState::Unassigned;
    }

    pub fn set(&mut self, var: Variable, state: VarState) {
        self.0[var as usize] = state;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self.0.get(var as usize).and_then(VarState::as_bool)
    }

    /// The literal's truth value under the current assignment, `None` while
    /// its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable())
            .map(|b| b == lit.polarity())
    }

    #[must_use]
    pub fn solutions(&self) -> Solutions {
        Solutions(
            self.0
                .iter()
                .enumerate()
                .filter_map(|(i, s)| {
                    s.as_bool()
                        .map(|b| Literal::new(i as Variable, b).to_dimacs())
                })
                .collect(),
        )
    }
}

/// A model as DIMACS-signed literals, one per assigned variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions(pub Vec<i32>);

impl Solutions {
    #[must_use]
    pub fn contains(&self, dimacs: i32) -> bool {
        self.0.contains(&dimacs)
    }
}

impl fmt::Display for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in &self.0 {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{value}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_unassign() {
        let mut a = Assignment::new(3);
        assert!(a[1].is_unassigned());

        a.assign(Literal::new(1, false));
        assert_eq!(a.var_value(1), Some(false));
        assert_eq!(a.literal_value(Literal::new(1, false)), Some(true));
        assert_eq!(a.literal_value(Literal::new(1, true)), Some(false));

        a.unassign(1);
        assert_eq!(a.literal_value(Literal::new(1, true)), None);
    }

    #[test]
    fn test_solutions() {
        let mut a = Assignment::new(3);
        a.assign(Literal::new(0, true));
        a.assign(Literal::new(2, false));

        assert_eq!(a.solutions(), Solutions(vec![1, -3]));
    }

    #[test]
    fn test_grow() {
        let mut a = Assignment::new(1);
        a.grow();
        assert_eq!(a.len(), 2);
        assert!(a[1].is_unassigned());
    }
}
