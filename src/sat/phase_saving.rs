#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;

/// Saved decision phases with a small, decaying amount of noise.
///
/// The last polarity each variable was assigned with is remembered across
/// backtracking and replayed at the next decision on that variable. Noise
/// occasionally flips the replayed phase; it decays as conflicts accumulate.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPhases {
    phases: BitVec,
    noise_probability: f64,
    conflict_counter: usize,
}

impl SavedPhases {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            phases: BitVec::from_elem(num_vars, false),
            noise_probability: 0.02,
            conflict_counter: 0,
        }
    }

    /// Adds one slot for a freshly created variable.
    pub fn grow(&mut self) {
        self.phases.push(false);
    }

    pub fn save(&mut self, lit: Literal) {
        self.phases.set(lit.variable() as usize, lit.polarity());
    }

    /// The remembered polarity, noise-free.
    #[must_use]
    pub fn saved(&self, var: Variable) -> bool {
        self.phases.get(var as usize).unwrap_or(false)
    }

    /// The polarity to decide with next.
    #[must_use]
    pub fn next_for(&self, var: Variable) -> bool {
        self.saved(var) ^ (fastrand::f64() < self.noise_probability)
    }

    pub fn on_conflict(&mut self) {
        self.conflict_counter = self.conflict_counter.wrapping_add(1);

        if self.conflict_counter % 100 == 0 {
            self.noise_probability *= 0.95;
        }
    }
}
