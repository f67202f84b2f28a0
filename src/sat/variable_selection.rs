#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The variable order: VSIDS activity combined with user precedence.
//!
//! Variables are kept on an index heap ordered by `(precedence, activity)`,
//! so any nonzero precedence dominates activity and activity breaks ties.
//! Precedence edits do not re-heapify on their own; callers apply the full
//! precedence sequence and then invalidate the cached order with
//! [`Vsids::rebuild`].

use crate::sat::assignment::Assignment;
use crate::sat::literal::Variable;
use ordered_float::OrderedFloat;

const DECAY_FACTOR: f64 = 0.95;
const RESCALE_LIMIT: f64 = 1e100;

/// Activity-and-precedence ordering over variables, with a binary max-heap
/// tracking the candidates for the next decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vsids {
    activity: Vec<f64>,
    precedence: Vec<i32>,
    heap: Vec<Variable>,
    positions: Vec<usize>,
    inc: f64,
}

const ABSENT: usize = usize::MAX;

impl Vsids {
    #[must_use]
    pub fn new(num_vars: usize, vars: &[Variable]) -> Self {
        let mut vsids = Self {
            activity: vec![0.0; num_vars],
            precedence: vec![0; num_vars],
            heap: Vec::with_capacity(num_vars),
            positions: vec![ABSENT; num_vars],
            inc: 1.0,
        };

        vsids.bumps(vars.iter().copied());
        for var in 0..num_vars {
            vsids.insert(var as Variable);
        }

        vsids
    }

    fn key(&self, var: Variable) -> (i32, OrderedFloat<f64>) {
        (
            self.precedence[var as usize],
            OrderedFloat(self.activity[var as usize]),
        )
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.key(self.heap[i]) <= self.key(self.heap[parent]) {
                break;
            }
            self.swap_entries(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let mut largest = i;
            for child in [2 * i + 1, 2 * i + 2] {
                if child < self.heap.len() && self.key(self.heap[child]) > self.key(self.heap[largest])
                {
                    largest = child;
                }
            }
            if largest == i {
                break;
            }
            self.swap_entries(i, largest);
            i = largest;
        }
    }

    fn swap_entries(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.positions[self.heap[i] as usize] = i;
        self.positions[self.heap[j] as usize] = j;
    }

    /// Puts a variable back on the heap, typically after it was unassigned
    /// by backtracking. No-op if it is already there.
    pub fn insert(&mut self, var: Variable) {
        if self.positions[var as usize] != ABSENT {
            return;
        }
        self.positions[var as usize] = self.heap.len();
        self.heap.push(var);
        self.sift_up(self.heap.len() - 1);
    }

    fn pop_max(&mut self) -> Option<Variable> {
        let top = *self.heap.first()?;
        let last = self.heap.len() - 1;
        self.swap_entries(0, last);
        self.heap.pop();
        self.positions[top as usize] = ABSENT;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(top)
    }

    /// The unassigned variable with the best `(precedence, activity)` key,
    /// removed from the heap. `None` once every variable is assigned.
    pub fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        while let Some(var) = self.pop_max() {
            if assignment[var].is_unassigned() {
                return Some(var);
            }
        }
        None
    }

    pub fn bump(&mut self, var: Variable) {
        self.activity[var as usize] += self.inc;
        if self.activity[var as usize] > RESCALE_LIMIT {
            for a in &mut self.activity {
                *a /= RESCALE_LIMIT;
            }
            self.inc /= RESCALE_LIMIT;
        }
        let pos = self.positions[var as usize];
        if pos != ABSENT {
            self.sift_up(pos);
        }
    }

    pub fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T) {
        for var in vars {
            self.bump(var);
        }
    }

    pub fn decay(&mut self) {
        self.inc /= DECAY_FACTOR;
    }

    /// Stores a user precedence weight. The cached order is stale until
    /// [`Vsids::rebuild`] runs.
    pub fn set_precedence(&mut self, var: Variable, weight: i32) {
        self.precedence[var as usize] = weight;
    }

    /// Rebuilds the heap from scratch over the unassigned variables.
    pub fn rebuild(&mut self, assignment: &Assignment) {
        self.heap.clear();
        self.positions.fill(ABSENT);
        for var in 0..self.activity.len() as Variable {
            if assignment[var].is_unassigned() {
                self.insert(var);
            }
        }
    }

    /// Adds one slot for a freshly created variable and queues it for
    /// selection.
    pub fn grow(&mut self) {
        self.activity.push(0.0);
        self.precedence.push(0);
        self.positions.push(ABSENT);
        self.insert(self.activity.len() as Variable - 1);
    }

    #[must_use]
    pub fn activity(&self) -> &[f64] {
        &self.activity
    }
}
