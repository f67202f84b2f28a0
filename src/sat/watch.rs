#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::Clause;
use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::literal::Literal;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;

/// Per-literal watch lists. A clause is watched by its first two literals;
/// `watches[lit]` holds the clauses in which `lit` is watched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Watches(Vec<SmallVec<[ClauseRef; 6]>>);

impl Watches {
    #[must_use]
    pub fn new(cnf: &Cnf) -> Self {
        let mut watches = Self(vec![SmallVec::new(); cnf.num_vars * 2]);

        for (i, clause) in cnf.iter().enumerate() {
            if clause.len() >= 2 {
                watches.attach(clause, i);
            }
        }

        watches
    }

    /// Adds the two slots for a freshly created variable.
    pub fn grow(&mut self) {
        self.0.push(SmallVec::new());
        self.0.push(SmallVec::new());
    }

    /// Watches the clause through its first two literals.
    pub fn attach(&mut self, clause: &Clause, cref: ClauseRef) {
        debug_assert!(clause.len() >= 2);
        self[clause[0]].push(cref);
        self[clause[1]].push(cref);
    }

    pub fn unwatch(&mut self, lit: Literal, cref: ClauseRef) {
        self[lit].retain(|&mut c| c != cref);
    }

    pub fn watch(&mut self, lit: Literal, cref: ClauseRef) {
        self[lit].push(cref);
    }
}

impl Index<Literal> for Watches {
    type Output = SmallVec<[ClauseRef; 6]>;

    fn index(&self, index: Literal) -> &Self::Output {
        &self.0[index.code() as usize]
    }
}

impl IndexMut<Literal> for Watches {
    fn index_mut(&mut self, index: Literal) -> &mut Self::Output {
        &mut self.0[index.code() as usize]
    }
}
