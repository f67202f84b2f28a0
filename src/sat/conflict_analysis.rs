#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First-UIP conflict analysis.

use crate::sat::cnf::{ClauseRef, Cnf};
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::{Reason, Trail};
use rustc_hash::FxHashSet;

/// The outcome of analysing one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// The learnt clause, asserting literal first. When it has a second
    /// literal, the one from the backtrack level sits at index 1 so the
    /// clause can be watched directly.
    pub learnt: Vec<Literal>,
    pub backtrack_level: usize,
    /// Variables involved in the resolution, for activity bumping.
    pub bumped: Vec<Variable>,
}

/// Resolves backwards from the conflicting clause until the first unique
/// implication point of the current decision level.
///
/// Relies on reason clauses keeping their propagated literal at index 0,
/// which propagation maintains. Must not be called at decision level 0.
#[must_use]
pub fn analyse(cnf: &Cnf, trail: &Trail, confl: ClauseRef) -> Analysis {
    debug_assert!(trail.decision_level() > 0);

    let current = trail.decision_level();
    let mut seen: FxHashSet<Variable> = FxHashSet::default();
    let mut learnt = vec![Literal::default()];
    let mut bumped = Vec::new();
    let mut count = 0_usize;
    let mut index = trail.len();
    let mut clause_ref = confl;
    let mut skip_propagated = false;

    loop {
        for &lit in cnf[clause_ref].iter().skip(usize::from(skip_propagated)) {
            let var = lit.variable();
            if trail.level_of(var) > 0 && seen.insert(var) {
                bumped.push(var);
                if trail.level_of(var) >= current {
                    count += 1;
                } else {
                    learnt.push(lit);
                }
            }
        }
        skip_propagated = true;

        while !seen.contains(&trail[index - 1].lit.variable()) {
            index -= 1;
        }
        index -= 1;
        let step = trail[index];
        seen.remove(&step.lit.variable());
        count -= 1;

        if count == 0 {
            learnt[0] = step.lit.negated();
            break;
        }

        match step.reason {
            Reason::Propagated(cref) => clause_ref = cref,
            Reason::Decision => {
                debug_assert!(false, "resolved past a decision with literals pending");
                learnt[0] = step.lit.negated();
                break;
            }
        }
    }

    let backtrack_level = if learnt.len() == 1 {
        0
    } else {
        let deepest = learnt
            .iter()
            .enumerate()
            .skip(1)
            .max_by_key(|(_, l)| trail.level_of(l.variable()))
            .map_or(1, |(i, _)| i);
        learnt.swap(1, deepest);
        trail.level_of(learnt[1].variable())
    };

    Analysis {
        learnt,
        backtrack_level,
        bumped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(dimacs: i32) -> Literal {
        Literal::from_dimacs(dimacs)
    }

    #[test]
    fn test_uip_is_decision() {
        // Deciding 1 propagates 2 and 3, which conflict.
        let cnf = Cnf::new(vec![vec![2, -1], vec![3, -1], vec![-2, -3]]);

        let mut trail = Trail::new(3);
        trail.new_level();
        trail.push(lit(1), Reason::Decision);
        trail.push(lit(2), Reason::Propagated(0));
        trail.push(lit(3), Reason::Propagated(1));

        let analysis = analyse(&cnf, &trail, 2);
        assert_eq!(analysis.learnt, vec![lit(-1)]);
        assert_eq!(analysis.backtrack_level, 0);
        assert!(analysis.bumped.contains(&0));
        assert!(analysis.bumped.contains(&1));
        assert!(analysis.bumped.contains(&2));
    }

    #[test]
    fn test_uip_mid_level() {
        // Level 1 decides 1; level 2 decides 2 and propagates 3; the
        // conflict mixes both levels.
        let cnf = Cnf::new(vec![vec![3, -2], vec![-1, -3]]);

        let mut trail = Trail::new(3);
        trail.new_level();
        trail.push(lit(1), Reason::Decision);
        trail.new_level();
        trail.push(lit(2), Reason::Decision);
        trail.push(lit(3), Reason::Propagated(0));

        let analysis = analyse(&cnf, &trail, 1);
        assert_eq!(analysis.learnt, vec![lit(-3), lit(-1)]);
        assert_eq!(analysis.backtrack_level, 1);
    }
}
