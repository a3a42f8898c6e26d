//! Conversion of automata into regular expressions by state elimination.

use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, State},
    math::Map,
    regex::{LanguageExpr, Regex},
};

/// Square matrix of optional expressions, `None` stands for "no path".
type Matrix = Vec<Vec<Option<Regex>>>;

fn add_term(cell: &mut Option<Regex>, term: Regex) {
    *cell = Some(match cell.take() {
        Some(old) => Regex::union(old, term),
        None => term,
    });
}

impl Automaton {
    /// Computes an expression for the language of `self` by state elimination.
    ///
    /// The automaton is pruned first. The remaining states together with a fresh source,
    /// connected by epsilon to the initial state, and a fresh sink, reached by epsilon from
    /// every final state, form a matrix of expressions whose diagonal is seeded with `ε`.
    /// States are eliminated in shortlex order; eliminating `k` replaces every entry
    /// `(i, j)` by `(i, j) + (i, k)(k, k)*(k, j)` where both factors exist. The entry from
    /// source to sink is the result, an absent entry means the language is empty.
    pub fn to_regex(&self) -> LanguageExpr {
        let aut = self.prune();
        let Some(initial) = aut.initial() else {
            debug!("no useful states, the language is empty");
            return LanguageExpr::Empty;
        };

        let states: Vec<&State> = aut.states().iter().collect();
        let index: Map<&State, usize> = states.iter().enumerate().map(|(i, q)| (*q, i)).collect();
        let n = states.len();
        let (source, sink) = (n, n + 1);

        let mut matrix: Matrix = vec![vec![None; n + 2]; n + 2];
        for (p, label, q) in aut.transitions() {
            add_term(&mut matrix[index[p]][index[q]], Regex::from(label));
        }
        for (i, row) in matrix.iter_mut().enumerate().take(n) {
            add_term(&mut row[i], Regex::Epsilon);
        }
        matrix[source][index[initial]] = Some(Regex::Epsilon);
        for q in aut.finals() {
            matrix[index[q]][sink] = Some(Regex::Epsilon);
        }

        for k in 0..n {
            trace!("eliminating {}", states[k]);
            let loop_term = matrix[k][k].clone().map(Regex::star);
            let remaining = (k + 1..n).chain([source, sink]);
            for i in remaining.clone() {
                let Some(into) = matrix[i][k].clone() else {
                    continue;
                };
                for j in remaining.clone() {
                    let Some(out) = matrix[k][j].clone() else {
                        continue;
                    };
                    let through = match &loop_term {
                        Some(l) => Regex::concat(Regex::concat(into.clone(), l.clone()), out),
                        None => Regex::concat(into.clone(), out),
                    };
                    add_term(&mut matrix[i][j], through);
                }
            }
            for cell in matrix.iter_mut().map(|row| &mut row[k]) {
                *cell = None;
            }
            matrix[k].iter_mut().for_each(|cell| *cell = None);
        }

        match matrix[source][sink].take() {
            Some(regex) => LanguageExpr::Regex(regex),
            None => LanguageExpr::Empty,
        }
    }
}
