use tracing::debug;

use super::Regex;
use crate::{
    automaton::{Automaton, Label, State},
    math::OrderedSet,
};

/// First and last positions of a subexpression and whether it accepts the empty word.
#[derive(Debug, Default)]
struct Positions {
    first: OrderedSet<usize>,
    last: OrderedSet<usize>,
    nullable: bool,
}

/// Walks the expression once, numbering the symbol occurrences from 1 and collecting the
/// pairs of positions that may follow each other.
struct Linearization {
    symbols: Vec<char>,
    follow: OrderedSet<(usize, usize)>,
}

impl Linearization {
    fn visit(&mut self, regex: &Regex) -> Positions {
        match regex {
            Regex::Epsilon => Positions {
                nullable: true,
                ..Default::default()
            },
            Regex::Symbol(c) => {
                self.symbols.push(*c);
                let position = self.symbols.len();
                Positions {
                    first: OrderedSet::from([position]),
                    last: OrderedSet::from([position]),
                    nullable: false,
                }
            }
            Regex::Union(l, r) => {
                let left = self.visit(l);
                let right = self.visit(r);
                Positions {
                    first: &left.first | &right.first,
                    last: &left.last | &right.last,
                    nullable: left.nullable || right.nullable,
                }
            }
            Regex::Concat(l, r) => {
                let left = self.visit(l);
                let right = self.visit(r);
                for &i in &left.last {
                    for &j in &right.first {
                        self.follow.insert((i, j));
                    }
                }
                let mut first = left.first;
                if left.nullable {
                    first.extend(&right.first);
                }
                let mut last = right.last;
                if right.nullable {
                    last.extend(&left.last);
                }
                Positions {
                    first,
                    last,
                    nullable: left.nullable && right.nullable,
                }
            }
            Regex::Star(inner) => {
                let inner = self.visit(inner);
                for &i in &inner.last {
                    for &j in &inner.first {
                        self.follow.insert((i, j));
                    }
                }
                Positions {
                    nullable: true,
                    ..inner
                }
            }
        }
    }
}

fn position(i: usize) -> State {
    State::new(format!("q{i}"))
}

impl Regex {
    /// Builds the position automaton by Glushkov's construction. There is one state `qi`
    /// per symbol occurrence (numbered from 1, left to right) and an initial state `q0`.
    /// A transition into `qi` is labeled with the symbol at position `i`. The result never
    /// has epsilon transitions but may be nondeterministic.
    pub fn glushkov(&self) -> Automaton {
        let mut linearization = Linearization {
            symbols: vec![],
            follow: OrderedSet::new(),
        };
        let positions = linearization.visit(self);
        let symbol_at = |i: usize| Label::Symbol(linearization.symbols[i - 1]);

        let mut aut = Automaton::over(self.symbols());
        let initial = position(0);
        aut.mark_initial(&initial);
        for i in 1..=linearization.symbols.len() {
            aut.insert_state(position(i));
        }
        for &j in &positions.first {
            aut.link(&initial, symbol_at(j), &position(j));
        }
        for &(i, j) in &linearization.follow {
            aut.link(&position(i), symbol_at(j), &position(j));
        }
        for &i in &positions.last {
            aut.mark_final(&position(i));
        }
        if positions.nullable {
            aut.mark_final(&initial);
        }
        debug!("glushkov construction for {self} has {} states", aut.size());
        aut
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::regex::parse;

    #[test]
    fn position_automaton() {
        let aut = parse("(a|b)*ab").unwrap().glushkov();
        assert!(!aut.has_epsilon_transitions());
        assert_eq!(aut.size(), 5);
        assert_eq!(aut.finals().len(), 1);
        assert!(aut.is_final(&State::from("q4")));
        for accepted in ["ab", "aab", "bbab"] {
            assert!(aut.accepts(accepted.chars()));
        }
        for rejected in ["", "a", "aba"] {
            assert!(!aut.accepts(rejected.chars()));
        }
        assert_eq!(aut.agrees_up_to(&parse("(a|b)*ab").unwrap().thompson(), 6), None);
    }

    #[test]
    fn nullable_expression_makes_initial_final() {
        let aut = parse("(ab)*").unwrap().glushkov();
        assert!(aut.is_final(&State::from("q0")));
        assert!(aut.is_deterministic());
        assert!(aut.accepts("abab".chars()));
        assert!(!aut.accepts("aba".chars()));
    }

    #[test]
    fn epsilon_has_no_positions() {
        let aut = parse("ε").unwrap().glushkov();
        assert_eq!(aut.size(), 1);
        assert!(aut.accepts("".chars()));
        let aut = parse("aε").unwrap().glushkov();
        assert_eq!(aut.size(), 2);
        assert!(aut.accepts("a".chars()));
    }
}
