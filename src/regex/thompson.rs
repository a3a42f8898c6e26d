use tracing::debug;

use super::Regex;
use crate::automaton::{Automaton, FreshNames, Label, State};

/// Prefix of the states created by the Thompson construction.
pub const THOMPSON_PREFIX: &str = "t";

/// A piece of automaton with exactly one entry and one exit state.
struct Fragment {
    start: State,
    end: State,
}

struct Thompson {
    names: FreshNames,
    aut: Automaton,
}

impl Thompson {
    fn fresh(&mut self) -> State {
        let q = self.names.fresh(THOMPSON_PREFIX);
        self.aut.insert_state(q.clone());
        q
    }

    fn build(&mut self, regex: &Regex) -> Fragment {
        match regex {
            Regex::Epsilon | Regex::Symbol(_) => {
                let label = match regex {
                    Regex::Symbol(c) => Label::Symbol(*c),
                    _ => Label::Epsilon,
                };
                let start = self.fresh();
                let end = self.fresh();
                self.aut.link(&start, label, &end);
                Fragment { start, end }
            }
            Regex::Union(l, r) => {
                let start = self.fresh();
                let left = self.build(l);
                let right = self.build(r);
                let end = self.fresh();
                for part in [&left, &right] {
                    self.aut.link(&start, Label::Epsilon, &part.start);
                    self.aut.link(&part.end, Label::Epsilon, &end);
                }
                Fragment { start, end }
            }
            Regex::Concat(l, r) => {
                let left = self.build(l);
                let right = self.build(r);
                self.aut.link(&left.end, Label::Epsilon, &right.start);
                Fragment {
                    start: left.start,
                    end: right.end,
                }
            }
            Regex::Star(inner) => {
                let start = self.fresh();
                let body = self.build(inner);
                let end = self.fresh();
                self.aut.link(&start, Label::Epsilon, &body.start);
                self.aut.link(&start, Label::Epsilon, &end);
                self.aut.link(&body.end, Label::Epsilon, &body.start);
                self.aut.link(&body.end, Label::Epsilon, &end);
                Fragment { start, end }
            }
        }
    }
}

impl Regex {
    /// Builds an automaton with epsilon transitions by Thompson's construction. Every node
    /// of the expression contributes a fragment with one entry and one exit state, the
    /// fragments are glued together with epsilon transitions. States are named `t0, t1, ...`
    /// and the alphabet consists of the symbols occurring in `self`.
    pub fn thompson(&self) -> Automaton {
        let mut construction = Thompson {
            names: FreshNames::default(),
            aut: Automaton::over(self.symbols()),
        };
        let Fragment { start, end } = construction.build(self);
        let mut aut = construction.aut;
        aut.mark_initial(&start);
        aut.mark_final(&end);
        debug!("thompson construction for {self} has {} states", aut.size());
        aut
    }
}

#[cfg(test)]
mod tests {
    use crate::regex::parse;

    #[test]
    fn thompson_ends_with_ab() {
        let aut = parse("(a|b)*ab").unwrap().thompson();
        assert!(aut.has_epsilon_transitions());
        assert_eq!(aut.finals().len(), 1);
        for accepted in ["ab", "aab", "bbab"] {
            assert!(aut.accepts(accepted.chars()), "{accepted} should be accepted");
        }
        for rejected in ["", "a", "aba"] {
            assert!(!aut.accepts(rejected.chars()), "{rejected} should be rejected");
        }
    }

    #[test]
    fn fragment_sizes() {
        assert_eq!(parse("a").unwrap().thompson().size(), 2);
        assert_eq!(parse("ε").unwrap().thompson().size(), 2);
        assert_eq!(parse("a+b").unwrap().thompson().size(), 6);
        assert_eq!(parse("ab").unwrap().thompson().size(), 4);
        assert_eq!(parse("a*").unwrap().thompson().size(), 4);
    }

    #[test]
    fn epsilon_only() {
        let aut = parse("ε").unwrap().thompson();
        assert!(aut.alphabet().is_empty());
        assert!(aut.accepts("".chars()));
    }
}
