//! Conversions between automata with and without epsilon transitions.

use tracing::debug;

use crate::{
    automaton::{Automaton, FreshNames, Label, State},
    math::OrderedSet,
};

/// Prefix of the intermediate states created by [`Automaton::add_epsilon`].
pub const INTERMEDIATE_PREFIX: &str = "eps";

impl Automaton {
    /// Eliminates epsilon transitions while keeping the states. The successors of `q` on
    /// symbol `a` are the epsilon closed `a`-successors of all states in the closure of `q`,
    /// and `q` becomes final if its closure contains a final state.
    pub fn remove_epsilon(&self) -> Automaton {
        let mut out = Automaton::over(self.alphabet().clone());
        let closures = self.epsilon_closures();
        for (q, closure) in &closures {
            out.insert_state((*q).clone());
            if closure.iter().any(|p| self.is_final(p)) {
                out.mark_final(q);
            }
            for &sym in self.alphabet() {
                let step = closure
                    .iter()
                    .flat_map(|p| self.successors(p, Label::Symbol(sym)));
                let targets: OrderedSet<&State> = step
                    .flat_map(|p| closures.get(p).into_iter().flatten().copied())
                    .collect();
                for target in targets {
                    out.link(q, Label::Symbol(sym), target);
                }
            }
        }
        if let Some(initial) = self.initial() {
            out.mark_initial(initial);
        }
        debug!(
            "removed epsilon transitions, {} transitions remain",
            out.transitions().count()
        );
        out
    }

    /// Subdivides every symbol transition `p --a--> q` into `p --ε--> r --a--> q` with a
    /// fresh intermediate state `r`. Existing epsilon transitions are copied as they are.
    /// The accepted language does not change.
    pub fn add_epsilon(&self) -> Automaton {
        let mut names = FreshNames::avoiding(self.states());
        let mut out = Automaton::over(self.alphabet().clone());
        for q in self.states() {
            out.insert_state(q.clone());
        }
        for (source, label, target) in self.transitions() {
            if label.is_epsilon() {
                out.link(source, label, target);
            } else {
                let intermediate = names.fresh(INTERMEDIATE_PREFIX);
                out.link(source, Label::Epsilon, &intermediate);
                out.link(&intermediate, label, target);
            }
        }
        for q in self.finals() {
            out.mark_final(q);
        }
        if let Some(initial) = self.initial() {
            out.mark_initial(initial);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::word::words_up_to;

    fn with_epsilon() -> Automaton {
        Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([("q0", 'a', "q1"), ("q2", 'b', "q2")])
            .with_epsilon_transitions([("q1", "q2"), ("q0", "q2")])
            .with_initial("q0")
            .with_finals(["q2"])
            .build()
            .unwrap()
    }

    #[test]
    fn elimination_preserves_language() {
        let aut = with_epsilon();
        let without = aut.remove_epsilon();
        assert!(!without.has_epsilon_transitions());
        assert_eq!(without.states(), aut.states());
        assert!(without.is_final(&State::from("q0")));
        assert!(without.is_final(&State::from("q1")));
        assert_eq!(aut.agrees_up_to(&without, 5), None);
    }

    #[test]
    fn introduction_preserves_language() {
        let aut = with_epsilon();
        let with = aut.add_epsilon();
        assert_eq!(with.size(), aut.size() + 2);
        assert!(with.contains(&State::from("eps0")));
        assert!(with
            .transitions()
            .all(|(p, l, _)| l.is_epsilon() || p.name().starts_with("eps")));
        for w in words_up_to(aut.alphabet(), 5) {
            assert_eq!(aut.accepts(w.clone()), with.accepts(w));
        }
        assert_eq!(with.remove_epsilon().prune().agrees_up_to(&aut, 5), None);
    }
}
