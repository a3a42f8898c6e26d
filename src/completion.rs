//! Completion by a sink state and pruning of useless states.

use tracing::{debug, trace};

use crate::automaton::{Automaton, FreshNames, Label, State};

/// The preferred name of the sink state that [`Automaton::complete`] adds.
pub const SINK: &str = "sink";

impl Automaton {
    /// Makes the transition function total. A nondeterministic automaton is determinized
    /// first. If some state lacks a transition on some symbol, a single non-final sink
    /// state is added which loops on every symbol and receives all missing transitions.
    /// An automaton that is already complete is returned unchanged.
    pub fn complete(&self) -> Automaton {
        let mut out = if self.is_deterministic() {
            self.clone()
        } else {
            self.determinize()
        };

        let gaps: Vec<(State, char)> = out
            .states()
            .iter()
            .flat_map(|q| out.alphabet().iter().map(move |sym| (q, *sym)))
            .filter(|(q, sym)| out.successors(q, Label::Symbol(*sym)).is_empty())
            .map(|(q, sym)| (q.clone(), sym))
            .collect();
        if gaps.is_empty() {
            trace!("automaton is already complete");
            return out;
        }

        let sink = FreshNames::avoiding(out.states()).claim(SINK);
        debug!("adding sink {sink} for {} missing transitions", gaps.len());
        for (q, sym) in gaps {
            out.link(&q, Label::Symbol(sym), &sink);
        }
        for sym in out.alphabet().clone() {
            out.link(&sink, Label::Symbol(sym), &sink);
        }
        out
    }

    /// Removes every state that is not useful, i.e. that is not reachable from the initial
    /// state or from which no final state can be reached. Transitions survive only if both
    /// endpoints survive. The initial state is kept only if it is useful, so pruning an
    /// automaton with empty language leaves no states at all.
    pub fn prune(&self) -> Automaton {
        let useful = self.useful_states();
        debug!("pruning keeps {} of {} states", useful.len(), self.size());
        self.restricted_to(&useful)
    }

    /// Returns true if every state is useful.
    pub fn is_pruned(&self) -> bool {
        self.useful_states().len() == self.size()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::word::words_up_to;

    fn partial() -> Automaton {
        Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([("q0", 'a', "q1"), ("q1", 'b', "q0")])
            .with_initial("q0")
            .with_finals(["q1"])
            .build()
            .unwrap()
    }

    #[test]
    fn completion_adds_single_sink() {
        let aut = partial();
        let complete = aut.complete();
        assert!(complete.is_complete());
        assert!(complete.is_deterministic());
        assert_eq!(complete.size(), 3);
        let sink = State::from("sink");
        assert!(!complete.is_final(&sink));
        assert_eq!(complete.successor(&sink, 'a'), Some(&sink));
        assert_eq!(complete.complete(), complete);
        for word in words_up_to(aut.alphabet(), 5) {
            assert_eq!(aut.accepts(word.clone()), complete.accepts(word));
        }
    }

    #[test]
    fn sink_name_avoids_clashes() {
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_states(["sink"])
            .with_initial("sink")
            .build()
            .unwrap();
        let complete = aut.complete();
        assert!(complete.contains(&State::from("sink'1")));
    }

    #[test]
    fn complete_automaton_is_untouched() {
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_transitions([("q0", 'a', "q1"), ("q1", 'a', "q1")])
            .with_initial("q0")
            .with_finals(["q1"])
            .build()
            .unwrap();
        assert!(aut.is_complete());
        assert_eq!(aut.complete(), aut);
    }

    #[test]
    fn nondeterministic_input_is_determinized() {
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_transitions([("p", 'a', "p"), ("p", 'a', "q")])
            .with_initial("p")
            .with_finals(["q"])
            .build()
            .unwrap();
        let complete = aut.complete();
        assert!(complete.is_deterministic() && complete.is_complete());
        assert!(complete.accepts("aaa".chars()));
        assert!(!complete.accepts("".chars()));
    }

    #[test]
    fn pruning_removes_useless_states() {
        let mut aut = partial().complete();
        aut.add_state("island");
        assert!(!aut.is_pruned());
        let pruned = aut.prune();
        assert!(pruned.is_pruned());
        assert_eq!(pruned, partial());
        assert_eq!(pruned.prune(), pruned);
    }

    #[test]
    fn pruning_the_empty_language() {
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_transitions([("q0", 'a', "q0")])
            .with_initial("q0")
            .build()
            .unwrap();
        let pruned = aut.prune();
        assert_eq!(pruned.size(), 0);
        assert_eq!(pruned.initial(), None);
        assert!(pruned.is_empty_language());
    }
}
