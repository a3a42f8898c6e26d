use crate::math::OrderedSet;

use super::{Automaton, AutomatonError, Label, State};

/// Helper struct for the construction of automata. It accumulates states, symbols,
/// transitions and the initial/final designation and only produces an [`Automaton`] once
/// [`AutomatonBuilder::build`] is called, so a partially assembled automaton is never
/// observable.
///
/// States that are mentioned by a transition, as initial or as final state are registered
/// implicitly. Symbols on the other hand must be declared with
/// [`AutomatonBuilder::with_alphabet`], using an undeclared symbol makes `build` fail.
///
/// # Example
///
/// We want to create a DFA over `['a', 'b']` that accepts all words ending in `b`.
/// ```
/// use kleene::prelude::*;
///
/// let dfa = Automaton::builder()
///     .with_alphabet(['a', 'b'])
///     .with_transitions([("q0", 'a', "q0"), ("q0", 'b', "q1"), ("q1", 'a', "q0"), ("q1", 'b', "q1")])
///     .with_initial("q0")
///     .with_finals(["q1"])
///     .build()
///     .unwrap();
/// assert!(dfa.is_deterministic() && dfa.is_complete());
/// assert!(dfa.accepts("abb".chars()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    states: Vec<State>,
    symbols: OrderedSet<char>,
    edges: Vec<(State, Label, State)>,
    initial: Option<State>,
    finals: Vec<State>,
}

impl AutomatonBuilder {
    /// Declares states, this is only needed for states that are not otherwise mentioned.
    pub fn with_states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<State>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Declares alphabet symbols.
    pub fn with_alphabet<I: IntoIterator<Item = char>>(mut self, symbols: I) -> Self {
        self.symbols.extend(symbols);
        self
    }

    /// Adds transitions given as `(source, label, target)` triples. A label can be given as
    /// a `char`, where `'ε'` denotes an epsilon transition.
    pub fn with_transitions<S, L, T, I>(mut self, transitions: I) -> Self
    where
        S: Into<State>,
        L: Into<Label>,
        T: Into<State>,
        I: IntoIterator<Item = (S, L, T)>,
    {
        self.edges.extend(
            transitions
                .into_iter()
                .map(|(p, l, q)| (p.into(), l.into(), q.into())),
        );
        self
    }

    /// Adds epsilon transitions given as pairs of source and target.
    pub fn with_epsilon_transitions<S, T, I>(mut self, transitions: I) -> Self
    where
        S: Into<State>,
        T: Into<State>,
        I: IntoIterator<Item = (S, T)>,
    {
        self.edges.extend(
            transitions
                .into_iter()
                .map(|(p, q)| (p.into(), Label::Epsilon, q.into())),
        );
        self
    }

    /// Sets the initial state.
    pub fn with_initial(mut self, state: impl Into<State>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Adds final states.
    pub fn with_finals<I>(mut self, states: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<State>,
    {
        self.finals.extend(states.into_iter().map(Into::into));
        self
    }

    /// Consumes the builder and produces the automaton. Everything is validated through
    /// the mutators of [`Automaton`], the first violation is returned as error.
    pub fn build(self) -> Result<Automaton, AutomatonError> {
        let mut aut = Automaton::new(self.symbols)?;
        let mentioned = self
            .states
            .iter()
            .chain(self.edges.iter().flat_map(|(p, _, q)| [p, q]))
            .chain(self.initial.iter())
            .chain(self.finals.iter());
        for q in mentioned {
            aut.add_state(q.clone());
        }
        for (source, label, target) in self.edges {
            aut.add_edge(source, label, target)?;
        }
        if let Some(initial) = self.initial {
            aut.set_initial(initial)?;
        }
        for q in self.finals {
            aut.add_final(q)?;
        }
        Ok(aut)
    }
}
