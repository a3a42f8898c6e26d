use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::math::{OrderedMap, OrderedSet};

mod builder;
pub use builder::AutomatonBuilder;

mod display;

/// Serialization of automata into the exchange record used by external collaborators.
pub mod record;
pub use record::{AutomatonRecord, RecordError};

mod state;
pub use state::{FreshNames, Label, State, EPSILON};

/// Errors that are raised when an operation would violate the structural invariants
/// of an [`Automaton`]. Validation always happens before mutation, so an operation that
/// fails leaves the automaton untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    /// A state is referenced that does not belong to the automaton.
    #[error("state `{0}` does not belong to the automaton")]
    InvalidState(State),
    /// A transition is labeled with something that is neither epsilon nor an alphabet symbol.
    #[error("symbol `{0}` is neither epsilon nor part of the alphabet")]
    InvalidSymbol(String),
    /// An operation needs an initial state but none is designated.
    #[error("the automaton has no initial state")]
    NoInitialState,
}

/// The transition relation, stored as a two-level mapping from source state over label
/// to the set of targets. Empty inner maps and empty target sets are never stored, so two
/// automata with the same relation are also structurally equal.
pub type Transitions = OrderedMap<State, OrderedMap<Label, OrderedSet<State>>>;

static NO_STATES: OrderedSet<State> = OrderedSet::new();

/// A nondeterministic finite automaton with optional epsilon transitions and a single
/// initial state.
///
/// All collections are ordered, which makes iteration, display and serialization
/// deterministic. Equality is structural: two automata are equal if they have the same
/// states, alphabet, transitions, initial state and final states, names included.
///
/// Transformations never mutate their input, they always return a fresh automaton.
///
/// ```
/// use kleene::prelude::*;
///
/// let mut aut = Automaton::new(['a', 'b']).unwrap();
/// aut.add_state("q0");
/// aut.add_state("q1");
/// aut.set_initial("q0").unwrap();
/// aut.add_final("q1").unwrap();
/// aut.add_transition("q0", 'a', ["q0", "q1"]).unwrap();
/// assert!(aut.add_transition("q0", 'c', ["q1"]).is_err());
/// assert!(aut.accepts("aa".chars()));
/// assert!(!aut.accepts("b".chars()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Automaton {
    states: OrderedSet<State>,
    alphabet: OrderedSet<char>,
    transitions: Transitions,
    initial: Option<State>,
    finals: OrderedSet<State>,
}

impl Automaton {
    /// Creates an automaton without states over the given alphabet. Fails with
    /// [`AutomatonError::InvalidSymbol`] if the alphabet contains the epsilon marker.
    pub fn new<I: IntoIterator<Item = char>>(alphabet: I) -> Result<Self, AutomatonError> {
        let alphabet: OrderedSet<char> = alphabet.into_iter().collect();
        if alphabet.contains(&EPSILON) {
            return Err(AutomatonError::InvalidSymbol(EPSILON.to_string()));
        }
        Ok(Self::over(alphabet))
    }

    /// Returns a builder for assembling an automaton in one go.
    pub fn builder() -> AutomatonBuilder {
        AutomatonBuilder::default()
    }

    /// Creates an automaton over an alphabet that is known not to contain epsilon.
    pub(crate) fn over(alphabet: OrderedSet<char>) -> Self {
        debug_assert!(!alphabet.contains(&EPSILON));
        Self {
            alphabet,
            ..Default::default()
        }
    }

    /// The complete deterministic automaton with a single rejecting state, it accepts
    /// the empty language.
    pub(crate) fn rejecting(alphabet: OrderedSet<char>, name: State) -> Self {
        let mut out = Self::over(alphabet);
        out.insert_state(name.clone());
        out.initial = Some(name.clone());
        for sym in out.alphabet.clone() {
            out.link(&name, Label::Symbol(sym), &name);
        }
        out
    }

    /// Adds a state. Returns `false` if the state was already present.
    pub fn add_state(&mut self, state: impl Into<State>) -> bool {
        self.states.insert(state.into())
    }

    /// Removes a state together with every transition that starts or ends in it. If the
    /// state was initial, the automaton is left without initial state. Returns `false`
    /// if the state did not exist.
    pub fn remove_state(&mut self, state: &State) -> bool {
        if !self.states.remove(state) {
            return false;
        }
        self.transitions.remove(state);
        for by_label in self.transitions.values_mut() {
            for targets in by_label.values_mut() {
                targets.remove(state);
            }
            by_label.retain(|_, targets| !targets.is_empty());
        }
        self.transitions.retain(|_, by_label| !by_label.is_empty());
        self.finals.remove(state);
        if self.initial.as_ref() == Some(state) {
            self.initial = None;
        }
        true
    }

    /// Designates the initial state.
    pub fn set_initial(&mut self, state: impl Into<State>) -> Result<(), AutomatonError> {
        let state = self.validate_state(state.into())?;
        self.initial = Some(state);
        Ok(())
    }

    /// Removes the designation of an initial state.
    pub fn clear_initial(&mut self) {
        self.initial = None;
    }

    /// Marks a state as final.
    pub fn add_final(&mut self, state: impl Into<State>) -> Result<(), AutomatonError> {
        let state = self.validate_state(state.into())?;
        self.finals.insert(state);
        Ok(())
    }

    /// Removes the final mark of a state, returns whether it was final.
    pub fn remove_final(&mut self, state: &State) -> bool {
        self.finals.remove(state)
    }

    /// Adds the given symbols to the alphabet.
    pub fn extend_alphabet<I: IntoIterator<Item = char>>(
        &mut self,
        symbols: I,
    ) -> Result<(), AutomatonError> {
        let symbols: Vec<char> = symbols.into_iter().collect();
        if symbols.contains(&EPSILON) {
            return Err(AutomatonError::InvalidSymbol(EPSILON.to_string()));
        }
        self.alphabet.extend(symbols);
        Ok(())
    }

    /// Adds transitions from `source` to each of the `targets` on `label`.
    ///
    /// Fails with [`AutomatonError::InvalidSymbol`] if the label is neither epsilon nor in
    /// the alphabet and with [`AutomatonError::InvalidState`] if the source or any target
    /// is not a state of the automaton. Nothing is added in case of failure.
    pub fn add_transition<S, L, I>(
        &mut self,
        source: S,
        label: L,
        targets: I,
    ) -> Result<(), AutomatonError>
    where
        S: Into<State>,
        L: Into<Label>,
        I: IntoIterator,
        I::Item: Into<State>,
    {
        let label = self.validate_label(label.into())?;
        let source = self.validate_state(source.into())?;
        let targets = targets
            .into_iter()
            .map(|q| self.validate_state(q.into()))
            .collect::<Result<Vec<_>, _>>()?;
        if targets.is_empty() {
            return Ok(());
        }
        self.transitions
            .entry(source)
            .or_default()
            .entry(label)
            .or_default()
            .extend(targets);
        Ok(())
    }

    /// Adds a single transition, see [`Automaton::add_transition`].
    pub fn add_edge(
        &mut self,
        source: impl Into<State>,
        label: impl Into<Label>,
        target: impl Into<State>,
    ) -> Result<(), AutomatonError> {
        self.add_transition(source, label, [target.into()])
    }

    /// Removes all transitions leaving `source` on `label` and returns their targets.
    pub fn remove_transition(&mut self, source: &State, label: Label) -> Option<OrderedSet<State>> {
        let by_label = self.transitions.get_mut(source)?;
        let removed = by_label.remove(&label);
        if by_label.is_empty() {
            self.transitions.remove(source);
        }
        removed
    }

    /// Returns the set of states reached from `state` on `label`. This is the empty set if
    /// there is no such transition or the state does not exist.
    pub fn successors(&self, state: &State, label: Label) -> &OrderedSet<State> {
        self.transitions
            .get(state)
            .and_then(|by_label| by_label.get(&label))
            .unwrap_or(&NO_STATES)
    }

    /// Iterates over the outgoing transitions of `state` as pairs of label and target.
    pub fn edges_from<'a>(&'a self, state: &State) -> impl Iterator<Item = (Label, &'a State)> + 'a {
        self.transitions
            .get(state)
            .into_iter()
            .flat_map(|by_label| {
                by_label
                    .iter()
                    .flat_map(|(label, targets)| targets.iter().map(move |q| (*label, q)))
            })
    }

    /// Iterates over all transitions as triples of source, label and target.
    pub fn transitions(&self) -> impl Iterator<Item = (&State, Label, &State)> + '_ {
        self.transitions.iter().flat_map(|(source, by_label)| {
            by_label.iter().flat_map(move |(label, targets)| {
                targets.iter().map(move |target| (source, *label, target))
            })
        })
    }

    /// Gives access to the underlying transition relation.
    pub fn transition_map(&self) -> &Transitions {
        &self.transitions
    }

    /// The states of the automaton in shortlex order.
    pub fn states(&self) -> &OrderedSet<State> {
        &self.states
    }

    /// The alphabet of the automaton.
    pub fn alphabet(&self) -> &OrderedSet<char> {
        &self.alphabet
    }

    /// The initial state, if one is designated.
    pub fn initial(&self) -> Option<&State> {
        self.initial.as_ref()
    }

    /// The final states.
    pub fn finals(&self) -> &OrderedSet<State> {
        &self.finals
    }

    /// Returns true if `state` is final.
    pub fn is_final(&self, state: &State) -> bool {
        self.finals.contains(state)
    }

    /// Returns true if `state` belongs to the automaton.
    pub fn contains(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns true if some transition is labeled with epsilon.
    pub fn has_epsilon_transitions(&self) -> bool {
        self.transitions
            .values()
            .any(|by_label| by_label.contains_key(&Label::Epsilon))
    }

    /// An automaton is deterministic if it has no epsilon transitions and every state has
    /// at most one successor per symbol.
    pub fn is_deterministic(&self) -> bool {
        self.transitions.values().all(|by_label| {
            by_label
                .iter()
                .all(|(label, targets)| !label.is_epsilon() && targets.len() <= 1)
        })
    }

    /// An automaton is complete if every state has at least one successor for every
    /// symbol of the alphabet.
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|q| {
            self.alphabet
                .iter()
                .all(|sym| !self.successors(q, Label::Symbol(*sym)).is_empty())
        })
    }

    /// Returns the unique successor of `state` on `symbol`, provided there is exactly one.
    pub fn successor(&self, state: &State, symbol: char) -> Option<&State> {
        self.successors(state, Label::Symbol(symbol))
            .iter()
            .exactly_one()
            .ok()
    }

    /// Decides whether the word is accepted. Epsilon transitions are followed, so this
    /// works for every automaton. An automaton without initial state accepts nothing.
    pub fn accepts<W: IntoIterator<Item = char>>(&self, word: W) -> bool {
        let Some(initial) = self.initial.as_ref() else {
            return false;
        };
        let mut current = self.epsilon_closure([initial]);
        for sym in word {
            if current.is_empty() {
                return false;
            }
            let step: OrderedSet<&State> = current
                .iter()
                .flat_map(|q| self.successors(q, Label::Symbol(sym)))
                .collect();
            current = self.epsilon_closure(step);
        }
        current.iter().any(|q| self.finals.contains(*q))
    }

    /// Inserts a state without validation, used by constructions that build a fresh value.
    pub(crate) fn insert_state(&mut self, state: State) {
        self.states.insert(state);
    }

    /// Marks a state final, adding it if necessary.
    pub(crate) fn mark_final(&mut self, state: &State) {
        self.states.insert(state.clone());
        self.finals.insert(state.clone());
    }

    /// Designates the initial state, adding it if necessary.
    pub(crate) fn mark_initial(&mut self, state: &State) {
        self.states.insert(state.clone());
        self.initial = Some(state.clone());
    }

    /// Adds a transition, registering both endpoints as states. Only used by constructions
    /// whose labels come from an alphabet they control.
    pub(crate) fn link(&mut self, source: &State, label: Label, target: &State) {
        debug_assert!(
            label.symbol().map_or(true, |c| self.alphabet.contains(&c)),
            "label {label} is not part of the alphabet"
        );
        self.states.insert(source.clone());
        self.states.insert(target.clone());
        self.transitions
            .entry(source.clone())
            .or_default()
            .entry(label)
            .or_default()
            .insert(target.clone());
    }

    /// Applies `rename` to every state. The mapping must be injective on the states of
    /// `self`, otherwise distinct states would be merged.
    pub(crate) fn renamed<F: Fn(&State) -> State>(&self, rename: F) -> Automaton {
        let mut out = Automaton::over(self.alphabet.clone());
        for q in &self.states {
            out.insert_state(rename(q));
        }
        for (source, label, target) in self.transitions() {
            out.link(&rename(source), label, &rename(target));
        }
        for q in &self.finals {
            out.mark_final(&rename(q));
        }
        if let Some(initial) = &self.initial {
            out.mark_initial(&rename(initial));
        }
        trace!("renamed automaton with {} states", out.size());
        out
    }

    /// Returns a copy of `self` whose alphabet is extended by `symbols`.
    pub(crate) fn with_alphabet_extended<'a, I: IntoIterator<Item = &'a char>>(
        &self,
        symbols: I,
    ) -> Automaton {
        let mut out = self.clone();
        out.alphabet
            .extend(symbols.into_iter().filter(|c| **c != EPSILON));
        out
    }

    fn validate_state(&self, state: State) -> Result<State, AutomatonError> {
        if self.states.contains(&state) {
            Ok(state)
        } else {
            Err(AutomatonError::InvalidState(state))
        }
    }

    fn validate_label(&self, label: Label) -> Result<Label, AutomatonError> {
        match label {
            Label::Symbol(c) if !self.alphabet.contains(&c) => {
                Err(AutomatonError::InvalidSymbol(c.to_string()))
            }
            _ => Ok(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn two_states() -> Automaton {
        let mut aut = Automaton::new(['a', 'b']).unwrap();
        aut.add_state("q0");
        aut.add_state("q1");
        aut
    }

    #[test]
    fn rejects_epsilon_in_alphabet() {
        assert_eq!(
            Automaton::new(['a', 'ε']),
            Err(AutomatonError::InvalidSymbol("ε".into()))
        );
    }

    #[test]
    fn validation_precedes_mutation() {
        let mut aut = two_states();
        assert_eq!(
            aut.set_initial("q7"),
            Err(AutomatonError::InvalidState("q7".into()))
        );
        assert_eq!(
            aut.add_transition("q0", 'c', ["q1"]),
            Err(AutomatonError::InvalidSymbol("c".into()))
        );
        assert_eq!(
            aut.add_transition("q0", 'a', ["q1", "q9"]),
            Err(AutomatonError::InvalidState("q9".into()))
        );
        assert_eq!(aut.transitions().count(), 0);
        assert_eq!(aut.add_final("nope"), Err(AutomatonError::InvalidState("nope".into())));
        assert!(aut.finals().is_empty());
    }

    #[test]
    fn transitions_are_multi_valued() {
        let mut aut = two_states();
        aut.add_transition("q0", 'a', ["q0", "q1"]).unwrap();
        aut.add_edge("q0", 'ε', "q1").unwrap();
        let q0 = State::from("q0");
        assert_eq!(aut.successors(&q0, Label::Symbol('a')).len(), 2);
        assert!(aut.successors(&q0, Label::Symbol('b')).is_empty());
        assert!(aut.successors(&State::from("zz"), Label::Epsilon).is_empty());
        assert!(aut.has_epsilon_transitions());
        assert!(!aut.is_deterministic());

        assert_eq!(
            aut.remove_transition(&q0, Label::Epsilon).map(|t| t.len()),
            Some(1)
        );
        assert!(!aut.has_epsilon_transitions());
        assert_eq!(aut.remove_transition(&q0, Label::Epsilon), None);
    }

    #[test]
    fn remove_state_drops_everything_touching_it() {
        let mut aut = two_states();
        aut.set_initial("q1").unwrap();
        aut.add_final("q1").unwrap();
        aut.add_edge("q0", 'a', "q1").unwrap();
        aut.add_edge("q1", 'b', "q0").unwrap();
        assert!(aut.remove_state(&State::from("q1")));
        assert_eq!(aut.size(), 1);
        assert_eq!(aut.initial(), None);
        assert!(aut.finals().is_empty());
        assert_eq!(aut.transitions().count(), 0);
        assert!(aut.transition_map().is_empty());
        assert!(!aut.remove_state(&State::from("q1")));
    }

    #[test]
    fn completeness_and_determinism() {
        let mut aut = two_states();
        aut.set_initial("q0").unwrap();
        aut.add_final("q1").unwrap();
        aut.add_edge("q0", 'a', "q1").unwrap();
        assert!(aut.is_deterministic());
        assert!(!aut.is_complete());
        aut.add_edge("q0", 'b', "q0").unwrap();
        aut.add_edge("q1", 'a', "q1").unwrap();
        aut.add_edge("q1", 'b', "q1").unwrap();
        assert!(aut.is_complete());
        assert_eq!(aut.successor(&State::from("q0"), 'a'), Some(&State::from("q1")));
    }

    #[test]
    fn acceptance_follows_epsilon() {
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_transitions([("p", 'a', "q")])
            .with_epsilon_transitions([("s", "p"), ("q", "f")])
            .with_initial("s")
            .with_finals(["f"])
            .build()
            .unwrap();
        assert!(aut.accepts("a".chars()));
        assert!(!aut.accepts("".chars()));
        assert!(!aut.accepts("aa".chars()));
    }

    #[test]
    fn no_initial_state_accepts_nothing() {
        let aut = two_states();
        assert!(!aut.accepts("".chars()));
    }

    #[test]
    fn automata_can_be_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Automaton>();
    }
}
