//! Reachability questions about an [`Automaton`]: epsilon closures, accessible,
//! co-accessible and useful states.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::{
    automaton::{Automaton, AutomatonError, Label, State},
    math::{Map, OrderedMap, OrderedSet},
};

impl Automaton {
    /// Computes the set of states that can be reached from `seeds` using only epsilon
    /// transitions. The seeds themselves are always part of the closure.
    pub fn epsilon_closure<'a, I>(&'a self, seeds: I) -> OrderedSet<&'a State>
    where
        I: IntoIterator<Item = &'a State>,
    {
        let mut closure: OrderedSet<&State> = OrderedSet::new();
        let mut stack = Vec::new();
        for q in seeds {
            if closure.insert(q) {
                stack.push(q);
            }
        }
        while let Some(q) = stack.pop() {
            for p in self.successors(q, Label::Epsilon) {
                if closure.insert(p) {
                    stack.push(p);
                }
            }
        }
        closure
    }

    /// Computes the epsilon closure of every state.
    pub fn epsilon_closures(&self) -> OrderedMap<&State, OrderedSet<&State>> {
        self.states()
            .iter()
            .map(|q| (q, self.epsilon_closure([q])))
            .collect()
    }

    /// Returns the states that are reachable from the initial state, following symbol
    /// and epsilon transitions alike. Fails with [`AutomatonError::NoInitialState`] if no
    /// initial state is designated.
    pub fn try_accessible_states(&self) -> Result<OrderedSet<&State>, AutomatonError> {
        let initial = self.initial().ok_or(AutomatonError::NoInitialState)?;
        let mut seen = OrderedSet::from([initial]);
        let mut queue = VecDeque::from([initial]);
        while let Some(q) = queue.pop_front() {
            for (_, p) in self.edges_from(q) {
                if seen.insert(p) {
                    queue.push_back(p);
                }
            }
        }
        trace!("{} of {} states are accessible", seen.len(), self.size());
        Ok(seen)
    }

    /// Like [`Automaton::try_accessible_states`], but an automaton without initial state
    /// only produces a warning and the empty set.
    pub fn accessible_states(&self) -> OrderedSet<&State> {
        self.try_accessible_states().unwrap_or_else(|e| {
            warn!("cannot compute accessible states: {e}");
            OrderedSet::new()
        })
    }

    /// Returns the states from which some final state can be reached. The search runs
    /// backwards over the inverse transition relation, which is built once per call.
    pub fn co_accessible_states(&self) -> OrderedSet<&State> {
        let mut inverse: Map<&State, Vec<&State>> = Map::default();
        for (source, _, target) in self.transitions() {
            inverse.entry(target).or_default().push(source);
        }

        let mut seen: OrderedSet<&State> = self.finals().iter().collect();
        let mut stack: Vec<&State> = seen.iter().copied().collect();
        while let Some(q) = stack.pop() {
            for &p in inverse.get(q).into_iter().flatten() {
                if seen.insert(p) {
                    stack.push(p);
                }
            }
        }
        trace!("{} of {} states are co-accessible", seen.len(), self.size());
        seen
    }

    /// The states that are both accessible and co-accessible.
    pub fn useful_states(&self) -> OrderedSet<&State> {
        let co_accessible = self.co_accessible_states();
        self.accessible_states()
            .into_iter()
            .filter(|q| co_accessible.contains(q))
            .collect()
    }

    /// Returns true if the automaton accepts no word at all.
    pub fn is_empty_language(&self) -> bool {
        self.useful_states().is_empty()
    }

    /// Restricts the automaton to its accessible states. Without initial state the result
    /// has no states.
    pub fn without_unreachable(&self) -> Automaton {
        let keep = self.accessible_states();
        self.restricted_to(&keep)
    }

    /// Builds a copy that only contains the given states and the transitions between them.
    /// Initial and final designations survive only for kept states.
    pub(crate) fn restricted_to(&self, keep: &OrderedSet<&State>) -> Automaton {
        let mut out = Automaton::over(self.alphabet().clone());
        for q in keep {
            out.insert_state((*q).clone());
        }
        for (source, label, target) in self.transitions() {
            if keep.contains(source) && keep.contains(target) {
                out.link(source, label, target);
            }
        }
        for q in self.finals().iter().filter(|q| keep.contains(q)) {
            out.mark_final(q);
        }
        if let Some(initial) = self.initial().filter(|q| keep.contains(q)) {
            out.mark_initial(initial);
        }
        out
    }
}
