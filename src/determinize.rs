//! Subset construction.

use std::collections::VecDeque;

use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::{
    automaton::{Automaton, FreshNames, Label, State},
    math::{OrderedMap, OrderedSet},
    show::Show,
};

/// The name under which a subset of states appears in the determinized automaton, its
/// members in shortlex order, e.g. `{q0,q2}`.
pub fn subset_name<'a, I: IntoIterator<Item = &'a State>>(subset: I) -> String {
    format!("{{{}}}", subset.into_iter().join(","))
}

impl Automaton {
    /// Computes an equivalent deterministic automaton by the subset construction.
    ///
    /// Every state of the result corresponds to a nonempty, epsilon closed set of states of
    /// `self` that is reachable from the closure of the initial state, and is named by
    /// [`subset_name`]. A subset is final if it contains a final state. Subsets are explored
    /// breadth first with symbols in alphabet order and each subset is only expanded once.
    /// The result is deterministic but neither necessarily complete nor minimal; missing
    /// transitions correspond to the empty subset.
    ///
    /// If no initial state is designated, a warning is emitted and an automaton without
    /// states over the same alphabet is returned.
    pub fn determinize(&self) -> Automaton {
        let mut out = Automaton::over(self.alphabet().clone());
        let Some(initial) = self.initial() else {
            warn!("determinizing an automaton without initial state yields the empty automaton");
            return out;
        };

        let mut names = FreshNames::default();
        let mut memo: OrderedMap<OrderedSet<&State>, State> = OrderedMap::new();
        let mut queue = VecDeque::new();

        let start = self.epsilon_closure([initial]);
        let start_name = names.claim(subset_name(start.iter().copied()));
        out.mark_initial(&start_name);
        memo.insert(start.clone(), start_name);
        queue.push_back(start);

        while let Some(subset) = queue.pop_front() {
            let source = memo[&subset].clone();
            if subset.iter().any(|q| self.is_final(q)) {
                out.mark_final(&source);
            }
            for &sym in self.alphabet() {
                let step = subset
                    .iter()
                    .flat_map(|q| self.successors(q, Label::Symbol(sym)));
                let target = self.epsilon_closure(step);
                if target.is_empty() {
                    continue;
                }
                let target_name = match memo.get(&target) {
                    Some(name) => name.clone(),
                    None => {
                        let name = names.claim(subset_name(target.iter().copied()));
                        trace!("discovered subset {}", name.show());
                        out.insert_state(name.clone());
                        memo.insert(target.clone(), name.clone());
                        queue.push_back(target);
                        name
                    }
                };
                out.link(&source, Label::Symbol(sym), &target_name);
            }
        }

        debug!(
            "determinized automaton with {} states into one with {} states",
            self.size(),
            out.size()
        );
        out
    }
}
