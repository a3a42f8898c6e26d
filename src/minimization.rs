//! Minimization by partition refinement and canonical relabeling.

use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, Label, State},
    math::{Bijection, Map, Partition},
    word::words_up_to,
};

/// A complete deterministic automaton whose states are replaced by indices. Index `i`
/// belongs to the `i`-th state in shortlex order, so the least member of a set of
/// indices is also the least state.
struct Table {
    index: Bijection<usize, State>,
    delta: Vec<Vec<usize>>,
    finals: BitSet,
}

impl Table {
    fn new(dfa: &Automaton) -> Self {
        debug_assert!(dfa.is_deterministic() && dfa.is_complete());
        let index: Bijection<usize, State> = dfa.states().iter().cloned().enumerate().collect();
        let symbols: Map<char, usize> = dfa
            .alphabet()
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i))
            .collect();

        let mut delta: Vec<Vec<usize>> = (0..index.len())
            .map(|i| vec![i; symbols.len()])
            .collect();
        for (source, label, target) in dfa.transitions() {
            let (Some(&p), Some(&q), Some(&a)) = (
                index.get_by_right(source),
                index.get_by_right(target),
                label.symbol().and_then(|c| symbols.get(&c)),
            ) else {
                continue;
            };
            delta[p][a] = q;
        }

        let finals = dfa
            .finals()
            .iter()
            .filter_map(|q| index.get_by_right(q).copied())
            .collect();
        Self {
            index,
            delta,
            finals,
        }
    }

    fn size(&self) -> usize {
        self.delta.len()
    }

    fn state(&self, i: usize) -> Option<&State> {
        self.index.get_by_left(&i)
    }

    /// Hopcroft's refinement of {final, non-final} into the coarsest partition that is
    /// compatible with the transition function. Both initial blocks start out as
    /// splitters. When a block is split, it is replaced by both halves if it is still
    /// waiting as a splitter and otherwise only the smaller half is queued.
    fn refine(&self) -> Vec<BitSet> {
        let n = self.size();
        let symbols = self.delta.first().map_or(0, Vec::len);
        let non_finals: BitSet = (0..n).filter(|q| !self.finals.contains(*q)).collect();
        let mut partition: Vec<BitSet> = [self.finals.clone(), non_finals]
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect();
        let mut worklist = partition.clone();

        while let Some(splitter) = worklist.pop() {
            for a in 0..symbols {
                let pre: BitSet = (0..n)
                    .filter(|q| splitter.contains(self.delta[*q][a]))
                    .collect();
                if pre.is_empty() {
                    continue;
                }
                let mut next = Vec::with_capacity(partition.len() + 1);
                for block in partition.drain(..) {
                    let inside: BitSet = block.intersection(&pre).collect();
                    let outside: BitSet = block.difference(&pre).collect();
                    if inside.is_empty() || outside.is_empty() {
                        next.push(block);
                        continue;
                    }
                    trace!("splitting block of size {} on symbol {a}", block.len());
                    if let Some(pos) = worklist.iter().position(|b| *b == block) {
                        worklist.swap_remove(pos);
                        worklist.push(inside.clone());
                        worklist.push(outside.clone());
                    } else if inside.len() <= outside.len() {
                        worklist.push(inside.clone());
                    } else {
                        worklist.push(outside.clone());
                    }
                    next.push(inside);
                    next.push(outside);
                }
                partition = next;
            }
        }
        partition
    }
}

impl Automaton {
    /// Computes the Myhill-Nerode partition of the states of the complete deterministic
    /// automaton obtained from `self` by [`Automaton::complete`]. Two states share a class
    /// iff they accept the same residual language.
    pub fn nerode_partition(&self) -> Partition<State> {
        let table = Table::new(&self.complete());
        Partition::new(
            table
                .refine()
                .into_iter()
                .map(|block| block.iter().filter_map(|i| table.state(i)).cloned().collect::<Vec<_>>()),
        )
    }

    /// Computes the minimal complete deterministic automaton for the language of `self`.
    ///
    /// A nondeterministic input is determinized first, then the automaton is restricted to
    /// its accessible states and completed. States are merged by partition refinement, each
    /// class is named after its least member and takes the transitions of that member.
    /// Without initial state the result is the one-state automaton `q0` that rejects
    /// everything.
    pub fn minimize(&self) -> Automaton {
        let dfa = if self.is_deterministic() {
            self.without_unreachable()
        } else {
            self.determinize()
        };
        let Some(initial) = dfa.initial().cloned() else {
            return Automaton::rejecting(self.alphabet().clone(), State::from("q0"));
        };
        let dfa = dfa.complete();
        let table = Table::new(&dfa);
        let blocks = table.refine();

        let mut block_of = vec![0; table.size()];
        let mut names = Vec::with_capacity(blocks.len());
        for (b, block) in blocks.iter().enumerate() {
            for q in block.iter() {
                block_of[q] = b;
            }
            names.push(block.iter().next().and_then(|least| table.state(least)));
        }

        let mut out = Automaton::over(dfa.alphabet().clone());
        for (b, block) in blocks.iter().enumerate() {
            let (Some(name), Some(rep)) = (names[b], block.iter().next()) else {
                continue;
            };
            out.insert_state(name.clone());
            if table.finals.contains(rep) {
                out.mark_final(name);
            }
            for (sym, &target) in dfa.alphabet().iter().zip(&table.delta[rep]) {
                if let Some(target) = names[block_of[target]] {
                    out.link(name, Label::Symbol(*sym), target);
                }
            }
        }
        if let Some(&i) = table.index.get_by_right(&initial) {
            if let Some(name) = names[block_of[i]] {
                out.mark_initial(name);
            }
        }

        debug!(
            "minimized automaton with {} states to {} states",
            self.size(),
            out.size()
        );
        out
    }

    /// Decides whether `self` is a minimal deterministic automaton: it is deterministic,
    /// every state is accessible and no two distinct states accept the same residual
    /// language. Missing transitions are treated as leading into an implicit sink, so a
    /// partial automaton can be minimal as well.
    pub fn is_minimal(&self) -> bool {
        if !self.is_deterministic() || self.initial().is_none() {
            return false;
        }
        if self.accessible_states().len() != self.size() {
            return false;
        }
        self.nerode_partition()
            .iter()
            .all(|class| class.iter().filter(|q| self.contains(q)).count() <= 1)
    }

    /// Computes the canonical automaton for the language of `self`: determinize, complete,
    /// prune, minimize and finally rename the states to `q0, q1, ...` in the order in which
    /// a breadth first search from the initial state discovers them, taking symbols in
    /// alphabet order. Two automata over the same alphabet accept the same language iff
    /// their canonical automata are equal.
    ///
    /// The result is accessible, deterministic, complete and minimal. The only state that
    /// may not be co-accessible is a single sink.
    pub fn canonicalize(&self) -> Automaton {
        self.determinize().complete().prune().minimize().relabeled()
    }

    /// Returns true if `self` is equal to its canonical automaton.
    pub fn is_canonical(&self) -> bool {
        *self == self.canonicalize()
    }

    /// Renames the states in breadth first discovery order from the initial state.
    /// States that are not accessible keep their names.
    fn relabeled(&self) -> Automaton {
        let mut names: Map<&State, State> = Map::default();
        if let Some(initial) = self.initial() {
            let mut queue = VecDeque::from([initial]);
            names.insert(initial, State::new("q0"));
            while let Some(q) = queue.pop_front() {
                for sym in self.alphabet() {
                    for p in self.successors(q, Label::Symbol(*sym)) {
                        if !names.contains_key(p) {
                            names.insert(p, State::new(format!("q{}", names.len())));
                            queue.push_back(p);
                        }
                    }
                }
            }
        }
        self.renamed(|q| names.get(q).cloned().unwrap_or_else(|| q.clone()))
    }

    /// Decides language equivalence by comparing canonical automata over the union of both
    /// alphabets.
    pub fn equivalent(&self, other: &Automaton) -> bool {
        let left = self.with_alphabet_extended(other.alphabet());
        let right = other.with_alphabet_extended(self.alphabet());
        left.canonicalize() == right.canonicalize()
    }

    /// Compares membership of every word up to length `max_len` over the union of both
    /// alphabets and returns the first word on which the automata disagree.
    pub fn agrees_up_to(&self, other: &Automaton, max_len: usize) -> Option<Vec<char>> {
        let alphabet = self.alphabet().union(other.alphabet()).copied().collect();
        words_up_to(&alphabet, max_len)
            .find(|w| self.accepts(w.iter().copied()) != other.accepts(w.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn redundant() -> Automaton {
        // q1 and q2 are equivalent, q3 is unreachable
        Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([
                ("q0", 'a', "q1"),
                ("q0", 'b', "q2"),
                ("q1", 'a', "q1"),
                ("q1", 'b', "q1"),
                ("q2", 'a', "q2"),
                ("q2", 'b', "q2"),
                ("q3", 'a', "q0"),
            ])
            .with_initial("q0")
            .with_finals(["q1", "q2"])
            .build()
            .unwrap()
    }

    #[test]
    fn merges_equivalent_states() {
        let aut = redundant();
        assert!(!aut.is_minimal());
        let min = aut.minimize();
        assert_eq!(min.size(), 2);
        assert!(min.contains(&State::from("q1")));
        assert!(!min.contains(&State::from("q2")));
        assert!(min.is_minimal());
        assert!(min.is_complete());
        assert_eq!(min.minimize(), min);
        assert_eq!(aut.agrees_up_to(&min, 5), None);
    }

    #[test]
    fn complete_minimal_dfa_is_recognized() {
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_transitions([("q0", 'a', "q1"), ("q1", 'a', "q1")])
            .with_initial("q0")
            .with_finals(["q1"])
            .build()
            .unwrap();
        assert!(aut.is_complete());
        assert!(aut.is_minimal());
        assert_eq!(aut.minimize(), aut);
    }

    #[test]
    fn equal_size_is_not_enough() {
        // p and q accept the same residual language
        let aut = Automaton::builder()
            .with_alphabet(['a'])
            .with_transitions([("p", 'a', "q"), ("q", 'a', "p")])
            .with_initial("p")
            .with_finals(["p", "q"])
            .build()
            .unwrap();
        assert!(!aut.is_minimal());
        assert_eq!(aut.nerode_partition().size(), 1);
    }

    #[test]
    fn partial_dfa_with_dead_state_is_minimal() {
        let aut = Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([("q0", 'a', "q1"), ("q0", 'b', "dead")])
            .with_initial("q0")
            .with_finals(["q1"])
            .build()
            .unwrap();
        assert!(aut.is_minimal());
    }

    #[test]
    fn canonical_form_is_idempotent_and_unique() {
        let canonical = redundant().canonicalize();
        assert!(canonical.is_canonical());
        assert_eq!(canonical.canonicalize(), canonical);
        assert_eq!(canonical.initial(), Some(&State::from("q0")));

        let other = Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([("s", 'a', "t"), ("s", 'b', "t"), ("t", 'a', "t"), ("t", 'b', "t")])
            .with_initial("s")
            .with_finals(["t"])
            .build()
            .unwrap();
        assert_eq!(other.canonicalize(), canonical);
        assert!(other.equivalent(&redundant()));
    }

    #[test]
    fn canonical_form_of_the_empty_language() {
        let mut aut = redundant();
        aut.clear_initial();
        let canonical = aut.canonicalize();
        assert_eq!(canonical.size(), 1);
        assert_eq!(canonical.initial(), Some(&State::from("q0")));
        assert!(canonical.finals().is_empty());
        assert!(canonical.is_complete());
    }

    #[test]
    fn nondeterministic_input() {
        let nfa = Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([
                ("q0", 'a', "q0"),
                ("q0", 'b', "q0"),
                ("q0", 'a', "q1"),
                ("q1", 'b', "q2"),
            ])
            .with_initial("q0")
            .with_finals(["q2"])
            .build()
            .unwrap();
        let min = nfa.minimize();
        assert!(min.is_deterministic() && min.is_complete());
        assert_eq!(min.size(), 3);
        assert_eq!(nfa.agrees_up_to(&min, 6), None);
    }

    #[test]
    fn disagreement_is_reported() {
        let a = redundant();
        let mut b = redundant();
        b.remove_final(&State::from("q2"));
        assert_eq!(a.agrees_up_to(&b, 3), Some(vec!['b']));
        assert!(!a.equivalent(&b));
    }
}
