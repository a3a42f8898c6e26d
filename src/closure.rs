//! Closure properties of regular languages as constructions on automata.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, FreshNames, Label, State},
    math::{OrderedMap, OrderedSet},
};

/// Prefix given to the states of the left operand of a binary construction.
pub const LEFT_PREFIX: &str = "1_";
/// Prefix given to the states of the right operand of a binary construction.
pub const RIGHT_PREFIX: &str = "2_";

/// Copies states and transitions of `part` into `out`, without initial and final marks.
fn absorb(out: &mut Automaton, part: &Automaton) {
    for q in part.states() {
        out.insert_state(q.clone());
    }
    for (p, label, q) in part.transitions() {
        out.link(p, label, q);
    }
}

impl Automaton {
    /// Accepts the words accepted by `self` or by `other`. The operands are copied with
    /// their states prefixed by `1_` and `2_` and a fresh initial state leads to both of
    /// their initial states by epsilon. The alphabet is the union of both alphabets.
    pub fn union(&self, other: &Automaton) -> Automaton {
        let left = self.renamed(|q| q.prefixed(LEFT_PREFIX));
        let right = other.renamed(|q| q.prefixed(RIGHT_PREFIX));

        let mut out = Automaton::over(self.alphabet() | other.alphabet());
        absorb(&mut out, &left);
        absorb(&mut out, &right);
        let initial = FreshNames::avoiding(out.states()).claim("init");
        out.mark_initial(&initial);
        for part in [&left, &right] {
            if let Some(q) = part.initial() {
                out.link(&initial, Label::Epsilon, q);
            }
            for q in part.finals() {
                out.mark_final(q);
            }
        }
        debug!("union has {} states", out.size());
        out
    }

    /// Accepts the concatenations of a word of `self` with a word of `other`. Every final
    /// state of the (prefixed) left operand gets an epsilon transition to the initial state
    /// of the right operand; the initial state is that of the left operand and the final
    /// states are those of the right one.
    pub fn concatenate(&self, other: &Automaton) -> Automaton {
        let left = self.renamed(|q| q.prefixed(LEFT_PREFIX));
        let right = other.renamed(|q| q.prefixed(RIGHT_PREFIX));

        let mut out = Automaton::over(self.alphabet() | other.alphabet());
        absorb(&mut out, &left);
        absorb(&mut out, &right);
        if let Some(bridge) = right.initial() {
            for q in left.finals() {
                out.link(q, Label::Epsilon, bridge);
            }
        }
        if let Some(q) = left.initial() {
            out.mark_initial(q);
        }
        for q in right.finals() {
            out.mark_final(q);
        }
        debug!("concatenation has {} states", out.size());
        out
    }

    /// Accepts any concatenation of words accepted by `self`, including the empty one. A
    /// fresh initial state leads by epsilon to the old initial state and to a fresh final
    /// state, and every old final state leads back to the old initial state and on to the
    /// fresh final state, which is the only final state of the result.
    pub fn star(&self) -> Automaton {
        let mut names = FreshNames::avoiding(self.states());
        let start = names.claim("init");
        let end = names.claim("final");

        let mut out = Automaton::over(self.alphabet().clone());
        absorb(&mut out, self);
        out.mark_initial(&start);
        out.mark_final(&end);
        out.link(&start, Label::Epsilon, &end);
        if let Some(initial) = self.initial() {
            out.link(&start, Label::Epsilon, initial);
            for q in self.finals() {
                out.link(q, Label::Epsilon, initial);
                out.link(q, Label::Epsilon, &end);
            }
        }
        out
    }

    /// Accepts exactly the words over the alphabet of `self` that `self` rejects. The
    /// automaton is determinized and completed, then final and non-final states swap roles.
    pub fn complement(&self) -> Automaton {
        self.complement_over(self.alphabet())
    }

    /// Like [`Automaton::complement`], but relative to the words over the alphabet of `self`
    /// extended by `alphabet`.
    pub fn complement_over(&self, alphabet: &OrderedSet<char>) -> Automaton {
        let extended = self.with_alphabet_extended(alphabet);
        let mut dfa = if extended.initial().is_some() {
            extended.complete()
        } else {
            Automaton::rejecting(extended.alphabet().clone(), State::from("q0"))
        };
        for q in dfa.states().clone() {
            if !dfa.remove_final(&q) {
                dfa.mark_final(&q);
            }
        }
        dfa
    }

    /// Accepts the words accepted by both automata. Epsilon transitions are removed first,
    /// then the product is explored breadth first from the pair of initial states over the
    /// common alphabet, so only reachable pairs `(p,q)` appear. A pair is final if both
    /// components are.
    pub fn intersection(&self, other: &Automaton) -> Automaton {
        let alphabet: OrderedSet<char> = self.alphabet() & other.alphabet();
        let mut out = Automaton::over(alphabet.clone());
        let (left, right) = (self.remove_epsilon(), other.remove_epsilon());
        let (Some(l0), Some(r0)) = (left.initial(), right.initial()) else {
            debug!("an operand has no initial state, the intersection is empty");
            return out;
        };

        let mut names = FreshNames::default();
        let mut pairs: OrderedMap<(&State, &State), State> = OrderedMap::new();
        let mut queue = VecDeque::new();
        let name = names.claim(format!("({l0},{r0})"));
        out.mark_initial(&name);
        pairs.insert((l0, r0), name);
        queue.push_back((l0, r0));

        while let Some((p, q)) = queue.pop_front() {
            let source = pairs[&(p, q)].clone();
            if left.is_final(p) && right.is_final(q) {
                out.mark_final(&source);
            }
            for &sym in &alphabet {
                for p2 in left.successors(p, Label::Symbol(sym)) {
                    for q2 in right.successors(q, Label::Symbol(sym)) {
                        let target = match pairs.get(&(p2, q2)) {
                            Some(name) => name.clone(),
                            None => {
                                let name = names.claim(format!("({p2},{q2})"));
                                trace!("discovered pair {name}");
                                pairs.insert((p2, q2), name.clone());
                                queue.push_back((p2, q2));
                                name
                            }
                        };
                        out.link(&source, Label::Symbol(sym), &target);
                    }
                }
            }
        }
        debug!("product has {} reachable states", out.size());
        out
    }

    /// Accepts the words accepted by `self` but not by `other`.
    pub fn difference(&self, other: &Automaton) -> Automaton {
        let alphabet = self.alphabet() | other.alphabet();
        self.intersection(&other.complement_over(&alphabet))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::regex::{glushkov, thompson};
    use crate::word::words_up_to;

    fn alphabet() -> OrderedSet<char> {
        OrderedSet::from(['a', 'b'])
    }

    #[test]
    fn union_and_intersection() {
        let a = thompson("a(a|b)*").unwrap();
        let b = glushkov("(a|b)*b").unwrap();
        let union = a.union(&b);
        let inter = a.intersection(&b);
        let diff = a.difference(&b);
        assert!(!inter.has_epsilon_transitions());
        for w in words_up_to(&alphabet(), 5) {
            let (in_a, in_b) = (a.accepts(w.clone()), b.accepts(w.clone()));
            assert_eq!(union.accepts(w.clone()), in_a || in_b);
            assert_eq!(inter.accepts(w.clone()), in_a && in_b);
            assert_eq!(diff.accepts(w), in_a && !in_b);
        }
        assert!(inter.accessible_states().len() == inter.size());
    }

    #[test]
    fn union_renames_operands() {
        let a = glushkov("a").unwrap();
        let union = a.union(&a);
        assert!(union.contains(&State::from("1_q0")));
        assert!(union.contains(&State::from("2_q1")));
        assert_eq!(union.initial(), Some(&State::from("init")));
        assert_eq!(union.size(), 5);
    }

    #[test]
    fn concatenation() {
        let a = glushkov("a*").unwrap();
        let b = glushkov("b").unwrap();
        let cat = a.concatenate(&b);
        assert_eq!(cat.alphabet(), &alphabet());
        assert!(cat.accepts("aab".chars()));
        assert!(cat.accepts("b".chars()));
        assert!(!cat.accepts("ba".chars()));
    }

    #[test]
    fn star_accepts_repetitions() {
        let ab = glushkov("ab").unwrap();
        let star = ab.star();
        assert_eq!(star.finals().len(), 1);
        for w in ["", "ab", "abab"] {
            assert!(star.accepts(w.chars()));
        }
        assert!(!star.accepts("aba".chars()));
        assert!(Automaton::new(['a']).unwrap().star().accepts("".chars()));
    }

    #[test]
    fn complement_is_involutive() {
        let a = thompson("(a|b)*ab").unwrap();
        let c = a.complement();
        assert!(c.is_deterministic() && c.is_complete());
        for w in words_up_to(&alphabet(), 5) {
            assert_ne!(a.accepts(w.clone()), c.accepts(w));
        }
        assert!(c.complement().equivalent(&a));
    }

    #[test]
    fn complement_over_larger_alphabet() {
        let a = glushkov("a*").unwrap();
        let c = a.complement_over(&alphabet());
        assert!(c.accepts("b".chars()));
        assert!(!c.accepts("aa".chars()));

        let nothing = Automaton::new(['a']).unwrap();
        assert!(nothing.complement().accepts("aaa".chars()));
    }

    #[test]
    fn intersection_over_common_alphabet() {
        let a = glushkov("(a|c)*").unwrap();
        let b = glushkov("(a|b)*").unwrap();
        let inter = a.intersection(&b);
        assert_eq!(inter.alphabet(), &OrderedSet::from(['a']));
        assert!(inter.accepts("aaa".chars()));
        assert_eq!(inter.initial(), Some(&State::from("(q0,q0)")));
    }
}
