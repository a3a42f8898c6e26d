use std::cmp::Ordering;
use std::fmt::{Debug, Display};

use crate::math::Set;

/// The character used to write the empty word, both as a transition label and as a
/// regular expression term.
pub const EPSILON: char = 'ε';

/// An opaque state identifier.
///
/// States are ordered **shortlex**: a shorter name always comes first and names of equal
/// length are compared bytewise. Thus `q2 < q10 < q11 < p100`. Every ordered collection of
/// states in this crate uses this order, which makes subset names, elimination order and
/// canonical numbering independent of insertion order.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct State(String);

impl State {
    /// Creates a state from anything that can be turned into a `String`.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name of the state.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Creates a new state whose name is that of `self` with the given prefix prepended.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self(format!("{prefix}{}", self.0))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for State {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for State {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&State> for State {
    fn from(value: &State) -> Self {
        value.clone()
    }
}

/// The label of a transition, either the empty word or a symbol of the alphabet.
/// `Epsilon` orders before every symbol.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Label {
    /// The empty word.
    Epsilon,
    /// A symbol of the alphabet.
    Symbol(char),
}

impl Label {
    /// Returns the symbol if `self` is not epsilon.
    pub fn symbol(&self) -> Option<char> {
        match self {
            Label::Epsilon => None,
            Label::Symbol(c) => Some(*c),
        }
    }

    /// Returns true if `self` is the epsilon label.
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }
}

impl From<char> for Label {
    fn from(value: char) -> Self {
        if value == EPSILON {
            Label::Epsilon
        } else {
            Label::Symbol(value)
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Epsilon => write!(f, "{EPSILON}"),
            Label::Symbol(c) => write!(f, "{c}"),
        }
    }
}

impl Debug for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

/// Generator for state names that are guaranteed not to clash with names already in use.
///
/// A generator lives for the duration of a single construction, so the produced names
/// only depend on the input of that construction.
#[derive(Debug, Clone, Default)]
pub struct FreshNames {
    used: Set<State>,
    counter: usize,
}

impl FreshNames {
    /// Creates a generator that avoids every state yielded by `taken`.
    pub fn avoiding<'a, I: IntoIterator<Item = &'a State>>(taken: I) -> Self {
        Self {
            used: taken.into_iter().cloned().collect(),
            counter: 0,
        }
    }

    /// Returns the next unused name of the form `{prefix}{n}`.
    pub fn fresh(&mut self, prefix: &str) -> State {
        loop {
            let candidate = State(format!("{prefix}{}", self.counter));
            self.counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Returns `preferred` if it is still unused, otherwise a variant of it with
    /// a numeric suffix appended.
    pub fn claim(&mut self, preferred: impl Into<State>) -> State {
        let preferred = preferred.into();
        if self.used.insert(preferred.clone()) {
            return preferred;
        }
        let mut suffix = 1usize;
        loop {
            let candidate = State(format!("{}'{suffix}", preferred.0));
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::OrderedSet;

    #[test]
    fn shortlex_order() {
        let states: OrderedSet<State> = ["q10", "q2", "p100", "q1", "a"]
            .into_iter()
            .map(State::from)
            .collect();
        let names: Vec<_> = states.iter().map(|q| q.name()).collect();
        assert_eq!(names, vec!["a", "q1", "q2", "q10", "p100"]);
    }

    #[test]
    fn labels() {
        assert_eq!(Label::from('ε'), Label::Epsilon);
        assert_eq!(Label::from('a').symbol(), Some('a'));
        assert!(Label::Epsilon < Label::Symbol('a'));
        assert_eq!(Label::Epsilon.to_string(), "ε");
    }

    #[test]
    fn fresh_names_skip_taken() {
        let taken = [State::from("s0"), State::from("s2")];
        let mut names = FreshNames::avoiding(taken.iter());
        assert_eq!(names.fresh("s"), State::from("s1"));
        assert_eq!(names.fresh("s"), State::from("s3"));
        assert_eq!(names.claim("s0"), State::from("s0'1"));
        assert_eq!(names.claim("t"), State::from("t"));
        assert_eq!(names.claim("t"), State::from("t'1"));
    }
}
