use std::fmt::Display;

use crate::{
    automaton::{Label, EPSILON},
    math::OrderedSet,
};

/// A regular expression over single character symbols.
///
/// The constructors [`Regex::union`], [`Regex::concat`] and [`Regex::star`] apply a few
/// simplifications that do not change the denoted language, the variants can also be
/// built directly if the exact tree matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Regex {
    /// The empty word.
    Epsilon,
    /// A single symbol.
    Symbol(char),
    /// Words of either side.
    Union(Box<Regex>, Box<Regex>),
    /// A word of the left side followed by a word of the right side.
    Concat(Box<Regex>, Box<Regex>),
    /// Any number of repetitions, including none.
    Star(Box<Regex>),
}

/// The result of turning an automaton into an expression: either the language is empty,
/// which no expression of [`Regex`] denotes, or it is given by an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageExpr {
    /// The empty language, rendered as `∅`.
    Empty,
    /// A nonempty language.
    Regex(Regex),
}

impl LanguageExpr {
    /// Returns the expression if the language is not empty.
    pub fn regex(&self) -> Option<&Regex> {
        match self {
            LanguageExpr::Empty => None,
            LanguageExpr::Regex(r) => Some(r),
        }
    }
}

impl Display for LanguageExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageExpr::Empty => write!(f, "∅"),
            LanguageExpr::Regex(r) => write!(f, "{r}"),
        }
    }
}

impl Regex {
    /// Union with the simplifications `r + r = r`. A term that already occurs in the
    /// union chain of the other side is not added again.
    pub fn union(left: Regex, right: Regex) -> Regex {
        if left.union_terms().contains(&&right) {
            return left;
        }
        if right.union_terms().contains(&&left) {
            return right;
        }
        Regex::Union(Box::new(left), Box::new(right))
    }

    /// Concatenation with the simplifications `εr = rε = r`.
    pub fn concat(left: Regex, right: Regex) -> Regex {
        match (left, right) {
            (Regex::Epsilon, r) | (r, Regex::Epsilon) => r,
            (l, r) => Regex::Concat(Box::new(l), Box::new(r)),
        }
    }

    /// Kleene star with the simplifications `ε* = ε`, `(r*)* = r*` and `(ε + r)* = r*`.
    pub fn star(inner: Regex) -> Regex {
        let terms: Vec<&Regex> = inner
            .union_terms()
            .into_iter()
            .filter(|t| **t != Regex::Epsilon)
            .collect();
        let Some(stripped) = terms.into_iter().cloned().reduce(Regex::union) else {
            return Regex::Epsilon;
        };
        match stripped {
            Regex::Star(_) => stripped,
            other => Regex::Star(Box::new(other)),
        }
    }

    /// Folds a sequence of expressions with [`Regex::union`], `None` if it is empty.
    pub fn union_of<I: IntoIterator<Item = Regex>>(terms: I) -> Option<Regex> {
        terms.into_iter().reduce(Regex::union)
    }

    /// Returns the operands of the outermost chain of unions, or `self` if it is not a union.
    pub fn union_terms(&self) -> Vec<&Regex> {
        match self {
            Regex::Union(l, r) => {
                let mut terms = l.union_terms();
                terms.extend(r.union_terms());
                terms
            }
            other => vec![other],
        }
    }

    /// Returns true if the empty word belongs to the denoted language.
    pub fn nullable(&self) -> bool {
        match self {
            Regex::Epsilon | Regex::Star(_) => true,
            Regex::Symbol(_) => false,
            Regex::Union(l, r) => l.nullable() || r.nullable(),
            Regex::Concat(l, r) => l.nullable() && r.nullable(),
        }
    }

    /// The symbols that occur in the expression.
    pub fn symbols(&self) -> OrderedSet<char> {
        let mut out = OrderedSet::new();
        self.collect_leaves(&mut |c| {
            out.insert(c);
        });
        out
    }

    /// The symbol occurrences from left to right, i.e. the positions of the expression.
    pub fn leaves(&self) -> Vec<char> {
        let mut out = vec![];
        self.collect_leaves(&mut |c| out.push(c));
        out
    }

    fn collect_leaves<F: FnMut(char)>(&self, f: &mut F) {
        match self {
            Regex::Epsilon => {}
            Regex::Symbol(c) => f(*c),
            Regex::Union(l, r) | Regex::Concat(l, r) => {
                l.collect_leaves(f);
                r.collect_leaves(f);
            }
            Regex::Star(inner) => inner.collect_leaves(f),
        }
    }

    /// Binding strength, used to decide where parentheses are needed.
    fn precedence(&self) -> u8 {
        match self {
            Regex::Union(_, _) => 0,
            Regex::Concat(_, _) => 1,
            Regex::Star(_) => 2,
            Regex::Epsilon | Regex::Symbol(_) => 3,
        }
    }

    fn fmt_operand(&self, f: &mut std::fmt::Formatter<'_>, min: u8) -> std::fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl From<Label> for Regex {
    fn from(value: Label) -> Self {
        match value {
            Label::Epsilon => Regex::Epsilon,
            Label::Symbol(c) => Regex::Symbol(c),
        }
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regex::Epsilon => write!(f, "{EPSILON}"),
            Regex::Symbol(c) => write!(f, "{c}"),
            Regex::Union(l, r) => {
                l.fmt_operand(f, 0)?;
                write!(f, "+")?;
                r.fmt_operand(f, 0)
            }
            Regex::Concat(l, r) => {
                l.fmt_operand(f, 1)?;
                r.fmt_operand(f, 1)
            }
            Regex::Star(inner) => {
                inner.fmt_operand(f, 2)?;
                write!(f, "*")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Regex {
        Regex::Symbol(c)
    }

    #[test]
    fn smart_constructors_simplify() {
        assert_eq!(Regex::concat(Regex::Epsilon, sym('a')), sym('a'));
        assert_eq!(Regex::concat(sym('a'), Regex::Epsilon), sym('a'));
        assert_eq!(Regex::union(sym('a'), sym('a')), sym('a'));
        let ab = Regex::union(sym('a'), sym('b'));
        assert_eq!(Regex::union(ab.clone(), sym('b')), ab);
        assert_eq!(Regex::star(Regex::Epsilon), Regex::Epsilon);
        let a_star = Regex::star(sym('a'));
        assert_eq!(Regex::star(a_star.clone()), a_star);
        assert_eq!(Regex::star(Regex::union(Regex::Epsilon, sym('a'))), a_star);
        assert_eq!(
            Regex::star(Regex::union(Regex::union(sym('a'), Regex::Epsilon), sym('b'))),
            Regex::star(ab)
        );
    }

    #[test]
    fn display_uses_minimal_parentheses() {
        let ab = Regex::concat(sym('a'), sym('b'));
        assert_eq!(Regex::star(ab.clone()).to_string(), "(ab)*");
        let union = Regex::union(sym('a'), ab.clone());
        assert_eq!(union.to_string(), "a+ab");
        assert_eq!(Regex::concat(union.clone(), sym('c')).to_string(), "(a+ab)c");
        assert_eq!(Regex::star(union).to_string(), "(a+ab)*");
        assert_eq!(Regex::concat(sym('b'), Regex::star(ab)).to_string(), "b(ab)*");
        assert_eq!(LanguageExpr::Empty.to_string(), "∅");
    }

    #[test]
    fn leaves_and_nullability() {
        let r = Regex::concat(
            Regex::star(Regex::union(sym('b'), sym('a'))),
            Regex::concat(sym('a'), sym('b')),
        );
        assert_eq!(r.leaves(), vec!['b', 'a', 'a', 'b']);
        assert_eq!(r.symbols().into_iter().collect::<Vec<_>>(), vec!['a', 'b']);
        assert!(!r.nullable());
        assert!(Regex::star(sym('a')).nullable());
    }
}
