//! Systems of right-linear language equations `x = A1 x1 + ... + An xn + B`, where the
//! coefficients are regular expressions, solved by Arden's lemma and substitution.
//!
//! ```
//! use kleene::equation::EquationSystem;
//!
//! let system = EquationSystem::parse("x1 = a x2 + ε\nx2 = b x1").unwrap();
//! let solution = system.solve().unwrap();
//! assert_eq!(solution.to_string(), "x1 = (ab)*\nx2 = b(ab)*");
//! ```

use std::fmt::Display;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    math::OrderedMap,
    regex::{parse, LanguageExpr, Regex, RegexParseError},
};

/// Number of elimination rounds after which [`EquationSystem::solve`] gives up.
pub const ITERATION_LIMIT: usize = 64;

/// A variable `x{n}` of an equation system. Leading zeros are not significant, `x01` and
/// `x1` are the same variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(usize);

impl Variable {
    /// Creates the variable `x{index}`.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The number following the `x`.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Reasons for rejecting an equation system. Lines are counted from 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquationError {
    /// The line has no `=`.
    #[error("line {line}: missing `=`")]
    MissingEquals {
        /// Line of the equation.
        line: usize,
    },
    /// The left hand side is not of the form `x` followed by digits.
    #[error("line {line}: `{found}` is not a variable, expected `x` followed by digits")]
    InvalidVariable {
        /// Line of the equation.
        line: usize,
        /// The left hand side as written.
        found: String,
    },
    /// A coefficient is not a regular expression.
    #[error("line {line}: invalid term `{term}`: {source}")]
    InvalidTerm {
        /// Line of the equation.
        line: usize,
        /// The term as written.
        term: String,
        /// What the expression parser reported.
        #[source]
        source: RegexParseError,
    },
    /// A variable occurs somewhere other than at the end of a term.
    #[error("line {line}: {variable} may only appear at the end of a term")]
    MisplacedVariable {
        /// Line of the equation.
        line: usize,
        /// The variable found inside the coefficient.
        variable: Variable,
    },
    /// A second equation for the same variable.
    #[error("line {line}: {variable} already has an equation")]
    DuplicateVariable {
        /// Line of the second equation.
        line: usize,
        /// The variable.
        variable: Variable,
    },
    /// A variable is referenced but has no equation of its own.
    #[error("line {line}: {variable} has no equation")]
    UndefinedVariable {
        /// Line of the first reference.
        line: usize,
        /// The variable.
        variable: Variable,
    },
    /// Some right hand side still references a variable after the allowed rounds.
    #[error("no closed solution after {rounds} rounds of elimination")]
    DidNotConverge {
        /// Rounds that were carried out.
        rounds: usize,
    },
}

impl EquationError {
    /// The line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            EquationError::MissingEquals { line }
            | EquationError::InvalidVariable { line, .. }
            | EquationError::InvalidTerm { line, .. }
            | EquationError::MisplacedVariable { line, .. }
            | EquationError::DuplicateVariable { line, .. }
            | EquationError::UndefinedVariable { line, .. } => Some(*line),
            EquationError::DidNotConverge { .. } => None,
        }
    }
}

fn joined(old: Option<Regex>, term: Regex) -> Regex {
    match old {
        Some(old) => Regex::union(old, term),
        None => term,
    }
}

/// Right hand side of an equation, the coefficients of all variables it references plus
/// the constant part. A missing constant stands for the empty language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Linear {
    coefficients: OrderedMap<Variable, Regex>,
    constant: Option<Regex>,
}

impl Linear {
    fn add(&mut self, variable: Option<Variable>, coefficient: Regex) {
        match variable {
            Some(v) => {
                let old = self.coefficients.remove(&v);
                self.coefficients.insert(v, joined(old, coefficient));
            }
            None => self.constant = Some(joined(self.constant.take(), coefficient)),
        }
    }

    fn is_closed(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Concatenates `prefix` in front of every term.
    fn prefixed(&self, prefix: &Regex) -> Linear {
        Linear {
            coefficients: self
                .coefficients
                .iter()
                .map(|(v, c)| (*v, Regex::concat(prefix.clone(), c.clone())))
                .collect(),
            constant: self
                .constant
                .as_ref()
                .map(|c| Regex::concat(prefix.clone(), c.clone())),
        }
    }

    /// Rewrites `x = A x + B` into `x = A* B`.
    fn arden(&mut self, variable: Variable) {
        let Some(a) = self.coefficients.remove(&variable) else {
            return;
        };
        if a.nullable() {
            warn!("coefficient {a} of {variable} in its own equation accepts ε, using the least solution");
        }
        *self = self.prefixed(&Regex::star(a));
    }

    /// Replaces the occurrences of `variable` by `form`.
    fn substitute(&mut self, variable: Variable, form: &Linear) {
        let Some(c) = self.coefficients.remove(&variable) else {
            return;
        };
        let scaled = form.prefixed(&c);
        for (v, d) in scaled.coefficients {
            self.add(Some(v), d);
        }
        if let Some(e) = scaled.constant {
            self.add(None, e);
        }
    }
}

impl Display for Linear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let terms = self
            .coefficients
            .iter()
            .map(|(v, c)| match c {
                Regex::Epsilon => v.to_string(),
                Regex::Union(_, _) => format!("({c}) {v}"),
                _ => format!("{c} {v}"),
            })
            .chain(self.constant.iter().map(|c| c.to_string()))
            .join(" + ");
        if terms.is_empty() {
            write!(f, "∅")
        } else {
            write!(f, "{terms}")
        }
    }
}

fn parse_variable(text: &str) -> Option<Variable> {
    let digits = text.strip_prefix('x')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(Variable)
}

/// Splits off a variable at the very end of `term`.
fn trailing_variable(term: &str) -> Option<(&str, Variable)> {
    let head = term.trim_end_matches(|c: char| c.is_ascii_digit());
    let rest = head.strip_suffix('x')?;
    Some((rest, parse_variable(&term[rest.len()..])?))
}

/// Finds the first `x` followed by digits in `text`.
fn find_variable(text: &str) -> Option<Variable> {
    text.char_indices()
        .filter(|(_, c)| *c == 'x')
        .find_map(|(i, _)| {
            let tail = &text[i + 1..];
            let len = tail
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(tail.len());
            parse_variable(&text[i..i + 1 + len])
        })
}

/// Splits a right hand side at the union operators outside of parentheses.
fn split_terms(rhs: &str) -> Vec<&str> {
    let mut terms = vec![];
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in rhs.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '+' | '|' if depth == 0 => {
                terms.push(&rhs[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    terms.push(&rhs[start..]);
    terms
}

fn parse_term(term: &str, line: usize) -> Result<(Regex, Option<Variable>), EquationError> {
    let term = term.trim();
    let (coefficient, variable) = match trailing_variable(term) {
        Some((rest, v)) => (rest.trim_end(), Some(v)),
        None => (term, None),
    };
    if let Some(variable) = find_variable(coefficient) {
        return Err(EquationError::MisplacedVariable { line, variable });
    }
    let regex = if coefficient.is_empty() && variable.is_some() {
        Regex::Epsilon
    } else {
        parse(coefficient).map_err(|source| EquationError::InvalidTerm {
            line,
            term: term.to_string(),
            source,
        })?
    };
    Ok((regex, variable))
}

/// A system of equations, one per variable, in the order they were declared.
///
/// The text format has one equation `xi = term + term + ...` per line, where a term is a
/// regular expression optionally followed by a variable, a variable alone, or `ε`. Terms
/// are separated by `+` or `|` outside of parentheses and `#` starts a comment. A variable
/// may only stand at the end of a term, so the equations are right-linear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquationSystem {
    equations: Vec<(Variable, Linear)>,
}

impl EquationSystem {
    /// Parses a system from its text representation.
    pub fn parse(text: &str) -> Result<Self, EquationError> {
        let mut equations: Vec<(Variable, Linear)> = vec![];
        let mut references = vec![];
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split_once('#').map_or(raw, |(l, _)| l).trim();
            if content.is_empty() {
                continue;
            }
            let Some((lhs, rhs)) = content.split_once('=') else {
                return Err(EquationError::MissingEquals { line });
            };
            let lhs = lhs.trim();
            let variable = parse_variable(lhs).ok_or_else(|| EquationError::InvalidVariable {
                line,
                found: lhs.to_string(),
            })?;
            if equations.iter().any(|(v, _)| *v == variable) {
                return Err(EquationError::DuplicateVariable { line, variable });
            }

            let mut form = Linear::default();
            for term in split_terms(rhs) {
                let (coefficient, reference) = parse_term(term, line)?;
                if let Some(v) = reference {
                    references.push((line, v));
                }
                form.add(reference, coefficient);
            }
            trace!("line {line}: {variable} = {form}");
            equations.push((variable, form));
        }

        for (line, variable) in references {
            if !equations.iter().any(|(v, _)| *v == variable) {
                return Err(EquationError::UndefinedVariable { line, variable });
            }
        }
        debug!("parsed system of {} equations", equations.len());
        Ok(Self { equations })
    }

    /// The variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.equations.iter().map(|(v, _)| *v)
    }

    /// Number of equations.
    pub fn len(&self) -> usize {
        self.equations.len()
    }

    /// True if there are no equations.
    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    /// Solves the system within [`ITERATION_LIMIT`] rounds, see [`EquationSystem::solve_within`].
    pub fn solve(&self) -> Result<Solution, EquationError> {
        self.solve_within(ITERATION_LIMIT)
    }

    /// Solves the system. In each round the variables are eliminated starting from the
    /// last declared one: a self reference `x = A x + B` is resolved to `x = A* B` by
    /// Arden's lemma and the resulting right hand side is substituted into every other
    /// equation. Rounds are repeated until no right hand side references a variable,
    /// giving up with [`EquationError::DidNotConverge`] after `max_rounds` rounds.
    ///
    /// If a self coefficient `A` accepts the empty word, the equation has more than one
    /// solution; `A* B` is the least of them and a warning is logged.
    pub fn solve_within(&self, max_rounds: usize) -> Result<Solution, EquationError> {
        let mut forms = self.equations.clone();
        let mut rounds = 0;
        while forms.iter().any(|(_, form)| !form.is_closed()) {
            if rounds == max_rounds {
                return Err(EquationError::DidNotConverge { rounds });
            }
            rounds += 1;
            for k in (0..forms.len()).rev() {
                let variable = forms[k].0;
                forms[k].1.arden(variable);
                let form = forms[k].1.clone();
                for (i, (_, other)) in forms.iter_mut().enumerate() {
                    if i != k {
                        other.substitute(variable, &form);
                    }
                }
                trace!("eliminated {variable} = {form}");
            }
        }
        debug!("solved {} equations in {rounds} rounds", forms.len());
        Ok(Solution {
            values: forms
                .into_iter()
                .map(|(v, form)| (v, form.constant.map_or(LanguageExpr::Empty, LanguageExpr::Regex)))
                .collect(),
        })
    }
}

impl std::str::FromStr for EquationSystem {
    type Err = EquationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for EquationSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self
            .equations
            .iter()
            .map(|(v, form)| format!("{v} = {form}"))
            .join("\n");
        write!(f, "{lines}")
    }
}

/// The value of every variable of a solved system, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<(Variable, LanguageExpr)>,
}

impl Solution {
    /// The language assigned to `variable`.
    pub fn get(&self, variable: Variable) -> Option<&LanguageExpr> {
        self.values
            .iter()
            .find_map(|(v, value)| (*v == variable).then_some(value))
    }

    /// Iterates over the variables and their values.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &LanguageExpr)> + '_ {
        self.values.iter().map(|(v, value)| (*v, value))
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self
            .values
            .iter()
            .map(|(v, value)| format!("{v} = {value}"))
            .join("\n");
        write!(f, "{lines}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(i: usize) -> Variable {
        Variable::new(i)
    }

    fn value(solution: &Solution, i: usize) -> String {
        solution.get(x(i)).unwrap().to_string()
    }

    #[test_log::test]
    fn alternating_words() {
        let system = EquationSystem::parse("x1 = a x2 + ε\nx2 = b x1").unwrap();
        assert_eq!(system.variables().collect::<Vec<_>>(), vec![x(1), x(2)]);
        let solution = system.solve().unwrap();
        assert_eq!(value(&solution, 1), "(ab)*");
        assert_eq!(value(&solution, 2), "b(ab)*");
    }

    #[test]
    fn comments_and_blank_lines() {
        let text = "# a single loop\n\nx1 = a x1 + b   # trailing comment\n";
        let system = EquationSystem::parse(text).unwrap();
        assert_eq!(system.len(), 1);
        assert_eq!(system.to_string(), "x1 = a x1 + b");
        assert_eq!(system.solve().unwrap().to_string(), "x1 = a*b");
    }

    #[test]
    fn terms_with_unions_and_parentheses() {
        let system = EquationSystem::parse("x1 = (a|b) x1 | c\nx2 = ab x1 + x1").unwrap();
        let solution = system.solve().unwrap();
        assert_eq!(value(&solution, 1), "(a+b)*c");
        let x2 = parse(&value(&solution, 2)).unwrap().glushkov();
        for accepted in ["c", "abc", "ababc", "bac"] {
            assert!(x2.accepts(accepted.chars()), "{accepted}");
        }
        assert!(!x2.accepts("ab".chars()));
    }

    #[test]
    fn unreachable_constant_gives_empty_language() {
        let solution = EquationSystem::parse("x1 = a x1").unwrap().solve().unwrap();
        assert_eq!(solution.get(x(1)), Some(&LanguageExpr::Empty));
        assert_eq!(solution.to_string(), "x1 = ∅");
    }

    #[test_log::test]
    fn nullable_coefficient_yields_least_solution() {
        let solution = EquationSystem::parse("x1 = (a+ε) x1 + b").unwrap().solve().unwrap();
        assert_eq!(value(&solution, 1), "a*b");
    }

    #[test]
    fn malformed_systems() {
        let cases = [
            ("x1 a", EquationError::MissingEquals { line: 1 }),
            (
                "\ny = a",
                EquationError::InvalidVariable {
                    line: 2,
                    found: "y".to_string(),
                },
            ),
            (
                "x1 = x2 a\nx2 = a",
                EquationError::MisplacedVariable {
                    line: 1,
                    variable: x(2),
                },
            ),
            (
                "x1 = a\nx1 = b",
                EquationError::DuplicateVariable {
                    line: 2,
                    variable: x(1),
                },
            ),
            (
                "x1 = a x3",
                EquationError::UndefinedVariable {
                    line: 1,
                    variable: x(3),
                },
            ),
        ];
        for (text, expected) in cases {
            assert_eq!(EquationSystem::parse(text), Err(expected), "{text}");
        }

        let err = EquationSystem::parse("x1 = (a x1").unwrap_err();
        assert!(matches!(err, EquationError::InvalidTerm { line: 1, .. }));
        assert_eq!(err.line(), Some(1));
        assert!(EquationSystem::parse("x1 = a +").is_err());
    }

    #[test]
    fn iteration_ceiling() {
        let system = EquationSystem::parse("x1 = a x2\nx2 = b").unwrap();
        assert_eq!(
            system.solve_within(0),
            Err(EquationError::DidNotConverge { rounds: 0 })
        );
        assert!(system.solve_within(1).is_ok());
        let closed = EquationSystem::parse("x1 = a").unwrap();
        assert!(closed.solve_within(0).is_ok());
    }
}
