//! Regular expressions: the term algebra shared by the constructions in both directions,
//! a parser and the Thompson and Glushkov constructions.
//!
//! ```
//! use kleene::regex;
//!
//! let thompson = regex::thompson("(a|b)*ab").unwrap();
//! let glushkov = regex::glushkov("(a|b)*ab").unwrap();
//! assert!(thompson.equivalent(&glushkov));
//! assert!(!glushkov.has_epsilon_transitions());
//! ```

use crate::automaton::Automaton;

mod ast;
pub use ast::{LanguageExpr, Regex};

mod parser;
pub use parser::{parse, RegexParseError};

mod glushkov;
mod thompson;
pub use thompson::THOMPSON_PREFIX;

/// Parses `input` and builds its Thompson automaton, see [`Regex::thompson`].
pub fn thompson(input: &str) -> Result<Automaton, RegexParseError> {
    Ok(parse(input)?.thompson())
}

/// Parses `input` and builds its position automaton, see [`Regex::glushkov`].
pub fn glushkov(input: &str) -> Result<Automaton, RegexParseError> {
    Ok(parse(input)?.glushkov())
}
