//! Library for working with finite automata and regular expressions over single character
//! symbols.
//!
//! The central type is [`Automaton`], a possibly nondeterministic finite automaton with
//! epsilon transitions. It stores states, alphabet and transitions in ordered collections,
//! so every construction, printout and serialization is deterministic. States are identified
//! by name (see [`automaton::State`]) and ordered shortlex, which is what fixes the names of
//! subset states, the order in which states are eliminated and the numbering of canonical
//! forms.
//!
//! Operations never modify their input, each of them returns a fresh automaton:
//! - structural analysis such as epsilon closures and (co-)accessible states,
//! - [`Automaton::determinize`], [`Automaton::complete`], [`Automaton::prune`],
//!   [`Automaton::minimize`] and [`Automaton::canonicalize`],
//! - [`Automaton::remove_epsilon`] and [`Automaton::add_epsilon`],
//! - the closure constructions [`Automaton::union`], [`Automaton::concatenate`],
//!   [`Automaton::star`], [`Automaton::complement`] and [`Automaton::intersection`],
//! - conversion into a regular expression by state elimination, [`Automaton::to_regex`].
//!
//! Regular expressions are parsed and turned into automata by the [`regex`] module, either by
//! Thompson's or by Glushkov's construction. The [`equation`] module solves systems of
//! right-linear language equations. Automata are exchanged as JSON records, see
//! [`automaton::AutomatonRecord`].
//!
//! ```
//! use kleene::prelude::*;
//!
//! let nfa = kleene::regex::thompson("(a|b)*ab").unwrap();
//! let dfa = nfa.canonicalize();
//! assert!(dfa.is_deterministic() && dfa.is_complete());
//! assert!(dfa.accepts("bbab".chars()));
//! assert_eq!(dfa.size(), 3);
//! ```
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use kleene::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        automaton::{
            Automaton, AutomatonBuilder, AutomatonError, AutomatonRecord, FreshNames, Label,
            RecordError, State, EPSILON,
        },
        equation::{EquationError, EquationSystem, Solution, Variable},
        math,
        math::{OrderedMap, OrderedSet},
        regex::{LanguageExpr, Regex, RegexParseError},
        Show,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

mod show;
pub use show::{show_duration, Show};

/// Defines the automaton model, its builder, rendering and the JSON exchange record.
pub mod automaton;
pub use automaton::Automaton;

mod analysis;

/// Subset construction.
pub mod determinize;

/// Completion with a sink state and pruning of useless states.
pub mod completion;

mod minimization;

/// Removal and introduction of epsilon transitions.
pub mod epsilon;

pub mod regex;

mod elimination;

pub mod closure;

pub mod equation;

/// Module that contains definitions for dealing with words.
pub mod word;

/// Implements the generation of random automata.
#[cfg(feature = "random")]
pub mod random;
