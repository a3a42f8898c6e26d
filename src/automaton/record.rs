use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::math::OrderedMap;

use super::{Automaton, AutomatonError, FreshNames, Label, State};

/// The exchange format in which automata are handed over by and to external collaborators.
///
/// ```json
/// {
///   "states": ["q0", "q1"],
///   "alphabet": ["a"],
///   "transitions": { "q0": { "a": ["q1"] }, "q1": { "a": ["q1"], "ε": ["q0"] } },
///   "initial": ["q0"],
///   "final": ["q1"]
/// }
/// ```
///
/// Symbols are strings of exactly one character, the key `ε` denotes epsilon transitions.
/// The `initial` field is a sequence: a record with several initial states is normalized
/// upon conversion by a fresh initial state with epsilon transitions to each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonRecord {
    /// All states in order.
    #[serde(default)]
    pub states: Vec<String>,
    /// The alphabet in order.
    #[serde(default)]
    pub alphabet: Vec<String>,
    /// Mapping from source over symbol to the targets.
    #[serde(default)]
    pub transitions: OrderedMap<String, OrderedMap<String, Vec<String>>>,
    /// The initial states, usually a single one.
    #[serde(default)]
    pub initial: Vec<String>,
    /// The final states.
    #[serde(default, rename = "final")]
    pub finals: Vec<String>,
}

/// Errors that occur when reading an automaton from its JSON exchange format.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The input is not a well-formed record.
    #[error("malformed automaton record: {0}")]
    Json(#[from] serde_json::Error),
    /// The record describes something that is not a valid automaton.
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}

fn parse_symbol(symbol: &str) -> Result<char, AutomatonError> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(AutomatonError::InvalidSymbol(symbol.to_string())),
    }
}

impl TryFrom<AutomatonRecord> for Automaton {
    type Error = AutomatonError;

    fn try_from(record: AutomatonRecord) -> Result<Self, Self::Error> {
        let alphabet = record
            .alphabet
            .iter()
            .map(|s| parse_symbol(s))
            .collect::<Result<Vec<_>, _>>()?;
        let mut aut = Automaton::new(alphabet)?;
        for q in &record.states {
            aut.add_state(q.as_str());
        }

        for (source, by_symbol) in &record.transitions {
            for (symbol, targets) in by_symbol {
                let label = Label::from(parse_symbol(symbol)?);
                aut.add_transition(source.as_str(), label, targets.iter().map(String::as_str))?;
            }
        }

        match record.initial.as_slice() {
            [] => {}
            [single] => aut.set_initial(single.as_str())?,
            several => {
                let listed = several
                    .iter()
                    .map(|q| aut.validate_state(State::from(q.as_str())))
                    .collect::<Result<Vec<_>, _>>()?;
                let fan_out = FreshNames::avoiding(aut.states()).claim("init");
                debug!("normalizing {} initial states through {fan_out}", listed.len());
                aut.add_state(fan_out.clone());
                aut.add_transition(fan_out.clone(), Label::Epsilon, listed)?;
                aut.set_initial(fan_out)?;
            }
        }

        for q in &record.finals {
            aut.add_final(q.as_str())?;
        }
        Ok(aut)
    }
}

impl From<&Automaton> for AutomatonRecord {
    fn from(aut: &Automaton) -> Self {
        let mut transitions: OrderedMap<String, OrderedMap<String, Vec<String>>> =
            OrderedMap::new();
        for (source, by_label) in aut.transition_map() {
            let entry = transitions.entry(source.to_string()).or_default();
            for (label, targets) in by_label {
                entry.insert(
                    label.to_string(),
                    targets.iter().map(|q| q.to_string()).collect(),
                );
            }
        }
        Self {
            states: aut.states().iter().map(|q| q.to_string()).collect(),
            alphabet: aut.alphabet().iter().map(|c| c.to_string()).collect(),
            transitions,
            initial: aut.initial().map(|q| q.to_string()).into_iter().collect(),
            finals: aut.finals().iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl Automaton {
    /// Reads an automaton from its JSON exchange record.
    pub fn from_json(json: &str) -> Result<Automaton, RecordError> {
        let record: AutomatonRecord = serde_json::from_str(json)?;
        Ok(Automaton::try_from(record)?)
    }

    /// Writes the automaton as pretty printed JSON exchange record.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&AutomatonRecord::from(self))
    }
}
