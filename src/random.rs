//! Random automata and words, mostly useful for testing and benchmarking.
//!
//! Every function takes the generator explicitly, so seeding it with
//! [`fastrand::Rng::with_seed`] makes the output reproducible.

use fastrand::Rng;
use tracing::debug;

use crate::{
    automaton::{Automaton, Label, State},
    math::OrderedSet,
};

/// Returns the alphabet consisting of the first `symbols` lowercase letters, at most 26.
pub fn alphabet_of_size(symbols: usize) -> OrderedSet<char> {
    ('a'..='z').take(symbols).collect()
}

fn numbered(size: usize) -> Vec<State> {
    (0..size).map(|i| State::new(format!("q{i}"))).collect()
}

/// Generates a nondeterministic automaton with states `q0, ..., q{size-1}` over the first
/// `symbols` letters. Every possible transition `(p, a, q)` is present with probability
/// `density` and every state is final with probability one half. The initial state is `q0`
/// unless `size` is zero. No epsilon transitions are produced.
pub fn random_nfa(rng: &mut Rng, symbols: usize, size: usize, density: f64) -> Automaton {
    let alphabet = alphabet_of_size(symbols);
    let states = numbered(size);
    let mut aut = Automaton::over(alphabet.clone());
    for q in &states {
        aut.insert_state(q.clone());
        if rng.bool() {
            aut.mark_final(q);
        }
    }
    for p in &states {
        for &sym in &alphabet {
            for q in &states {
                if rng.f64() < density {
                    aut.link(p, Label::Symbol(sym), q);
                }
            }
        }
    }
    if let Some(q0) = states.first() {
        aut.mark_initial(q0);
    }
    debug!(
        "generated random nfa with {} states and {} transitions",
        aut.size(),
        aut.transitions().count()
    );
    aut
}

/// Generates a complete deterministic automaton with `size` states (at least one) over the
/// first `symbols` letters by drawing the target of every transition uniformly. Depending on
/// the draw some states may be unreachable from the initial state `q0`.
pub fn random_dfa(rng: &mut Rng, symbols: usize, size: usize) -> Automaton {
    let alphabet = alphabet_of_size(symbols);
    let states = numbered(size.max(1));
    let mut aut = Automaton::over(alphabet.clone());
    for q in &states {
        aut.insert_state(q.clone());
        if rng.bool() {
            aut.mark_final(q);
        }
        for &sym in &alphabet {
            let target = &states[rng.usize(..states.len())];
            aut.link(q, Label::Symbol(sym), target);
        }
    }
    aut.mark_initial(&states[0]);
    aut
}

/// Draws a word over `alphabet` whose length is uniform in `min_len..=max_len`. The word
/// is empty if the alphabet is empty or `min_len > max_len`.
pub fn random_word(
    rng: &mut Rng,
    alphabet: &OrderedSet<char>,
    min_len: usize,
    max_len: usize,
) -> Vec<char> {
    let charset: Vec<char> = alphabet.iter().copied().collect();
    if charset.is_empty() || min_len > max_len {
        return vec![];
    }
    let length = rng.usize(min_len..=max_len);
    (0..length)
        .map(|_| charset[rng.usize(..charset.len())])
        .collect()
}
