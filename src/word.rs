//! Enumeration of finite words, used for sampling based language comparison.

use crate::math::OrderedSet;

/// Iterator over all words over a finite set of symbols in length-lexicographic order,
/// starting with the empty word. The iterator is infinite unless there are no symbols, in
/// which case only the empty word is produced.
#[derive(Debug, Clone)]
pub struct KleeneStar {
    symbols: Vec<char>,
    current: Option<Vec<usize>>,
}

impl KleeneStar {
    /// Creates the iterator over the given symbols, duplicates are removed.
    pub fn new<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        let symbols: OrderedSet<char> = symbols.into_iter().collect();
        Self {
            symbols: symbols.into_iter().collect(),
            current: Some(vec![]),
        }
    }
}

impl Iterator for KleeneStar {
    type Item = Vec<char>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.as_mut()?;
        let out = current.iter().map(|i| self.symbols[*i]).collect();

        if self.symbols.is_empty() {
            self.current = None;
            return Some(out);
        }

        let mut carry = true;
        let mut i = current.len();
        while carry && i > 0 {
            i -= 1;
            current[i] += 1;
            if current[i] >= self.symbols.len() {
                current[i] = 0;
            } else {
                carry = false;
            }
        }
        if carry {
            *current = vec![0; current.len() + 1];
        }

        Some(out)
    }
}

/// Returns all words over `alphabet` of length at most `max_len` in length-lexicographic
/// order.
pub fn words_up_to(alphabet: &OrderedSet<char>, max_len: usize) -> impl Iterator<Item = Vec<char>> {
    KleeneStar::new(alphabet.iter().copied()).take_while(move |w| w.len() <= max_len)
}
