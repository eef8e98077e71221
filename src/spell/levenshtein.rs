//! Bounded edit-distance search over an fst.
//!
//! Distances are optimal string alignment distances on bytes: insertions, deletions, substitutions and
//! swaps of two adjacent bytes cost 1 each.

use fst::Automaton;

/// The dynamic programming rows after consuming a prefix of a key.
#[derive(Clone, Debug)]
pub struct EditState {
    consumed: usize,
    last_byte: Option<u8>,
    /// Distances of the consumed prefix to every prefix of the query.
    row: Vec<usize>,
    /// `row` before the last byte was consumed. Swaps look one row further back.
    before: Vec<usize>,
}

impl EditState {
    /// The distance of the consumed key to the whole query.
    pub fn distance(&self) -> usize {
        self.row[self.row.len() - 1]
    }
}

/// Accepts every key within `max_distance` edits of the query.
/// The first `prefix` bytes of a key may differ from the query by at most one edit, which keeps the search narrow.
#[derive(Debug, Clone)]
pub struct EditAutomaton<'a> {
    query: &'a [u8],
    max_distance: usize,
    prefix: usize,
}

impl<'a> EditAutomaton<'a> {
    pub fn new(query: &'a str, max_distance: usize, prefix: usize) -> Self {
        EditAutomaton {
            query: query.as_bytes(),
            max_distance,
            prefix,
        }
    }

    fn budget(&self, consumed: usize) -> usize {
        if consumed < self.prefix {
            self.max_distance.min(1)
        } else {
            self.max_distance
        }
    }

    fn next_row(&self, state: &EditState, byte: u8) -> Vec<usize> {
        let query = self.query;
        let mut next = Vec::with_capacity(state.row.len());
        next.push(state.consumed + 1);

        for i in 1..=query.len() {
            let substitution = state.row[i - 1] + usize::from(query[i - 1] != byte);
            let mut cost = substitution
                .min(state.row[i] + 1)
                .min(next[i - 1] + 1);

            let swapped = i > 1
                && query[i - 2] == byte
                && state.last_byte == Some(query[i - 1]);
            if swapped {
                cost = cost.min(state.before[i - 2] + 1);
            }

            next.push(cost);
        }

        next
    }
}

impl<'a> Automaton for EditAutomaton<'a> {
    type State = Option<EditState>;

    fn start(&self) -> Self::State {
        let row: Vec<usize> = (0..=self.query.len()).collect();

        Some(EditState {
            consumed: 0,
            last_byte: None,
            before: row.clone(),
            row,
        })
    }

    fn is_match(&self, state: &Self::State) -> bool {
        state
            .as_ref()
            .map_or(false, |state| state.distance() <= self.max_distance)
    }

    fn can_match(&self, state: &Self::State) -> bool {
        state.is_some()
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        let state = state.as_ref()?;
        let row = self.next_row(state, byte);

        // every extension of the key costs at least the smallest entry of the row
        let lowest = row.iter().copied().min().unwrap_or(0);
        if lowest > self.budget(state.consumed) {
            return None;
        }

        Some(EditState {
            consumed: state.consumed + 1,
            last_byte: Some(byte),
            before: state.row.clone(),
            row,
        })
    }
}
