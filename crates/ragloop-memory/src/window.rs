//! Bounded turn window with FIFO eviction by question/answer pair.

use crate::error::MemoryError;
use crate::model::{Turn, TurnPair};
use log::debug;
use std::collections::VecDeque;

/// Sliding window over the most recent `max_turns` question/answer pairs.
///
/// The window stores flat turns (user, assistant, user, assistant, ...), so its
/// length is always even and never exceeds `2 * max_turns`.
#[derive(Debug, Clone)]
pub struct TurnStore {
    pairs: VecDeque<TurnPair>,
    max_turns: usize,
}

impl TurnStore {
    /// Create an empty window holding at most `max_turns` pairs.
    pub fn new(max_turns: usize) -> Result<Self, MemoryError> {
        validate_capacity(max_turns)?;
        Ok(Self {
            pairs: VecDeque::with_capacity(max_turns.min(256)),
            max_turns,
        })
    }

    /// Append a user turn and an assistant turn, evicting the oldest pairs on overflow.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push_pair(TurnPair::new(question, answer));
    }

    /// Append an already-built pair.
    pub fn push_pair(&mut self, pair: TurnPair) {
        self.pairs.push_back(pair);
        let evicted = self.trim();
        if evicted > 0 {
            debug!(
                "evicted history pairs (evicted={}, retained={})",
                evicted,
                self.pairs.len()
            );
        }
    }

    /// Change capacity and trim immediately; returns the number of evicted pairs.
    pub fn set_max_turns(&mut self, max_turns: usize) -> Result<usize, MemoryError> {
        validate_capacity(max_turns)?;
        self.max_turns = max_turns;
        let evicted = self.trim();
        debug!(
            "history window resized (max_turns={}, evicted={}, retained={})",
            max_turns,
            evicted,
            self.pairs.len()
        );
        Ok(evicted)
    }

    /// Turns ordered oldest to newest; `limit` keeps only the most recent pairs.
    pub fn history(&self, limit: Option<usize>) -> Vec<Turn> {
        self.recent_pairs(limit)
            .flat_map(|pair| [pair.user.clone(), pair.assistant.clone()])
            .collect()
    }

    /// Pairs ordered oldest to newest; `limit` keeps only the most recent pairs.
    pub fn pairs(&self, limit: Option<usize>) -> Vec<TurnPair> {
        self.recent_pairs(limit).cloned().collect()
    }

    /// Replace the window contents with previously persisted pairs, then trim.
    pub fn restore(&mut self, pairs: impl IntoIterator<Item = TurnPair>) {
        self.pairs = pairs.into_iter().collect();
        self.trim();
    }

    /// Remove all turns. Safe to call on an empty window.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Number of stored turns (twice the number of pairs).
    pub fn len(&self) -> usize {
        self.pairs.len() * 2
    }

    /// Number of stored pairs.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the window holds no turns.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Configured pair capacity.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Turn capacity (`2 * max_turns`).
    pub fn capacity(&self) -> usize {
        self.max_turns * 2
    }

    fn recent_pairs(&self, limit: Option<usize>) -> impl Iterator<Item = &TurnPair> {
        let keep = limit.unwrap_or(self.pairs.len()).min(self.pairs.len());
        self.pairs.iter().skip(self.pairs.len() - keep)
    }

    fn trim(&mut self) -> usize {
        let mut evicted = 0;
        while self.pairs.len() > self.max_turns {
            if self.pairs.pop_front().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }
}

fn validate_capacity(max_turns: usize) -> Result<(), MemoryError> {
    if max_turns == 0 {
        return Err(MemoryError::InvalidCapacity(max_turns));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::TurnStore;
    use crate::MemoryError;
    use crate::model::Role;
    use pretty_assertions::assert_eq;

    fn contents(store: &TurnStore, limit: Option<usize>) -> Vec<String> {
        store
            .history(limit)
            .iter()
            .map(|turn| turn.content().to_string())
            .collect()
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = TurnStore::new(0).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidCapacity(0)));

        let mut store = TurnStore::new(2).expect("store");
        assert!(store.set_max_turns(0).is_err());
        assert_eq!(store.max_turns(), 2);
    }

    #[test]
    fn keeps_two_most_recent_pairs() {
        let mut store = TurnStore::new(2).expect("store");
        store.append("Q1", "A1");
        store.append("Q2", "A2");
        store.append("Q3", "A3");
        assert_eq!(contents(&store, None), vec!["Q2", "A2", "Q3", "A3"]);
        let roles: Vec<Role> = store.history(None).iter().map(|turn| turn.role()).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut store = TurnStore::new(3).expect("store");
        for idx in 0..20 {
            store.append(format!("Q{idx}"), format!("A{idx}"));
            assert!(store.history(None).len() <= store.capacity());
            assert_eq!(store.len() % 2, 0);
        }
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn eviction_removes_exactly_oldest_pair() {
        let mut store = TurnStore::new(3).expect("store");
        store.append("Q1", "A1");
        store.append("Q2", "A2");
        store.append("Q3", "A3");
        let before = contents(&store, None);
        store.append("Q4", "A4");
        let after = contents(&store, None);
        assert_eq!(after[0], before[2]);
        assert_eq!(after.len(), before.len());
        assert_eq!(&after[..4], &before[2..]);
    }

    #[test]
    fn shrinking_capacity_trims_immediately() {
        let mut store = TurnStore::new(10).expect("store");
        for idx in 1..=8 {
            store.append(format!("Q{idx}"), format!("A{idx}"));
        }
        let evicted = store.set_max_turns(3).expect("resize");
        assert_eq!(evicted, 5);
        assert_eq!(store.pair_count(), 3);
        assert_eq!(
            contents(&store, None),
            vec!["Q6", "A6", "Q7", "A7", "Q8", "A8"]
        );
    }

    #[test]
    fn growing_capacity_keeps_contents() {
        let mut store = TurnStore::new(1).expect("store");
        store.append("Q1", "A1");
        assert_eq!(store.set_max_turns(4).expect("resize"), 0);
        store.append("Q2", "A2");
        assert_eq!(contents(&store, None), vec!["Q1", "A1", "Q2", "A2"]);
    }

    #[test]
    fn limited_history_does_not_mutate() {
        let mut store = TurnStore::new(5).expect("store");
        store.append("Q1", "A1");
        store.append("Q2", "A2");
        store.append("Q3", "A3");
        assert_eq!(contents(&store, Some(1)), vec!["Q3", "A3"]);
        assert_eq!(contents(&store, Some(0)), Vec::<String>::new());
        assert_eq!(contents(&store, Some(99)).len(), 6);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = TurnStore::new(2).expect("store");
        store.append("Q1", "A1");
        store.clear();
        assert_eq!(store.is_empty(), true);
        store.clear();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn restore_trims_to_capacity() {
        let mut source = TurnStore::new(5).expect("store");
        for idx in 1..=4 {
            source.append(format!("Q{idx}"), format!("A{idx}"));
        }
        let mut store = TurnStore::new(2).expect("store");
        store.restore(source.pairs(None));
        assert_eq!(contents(&store, None), vec!["Q3", "A3", "Q4", "A4"]);
    }
}
