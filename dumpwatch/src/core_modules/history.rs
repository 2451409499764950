// THEORY:
// The `history` module gives the engine its memory. A `History` maps an identity
// to the last value seen for it and forgets identities that stop showing up.
//
// Key architectural principles:
// 1.  **Lifecycle by Absence**: An entry is never deleted explicitly. Every call to
//     `update` is one cycle; an entry that is not part of the cycle's payload grows
//     one cycle older, and once it has gone `release_threshold` consecutive cycles
//     without a refresh it is evicted at the end of that same call.
// 2.  **Full Replace**: A refreshed entry takes the payload value as a whole and
//     restarts at age 0. There is no value-level merging.
// 3.  **One Update per Cycle**: The owner must call `update` exactly once per frame,
//     even with an empty payload, otherwise absence is not aged.
// 4.  **Stable Order**: Entries keep insertion order (an overwrite keeps the original
//     slot), so callers iterating a snapshot get a deterministic sequence.

use crate::core_modules::error::HistoryError;
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Number of consecutive cycles an entry may go unrefreshed before it is evicted.
pub const RELEASE_THRESHOLD: u32 = 10;

/// A value plus the number of cycles since it was last refreshed.
#[derive(Debug, Clone)]
pub struct HistoryEntry<V> {
    pub value: V,
    pub age: u32,
}

impl<V> HistoryEntry<V> {
    fn fresh(value: V) -> Self {
        Self { value, age: 0 }
    }
}

/// An expiring key-value store advanced once per frame.
#[derive(Debug, Clone)]
pub struct History<K, V> {
    entries: IndexMap<K, HistoryEntry<V>>,
    release_threshold: u32,
}

impl<K, V> Default for History<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> History<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self::with_release_threshold(RELEASE_THRESHOLD)
    }

    /// A threshold of 0 is treated as 1: an unrefreshed entry never survives a cycle.
    pub fn with_release_threshold(release_threshold: u32) -> Self {
        Self {
            entries: IndexMap::new(),
            release_threshold: release_threshold.max(1),
        }
    }

    pub fn release_threshold(&self) -> u32 {
        self.release_threshold
    }

    pub fn get(&self, key: &K) -> Result<&V, HistoryError>
    where
        K: Debug,
    {
        self.entries
            .get(key)
            .map(|entry| &entry.value)
            .ok_or_else(|| HistoryError::KeyNotFound(format!("{key:?}")))
    }

    pub fn entry(&self, key: &K) -> Option<&HistoryEntry<V>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn items(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, entry)| (key, &entry.value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advances the store by one cycle.
    ///
    /// Every held entry ages by one, every payload key is (re)inserted at age 0,
    /// then entries that reached the release threshold are dropped. Returns the
    /// number of evicted entries.
    pub fn update<I>(&mut self, payload: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        // --- 1. Aging ---
        for entry in self.entries.values_mut() {
            entry.age += 1;
        }

        // --- 2. Refresh ---
        // Refreshed keys restart at 0, so aging them above has no lasting effect.
        for (key, value) in payload {
            self.entries.insert(key, HistoryEntry::fresh(value));
        }

        // --- 3. Release ---
        let before = self.entries.len();
        let threshold = self.release_threshold;
        self.entries.retain(|_, entry| entry.age < threshold);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(items: &[(i64, &'static str)]) -> Vec<(i64, &'static str)> {
        items.to_vec()
    }

    #[test]
    fn get_on_missing_key_fails() {
        let history: History<i64, &str> = History::new();
        assert_eq!(history.get(&4), Err(HistoryError::KeyNotFound("4".into())));
    }

    #[test]
    fn absent_entries_survive_until_the_threshold() {
        let mut history: History<i64, &str> = History::new();
        history.update(payload(&[(1, "a")]));

        for cycle in 1..RELEASE_THRESHOLD {
            history.update(Vec::new());
            assert_eq!(history.get(&1), Ok(&"a"), "evicted early at cycle {cycle}");
            assert_eq!(history.entry(&1).map(|e| e.age), Some(cycle));
        }

        history.update(Vec::new());
        assert!(!history.contains_key(&1));
        assert!(history.is_empty());
    }

    #[test]
    fn refresh_resets_age_and_replaces_value() {
        let mut history = History::new();
        history.update(payload(&[(1, "a")]));
        for _ in 1..RELEASE_THRESHOLD {
            history.update(Vec::new());
        }
        // Reappearing in the payload of what would have been the evicting cycle.
        history.update(payload(&[(1, "b")]));
        assert_eq!(history.get(&1), Ok(&"b"));
        assert_eq!(history.entry(&1).map(|e| e.age), Some(0));
    }

    #[test]
    fn keeps_insertion_order_across_overwrites() {
        let mut history = History::new();
        history.update(payload(&[(3, "c"), (1, "a"), (2, "b")]));
        history.update(payload(&[(1, "z"), (4, "d")]));

        let keys: Vec<i64> = history.keys().copied().collect();
        assert_eq!(keys, vec![3, 1, 2, 4]);
        let values: Vec<&str> = history.values().copied().collect();
        assert_eq!(values, vec!["c", "z", "b", "d"]);
        let items: Vec<(i64, &str)> = history.items().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(items, vec![(3, "c"), (1, "z"), (2, "b"), (4, "d")]);
    }

    #[test]
    fn update_reports_evictions() {
        let mut history: History<i64, &str> = History::with_release_threshold(2);
        history.update(payload(&[(1, "a"), (2, "b")]));
        assert_eq!(history.update(payload(&[(2, "b")])), 0);
        assert_eq!(history.update(payload(&[(2, "b")])), 1);
        assert_eq!(history.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn zero_threshold_behaves_like_one() {
        let mut history: History<i64, &str> = History::with_release_threshold(0);
        assert_eq!(history.release_threshold(), 1);
        history.update(payload(&[(1, "a")]));
        assert!(history.contains_key(&1));
        history.update(Vec::new());
        assert!(!history.contains_key(&1));
    }
}
