use std::collections::BTreeMap;

use crate::types::category::{Form, MasteryKey};

/// Correct-answer counts for the item+form pairs of the current level.
///
/// Keys leave the map when the session streak prunes them, so an empty map
/// means the level has nothing left to ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryMap<K: Ord> {
    counts: BTreeMap<MasteryKey<K>, u32>,
}

impl<K: Ord> Default for MasteryMap<K> {
    fn default() -> Self {
        Self { counts: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasteryProgress {
    pub mastered: usize,
    pub total: usize,
}

impl<K: Ord + Clone> MasteryMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MasteryKey<K>) {
        self.counts.insert(key, 0);
    }

    pub fn contains(&self, key: &MasteryKey<K>) -> bool {
        self.counts.contains_key(key)
    }

    pub fn count(&self, key: &MasteryKey<K>) -> Option<u32> {
        self.counts.get(key).copied()
    }

    /// Adds one to `key`. Returns false if the key is not tracked (already pruned).
    pub fn record_correct(&mut self, key: &MasteryKey<K>) -> bool {
        match self.counts.get_mut(key) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &MasteryKey<K>) -> bool {
        self.counts.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn is_mastered(&self, threshold: u32) -> bool {
        self.counts.values().all(|&count| count >= threshold)
    }

    pub fn is_unmastered(&self, key: &MasteryKey<K>, threshold: u32) -> bool {
        self.count(key).is_some_and(|count| count < threshold)
    }

    pub fn progress(&self, threshold: u32) -> MasteryProgress {
        MasteryProgress {
            mastered: self.counts.values().filter(|&&count| count >= threshold).count(),
            total: self.counts.len(),
        }
    }

    /// Whether any form of `item` is still tracked this level.
    pub fn has_remaining_forms(&self, item: &K) -> bool {
        self.counts.keys().any(|key| &key.item == item)
    }

    pub fn keys(&self) -> impl Iterator<Item = &MasteryKey<K>> {
        self.counts.keys()
    }
}

/// Consecutive correct answers per item+form over a whole play session.
/// Survives level changes, not restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStreak<K: Ord> {
    streaks: BTreeMap<MasteryKey<K>, u32>,
}

impl<K: Ord> Default for SessionStreak<K> {
    fn default() -> Self {
        Self { streaks: BTreeMap::new() }
    }
}

impl<K: Ord + Clone> SessionStreak<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MasteryKey<K>) -> u32 {
        self.streaks.get(key).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, key: &MasteryKey<K>) -> u32 {
        let streak = self.streaks.entry(key.clone()).or_insert(0);
        *streak += 1;
        *streak
    }

    pub fn reset(&mut self, key: &MasteryKey<K>) {
        self.streaks.insert(key.clone(), 0);
    }
}

/// Fresh mastery map for a level: every pool item in every available form,
/// each at zero. Non-base pairs the item has no data for are skipped.
pub fn build_level_mastery<K, F>(pool: &[K], forms: &[Form], has_form: F) -> MasteryMap<K>
where
    K: Ord + Clone,
    F: Fn(&K, Form) -> bool,
{
    let mut mastery = MasteryMap::new();
    for item in pool {
        for &form in forms {
            if !form.is_base() && !has_form(item, form) {
                continue;
            }
            mastery.insert(MasteryKey::new(item.clone(), form));
        }
    }
    mastery
}
