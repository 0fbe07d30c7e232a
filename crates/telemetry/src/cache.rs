//! Keyed live cache of the most recent reading per animal.

use dashmap::DashMap;

use crate::types::{LiveCacheEntry, LivestockId};

/// Most recent reading per animal, keyed by id.
///
/// Written only by the ingestion path (whole-entry overwrite), read by the
/// monitor loop. Entries for different animals never clobber each other;
/// concurrent ingests for the same animal resolve last-write-wins.
#[derive(Default)]
pub struct LiveCache {
    entries: DashMap<LivestockId, LiveCacheEntry>,
}

impl LiveCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for the entry's animal.
    pub fn put(&self, entry: LiveCacheEntry) {
        self.entries.insert(entry.livestock_id, entry);
    }

    /// Current entry for one animal, if any reading has arrived yet.
    #[must_use]
    pub fn get(&self, livestock_id: LivestockId) -> Option<LiveCacheEntry> {
        self.entries.get(&livestock_id).map(|e| e.clone())
    }

    /// Point-in-time copy of all entries, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LiveCacheEntry> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: i64, temperature: f64) -> LiveCacheEntry {
        LiveCacheEntry {
            livestock_id: LivestockId(id),
            name: format!("animal-{id}"),
            owner_ref: format!("owner-{id}"),
            contact: "+254700000001".to_string(),
            temperature,
            pulse: 72,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn put_overwrites_same_animal() {
        let cache = LiveCache::new();
        cache.put(entry(1, 38.0));
        cache.put(entry(1, 41.5));

        assert_eq!(cache.len(), 1);
        let current = cache.get(LivestockId(1)).unwrap();
        assert!((current.temperature - 41.5).abs() < f64::EPSILON);
    }

    #[test]
    fn animals_are_isolated() {
        let cache = LiveCache::new();
        cache.put(entry(1, 38.0));
        cache.put(entry(2, 39.0));

        assert_eq!(cache.len(), 2);
        assert!((cache.get(LivestockId(1)).unwrap().temperature - 38.0).abs() < f64::EPSILON);
        assert!((cache.get(LivestockId(2)).unwrap().temperature - 39.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_copies_every_entry() {
        let cache = LiveCache::new();
        assert!(cache.is_empty());
        cache.put(entry(1, 38.0));
        cache.put(entry(2, 39.0));

        let mut ids: Vec<i64> = cache.snapshot().iter().map(|e| e.livestock_id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn get_unknown_animal_is_none() {
        let cache = LiveCache::new();
        assert!(cache.get(LivestockId(99)).is_none());
    }
}
