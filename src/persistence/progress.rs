//! Campaign progress: unlocked levels and per-level best results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{KeyValueStore, PersistError};
use crate::sim::LevelSummary;

/// Best result recorded for one level. Each field is the best seen
/// independently, not necessarily from the same attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBest {
    pub score: u64,
    pub wave: u32,
    pub enemies_killed: u32,
    pub pods_rescued: u32,
    pub cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    /// Sorted, always contains level 1
    pub unlocked_levels: Vec<u32>,
    #[serde(default)]
    pub best: BTreeMap<u32, LevelBest>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressData {
    pub const STORAGE_KEY: &'static str = "pod_rescue_progress";

    /// Fresh campaign with only the first level open
    pub fn new() -> Self {
        Self {
            unlocked_levels: vec![1],
            best: BTreeMap::new(),
        }
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        self.unlocked_levels.binary_search(&level).is_ok()
    }

    pub fn best_for(&self, level: u32) -> Option<&LevelBest> {
        self.best.get(&level)
    }

    /// Highest unlocked level
    pub fn furthest_level(&self) -> u32 {
        self.unlocked_levels.last().copied().unwrap_or(1)
    }

    fn unlock(&mut self, level: u32) {
        if let Err(i) = self.unlocked_levels.binary_search(&level) {
            self.unlocked_levels.insert(i, level);
            log::info!("Level {} unlocked", level);
        }
    }

    /// Fold a finished attempt into the record. A victory unlocks the next
    /// level if the campaign has one. Returns true on a new best score.
    pub fn record(&mut self, summary: &LevelSummary, level_count: u32) -> bool {
        let best = self.best.entry(summary.level).or_default();
        let new_best = summary.score > best.score;
        best.score = best.score.max(summary.score);
        best.wave = best.wave.max(summary.wave);
        best.enemies_killed = best.enemies_killed.max(summary.enemies_killed);
        best.pods_rescued = best.pods_rescued.max(summary.pods_rescued);
        best.cleared |= summary.victory;

        if summary.victory && summary.level < level_count {
            self.unlock(summary.level + 1);
        }
        new_best
    }

    /// Repair data edited by hand or written by an older build
    fn normalize(&mut self) {
        self.unlocked_levels.retain(|&l| l > 0);
        self.unlocked_levels.sort_unstable();
        self.unlocked_levels.dedup();
        self.unlock(1);
    }

    /// Load from `store`; a missing key is a fresh campaign
    pub fn try_load(store: &(impl KeyValueStore + ?Sized)) -> Result<Self, PersistError> {
        let Some(json) = store.read(Self::STORAGE_KEY)? else {
            return Ok(Self::new());
        };
        let mut data: ProgressData =
            serde_json::from_str(&json).map_err(|e| PersistError::Corrupt(e.to_string()))?;
        data.normalize();
        Ok(data)
    }

    pub fn try_save(&self, store: &mut (impl KeyValueStore + ?Sized)) -> Result<(), PersistError> {
        let json = serde_json::to_string(self).map_err(|e| PersistError::Encode(e.to_string()))?;
        store.write(Self::STORAGE_KEY, &json)
    }

    /// Wipe saved progress; returns the fresh campaign that replaces it
    pub fn reset(store: &mut (impl KeyValueStore + ?Sized)) -> Self {
        match store.remove(Self::STORAGE_KEY) {
            Ok(()) => log::info!("Progress cleared"),
            Err(e) => log::warn!("Could not clear progress: {}", e),
        }
        Self::new()
    }

    /// Load, falling back to a fresh campaign on any failure
    pub fn load(store: &(impl KeyValueStore + ?Sized)) -> Self {
        match Self::try_load(store) {
            Ok(data) => {
                log::info!(
                    "Loaded progress ({} level(s) unlocked)",
                    data.unlocked_levels.len()
                );
                data
            }
            Err(e) => {
                log::warn!("Could not load progress, starting fresh: {}", e);
                Self::new()
            }
        }
    }

    /// Save, logging instead of failing
    pub fn save(&self, store: &mut (impl KeyValueStore + ?Sized)) {
        match self.try_save(store) {
            Ok(()) => log::info!("Progress saved"),
            Err(e) => log::warn!("Could not save progress: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn summary(level: u32, score: u64, victory: bool) -> LevelSummary {
        LevelSummary {
            level,
            score,
            wave: 2,
            enemies_killed: 7,
            pods_rescued: 1,
            victory,
        }
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, PersistError> {
            Err(PersistError::Unavailable)
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<(), PersistError> {
            Err(PersistError::Storage("quota exceeded".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), PersistError> {
            Err(PersistError::Unavailable)
        }
    }

    #[test]
    fn test_fresh_campaign_has_level_one() {
        let p = ProgressData::new();
        assert!(p.is_unlocked(1));
        assert!(!p.is_unlocked(2));
        assert_eq!(p.furthest_level(), 1);
    }

    #[test]
    fn test_victory_unlocks_next_level() {
        let mut p = ProgressData::new();
        assert!(p.record(&summary(1, 1200, true), 3));
        assert!(p.is_unlocked(2));
        assert!(p.best_for(1).unwrap().cleared);
    }

    #[test]
    fn test_defeat_records_best_without_unlocking() {
        let mut p = ProgressData::new();
        assert!(p.record(&summary(1, 300, false), 3));
        assert!(!p.is_unlocked(2));
        assert_eq!(p.best_for(1).unwrap().score, 300);
        assert!(!p.best_for(1).unwrap().cleared);
    }

    #[test]
    fn test_lower_score_keeps_previous_best() {
        let mut p = ProgressData::new();
        p.record(&summary(1, 900, true), 3);
        assert!(!p.record(&summary(1, 400, false), 3));
        let best = p.best_for(1).unwrap();
        assert_eq!(best.score, 900);
        assert!(best.cleared);
    }

    #[test]
    fn test_last_level_unlocks_nothing() {
        let mut p = ProgressData::new();
        p.record(&summary(3, 100, true), 3);
        assert!(!p.is_unlocked(4));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut p = ProgressData::new();
        p.record(&summary(1, 1500, true), 3);
        p.try_save(&mut store).unwrap();
        assert_eq!(ProgressData::try_load(&store).unwrap(), p);
    }

    #[test]
    fn test_reset_clears_saved_progress() {
        let mut store = MemoryStore::new();
        let mut p = ProgressData::new();
        p.record(&summary(1, 800, true), 3);
        p.save(&mut store);
        assert_eq!(ProgressData::load(&store).furthest_level(), 2);

        assert_eq!(ProgressData::reset(&mut store), ProgressData::new());
        assert_eq!(store.read(ProgressData::STORAGE_KEY).unwrap(), None);
        assert_eq!(ProgressData::load(&store).furthest_level(), 1);
    }

    #[test]
    fn test_missing_key_is_fresh() {
        let store = MemoryStore::new();
        assert_eq!(ProgressData::try_load(&store).unwrap(), ProgressData::new());
    }

    #[test]
    fn test_corrupt_data_falls_back() {
        let mut store = MemoryStore::new();
        store.write(ProgressData::STORAGE_KEY, "{not json").unwrap();
        assert!(matches!(
            ProgressData::try_load(&store),
            Err(PersistError::Corrupt(_))
        ));
        assert_eq!(ProgressData::load(&store), ProgressData::new());
    }

    #[test]
    fn test_loaded_data_is_normalized() {
        let mut store = MemoryStore::new();
        store
            .write(ProgressData::STORAGE_KEY, r#"{"unlocked_levels":[3,0,2,3]}"#)
            .unwrap();
        let p = ProgressData::try_load(&store).unwrap();
        assert_eq!(p.unlocked_levels, vec![1, 2, 3]);
        assert!(p.best.is_empty());
    }

    #[test]
    fn test_broken_store_is_not_fatal() {
        let mut store = BrokenStore;
        assert_eq!(ProgressData::load(&store), ProgressData::new());
        assert!(ProgressData::new().try_save(&mut store).is_err());
        ProgressData::new().save(&mut store);
        assert_eq!(ProgressData::reset(&mut store), ProgressData::new());
    }
}
