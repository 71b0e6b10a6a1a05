use anyhow::Result;

use crate::catalog::normalize_glyph;
use crate::store::kv::KeyValueStore;
use crate::store::schema::{CharacterStat, STATS_KEY, StatsMap};

/// Sole reader/writer of the persisted per-glyph stats.
///
/// A copy of the mapping is kept in memory. After a failed write the copy is
/// marked dirty and later updates build on it rather than on storage, so the
/// session never loses outcomes that were not yet saved.
pub struct StatsStore<S: KeyValueStore> {
    backend: S,
    cache: StatsMap,
    dirty: bool,
}

impl<S: KeyValueStore> StatsStore<S> {
    pub fn new(backend: S) -> Self {
        let mut store = Self {
            backend,
            cache: StatsMap::new(),
            dirty: false,
        };
        store.cache = store.load();
        store
    }

    /// Read the mapping from storage. Missing or malformed data yields an
    /// empty mapping.
    pub fn load(&self) -> StatsMap {
        let raw = match self.backend.get(STATS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StatsMap::new(),
            Err(e) => {
                log::error!("Failed to read stats: {e:#}");
                return StatsMap::new();
            }
        };

        match serde_json::from_str::<StatsMap>(&raw) {
            Ok(mut stats) => {
                for (glyph, stat) in stats.iter_mut() {
                    if !stat.is_consistent() {
                        log::warn!(
                            "Stats for {glyph} had correct {} > total {}, clamping",
                            stat.correct,
                            stat.total
                        );
                        stat.correct = stat.total;
                    }
                }
                stats
            }
            Err(e) => {
                log::warn!("Ignoring malformed stats: {e}");
                StatsMap::new()
            }
        }
    }

    /// Count one outcome for `glyph` and write the mapping back.
    ///
    /// The in-memory mapping is updated even when the write fails; the error
    /// is returned for the caller to report.
    pub fn record_outcome(&mut self, glyph: &str, was_correct: bool) -> Result<CharacterStat> {
        let mut stats = if self.dirty {
            self.cache.clone()
        } else {
            self.load()
        };
        let stat = stats.entry(normalize_glyph(glyph)).or_default();
        stat.record(was_correct);
        let updated = *stat;

        self.cache = stats;
        self.persist()?;
        Ok(updated)
    }

    /// Delete every persisted entry. If the delete fails the empty mapping
    /// still wins: later updates build on it and overwrite the stale data.
    pub fn clear(&mut self) -> Result<()> {
        self.cache.clear();
        match self.backend.delete(STATS_KEY) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(e)
            }
        }
    }

    /// Replace the whole mapping, e.g. from an import.
    pub fn replace(&mut self, stats: StatsMap) -> Result<()> {
        let mut normalized = StatsMap::new();
        for (glyph, stat) in stats {
            let entry = normalized.entry(normalize_glyph(&glyph)).or_default();
            entry.correct = entry.correct.saturating_add(stat.correct);
            entry.total = entry.total.saturating_add(stat.total);
        }
        self.cache = normalized;
        self.persist()
    }

    /// The authoritative mapping for this session.
    pub fn snapshot(&self) -> &StatsMap {
        &self.cache
    }

    pub fn get(&self, glyph: &str) -> CharacterStat {
        self.cache
            .get(&normalize_glyph(glyph))
            .copied()
            .unwrap_or_default()
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.cache)?;
        match self.backend.set(STATS_KEY, &json) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(e)
            }
        }
    }
}
