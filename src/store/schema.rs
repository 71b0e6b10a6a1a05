use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Storage key holding the per-glyph stats object.
pub const STATS_KEY: &str = "kana-stats";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStat {
    pub correct: u32,
    pub total: u32,
}

impl CharacterStat {
    pub fn record(&mut self, was_correct: bool) {
        self.total = self.total.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.correct <= self.total
    }
}

/// Glyph → outcome counts. Serialized as a flat JSON object.
pub type StatsMap = BTreeMap<String, CharacterStat>;

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub kanadrill_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub stats: StatsMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_correct_within_total() {
        let mut stat = CharacterStat::default();
        stat.record(true);
        stat.record(false);
        stat.record(true);
        assert_eq!(stat, CharacterStat { correct: 2, total: 3 });
        assert!(stat.is_consistent());
    }

    #[test]
    fn test_accuracy_of_unseen_is_none() {
        assert_eq!(CharacterStat::default().accuracy(), None);
        let stat = CharacterStat { correct: 1, total: 4 };
        assert_eq!(stat.accuracy(), Some(0.25));
    }

    #[test]
    fn test_stats_map_json_shape() {
        let mut map = StatsMap::new();
        map.insert("あ".to_string(), CharacterStat { correct: 1, total: 2 });
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"あ":{"correct":1,"total":2}}"#);
    }
}
