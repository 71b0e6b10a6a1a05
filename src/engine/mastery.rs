use crate::catalog::{Catalog, Family};
use crate::store::schema::{CharacterStat, StatsMap};

const STRONG_ACCURACY: f64 = 0.9;
const FAIR_ACCURACY: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mastery {
    Unseen,
    Weak,
    Fair,
    Strong,
}

impl Mastery {
    pub fn from_stat(stat: &CharacterStat) -> Self {
        match stat.accuracy() {
            None => Mastery::Unseen,
            Some(acc) if acc >= STRONG_ACCURACY => Mastery::Strong,
            Some(acc) if acc >= FAIR_ACCURACY => Mastery::Fair,
            Some(_) => Mastery::Weak,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlyphMastery {
    pub glyph: String,
    pub stat: CharacterStat,
    pub mastery: Mastery,
}

impl GlyphMastery {
    /// Whole-number percentage, or `None` when never asked.
    pub fn accuracy_percent(&self) -> Option<u32> {
        self.stat.accuracy().map(|a| (a * 100.0).round() as u32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverallStats {
    pub correct: u64,
    pub total: u64,
}

impl OverallStats {
    pub fn from_stats(stats: &StatsMap) -> Self {
        stats.values().fold(Self::default(), |acc, stat| Self {
            correct: acc.correct + u64::from(stat.correct),
            total: acc.total + u64::from(stat.total),
        })
    }

    pub fn accuracy_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

/// One row per catalog character of `family`, unseen glyphs included.
pub fn family_mastery(catalog: &Catalog, family: Family, stats: &StatsMap) -> Vec<GlyphMastery> {
    catalog
        .family(family)
        .iter()
        .map(|character| {
            let stat = stats.get(&character.glyph).copied().unwrap_or_default();
            GlyphMastery {
                glyph: character.glyph.clone(),
                stat,
                mastery: Mastery::from_stat(&stat),
            }
        })
        .collect()
}
