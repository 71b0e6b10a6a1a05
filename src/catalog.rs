use std::collections::BTreeSet;
use std::fmt;

use icu_normalizer::ComposingNormalizerBorrowed;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/catalog/"]
struct CatalogAssets;

/// Number of characters in each bundled family (basic gojūon).
pub const FAMILY_SIZE: usize = 46;

/// An immutable glyph/romanization pair. The glyph is its identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    pub glyph: String,
    pub romanization: String,
}

impl Character {
    pub fn new(glyph: &str, romanization: &str) -> Self {
        Self {
            glyph: normalize_glyph(glyph),
            romanization: romanization.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Hiragana,
    Katakana,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Hiragana, Family::Katakana];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Hiragana => "hiragana",
            Family::Katakana => "katakana",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "hiragana" => Some(Family::Hiragana),
            "katakana" => Some(Family::Katakana),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Family::Hiragana => "Hiragana (あ)",
            Family::Katakana => "Katakana (ア)",
        }
    }

    fn asset_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, never-empty set of selected families.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilySelection {
    families: BTreeSet<Family>,
}

impl FamilySelection {
    pub fn single(family: Family) -> Self {
        Self {
            families: BTreeSet::from([family]),
        }
    }

    /// Returns `None` when `families` is empty.
    pub fn from_families(families: impl IntoIterator<Item = Family>) -> Option<Self> {
        let families: BTreeSet<Family> = families.into_iter().collect();
        if families.is_empty() {
            None
        } else {
            Some(Self { families })
        }
    }

    pub fn contains(&self, family: Family) -> bool {
        self.families.contains(&family)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Families in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Family> + '_ {
        self.families.iter().copied()
    }

    /// Adds `family` if absent, removes it if present. Removing the last
    /// selected family is refused and returns `false`.
    pub fn toggle(&mut self, family: Family) -> bool {
        if self.families.contains(&family) {
            if self.families.len() == 1 {
                return false;
            }
            self.families.remove(&family);
        } else {
            self.families.insert(family);
        }
        true
    }
}

impl Default for FamilySelection {
    fn default() -> Self {
        Self::single(Family::Hiragana)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("bundled catalog asset {0} is missing")]
    MissingAsset(String),
    #[error("bundled catalog asset {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
    #[error("family {family} lists {found} characters, expected {expected}")]
    WrongSize {
        family: Family,
        found: usize,
        expected: usize,
    },
}

#[derive(Deserialize)]
struct FamilyFile {
    family: Family,
    characters: Vec<Character>,
}

/// Read-only character lists for every family.
#[derive(Clone, Debug)]
pub struct Catalog {
    hiragana: Vec<Character>,
    katakana: Vec<Character>,
}

impl Catalog {
    /// Load both families from the embedded assets.
    pub fn load() -> Result<Self, CatalogError> {
        let hiragana = load_family(Family::Hiragana)?;
        let katakana = load_family(Family::Katakana)?;
        log::debug!(
            "catalog loaded: {} hiragana, {} katakana",
            hiragana.len(),
            katakana.len()
        );
        Ok(Self { hiragana, katakana })
    }

    /// Build a catalog from explicit lists, e.g. for tests with tiny pools.
    pub fn from_lists(hiragana: Vec<Character>, katakana: Vec<Character>) -> Self {
        Self { hiragana, katakana }
    }

    pub fn family(&self, family: Family) -> &[Character] {
        match family {
            Family::Hiragana => &self.hiragana,
            Family::Katakana => &self.katakana,
        }
    }

    /// Union of the selected families: family order, then catalog order.
    pub fn pool_for(&self, families: impl IntoIterator<Item = Family>) -> Vec<Character> {
        let mut chosen: Vec<Family> = families.into_iter().collect();
        chosen.sort();
        chosen.dedup();
        chosen
            .into_iter()
            .flat_map(|family| self.family(family).iter().cloned())
            .collect()
    }
}

fn load_family(family: Family) -> Result<Vec<Character>, CatalogError> {
    let name = family.asset_name();
    let file = CatalogAssets::get(&name).ok_or_else(|| CatalogError::MissingAsset(name.clone()))?;
    let content = std::str::from_utf8(file.data.as_ref()).map_err(|e| CatalogError::Malformed {
        name: name.clone(),
        reason: e.to_string(),
    })?;
    let parsed: FamilyFile = serde_json::from_str(content).map_err(|e| CatalogError::Malformed {
        name: name.clone(),
        reason: e.to_string(),
    })?;

    if parsed.family != family {
        return Err(CatalogError::Malformed {
            name,
            reason: format!("declares family {}", parsed.family),
        });
    }
    if let Some(bad) = parsed
        .characters
        .iter()
        .find(|c| c.glyph.trim().is_empty() || c.romanization.trim().is_empty())
    {
        return Err(CatalogError::Malformed {
            name,
            reason: format!("blank entry {bad:?}"),
        });
    }
    if parsed.characters.len() != FAMILY_SIZE {
        return Err(CatalogError::WrongSize {
            family,
            found: parsed.characters.len(),
            expected: FAMILY_SIZE,
        });
    }

    Ok(parsed
        .characters
        .iter()
        .map(|c| Character::new(&c.glyph, &c.romanization))
        .collect())
}

/// NFC-normalize a glyph so stats keys match however the glyph was composed.
pub fn normalize_glyph(glyph: &str) -> String {
    ComposingNormalizerBorrowed::new_nfc()
        .normalize(glyph)
        .into_owned()
}
