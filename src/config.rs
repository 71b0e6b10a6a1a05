use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::{Family, FamilySelection};
use crate::session::controller::{Pacing, SessionSettings};
use crate::session::timer::TimerDuration;

const MIN_PAUSE_MS: u64 = 100;
const MAX_PAUSE_MS: u64 = 10_000;
const MIN_TICK_MS: u64 = 16;
const MAX_TICK_MS: u64 = 1_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_families", deserialize_with = "lenient_families")]
    pub families: Vec<Family>,
    #[serde(default = "default_timer_seconds")]
    pub timer_seconds: TimerDuration,
    #[serde(default = "default_answer_pause_ms")]
    pub answer_pause_ms: u64,
    #[serde(default = "default_timeout_pause_ms")]
    pub timeout_pause_ms: u64,
    #[serde(default = "default_sound")]
    pub sound: bool,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_locale() -> String {
    "en".to_string()
}
fn default_families() -> Vec<Family> {
    vec![Family::Hiragana]
}
/// Unknown family names are dropped rather than failing the whole file.
fn lenient_families<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Family>, D::Error> {
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names
        .iter()
        .filter_map(|name| {
            let family = Family::from_key(name);
            if family.is_none() {
                log::warn!("Ignoring unknown family '{name}' in config");
            }
            family
        })
        .collect())
}
fn default_timer_seconds() -> TimerDuration {
    TimerDuration::Five
}
fn default_answer_pause_ms() -> u64 {
    1000
}
fn default_timeout_pause_ms() -> u64 {
    2000
}
fn default_sound() -> bool {
    true
}
fn default_tick_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            locale: default_locale(),
            families: default_families(),
            timer_seconds: default_timer_seconds(),
            answer_pause_ms: default_answer_pause_ms(),
            timeout_pause_ms: default_timeout_pause_ms(),
            sound: default_sound(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadrill")
            .join("config.toml")
    }

    /// Clamp numeric settings into range and drop duplicate families.
    /// Call after deserialization; hand-edited files can hold anything.
    pub fn validate(&mut self) {
        let mut families: Vec<Family> = Vec::new();
        for family in self.families.drain(..) {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        if families.is_empty() {
            families = default_families();
        }
        self.families = families;

        self.answer_pause_ms = self.answer_pause_ms.clamp(MIN_PAUSE_MS, MAX_PAUSE_MS);
        self.timeout_pause_ms = self.timeout_pause_ms.clamp(MIN_PAUSE_MS, MAX_PAUSE_MS);
        self.tick_ms = self.tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS);
        if !matches!(self.locale.as_str(), "en" | "vi") {
            self.locale = default_locale();
        }
    }

    pub fn family_selection(&self) -> FamilySelection {
        FamilySelection::from_families(self.families.iter().copied()).unwrap_or_default()
    }

    pub fn set_family_selection(&mut self, selection: &FamilySelection) {
        self.families = selection.iter().collect();
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            answer_pause: Duration::from_millis(self.answer_pause_ms),
            timeout_pause: Duration::from_millis(self.timeout_pause_ms),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            families: self.family_selection(),
            timer: self.timer_seconds,
            pacing: self.pacing(),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.families, vec![Family::Hiragana]);
        assert_eq!(config.timer_seconds, TimerDuration::Five);
        assert_eq!(config.answer_pause_ms, 1000);
        assert_eq!(config.timeout_pause_ms, 2000);
        assert!(config.sound);
    }

    #[test]
    fn test_config_reads_unlimited_sentinel() {
        let toml_str = r#"
families = ["katakana", "hiragana"]
timer_seconds = 999
sound = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timer_seconds, TimerDuration::Unlimited);
        assert!(!config.sound);
        let selection = config.family_selection();
        assert_eq!(
            selection.iter().collect::<Vec<_>>(),
            vec![Family::Hiragana, Family::Katakana]
        );
    }

    #[test]
    fn test_config_rejects_unknown_timer_value() {
        assert!(toml::from_str::<Config>("timer_seconds = 7").is_err());
    }

    #[test]
    fn test_unknown_family_keeps_rest_of_config() {
        let toml_str = r#"
theme = "catppuccin-mocha"
families = ["hiragana", "kanji"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.families, vec![Family::Hiragana]);
    }

    #[test]
    fn test_only_unknown_families_fall_back_to_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "families = [\"kanji\"]\nsound = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.families, vec![Family::Hiragana]);
        assert!(!config.sound);
    }

    #[test]
    fn test_save_to_then_load_from() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.locale = "vi".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap().locale, "vi");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.timer_seconds = TimerDuration::Ten;
        config.families = vec![Family::Katakana];
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.timer_seconds, TimerDuration::Ten);
        assert_eq!(deserialized.families, vec![Family::Katakana]);
        assert_eq!(deserialized.theme, config.theme);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.families = Vec::new();
        config.answer_pause_ms = 0;
        config.timeout_pause_ms = 60_000;
        config.tick_ms = 1;
        config.locale = "fr".to_string();
        config.validate();

        assert_eq!(config.families, vec![Family::Hiragana]);
        assert_eq!(config.answer_pause_ms, 100);
        assert_eq!(config.timeout_pause_ms, 10_000);
        assert_eq!(config.tick_ms, 16);
        assert_eq!(config.locale, "en");
    }

    #[test]
    fn test_validate_dedupes_families() {
        let mut config = Config::default();
        config.families = vec![Family::Katakana, Family::Katakana, Family::Hiragana];
        config.validate();
        assert_eq!(config.families, vec![Family::Katakana, Family::Hiragana]);
    }

    #[test]
    fn test_pacing_keeps_distinct_delays() {
        let pacing = Config::default().pacing();
        assert_eq!(pacing.answer_pause, Duration::from_millis(1000));
        assert_eq!(pacing.timeout_pause, Duration::from_millis(2000));
    }
}
