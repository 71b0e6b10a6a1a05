use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;

use crate::config::Config;
use crate::store::kv::KeyValueStore;
use crate::store::schema::{EXPORT_VERSION, ExportData};
use crate::store::stats::StatsStore;

/// Bundle the current stats and config into an export payload.
pub fn export_data<S: KeyValueStore>(stats: &StatsStore<S>, config: &Config) -> ExportData {
    ExportData {
        kanadrill_export_version: EXPORT_VERSION,
        exported_at: Utc::now(),
        config: config.clone(),
        stats: stats.snapshot().clone(),
    }
}

pub fn write_export(path: &Path, data: &ExportData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("Cannot create {}", tmp_path.display()))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn read_export(path: &Path) -> Result<ExportData> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let data: ExportData = serde_json::from_str(&content)
        .with_context(|| format!("Cannot parse {}", path.display()))?;
    Ok(data)
}

/// Replace stored stats with the exported ones after validating them.
pub fn import_data<S: KeyValueStore>(stats: &mut StatsStore<S>, data: &ExportData) -> Result<()> {
    if data.kanadrill_export_version != EXPORT_VERSION {
        bail!(
            "Unsupported export version: {} (expected {})",
            data.kanadrill_export_version,
            EXPORT_VERSION
        );
    }
    if let Some((glyph, stat)) = data.stats.iter().find(|(_, s)| !s.is_consistent()) {
        bail!(
            "Invalid stats for {glyph}: correct {} exceeds total {}",
            stat.correct,
            stat.total
        );
    }
    stats.replace(data.stats.clone())?;
    log::info!("Imported stats for {} glyphs", stats.snapshot().len());
    Ok(())
}
