// Config service
// Widget settings stored as TOML files

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::models::settings::{AgendaSettings, SettingsError};
use crate::services::filter::SourceFilter;

/// `<config dir>/widgets/<widget_id>.toml`, if a home directory is known.
pub fn default_settings_path(widget_id: u32) -> Option<PathBuf> {
    ProjectDirs::from("org", "AgendaWidget", "agenda-widget").map(|dirs| {
        dirs.config_dir()
            .join("widgets")
            .join(format!("{}.toml", widget_id))
    })
}

/// Parse and validate settings.
pub fn parse_settings(text: &str) -> Result<AgendaSettings, SettingsError> {
    let settings: AgendaSettings = toml::from_str(text)?;
    settings.validate()?;
    SourceFilter::from_settings(&settings)?;
    Ok(settings)
}

pub fn load_settings(path: &Path) -> Result<AgendaSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("invalid settings in {}", path.display()))
}

/// Settings of `widget_id` from the default location; defaults when the
/// file does not exist.
pub fn load_or_default(widget_id: u32) -> Result<AgendaSettings> {
    match default_settings_path(widget_id) {
        Some(path) if path.exists() => load_settings(&path),
        _ => {
            log::info!("widget {}: no settings file, using defaults", widget_id);
            Ok(AgendaSettings {
                widget_id,
                ..AgendaSettings::default()
            })
        }
    }
}

pub fn save_settings(path: &Path, settings: &AgendaSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create dir {}", parent.display()))?;
    }

    let text = toml::to_string_pretty(settings).context("failed to serialize settings")?;
    fs::write(path, text)
        .with_context(|| format!("failed to write settings to {}", path.display()))?;
    Ok(())
}
