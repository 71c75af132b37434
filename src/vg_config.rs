// User settings file
// Preferred modules and base directories, persisted as TOML in the per-project config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "vaultgate.toml";

/// Base directory overrides from the settings file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PathSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// User settings
/// Command-line options win over anything set here
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    // Display module to ask for when -m is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_module: Option<String>,

    // Sound module to ask for when -s is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_module: Option<String>,

    pub paths: PathSettings,
}

/// Get the settings file path
/// Uses the platform config directory (e.g., ~/.config/vaultgate/vaultgate.toml on Linux)
/// Falls back to the current directory if ProjectDirs is unavailable
pub fn settings_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("org", "vaultgate", "vaultgate") {
        return Some(proj.config_dir().join(SETTINGS_FILE));
    }
    env::current_dir().ok().map(|dir| dir.join(SETTINGS_FILE))
}

/// Load settings from the default location, creating the file on first run
pub fn load_or_create_settings() -> Settings {
    match settings_path() {
        Some(path) => load_or_create_settings_at(&path),
        None => Settings::default(),
    }
}

/// Load settings from `path`, writing defaults there if it does not exist yet.
/// An unreadable or malformed file yields defaults and is left untouched.
pub fn load_or_create_settings_at(path: &Path) -> Settings {
    if path.exists() {
        return match fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Settings>(&s) {
                Ok(settings) => {
                    log::debug!("loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("ignoring malformed {}: {}", path.display(), e);
                    Settings::default()
                }
            },
            Err(e) => {
                log::warn!("cannot read {}: {}", path.display(), e);
                Settings::default()
            }
        };
    }

    let settings = Settings::default();
    save_settings_at(&settings, path);
    settings
}

/// Write settings to `path` as TOML; failures are logged, never fatal
pub fn save_settings_at(settings: &Settings, path: &Path) {
    let text = match toml::to_string(settings) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("cannot serialize settings: {}", e);
            return;
        }
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match fs::write(path, text) {
        Ok(()) => log::info!("wrote default settings to {}", path.display()),
        Err(e) => log::warn!("cannot write {}: {}", path.display(), e),
    }
}
