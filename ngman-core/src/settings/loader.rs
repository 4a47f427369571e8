//! Settings loader

use crate::error::{Error, Result};
use crate::settings::Settings;
use std::path::{Path, PathBuf};

/// Environment variable overriding `config_root`
pub const CONFIG_ROOT_ENV: &str = "NGMAN_CONFIG_ROOT";

/// Settings file name looked up in the user config directory
pub const SETTINGS_FILENAME: &str = "ngman.toml";

/// Settings loader for various formats
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("Failed to read settings file {}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "json" => Self::from_json(&content),
            "toml" | "" => Self::from_toml(&content),
            _ => Err(Error::Settings(format!("Unknown settings format: {}", ext))),
        }
    }

    /// Parse JSON settings
    pub fn from_json(content: &str) -> Result<Settings> {
        serde_json::from_str(content).map_err(|e| Error::Settings(format!("Invalid JSON: {}", e)))
    }

    /// Parse TOML settings
    pub fn from_toml(content: &str) -> Result<Settings> {
        toml::from_str(content).map_err(|e| Error::Settings(format!("Invalid TOML: {}", e)))
    }

    /// Default settings file location in the user config directory
    pub fn discover() -> Option<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("ngman").join(SETTINGS_FILENAME))
            .filter(|path| path.is_file())
    }

    /// Resolve settings: an explicit file, else a discovered one, else
    /// defaults; then apply environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Settings> {
        let mut settings = match explicit.map(Path::to_path_buf).or_else(Self::discover) {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load(path)?
            }
            None => Settings::default(),
        };
        Self::apply_env(&mut settings, std::env::var_os(CONFIG_ROOT_ENV).map(PathBuf::from));
        Ok(settings)
    }

    fn apply_env(settings: &mut Settings, config_root: Option<PathBuf>) {
        if let Some(root) = config_root.filter(|root| !root.as_os_str().is_empty()) {
            tracing::debug!("{} overrides config root: {}", CONFIG_ROOT_ENV, root.display());
            settings.config_root = root;
        }
    }
}
