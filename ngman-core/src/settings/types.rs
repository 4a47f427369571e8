//! Settings type definitions
//!
//! These types describe where the managed configuration lives and how
//! ngman reads and writes it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings for ngman
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the managed configuration
    #[serde(default = "default_config_root")]
    pub config_root: PathBuf,

    /// Primary configuration file, relative to `config_root`
    #[serde(default = "default_primary_file")]
    pub primary_file: String,

    /// Suffix appended to the primary file name for the one-time backup
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Keep `#` comments in the directive tree so saves do not drop them
    #[serde(default = "default_true")]
    pub preserve_comments: bool,

    /// Follow `include` directives when building the config tree
    #[serde(default)]
    pub follow_includes: bool,

    /// Output formatting for saved files
    #[serde(default)]
    pub format: FormatConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_root: default_config_root(),
            primary_file: default_primary_file(),
            backup_suffix: default_backup_suffix(),
            preserve_comments: true,
            follow_includes: false,
            format: FormatConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Settings for a config directory, everything else default
    pub fn for_root(config_root: impl Into<PathBuf>) -> Self {
        Self {
            config_root: config_root.into(),
            ..Self::default()
        }
    }

    /// Full path of the primary configuration file
    pub fn primary_path(&self) -> PathBuf {
        self.config_root.join(&self.primary_file)
    }

    /// Full path of the backup sibling (`nginx.conf` -> `nginx.conf.backup`)
    pub fn backup_path(&self) -> PathBuf {
        self.config_root
            .join(format!("{}{}", self.primary_file, self.backup_suffix))
    }

    /// Full path of a file inside the config root
    pub fn target_path(&self, file_name: &str) -> PathBuf {
        self.config_root.join(file_name)
    }
}

/// Formatting options for generated configuration text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Spaces per nesting level
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Indent with tabs instead of spaces
    #[serde(default)]
    pub tabs: bool,

    /// Write a "generated by" header comment
    #[serde(default)]
    pub header: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            tabs: false,
            header: false,
        }
    }
}

/// Global logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_config_root() -> PathBuf {
    PathBuf::from("/etc/nginx")
}

fn default_primary_file() -> String {
    "nginx.conf".to_string()
}

fn default_backup_suffix() -> String {
    ".backup".to_string()
}

fn default_true() -> bool {
    true
}

fn default_indent() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
