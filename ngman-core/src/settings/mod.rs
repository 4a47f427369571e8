//! Settings management for ngman

mod loader;
mod types;

pub use loader::{SettingsLoader, CONFIG_ROOT_ENV, SETTINGS_FILENAME};
pub use types::*;
