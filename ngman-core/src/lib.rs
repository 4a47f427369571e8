//! ngman Core Library
//!
//! This crate provides the error taxonomy and the settings shared by the
//! ngman crates.

pub mod error;
pub mod settings;

pub use error::{Error, Result, Warning};
pub use settings::{Settings, SettingsLoader};

/// ngman version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
