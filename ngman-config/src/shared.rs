//! Shared handle to a configuration manager

use crate::manager::ConfigManager;
use crate::root::RootDirectives;
use ngman_core::Result;
use ngman_syntax::Payload;
use parking_lot::{Mutex, MutexGuard};
use std::path::PathBuf;
use std::sync::Arc;

/// Cloneable handle serializing access to one [`ConfigManager`].
///
/// Edits and saves each hold the lock for their whole duration, so a save
/// never observes a half-applied edit.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<Mutex<ConfigManager>>,
}

impl SharedConfig {
    pub fn new(manager: ConfigManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Lock the manager directly
    pub fn lock(&self) -> MutexGuard<'_, ConfigManager> {
        self.inner.lock()
    }

    /// Run `f` against the live directives
    pub fn edit<T>(&self, f: impl FnOnce(&mut RootDirectives) -> T) -> Result<T> {
        let mut manager = self.inner.lock();
        Ok(f(manager.directives_mut()?))
    }

    /// Run `f` against the directives without mutating them
    pub fn read<T>(&self, f: impl FnOnce(&RootDirectives) -> T) -> Result<T> {
        let manager = self.inner.lock();
        Ok(f(manager.directives()?))
    }

    /// Regenerate, validate and write the primary file under one lock
    pub fn save(&self) -> Result<PathBuf> {
        self.inner.lock().save()
    }

    /// Snapshot of the cached payload
    pub fn config_tree(&self) -> Result<Payload> {
        self.inner.lock().config_tree().cloned()
    }
}
