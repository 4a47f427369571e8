//! Configuration manager
//!
//! 🗂️ Owns the live directive tree for one configuration directory:
//! backs up the primary file once, parses it, hands out the tree for
//! editing and writes it back without ever leaving a broken file behind.

use crate::registry::DirectiveRegistry;
use crate::root::RootDirectives;
use crate::tree;
use ngman_core::{Error, Result, Settings, Warning};
use ngman_syntax::{BuildOptions, ParseOptions, Payload, PayloadDirective};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lifecycle of a [`ConfigManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Nothing loaded yet
    Uninitialized,
    /// Backup of the primary file is in place
    BackedUp,
    /// Primary file parsed into a payload
    Parsed,
    /// Directive tree built; reads, edits and saves are allowed
    Ready,
    /// Initialization failed; the manager must be recreated
    Failed,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManagerState::Uninitialized => "uninitialized",
            ManagerState::BackedUp => "backed up",
            ManagerState::Parsed => "parsed",
            ManagerState::Ready => "ready",
            ManagerState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Entries found directly under the config root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigListing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl ConfigListing {
    /// List `root` without descending into subdirectories
    pub fn scan(root: &Path) -> Result<Self> {
        let mut listing = Self::default();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                listing.directories.push(name);
            } else {
                listing.files.push(name);
            }
        }
        listing.directories.sort();
        listing.files.sort();
        Ok(listing)
    }
}

/// Manager for a single configuration directory
#[derive(Debug)]
pub struct ConfigManager {
    settings: Settings,
    registry: &'static DirectiveRegistry,
    state: ManagerState,
    payload: Option<Payload>,
    directives: RootDirectives,
    listing: ConfigListing,
    warnings: Vec<Warning>,
}

impl ConfigManager {
    /// Create a manager using the built-in directive registry
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(settings, DirectiveRegistry::builtin())
    }

    /// Create a manager dispatching on a caller-provided registry
    pub fn with_registry(settings: Settings, registry: &'static DirectiveRegistry) -> Self {
        Self {
            settings,
            registry,
            state: ManagerState::Uninitialized,
            payload: None,
            directives: RootDirectives::new(),
            listing: ConfigListing::default(),
            warnings: Vec::new(),
        }
    }

    /// Create and initialize in one step
    pub fn open(settings: Settings) -> Result<Self> {
        let mut manager = Self::new(settings);
        manager.initialize()?;
        Ok(manager)
    }

    // ========================================
    // Loading
    // ========================================

    /// Back up, parse and build the directive tree.
    ///
    /// From `Ready` this reloads from disk; the backup is never recreated.
    /// Any failure leaves the manager `Failed`, after which it refuses to
    /// initialize again.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state == ManagerState::Failed {
            return Err(self.invalid_state("initialize"));
        }

        match self.load() {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("❌ Failed to load {}: {}", self.settings.primary_path().display(), e);
                self.state = ManagerState::Failed;
                self.payload = None;
                self.directives = RootDirectives::new();
                Err(e)
            }
        }
    }

    fn load(&mut self) -> Result<()> {
        let primary = self.settings.primary_path();
        if !primary.is_file() {
            return Err(Error::NotFound { path: primary });
        }

        self.listing = ConfigListing::scan(&self.settings.config_root)?;
        tracing::debug!(
            "Config root {}: directories {:?}, files {:?}",
            self.settings.config_root.display(),
            self.listing.directories,
            self.listing.files
        );

        self.ensure_backup(&primary)?;
        self.state = ManagerState::BackedUp;

        let payload = ngman_syntax::parse(&primary, &self.parse_options())?;
        self.state = ManagerState::Parsed;

        let mut warnings = Vec::new();
        let directives = tree::root_from_payload(
            &payload,
            &primary.display().to_string(),
            self.registry,
            &mut warnings,
        )?;

        tracing::info!(
            "📄 Loaded {} top-level directives from {} ({} unregistered)",
            directives.len(),
            primary.display(),
            warnings.len()
        );

        self.payload = Some(payload);
        self.directives = directives;
        self.warnings = warnings;
        self.state = ManagerState::Ready;
        Ok(())
    }

    /// Copy the primary file to its backup sibling unless one exists
    fn ensure_backup(&self, primary: &Path) -> Result<()> {
        let backup = self.settings.backup_path();
        if backup.exists() {
            tracing::debug!("Backup already present at {}", backup.display());
            return Ok(());
        }

        std::fs::copy(primary, &backup)?;
        tracing::info!("💾 Backed up {} to {}", primary.display(), backup.display());
        Ok(())
    }

    // ========================================
    // Access
    // ========================================

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &'static DirectiveRegistry {
        self.registry
    }

    /// Directory listing captured by the last initialization
    pub fn listing(&self) -> &ConfigListing {
        &self.listing
    }

    /// Unregistered directives seen by the last initialization
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Payload from the last parse or save; never reparses
    pub fn config_tree(&self) -> Result<&Payload> {
        self.require_ready("read the config tree")?;
        self.payload
            .as_ref()
            .ok_or_else(|| Error::Structural("no parsed payload cached".to_string()))
    }

    pub fn directives(&self) -> Result<&RootDirectives> {
        self.require_ready("read directives")?;
        Ok(&self.directives)
    }

    /// Live root collection; edits through it are what `save` writes
    pub fn directives_mut(&mut self) -> Result<&mut RootDirectives> {
        self.require_ready("edit directives")?;
        Ok(&mut self.directives)
    }

    // ========================================
    // Saving
    // ========================================

    /// Generate the text `save` would write, after checking it parses back
    /// into the same tree
    pub fn render(&self) -> Result<String> {
        self.require_ready("render")?;
        self.generate().map(|(text, _)| text)
    }

    /// Write the tree back to the primary file
    pub fn save(&mut self) -> Result<PathBuf> {
        let file_name = self.settings.primary_file.clone();
        self.save_as(&file_name)
    }

    /// Write the tree to `file_name` inside the config root.
    ///
    /// The text is regenerated and parsed back in memory first; unless the
    /// result matches the live tree nothing is written. The write itself goes through a temporary
    /// file in the target directory and a rename.
    pub fn save_as(&mut self, file_name: &str) -> Result<PathBuf> {
        self.require_ready("save")?;

        let target = self.settings.target_path(file_name);
        let (text, parsed) = self.generate()?;
        write_atomic(&target, &text)?;

        if target == self.settings.primary_path() {
            self.refresh_payload(&target, parsed);
        }

        tracing::info!("✅ Saved {} ({} bytes)", target.display(), text.len());
        Ok(target)
    }

    /// Bring the cached payload in line with the primary file just written.
    ///
    /// Include indices only exist in a payload read from disk, so with
    /// `follow_includes` the file is parsed again; the in-memory reparse is
    /// the fallback when that fails.
    fn refresh_payload(&mut self, target: &Path, parsed: Vec<PayloadDirective>) {
        if self.settings.follow_includes {
            match ngman_syntax::parse(target, &self.parse_options()) {
                Ok(payload) => {
                    self.payload = Some(payload);
                    return;
                }
                Err(e) => tracing::warn!(
                    "⚠️ Could not re-read {} after saving, include links in the cached payload are dropped: {}",
                    target.display(),
                    e
                ),
            }
        }

        let file = target.display().to_string();
        if let Some(entry) = self.payload.as_mut().and_then(|p| p.file_mut(&file)) {
            entry.parsed = Some(parsed);
        }
    }

    fn generate(&self) -> Result<(String, Vec<PayloadDirective>)> {
        let flattened = tree::flatten_block(self.directives.as_slice());
        let format = &self.settings.format;
        let options = BuildOptions {
            indent: format.indent,
            tabs: format.tabs,
            header: format.header,
        };
        let text = ngman_syntax::build(&flattened, &options);

        let check = ParseOptions {
            comments: true,
            ..ParseOptions::default()
        };
        let parsed = match ngman_syntax::parse_str(&text, &check) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("🔥 Generated configuration does not parse back, refusing to write: {}", e);
                return Err(Error::Parse {
                    file: "<generated>".to_string(),
                    line: Some(e.line()),
                    message: e.to_string(),
                });
            }
        };

        let expected = without_positions(&flattened, format.header);
        let actual = without_positions(&parsed, format.header);
        if let Some(index) = first_difference(&expected, &actual) {
            tracing::error!("🔥 Generated configuration parses back into a different tree, refusing to write");
            return Err(Error::Structural(format!(
                "generated text does not reproduce the directive tree (top-level entry {})",
                index + 1
            )));
        }

        Ok((text, parsed))
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            comments: self.settings.preserve_comments,
            single_file: !self.settings.follow_includes,
            catch_errors: false,
        }
    }

    fn require_ready(&self, operation: &'static str) -> Result<()> {
        match self.state {
            ManagerState::Ready => Ok(()),
            _ => Err(self.invalid_state(operation)),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            state: self.state.to_string(),
            operation,
        }
    }
}

/// Replace `target` with `text` via a sibling temporary file, keeping the
/// permissions of the file being replaced
///
/// A symlinked target is resolved first so the link survives and the file
/// it points at is the one replaced.
fn write_atomic(target: &Path, text: &str) -> Result<()> {
    let target = &resolve_symlink(target)?;
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Ok(metadata) = std::fs::metadata(target) {
        std::fs::set_permissions(tmp.path(), metadata.permissions())?;
    }

    tmp.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn resolve_symlink(path: &Path) -> Result<PathBuf> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => Ok(std::fs::canonicalize(path)?),
        _ => Ok(path.to_path_buf()),
    }
}

/// Directives with line numbers and include links cleared, and without a
/// leading generated header when `header` is set
fn without_positions(directives: &[PayloadDirective], header: bool) -> Vec<PayloadDirective> {
    let skip = usize::from(header && directives.first().is_some_and(ngman_syntax::is_header));
    directives[skip..]
        .iter()
        .map(|d| PayloadDirective {
            line: None,
            includes: None,
            block: d.block.as_deref().map(|b| without_positions(b, false)),
            ..d.clone()
        })
        .collect()
}

/// Index of the first top-level entry where the two lists disagree
fn first_difference(expected: &[PayloadDirective], actual: &[PayloadDirective]) -> Option<usize> {
    if expected == actual {
        return None;
    }
    Some(
        expected
            .iter()
            .zip(actual)
            .position(|(e, a)| e != a)
            .unwrap_or_else(|| expected.len().min(actual.len())),
    )
}
