//! Generic parsed representation
//!
//! The payload is a plain nested-list/record form of one or more
//! configuration files. It is what the parser produces and what the builder
//! consumes, and it serializes to JSON as-is.

use serde::{Deserialize, Serialize};

/// Outcome of parsing a payload or a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Ok,
    Failed,
}

/// Result of parsing a configuration file and everything it includes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub status: Status,

    /// Errors from every file, tagged with the file they came from
    #[serde(default)]
    pub errors: Vec<PayloadError>,

    /// One entry per parsed file, the primary file first
    #[serde(default)]
    pub config: Vec<ConfigFile>,
}

impl Payload {
    /// Find the entry for `path`
    pub fn file(&self, path: &str) -> Option<&ConfigFile> {
        self.config.iter().find(|entry| entry.file == path)
    }

    /// Find the entry for `path`, mutably
    pub fn file_mut(&mut self, path: &str) -> Option<&mut ConfigFile> {
        self.config.iter_mut().find(|entry| entry.file == path)
    }

    /// Record an error against the entry at `index`
    pub fn record_error(&mut self, index: usize, line: Option<usize>, error: impl Into<String>) {
        let error = error.into();
        if let Some(entry) = self.config.get_mut(index) {
            entry.status = Status::Failed;
            entry.errors.push(PayloadError {
                file: None,
                line,
                error: error.clone(),
            });
            self.errors.push(PayloadError {
                file: Some(entry.file.clone()),
                line,
                error,
            });
        }
        self.status = Status::Failed;
    }

    /// Parse a payload from its JSON form
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Pretty-printed JSON form
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Parsed content of a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Path as it was opened
    pub file: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub errors: Vec<PayloadError>,

    /// Top-level directives; absent when the file could not be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Vec<PayloadDirective>>,
}

impl ConfigFile {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: Status::Ok,
            errors: Vec::new(),
            parsed: None,
        }
    }

    pub fn with_parsed(mut self, parsed: Vec<PayloadDirective>) -> Self {
        self.parsed = Some(parsed);
        self
    }
}

/// An error attached to a payload or file entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default)]
    pub line: Option<usize>,

    pub error: String,
}

/// A single directive record: name, arguments and optional block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadDirective {
    /// Directive name (e.g. "server", "listen"), or `#` for a comment
    pub directive: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Indices into [`Payload::config`] of the files an `include` pulled in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<usize>>,

    /// Nested block; absent means the directive ends with `;`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Vec<PayloadDirective>>,

    /// Comment text, only set when `directive` is `#`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Directive name used for comment records
pub const COMMENT_DIRECTIVE: &str = "#";

impl PayloadDirective {
    pub fn new(directive: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            line: None,
            args: Vec::new(),
            includes: None,
            block: None,
            comment: None,
        }
    }

    /// A comment record
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            comment: Some(text.into()),
            ..Self::new(COMMENT_DIRECTIVE)
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_block(mut self, block: Vec<PayloadDirective>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn is_comment(&self) -> bool {
        self.directive == COMMENT_DIRECTIVE && self.comment.is_some()
    }
}
