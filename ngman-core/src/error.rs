//! Error types for ngman

use ngman_syntax::SyntaxError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ngman operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ngman
#[derive(Error, Debug)]
pub enum Error {
    /// The primary configuration file does not exist
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Configuration text is not syntactically valid
    #[error("parse error in {file}{}: {message}", line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        file: String,
        line: Option<usize>,
        message: String,
    },

    /// An `include` target could not be resolved or read
    #[error("include error in {file} (line {line}): {message}")]
    Include {
        file: String,
        line: usize,
        message: String,
    },

    /// Parser output, or text generated for saving, does not have the
    /// expected shape
    #[error("unexpected parser output: {0}")]
    Structural(String),

    /// Operation not allowed in the manager's current state
    #[error("cannot {operation} while the configuration manager is {state}")]
    InvalidState {
        state: String,
        operation: &'static str,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings error
    #[error("Settings error: {0}")]
    Settings(String),
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        match err {
            SyntaxError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                Error::NotFound { path: path.into() }
            }
            SyntaxError::Io { source, .. } => Error::Io(source),
            SyntaxError::Parse { file, source } => Error::Parse {
                file,
                line: Some(source.line()),
                message: source.to_string(),
            },
            SyntaxError::Include {
                file,
                line,
                message,
            } => Error::Include { file, line, message },
            SyntaxError::Payload(e) => Error::Structural(e.to_string()),
        }
    }
}

/// Non-fatal findings collected while building the directive tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A directive with no registry entry, kept as a generic node
    UnregisteredDirective { name: String, line: Option<usize> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnregisteredDirective { name, line: Some(line) } => {
                write!(f, "unregistered directive \"{}\" on line {}", name, line)
            }
            Warning::UnregisteredDirective { name, line: None } => {
                write!(f, "unregistered directive \"{}\"", name)
            }
        }
    }
}
