//! Directive contexts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a directive may legally appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Context {
    /// Top level of the file
    Main,
    Events,
    Http,
    Server,
    Location,
    Upstream,
}

impl Context {
    /// Every context, in nesting order
    pub const ALL: &'static [Context] = &[
        Context::Main,
        Context::Events,
        Context::Http,
        Context::Server,
        Context::Location,
        Context::Upstream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Main => "main",
            Context::Events => "events",
            Context::Http => "http",
            Context::Server => "server",
            Context::Location => "location",
            Context::Upstream => "upstream",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
