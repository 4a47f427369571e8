//! nginx configuration syntax
//!
//! This crate converts between configuration text and a plain payload: a
//! nested list of `{directive, args, block?}` records grouped per file. It
//! knows nothing about what directives mean.
//!
//! # Example
//!
//! ```rust,ignore
//! use ngman_syntax::{build, parse_str, BuildOptions, ParseOptions};
//!
//! let parsed = parse_str("events { worker_connections 1024; }", &ParseOptions::default())?;
//! let text = build(&parsed, &BuildOptions::default());
//! assert_eq!(text, "events {\n    worker_connections 1024;\n}\n");
//! ```

pub mod builder;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod payload;

pub use builder::{build, is_header, BuildOptions, HEADER};
pub use lexer::{tokenize, LexError, Location, Spanned, Token};
pub use loader::parse;
pub use parser::{parse_str, ParseError, ParseOptions, Parser};
pub use payload::{ConfigFile, Payload, PayloadDirective, PayloadError, Status, COMMENT_DIRECTIVE};

/// Errors from loading and parsing configuration files
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("{file}:{line}: {message}")]
    Include {
        file: String,
        line: usize,
        message: String,
    },

    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Build a payload file entry back into text
pub fn build_file(entry: &ConfigFile, options: &BuildOptions) -> Option<String> {
    entry.parsed.as_deref().map(|parsed| build(parsed, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_file_requires_parsed_content() {
        let empty = ConfigFile::new("nginx.conf");
        assert_eq!(build_file(&empty, &BuildOptions::default()), None);

        let entry = ConfigFile::new("nginx.conf")
            .with_parsed(vec![PayloadDirective::new("daemon").with_args(vec!["off".into()])]);
        assert_eq!(
            build_file(&entry, &BuildOptions::default()).as_deref(),
            Some("daemon off;\n")
        );
    }

    #[test]
    fn test_payload_json_round_trip_through_builder() {
        let json = r#"{
            "status": "ok",
            "errors": [],
            "config": [{
                "file": "nginx.conf",
                "status": "ok",
                "errors": [],
                "parsed": [
                    {"directive": "events", "args": [], "block": [
                        {"directive": "worker_connections", "args": ["512"]}
                    ]}
                ]
            }]
        }"#;
        let payload = Payload::from_json(json).unwrap();
        let text = build_file(&payload.config[0], &BuildOptions::default()).unwrap();
        assert_eq!(text, "events {\n    worker_connections 512;\n}\n");
    }
}
