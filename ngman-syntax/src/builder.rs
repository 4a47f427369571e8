//! Configuration builder
//!
//! Turns payload directives back into nginx configuration text.

use crate::payload::PayloadDirective;

/// Header written at the top of generated files when requested
pub const HEADER: &str = "# This file was generated by ngman from a parsed configuration.\n\n";

/// Output formatting options
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Spaces per nesting level (ignored when `tabs` is set)
    pub indent: usize,

    /// Indent with one tab per level
    pub tabs: bool,

    /// Prepend [`HEADER`]
    pub header: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            tabs: false,
            header: false,
        }
    }
}

/// Build configuration text from a list of directives.
///
/// With `header` set, a header comment already leading `directives` (from
/// parsing a previously generated file) is replaced rather than repeated.
pub fn build(directives: &[PayloadDirective], options: &BuildOptions) -> String {
    let mut out = String::new();
    let mut directives = directives;
    if options.header {
        out.push_str(HEADER);
        if directives.first().is_some_and(is_header) {
            directives = &directives[1..];
        }
    }
    build_block(&mut out, directives, 0, options);
    out
}

/// Whether `directive` is the comment record [`HEADER`] parses into
pub fn is_header(directive: &PayloadDirective) -> bool {
    directive.is_comment() && directive.comment.as_deref() == HEADER.trim_end().strip_prefix('#')
}

fn build_block(out: &mut String, directives: &[PayloadDirective], depth: usize, options: &BuildOptions) {
    let margin = if options.tabs {
        "\t".repeat(depth)
    } else {
        " ".repeat(depth * options.indent)
    };

    for directive in directives {
        out.push_str(&margin);

        if let Some(comment) = directive.comment.as_deref().filter(|_| directive.is_comment()) {
            // Every line of a multi-line comment stays commented out
            for (i, line) in comment.split(['\n', '\r']).enumerate() {
                if i > 0 {
                    out.push_str(&margin);
                }
                out.push('#');
                out.push_str(line);
                out.push('\n');
            }
            continue;
        }

        out.push_str(&enquote(&directive.directive));
        if directive.directive == "if" && !directive.args.is_empty() {
            let condition: Vec<String> = directive.args.iter().map(|a| enquote(a)).collect();
            out.push_str(" (");
            out.push_str(&condition.join(" "));
            out.push(')');
        } else {
            for arg in &directive.args {
                out.push(' ');
                out.push_str(&enquote(arg));
            }
        }

        match &directive.block {
            None => out.push_str(";\n"),
            Some(block) if block.is_empty() => out.push_str(" {}\n"),
            Some(block) => {
                out.push_str(" {\n");
                build_block(out, block, depth + 1, options);
                out.push_str(&margin);
                out.push_str("}\n");
            }
        }
    }
}

/// Quote a token if it would not survive re-tokenizing as a bare word
fn enquote(token: &str) -> String {
    if !needs_quotes(token) {
        return token.to_string();
    }

    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted.push_str("\\\""),
            // A backslash before another backslash, a quote or the closing
            // quote is escaped; any other escape is kept as written.
            '\\' if matches!(chars.peek(), None | Some('\\') | Some('"')) => quoted.push_str("\\\\"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn needs_quotes(token: &str) -> bool {
    if token.is_empty() || token.starts_with('#') || token.ends_with('\\') {
        return true;
    }

    let mut chars = token.chars().peekable();
    let mut prev = None;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                prev = chars.next();
                if prev == Some('\n') {
                    return true;
                }
                continue;
            }
            // `${name}` is still a bare word
            '{' if prev == Some('$') => {
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    if inner.is_whitespace() {
                        return true;
                    }
                }
                if !closed {
                    return true;
                }
            }
            c if c.is_whitespace() || matches!(c, '{' | '}' | ';' | '"' | '\'') => return true,
            _ => {}
        }
        prev = Some(c);
    }
    false
}
