//! Lexer for nginx configuration files
//!
//! Key features:
//! - Whitespace (newlines included) only separates tokens
//! - `{` `}` `;` are structural
//! - "..." and '...' quoted strings
//! - `#` starts a comment when it begins a token
//! - `${var}` groups stay inside the surrounding word

use logos::{Lexer, Logos, Span};
use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Token types for nginx configuration syntax
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    /// Comment text without the leading `#`
    #[regex(r"#[^\r\n]*", |lex| lex.slice()[1..].to_string())]
    Comment(String),

    // ============================================================
    // Structural
    // ============================================================
    #[token("{")]
    BlockOpen,

    #[token("}")]
    BlockClose,

    #[token(";")]
    Semicolon,

    // ============================================================
    // Values
    // ============================================================

    /// Quoted string literal with the quotes removed
    #[regex(r#""([^"\\]|\\(.|\n))*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\]|\\(.|\n))*'"#, |lex| unquote(lex.slice()))]
    Quoted(String),

    /// Bare word: directive names, unquoted arguments, paths, variables
    #[regex(r#"([^ \t\r\n\f{};"'#\\]|\\.)([^ \t\r\n\f{};"'\\]|\\.)*"#, word)]
    Word(String),
}

impl Token {
    /// Text carried by a word or quoted string
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Word(s) | Token::Quoted(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::BlockOpen => write!(f, "{{"),
            Token::BlockClose => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comment(s) => write!(f, "#{}", s),
            Token::Quoted(s) => write!(f, "\"{}\"", s),
            Token::Word(s) => write!(f, "{}", s),
            Token::Whitespace => write!(f, " "),
        }
    }
}

/// Extend a bare word across `${name}` groups.
///
/// The word regex stops at `{`, so a word ending in `$` followed by a brace
/// is grown by hand up to the closing brace and any word characters after it.
fn word(lex: &mut Lexer<Token>) -> Option<String> {
    while lex.slice().ends_with('$') && lex.remainder().starts_with('{') {
        let remainder = lex.remainder();
        let close = remainder.find(|c: char| c == '}' || c.is_whitespace())?;
        if !remainder[close..].starts_with('}') {
            return None;
        }
        let rest = continuation_len(&remainder[close + 1..]);
        lex.bump(close + 1 + rest);
    }
    Some(lex.slice().to_string())
}

/// Length of the leading run of characters that may continue a bare word
fn continuation_len(s: &str) -> usize {
    let mut len = 0;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((j, escaped)) if escaped != '\n' => len = j + escaped.len_utf8(),
                _ => break,
            },
            c if c.is_whitespace() || matches!(c, '{' | '}' | ';' | '"' | '\'') => break,
            c => len = i + c.len_utf8(),
        }
    }
    len
}

/// Strip the surrounding quotes and unescape the quote character and
/// backslash.
///
/// Other escape sequences are kept verbatim; nginx resolves them itself.
fn unquote(s: &str) -> String {
    let quote = s.chars().next().unwrap_or('"');
    let inner = &s[1..s.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(&next) = chars.peek().filter(|&&n| c == '\\' && (n == quote || n == '\\')) {
            result.push(next);
            chars.next();
        } else if c == '\\' {
            result.push('\\');
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Lexer result type
pub type LexResult = Result<Vec<Spanned<Token>>, LexError>;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character at position {position}")]
    UnexpectedChar { position: usize },

    #[error("unterminated quoted string starting at position {position}")]
    UnterminatedQuote { position: usize },

    #[error("unterminated variable starting at position {position}")]
    UnterminatedVariable { position: usize },
}

impl LexError {
    /// Byte offset the error points at
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedChar { position }
            | LexError::UnterminatedQuote { position }
            | LexError::UnterminatedVariable { position } => *position,
        }
    }
}

/// Tokenize an nginx configuration source string
pub fn tokenize(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    for (result, span) in lexer.spanned() {
        match result {
            Ok(Token::Whitespace) => continue,
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(()) => {
                let position = span.start;
                let err = match source[position..].chars().next() {
                    Some('"') | Some('\'') => LexError::UnterminatedQuote { position },
                    _ if source[span.clone()].ends_with('$')
                        && source[span.end..].starts_with('{') =>
                    {
                        LexError::UnterminatedVariable { position }
                    }
                    _ => LexError::UnexpectedChar { position },
                };
                return Err(err);
            }
        }
    }

    Ok(tokens)
}

/// Maps byte offsets to 1-based line numbers
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// Line containing `offset`
    pub fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}
