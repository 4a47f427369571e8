//! nginx configuration parser
//!
//! Recursive descent parser that converts tokens into payload directives.

use crate::lexer::{tokenize, LexError, LineIndex, Location, Spanned, Token};
use crate::payload::PayloadDirective;
use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Parser error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{source} (line {line})")]
    Lex {
        source: LexError,
        line: usize,
        span: Location,
    },

    #[error("unexpected \"{found}\" on line {line}")]
    UnexpectedToken {
        found: String,
        line: usize,
        span: Location,
    },

    #[error("unexpected end of file, expecting {expected} (line {line})")]
    UnexpectedEof {
        expected: String,
        line: usize,
        span: Location,
    },
}

impl ParseError {
    /// 1-based line the error was detected on
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex { line, .. }
            | ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEof { line, .. } => *line,
        }
    }

    /// Byte range the error points at
    pub fn span(&self) -> Location {
        match self {
            ParseError::Lex { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. } => *span,
        }
    }

    /// Render an annotated report against the source text
    pub fn report(&self, name: &str, source: &str) -> String {
        let span = self.span();
        let start = span.start.min(source.len());
        let range = start..span.end.clamp(start, source.len());
        let label = match self {
            ParseError::Lex { .. } => "cannot tokenize this".to_string(),
            ParseError::UnexpectedToken { found, .. } => format!("\"{}\" is not allowed here", found),
            ParseError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
        };

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, (name, range.clone()))
            .with_config(Config::default().with_color(false).with_index_type(IndexType::Byte))
            .with_message(self.to_string())
            .with_label(Label::new((name, range)).with_message(label))
            .finish()
            .write((name, Source::from(source)), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Options controlling what the parser keeps
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Keep `#` comments as comment records
    pub comments: bool,

    /// Do not follow `include` directives
    pub single_file: bool,

    /// Record per-file errors in the payload instead of failing
    pub catch_errors: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comments: false,
            single_file: true,
            catch_errors: false,
        }
    }
}

/// Parser state
pub struct Parser<'a> {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    lines: LineIndex,
    source_len: usize,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    /// Create a new parser from source text
    pub fn new(source: &str, options: &'a ParseOptions) -> ParseResult<Self> {
        let lines = LineIndex::new(source);
        let tokens = tokenize(source).map_err(|err| {
            let position = err.position();
            ParseError::Lex {
                line: lines.line(position),
                span: Location {
                    start: position,
                    end: position + 1,
                },
                source: err,
            }
        })?;

        Ok(Self {
            tokens,
            pos: 0,
            lines,
            source_len: source.len(),
            options,
        })
    }

    /// Parse the whole file as a list of top-level directives
    pub fn parse(&mut self) -> ParseResult<Vec<PayloadDirective>> {
        self.parse_block(false)
    }

    // ========================================
    // Blocks
    // ========================================

    fn parse_block(&mut self, nested: bool) -> ParseResult<Vec<PayloadDirective>> {
        let mut block = Vec::new();

        loop {
            match self.peek().cloned() {
                None if nested => return Err(self.eof_error("\"}\"")),
                None => return Ok(block),
                Some(Token::BlockClose) if nested => {
                    self.advance();
                    return Ok(block);
                }
                Some(Token::Comment(text)) => {
                    let line = self.current_line();
                    self.advance();
                    if self.options.comments {
                        block.push(PayloadDirective::comment(text).at_line(line));
                    }
                }
                Some(Token::Word(name)) | Some(Token::Quoted(name)) => {
                    self.parse_directive(name, &mut block)?;
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    // ========================================
    // Directives
    // ========================================

    fn parse_directive(&mut self, name: String, block: &mut Vec<PayloadDirective>) -> ParseResult<()> {
        let line = self.current_line();
        self.advance();

        let mut directive = PayloadDirective::new(name).at_line(line);
        // Comments between the name and the terminator follow the directive
        let mut trailing = Vec::new();

        loop {
            match self.peek().cloned() {
                Some(Token::Word(arg)) | Some(Token::Quoted(arg)) => {
                    self.advance();
                    directive.args.push(arg);
                }
                Some(Token::Comment(text)) => {
                    let line = self.current_line();
                    self.advance();
                    if self.options.comments {
                        trailing.push(PayloadDirective::comment(text).at_line(line));
                    }
                }
                Some(Token::Semicolon) => {
                    self.advance();
                    break;
                }
                Some(Token::BlockOpen) => {
                    self.advance();
                    directive.block = Some(self.parse_block(true)?);
                    break;
                }
                Some(_) => return Err(self.unexpected()),
                None => return Err(self.eof_error("\";\" or \"{\"")),
            }
        }

        if directive.directive == "if" {
            strip_condition_parens(&mut directive.args);
        }

        block.push(directive);
        block.extend(trailing);
        Ok(())
    }

    // ========================================
    // Helpers
    // ========================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.value)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.value.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn current_span(&self) -> Location {
        self.tokens
            .get(self.pos)
            .map(|s| s.span)
            .unwrap_or(Location {
                start: self.source_len,
                end: self.source_len,
            })
    }

    fn current_line(&self) -> usize {
        self.lines.line(self.current_span().start)
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.peek().map(ToString::to_string).unwrap_or_default(),
            line: self.current_line(),
            span: self.current_span(),
        }
    }

    fn eof_error(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedEof {
            expected: expected.to_string(),
            line: self.lines.line(self.source_len),
            span: self.current_span(),
        }
    }
}

/// `if ($a = b)` arrives as `($a`, `=`, `b)`; keep only the condition
fn strip_condition_parens(args: &mut Vec<String>) {
    if let Some(first) = args.first_mut() {
        if let Some(rest) = first.strip_prefix('(') {
            *first = rest.to_string();
        }
    }
    if let Some(last) = args.last_mut() {
        if let Some(rest) = last.strip_suffix(')') {
            *last = rest.to_string();
        }
    }
    if args.last().is_some_and(String::is_empty) {
        args.pop();
    }
    if args.first().is_some_and(String::is_empty) {
        args.remove(0);
    }
}

/// Parse configuration text into top-level payload directives.
///
/// `include` directives are never followed here; see [`crate::parse`].
pub fn parse_str(source: &str, options: &ParseOptions) -> ParseResult<Vec<PayloadDirective>> {
    let mut parser = Parser::new(source, options)?;
    parser.parse()
}
