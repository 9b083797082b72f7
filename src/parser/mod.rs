use std::sync::Arc;

use crate::ast::{Document, Span, Value};
use crate::lexer::{Lexer, Spanned, Token};
use crate::YiniError;

mod document;
mod reference;
mod schema;
mod value;

/// Deepest nesting of containers, groups and unary minus in one value.
pub const MAX_NESTING: usize = 128;

/// Recursive-descent parser over a fully lexed token stream.
///
/// Sections that follow a `[#schema]` marker are collected as schema
/// sections until `[#end_schema]` or the end of the input; schema mode
/// never leaks from one parser (one file) into another.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    file: Option<Arc<str>>,
    schema_mode: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, YiniError> {
        Self::with_file(input, None)
    }

    /// Like [`Parser::new`] but every span carries `file`.
    pub fn with_file(input: &'a str, file: Option<Arc<str>>) -> Result<Self, YiniError> {
        let tokens = Lexer::new(input).with_file(file.clone()).tokenize()?;
        Ok(Self {
            source: input,
            tokens,
            pos: 0,
            file,
            schema_mode: false,
            depth: 0,
        })
    }

    /// Parses a lone value expression such as stored Dyna text.
    pub fn parse_standalone_expression(input: &str) -> Result<Value, YiniError> {
        let mut parser = Parser::new(input)?;
        let value = parser.parse_expression()?;
        if !parser.check(&Token::Eof) {
            return Err(parser.error("Unexpected trailing input after expression", None, 204));
        }
        Ok(value)
    }

    pub fn parse_document(&mut self) -> Result<Document, YiniError> {
        document::parse_document(self)
    }

    pub fn parse_expression(&mut self) -> Result<Value, YiniError> {
        value::parse_expression(self)
    }

    pub(crate) fn current(&self) -> &Spanned {
        // The stream always ends in Eof and `bump` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.current().token
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    /// True when the token `offset` ahead starts exactly where the one
    /// before it ends, with no whitespace or comment between.
    pub(crate) fn is_adjacent(&self, offset: usize) -> bool {
        let idx = self.pos + offset;
        if idx == 0 || idx >= self.tokens.len() {
            return false;
        }
        self.tokens[idx].start == self.tokens[idx - 1].end
    }

    pub(crate) fn bump(&mut self) -> Spanned {
        let tok = self.current().clone();
        if tok.token != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, expected: &Token) -> bool {
        self.peek() == expected
    }

    pub(crate) fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, expected: Token, message: &str) -> Result<Spanned, YiniError> {
        if self.check(&expected) {
            Ok(self.bump())
        } else {
            Err(self.error(message, None, 202))
        }
    }

    pub(crate) fn expect_ident(&mut self, message: &str) -> Result<(String, Span), YiniError> {
        if let Token::Ident(name) = self.peek() {
            let name = name.clone();
            let span = self.span();
            self.bump();
            Ok((name, span))
        } else {
            Err(self.error(message, None, 203))
        }
    }

    /// Runs `f` one nesting level deeper, failing past [`MAX_NESTING`].
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, YiniError>,
    ) -> Result<T, YiniError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(
                &format!("Value nested deeper than {} levels", MAX_NESTING),
                Some("Flatten the value or split it over several keys"),
                217,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn span(&self) -> Span {
        self.span_of(self.current())
    }

    pub(crate) fn span_of(&self, tok: &Spanned) -> Span {
        Span::new(self.file.clone(), tok.line, tok.column)
    }

    /// Byte offset where the previously consumed token ends.
    pub(crate) fn last_end(&self) -> usize {
        if self.pos == 0 { 0 } else { self.tokens[self.pos - 1].end }
    }

    pub(crate) fn source_slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    pub(crate) fn error(&self, message: &str, hint: Option<&str>, code: u32) -> YiniError {
        YiniError::ParseError {
            message: message.to_string(),
            found: self.peek().describe(),
            span: self.span(),
            hint: hint.map(str::to_string),
            code: Some(code),
        }
    }
}

#[cfg(test)]
mod tests;
