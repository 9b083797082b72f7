// Author: Dustin Pilgrim
// License: MIT

use std::str::Chars;
use std::sync::Arc;

use crate::ast::Span;
use crate::YiniError;

mod scanner;
mod tokenizer;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- literals ---
    Ident(String),
    String(String),
    /// Raw digits; a `.` inside marks a float.
    Number(String),
    Bool(bool),

    // --- structure ---
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Comma,
    Dot,
    Assign,
    PlusAssign,

    // --- arithmetic ---
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // --- references and markers ---
    At,
    Dollar,
    Hash,
    Bang,
    Question,
    Tilde,

    Eof,
}

impl Token {
    /// Source-like rendering used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Number(n) => format!("number {}", n),
            Token::Bool(b) => format!("boolean {}", b),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Colon => "':'".into(),
            Token::Comma => "','".into(),
            Token::Dot => "'.'".into(),
            Token::Assign => "'='".into(),
            Token::PlusAssign => "'+='".into(),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Percent => "'%'".into(),
            Token::At => "'@'".into(),
            Token::Dollar => "'$'".into(),
            Token::Hash => "'#'".into(),
            Token::Bang => "'!'".into(),
            Token::Question => "'?'".into(),
            Token::Tilde => "'~'".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

/// A token with its position: 1-based line/column plus the byte range it
/// covers in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
}

pub struct Lexer<'a> {
    input: Chars<'a>,
    peek: Option<char>,
    file: Option<Arc<str>>,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer {
            input: input.chars(),
            peek: None,
            file: None,
            offset: 0,
            line: 1,
            column: 1,
        };
        lexer.peek = lexer.input.next();
        lexer
    }

    /// Stamps `file` into the spans of any lex error.
    pub fn with_file(mut self, file: Option<Arc<str>>) -> Self {
        self.file = file;
        self
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn span(&self) -> Span {
        Span::new(self.file.clone(), self.line, self.column)
    }

    pub fn next_token(&mut self) -> Result<Spanned, YiniError> {
        tokenizer::next_token(self)
    }

    /// Lexes the whole input. The last token is always `Token::Eof`; the
    /// first bad character aborts with a `LexError`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, YiniError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests;
