// Author: Dustin Pilgrim
// License: MIT

use super::*;
use crate::ast::{Reference, ReferenceKind, ValueKind};

/// `@name` (macro) or `@{Section.Key}` (cross-section).
pub(super) fn parse_at_reference(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // @

    if parser.eat(&Token::LBrace) {
        let (section, _) = parser.expect_ident("Expected section name in @{Section.Key}")?;
        parser.expect(Token::Dot, "Expected '.' between section and key")?;
        let (key, _) = parser.expect_ident("Expected key name in @{Section.Key}")?;
        parser.expect(Token::RBrace, "Expected '}' to close reference")?;
        let target = format!("{}.{}", section, key);
        return Ok(reference(ReferenceKind::CrossSection, target, span));
    }

    let (name, _) = parser.expect_ident("Expected macro name after '@'")?;
    Ok(reference(ReferenceKind::Macro, name, span))
}

/// `${NAME}`
pub(super) fn parse_env_reference(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // $
    parser.expect(Token::LBrace, "Expected '{' after '$'")?;
    let (name, _) = parser.expect_ident("Expected environment variable name")?;
    parser.expect(Token::RBrace, "Expected '}' to close environment reference")?;
    Ok(reference(ReferenceKind::Environment, name, span))
}

/// `%{some.key}`
pub(super) fn parse_localization_reference(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // %
    parser.expect(Token::LBrace, "Expected '{' after '%'")?;
    let (mut key, _) = parser.expect_ident("Expected localization key")?;
    while parser.eat(&Token::Dot) {
        let (seg, _) = parser.expect_ident("Expected identifier after '.'")?;
        key.push('.');
        key.push_str(&seg);
    }
    parser.expect(Token::RBrace, "Expected '}' to close localization reference")?;
    Ok(reference(ReferenceKind::Localization, key, span))
}

fn reference(kind: ReferenceKind, target: String, span: Span) -> Value {
    Value::new(ValueKind::Reference(Reference::new(kind, target)), span)
}
