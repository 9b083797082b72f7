use super::*;
use crate::ast::Section;

pub(super) fn parse_document(parser: &mut Parser) -> Result<Document, YiniError> {
    let mut doc = Document::new();

    loop {
        match parser.peek() {
            Token::Eof => break,
            Token::LBracket => parse_section(parser, &mut doc)?,
            _ => {
                return Err(parser.error(
                    "Unexpected token at top level",
                    Some("All properties must belong to a [Section]"),
                    205,
                ));
            }
        }
    }

    Ok(doc)
}

fn parse_section(parser: &mut Parser, doc: &mut Document) -> Result<(), YiniError> {
    parser.expect(Token::LBracket, "Expected '[' to start a section")?;

    if parser.check(&Token::Hash) {
        return parse_special_section(parser, doc);
    }

    let (name, span) = parser.expect_ident("Expected section name")?;
    parser.expect(Token::RBracket, "Expected ']' after section name")?;

    let mut section = Section::new(name);
    section.span = span;

    if parser.eat(&Token::Colon) {
        loop {
            let (parent, _) = parser.expect_ident("Expected parent section name")?;
            section.parents.push(parent);
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
    }

    let schema = parser.schema_mode;
    parse_body(parser, &mut section, schema)?;

    if schema {
        doc.insert_schema(section);
    } else {
        doc.insert_section(section);
    }
    Ok(())
}

fn parse_special_section(parser: &mut Parser, doc: &mut Document) -> Result<(), YiniError> {
    let span = parser.span();
    parser.bump(); // '#'
    let (kind, _) = parser.expect_ident("Expected identifier after '#'")?;
    parser.expect(Token::RBracket, "Expected ']' after special section name")?;

    match kind.as_str() {
        "schema" | "end_schema" => {
            if !matches!(parser.peek(), Token::LBracket | Token::Eof) {
                return Err(parser.error(
                    &format!("[#{}] is a marker and takes no body", kind),
                    None,
                    206,
                ));
            }
            parser.schema_mode = kind == "schema";
            Ok(())
        }
        "define" | "include" => {
            let mut section = Section::new(format!("#{}", kind));
            section.span = span;
            parse_body(parser, &mut section, false)?;
            doc.insert_section(section);
            Ok(())
        }
        other => Err(YiniError::ParseError {
            message: format!("Unknown special section '#{}'", other),
            found: format!("identifier '{}'", other),
            span,
            hint: Some("Use [#define], [#include], [#schema] or [#end_schema]".into()),
            code: Some(206),
        }),
    }
}

fn parse_body(parser: &mut Parser, section: &mut Section, schema: bool) -> Result<(), YiniError> {
    loop {
        match parser.peek() {
            Token::LBracket | Token::Eof => return Ok(()),
            Token::PlusAssign => {
                parser.bump();
                let value = parser.parse_expression()?;
                section.registry.push(value);
            }
            Token::Ident(_) => {
                let (key, span) = parser.expect_ident("Expected property key")?;
                parser.expect(Token::Assign, "Expected '=' after property key")?;
                let value = if schema {
                    schema::parse_schema_value(parser)?
                } else {
                    parser.parse_expression()?
                };
                section.key_spans.insert(key.clone(), span);
                section.properties.insert(key, value);
            }
            _ => {
                return Err(parser.error("Expected a property key or '+='", None, 207));
            }
        }
    }
}
