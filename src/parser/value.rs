use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::*;
use crate::ast::{BinaryOp, Color, Coord, UnaryOp, ValueKind};

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").expect("valid hex color pattern"));

/// Expr := Term (('+'|'-') Term)*
pub(super) fn parse_expression(parser: &mut Parser) -> Result<Value, YiniError> {
    let mut left = parse_term(parser)?;

    loop {
        let op = match parser.peek() {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            _ => break,
        };
        parser.bump();
        let right = parse_term(parser)?;
        let span = left.span.clone();
        left = Value::new(ValueKind::Binary(Box::new(left), op, Box::new(right)), span);
    }

    Ok(left)
}

/// Term := Factor (('*'|'/'|'%') Factor)*
fn parse_term(parser: &mut Parser) -> Result<Value, YiniError> {
    let mut left = parse_factor(parser)?;

    loop {
        let op = match parser.peek() {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Mod,
            _ => break,
        };
        parser.bump();
        let right = parse_factor(parser)?;
        let span = left.span.clone();
        left = Value::new(ValueKind::Binary(Box::new(left), op, Box::new(right)), span);
    }

    Ok(left)
}

/// Factor := '-' Factor | Primary
///
/// Every nested value passes through here, so this is where depth is
/// counted.
fn parse_factor(parser: &mut Parser) -> Result<Value, YiniError> {
    parser.nested(|parser| {
        if parser.check(&Token::Minus) {
            let span = parser.span();
            parser.bump();
            if let Some(value) = parse_min_int(parser, &span) {
                return Ok(value);
            }
            let operand = parse_factor(parser)?;
            return Ok(Value::new(ValueKind::Unary(UnaryOp::Neg, Box::new(operand)), span));
        }
        parse_primary(parser)
    })
}

/// `-2147483648` only fits an i32 once negated, so it is read as one
/// literal instead of a negated out-of-range number.
fn parse_min_int(parser: &mut Parser, span: &Span) -> Option<Value> {
    match parser.peek() {
        Token::Number(text) if text.parse::<i32>().is_err() && format!("-{}", text).parse::<i32>().is_ok() => {
            parser.bump();
            Some(Value::new(ValueKind::Integer(i32::MIN), span.clone()))
        }
        _ => None,
    }
}

fn parse_primary(parser: &mut Parser) -> Result<Value, YiniError> {
    match parser.peek() {
        Token::Number(_) => parse_number_value(parser),
        Token::String(_) => parse_string_value(parser),
        Token::Bool(_) => parse_bool_value(parser),
        Token::LBracket => parse_array_value(parser),
        Token::LBrace => parse_map_or_struct(parser),
        Token::LParen => parse_paren_or_set(parser),
        Token::Hash => parse_hex_color(parser),
        Token::At => reference::parse_at_reference(parser),
        Token::Dollar => reference::parse_env_reference(parser),
        Token::Percent => reference::parse_localization_reference(parser),
        Token::Ident(_) => parse_identifier_value(parser),
        _ => Err(parser.error("Unexpected token in value position", None, 210)),
    }
}

fn parse_number_value(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    let text = match parser.peek() {
        Token::Number(n) => n.clone(),
        _ => unreachable!(),
    };

    let kind = if text.contains('.') {
        text.parse::<f32>().map(ValueKind::Float).ok()
    } else {
        text.parse::<i32>().map(ValueKind::Integer).ok()
    };

    match kind {
        Some(kind) => {
            parser.bump();
            Ok(Value::new(kind, span))
        }
        None => Err(parser.error(
            &format!("Number literal '{}' is out of range", text),
            Some("Integers are 32-bit signed"),
            211,
        )),
    }
}

fn parse_string_value(parser: &mut Parser) -> Result<Value, YiniError> {
    let tok = parser.bump();
    let span = parser.span_of(&tok);
    if let Token::String(s) = tok.token {
        Ok(Value::new(ValueKind::String(s), span))
    } else {
        unreachable!()
    }
}

fn parse_bool_value(parser: &mut Parser) -> Result<Value, YiniError> {
    let tok = parser.bump();
    let span = parser.span_of(&tok);
    if let Token::Bool(b) = tok.token {
        Ok(Value::new(ValueKind::Boolean(b), span))
    } else {
        unreachable!()
    }
}

/// Comma-separated expressions up to `close`; a trailing comma is allowed.
fn parse_items(parser: &mut Parser, close: Token) -> Result<Vec<Value>, YiniError> {
    let mut items = Vec::new();
    while !parser.check(&close) {
        items.push(parse_expression(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    Ok(items)
}

fn parse_array_value(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // [
    let items = parse_items(parser, Token::RBracket)?;
    parser.expect(Token::RBracket, "Expected ']' to close array")?;
    Ok(Value::new(ValueKind::Array(items), span))
}

/// `{k: v, ...}`. A trailing comma makes a Map, its absence a Struct; `{}`
/// is an empty Map.
fn parse_map_or_struct(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // {
    let mut entries = IndexMap::new();
    let mut trailing_comma = false;

    while !parser.check(&Token::RBrace) {
        let (key, _) = parser.expect_ident("Expected key in map")?;
        parser.expect(Token::Colon, "Expected ':' after map key")?;
        let value = parse_expression(parser)?;
        entries.insert(key, value);

        if parser.eat(&Token::Comma) {
            trailing_comma = parser.check(&Token::RBrace);
        } else {
            break;
        }
    }
    parser.expect(Token::RBrace, "Expected '}' to close map")?;

    let kind = if trailing_comma || entries.is_empty() {
        ValueKind::Map(entries)
    } else {
        ValueKind::Struct(entries)
    };
    Ok(Value::new(kind, span))
}

/// `()` is an empty Set, `(x)` is grouping, `(x, ...)` is a Set.
fn parse_paren_or_set(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // (

    if parser.eat(&Token::RParen) {
        return Ok(Value::new(ValueKind::Set(Vec::new()), span));
    }

    let first = parse_expression(parser)?;
    if !parser.eat(&Token::Comma) {
        parser.expect(Token::RParen, "Expected ')' to close group")?;
        return Ok(first);
    }

    let mut items = vec![first];
    items.extend(parse_items(parser, Token::RParen)?);
    parser.expect(Token::RParen, "Expected ')' to close set")?;
    Ok(Value::new(ValueKind::Set(items), span))
}

/// `#RGB` or `#RRGGBB`. The lexer may split the digits over a number and an
/// identifier token (`#00FF00`), so adjacent pieces are joined back up.
fn parse_hex_color(parser: &mut Parser) -> Result<Value, YiniError> {
    let span = parser.span();
    parser.bump(); // #

    let mut hex = String::new();
    while hex.len() < 6 {
        match parser.peek() {
            Token::Number(text) | Token::Ident(text) if parser.is_adjacent(0) => {
                hex.push_str(text);
                parser.bump();
            }
            _ => break,
        }
    }

    if !HEX_COLOR.is_match(&hex) {
        return Err(YiniError::ParseError {
            message: format!("Invalid hex color '#{}'", hex),
            found: parser.peek().describe(),
            span,
            hint: Some("Use #RGB or #RRGGBB".into()),
            code: Some(212),
        });
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
    let color = if hex.len() == 3 {
        let doubled: Vec<String> = hex.chars().map(|c| format!("{c}{c}")).collect();
        Color::rgb(channel(&doubled[0]), channel(&doubled[1]), channel(&doubled[2]))
    } else {
        Color::rgb(channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6]))
    };

    Ok(Value::new(ValueKind::Color(color), span))
}

/// A bare (possibly dotted) identifier is an unquoted string; followed by
/// `(` it is a constructor call.
fn parse_identifier_value(parser: &mut Parser) -> Result<Value, YiniError> {
    let (mut name, span) = parser.expect_ident("Expected identifier")?;

    if parser.check(&Token::LParen) {
        return parse_constructor(parser, name, span);
    }

    while parser.check(&Token::Dot) && matches!(parser.peek_at(1), Token::Ident(_) | Token::Number(_)) {
        parser.bump(); // .
        match parser.bump().token {
            Token::Ident(seg) | Token::Number(seg) => {
                name.push('.');
                name.push_str(&seg);
            }
            _ => unreachable!(),
        }
    }

    if parser.check(&Token::LParen) {
        return Err(parser.error(
            &format!("'{}' is not a constructor", name),
            Some("Constructors are Color, Coord, Path, List, Array, Set and Dyna"),
            213,
        ));
    }

    Ok(Value::new(ValueKind::String(name), span))
}

fn parse_constructor(parser: &mut Parser, name: String, span: Span) -> Result<Value, YiniError> {
    if name == "Dyna" {
        return parse_dyna(parser, span);
    }

    parser.bump(); // (
    let args = parse_items(parser, Token::RParen)?;
    parser.expect(Token::RParen, "Expected ')' to close constructor")?;

    let kind = match name.as_str() {
        "Color" => {
            if !(3..=4).contains(&args.len()) {
                return Err(arity_error(&name, "3 or 4", args.len(), span));
            }
            let mut channels = [255u8; 4];
            for (slot, arg) in channels.iter_mut().zip(&args) {
                *slot = literal_int(arg)
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| argument_error(&name, "integer channels between 0 and 255", arg))?;
            }
            ValueKind::Color(Color::rgba(channels[0], channels[1], channels[2], channels[3]))
        }
        "Coord" => {
            if !(2..=3).contains(&args.len()) {
                return Err(arity_error(&name, "2 or 3", args.len(), span));
            }
            let mut axes = Vec::with_capacity(3);
            for arg in &args {
                axes.push(literal_number(arg).ok_or_else(|| argument_error(&name, "numeric literals", arg))?);
            }
            if axes.len() == 3 {
                ValueKind::Coord(Coord::new_3d(axes[0], axes[1], axes[2]))
            } else {
                ValueKind::Coord(Coord::new_2d(axes[0], axes[1]))
            }
        }
        "Path" => {
            if args.len() != 1 {
                return Err(arity_error(&name, "1", args.len(), span));
            }
            match &args[0].kind {
                ValueKind::String(s) => ValueKind::Path(s.clone()),
                _ => return Err(argument_error(&name, "a string", &args[0])),
            }
        }
        "List" => ValueKind::List(args),
        "Array" => ValueKind::Array(args),
        "Set" => ValueKind::Set(args),
        _ => {
            return Err(YiniError::ParseError {
                message: format!("Unknown type constructor '{}'", name),
                found: format!("identifier '{}'", name),
                span,
                hint: Some("Constructors are Color, Coord, Path, List, Array, Set and Dyna".into()),
                code: Some(213),
            });
        }
    };

    Ok(Value::new(kind, span))
}

/// `Dyna(expr)` keeps the verbatim text of `expr`. The expression is parsed
/// here only so that syntax errors surface with the rest of the file.
fn parse_dyna(parser: &mut Parser, span: Span) -> Result<Value, YiniError> {
    parser.bump(); // (
    if parser.check(&Token::RParen) {
        return Err(parser.error("Dyna() needs an expression", None, 214));
    }
    let start = parser.current().start;
    parse_expression(parser)?;
    let end = parser.last_end();
    parser.expect(Token::RParen, "Expected ')' to close Dyna")?;

    let text = parser.source_slice(start, end).trim().to_string();
    Ok(Value::new(ValueKind::Dyna(text), span))
}

fn literal_int(value: &Value) -> Option<i64> {
    match &value.kind {
        ValueKind::Integer(i) => Some(*i as i64),
        ValueKind::Unary(UnaryOp::Neg, inner) => literal_int(inner).map(|v| -v),
        _ => None,
    }
}

fn literal_number(value: &Value) -> Option<f32> {
    match &value.kind {
        ValueKind::Integer(i) => Some(*i as f32),
        ValueKind::Float(f) => Some(*f),
        ValueKind::Unary(UnaryOp::Neg, inner) => literal_number(inner).map(|v| -v),
        _ => None,
    }
}

fn arity_error(name: &str, expected: &str, got: usize, span: Span) -> YiniError {
    YiniError::ParseError {
        message: format!("{}() takes {} arguments, got {}", name, expected, got),
        found: format!("{} arguments", got),
        span,
        hint: None,
        code: Some(215),
    }
}

fn argument_error(name: &str, expected: &str, arg: &Value) -> YiniError {
    YiniError::ParseError {
        message: format!("{}() expects {}", name, expected),
        found: arg.type_name().to_string(),
        span: arg.span.clone(),
        hint: None,
        code: Some(216),
    }
}
