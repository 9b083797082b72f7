use super::*;
use super::scanner::{bump, peek_next, skip_whitespace_and_comments};

pub(super) fn next_token(lexer: &mut Lexer) -> Result<Spanned, YiniError> {
    skip_whitespace_and_comments(lexer)?;

    let line = lexer.line;
    let column = lexer.column;
    let start = lexer.offset;

    let token = match lexer.peek {
        Some('[') => tokenize_symbol(lexer, Token::LBracket),
        Some(']') => tokenize_symbol(lexer, Token::RBracket),
        Some('{') => tokenize_symbol(lexer, Token::LBrace),
        Some('}') => tokenize_symbol(lexer, Token::RBrace),
        Some('(') => tokenize_symbol(lexer, Token::LParen),
        Some(')') => tokenize_symbol(lexer, Token::RParen),
        Some(':') => tokenize_symbol(lexer, Token::Colon),
        Some(',') => tokenize_symbol(lexer, Token::Comma),
        Some('.') => tokenize_symbol(lexer, Token::Dot),
        Some('=') => tokenize_symbol(lexer, Token::Assign),
        Some('+') => tokenize_plus(lexer),
        Some('-') => tokenize_symbol(lexer, Token::Minus),
        Some('*') => tokenize_symbol(lexer, Token::Star),
        Some('/') => tokenize_symbol(lexer, Token::Slash),
        Some('%') => tokenize_symbol(lexer, Token::Percent),
        Some('@') => tokenize_symbol(lexer, Token::At),
        Some('$') => tokenize_symbol(lexer, Token::Dollar),
        Some('#') => tokenize_symbol(lexer, Token::Hash),
        Some('!') => tokenize_symbol(lexer, Token::Bang),
        Some('?') => tokenize_symbol(lexer, Token::Question),
        Some('~') => tokenize_symbol(lexer, Token::Tilde),
        Some('"') => tokenize_string(lexer)?,
        Some(c) if c.is_ascii_digit() => tokenize_number(lexer),
        Some(c) if c.is_alphabetic() || c == '_' => tokenize_identifier_or_keyword(lexer),
        Some(ch) => return Err(unexpected_char(lexer, ch)),
        None => Token::Eof,
    };

    Ok(Spanned {
        token,
        line,
        column,
        start,
        end: lexer.offset,
    })
}

fn tokenize_symbol(lexer: &mut Lexer, token: Token) -> Token {
    bump(lexer);
    token
}

fn tokenize_plus(lexer: &mut Lexer) -> Token {
    bump(lexer);
    if lexer.peek == Some('=') {
        bump(lexer);
        Token::PlusAssign
    } else {
        Token::Plus
    }
}

fn tokenize_string(lexer: &mut Lexer) -> Result<Token, YiniError> {
    let start = lexer.span();
    bump(lexer); // opening quote
    let mut content = String::new();

    loop {
        match bump(lexer) {
            Some('"') => break,
            Some('\\') => match bump(lexer) {
                Some('n') => content.push('\n'),
                Some('t') => content.push('\t'),
                Some('r') => content.push('\r'),
                Some('"') => content.push('"'),
                Some('\\') => content.push('\\'),
                Some(other) => content.push(other),
                None => return Err(unclosed_string(start)),
            },
            Some(ch) => content.push(ch),
            None => return Err(unclosed_string(start)),
        }
    }

    Ok(Token::String(content))
}

fn unclosed_string(span: Span) -> YiniError {
    YiniError::LexError {
        character: '"',
        message: "Unterminated string literal".into(),
        span,
        hint: Some("Close the string with a matching quote".into()),
        code: Some(103),
    }
}

fn tokenize_number(lexer: &mut Lexer) -> Token {
    let mut num = String::new();
    let mut seen_dot = false;

    while let Some(ch) = lexer.peek {
        if ch.is_ascii_digit() {
            num.push(ch);
            bump(lexer);
        } else if ch == '.' && !seen_dot && peek_next(lexer).is_some_and(|c| c.is_ascii_digit()) {
            seen_dot = true;
            num.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }

    Token::Number(num)
}

fn tokenize_identifier_or_keyword(lexer: &mut Lexer) -> Token {
    let mut ident = String::new();

    while let Some(ch) = lexer.peek {
        if ch.is_alphanumeric() || ch == '_' {
            ident.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }

    match ident.as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        _ => Token::Ident(ident),
    }
}

fn unexpected_char(lexer: &Lexer, ch: char) -> YiniError {
    YiniError::LexError {
        character: ch,
        message: "Unexpected character".into(),
        span: lexer.span(),
        hint: None,
        code: Some(104),
    }
}
