use super::*;

/// Advance the character iterator and update line/column tracking
pub(super) fn bump(lexer: &mut Lexer) -> Option<char> {
    let curr = lexer.peek;
    if let Some(c) = curr {
        lexer.offset += c.len_utf8();
        if c == '\n' {
            lexer.line += 1;
            lexer.column = 1;
        } else {
            lexer.column += 1;
        }
    }
    lexer.peek = lexer.input.next();
    curr
}

/// The character after the current one, without consuming anything
pub(super) fn peek_next(lexer: &Lexer) -> Option<char> {
    lexer.input.clone().next()
}

/// Skip whitespace, `//` line comments and `/* */` block comments
pub(super) fn skip_whitespace_and_comments(lexer: &mut Lexer) -> Result<(), YiniError> {
    while let Some(c) = lexer.peek {
        match c {
            c if c.is_whitespace() => {
                bump(lexer);
            }
            '/' if peek_next(lexer) == Some('/') => {
                while let Some(ch) = lexer.peek {
                    if ch == '\n' {
                        break;
                    }
                    bump(lexer);
                }
            }
            '/' if peek_next(lexer) == Some('*') => {
                let start = lexer.span();
                bump(lexer);
                bump(lexer);
                loop {
                    match lexer.peek {
                        Some('*') if peek_next(lexer) == Some('/') => {
                            bump(lexer);
                            bump(lexer);
                            break;
                        }
                        Some(_) => {
                            bump(lexer);
                        }
                        None => {
                            return Err(YiniError::LexError {
                                character: '/',
                                message: "Unterminated block comment".into(),
                                span: start,
                                hint: Some("Close the comment with */".into()),
                                code: Some(102),
                            });
                        }
                    }
                }
            }
            _ => break,
        }
    }
    Ok(())
}
