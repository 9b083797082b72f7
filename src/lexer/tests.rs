#[cfg(test)]
use super::*;

fn kinds(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .expect("Failed to tokenize")
        .into_iter()
        .map(|t| t.token)
        .collect()
}

#[test]
fn test_section_with_properties() {
    let input = r#"
[Player] : Base, Actor
name = "Hero"
speed = 2.5
+= 1
"#;

    let expected_tokens = vec![
        Token::LBracket,
        Token::Ident("Player".into()),
        Token::RBracket,
        Token::Colon,
        Token::Ident("Base".into()),
        Token::Comma,
        Token::Ident("Actor".into()),
        Token::Ident("name".into()),
        Token::Assign,
        Token::String("Hero".into()),
        Token::Ident("speed".into()),
        Token::Assign,
        Token::Number("2.5".into()),
        Token::PlusAssign,
        Token::Number("1".into()),
        Token::Eof,
    ];

    assert_eq!(kinds(input), expected_tokens);
}

#[test]
fn test_all_symbols() {
    let input = "[ ] { } ( ) : , . = += + - * / % @ $ # ! ? ~";
    let expected = vec![
        Token::LBracket,
        Token::RBracket,
        Token::LBrace,
        Token::RBrace,
        Token::LParen,
        Token::RParen,
        Token::Colon,
        Token::Comma,
        Token::Dot,
        Token::Assign,
        Token::PlusAssign,
        Token::Plus,
        Token::Minus,
        Token::Star,
        Token::Slash,
        Token::Percent,
        Token::At,
        Token::Dollar,
        Token::Hash,
        Token::Bang,
        Token::Question,
        Token::Tilde,
        Token::Eof,
    ];
    assert_eq!(kinds(input), expected);
}

#[test]
fn test_comments_are_skipped() {
    let input = r#"
// line comment
a = 1 /* block
comment */ b = 2
"#;
    let expected = vec![
        Token::Ident("a".into()),
        Token::Assign,
        Token::Number("1".into()),
        Token::Ident("b".into()),
        Token::Assign,
        Token::Number("2".into()),
        Token::Eof,
    ];
    assert_eq!(kinds(input), expected);
}

#[test]
fn test_string_escapes() {
    let input = r#""a\"b\\c\nd\te\rf""#;
    assert_eq!(
        kinds(input),
        vec![Token::String("a\"b\\c\nd\te\rf".into()), Token::Eof]
    );
}

#[test]
fn test_booleans_and_identifiers() {
    assert_eq!(
        kinds("true false truthy _under score9"),
        vec![
            Token::Bool(true),
            Token::Bool(false),
            Token::Ident("truthy".into()),
            Token::Ident("_under".into()),
            Token::Ident("score9".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_number_takes_single_decimal_point() {
    assert_eq!(
        kinds("1.2.3"),
        vec![
            Token::Number("1.2".into()),
            Token::Dot,
            Token::Number("3".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_hex_color_splits_into_number_and_ident() {
    assert_eq!(
        kinds("#00FF00"),
        vec![
            Token::Hash,
            Token::Number("00".into()),
            Token::Ident("FF00".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_positions_reset_on_newline() {
    let tokens = Lexer::new("a = 1\n  bb = 2").tokenize().unwrap();
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    assert_eq!((tokens[2].line, tokens[2].column), (1, 5));
    assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
    assert_eq!((tokens[3].start, tokens[3].end), (8, 10));
}

#[test]
fn test_unexpected_character_aborts() {
    let err = Lexer::new("a = 1\nb = ^").tokenize().unwrap_err();
    match err {
        YiniError::LexError { character, span, code, .. } => {
            assert_eq!(character, '^');
            assert_eq!((span.line, span.column), (2, 5));
            assert_eq!(code, Some(104));
        }
        other => panic!("Expected LexError, got {:?}", other),
    }
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("name = \"open").tokenize().unwrap_err();
    assert!(matches!(err, YiniError::LexError { character: '"', code: Some(103), .. }));
}

#[test]
fn test_unterminated_block_comment() {
    let err = Lexer::new("a = 1 /* never closed").tokenize().unwrap_err();
    assert!(matches!(err, YiniError::LexError { code: Some(102), .. }));
}
