use crate::lexer::*;

#[test]
fn test_tokenize_keywords() {
    let tokens = tokenize("true false nothing").unwrap();
    assert_eq!(tokens[0].token, Token::True);
    assert_eq!(tokens[1].token, Token::False);
    assert_eq!(tokens[2].token, Token::Nothing);
    assert!(tokens[2].token.is_keyword());
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("foo bar_baz x1").unwrap();
    assert!(matches!(&tokens[0].token, Token::Identifier(s) if s == "foo"));
    assert!(matches!(&tokens[1].token, Token::Identifier(s) if s == "bar_baz"));
    assert!(matches!(&tokens[2].token, Token::Identifier(s) if s == "x1"));
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("0 42 3.14 1.5e3").unwrap();
    assert_eq!(tokens[0].token, Token::IntLiteral(Some(0)));
    assert_eq!(tokens[1].token, Token::IntLiteral(Some(42)));
    assert_eq!(tokens[2].token, Token::FloatLiteral(Some(3.14)));
    assert_eq!(tokens[3].token, Token::FloatLiteral(Some(1500.0)));
}

#[test]
fn test_minus_is_an_operator() {
    let tokens = tokenize("-1").unwrap();
    assert_eq!(tokens[0].token, Token::Minus);
    assert_eq!(tokens[1].token, Token::IntLiteral(Some(1)));
}

#[test]
fn test_tokenize_strings_with_escapes() {
    let tokens = tokenize(r#""hello" "a\"b\nc""#).unwrap();
    assert_eq!(tokens[0].token, Token::StringLiteral("hello".to_string()));
    assert_eq!(tokens[1].token, Token::StringLiteral("a\"b\nc".to_string()));
}

#[test]
fn test_operators() {
    let tokens = tokenize("+ - * / % == != < <= > >= && || ! ++ =").unwrap();
    let expected = [
        Token::Plus,
        Token::Minus,
        Token::Star,
        Token::Slash,
        Token::Percent,
        Token::EqEq,
        Token::NotEq,
        Token::Lt,
        Token::Le,
        Token::Gt,
        Token::Ge,
        Token::AndAnd,
        Token::OrOr,
        Token::Bang,
        Token::PlusPlus,
        Token::Eq,
    ];
    for (token, expected) in tokens.iter().zip(expected.iter()) {
        assert_eq!(&token.token, expected);
    }
}

#[test]
fn test_comments_and_separators() {
    let tokens = tokenize("x = 1 # set x\ny; z").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.token.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            Token::Identifier("x".to_string()),
            Token::Eq,
            Token::IntLiteral(Some(1)),
            Token::Newline,
            Token::Identifier("y".to_string()),
            Token::Semicolon,
            Token::Identifier("z".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_spans_are_byte_offsets() {
    let tokens = tokenize("ab + 12").unwrap();
    assert_eq!(tokens[0].span, crate::Span::new(0, 2));
    assert_eq!(tokens[2].span, crate::Span::new(5, 7));
    assert_eq!(tokens[3].span, crate::Span::new(7, 7));
}

#[test]
fn test_invalid_token() {
    let err = tokenize("x = @").unwrap_err();
    assert!(matches!(
        err,
        crate::KernelError::LexerError { span, .. } if span == crate::Span::new(4, 5)
    ));
}

#[test]
fn test_integer_overflow_is_a_lexer_error() {
    assert!(tokenize("99999999999999999999").is_err());
}
