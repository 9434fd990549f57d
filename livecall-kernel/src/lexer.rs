use crate::error::{KernelError, Result, Span};
use logos::Logos;

/// Tokens of the kernel language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nothing")]
    Nothing,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLiteral(Option<i64>),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(Option<f64>),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    StringLiteral(String),

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("++")]
    PlusPlus,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Punctuation
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token(";")]
    Semicolon,
    #[token("\n")]
    Newline,

    // End of file
    Eof,
}

impl Token {
    pub fn is_keyword(&self) -> bool {
        matches!(self, Token::True | Token::False | Token::Nothing)
    }

    /// Whether this token ends a statement
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Newline | Token::Semicolon)
    }
}

/// Strip the quotes of a string literal and resolve its escapes
fn unescape(literal: &str) -> String {
    let body = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    pub fn new(token: Token, span: Span) -> Self {
        Self { token, span }
    }
}

/// Tokenize kernel source, ending with [`Token::Eof`]
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>> {
    let mut lex = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token_result) = lex.next() {
        let span = Span::new(lex.span().start, lex.span().end);

        match token_result {
            Ok(Token::IntLiteral(None)) => {
                return Err(KernelError::LexerError {
                    span,
                    message: format!("Integer literal out of range: {}", lex.slice()),
                });
            }
            Ok(token) => tokens.push(SpannedToken::new(token, span)),
            Err(_) => {
                return Err(KernelError::LexerError {
                    span,
                    message: format!("Invalid token: {}", lex.slice()),
                });
            }
        }
    }

    tokens.push(SpannedToken::new(
        Token::Eof,
        Span::new(source.len(), source.len()),
    ));
    Ok(tokens)
}
