use crate::ast::{Assoc, BinOp, Expr, Literal, Program, Stmt, UnOp};
use crate::error::{KernelError, Result, Span};
use crate::lexer::{SpannedToken, Token};

/// Parser for kernel source
pub struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [SpannedToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at current token
    fn peek(&self) -> Option<&'a SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> &'a Token {
        self.peek().map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    /// Look `n` tokens ahead
    fn nth_token(&self, n: usize) -> &'a Token {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_default()
    }

    /// Advance to next token
    fn advance(&mut self) -> Option<&'a SpannedToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if current token matches expected
    fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.peek_token()) == std::mem::discriminant(expected)
    }

    /// Expect a token, error if not found
    fn expect(&mut self, expected: Token, what: &str) -> Result<Span> {
        if self.check(&expected) {
            Ok(self.current_span_and_advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn current_span_and_advance(&mut self) -> Span {
        let span = self.current_span();
        self.advance();
        span
    }

    fn unexpected(&self, what: &str) -> KernelError {
        let message = match self.peek_token() {
            Token::Eof => format!("Expected {}, found end of input", what),
            token => format!("Expected {}, found {:?}", what, token),
        };
        KernelError::ParserError {
            span: self.current_span(),
            message,
        }
    }

    /// Check if at end of input
    fn is_eof(&self) -> bool {
        matches!(self.peek_token(), Token::Eof)
    }

    fn skip_separators(&mut self) {
        while self.peek_token().is_separator() {
            self.advance();
        }
    }

    /// Parse the entire input as a program
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        self.skip_separators();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);

            if !self.peek_token().is_separator() && !self.is_eof() {
                return Err(self.unexpected("newline or `;` after statement"));
            }
            self.skip_separators();
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        if let (Token::Identifier(name), Token::Eq) = (self.peek_token(), self.nth_token(1)) {
            let start = self.current_span();
            self.advance();
            self.advance();
            let value = self.parse_expr(0)?;
            let span = start.to(value.span());
            return Ok(Stmt::Assign(name.clone(), value, span));
        }

        Ok(Stmt::Expr(self.parse_expr(0)?))
    }

    /// Precedence climbing over binary operators
    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = binop(self.peek_token()) {
            let (prec, assoc) = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            // Operands may continue on the next line after an operator.
            self.skip_newlines();

            let next_min = match assoc {
                Assoc::Left => prec + 1,
                Assoc::Right => prec,
            };
            let rhs = self.parse_expr(next_min)?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs), span);
        }

        Ok(lhs)
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_token() {
            Token::Minus => UnOp::Neg,
            Token::Bang => UnOp::Not,
            _ => return self.parse_primary(),
        };
        let start = self.current_span_and_advance();
        let operand = self.parse_unary()?;
        let span = start.to(operand.span());

        if let (UnOp::Neg, Expr::Literal(Literal::Int(i), _)) = (op, &operand) {
            return Ok(Expr::Literal(Literal::Int(-i), span));
        }
        if let (UnOp::Neg, Expr::Literal(Literal::Float(f), _)) = (op, &operand) {
            return Ok(Expr::Literal(Literal::Float(-f), span));
        }

        Ok(Expr::UnOp(op, Box::new(operand), span))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("expression"));
        };
        let span = token.span;

        let expr = match &token.token {
            Token::IntLiteral(Some(i)) => Expr::Literal(Literal::Int(*i), span),
            Token::FloatLiteral(Some(f)) => Expr::Literal(Literal::Float(*f), span),
            Token::IntLiteral(None) | Token::FloatLiteral(None) => {
                return Err(KernelError::ParserError {
                    span,
                    message: "Invalid numeric literal".to_string(),
                });
            }
            Token::StringLiteral(s) => Expr::Literal(Literal::String(s.clone()), span),
            Token::True => Expr::Literal(Literal::Bool(true), span),
            Token::False => Expr::Literal(Literal::Bool(false), span),
            Token::Nothing => Expr::Literal(Literal::Nothing, span),
            Token::Identifier(name) => {
                if matches!(self.nth_token(1), Token::LParen) {
                    return self.parse_call(name.clone(), span);
                }
                Expr::Var(name.clone(), span)
            }
            Token::LParen => return self.parse_parens(),
            Token::LBracket => return self.parse_array(),
            _ => return Err(self.unexpected("expression")),
        };

        self.advance();
        Ok(expr)
    }

    /// Parse parenthesized expression
    fn parse_parens(&mut self) -> Result<Expr> {
        self.expect(Token::LParen, "`(`")?;
        self.skip_newlines();
        let inner = self.parse_expr(0)?;
        self.skip_newlines();
        self.expect(Token::RParen, "`)`")?;
        Ok(inner)
    }

    /// Parse `[a, b, ...]`
    fn parse_array(&mut self) -> Result<Expr> {
        let start = self.expect(Token::LBracket, "`[`")?;
        let (elements, end) = self.parse_list(Token::RBracket, "`]`")?;
        Ok(Expr::Array(elements, start.to(end)))
    }

    /// Parse `name(args...)`
    fn parse_call(&mut self, name: String, start: Span) -> Result<Expr> {
        self.advance();
        self.expect(Token::LParen, "`(`")?;
        let (args, end) = self.parse_list(Token::RParen, "`)`")?;
        Ok(Expr::Call(name, args, start.to(end)))
    }

    /// Comma-separated expressions up to `close`, returning the closing span
    fn parse_list(&mut self, close: Token, what: &str) -> Result<(Vec<Expr>, Span)> {
        let mut items = Vec::new();

        self.skip_newlines();
        while !self.check(&close) {
            items.push(self.parse_expr(0)?);
            self.skip_newlines();

            if self.check(&Token::Comma) {
                self.advance();
                self.skip_newlines();
            } else if !self.check(&close) {
                return Err(self.unexpected(&format!("`,` or {}", what)));
            }
        }

        let end = self.expect(close, what)?;
        Ok((items, end))
    }
}

fn binop(token: &Token) -> Option<BinOp> {
    match token {
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        Token::Percent => Some(BinOp::Rem),
        Token::EqEq => Some(BinOp::Eq),
        Token::NotEq => Some(BinOp::Ne),
        Token::Lt => Some(BinOp::Lt),
        Token::Le => Some(BinOp::Le),
        Token::Gt => Some(BinOp::Gt),
        Token::Ge => Some(BinOp::Ge),
        Token::AndAnd => Some(BinOp::And),
        Token::OrOr => Some(BinOp::Or),
        Token::PlusPlus => Some(BinOp::Concat),
        _ => None,
    }
}

/// Parse tokens into a program
pub fn parse(tokens: &[SpannedToken]) -> Result<Program> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}
