//! Syntax tree of the kernel language

use crate::error::Span;

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Concat,
}

impl BinOp {
    /// Precedence (higher binds tighter) and associativity
    ///
    /// 1. `||`
    /// 2. `&&`
    /// 3. `==`, `!=`
    /// 4. `<`, `<=`, `>`, `>=`
    /// 5. `+`, `-`, `++`
    /// 6. `*`, `/`, `%`
    pub fn precedence(self) -> (u8, Assoc) {
        match self {
            BinOp::Or => (1, Assoc::Left),
            BinOp::And => (2, Assoc::Left),
            BinOp::Eq | BinOp::Ne => (3, Assoc::Left),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => (4, Assoc::Left),
            BinOp::Add | BinOp::Sub | BinOp::Concat => (5, Assoc::Left),
            BinOp::Mul | BinOp::Div | BinOp::Rem => (6, Assoc::Left),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Concat => "++",
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, Span),
    Var(String, Span),
    Array(Vec<Expr>, Span),
    BinOp(Box<Expr>, BinOp, Box<Expr>, Span),
    UnOp(UnOp, Box<Expr>, Span),
    Call(String, Vec<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s) => *s,
            Expr::Var(_, s) => *s,
            Expr::Array(_, s) => *s,
            Expr::BinOp(_, _, _, s) => *s,
            Expr::UnOp(_, _, s) => *s,
            Expr::Call(_, _, s) => *s,
        }
    }
}

/// Statement of a program
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`
    Assign(String, Expr, Span),

    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign(_, _, s) => *s,
            Stmt::Expr(expr) => expr.span(),
        }
    }
}

/// A parsed cell: statements run in order
pub type Program = Vec<Stmt>;
