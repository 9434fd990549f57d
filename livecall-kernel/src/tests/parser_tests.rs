use crate::ast::*;
use crate::parse_source;

fn single_expr(source: &str) -> Expr {
    let mut program = parse_source(source).unwrap();
    assert_eq!(program.len(), 1);
    match program.remove(0) {
        Stmt::Expr(expr) => expr,
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_parse_literal() {
    assert!(matches!(
        single_expr("42"),
        Expr::Literal(Literal::Int(42), _)
    ));
    assert!(matches!(
        single_expr("-2.5"),
        Expr::Literal(Literal::Float(f), _) if f == -2.5
    ));
}

#[test]
fn test_precedence() {
    // 1 + (2 * 3)
    let Expr::BinOp(lhs, BinOp::Add, rhs, _) = single_expr("1 + 2 * 3") else {
        panic!("expected addition at the root");
    };
    assert!(matches!(*lhs, Expr::Literal(Literal::Int(1), _)));
    assert!(matches!(*rhs, Expr::BinOp(_, BinOp::Mul, _, _)));
}

#[test]
fn test_left_associativity() {
    // (10 - 4) - 3
    let Expr::BinOp(lhs, BinOp::Sub, rhs, _) = single_expr("10 - 4 - 3") else {
        panic!("expected subtraction at the root");
    };
    assert!(matches!(*lhs, Expr::BinOp(_, BinOp::Sub, _, _)));
    assert!(matches!(*rhs, Expr::Literal(Literal::Int(3), _)));
}

#[test]
fn test_logical_binds_loosest() {
    let expr = single_expr("a < 1 || b == 2 && !c");
    let Expr::BinOp(_, BinOp::Or, rhs, _) = expr else {
        panic!("expected || at the root");
    };
    assert!(matches!(*rhs, Expr::BinOp(_, BinOp::And, _, _)));
}

#[test]
fn test_parens_override_precedence() {
    assert!(matches!(
        single_expr("(1 + 2) * 3"),
        Expr::BinOp(_, BinOp::Mul, _, _)
    ));
}

#[test]
fn test_calls_and_arrays() {
    let Expr::Call(name, args, span) = single_expr(r#"mime("text/html", [1, 2,
        3])"#) else {
        panic!("expected a call");
    };
    assert_eq!(name, "mime");
    assert_eq!(args.len(), 2);
    assert!(matches!(&args[1], Expr::Array(items, _) if items.len() == 3));
    assert_eq!(span.start, 0);
}

#[test]
fn test_statements_and_assignment() {
    let program = parse_source("x = 1; y = x + 1\n\n# done\ny").unwrap();
    assert_eq!(program.len(), 3);
    assert!(matches!(&program[0], Stmt::Assign(name, _, _) if name == "x"));
    assert!(matches!(&program[1], Stmt::Assign(name, _, _) if name == "y"));
    assert!(matches!(&program[2], Stmt::Expr(Expr::Var(name, _)) if name == "y"));
}

#[test]
fn test_empty_program() {
    assert!(parse_source("").unwrap().is_empty());
    assert!(parse_source("\n  # only a comment\n;").unwrap().is_empty());
}

#[test]
fn test_operator_continues_on_next_line() {
    assert!(matches!(
        single_expr("1 +\n 2"),
        Expr::BinOp(_, BinOp::Add, _, _)
    ));
}

#[test]
fn test_parse_errors_carry_spans() {
    let err = parse_source("1 +").unwrap_err();
    assert!(matches!(
        err,
        crate::KernelError::ParserError { span, .. } if span.start == 3
    ));

    let err = parse_source("1 2").unwrap_err();
    assert!(matches!(
        err,
        crate::KernelError::ParserError { span, ref message } if span.start == 2 && message.contains("after statement")
    ));

    assert!(parse_source("f(1, 2").is_err());
    assert!(parse_source("[1 2]").is_err());
}
