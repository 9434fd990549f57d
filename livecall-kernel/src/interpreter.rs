//! Tree-walking interpreter and the kernel's global namespace

use crate::ast::{BinOp, Expr, Literal, Program, Stmt, UnOp};
use crate::display::{DisplayHelper, FLOAT_DIGITS_GLOBAL};
use crate::error::{KernelError, Result, Span};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::value::Value;
use livecall_runtime::RuntimeConfig;
use std::collections::HashMap;

/// Longest array `range()` will build
pub const MAX_RANGE_LEN: usize = 10_000_000;

/// The built-in kernel: a global namespace plus an optional display helper
pub struct Kernel {
    globals: HashMap<String, Value>,
    helper: Option<DisplayHelper>,
    parallelism_env: String,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            helper: None,
            parallelism_env: RuntimeConfig::default().parallelism_env,
        }
    }

    /// Kernel reading its parallelism hint from the configured variable
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        Ok(Self {
            parallelism_env: config.parallelism_env.clone(),
            ..Self::new()
        })
    }

    /// Environment variable `threads()` reads
    pub fn parallelism_env(&self) -> &str {
        &self.parallelism_env
    }

    /// Parse and run `source` in the global namespace.
    ///
    /// Returns the value of the last statement, or `nothing` for an empty
    /// program.
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let tokens = tokenize(source)?;
        let program = parse(&tokens)?;
        self.run(&program)
    }

    pub fn run(&mut self, program: &Program) -> Result<Value> {
        let mut last = Value::Nothing;
        for stmt in program {
            last = self.exec_stmt(stmt)?;
        }
        Ok(last)
    }

    /// Execute a statement, yielding its value
    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Value> {
        match stmt {
            Stmt::Assign(name, expr, _) => {
                let value = self.eval(expr)?;
                self.globals.insert(name.clone(), value.clone());
                Ok(value)
            }
            Stmt::Expr(expr) => self.eval(expr),
        }
    }

    /// Evaluate an expression
    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit, _) => Ok(match lit {
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Nothing => Value::Nothing,
            }),

            Expr::Var(name, span) => {
                self.globals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| KernelError::UndefinedVariable {
                        span: *span,
                        name: name.clone(),
                    })
            }

            Expr::Array(items, _) => {
                let values: Result<Vec<_>> = items.iter().map(|e| self.eval(e)).collect();
                Ok(Value::Array(values?))
            }

            Expr::BinOp(lhs, op @ (BinOp::And | BinOp::Or), rhs, _) => {
                let lhs_val = self.eval(lhs)?.is_truthy();
                let short_circuit = match op {
                    BinOp::And => !lhs_val,
                    _ => lhs_val,
                };
                if short_circuit {
                    return Ok(Value::Bool(lhs_val));
                }
                Ok(Value::Bool(self.eval(rhs)?.is_truthy()))
            }

            Expr::BinOp(lhs, op, rhs, span) => {
                let lhs_val = self.eval(lhs)?;
                let rhs_val = self.eval(rhs)?;
                self.eval_binop(lhs_val, *op, rhs_val, *span)
            }

            Expr::UnOp(op, operand, span) => {
                let val = self.eval(operand)?;
                eval_unop(*op, val, *span)
            }

            Expr::Call(name, args, span) => {
                let arg_vals: Result<Vec<_>> = args.iter().map(|e| self.eval(e)).collect();
                self.eval_call(name, arg_vals?, *span)
            }
        }
    }

    /// Evaluate a binary operation
    fn eval_binop(&self, lhs: Value, op: BinOp, rhs: Value, span: Span) -> Result<Value> {
        let invalid = |lhs: &Value, rhs: &Value| KernelError::TypeMismatch {
            span,
            message: format!(
                "no method matching {}(::{}, ::{})",
                op.symbol(),
                lhs.kind(),
                rhs.kind()
            ),
        };

        match op {
            BinOp::Add => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (a, b) => float_op(&a, &b, |x, y| x + y).ok_or_else(|| invalid(&a, &b)),
            },

            BinOp::Sub => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(b))),
                (a, b) => float_op(&a, &b, |x, y| x - y).ok_or_else(|| invalid(&a, &b)),
            },

            BinOp::Mul => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(b))),
                (a, b) => float_op(&a, &b, |x, y| x * y).ok_or_else(|| invalid(&a, &b)),
            },

            BinOp::Div => match (lhs, rhs) {
                (Value::Int(_), Value::Int(0)) => Err(KernelError::DivisionByZero { span }),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(b))),
                (a, b) => float_op(&a, &b, |x, y| x / y).ok_or_else(|| invalid(&a, &b)),
            },

            BinOp::Rem => match (lhs, rhs) {
                (Value::Int(_), Value::Int(0)) => Err(KernelError::DivisionByZero { span }),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(b))),
                (a, b) => float_op(&a, &b, |x, y| x % y).ok_or_else(|| invalid(&a, &b)),
            },

            BinOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
            BinOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),

            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let ordering = match (&lhs, &rhs) {
                    (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    (a, b) => match (a.as_f64(), b.as_f64()) {
                        (Some(x), Some(y)) => x.partial_cmp(&y),
                        _ => return Err(invalid(a, b)),
                    },
                };
                // NaN compares false both ways.
                let Some(ordering) = ordering else {
                    return Ok(Value::Bool(false));
                };
                Ok(Value::Bool(match op {
                    BinOp::Lt => ordering.is_lt(),
                    BinOp::Le => ordering.is_le(),
                    BinOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }

            BinOp::Concat => Ok(Value::String(
                self.plain_string(&lhs) + &self.plain_string(&rhs),
            )),

            BinOp::And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
            BinOp::Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
        }
    }

    /// Evaluate a builtin call
    fn eval_call(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value> {
        let arity = |expected: usize| -> Result<()> {
            if args.len() == expected {
                Ok(())
            } else {
                Err(KernelError::ArityMismatch {
                    span,
                    function: name.to_string(),
                    expected,
                    got: args.len(),
                })
            }
        };

        match name {
            "md" | "html" | "svg" | "latex" => {
                arity(1)?;
                let text = self.plain_string(&args[0]);
                Ok(match name {
                    "md" => Value::Markdown(text),
                    "html" => Value::Html(text),
                    "svg" => Value::Svg(text),
                    _ => Value::Latex(text),
                })
            }

            "mime" => {
                arity(2)?;
                let Value::String(mime) = &args[0] else {
                    return Err(KernelError::TypeMismatch {
                        span,
                        message: format!("mime() type must be a String, got {}", args[0].kind()),
                    });
                };
                Ok(Value::Tagged {
                    mime: mime.clone(),
                    content: self.plain_string(&args[1]),
                })
            }

            "str" => {
                arity(1)?;
                Ok(Value::String(self.plain_string(&args[0])))
            }

            "len" => {
                arity(1)?;
                match &args[0] {
                    Value::Array(a) => Ok(Value::Int(a.len() as i64)),
                    other => other
                        .as_text()
                        .map(|s| Value::Int(s.chars().count() as i64))
                        .ok_or_else(|| KernelError::TypeMismatch {
                            span,
                            message: format!("no method matching length(::{})", other.kind()),
                        }),
                }
            }

            "threads" => {
                arity(0)?;
                Ok(Value::Int(self.threads(span)?))
            }

            "sum" => {
                arity(1)?;
                let Value::Array(items) = &args[0] else {
                    return Err(KernelError::TypeMismatch {
                        span,
                        message: format!("sum() requires a Vector, got {}", args[0].kind()),
                    });
                };
                items.iter().try_fold(Value::Int(0), |acc, item| {
                    self.eval_binop(acc, BinOp::Add, item.clone(), span)
                })
            }

            "range" => {
                arity(2)?;
                match (&args[0], &args[1]) {
                    (Value::Int(a), Value::Int(b)) => {
                        let len = (*b as i128 - *a as i128 + 1).max(0);
                        if len > MAX_RANGE_LEN as i128 {
                            return Err(KernelError::RangeTooLarge {
                                span,
                                len,
                                max: MAX_RANGE_LEN,
                            });
                        }
                        Ok(Value::Array((*a..=*b).map(Value::Int).collect()))
                    }
                    (a, b) => Err(KernelError::TypeMismatch {
                        span,
                        message: format!("range() requires Int64 bounds, got {} and {}", a.kind(), b.kind()),
                    }),
                }
            }

            _ => Err(KernelError::UnknownFunction {
                span,
                name: name.to_string(),
            }),
        }
    }

    /// Parallelism hint from the environment; `auto` means all cores
    fn threads(&self, span: Span) -> Result<i64> {
        let hint = std::env::var(&self.parallelism_env).unwrap_or_else(|_| "auto".to_string());
        if hint.trim() == "auto" {
            return Ok(std::thread::available_parallelism()
                .map(|n| n.get() as i64)
                .unwrap_or(1));
        }
        hint.trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| KernelError::TypeMismatch {
                span,
                message: format!("{}={:?} is not a thread count", self.parallelism_env, hint),
            })
    }

    fn plain_string(&self, value: &Value) -> String {
        value.to_plain_string(self.helper.and_then(|h| h.float_digits))
    }

    /// Run the helper script and arm the display entry points
    pub fn load_helper(&mut self, script: &str) -> Result<()> {
        self.eval_source(script)?;

        let float_digits = match self.globals.get(FLOAT_DIGITS_GLOBAL) {
            None | Some(Value::Nothing) => None,
            Some(Value::Int(n)) if *n >= 0 => Some(*n as usize),
            Some(other) => {
                return Err(KernelError::TypeMismatch {
                    span: Span::default(),
                    message: format!(
                        "{} must be a non-negative Int64, got {}",
                        FLOAT_DIGITS_GLOBAL,
                        other.repr(None)
                    ),
                })
            }
        };

        self.helper = Some(DisplayHelper { float_digits });
        Ok(())
    }

    pub fn helper(&self) -> Result<&DisplayHelper> {
        self.helper.as_ref().ok_or(KernelError::HelperNotLoaded)
    }

    /// Get a global variable value
    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Set a global variable value
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Clear all global variables
    pub fn clear_globals(&mut self) {
        self.globals.clear();
    }
}

/// Evaluate a unary operation
fn eval_unop(op: UnOp, operand: Value, span: Span) -> Result<Value> {
    match op {
        UnOp::Neg => match operand {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(KernelError::TypeMismatch {
                span,
                message: format!("no method matching -(::{})", other.kind()),
            }),
        },

        UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
    }
}

/// Mixed int/float arithmetic; `None` if either side is not a number
fn float_op(lhs: &Value, rhs: &Value, op: impl Fn(f64, f64) -> f64) -> Option<Value> {
    Some(Value::Float(op(lhs.as_f64()?, rhs.as_f64()?)))
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs == rhs,
    }
}
