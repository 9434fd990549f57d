//! Kernel values

use std::fmt;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),

    /// Markdown source built with `md(...)`
    Markdown(String),

    /// Raw HTML built with `html(...)`
    Html(String),

    /// SVG document built with `svg(...)`
    Svg(String),

    /// LaTeX formula built with `latex(...)`
    Latex(String),

    /// Content tagged with an explicit MIME type by `mime(type, content)`
    Tagged { mime: String, content: String },
}

impl Value {
    /// Type name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nothing => "Nothing",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int64",
            Value::Float(_) => "Float64",
            Value::String(_) => "String",
            Value::Array(_) => "Vector",
            Value::Markdown(_) => "Markdown",
            Value::Html(_) => "HTML",
            Value::Svg(_) => "SVG",
            Value::Latex(_) => "LaTeXString",
            Value::Tagged { .. } => "MIME",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text content of text-like values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(s)
            | Value::Markdown(s)
            | Value::Html(s)
            | Value::Svg(s)
            | Value::Latex(s) => Some(s),
            Value::Tagged { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Plain string conversion used by `str(...)` and `++`
    pub fn to_plain_string(&self, float_digits: Option<usize>) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.repr(float_digits),
        }
    }

    /// REPL-style representation (strings quoted)
    pub fn repr(&self, float_digits: Option<usize>) -> String {
        match self {
            Value::Nothing => "nothing".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f, float_digits),
            Value::String(s) => format!("{:?}", s),
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(|v| v.repr(float_digits)).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Markdown(s)
            | Value::Html(s)
            | Value::Svg(s)
            | Value::Latex(s) => s.clone(),
            Value::Tagged { content, .. } => content.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr(None))
    }
}

/// Format a float, optionally rounded to `digits` decimal places.
///
/// Trailing zeros are dropped but an integral float keeps one decimal
/// (`2.0`, not `2`).
pub fn format_float(value: f64, digits: Option<usize>) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }

    let mut text = match digits {
        Some(digits) => format!("{:.*}", digits, value),
        None => format!("{}", value),
    };
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.push('0');
        }
    } else if !text.contains('e') {
        text.push_str(".0");
    }
    if digits.is_some() && text == "-0.0" {
        text = "0.0".to_string();
    }
    text
}
