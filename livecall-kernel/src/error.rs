use livecall_runtime::BridgeError;
use std::fmt;

/// Byte range in kernel source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Errors raised by the built-in kernel
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("Lexer error at {span:?}: {message}")]
    LexerError { span: Span, message: String },

    #[error("Parser error at {span:?}: {message}")]
    ParserError { span: Span, message: String },

    #[error("UndefVarError: `{name}` not defined")]
    UndefinedVariable { span: Span, name: String },

    #[error("MethodError: {message}")]
    TypeMismatch { span: Span, message: String },

    #[error("DivideError: integer division by zero")]
    DivisionByZero { span: Span },

    #[error("`{function}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        span: Span,
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Unknown function `{name}`")]
    UnknownFunction { span: Span, name: String },

    #[error("ArgumentError: range of {len} elements exceeds the limit of {max}")]
    RangeTooLarge { span: Span, len: i128, max: usize },

    #[error("Display helper is not loaded")]
    HelperNotLoaded,

    #[error("Cannot render a {kind} value as {mime}")]
    UnsupportedMime { mime: String, kind: &'static str },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, KernelError>;

impl KernelError {
    /// Source span of the error, for errors raised by kernel code
    pub fn span(&self) -> Option<Span> {
        match self {
            KernelError::LexerError { span, .. }
            | KernelError::ParserError { span, .. }
            | KernelError::UndefinedVariable { span, .. }
            | KernelError::TypeMismatch { span, .. }
            | KernelError::DivisionByZero { span }
            | KernelError::ArityMismatch { span, .. }
            | KernelError::UnknownFunction { span, .. }
            | KernelError::RangeTooLarge { span, .. } => Some(*span),
            KernelError::HelperNotLoaded
            | KernelError::UnsupportedMime { .. }
            | KernelError::Bridge(_) => None,
        }
    }
}

/// Display context for better error messages
pub struct ErrorContext<'a> {
    pub source: &'a str,
    pub error: &'a KernelError,
}

impl<'a> ErrorContext<'a> {
    pub fn new(source: &'a str, error: &'a KernelError) -> Self {
        Self { source, error }
    }

    /// Get the source line containing the error
    pub fn source_line(&self) -> Option<&'a str> {
        let start = self.start()?;

        let line_start = self.source[..start]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let line_end = self.source[start..]
            .find('\n')
            .map(|pos| start + pos)
            .unwrap_or(self.source.len());

        Some(&self.source[line_start..line_end])
    }

    /// Get line and column numbers (1-indexed)
    pub fn line_col(&self) -> Option<(usize, usize)> {
        let start = self.start()?;

        let line = self.source[..start].matches('\n').count() + 1;
        let line_start = self.source[..start]
            .rfind('\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);

        Some((line, start - line_start + 1))
    }

    fn start(&self) -> Option<usize> {
        self.error
            .span()
            .map(|span| span.start.min(self.source.len()))
            .filter(|start| self.source.is_char_boundary(*start))
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some((line, col)), Some(source_line), Some(span)) =
            (self.line_col(), self.source_line(), self.error.span())
        else {
            return writeln!(f, "{}", self.error);
        };

        writeln!(f, "Error at line {}, column {}:", line, col)?;
        writeln!(f, "  {}", self.error)?;
        writeln!(f)?;
        writeln!(f, "  {}", source_line)?;
        let col_start = col - 1;
        let width = span.len().min(source_line.len().saturating_sub(col_start));
        writeln!(f, "  {}{}", " ".repeat(col_start), "^".repeat(width.max(1)))
    }
}
