//! # livecall kernel
//!
//! A small expression language that plugs into the runtime bridge as its
//! foreign runtime, so notebooks work end to end without an external
//! interpreter.
//!
//! - Statements separated by newlines or `;`, the last one is the result
//! - Integers, floats, strings, booleans, `nothing` and arrays
//! - Display constructors: `md`, `html`, `svg`, `latex`, `mime`
//! - A display helper script that picks MIME representations
//!
//! ## Example
//!
//! ```ignore
//! total = sum(range(1, 10))
//! md("**Total:** " ++ str(total))
//! ```

pub mod ast;
pub mod display;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

#[cfg(test)]
mod tests;

pub use ast::{BinOp, Expr, Literal, Program, Stmt, UnOp};
pub use display::DisplayHelper;
pub use error::{ErrorContext, KernelError, Result, Span};
pub use interpreter::Kernel;
pub use lexer::{tokenize, SpannedToken, Token};
pub use parser::{parse, Parser};
pub use value::Value;

use livecall_runtime::{
    Bridge, BridgeResult, ForeignRuntime, HostRuntime, MimePayload, MimeType, RuntimeConfig,
};
use std::sync::Arc;

impl ForeignRuntime for Kernel {
    type Value = Value;
    type Error = KernelError;

    const NAME: &'static str = "livecall-kernel";
    const HELPER_SCRIPT: &'static str = include_str!("../helper/display.lc");

    fn evaluate(&mut self, source: &str) -> Result<Value> {
        self.eval_source(source)
    }

    fn load_helper(&mut self, script: &str) -> Result<()> {
        Kernel::load_helper(self, script)
    }

    fn best_mime(&mut self, value: &Value) -> Result<MimePayload> {
        self.helper()?.best(value)
    }

    fn render_mime(&mut self, mime: &MimeType, value: &Value) -> Result<MimePayload> {
        self.helper()?.render(mime, value)
    }
}

/// Bridge to a kernel on `host`, created on first use
pub fn kernel_bridge(host: Arc<HostRuntime>, config: RuntimeConfig) -> Bridge<Kernel> {
    Bridge::new(host, config, Kernel::from_config)
}

/// Bridge to a kernel on the process-wide host runtime
pub fn global_kernel_bridge(config: RuntimeConfig) -> BridgeResult<Bridge<Kernel>> {
    Bridge::on_global_host(config, Kernel::from_config)
}

/// Parse kernel source into a program
pub fn parse_source(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    parse(&tokens)
}
