//! Eval command implementation.

use super::kernel_dispatcher;
use anyhow::{Context, Result};
use livecall_kernel::ErrorContext;
use livecall_runtime::{Config, MimeData};

/// Evaluate source and print its plain-text representation
pub fn eval_source(config: &Config, source: &str) -> Result<()> {
    let dispatcher = kernel_dispatcher(config)?;

    let value = match dispatcher.evaluate(source) {
        Ok(value) => value,
        Err(e) if e.span().is_some() => {
            anyhow::bail!("{}", ErrorContext::new(source, &e).to_string().trim_end())
        }
        Err(e) => return Err(e.into()),
    };
    let payload = dispatcher.resolve_mime(value, Some("text/plain"))?;

    match payload.data {
        MimeData::Text(text) => println!("{}", text),
        MimeData::Bytes(bytes) => {
            let text = String::from_utf8(bytes).context("Plain-text output is not UTF-8")?;
            println!("{}", text);
        }
    }
    Ok(())
}
