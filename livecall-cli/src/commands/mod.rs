//! CLI command implementations.

pub mod display;
pub mod eval;
pub mod render;
pub mod serve;

pub use display::display_value;
pub use eval::eval_source;
pub use render::render_notebook;
pub use serve::serve_notebook;

use anyhow::{Context, Result};
use livecall_kernel::{global_kernel_bridge, Kernel};
use livecall_render::Dispatcher;
use livecall_runtime::Config;
use std::fs;
use std::path::Path;

/// Dispatcher over the process-wide kernel
fn kernel_dispatcher(config: &Config) -> Result<Dispatcher<Kernel>> {
    let bridge =
        global_kernel_bridge(config.runtime.clone()).context("Failed to start the host runtime")?;
    Ok(Dispatcher::new(bridge))
}

/// Write to `output`, or stdout when no file is given
fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Wrote {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}
