//! Render command implementation.

use super::{kernel_dispatcher, write_output};
use crate::notebook::{parse_notebook, render_cells};
use anyhow::{Context, Result};
use livecall_runtime::Config;
use std::fs;
use std::path::Path;

/// Render a notebook file into an HTML page
pub fn render_notebook(config: &Config, notebook: &Path, output: Option<&Path>) -> Result<()> {
    tracing::info!("Rendering notebook {:?}", notebook);
    let markdown = fs::read_to_string(notebook)
        .with_context(|| format!("Failed to read notebook {:?}", notebook))?;

    let dispatcher = kernel_dispatcher(config)?;
    let cells = parse_notebook(&markdown);
    tracing::debug!("Parsed {} cells", cells.len());

    let page = render_cells(&dispatcher, &notebook_title(notebook), &cells);
    let html = page.render().context("Failed to render page")?;
    write_output(output, &html)
}

/// Page title derived from the notebook's file name
pub(crate) fn notebook_title(notebook: &Path) -> String {
    notebook
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string())
}
