//! Display command implementation.

use super::{kernel_dispatcher, write_output};
use anyhow::{Context, Result};
use livecall_render::{Displayable, HtmlPage};
use livecall_runtime::Config;
use std::path::Path;

/// Render a single value into an HTML page
pub fn display_value(
    config: &Config,
    source: &str,
    mime: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let dispatcher = kernel_dispatcher(config)?;

    let mut page = HtmlPage::new(source);
    dispatcher.display(&mut page, Displayable::source(source), mime)?;

    if page.blocks().is_empty() {
        tracing::warn!("Nothing was rendered for {:?}", source);
    }

    let html = page.render().context("Failed to render page")?;
    write_output(output, &html)
}
