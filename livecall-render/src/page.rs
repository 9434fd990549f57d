//! HTML page surface rendered through an Askama template

use crate::surface::Surface;
use askama::Template;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use livecall_types::markup::{html_escape, markdown_to_html, wrap_display_math};
use livecall_types::RasterFormat;

/// Kind of a page block, used as its CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Prose,
    Text,
    Markup,
    Image,
    Formula,
    Error,
}

impl BlockKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            BlockKind::Prose => "prose",
            BlockKind::Text => "output output-text",
            BlockKind::Markup => "output output-markup",
            BlockKind::Image => "output output-image",
            BlockKind::Formula => "output output-formula",
            BlockKind::Error => "output output-error",
        }
    }
}

/// A rendered piece of the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub html: String,
}

impl Block {
    pub fn class(&self) -> &'static str {
        self.kind.css_class()
    }
}

/// Notebook page template
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub title: &'a str,
    pub blocks: &'a [Block],
    pub has_math: bool,
}

/// Surface that accumulates blocks of an HTML page
#[derive(Debug, Clone, Default)]
pub struct HtmlPage {
    title: String,
    blocks: Vec<Block>,
}

impl HtmlPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Notebook prose between cells. Raw HTML in it is escaped.
    pub fn push_prose(&mut self, markdown: &str) {
        self.push(BlockKind::Prose, markdown_to_html(markdown, false));
    }

    /// Error block shown in place of a failed cell
    pub fn push_error(&mut self, message: &str) {
        self.push(
            BlockKind::Error,
            format!("<pre>{}</pre>", html_escape(message)),
        );
    }

    fn push(&mut self, kind: BlockKind, html: String) {
        self.blocks.push(Block { kind, html });
    }

    /// Render the full page
    pub fn render(&self) -> askama::Result<String> {
        PageTemplate {
            title: &self.title,
            blocks: &self.blocks,
            has_math: self.blocks.iter().any(|b| b.kind == BlockKind::Formula),
        }
        .render()
    }
}

impl Surface for HtmlPage {
    fn text(&mut self, text: &str) {
        self.push(BlockKind::Text, format!("<pre>{}</pre>", html_escape(text)));
    }

    fn markup(&mut self, content: &str, trusted: bool) {
        self.push(BlockKind::Markup, markdown_to_html(content, trusted));
    }

    fn image(&mut self, bytes: &[u8], format: RasterFormat) {
        self.push(
            BlockKind::Image,
            format!(
                r#"<img src="data:{};base64,{}"/>"#,
                format.mime(),
                STANDARD.encode(bytes)
            ),
        );
    }

    fn formula(&mut self, latex: &str) {
        self.push(BlockKind::Formula, wrap_display_math(latex));
    }
}
