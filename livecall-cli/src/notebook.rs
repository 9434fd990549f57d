//! Notebook files: markdown with live cells.
//!
//! A fenced block tagged `live` is displayed, `live-eval` is evaluated
//! without output, and `live mime=<type>` displays with a forced MIME type.
//! Everything else is prose.

use livecall_kernel::{Kernel, KernelError};
use livecall_render::{Displayable, Dispatcher, HtmlPage};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Prose(String),
    Display { source: String, mime: Option<String> },
    Eval { source: String },
}

enum CellKind {
    Display(Option<String>),
    Eval,
}

impl CellKind {
    fn from_info(info: &str) -> Option<Self> {
        let mut words = info.split_whitespace();
        match words.next()? {
            "live" => {
                let mime = words
                    .find_map(|word| word.strip_prefix("mime="))
                    .filter(|mime| !mime.is_empty())
                    .map(str::to_string);
                Some(CellKind::Display(mime))
            }
            "live-eval" => Some(CellKind::Eval),
            _ => None,
        }
    }

    fn into_cell(self, source: String) -> Cell {
        match self {
            CellKind::Display(mime) => Cell::Display { source, mime },
            CellKind::Eval => Cell::Eval { source },
        }
    }
}

/// Split a notebook into cells, in document order
pub fn parse_notebook(markdown: &str) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut prose_start = 0;
    let mut current: Option<(CellKind, String)> = None;

    for (event, range) in Parser::new_ext(markdown, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if let Some(kind) = CellKind::from_info(&info) {
                    push_prose(&mut cells, &markdown[prose_start..range.start]);
                    prose_start = range.end;
                    current = Some((kind, String::new()));
                }
            }
            Event::Text(text) => {
                if let Some((_, source)) = current.as_mut() {
                    source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((kind, source)) = current.take() {
                    cells.push(kind.into_cell(source));
                }
            }
            _ => {}
        }
    }

    push_prose(&mut cells, &markdown[prose_start..]);
    cells
}

fn push_prose(cells: &mut Vec<Cell>, text: &str) {
    if !text.trim().is_empty() {
        cells.push(Cell::Prose(text.to_string()));
    }
}

/// Run every cell against the kernel and collect the output into a page.
///
/// A failing cell becomes an error block; later cells still run.
pub fn render_cells(dispatcher: &Dispatcher<Kernel>, title: &str, cells: &[Cell]) -> HtmlPage {
    let mut page = HtmlPage::new(title);

    for (index, cell) in cells.iter().enumerate() {
        let result = match cell {
            Cell::Prose(markdown) => {
                page.push_prose(markdown);
                continue;
            }
            Cell::Display { source, mime } => dispatcher
                .display(&mut page, Displayable::source(source.as_str()), mime.as_deref())
                .map_err(|e| e.to_string()),
            Cell::Eval { source } => dispatcher
                .evaluate(source)
                .map(|_| ())
                .map_err(|e: KernelError| e.to_string()),
        };

        if let Err(message) = result {
            tracing::warn!(cell = index, "Cell failed: {}", message);
            page.push_error(&message);
        }
    }

    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells_in_order() {
        let notebook = "# Title\n\nIntro text.\n\n```live-eval\nx = 2\n```\n\n```live\nx * 21\n```\n\nOutro.\n";
        let cells = parse_notebook(notebook);

        assert_eq!(cells.len(), 4);
        assert!(matches!(&cells[0], Cell::Prose(p) if p.contains("# Title")));
        assert_eq!(
            cells[1],
            Cell::Eval {
                source: "x = 2\n".to_string()
            }
        );
        assert_eq!(
            cells[2],
            Cell::Display {
                source: "x * 21\n".to_string(),
                mime: None
            }
        );
        assert!(matches!(&cells[3], Cell::Prose(p) if p.contains("Outro.")));
    }

    #[test]
    fn test_mime_info_string() {
        let cells = parse_notebook("```live mime=text/html\n1\n```\n");
        assert_eq!(
            cells,
            vec![Cell::Display {
                source: "1\n".to_string(),
                mime: Some("text/html".to_string())
            }]
        );
    }

    #[test]
    fn test_other_code_blocks_stay_prose() {
        let notebook = "```rust\nfn main() {}\n```\n";
        let cells = parse_notebook(notebook);
        assert_eq!(cells, vec![Cell::Prose(notebook.to_string())]);
    }
}
