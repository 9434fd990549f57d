//! HTML escaping and markdown conversion

use pulldown_cmark::{html, Event, Options, Parser};

/// HTML escape function to prevent XSS
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Convert markdown to HTML.
///
/// Raw HTML embedded in the markdown is passed through when `trusted` and
/// escaped as text otherwise.
pub fn markdown_to_html(markdown: &str, trusted: bool) -> String {
    let events = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) if !trusted => Event::Text(raw),
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, events);
    output
}

/// Wrap LaTeX in display-math delimiters for MathJax
pub fn wrap_display_math(math: &str) -> String {
    format!(
        r#"<div class="math math-display" aria-label="{}">\[{}\]</div>"#,
        html_escape(math),
        html_escape(math)
    )
}
