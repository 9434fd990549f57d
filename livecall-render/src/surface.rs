//! Rendering surfaces

use livecall_types::RasterFormat;

/// The UI-side rendering calls a display dispatches to
pub trait Surface {
    /// Preformatted plain text
    fn text(&mut self, text: &str);

    /// Markdown/HTML markup. Raw HTML inside it is honoured only when
    /// `trusted`.
    fn markup(&mut self, content: &str, trusted: bool);

    fn image(&mut self, bytes: &[u8], format: RasterFormat);

    /// A LaTeX formula
    fn formula(&mut self, latex: &str);
}

/// One recorded surface call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Text(String),
    Markup { content: String, trusted: bool },
    Image { bytes: Vec<u8>, format: RasterFormat },
    Formula(String),
}

/// Surface that records calls instead of drawing anything
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn take(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Surface for RecordingSurface {
    fn text(&mut self, text: &str) {
        self.calls.push(SurfaceCall::Text(text.to_string()));
    }

    fn markup(&mut self, content: &str, trusted: bool) {
        self.calls.push(SurfaceCall::Markup {
            content: content.to_string(),
            trusted,
        });
    }

    fn image(&mut self, bytes: &[u8], format: RasterFormat) {
        self.calls.push(SurfaceCall::Image {
            bytes: bytes.to_vec(),
            format,
        });
    }

    fn formula(&mut self, latex: &str) {
        self.calls.push(SurfaceCall::Formula(latex.to_string()));
    }
}
