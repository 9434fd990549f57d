//! # livecall-render
//!
//! MIME dispatch and rendering surfaces for livecall notebooks.
//!
//! A value's MIME payload is turned into a [`Rendition`] and handed to a
//! [`Surface`]: plain text, markup (trusted or not), raster images, SVG
//! (inlined as a base64 `<img>`) and LaTeX formulas. Unknown MIME types are
//! logged and dropped.

pub mod dispatcher;
pub mod page;
pub mod rendition;
pub mod surface;

pub use dispatcher::{present, DisplayError, Displayable, Dispatcher};
pub use page::{Block, BlockKind, HtmlPage, PageTemplate};
pub use rendition::{svg_img_tag, PayloadShapeError, Rendition};
pub use surface::{RecordingSurface, Surface, SurfaceCall};
