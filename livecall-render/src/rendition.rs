//! Typed view of a MIME payload
//!
//! Every MIME type the rendering side understands maps to one variant, so
//! dispatch is an exhaustive match instead of a chain of string
//! comparisons.

use crate::surface::Surface;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use livecall_types::{MimeData, MimePayload, MimeType, RasterFormat};
use thiserror::Error;

/// A payload whose content does not fit its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{mime} payload must be {expected}")]
pub struct PayloadShapeError {
    pub mime: MimeType,
    pub expected: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendition {
    PlainText(String),
    Markdown(String),
    Html(String),
    Raster { format: RasterFormat, bytes: Vec<u8> },
    Svg(String),
    Latex(String),
    Unsupported { mime: MimeType },
}

fn text(mime: &MimeType, data: MimeData) -> Result<String, PayloadShapeError> {
    match data {
        MimeData::Text(text) => Ok(text),
        MimeData::Bytes(bytes) => String::from_utf8(bytes).map_err(|_| PayloadShapeError {
            mime: mime.clone(),
            expected: "UTF-8 text",
        }),
    }
}

impl Rendition {
    pub fn from_payload(payload: MimePayload) -> Result<Self, PayloadShapeError> {
        let MimePayload { mime, data } = payload;
        let essence = mime.essence();

        let rendition = match essence.as_str() {
            MimeType::TEXT_PLAIN => Rendition::PlainText(text(&mime, data)?),
            MimeType::TEXT_MARKDOWN => Rendition::Markdown(text(&mime, data)?),
            MimeType::TEXT_HTML => Rendition::Html(text(&mime, data)?),
            MimeType::IMAGE_SVG => Rendition::Svg(text(&mime, data)?),
            MimeType::TEXT_LATEX => Rendition::Latex(text(&mime, data)?),
            MimeType::IMAGE_PNG | MimeType::IMAGE_JPEG => {
                let format = match essence.as_str() {
                    MimeType::IMAGE_PNG => RasterFormat::Png,
                    _ => RasterFormat::Jpeg,
                };
                match data {
                    MimeData::Bytes(bytes) => Rendition::Raster { format, bytes },
                    MimeData::Text(_) => {
                        return Err(PayloadShapeError {
                            mime,
                            expected: "binary image data",
                        })
                    }
                }
            }
            _ => Rendition::Unsupported { mime },
        };

        Ok(rendition)
    }

    /// Hand the rendition to the matching surface call
    pub fn render_to<S: Surface + ?Sized>(&self, surface: &mut S) {
        match self {
            Rendition::PlainText(text) => surface.text(text),
            Rendition::Markdown(md) => surface.markup(md, false),
            Rendition::Html(html) => surface.markup(html, true),
            Rendition::Raster { format, bytes } => surface.image(bytes, *format),
            Rendition::Svg(svg) => surface.markup(&svg_img_tag(svg), true),
            Rendition::Latex(tex) => surface.formula(tex),
            Rendition::Unsupported { mime } => {
                tracing::warn!(mime = %mime, "Unsupported MIME type, nothing rendered");
            }
        }
    }
}

/// Inline an SVG document as a base64 data URI image
pub fn svg_img_tag(svg: &str) -> String {
    format!(
        r#"<img src="data:image/svg+xml;base64,{}"/>"#,
        STANDARD.encode(svg.as_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_img_tag() {
        insta::assert_snapshot!(
            svg_img_tag("<svg></svg>"),
            @r#"<img src="data:image/svg+xml;base64,PHN2Zz48L3N2Zz4="/>"#
        );
    }

    #[test]
    fn test_mime_parameters_are_ignored() {
        let payload = MimePayload::text("Text/HTML; charset=utf-8", "<p>x</p>");
        assert_eq!(
            Rendition::from_payload(payload).unwrap(),
            Rendition::Html("<p>x</p>".to_string())
        );
    }

    #[test]
    fn test_text_types_accept_utf8_bytes() {
        let payload = MimePayload::bytes("text/plain", b"2".to_vec());
        assert_eq!(
            Rendition::from_payload(payload).unwrap(),
            Rendition::PlainText("2".to_string())
        );

        let payload = MimePayload::bytes("text/plain", vec![0xff, 0xfe]);
        let err = Rendition::from_payload(payload).unwrap_err();
        assert_eq!(err.expected, "UTF-8 text");
    }

    #[test]
    fn test_raster_requires_bytes() {
        let payload = MimePayload::bytes("image/jpeg", vec![0xff, 0xd8]);
        assert_eq!(
            Rendition::from_payload(payload).unwrap(),
            Rendition::Raster {
                format: RasterFormat::Jpeg,
                bytes: vec![0xff, 0xd8]
            }
        );

        let payload = MimePayload::text("image/png", "not bytes");
        assert!(Rendition::from_payload(payload).is_err());
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let payload = MimePayload::text("application/json", "{}");
        assert_eq!(
            Rendition::from_payload(payload).unwrap(),
            Rendition::Unsupported {
                mime: MimeType::from("application/json")
            }
        );
    }
}
