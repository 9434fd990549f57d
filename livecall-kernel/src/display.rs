//! Display helper
//!
//! Chooses a MIME representation for kernel values and renders values as a
//! requested MIME type. The helper is armed by loading the helper script,
//! which sets the display globals read here.

use crate::error::{KernelError, Result};
use crate::value::Value;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use livecall_types::markup::{html_escape, markdown_to_html, wrap_display_math};
use livecall_types::{MimePayload, MimeType};

/// Global read from the helper script: decimal places shown for floats
pub const FLOAT_DIGITS_GLOBAL: &str = "display_float_digits";

/// Display settings established by the helper script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayHelper {
    pub float_digits: Option<usize>,
}

impl DisplayHelper {
    /// Best representation of a value, with the MIME type chosen here
    pub fn best(&self, value: &Value) -> Result<MimePayload> {
        let payload = match value {
            Value::Markdown(md) => MimePayload::text(MimeType::TEXT_MARKDOWN, md.clone()),
            Value::Html(html) => MimePayload::text(MimeType::TEXT_HTML, html.clone()),
            Value::Svg(svg) => MimePayload::text(MimeType::IMAGE_SVG, svg.clone()),
            Value::Latex(tex) => MimePayload::text(MimeType::TEXT_LATEX, tex.clone()),
            Value::Tagged { mime, content } => tagged_payload(mime, content)?,
            other => self.plain(other),
        };
        Ok(payload)
    }

    /// Render a value as `mime`
    pub fn render(&self, mime: &MimeType, value: &Value) -> Result<MimePayload> {
        let essence = mime.essence();
        if let Value::Tagged { mime: tag, content } = value {
            if essence == MimeType::new(tag.as_str()).essence() {
                return tagged_payload(tag, content);
            }
        }

        let text = match (essence.as_str(), value) {
            (MimeType::TEXT_PLAIN, other) => return Ok(self.plain(other)),

            (MimeType::TEXT_HTML, Value::Html(html)) => html.clone(),
            (MimeType::TEXT_HTML, Value::Svg(svg)) => svg.clone(),
            (MimeType::TEXT_HTML, Value::Markdown(md)) => markdown_to_html(md, false),
            (MimeType::TEXT_HTML, Value::Latex(tex)) => wrap_display_math(tex),
            (MimeType::TEXT_HTML, Value::Tagged { .. }) => return Err(unsupported(mime, value)),
            (MimeType::TEXT_HTML, other) => {
                format!("<pre>{}</pre>", html_escape(&other.repr(self.float_digits)))
            }

            (MimeType::TEXT_MARKDOWN, Value::Markdown(md)) => md.clone(),
            (MimeType::TEXT_MARKDOWN, Value::String(s)) => s.clone(),

            (MimeType::IMAGE_SVG, Value::Svg(svg)) => svg.clone(),

            (MimeType::TEXT_LATEX, Value::Latex(tex)) => tex.clone(),
            (MimeType::TEXT_LATEX, Value::Int(_) | Value::Float(_)) => {
                value.repr(self.float_digits)
            }

            _ => return Err(unsupported(mime, value)),
        };

        Ok(MimePayload::text(mime.clone(), text))
    }

    fn plain(&self, value: &Value) -> MimePayload {
        MimePayload::text(MimeType::TEXT_PLAIN, value.repr(self.float_digits))
    }
}

fn unsupported(mime: &MimeType, value: &Value) -> KernelError {
    KernelError::UnsupportedMime {
        mime: mime.to_string(),
        kind: value.kind(),
    }
}

/// Payload of a `mime(type, content)` value. Raster content is base64.
fn tagged_payload(mime: &str, content: &str) -> Result<MimePayload> {
    let mime = MimeType::new(mime);
    if mime.raster_format().is_none() {
        return Ok(MimePayload::text(mime, content));
    }

    let bytes = STANDARD
        .decode(content.trim())
        .map_err(|e| KernelError::TypeMismatch {
            span: Default::default(),
            message: format!("{} content is not valid base64: {}", mime, e),
        })?;
    Ok(MimePayload::bytes(mime, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecall_types::MimeData;

    const HELPER: DisplayHelper = DisplayHelper {
        float_digits: Some(3),
    };

    #[test]
    fn test_best_representation_by_kind() {
        assert_eq!(
            HELPER.best(&Value::Int(2)).unwrap(),
            MimePayload::text("text/plain", "2")
        );
        assert_eq!(
            HELPER.best(&Value::Html("<b>x</b>".into())).unwrap().mime,
            "text/html"
        );
        assert_eq!(
            HELPER.best(&Value::Svg("<svg/>".into())).unwrap().mime,
            "image/svg+xml"
        );
        assert_eq!(
            HELPER.best(&Value::Float(1.0 / 3.0)).unwrap(),
            MimePayload::text("text/plain", "0.333")
        );
    }

    #[test]
    fn test_tagged_raster_is_decoded() {
        let value = Value::Tagged {
            mime: "image/png".into(),
            content: STANDARD.encode([0x89, b'P', b'N', b'G']),
        };
        let payload = HELPER.best(&value).unwrap();
        assert_eq!(payload.data, MimeData::Bytes(vec![0x89, b'P', b'N', b'G']));

        let broken = Value::Tagged {
            mime: "image/png".into(),
            content: "***".into(),
        };
        assert!(matches!(
            HELPER.best(&broken),
            Err(KernelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_render_requested_type() {
        let md = Value::Markdown("*hi*".into());
        let html = HELPER.render(&MimeType::from("text/html"), &md).unwrap();
        assert!(html.data.as_text().unwrap().contains("<em>hi</em>"));

        let plain = HELPER
            .render(&MimeType::from("text/html"), &Value::String("<x>".into()))
            .unwrap();
        assert_eq!(plain.data.as_text(), Some("<pre>&quot;&lt;x&gt;&quot;</pre>"));

        let tex = HELPER
            .render(&MimeType::from("text/latex"), &Value::Int(4))
            .unwrap();
        assert_eq!(tex.data.as_text(), Some("4"));
    }

    #[test]
    fn test_render_matches_mime_essence() {
        let html = HELPER
            .render(
                &MimeType::from("text/html; charset=utf-8"),
                &Value::Html("<b>x</b>".into()),
            )
            .unwrap();
        assert_eq!(html.mime, "text/html; charset=utf-8");
        assert_eq!(html.data.as_text(), Some("<b>x</b>"));

        let tagged = Value::Tagged {
            mime: "application/json".into(),
            content: "{}".into(),
        };
        let payload = HELPER
            .render(&MimeType::from("Application/JSON"), &tagged)
            .unwrap();
        assert_eq!(payload.data.as_text(), Some("{}"));
    }

    #[test]
    fn test_render_unsupported_type() {
        let err = HELPER
            .render(&MimeType::from("image/png"), &Value::Int(1))
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::UnsupportedMime { ref mime, kind: "Int64" } if mime == "image/png"
        ));
    }
}
