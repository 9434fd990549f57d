//! Shared types for livecall
//!
//! This crate provides the MIME payload types exchanged between a kernel's
//! display helper and the rendering side, plus the small markup helpers
//! both sides share.

pub mod markup;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A MIME type string such as `text/plain` or `image/svg+xml`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeType(pub String);

impl MimeType {
    pub const TEXT_PLAIN: &'static str = "text/plain";
    pub const TEXT_MARKDOWN: &'static str = "text/markdown";
    pub const TEXT_HTML: &'static str = "text/html";
    pub const TEXT_LATEX: &'static str = "text/latex";
    pub const IMAGE_PNG: &'static str = "image/png";
    pub const IMAGE_JPEG: &'static str = "image/jpeg";
    pub const IMAGE_SVG: &'static str = "image/svg+xml";

    pub fn new(mime: impl Into<String>) -> Self {
        Self(mime.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased type without parameters:
    /// `text/plain; charset=utf-8` -> `text/plain`
    pub fn essence(&self) -> String {
        self.0
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Raster image type, if this is one
    pub fn raster_format(&self) -> Option<RasterFormat> {
        match self.essence().as_str() {
            Self::IMAGE_PNG => Some(RasterFormat::Png),
            Self::IMAGE_JPEG => Some(RasterFormat::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MimeType {
    fn from(mime: &str) -> Self {
        MimeType(mime.to_string())
    }
}

impl From<String> for MimeType {
    fn from(mime: String) -> Self {
        MimeType(mime)
    }
}

impl PartialEq<str> for MimeType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MimeType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Raster image encodings the rendering side understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            RasterFormat::Png => MimeType::IMAGE_PNG,
            RasterFormat::Jpeg => MimeType::IMAGE_JPEG,
        }
    }
}

/// Encoded content of a MIME payload
///
/// Text types carry a string, binary types (raster images) carry bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MimeData {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "bytes")]
    Bytes(Vec<u8>),
}

impl MimeData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MimeData::Text(text) => Some(text),
            MimeData::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MimeData::Text(text) => text.len(),
            MimeData::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A (MIME type, encoded content) pair produced by a display helper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimePayload {
    pub mime: MimeType,
    pub data: MimeData,
}

impl MimePayload {
    pub fn new(mime: impl Into<MimeType>, data: MimeData) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    pub fn text(mime: impl Into<MimeType>, text: impl Into<String>) -> Self {
        Self::new(mime, MimeData::Text(text.into()))
    }

    pub fn bytes(mime: impl Into<MimeType>, bytes: Vec<u8>) -> Self {
        Self::new(mime, MimeData::Bytes(bytes))
    }
}
