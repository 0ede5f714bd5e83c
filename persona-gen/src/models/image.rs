//! Visitor photo payload
//!
//! Photos arrive base64-encoded. Only JPEG and PNG are accepted; anything
//! else is rejected before the pipeline runs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Image acceptance errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image_base64 is empty")]
    Empty,

    #[error("image_base64 is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
}

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// A decoded, type-checked visitor photo
///
/// Keeps the canonical base64 text for forwarding to the classification
/// service.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    encoded: String,
    format: ImageFormat,
    size_bytes: usize,
}

impl ImagePayload {
    /// Decode and sniff a base64 payload
    ///
    /// Accepts an optional `data:<mime>;base64,` prefix.
    pub fn from_base64(raw: &str) -> Result<Self, ImageError> {
        let trimmed = raw.trim();
        let body = match trimmed.split_once(";base64,") {
            Some((prefix, body)) if prefix.starts_with("data:") => body,
            _ => trimmed,
        };

        if body.is_empty() {
            return Err(ImageError::Empty);
        }

        let bytes = STANDARD
            .decode(body)
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

        Self::from_bytes(&bytes)
    }

    /// Type-check raw image bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let format = match infer::get(bytes) {
            Some(kind) if kind.mime_type() == "image/jpeg" => ImageFormat::Jpeg,
            Some(kind) if kind.mime_type() == "image/png" => ImageFormat::Png,
            Some(kind) => return Err(ImageError::UnsupportedType(kind.mime_type().to_string())),
            None => return Err(ImageError::UnsupportedType("unknown".to_string())),
        };

        Ok(Self {
            encoded: STANDARD.encode(bytes),
            format,
            size_bytes: bytes.len(),
        })
    }

    pub fn as_base64(&self) -> &str {
        &self.encoded
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}
