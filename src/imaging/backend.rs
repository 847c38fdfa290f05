//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, decode_check, and encode. The production implementation
//! is [`CodecBackend`](super::codec_backend::CodecBackend) — pure Rust,
//! statically linked.
//!
//! The trait exists so the converter and the `check` pipeline can run against
//! a recording mock in tests without encoding a single pixel.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify or decode_check operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Output encoding for a generated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantFormat {
    Webp,
    Avif,
}

impl VariantFormat {
    pub fn ext(&self) -> &'static str {
        match self {
            VariantFormat::Webp => "webp",
            VariantFormat::Avif => "avif",
        }
    }
}

/// Parameters for one encode operation.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: VariantFormat,
    /// 1–100. Applies to AVIF; WebP output is lossless.
    pub quality: u32,
}

/// Trait for image codec backends.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Fully decode an image, verifying it is displayable. Returns the
    /// decoded dimensions.
    fn decode_check(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Encode a source image into a variant file.
    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError>;
}
