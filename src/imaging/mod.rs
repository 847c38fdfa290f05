//! Image codec operations — pure Rust, zero external dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (AVIF via `avif-parse`) |
//! | **Decode check** | `image` crate decoders; AVIF via `avif-parse` + `rav1d` |
//! | **Encode → WebP** | `image::codecs::webp::WebPEncoder` (lossless) |
//! | **Encode → AVIF** | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait + [`CodecBackend`]
//! - **AVIF decode path**: [`decode_avif_bytes`], shared with the
//!   capability probe

pub mod backend;
pub mod codec_backend;

pub use backend::{BackendError, Dimensions, EncodeParams, ImageBackend, VariantFormat};
pub use codec_backend::{CodecBackend, decode_avif_bytes};
