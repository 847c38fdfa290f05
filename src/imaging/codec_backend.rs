//! Pure Rust codec backend — zero external dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, TGA, WebP) | `image` crate (pure Rust decoders) |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 decode) + custom YUV→RGB |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, Dimensions, EncodeParams, ImageBackend, VariantFormat};
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct CodecBackend;

impl CodecBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CodecBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    if is_avif(path) {
        let data = std::fs::read(path).map_err(BackendError::Io)?;
        return decode_avif_bytes(&data);
    }
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Extract dimensions from an AVIF file's container metadata (no full decode needed).
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let file_data = std::fs::read(path).map_err(BackendError::Io)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Decode an in-memory AVIF file using avif-parse (container) + rav1d (AV1 decode).
///
/// The `image` crate's `"avif"` feature only provides the encoder (rav1e).
/// Decoding requires `"avif-native"` which depends on the C library dav1d.
/// Instead, we use `rav1d` (pure Rust port of dav1d) directly.
///
/// Takes bytes rather than a path because the capability probe feeds it an
/// embedded sample that never touches disk.
pub fn decode_avif_bytes(file_data: &[u8]) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use std::ptr::NonNull;

    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(file_data))
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to parse AVIF: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;

    // Initialize rav1d decoder
    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe {
        rav1d::src::lib::dav1d_default_settings(NonNull::new(settings.as_mut_ptr()).unwrap())
    };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d open failed ({})",
            rc.0
        )));
    }

    // Create data buffer and copy AV1 bytes
    let mut data = Dav1dData::default();
    let buf_ptr =
        unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::ProcessingFailed(
            "rav1d data_create failed".into(),
        ));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    // Feed data to decoder
    let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data));
            rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d send_data failed ({})",
            rc.0
        )));
    }

    // Get decoded picture
    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d get_picture failed ({})",
            rc.0
        )));
    }

    // Extract dimensions and pixel layout
    let w = pic.p.w as u32;
    let h = pic.p.h as u32;
    let bpc = pic.p.bpc as u32;
    let layout = pic.p.layout;
    let y_stride = pic.stride[0];
    let uv_stride = pic.stride[1];
    let y_ptr = pic.data[0].unwrap().as_ptr() as *const u8;

    // Convert YUV planes to interleaved RGB8
    let rgb = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride,
            uv_stride: 0,
            width: w,
            height: h,
            bpc,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
        .to_rgb()
    } else {
        let u_ptr = pic.data[1].unwrap().as_ptr() as *const u8;
        let v_ptr = pic.data[2].unwrap().as_ptr() as *const u8;
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            _ => {
                unsafe {
                    rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
                    rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
                }
                return Err(BackendError::ProcessingFailed(format!(
                    "Unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr,
            v_ptr,
            y_stride,
            uv_stride,
            width: w,
            height: h,
            bpc,
            ss_x,
            ss_y,
            monochrome: false,
        }
        .to_rgb()
    };

    unsafe {
        rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
        rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
    }

    image::RgbImage::from_raw(w, h, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            BackendError::ProcessingFailed("Failed to create image from decoded AVIF data".into())
        })
}

/// Decoded YUV plane data from rav1d, ready for RGB conversion.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling: horizontal, vertical (e.g. I420 = true, true)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// Convert YUV planes to interleaved RGB8 using BT.601 coefficients.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = vec![0u8; (self.width * self.height * 3) as usize];

        for row in 0..self.height {
            for col in 0..self.width {
                let y_val = read_pixel(self.y_ptr, self.y_stride, col, row, self.bpc);

                let (r, g, b) = if self.monochrome {
                    let v = (y_val * scale).clamp(0.0, 255.0);
                    (v, v, v)
                } else {
                    let u_col = if self.ss_x { col / 2 } else { col };
                    let u_row = if self.ss_y { row / 2 } else { row };
                    let cb = read_pixel(self.u_ptr, self.uv_stride, u_col, u_row, self.bpc);
                    let cr = read_pixel(self.v_ptr, self.uv_stride, u_col, u_row, self.bpc);

                    // BT.601 YCbCr -> RGB, then scale to 8-bit
                    let cb_f = cb - center;
                    let cr_f = cr - center;

                    (
                        ((y_val + 1.402 * cr_f) * scale).clamp(0.0, 255.0),
                        ((y_val - 0.344136 * cb_f - 0.714136 * cr_f) * scale).clamp(0.0, 255.0),
                        ((y_val + 1.772 * cb_f) * scale).clamp(0.0, 255.0),
                    )
                };

                let idx = ((row * self.width + col) * 3) as usize;
                rgb[idx] = r as u8;
                rgb[idx + 1] = g as u8;
                rgb[idx + 2] = b as u8;
            }
        }

        rgb
    }
}

/// Read a single pixel value from a YUV plane, handling both 8-bit and 16-bit storage.
#[inline]
fn read_pixel(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        // 10-bit and 12-bit are stored as u16
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { *(ptr.offset(byte_offset) as *const u16) }) as f32
    }
}

/// Encode and save as AVIF using rav1e (speed=6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))
}

/// Encode and save as lossless WebP.
///
/// The `image` crate's WebP encoder is lossless-only; the quality knob is
/// an AVIF concern.
fn save_webp(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::webp::WebPEncoder::new_lossless(writer);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))
}

impl ImageBackend for CodecBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if is_avif(path) {
            return identify_avif(path);
        }
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode_check(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let img = load_image(path)?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }

    fn encode(&self, params: &EncodeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        match params.format {
            VariantFormat::Avif => save_avif(&img, &params.output, params.quality),
            VariantFormat::Webp => save_webp(&img, &params.output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = CodecBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = CodecBackend::new();
        assert!(backend.identify(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn encode_jpeg_to_webp() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 40, 30);

        let output = tmp.path().join("source.webp");
        let backend = CodecBackend::new();
        backend
            .encode(&EncodeParams {
                source,
                output: output.clone(),
                format: VariantFormat::Webp,
                quality: 80,
            })
            .unwrap();

        assert!(output.exists());
        // RIFF container magic + WEBP fourcc
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn encode_jpeg_to_avif_and_decode_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 32, 24);

        let output = tmp.path().join("source.avif");
        let backend = CodecBackend::new();
        backend
            .encode(&EncodeParams {
                source,
                output: output.clone(),
                format: VariantFormat::Avif,
                quality: 80,
            })
            .unwrap();

        let dims = backend.decode_check(&output).unwrap();
        assert_eq!(dims.width, 32);
        assert_eq!(dims.height, 24);
    }

    #[test]
    fn decode_check_rejects_truncated_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"\xff\xd8\xff").unwrap();

        let backend = CodecBackend::new();
        assert!(backend.decode_check(&path).is_err());
    }

    #[test]
    fn identify_avif_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 120, 80);

        let avif_path = tmp.path().join("test.avif");
        let backend = CodecBackend::new();
        backend
            .encode(&EncodeParams {
                source,
                output: avif_path.clone(),
                format: VariantFormat::Avif,
                quality: 85,
            })
            .unwrap();

        let dims = backend.identify(&avif_path).unwrap();
        assert_eq!(dims.width, 120);
        assert_eq!(dims.height, 80);
    }
}
