//! Batch variant conversion.
//!
//! Walks a directory tree, finds every source image, and encodes `webp/`
//! and `avif/` sibling variants next to it:
//!
//! ```text
//! img/
//! ├── photo.jpg
//! ├── webp/
//! │   └── photo.webp
//! └── avif/
//!     └── photo.avif
//! ```
//!
//! Files already inside a `webp/` or `avif/` folder are never treated as
//! sources, so the converter can be re-run over its own output. Encoding
//! runs in parallel across images (rayon); per-file failures are recorded
//! in the report instead of aborting the run. Unchanged images are skipped
//! via the content-addressed [cache](crate::cache).

use crate::cache::{CacheManifest, hash_file, hash_params};
use crate::imaging::{BackendError, EncodeParams, ImageBackend, VariantFormat};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory not found: {0}")]
    RootNotFound(PathBuf),
}

/// Extensions accepted as conversion sources.
pub const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tga", "gif"];

/// Conversion run settings.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub formats: Vec<VariantFormat>,
    /// 1–100. Applies to AVIF; WebP variants are lossless.
    pub quality: u32,
    /// When false, ignore the cache manifest and re-encode everything.
    pub use_cache: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            formats: vec![VariantFormat::Webp, VariantFormat::Avif],
            quality: 80,
            use_cache: true,
        }
    }
}

/// How one variant of one source image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    Encoded,
    Cached,
    Failed(String),
}

/// Per-source result: one outcome per requested format.
#[derive(Debug, Clone)]
pub struct SourceResult {
    /// Source path relative to the scanned root, forward slashes.
    pub source: String,
    pub variants: Vec<(VariantFormat, VariantOutcome)>,
}

/// Result of a conversion run.
#[derive(Debug)]
pub struct ConvertReport {
    pub results: Vec<SourceResult>,
}

impl ConvertReport {
    /// Variants that were encoded or already up to date.
    pub fn successful(&self) -> usize {
        self.results
            .iter()
            .flat_map(|r| &r.variants)
            .filter(|(_, o)| !matches!(o, VariantOutcome::Failed(_)))
            .count()
    }

    pub fn cached(&self) -> usize {
        self.results
            .iter()
            .flat_map(|r| &r.variants)
            .filter(|(_, o)| matches!(o, VariantOutcome::Cached))
            .count()
    }

    pub fn total(&self) -> usize {
        self.results.iter().map(|r| r.variants.len()).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.successful() == self.total()
    }
}

/// Find all source images under `root`, in a stable walk order.
///
/// Skips anything already inside a `webp/` or `avif/` path segment.
pub fn find_images(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_input_extension(p) && !is_variant_path(root, p))
        .collect()
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            INPUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Whether any path component below `root` is a variant folder.
fn is_variant_path(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|s| s == "webp" || s == "avif")
        })
}

/// Path of a variant for `source`: sibling `<fmt>/` folder, same stem.
pub fn variant_path(source: &Path, format: VariantFormat) -> PathBuf {
    let dir = source.parent().unwrap_or(Path::new(""));
    let stem = source.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format.ext());
    dir.join(format.ext()).join(name)
}

fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Convert every source image under `root`, updating the cache manifest.
pub fn convert_tree(
    backend: &impl ImageBackend,
    root: &Path,
    config: &ConvertConfig,
) -> Result<ConvertReport, ConvertError> {
    if !root.is_dir() {
        return Err(ConvertError::RootNotFound(root.to_path_buf()));
    }

    let cache = if config.use_cache {
        CacheManifest::load(root)
    } else {
        CacheManifest::empty()
    };

    let images = find_images(root);

    // Each parallel task carries its hashes back so the manifest merge can
    // stay single-threaded.
    struct VariantResult {
        format: VariantFormat,
        output_key: String,
        params_hash: String,
        outcome: VariantOutcome,
    }
    struct ImageResult {
        source: String,
        source_hash: Option<String>,
        variants: Vec<VariantResult>,
    }

    let image_results: Vec<ImageResult> = images
        .par_iter()
        .map(|source| {
            let source_key = relative_key(root, source);
            let source_hash = match hash_file(source) {
                Ok(h) => h,
                Err(e) => {
                    // Unreadable source fails every requested variant
                    let variants = config
                        .formats
                        .iter()
                        .map(|&format| VariantResult {
                            format,
                            output_key: relative_key(root, &variant_path(source, format)),
                            params_hash: String::new(),
                            outcome: VariantOutcome::Failed(format!("read failed: {e}")),
                        })
                        .collect();
                    return ImageResult {
                        source: source_key,
                        source_hash: None,
                        variants,
                    };
                }
            };

            let variants = config
                .formats
                .iter()
                .map(|&format| {
                    let output = variant_path(source, format);
                    let output_key = relative_key(root, &output);
                    let params_hash = hash_params(format.ext(), config.quality);

                    if cache.is_hit(&output_key, &source_hash, &params_hash, output.exists()) {
                        return VariantResult {
                            format,
                            output_key,
                            params_hash,
                            outcome: VariantOutcome::Cached,
                        };
                    }

                    let outcome = encode_variant(backend, source, &output, format, config.quality);
                    VariantResult {
                        format,
                        output_key,
                        params_hash,
                        outcome,
                    }
                })
                .collect();

            ImageResult {
                source: source_key,
                source_hash: Some(source_hash),
                variants,
            }
        })
        .collect();

    let mut manifest = cache;
    let mut results = Vec::with_capacity(image_results.len());
    for image in image_results {
        if let Some(source_hash) = &image.source_hash {
            for v in &image.variants {
                if !matches!(v.outcome, VariantOutcome::Failed(_)) {
                    manifest.insert(v.output_key.clone(), source_hash.clone(), v.params_hash.clone());
                }
            }
        }
        results.push(SourceResult {
            source: image.source,
            variants: image
                .variants
                .into_iter()
                .map(|v| (v.format, v.outcome))
                .collect(),
        });
    }
    manifest.save(root)?;

    Ok(ConvertReport { results })
}

fn encode_variant(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    format: VariantFormat,
    quality: u32,
) -> VariantOutcome {
    if let Some(dir) = output.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            return VariantOutcome::Failed(format!("mkdir failed: {e}"));
        }
    }
    let params = EncodeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        format,
        quality,
    };
    match backend.encode(&params) {
        Ok(()) => VariantOutcome::Encoded,
        Err(BackendError::Io(e)) => VariantOutcome::Failed(format!("IO error: {e}")),
        Err(e) => VariantOutcome::Failed(e.to_string()),
    }
}
