//! Markup annotation: point references at the lightest variant.
//!
//! Walks a directory of HTML and CSS files and rewrites raster image
//! references based on what actually exists on disk:
//!
//! - `<img src="...">` tags get their `src` replaced by the smallest
//!   existing variant and gain the declared candidate attributes the
//!   selector consumes (`data-<fmt>-src` / `data-<fmt>-priority`, plus
//!   `data-original-ext`).
//! - CSS `url(...)` references are rewritten to the smallest existing
//!   variant; CSS carries no attributes.
//!
//! Priorities rank formats by file size: existing variants ascending,
//! then missing-but-potential `webp`/`avif` paths last. A missing variant
//! still gets declared — the server may grow the file later, and the
//! lazy-reveal fallback absorbs a 404 either way.
//!
//! The pass is idempotent: tags already carrying `data-webp-src` or
//! `data-avif-src` are left untouched, and re-running over rewritten
//! output changes nothing. A referenced image missing from disk is not an
//! error — the reference is simply left alone.

use crate::format::Format;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory not found: {0}")]
    RootNotFound(PathBuf),
}

/// `<img ... src="path.ext" ...>` with a raster extension.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<img([^>]*?)src=["']([^"']+\.(jpg|jpeg|png|gif|bmp|tiff|webp|avif))["']([^>]*?)>"#,
    )
    .expect("img tag pattern")
});

/// CSS `url(path.ext)` with a raster extension.
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(["']?([^"'()]+\.(jpg|jpeg|png|gif|bmp|tiff|webp|avif))["']?\)"#)
        .expect("css url pattern")
});

/// Annotation run settings.
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    /// File extensions to process (lowercase, no dot).
    pub extensions: Vec<String>,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["html".into(), "htm".into(), "css".into()],
        }
    }
}

/// Result for one processed file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path relative to the scanned directory, forward slashes.
    pub path: String,
    pub changed: bool,
    /// Number of references rewritten in this file.
    pub rewritten: usize,
}

/// Result of an annotation run.
#[derive(Debug, Default)]
pub struct AnnotateReport {
    pub files: Vec<FileReport>,
}

impl AnnotateReport {
    pub fn changed_files(&self) -> usize {
        self.files.iter().filter(|f| f.changed).count()
    }

    pub fn rewritten_refs(&self) -> usize {
        self.files.iter().map(|f| f.rewritten).sum()
    }
}

/// One format's standing for a referenced image.
#[derive(Debug, Clone)]
struct Variant {
    /// `None` for a source outside the declared candidate contract
    /// (bmp, tiff): still rewritable, but it gets no `data-<fmt>-src` pair.
    format: Option<Format>,
    /// Web path as it will appear in markup.
    web_path: String,
    /// File size when the variant exists on disk.
    size: Option<u64>,
}

/// Everything needed to rewrite one `<img>` reference.
#[derive(Debug, Clone)]
struct ImagePlan {
    /// Smallest existing variant — the new visible `src`.
    main_src: String,
    original_ext: String,
    /// Variants in priority order (existing ascending by size, missing last).
    ranked: Vec<Variant>,
}

/// Resolve a web path against the asset root.
///
/// Leading `./` and `/` are stripped: both `img/a.jpg` and `/img/a.jpg`
/// refer to `<asset_root>/img/a.jpg`.
fn resolve_asset(asset_root: &Path, web_path: &str) -> PathBuf {
    let clean = web_path.trim_start_matches("./").trim_start_matches('/');
    asset_root.join(clean)
}

/// Sibling variant web path: `img/photo.jpg` → `img/webp/photo.webp`.
fn variant_web_path(original: &str, fmt: &str) -> String {
    let (dir, file) = match original.rfind('/') {
        Some(pos) => (&original[..pos], &original[pos + 1..]),
        None => ("", original),
    };
    let stem = match file.rfind('.') {
        Some(pos) => &file[..pos],
        None => file,
    };
    if dir.is_empty() {
        format!("{fmt}/{stem}.{fmt}")
    } else {
        format!("{dir}/{fmt}/{stem}.{fmt}")
    }
}

/// Build the rewrite plan for one referenced image, or `None` when the
/// original is missing from disk.
///
/// Any raster source the patterns match is plannable: bmp and tiff map to
/// no candidate format, but their variants are declared and their visible
/// reference is rewritten all the same.
fn plan_image(asset_root: &Path, web_path: &str) -> Option<ImagePlan> {
    let original_file = resolve_asset(asset_root, web_path);
    let original_size = std::fs::metadata(&original_file).ok()?.len();

    let ext = web_path.rsplit('.').next()?;
    let original_format = Format::from_ext(ext);
    let original_ext = ext.to_ascii_lowercase();

    let mut variants = vec![Variant {
        format: original_format,
        web_path: web_path.to_string(),
        size: Some(original_size),
    }];

    for format in [Format::Webp, Format::Avif] {
        if original_format == Some(format) {
            continue;
        }
        let vpath = variant_web_path(web_path, format.ext());
        let size = std::fs::metadata(resolve_asset(asset_root, &vpath))
            .ok()
            .map(|m| m.len());
        variants.push(Variant {
            format: Some(format),
            web_path: vpath,
            size,
        });
    }

    // Existing variants ascending by size, potential ones last
    variants.sort_by_key(|v| (v.size.is_none(), v.size.unwrap_or(u64::MAX)));

    let main_src = variants
        .iter()
        .find(|v| v.size.is_some())
        .map(|v| v.web_path.clone())?;

    Some(ImagePlan {
        main_src,
        original_ext,
        ranked: variants,
    })
}

/// Render the injected attribute string for an `<img>` tag.
///
/// Priorities number the declared candidates contiguously; a source format
/// outside the contract occupies no slot.
fn render_attrs(plan: &ImagePlan) -> String {
    let mut out = format!(" data-original-ext=\"{}\"", plan.original_ext);
    let mut priority = 0;
    for variant in &plan.ranked {
        let Some(format) = variant.format else {
            continue;
        };
        priority += 1;
        out.push_str(&format!(
            " {}=\"{}\" {}=\"{}\"",
            format.src_attr(),
            variant.web_path,
            format.priority_attr(),
            priority
        ));
    }
    out
}

/// Whether a tag was already annotated by a previous run.
fn already_annotated(tag: &str) -> bool {
    tag.contains("data-webp-src") || tag.contains("data-avif-src") || tag.contains("data-original-ext")
}

/// Rewrite all `<img>` tags in an HTML document. Returns the new content
/// and the number of rewritten tags.
fn annotate_html(content: &str, asset_root: &Path) -> (String, usize) {
    let mut rewritten = 0;
    let result = IMG_TAG.replace_all(content, |caps: &Captures| {
        let full_tag = caps.get(0).unwrap().as_str();
        if already_annotated(full_tag) {
            return full_tag.to_string();
        }
        let before = &caps[1];
        let web_path = &caps[2];
        let after = &caps[4];

        let Some(plan) = plan_image(asset_root, web_path) else {
            return full_tag.to_string();
        };
        rewritten += 1;
        format!(
            "<img{}src=\"{}\"{}{}>",
            before,
            plan.main_src,
            after,
            render_attrs(&plan)
        )
    });
    (result.into_owned(), rewritten)
}

/// Rewrite all `url()` references in a stylesheet to the lightest variant.
fn annotate_css(content: &str, asset_root: &Path) -> (String, usize) {
    let mut rewritten = 0;
    let result = CSS_URL.replace_all(content, |caps: &Captures| {
        let full = caps.get(0).unwrap().as_str();
        let web_path = &caps[1];
        let Some(plan) = plan_image(asset_root, web_path) else {
            return full.to_string();
        };
        if plan.main_src == *web_path {
            return full.to_string();
        }
        rewritten += 1;
        full.replace(web_path, &plan.main_src)
    });
    (result.into_owned(), rewritten)
}

/// Annotate every matching file under `dir`, resolving image references
/// against `asset_root`.
pub fn annotate_tree(
    dir: &Path,
    asset_root: &Path,
    config: &AnnotateConfig,
) -> Result<AnnotateReport, AnnotateError> {
    if !dir.is_dir() {
        return Err(AnnotateError::RootNotFound(dir.to_path_buf()));
    }

    let mut report = AnnotateReport::default();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            AnnotateError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walk error")
            }))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if !config.extensions.contains(&ext) {
            continue;
        }

        let content = std::fs::read_to_string(entry.path())?;
        let (new_content, rewritten) = match ext.as_str() {
            "html" | "htm" => annotate_html(&content, asset_root),
            _ => annotate_css(&content, asset_root),
        };

        let changed = new_content != content;
        if changed {
            std::fs::write(entry.path(), &new_content)?;
        }
        report.files.push(FileReport {
            path: entry
                .path()
                .strip_prefix(dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/"),
            changed,
            rewritten,
        });
    }
    Ok(report)
}
