//! Capability-aware path rewriting.
//!
//! Variant files live in a sibling folder named after their format:
//!
//! ```text
//! img/photo.jpg            # original
//! img/webp/photo.webp      # WebP variant
//! img/avif/photo.avif      # AVIF variant
//! ```
//!
//! [`rewrite_path`] maps an original asset path to the best variant the
//! given [`CapabilitySet`] can display, preferring AVIF over WebP. Paths
//! here are web paths — forward slashes, never `std::path` separators.
//!
//! The function is pure and fail-open: an unrecognized extension, an SVG,
//! or an empty capability set all return the input unchanged. It is also
//! idempotent for the winning format — rewriting `img/avif/photo.avif`
//! under `{avif: true}` yields the same path back.

use crate::capability::CapabilitySet;
use crate::format::RECOGNIZED_EXTENSIONS;

/// Rewrite an asset path to the best-supported variant path.
pub fn rewrite_path(original: &str, caps: &CapabilitySet) -> String {
    let Some((stem_path, ext)) = split_extension(original) else {
        return original.to_string();
    };
    // SVG has no raster variants
    if ext.eq_ignore_ascii_case("svg") {
        return original.to_string();
    }

    let target = if caps.avif {
        "avif"
    } else if caps.webp {
        "webp"
    } else {
        return original.to_string();
    };

    let (dir, stem) = match stem_path.rfind('/') {
        Some(pos) => (&stem_path[..pos], &stem_path[pos + 1..]),
        None => ("", stem_path),
    };

    if dir_ends_with_segment(dir, target) {
        format!("{dir}/{stem}.{target}")
    } else if dir.is_empty() {
        format!("{target}/{stem}.{target}")
    } else {
        format!("{dir}/{target}/{stem}.{target}")
    }
}

/// Split off a recognized image extension (case-insensitive).
///
/// Returns `(path without dot+extension, extension as written)`, or `None`
/// when the path carries no recognized image extension.
fn split_extension(path: &str) -> Option<(&str, &str)> {
    let dot = path.rfind('.')?;
    let ext = &path[dot + 1..];
    // The dot must belong to the filename, not a directory component
    if ext.contains('/') {
        return None;
    }
    RECOGNIZED_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
        .then(|| (&path[..dot], ext))
}

/// Whether `dir`'s final path segment equals `segment`.
fn dir_ends_with_segment(dir: &str, segment: &str) -> bool {
    match dir.rfind('/') {
        Some(pos) => &dir[pos + 1..] == segment,
        None => dir == segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVIF: CapabilitySet = CapabilitySet {
        avif: true,
        webp: true,
    };
    const WEBP_ONLY: CapabilitySet = CapabilitySet {
        avif: false,
        webp: true,
    };
    const NONE: CapabilitySet = CapabilitySet {
        avif: false,
        webp: false,
    };

    #[test]
    fn no_capability_returns_input_unchanged() {
        for path in ["img/photo.jpg", "a/b/c.PNG", "x.gif", "img/avif/p.avif"] {
            assert_eq!(rewrite_path(path, &NONE), path);
        }
    }

    #[test]
    fn avif_preferred_over_webp() {
        assert_eq!(rewrite_path("img/photo.jpg", &AVIF), "img/avif/photo.avif");
    }

    #[test]
    fn webp_when_avif_unsupported() {
        assert_eq!(
            rewrite_path("img/photo.jpg", &WEBP_ONLY),
            "img/webp/photo.webp"
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(
            rewrite_path("img/photo.JPEG", &AVIF),
            "img/avif/photo.avif"
        );
    }

    #[test]
    fn bare_filename_gets_variant_folder() {
        assert_eq!(rewrite_path("photo.png", &AVIF), "avif/photo.avif");
        assert_eq!(rewrite_path("photo.png", &WEBP_ONLY), "webp/photo.webp");
    }

    #[test]
    fn rewrite_is_idempotent_for_winning_format() {
        let once = rewrite_path("img/gallery/photo.jpg", &AVIF);
        assert_eq!(once, "img/gallery/avif/photo.avif");
        assert_eq!(rewrite_path(&once, &AVIF), once);

        let once = rewrite_path("photo.png", &WEBP_ONLY);
        assert_eq!(rewrite_path(&once, &WEBP_ONLY), once);
    }

    #[test]
    fn webp_variant_path_nests_avif_folder() {
        // Only the winning format's folder is idempotent; a webp path under
        // an avif-capable set is treated like any other directory.
        assert_eq!(
            rewrite_path("img/webp/photo.webp", &AVIF),
            "img/webp/avif/photo.avif"
        );
    }

    #[test]
    fn unrecognized_extension_unchanged() {
        assert_eq!(rewrite_path("doc/report.pdf", &AVIF), "doc/report.pdf");
        assert_eq!(rewrite_path("no-extension", &AVIF), "no-extension");
        assert_eq!(rewrite_path("dir.jpg/file", &AVIF), "dir.jpg/file");
    }

    #[test]
    fn svg_never_rewritten() {
        assert_eq!(rewrite_path("icons/logo.svg", &AVIF), "icons/logo.svg");
    }
}
