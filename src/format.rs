//! Image format identification.
//!
//! One enum shared by every stage: the rewriter uses the extension set to
//! recognize what it may rewrite, the selector uses the fallback split to
//! decide which candidates are always eligible, and the annotator uses the
//! attribute names to emit `data-<fmt>-src` pairs.
//!
//! Fallback formats (`jpg`, `jpeg`, `png`, `gif`) are the ones every consumer
//! can display — they pass the capability filter unconditionally. `avif` and
//! `webp` are only eligible when the probed [`CapabilitySet`] says so.
//!
//! [`CapabilitySet`]: crate::capability::CapabilitySet

use std::fmt;

/// An image format a candidate source can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Avif,
    Webp,
    Jpg,
    Jpeg,
    Png,
    Gif,
}

/// Declaration order for candidate attributes.
///
/// Candidate parsing walks formats in this order, which makes priority
/// tie-breaks deterministic: for equal priorities, the format declared
/// earlier here wins.
pub const DECLARED_ORDER: &[Format] = &[
    Format::Avif,
    Format::Webp,
    Format::Jpg,
    Format::Jpeg,
    Format::Png,
    Format::Gif,
];

/// Extensions the path rewriter recognizes and may strip.
///
/// SVG is recognized (so `logo.svg` is parsed correctly) but never rewritten
/// to a variant — vector assets have no AVIF/WebP siblings.
pub const RECOGNIZED_EXTENSIONS: &[&str] =
    &["avif", "webp", "jpg", "jpeg", "png", "gif", "svg"];

impl Format {
    /// Parse from an extension or attribute format name (case-insensitive).
    pub fn from_ext(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "avif" => Some(Format::Avif),
            "webp" => Some(Format::Webp),
            "jpg" => Some(Format::Jpg),
            "jpeg" => Some(Format::Jpeg),
            "png" => Some(Format::Png),
            "gif" => Some(Format::Gif),
            _ => None,
        }
    }

    /// Canonical lowercase extension (also the attribute infix:
    /// `data-<ext>-src`).
    pub fn ext(&self) -> &'static str {
        match self {
            Format::Avif => "avif",
            Format::Webp => "webp",
            Format::Jpg => "jpg",
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Gif => "gif",
        }
    }

    /// Attribute name carrying this format's candidate path.
    pub fn src_attr(&self) -> String {
        format!("data-{}-src", self.ext())
    }

    /// Attribute name carrying this format's candidate priority.
    pub fn priority_attr(&self) -> String {
        format!("data-{}-priority", self.ext())
    }

    /// Whether this format is displayable everywhere and therefore bypasses
    /// the capability filter.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Format::Jpg | Format::Jpeg | Format::Png | Format::Gif)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Format::from_ext("AVIF"), Some(Format::Avif));
        assert_eq!(Format::from_ext("Jpg"), Some(Format::Jpg));
        assert_eq!(Format::from_ext("webp"), Some(Format::Webp));
    }

    #[test]
    fn svg_is_recognized_but_not_a_format() {
        assert!(RECOGNIZED_EXTENSIONS.contains(&"svg"));
        assert_eq!(Format::from_ext("svg"), None);
    }

    #[test]
    fn fallback_split() {
        assert!(!Format::Avif.is_fallback());
        assert!(!Format::Webp.is_fallback());
        for f in [Format::Jpg, Format::Jpeg, Format::Png, Format::Gif] {
            assert!(f.is_fallback());
        }
    }

    #[test]
    fn attribute_names() {
        assert_eq!(Format::Webp.src_attr(), "data-webp-src");
        assert_eq!(Format::Jpeg.priority_attr(), "data-jpeg-priority");
    }
}
