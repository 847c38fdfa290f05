//! Candidate parsing and priority-based source selection.
//!
//! An annotated image element declares up to one candidate per format:
//!
//! ```text
//! data-avif-src="img/avif/photo.avif"  data-avif-priority="1"
//! data-webp-src="img/webp/photo.webp"  data-webp-priority="2"
//! data-jpg-src="img/photo.jpg"         data-jpg-priority="3"
//! ```
//!
//! Selection filters candidates to the formats the capability set supports
//! (fallback formats always pass), stable-sorts ascending by priority, and
//! takes the first. `None` means "no eligible source" — the caller performs
//! no mutation. A missing or unparseable priority gets the [`DEFAULT_PRIORITY`]
//! sentinel so it sorts after every explicitly prioritized candidate.

use crate::capability::CapabilitySet;
use crate::format::{DECLARED_ORDER, Format};
use std::collections::HashMap;

/// Priority assigned when the attribute is missing or unparseable.
/// Sorts after any reasonable explicit priority — "last resort".
pub const DEFAULT_PRIORITY: u32 = 999;

/// One declared (format, path, priority) triple for an image element.
/// Ephemeral — re-derived from attributes each time selection runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSource {
    pub format: Format,
    pub path: String,
    pub priority: u32,
}

/// Parse declared candidate attributes into candidates.
///
/// Formats are walked in [`DECLARED_ORDER`], which fixes the tie-break order
/// for equal priorities. Attributes with an empty path are skipped.
pub fn candidates_from_attrs(attrs: &HashMap<String, String>) -> Vec<CandidateSource> {
    let mut candidates = Vec::new();
    for &format in DECLARED_ORDER {
        let Some(path) = attrs.get(&format.src_attr()) else {
            continue;
        };
        if path.is_empty() {
            continue;
        }
        let priority = attrs
            .get(&format.priority_attr())
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PRIORITY);
        candidates.push(CandidateSource {
            format,
            path: path.clone(),
            priority,
        });
    }
    candidates
}

/// Pick the single best candidate for the given capability set.
///
/// Returns `None` for an empty input or when no candidate survives the
/// capability filter — the caller should leave the element untouched.
pub fn select_best<'a>(
    candidates: &'a [CandidateSource],
    caps: &CapabilitySet,
) -> Option<&'a CandidateSource> {
    let mut eligible: Vec<&CandidateSource> = candidates
        .iter()
        .filter(|c| match c.format {
            Format::Avif => caps.avif,
            Format::Webp => caps.webp,
            _ => c.format.is_fallback(),
        })
        .collect();
    // Stable sort: first-declared wins among equal priorities
    eligible.sort_by_key(|c| c.priority);
    eligible.first().copied()
}
