//! Reveal-pipeline verification over a directory tree.
//!
//! `check` answers the question a browser would otherwise answer one
//! visitor at a time: for every source image under a root, which path
//! would actually be shown? It drives the real
//! [`RevealController`](crate::reveal::RevealController) through a
//! filesystem host — visibility events are synthesized in walk order and
//! preloads are real decode attempts — and reports the terminal state per
//! image:
//!
//! - **Revealed**: the capability-rewritten variant exists and decodes.
//! - **FallbackRevealed**: the variant is missing or undecodable, so the
//!   original path would be shown. Usually means `optimg convert` hasn't
//!   run (or failed) for that image.

use crate::capability::CapabilitySet;
use crate::convert::find_images;
use crate::imaging::ImageBackend;
use crate::reveal::{
    ElementId, LoadOutcome, RevealConfig, RevealController, RevealHost, RevealState,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Directory not found: {0}")]
    RootNotFound(PathBuf),
}

/// Terminal result for one image.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Original path relative to the root, forward slashes.
    pub source: String,
    /// Path the element would end up displaying.
    pub displayed: String,
    pub state: RevealState,
}

/// Result of a check run.
#[derive(Debug)]
pub struct CheckReport {
    pub caps: CapabilitySet,
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn fallbacks(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == RevealState::FallbackRevealed)
            .count()
    }
}

/// Host that maps element mutations onto plain bookkeeping and records the
/// preload request instead of performing it, so the caller can complete it
/// as a separate step (preloads must not complete synchronously).
#[derive(Default)]
struct FsHost {
    pending_preload: Option<(ElementId, String)>,
    displayed: HashMap<ElementId, String>,
    placeholders: HashMap<ElementId, bool>,
}

impl RevealHost for FsHost {
    fn show_placeholder(&mut self, element: ElementId) {
        self.placeholders.insert(element, true);
    }
    fn remove_placeholder(&mut self, element: ElementId) {
        self.placeholders.insert(element, false);
    }
    fn hide_element(&mut self, _element: ElementId) {}
    fn restore_element(&mut self, _element: ElementId) {}
    fn set_source(&mut self, element: ElementId, path: &str) {
        self.displayed.insert(element, path.to_string());
    }
    fn start_preload(&mut self, element: ElementId, path: &str) {
        self.pending_preload = Some((element, path.to_string()));
    }
}

/// Run the reveal lifecycle over every source image under `root`.
pub fn check_tree(
    backend: &impl ImageBackend,
    root: &Path,
    caps: CapabilitySet,
) -> Result<CheckReport, CheckError> {
    if !root.is_dir() {
        return Err(CheckError::RootNotFound(root.to_path_buf()));
    }

    let mut controller = RevealController::new(RevealConfig::default(), caps);
    let mut host = FsHost::default();
    let mut outcomes = Vec::new();

    for (idx, source) in find_images(root).iter().enumerate() {
        let element = idx as ElementId;
        let web_path = source
            .strip_prefix(root)
            .unwrap_or(source)
            .to_string_lossy()
            .replace('\\', "/");

        controller.register(element, &web_path);
        controller.element_visible(element, &mut host);

        let Some((el, target)) = host.pending_preload.take() else {
            continue;
        };
        let outcome = if backend.decode_check(&root.join(&target)).is_ok() {
            LoadOutcome::Decoded
        } else {
            LoadOutcome::Failed
        };
        controller.finish_load(el, outcome, &mut host);

        let state = controller
            .state(element)
            .unwrap_or(RevealState::FallbackRevealed);
        let displayed = host
            .displayed
            .get(&element)
            .cloned()
            .unwrap_or_else(|| web_path.clone());
        debug_assert_eq!(host.placeholders.get(&element), Some(&false));
        outcomes.push(CheckOutcome {
            source: web_path,
            displayed,
            state,
        });
    }

    Ok(CheckReport { caps, outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "bytes").unwrap();
    }

    const AVIF: CapabilitySet = CapabilitySet {
        avif: true,
        webp: true,
    };

    #[test]
    fn variant_present_reveals_variant_path() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("img/photo.jpg"));
        touch(&tmp.path().join("img/avif/photo.avif"));
        let backend = MockBackend::new();

        let report = check_tree(&backend, tmp.path(), AVIF).unwrap();

        assert_eq!(report.outcomes.len(), 1);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.state, RevealState::Revealed);
        assert_eq!(outcome.displayed, "img/avif/photo.avif");
        assert_eq!(report.fallbacks(), 0);
    }

    #[test]
    fn missing_variant_falls_back_to_original() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("img/photo.jpg"));
        let avif_path = tmp.path().join("img/avif/photo.avif");
        let backend = MockBackend::failing_on(&[&avif_path.to_string_lossy()]);

        let report = check_tree(&backend, tmp.path(), AVIF).unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.state, RevealState::FallbackRevealed);
        assert_eq!(outcome.displayed, "img/photo.jpg");
        assert_eq!(report.fallbacks(), 1);
    }

    #[test]
    fn no_capability_checks_original_only() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("photo.png"));
        let backend = MockBackend::new();

        let report = check_tree(&backend, tmp.path(), CapabilitySet::none()).unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.state, RevealState::Revealed);
        assert_eq!(outcome.displayed, "photo.png");
    }

    #[test]
    fn missing_root_errors() {
        let backend = MockBackend::new();
        assert!(matches!(
            check_tree(&backend, Path::new("/nonexistent"), AVIF),
            Err(CheckError::RootNotFound(_))
        ));
    }
}
