//! Lazy reveal lifecycle for deferred images.
//!
//! Each registered element moves through a one-way state machine:
//!
//! ```text
//! Pending → Placeholding → Loading → Revealed
//!                                  ↘ FallbackRevealed
//! ```
//!
//! - **Pending**: registered, not yet visible.
//! - **Placeholding**: the element entered the viewport; the host showed a
//!   same-size placeholder and hid the element. Visibility is one-shot —
//!   repeat triggers are ignored.
//! - **Loading**: the deferred source was rewritten to the best variant
//!   path and handed to the host for preloading.
//! - **Revealed**: preload decoded; the element now shows the variant path.
//! - **FallbackRevealed**: preload failed; the element shows the original
//!   declared path. No retry of the variant path.
//!
//! The controller owns no element and performs no I/O. Everything
//! observable goes through the [`RevealHost`] trait: the host delivers
//! visibility events and preload completions, and executes the mutations
//! the controller requests. All calls for one element happen on the host's
//! event thread, so transitions never race.
//!
//! Elements can be unregistered at any time (the host noticed removal).
//! A preload completion arriving after unregistration is ignored — the
//! in-flight load is effectively cancelled.

use crate::capability::CapabilitySet;
use crate::rewrite::rewrite_path;
use std::collections::HashMap;

/// Host-assigned identifier for one observed element.
pub type ElementId = u64;

/// Environment seam: everything the reveal lifecycle needs from its host.
///
/// `start_preload` must not complete synchronously into
/// [`RevealController::finish_load`] from inside the call — completions are
/// separate events on the host's event thread.
pub trait RevealHost {
    /// Insert a same-size placeholder block immediately before the element.
    fn show_placeholder(&mut self, element: ElementId);
    /// Remove the element's placeholder.
    fn remove_placeholder(&mut self, element: ElementId);
    /// Hide the element while its replacement loads.
    fn hide_element(&mut self, element: ElementId);
    /// Restore the element's display (with whatever entrance effect the
    /// host applies).
    fn restore_element(&mut self, element: ElementId);
    /// Overwrite the element's visible source attribute.
    fn set_source(&mut self, element: ElementId, path: &str);
    /// Begin preloading `path` off-tree. The host reports the outcome via
    /// [`RevealController::finish_load`].
    fn start_preload(&mut self, element: ElementId, path: &str);
}

/// Outcome of a preload, reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Decoded,
    Failed,
}

/// Observable state of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealState {
    Pending,
    Placeholding,
    Loading,
    Revealed,
    FallbackRevealed,
}

/// Caller-supplied configuration. The selector and margin/threshold are the
/// host's concern (which elements to register, when to fire visibility);
/// they travel here so one struct describes the whole contract.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealConfig {
    /// CSS selector for elements to observe.
    pub selector: String,
    /// Attribute holding the true deferred path.
    pub source_attribute: String,
    /// Viewport margin at which visibility fires, in pixels.
    pub margin_px: u32,
    /// Intersection ratio required to count as visible.
    pub threshold: f32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: "[data-src]".to_string(),
            source_attribute: "data-src".to_string(),
            margin_px: 50,
            threshold: 0.0,
        }
    }
}

#[derive(Debug)]
struct Entry {
    /// The declared deferred-source path, used verbatim on fallback.
    original: String,
    state: State,
}

#[derive(Debug)]
enum State {
    Pending,
    Placeholding,
    Loading { target: String },
    Revealed,
    FallbackRevealed,
}

/// Drives the reveal lifecycle for every registered element.
pub struct RevealController {
    config: RevealConfig,
    caps: CapabilitySet,
    elements: HashMap<ElementId, Entry>,
}

impl RevealController {
    pub fn new(config: RevealConfig, caps: CapabilitySet) -> Self {
        Self {
            config,
            caps,
            elements: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Register an element with its declared deferred-source path.
    /// Re-registering an id resets it to `Pending`.
    pub fn register(&mut self, element: ElementId, deferred_src: &str) {
        self.elements.insert(
            element,
            Entry {
                original: deferred_src.to_string(),
                state: State::Pending,
            },
        );
    }

    /// Forget an element (it left the document). Any in-flight preload
    /// completion for it will be ignored.
    pub fn unregister(&mut self, element: ElementId) {
        self.elements.remove(&element);
    }

    /// Visibility trigger from the host's intersection watcher.
    ///
    /// One-shot per element: only a `Pending` element reacts. Shows the
    /// placeholder, hides the element, resolves the variant path, and asks
    /// the host to preload it.
    pub fn element_visible(&mut self, element: ElementId, host: &mut dyn RevealHost) {
        let Some(entry) = self.elements.get_mut(&element) else {
            return;
        };
        if !matches!(entry.state, State::Pending) {
            return;
        }

        entry.state = State::Placeholding;
        host.show_placeholder(element);
        host.hide_element(element);

        let target = rewrite_path(&entry.original, &self.caps);
        entry.state = State::Loading {
            target: target.clone(),
        };
        host.start_preload(element, &target);
    }

    /// Preload completion from the host.
    ///
    /// Ignored unless the element is currently `Loading` — late completions
    /// after unregistration or a terminal state are dropped.
    pub fn finish_load(
        &mut self,
        element: ElementId,
        outcome: LoadOutcome,
        host: &mut dyn RevealHost,
    ) {
        let Some(entry) = self.elements.get_mut(&element) else {
            return;
        };
        let State::Loading { target } = &entry.state else {
            return;
        };

        match outcome {
            LoadOutcome::Decoded => {
                let target = target.clone();
                host.set_source(element, &target);
                entry.state = State::Revealed;
            }
            LoadOutcome::Failed => {
                // Variant missing or undecodable: show the original,
                // bypassing format rewriting. No retry.
                let original = entry.original.clone();
                host.set_source(element, &original);
                entry.state = State::FallbackRevealed;
            }
        }
        host.restore_element(element);
        host.remove_placeholder(element);
    }

    /// Observable state of an element, if registered.
    pub fn state(&self, element: ElementId) -> Option<RevealState> {
        self.elements.get(&element).map(|e| match e.state {
            State::Pending => RevealState::Pending,
            State::Placeholding => RevealState::Placeholding,
            State::Loading { .. } => RevealState::Loading,
            State::Revealed => RevealState::Revealed,
            State::FallbackRevealed => RevealState::FallbackRevealed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every host call in order.
    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
    }

    impl RevealHost for RecordingHost {
        fn show_placeholder(&mut self, element: ElementId) {
            self.calls.push(format!("placeholder+ {element}"));
        }
        fn remove_placeholder(&mut self, element: ElementId) {
            self.calls.push(format!("placeholder- {element}"));
        }
        fn hide_element(&mut self, element: ElementId) {
            self.calls.push(format!("hide {element}"));
        }
        fn restore_element(&mut self, element: ElementId) {
            self.calls.push(format!("restore {element}"));
        }
        fn set_source(&mut self, element: ElementId, path: &str) {
            self.calls.push(format!("src {element} {path}"));
        }
        fn start_preload(&mut self, element: ElementId, path: &str) {
            self.calls.push(format!("preload {element} {path}"));
        }
    }

    const AVIF: CapabilitySet = CapabilitySet {
        avif: true,
        webp: true,
    };

    fn controller(caps: CapabilitySet) -> RevealController {
        RevealController::new(RevealConfig::default(), caps)
    }

    #[test]
    fn default_config_matches_attribute_contract() {
        // A host reads the contract back off the controller to set up its
        // observation (selector, margins) and attribute reads.
        let ctl = controller(AVIF);
        let config = ctl.config();
        assert_eq!(config.selector, "[data-src]");
        assert_eq!(config.source_attribute, "data-src");
        assert_eq!(config.margin_px, 50);
        assert_eq!(config.threshold, 0.0);
    }

    #[test]
    fn visibility_shows_placeholder_and_preloads_variant() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "/img/photo.jpg");

        ctl.element_visible(1, &mut host);

        assert_eq!(
            host.calls,
            vec![
                "placeholder+ 1",
                "hide 1",
                "preload 1 /img/avif/photo.avif",
            ]
        );
        assert_eq!(ctl.state(1), Some(RevealState::Loading));
    }

    #[test]
    fn successful_preload_reveals_variant_path() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "/img/photo.jpg");
        ctl.element_visible(1, &mut host);

        ctl.finish_load(1, LoadOutcome::Decoded, &mut host);

        assert_eq!(ctl.state(1), Some(RevealState::Revealed));
        assert_eq!(
            &host.calls[3..],
            &[
                "src 1 /img/avif/photo.avif",
                "restore 1",
                "placeholder- 1",
            ]
        );
    }

    #[test]
    fn failed_preload_falls_back_to_original_path() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "/img/photo.jpg");
        ctl.element_visible(1, &mut host);

        ctl.finish_load(1, LoadOutcome::Failed, &mut host);

        assert_eq!(ctl.state(1), Some(RevealState::FallbackRevealed));
        assert_eq!(
            &host.calls[3..],
            &["src 1 /img/photo.jpg", "restore 1", "placeholder- 1"]
        );
    }

    #[test]
    fn visibility_is_one_shot() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "/img/photo.jpg");

        ctl.element_visible(1, &mut host);
        let after_first = host.calls.len();
        ctl.element_visible(1, &mut host);

        assert_eq!(host.calls.len(), after_first);
    }

    #[test]
    fn no_capability_preloads_original_path() {
        let mut ctl = controller(CapabilitySet::none());
        let mut host = RecordingHost::default();
        ctl.register(7, "img/photo.png");

        ctl.element_visible(7, &mut host);

        assert!(host.calls.contains(&"preload 7 img/photo.png".to_string()));
    }

    #[test]
    fn unknown_element_events_are_ignored() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();

        ctl.element_visible(42, &mut host);
        ctl.finish_load(42, LoadOutcome::Decoded, &mut host);

        assert!(host.calls.is_empty());
        assert_eq!(ctl.state(42), None);
    }

    #[test]
    fn unregister_cancels_in_flight_preload() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "/img/photo.jpg");
        ctl.element_visible(1, &mut host);
        let before = host.calls.len();

        ctl.unregister(1);
        ctl.finish_load(1, LoadOutcome::Decoded, &mut host);

        // No mutation after removal
        assert_eq!(host.calls.len(), before);
        assert_eq!(ctl.state(1), None);
    }

    #[test]
    fn late_completion_after_terminal_state_is_ignored() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "/img/photo.jpg");
        ctl.element_visible(1, &mut host);
        ctl.finish_load(1, LoadOutcome::Failed, &mut host);
        let before = host.calls.len();

        ctl.finish_load(1, LoadOutcome::Decoded, &mut host);

        assert_eq!(host.calls.len(), before);
        assert_eq!(ctl.state(1), Some(RevealState::FallbackRevealed));
    }

    #[test]
    fn elements_progress_independently() {
        let mut ctl = controller(AVIF);
        let mut host = RecordingHost::default();
        ctl.register(1, "a.jpg");
        ctl.register(2, "b.jpg");

        ctl.element_visible(1, &mut host);
        ctl.element_visible(2, &mut host);
        ctl.finish_load(2, LoadOutcome::Decoded, &mut host);

        assert_eq!(ctl.state(1), Some(RevealState::Loading));
        assert_eq!(ctl.state(2), Some(RevealState::Revealed));
    }
}
