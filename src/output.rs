//! CLI output formatting for all subcommands.
//!
//! Each subcommand has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! Output is information-centric: the primary display for every entity is
//! its path relative to the scanned root, with per-variant status shown as
//! indented context lines.
//!
//! ```text
//! gallery/photo.jpg
//!     webp: encoded
//!     avif: cached
//! Converted 2/2 (1 cached)
//! ```

use crate::annotate::AnnotateReport;
use crate::capability::CapabilitySet;
use crate::check::CheckReport;
use crate::convert::{ConvertReport, VariantOutcome};
use crate::reveal::RevealState;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn capability_line(caps: &CapabilitySet) -> String {
    format!(
        "Capabilities: avif={} webp={}",
        if caps.avif { "yes" } else { "no" },
        if caps.webp { "yes" } else { "no" }
    )
}

pub fn format_probe_output(caps: &CapabilitySet) -> Vec<String> {
    vec![capability_line(caps)]
}

pub fn format_convert_output(report: &ConvertReport) -> Vec<String> {
    let mut lines = Vec::new();
    for result in &report.results {
        lines.push(result.source.clone());
        for (format, outcome) in &result.variants {
            let status = match outcome {
                VariantOutcome::Encoded => "encoded".to_string(),
                VariantOutcome::Cached => "cached".to_string(),
                VariantOutcome::Failed(reason) => format!("failed: {reason}"),
            };
            lines.push(format!("{}{}: {}", indent(1), format.ext(), status));
        }
    }
    lines.push(format!(
        "Converted {}/{} ({} cached)",
        report.successful(),
        report.total(),
        report.cached()
    ));
    lines
}

pub fn format_annotate_output(report: &AnnotateReport) -> Vec<String> {
    let mut lines = Vec::new();
    for file in &report.files {
        if file.changed {
            lines.push(format!("{} ({} rewritten)", file.path, file.rewritten));
        } else {
            lines.push(format!("{} (unchanged)", file.path));
        }
    }
    lines.push(format!(
        "Annotated {} of {} files, {} references",
        report.changed_files(),
        report.files.len(),
        report.rewritten_refs()
    ));
    lines
}

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![capability_line(&report.caps)];
    for outcome in &report.outcomes {
        let marker = match outcome.state {
            RevealState::Revealed => "ok",
            RevealState::FallbackRevealed => "fallback",
            _ => "incomplete",
        };
        lines.push(format!(
            "{} -> {} [{}]",
            outcome.source, outcome.displayed, marker
        ));
    }
    lines.push(format!(
        "Checked {} images, {} falling back",
        report.outcomes.len(),
        report.fallbacks()
    ));
    lines
}

pub fn print_probe_output(caps: &CapabilitySet) {
    for line in format_probe_output(caps) {
        println!("{line}");
    }
}

pub fn print_convert_output(report: &ConvertReport) {
    for line in format_convert_output(report) {
        println!("{line}");
    }
}

pub fn print_annotate_output(report: &AnnotateReport) {
    for line in format_annotate_output(report) {
        println!("{line}");
    }
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::FileReport;
    use crate::check::CheckOutcome;
    use crate::convert::SourceResult;
    use crate::imaging::VariantFormat;

    #[test]
    fn convert_output_shows_per_variant_status() {
        let report = ConvertReport {
            results: vec![SourceResult {
                source: "gallery/photo.jpg".into(),
                variants: vec![
                    (VariantFormat::Webp, VariantOutcome::Encoded),
                    (VariantFormat::Avif, VariantOutcome::Cached),
                ],
            }],
        };

        let lines = format_convert_output(&report);
        assert_eq!(lines[0], "gallery/photo.jpg");
        assert_eq!(lines[1], "    webp: encoded");
        assert_eq!(lines[2], "    avif: cached");
        assert_eq!(lines[3], "Converted 2/2 (1 cached)");
    }

    #[test]
    fn convert_output_shows_failures() {
        let report = ConvertReport {
            results: vec![SourceResult {
                source: "a.jpg".into(),
                variants: vec![(
                    VariantFormat::Avif,
                    VariantOutcome::Failed("encode failed".into()),
                )],
            }],
        };

        let lines = format_convert_output(&report);
        assert_eq!(lines[1], "    avif: failed: encode failed");
        assert_eq!(lines[2], "Converted 0/1 (0 cached)");
    }

    #[test]
    fn annotate_output_summary() {
        let report = AnnotateReport {
            files: vec![
                FileReport {
                    path: "index.html".into(),
                    changed: true,
                    rewritten: 3,
                },
                FileReport {
                    path: "style.css".into(),
                    changed: false,
                    rewritten: 0,
                },
            ],
        };

        let lines = format_annotate_output(&report);
        assert_eq!(lines[0], "index.html (3 rewritten)");
        assert_eq!(lines[1], "style.css (unchanged)");
        assert_eq!(lines[2], "Annotated 1 of 2 files, 3 references");
    }

    #[test]
    fn check_output_marks_fallbacks() {
        let report = CheckReport {
            caps: CapabilitySet {
                avif: true,
                webp: true,
            },
            outcomes: vec![
                CheckOutcome {
                    source: "a.jpg".into(),
                    displayed: "avif/a.avif".into(),
                    state: RevealState::Revealed,
                },
                CheckOutcome {
                    source: "b.jpg".into(),
                    displayed: "b.jpg".into(),
                    state: RevealState::FallbackRevealed,
                },
            ],
        };

        let lines = format_check_output(&report);
        assert_eq!(lines[0], "Capabilities: avif=yes webp=yes");
        assert_eq!(lines[1], "a.jpg -> avif/a.avif [ok]");
        assert_eq!(lines[2], "b.jpg -> b.jpg [fallback]");
        assert_eq!(lines[3], "Checked 2 images, 1 falling back");
    }
}
