//! # optimg
//!
//! Capability-aware image variant tooling: generate AVIF/WebP variants of
//! your images, point your markup at the lightest one, and resolve the
//! best displayable source at view time with graceful fallback to
//! JPEG/PNG/GIF.
//!
//! # Architecture: Three Cooperating Stages
//!
//! ```text
//! 1. Convert    img/        →  img/webp/, img/avif/   (sibling variants)
//! 2. Annotate   *.html/css  →  lightest src + candidate attributes
//! 3. Resolve    capability  →  per-element source at view time
//! ```
//!
//! The first two stages run at build time as CLI subcommands. The third is
//! a library: a capability probe, a pure path rewriter, a priority
//! selector over declared candidates, and a lazy-reveal state machine that
//! a host environment drives through the [`reveal::RevealHost`] seam. The
//! `check` subcommand drives that same state machine over files on disk to
//! verify a tree end to end.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`capability`] | AVIF/WebP capability probing, memoized per process |
//! | [`rewrite`] | Pure path rewriting to the best variant folder |
//! | [`select`] | Candidate attribute parsing + priority selection |
//! | [`reveal`] | Lazy reveal state machine with placeholder lifecycle |
//! | [`convert`] | Batch variant conversion (walk, encode, cache) |
//! | [`annotate`] | HTML/CSS reference rewriting + candidate attributes |
//! | [`check`] | Reveal pipeline verification over a directory tree |
//! | [`cache`] | Content-addressed conversion cache |
//! | [`config`] | `optimg.toml` loading and validation |
//! | [`imaging`] | Codec backend trait + pure-Rust implementation |
//! | [`output`] | CLI output formatting |
//! | [`format`] | Shared image format enum |
//!
//! # Design Decisions
//!
//! ## Fail-Open Everywhere
//!
//! Every resolution step prefers showing *something* over surfacing an
//! error: an unknown extension passes through the rewriter unchanged, a
//! failed capability probe reads as "unsupported", a failed preload
//! reveals the original path. Nothing in the view-time path returns an
//! error to its caller.
//!
//! ## Explicit Capability Snapshot, No Global
//!
//! Capability detection runs once per process and produces an immutable
//! [`capability::CapabilitySet`] that is passed by reference to every
//! consumer. There is no process-wide mutable singleton to initialize or
//! to race on; tests construct whatever set they need.
//!
//! ## Pure-Rust Imaging (No ImageMagick, No FFmpeg)
//!
//! The [`imaging`] module uses the `image` crate plus `avif-parse`/`rav1d`
//! for AVIF decoding — all pure Rust, statically linked. A user can
//! download a single binary and it just works, on any machine. It also
//! makes the capability probe honest: it exercises the very codecs the
//! converter uses.
//!
//! ## Variants Are Siblings, Not a Mirror Tree
//!
//! A variant lives in a folder named after its format, next to its
//! original (`img/avif/photo.avif`). Paths stay short, relative
//! references in markup keep working, and the rewriter needs no
//! configuration to find a variant — the convention *is* the lookup.

pub mod annotate;
pub mod cache;
pub mod capability;
pub mod check;
pub mod config;
pub mod convert;
pub mod format;
pub mod imaging;
pub mod output;
pub mod reveal;
pub mod rewrite;
pub mod select;
