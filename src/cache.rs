//! Conversion cache for incremental runs.
//!
//! AVIF encoding is the bottleneck of a conversion run — a single large
//! photo can take seconds through rav1e. This module lets the converter
//! skip encoding when the source image and encoding parameters haven't
//! changed since the last run.
//!
//! # Design
//!
//! Lookups are keyed by output path and verified against two hashes:
//!
//! - **`source_hash`**: SHA-256 of the source file contents. Content-based
//!   rather than mtime-based so it survives `git checkout` (which resets
//!   modification times). Computed once per source file and shared across
//!   both its variants.
//! - **`params_hash`**: SHA-256 of the encoding parameters (format,
//!   quality). If the quality setting changes, every AVIF is re-encoded;
//!   WebP entries are unaffected because the lossless encoder ignores it.
//!
//! A cache hit requires a matching entry *and* the output file still
//! existing on disk.
//!
//! The manifest is a JSON file at `<root>/.optimg-cache.json`, living
//! alongside the variant folders so it travels with the tree. Unreadable
//! or version-mismatched manifests load as empty — the worst case is a
//! full re-encode, never a stale variant.
//!
//! Pass `--no-cache` to force re-encoding; the run starts from an empty
//! manifest and overwrites outputs naturally.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Name of the cache manifest file within the scanned root.
const MANIFEST_FILENAME: &str = ".optimg-cache.json";

/// Version of the cache manifest format. Bump to invalidate all existing
/// caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping output paths to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or a first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the scanned root. Returns an empty manifest if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(root: &Path) -> Self {
        let path = root.join(MANIFEST_FILENAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(manifest) if manifest.version == MANIFEST_VERSION => manifest,
            _ => Self::empty(),
        }
    }

    /// Persist to the scanned root.
    pub fn save(&self, root: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(root.join(MANIFEST_FILENAME), json)
    }

    /// Whether `output_path` is up to date for the given hashes.
    pub fn is_hit(
        &self,
        output_key: &str,
        source_hash: &str,
        params_hash: &str,
        output_exists: bool,
    ) -> bool {
        output_exists
            && self.entries.get(output_key).is_some_and(|entry| {
                entry.source_hash == source_hash && entry.params_hash == params_hash
            })
    }

    /// Record a freshly written output.
    pub fn insert(&mut self, output_key: String, source_hash: String, params_hash: String) {
        self.entries.insert(
            output_key,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// SHA-256 of a file's contents, hex-encoded.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let contents = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 over encoding parameters, hex-encoded.
pub fn hash_params(format: &str, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format.as_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}
