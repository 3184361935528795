//! Stale-set resolution: decide which paths under the build's output
//! directories should be removed.
//!
//! Resolution is read-only. It loads the `cleanDistFiles` pattern list from
//! the project manifest, applies every protect pattern before any removal
//! pattern, and returns the final set of absolute paths to delete. Nothing
//! touches the filesystem beyond directory listings and pattern expansion;
//! the executor applies the result afterwards.

use crate::config;
use crate::patterns::{self, CleanupPattern};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths that must never be deleted: the files the current build produced,
/// plus everything protect patterns contribute during resolution.
///
/// Inserting a buildable asset also inserts its `.map` companion.
#[derive(Debug, Clone, Default)]
pub struct ProtectedSet {
    paths: BTreeSet<PathBuf>,
}

impl ProtectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf) {
        if let Some(companion) = patterns::map_companion(&path) {
            self.paths.insert(companion);
        }
        self.paths.insert(path);
    }

    /// A path is protected if it equals a protected path, lies inside a
    /// protected directory, or contains a protected path beneath it. The
    /// last case keeps a directory alive when anything inside it must
    /// survive. Comparison is path-segment-aware, so sibling names sharing
    /// a prefix (`dist` vs `dist-backup`) never collide.
    pub fn is_protected(&self, path: &Path) -> bool {
        self.paths
            .iter()
            .any(|p| path.starts_with(p) || p.starts_with(path))
    }
}

/// The resolved removal set. Insertion maintains the nesting invariant: no
/// two members ever stand in an ancestor/descendant relationship.
#[derive(Debug, Default)]
struct StaleSet {
    paths: BTreeSet<PathBuf>,
}

impl StaleSet {
    /// Returns false when an ancestor (or the same path) is already
    /// scheduled. Inserting a directory evicts any descendants scheduled
    /// earlier.
    fn insert(&mut self, path: PathBuf) -> bool {
        if self.paths.iter().any(|existing| path.starts_with(existing)) {
            return false;
        }
        self.paths.retain(|existing| !existing.starts_with(&path));
        self.paths.insert(path);
        true
    }

    fn into_paths(self) -> Vec<PathBuf> {
        self.paths.into_iter().collect()
    }
}

/// Check whether a path lies inside (or is) one of the output directories.
/// Paths outside every output directory are never scheduled for removal, no
/// matter what a pattern matches.
fn within_output_dirs(path: &Path, out_dirs: &[PathBuf]) -> bool {
    out_dirs.iter().any(|dir| path.starts_with(dir))
}

/// Schedule a path for removal, along with its `.map` companion when the
/// asset has one that exists on disk and is not itself protected.
fn schedule(stale: &mut StaleSet, path: PathBuf, protected: &ProtectedSet) {
    let companion = patterns::map_companion(&path);
    if !stale.insert(path) {
        return;
    }
    if let Some(map) = companion {
        if map.exists() && !protected.is_protected(&map) {
            stale.insert(map);
        }
    }
}

/// Resolve the set of stale paths to remove.
///
/// `protected` grows while protect patterns are applied; the caller seeds it
/// with the files the current build produced. The returned paths are
/// absolute, deduplicated at directory level, all inside `out_dirs`, and
/// sorted (resolution is deterministic for a given filesystem state).
///
/// Fails only on resolution-time errors: an unreadable or malformed
/// manifest, an invalid pattern, or a failed directory listing in default
/// mode. Nothing is deleted here.
pub fn resolve(
    project_root: &Path,
    out_dirs: &[PathBuf],
    protected: &mut ProtectedSet,
) -> Result<Vec<PathBuf>> {
    let entries = config::load_cleanup_patterns(project_root)?;
    let mut stale = StaleSet::default();

    // Default mode: nothing configured means every output-directory entry
    // that the current build did not produce is stale. Shallow listing only.
    if entries.is_empty() {
        for dir in out_dirs {
            let listing = fs::read_dir(dir)
                .with_context(|| format!("failed to list output directory {}", dir.display()))?;
            for entry in listing {
                let entry = entry
                    .with_context(|| format!("failed to read an entry of {}", dir.display()))?;
                let path = entry.path();
                if !protected.is_protected(&path) {
                    stale.insert(path);
                }
            }
        }
        return Ok(stale.into_paths());
    }

    let mut protect_patterns = Vec::new();
    let mut removal_patterns = Vec::new();
    for pattern in entries {
        match pattern {
            CleanupPattern::Protect(p) => protect_patterns.push(p),
            CleanupPattern::Remove(p) => removal_patterns.push(p),
        }
    }

    // A configuration holding only protect entries still means "clean the
    // output directories"; synthesize the removal patterns it left implicit.
    if removal_patterns.is_empty() {
        for dir in out_dirs {
            let pattern = match dir.strip_prefix(project_root) {
                Ok(rel) => rel.join("**/*"),
                Err(_) => dir.join("**/*"),
            };
            removal_patterns.push(pattern.to_string_lossy().into_owned());
        }
    }

    // Protect patterns populate the protected set before any removal
    // pattern is expanded; a protect entry can never lose to an earlier
    // removal entry.
    for pattern in &protect_patterns {
        for path in patterns::expand(project_root, pattern)? {
            if within_output_dirs(&path, out_dirs) {
                protected.insert(path);
            }
        }
    }

    for pattern in &removal_patterns {
        if patterns::is_wildcard(pattern) {
            for path in patterns::expand(project_root, pattern)? {
                if protected.is_protected(&path) || !within_output_dirs(&path, out_dirs) {
                    continue;
                }
                schedule(&mut stale, path, protected);
            }
        } else {
            // Literal paths are scheduled without an existence check; the
            // executor treats an already-missing path as removed.
            let path = project_root.join(pattern);
            if within_output_dirs(&path, out_dirs) && !protected.is_protected(&path) {
                schedule(&mut stale, path, protected);
            }
        }
    }

    Ok(stale.into_paths())
}
