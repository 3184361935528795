//! Cleanup pattern parsing and filesystem expansion.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// Extensions of buildable assets that carry a `.map` companion file.
pub const BUILDABLE_ASSET_EXTS: &[&str] = &["js", "css"];

/// A single entry from the `cleanDistFiles` configuration list.
///
/// A leading `!` marks paths to protect from removal; everything else marks
/// paths eligible for removal. Either form may be a literal relative path or
/// a wildcard pattern (recursive wildcards included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupPattern {
    Protect(String),
    Remove(String),
}

impl CleanupPattern {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('!') {
            Some(rest) => CleanupPattern::Protect(rest.to_string()),
            None => CleanupPattern::Remove(raw.to_string()),
        }
    }
}

/// Check whether a pattern contains wildcard syntax and needs filesystem
/// expansion, as opposed to naming a literal path.
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Source-map companion for a buildable asset (`app.js` -> `app.js.map`).
/// Returns `None` for paths without a buildable-asset extension.
pub fn map_companion(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;
    if !BUILDABLE_ASSET_EXTS.contains(&ext) {
        return None;
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".map");
    Some(PathBuf::from(name))
}

/// Expand a pattern against the filesystem, rooted at the project root.
///
/// Files and directories are both eligible matches. Literal patterns are
/// valid globs matching themselves, so protect entries like `!dist/keep.txt`
/// expand the same way wildcard entries do. The root itself is escaped so
/// that wildcard characters in the project path match literally.
///
/// An invalid pattern is a configuration error and fails the resolution;
/// entries the walk cannot read are skipped with a warning.
pub fn expand(project_root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        format!(
            "{}/{}",
            Pattern::escape(&project_root.to_string_lossy()),
            pattern
        )
    };

    let matches =
        glob::glob(&full).with_context(|| format!("invalid cleanup pattern `{pattern}`"))?;

    let mut paths = Vec::new();
    for entry in matches {
        match entry {
            Ok(path) => paths.push(path),
            Err(err) => {
                eprintln!(
                    "Warning: failed to read {} while expanding `{}`: {}",
                    err.path().display(),
                    pattern,
                    err
                );
            }
        }
    }

    Ok(paths)
}
