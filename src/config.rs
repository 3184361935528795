//! Project manifest lookup for the cleanup configuration.

use crate::patterns::CleanupPattern;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Manifest file consulted at the project root.
pub const MANIFEST_FILE: &str = "package.json";

/// The slice of the manifest we recognize. Everything else in the file is
/// the host build tool's business and is ignored.
#[derive(Debug, Deserialize)]
struct ProjectManifest {
    #[serde(rename = "cleanDistFiles", default)]
    clean_dist_files: Vec<serde_json::Value>,
}

/// Load the `cleanDistFiles` pattern list from the project manifest.
///
/// A missing or unparseable manifest fails the resolution. A missing key or
/// an empty list returns an empty pattern list, which selects default-mode
/// cleanup. Non-string entries are skipped silently.
pub fn load_cleanup_patterns(project_root: &Path) -> Result<Vec<CleanupPattern>> {
    let manifest_path = project_root.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: ProjectManifest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

    Ok(manifest
        .clean_dist_files
        .iter()
        .filter_map(|entry| entry.as_str())
        .map(CleanupPattern::parse)
        .collect())
}
