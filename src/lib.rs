//! DistSweep - post-build cleanup of stale output files.
//!
//! After a build completes, the files a previous build left behind in the
//! output directories are dead weight. DistSweep resolves which paths are
//! stale (pattern resolution over the project's `cleanDistFiles`
//! configuration, with protection for everything the current build just
//! produced) and removes them with a bounded number of delete operations in
//! flight.
//!
//! ## Architecture
//!
//! - Resolution (`resolver`) is read-only and sequential: protect patterns
//!   are applied before removal patterns, matches are clamped to the
//!   declared output directories, and the result is collapsed so a
//!   directory and its descendants are never both scheduled.
//! - Deletion (`executor`) is the only concurrent phase: the resolved set
//!   is drained in chunks sized to the concurrency cap, and individual
//!   failures are collected rather than aborting the queue.

pub mod config;
pub mod executor;
pub mod patterns;
pub mod resolver;

// Re-export commonly used items
pub use config::{load_cleanup_patterns, MANIFEST_FILE};
pub use executor::{
    remove_stale_files, BatchExecutor, RemovalErrorKind, RemovalFailure, RemovalReport,
    DEFAULT_MAX_CONCURRENT,
};
pub use patterns::{is_wildcard, map_companion, CleanupPattern, BUILDABLE_ASSET_EXTS};
pub use resolver::{resolve, ProtectedSet};
