//! Bounded-concurrency deletion of the resolved stale set.
//!
//! Delete operations are grouped into chunks sized to the concurrency cap;
//! a chunk's operations run concurrently and chunks run sequentially, so no
//! more than the cap is ever in flight. This bounds open file handles and
//! filesystem contention when a build leaves thousands of stale files
//! behind. A single failed operation never aborts the rest of the queue.

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default cap on simultaneously in-flight delete operations.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Runs a queue of deferred operations with a fixed cap on how many execute
/// at once. Constructed fresh per cleanup invocation; there is no shared
/// process-wide queue.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    max_concurrent: usize,
}

impl BatchExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Drain the whole queue, at most `max_concurrent` operations at a
    /// time. Results come back in submission order.
    pub fn execute<T, F>(&self, ops: Vec<F>) -> Vec<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let mut results = Vec::with_capacity(ops.len());
        let mut queue = ops.into_iter();
        loop {
            let batch: Vec<F> = queue.by_ref().take(self.max_concurrent).collect();
            if batch.is_empty() {
                break;
            }
            results.extend(batch.into_par_iter().map(|op| op()).collect::<Vec<T>>());
        }
        results
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

/// Why a single removal failed. `NotFound` never appears here: a path that
/// is already gone counts as removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalErrorKind {
    PermissionDenied,
    NotEmpty,
    Io,
}

impl std::fmt::Display for RemovalErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalErrorKind::PermissionDenied => write!(f, "permission denied"),
            RemovalErrorKind::NotEmpty => write!(f, "directory not empty"),
            RemovalErrorKind::Io => write!(f, "I/O error"),
        }
    }
}

/// One path that could not be removed, with the classified cause.
#[derive(Debug)]
pub struct RemovalFailure {
    pub path: PathBuf,
    pub kind: RemovalErrorKind,
    pub error: io::Error,
}

/// Outcome of draining the removal queue. Failures are individually
/// attributable and non-fatal; the queue always runs to completion.
#[derive(Debug, Default)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<RemovalFailure>,
}

fn classify(error: &io::Error) -> RemovalErrorKind {
    match error.kind() {
        io::ErrorKind::PermissionDenied => RemovalErrorKind::PermissionDenied,
        io::ErrorKind::DirectoryNotEmpty => RemovalErrorKind::NotEmpty,
        _ => RemovalErrorKind::Io,
    }
}

/// Remove a single path: directories recursively, files directly. A path
/// that no longer exists at any step counts as removed.
fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Delete every path in the stale set, at most `max_concurrent` operations
/// in flight, ticking `progress` as operations complete. Returns once the
/// queue is fully drained.
pub fn remove_stale_files(
    paths: &[PathBuf],
    max_concurrent: usize,
    progress: Option<&ProgressBar>,
) -> RemovalReport {
    let executor = BatchExecutor::new(max_concurrent);

    let ops: Vec<_> = paths
        .iter()
        .map(|path| {
            let path = path.clone();
            move || {
                let result = remove_path(&path);
                if let Some(bar) = progress {
                    bar.inc(1);
                }
                (path, result)
            }
        })
        .collect();

    let mut report = RemovalReport::default();
    for (path, result) in executor.execute(ops) {
        match result {
            Ok(()) => report.removed.push(path),
            Err(error) => report.failures.push(RemovalFailure {
                path,
                kind: classify(&error),
                error,
            }),
        }
    }
    report
}
