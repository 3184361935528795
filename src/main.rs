use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use distsweep::executor::{self, DEFAULT_MAX_CONCURRENT};
use distsweep::resolver::{self, ProtectedSet};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Remove stale files from build output directories after a build completes",
    long_about = None
)]
struct Args {
    /// Project root holding the manifest (defaults to the current directory)
    #[arg(default_value_t = String::from("."))]
    project_root: String,

    /// Output directory the build wrote into (repeatable)
    #[arg(long = "out-dir", short = 'o', required = true, value_name = "DIR")]
    out_dirs: Vec<String>,

    /// File produced by the current build, protected from removal (repeatable)
    #[arg(long, value_name = "PATH")]
    protect: Vec<String>,

    /// File listing protected paths, one per line
    #[arg(long, value_name = "FILE")]
    protect_list: Option<PathBuf>,

    /// Maximum number of delete operations in flight at once
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT, value_name = "N")]
    max_concurrent: usize,

    /// Show what would be removed, but don't delete anything
    #[arg(long)]
    dry_run: bool,

    /// Show each removed path
    #[arg(long, short)]
    verbose: bool,
}

/// Resolve a CLI path against the project root unless it is already absolute.
fn absolutize(path: &str, project_root: &Path) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}

/// Size of a stale path before removal, for the reclaimed-bytes summary.
/// Directories are summed file by file; symlinks are not followed.
fn stale_path_size(path: &Path) -> u64 {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return 0;
    };
    if !metadata.is_dir() {
        return metadata.len();
    }
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|metadata| metadata.is_file())
        .map(|metadata| metadata.len())
        .sum()
}

fn run_cleanup(args: &Args) -> Result<()> {
    let project_root = fs::canonicalize(&args.project_root)
        .with_context(|| format!("project root {} is not accessible", args.project_root))?;

    let mut out_dirs: Vec<PathBuf> = Vec::new();
    for dir in &args.out_dirs {
        let dir = absolutize(dir, &project_root);
        if !out_dirs.contains(&dir) {
            out_dirs.push(dir);
        }
    }

    let mut protected = ProtectedSet::new();
    for path in &args.protect {
        protected.insert(absolutize(path, &project_root));
    }
    if let Some(list) = &args.protect_list {
        let raw = fs::read_to_string(list)
            .with_context(|| format!("failed to read protect list {}", list.display()))?;
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            protected.insert(absolutize(line, &project_root));
        }
    }

    let stale = resolver::resolve(&project_root, &out_dirs, &mut protected)?;

    if stale.is_empty() {
        println!("No stale files found.");
        return Ok(());
    }

    // Sizes are measured before deletion; afterwards there is nothing left
    // to measure.
    let sizes: HashMap<PathBuf, u64> = stale
        .iter()
        .map(|path| (path.clone(), stale_path_size(path)))
        .collect();
    let total_bytes: u64 = sizes.values().sum();

    if args.dry_run {
        for path in &stale {
            println!("Would remove: {}", path.display());
        }
        println!("Dry run mode: no files were deleted.");
        println!(
            "Total Stale Size: {}",
            format_size(total_bytes, BINARY).bold()
        );
        return Ok(());
    }

    let progress = ProgressBar::new(stale.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40} {pos}/{len}")
            .unwrap(),
    );

    let report = executor::remove_stale_files(&stale, args.max_concurrent, Some(&progress));
    progress.finish_and_clear();

    if args.verbose {
        for path in &report.removed {
            println!("Removed: {}", path.display());
        }
    }

    for failure in &report.failures {
        eprintln!(
            "Error removing {} ({}): {}. Skipping.",
            failure.path.display(),
            failure.kind,
            failure.error
        );
    }

    let removed_bytes: u64 = report
        .removed
        .iter()
        .filter_map(|path| sizes.get(path))
        .sum();

    println!("========================================");
    println!(
        "Stale Files Removed: {}",
        report.removed.len().to_string().bold()
    );
    println!(
        "Total Size Removed: {}",
        format_size(removed_bytes, BINARY).bold().red()
    );
    if !report.failures.is_empty() {
        println!(
            "{}",
            format!("{} path(s) could not be removed", report.failures.len()).yellow()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    run_cleanup(&args)
}
