//! File discovery: walking input paths, filtering candidates, and
//! classifying survivors into [`FileRecord`]s.
//!
//! The walk is a single pass in lexicographic order per directory, so
//! duplicate resolution ("first occurrence wins") is deterministic.
//! Per-file problems never abort the walk; they land in the skip
//! ledger with a reason.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::SlocountError;
use crate::language::registry;
use crate::options::CountOptions;
use crate::stats::{FileRecord, SkipReason, SkippedFile};
use crate::Result;

/// How many leading bytes the binary heuristic inspects.
pub const BINARY_PEEK_BYTES: usize = 8192;

/// Fraction of non-text bytes in the peek window above which a file is
/// treated as binary (when no NUL byte settles it first).
pub const BINARY_NON_TEXT_RATIO: f64 = 0.30;

/// How many leading bytes classification sniffing may inspect.
pub const CLASSIFY_PEEK_BYTES: usize = 16 * 1024;

/// Compiled exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    exclude: Vec<Pattern>,
}

impl FilterConfig {
    /// Compile the exclusion globs from `options`. An invalid pattern
    /// is a hard configuration error, raised before any walk begins.
    pub fn from_options(options: &CountOptions) -> Result<Self> {
        let mut exclude = Vec::with_capacity(options.exclude.len());
        for pattern in &options.exclude {
            let compiled = Pattern::new(pattern).map_err(|e| SlocountError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            exclude.push(compiled);
        }
        Ok(Self { exclude })
    }

    /// Check whether a path matches any exclusion pattern.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|p| p.matches(&path_str))
    }
}

/// The outcome of one classifier walk.
#[derive(Debug, Default)]
pub struct Scan {
    /// Classified files, ready for the counting stage
    pub records: Vec<FileRecord>,
    /// Candidates left out, with reasons
    pub skipped: Vec<SkippedFile>,
    /// Readable text files no language claimed
    pub ignored: Vec<PathBuf>,
}

/// Walk `paths` and classify every surviving file.
///
/// Single pass, not restartable: re-invoking re-walks the filesystem.
/// Only configuration problems (invalid globs) return `Err`; missing
/// paths and unreadable files are recorded in the scan's skip ledger.
pub fn collect(paths: &[PathBuf], options: &CountOptions) -> Result<Scan> {
    let filter = FilterConfig::from_options(options)?;
    let mut scan = Scan::default();
    let mut seen_hashes = HashSet::new();

    for path in paths {
        if !path.exists() {
            debug!("input path not found: {}", path.display());
            scan.skipped
                .push(SkippedFile::new(path.clone(), SkipReason::NotFound));
            continue;
        }
        if path.is_symlink() && !options.follow_symlinks {
            scan.skipped
                .push(SkippedFile::new(path.clone(), SkipReason::Symlink));
            continue;
        }
        if path.is_file() {
            consider(path, &filter, options, &mut seen_hashes, &mut scan);
            continue;
        }
        walk_directory(path, &filter, options, &mut seen_hashes, &mut scan);
    }

    debug!(
        "walk complete: {} records, {} skipped, {} unrecognized",
        scan.records.len(),
        scan.skipped.len(),
        scan.ignored.len()
    );
    Ok(scan)
}

/// Directories never worth descending into.
fn should_skip_dir(name: &str) -> bool {
    name.starts_with('.')
}

fn walk_directory(
    root: &Path,
    filter: &FilterConfig,
    options: &CountOptions,
    seen_hashes: &mut HashSet<u64>,
    scan: &mut Scan,
) {
    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name()
        .into_iter();

    for entry in walker.filter_entry(|e| {
        if e.depth() == 0 {
            return true;
        }
        if e.file_type().is_dir() {
            let name = e.file_name().to_str().unwrap_or("");
            return !should_skip_dir(name) && !filter.is_excluded(e.path());
        }
        true
    }) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                warn!("walk error at {}: {e}", path.display());
                scan.skipped.push(SkippedFile::new(
                    path,
                    SkipReason::Unreadable {
                        message: e.to_string(),
                    },
                ));
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        if entry.path_is_symlink() && !options.follow_symlinks {
            scan.skipped.push(SkippedFile::new(
                entry.path().to_path_buf(),
                SkipReason::Symlink,
            ));
            continue;
        }
        consider(entry.path(), filter, options, seen_hashes, scan);
    }
}

/// Apply the per-candidate pipeline: exclusion, size ceiling, binary
/// heuristic, duplicate hash, classification.
fn consider(
    path: &Path,
    filter: &FilterConfig,
    options: &CountOptions,
    seen_hashes: &mut HashSet<u64>,
    scan: &mut Scan,
) {
    if filter.is_excluded(path) {
        scan.skipped
            .push(SkippedFile::new(path.to_path_buf(), SkipReason::Excluded));
        return;
    }

    let size = match path.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!("cannot stat {}: {e}", path.display());
            scan.skipped.push(SkippedFile::new(
                path.to_path_buf(),
                SkipReason::Unreadable {
                    message: e.to_string(),
                },
            ));
            return;
        }
    };
    if size > options.max_file_size {
        debug!("too large: {} ({size} bytes)", path.display());
        scan.skipped.push(SkippedFile::new(
            path.to_path_buf(),
            SkipReason::TooLarge {
                size,
                limit: options.max_file_size,
            },
        ));
        return;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            scan.skipped.push(SkippedFile::new(
                path.to_path_buf(),
                SkipReason::Unreadable {
                    message: e.to_string(),
                },
            ));
            return;
        }
    };

    if is_binary(&bytes) {
        scan.skipped
            .push(SkippedFile::new(path.to_path_buf(), SkipReason::Binary));
        return;
    }

    let peek = &bytes[..bytes.len().min(CLASSIFY_PEEK_BYTES)];
    let Some(language) = registry().classify(path, peek) else {
        scan.ignored.push(path.to_path_buf());
        return;
    };

    // Only classified files participate in dedup, so an unrecognized
    // file never shadows a real source file with the same content.
    let hash = xxh3_64(&bytes);
    if !options.count_duplicates && !seen_hashes.insert(hash) {
        debug!("duplicate content: {}", path.display());
        scan.skipped
            .push(SkippedFile::new(path.to_path_buf(), SkipReason::Duplicate));
        return;
    }

    scan.records.push(FileRecord {
        path: path.to_path_buf(),
        language,
        size,
        hash,
    });
}

/// Binary-content heuristic over a fixed-size prefix: a NUL byte, or a
/// high ratio of non-text bytes, signals binary.
pub fn is_binary(bytes: &[u8]) -> bool {
    let peek = &bytes[..bytes.len().min(BINARY_PEEK_BYTES)];
    if peek.is_empty() {
        return false;
    }
    if memchr::memchr(0, peek).is_some() {
        return true;
    }
    let non_text = peek
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c))
        .count();
    (non_text as f64 / peek.len() as f64) > BINARY_NON_TEXT_RATIO
}
