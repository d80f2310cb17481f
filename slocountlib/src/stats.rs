//! Core data structures: per-file counts, per-language tallies, and the
//! final report.
//!
//! Aggregation is commutative and associative over file results, so the
//! counting stage may produce them in any order (see [`Report::fold`]).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::language::LanguageSpec;

/// Line counts for a single file or an aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineCounts {
    /// Whitespace-only lines
    pub blank: u64,
    /// Full-line comments (line or block)
    pub comment: u64,
    /// Lines containing at least one code token
    pub code: u64,
}

impl LineCounts {
    /// Create new zeroed counts
    pub fn new() -> Self {
        Self::default()
    }

    /// Total physical lines
    pub fn total(&self) -> u64 {
        self.blank + self.comment + self.code
    }
}

impl std::ops::Add for LineCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            blank: self.blank + other.blank,
            comment: self.comment + other.comment,
            code: self.code + other.code,
        }
    }
}

impl std::ops::AddAssign for LineCounts {
    fn add_assign(&mut self, other: Self) {
        self.blank += other.blank;
        self.comment += other.comment;
        self.code += other.code;
    }
}

/// A classified file waiting to be counted.
///
/// Produced by the classifier walk, consumed exactly once by the
/// counting stage. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Path as discovered during the walk
    pub path: PathBuf,
    /// Detected language
    pub language: &'static LanguageSpec,
    /// File size in bytes at classification time
    pub size: u64,
    /// xxh3 digest of the full content, used for duplicate detection
    pub hash: u64,
}

/// Counts for one counted file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    /// The classified file
    pub record: FileRecord,
    /// Blank/comment/code counts
    pub counts: LineCounts,
}

/// Aggregated counts for one language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LanguageTally {
    /// Number of files counted for this language
    pub files: u64,
    /// Summed counts across those files
    #[serde(flatten)]
    pub counts: LineCounts,
}

impl LanguageTally {
    /// Add one file's counts to this tally
    pub fn add(&mut self, counts: LineCounts) {
        self.files += 1;
        self.counts += counts;
    }

    /// Code-to-comment ratio, a derived metric for display only.
    ///
    /// Returns `None` when there are no comment lines.
    pub fn code_comment_ratio(&self) -> Option<f64> {
        if self.counts.comment == 0 {
            None
        } else {
            Some(self.counts.code as f64 / self.counts.comment as f64)
        }
    }
}

/// Why a candidate file was left out of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Input path does not exist
    NotFound,
    /// Symbolic link and symlink following is disabled
    Symlink,
    /// Matched an exclude glob
    Excluded,
    /// Larger than the configured size ceiling
    TooLarge { size: u64, limit: u64 },
    /// Failed the binary-content heuristic
    Binary,
    /// Same content hash as an earlier file
    Duplicate,
    /// Read failed (permissions, vanished mid-walk, I/O error)
    Unreadable { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "path not found"),
            SkipReason::Symlink => write!(f, "symlink (not followed)"),
            SkipReason::Excluded => write!(f, "excluded by pattern"),
            SkipReason::TooLarge { size, limit } => {
                write!(f, "too large ({size} bytes, limit {limit})")
            }
            SkipReason::Binary => write!(f, "binary content"),
            SkipReason::Duplicate => write!(f, "duplicate content"),
            SkipReason::Unreadable { message } => write!(f, "unreadable: {message}"),
        }
    }
}

/// A file that was skipped, with the reason kept for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl SkippedFile {
    pub fn new(path: impl Into<PathBuf>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

/// Name of the synthetic grand-total tally.
pub const SUM: &str = "SUM";

/// The aggregated result of a counting run.
///
/// Built incrementally via [`Report::fold`], frozen by
/// [`Report::finalize`]. Folding is commutative and associative: the
/// finalized report is identical regardless of the order results
/// arrive in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Per-language tallies, keyed by language name
    pub languages: BTreeMap<String, LanguageTally>,
    /// Grand total over all languages, computed by `finalize`
    pub sum: LanguageTally,
    /// Per-file results, retained only when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileResult>,
    #[serde(skip)]
    keep_files: bool,
}

impl Report {
    /// Create an empty report. When `keep_files` is set, every folded
    /// result is retained for a per-file breakdown.
    pub fn new(keep_files: bool) -> Self {
        Self {
            keep_files,
            ..Self::default()
        }
    }

    /// Fold one file result into the running tallies.
    pub fn fold(&mut self, result: FileResult) {
        self.languages
            .entry(result.record.language.name.to_string())
            .or_default()
            .add(result.counts);
        if self.keep_files {
            self.files.push(result);
        }
    }

    /// Freeze the report: recompute the `SUM` tally and sort the
    /// per-file list by path for deterministic output. Idempotent.
    pub fn finalize(&mut self) {
        let mut sum = LanguageTally::default();
        for tally in self.languages.values() {
            sum.files += tally.files;
            sum.counts += tally.counts;
        }
        self.sum = sum;
        self.files.sort_by(|a, b| a.record.path.cmp(&b.record.path));
    }

    /// True when no file contributed to the report.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
