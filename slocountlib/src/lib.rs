//! # slocountlib
//!
//! A multi-language source line counter library that separates code,
//! comments, and blank lines.
//!
//! ## Overview
//!
//! Given a set of paths, the library walks them, decides which files are
//! countable source, detects each file's language, and classifies every
//! physical line as:
//!
//! - **Code**: lines containing at least one code token
//! - **Comment**: lines whose only content is comment text
//! - **Blank**: whitespace-only lines
//!
//! A line carrying both code and comment text counts as code. Language
//! detection looks at the exact filename first (`Makefile`,
//! `Dockerfile`), then the shebang line, then the extension; ambiguous
//! extensions like `.h` and `.m` are settled by sniffing the content.
//!
//! ## Features
//!
//! - **Language table**: thirty-plus languages described by data, with
//!   nested block comments and multi-line strings where the language
//!   has them
//! - **String awareness**: comment markers inside string literals never
//!   start a comment
//! - **Duplicate detection**: identical file content is counted once
//! - **Binary filtering**: binary files are detected and skipped
//! - **Parallel counting**: large file sets fan out over a worker pool;
//!   the result is identical to a sequential run
//!
//! ## Example
//!
//! ```rust
//! use slocountlib::{count_paths, CountOptions};
//! use std::fs;
//! use tempfile::tempdir;
//!
//! let dir = tempdir().unwrap();
//! fs::write(
//!     dir.path().join("hello.py"),
//!     "# greet the world\nprint(\"hi\")\n",
//! )
//! .unwrap();
//!
//! let options = CountOptions::new().exclude("**/generated/**");
//! let outcome = count_paths(&[dir.path().to_path_buf()], &options).unwrap();
//! assert_eq!(outcome.report.languages["Python"].counts.code, 1);
//! assert_eq!(outcome.report.languages["Python"].counts.comment, 1);
//! ```

pub mod counter;
pub mod engine;
pub mod error;
pub mod filter;
pub mod language;
pub mod options;
pub mod stats;

pub use counter::count;
pub use engine::{count_file, count_paths, CancelToken, Outcome};
pub use error::SlocountError;
pub use filter::{is_binary, FilterConfig, Scan};
pub use language::{registry, BlockDelims, LanguageSpec, Registry, StringDelims, LANGUAGES};
pub use options::{CountOptions, DEFAULT_MAX_FILE_SIZE};
pub use stats::{
    FileRecord, FileResult, LanguageTally, LineCounts, Report, SkipReason, SkippedFile, SUM,
};

/// Result type for slocountlib operations
pub type Result<T> = std::result::Result<T, SlocountError>;
