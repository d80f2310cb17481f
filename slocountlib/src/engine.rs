//! The counting pipeline: classifier walk, parallel counting stage,
//! and aggregation.
//!
//! Counting one file is a pure function, so the counting stage fans
//! out over a rayon pool; results fold into the report afterwards,
//! which is safe in any order because folding is commutative and
//! associative (see [`crate::stats::Report`]).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;

use crate::counter;
use crate::error::SlocountError;
use crate::filter;
use crate::language::registry;
use crate::options::CountOptions;
use crate::stats::{FileRecord, FileResult, Report, SkipReason, SkippedFile};
use crate::Result;

/// Below this many files the counting stage stays sequential; the
/// pool setup costs more than it saves.
const PARALLEL_THRESHOLD: usize = 10;

/// Cooperative cancellation handle.
///
/// Cancelling stops the pipeline from dispatching new files; in-flight
/// counts drain and the partial report is still finalized.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything a counting run produces: the report plus the ledgers of
/// files that did not contribute to it.
#[derive(Debug, Default, serde::Serialize)]
pub struct Outcome {
    /// Per-language tallies with the SUM total
    pub report: Report,
    /// Files skipped during the walk or the counting stage, with reasons
    pub skipped: Vec<SkippedFile>,
    /// Readable text files no language claimed
    pub ignored: Vec<PathBuf>,
}

/// What the counting stage produced for one record.
enum Counted {
    Done(FileResult),
    Skipped(SkippedFile),
}

/// Count every countable file under `paths`.
///
/// Errors only on configuration problems (invalid exclude globs,
/// unbuildable worker pool). Nonexistent inputs and unreadable files
/// are recorded in [`Outcome::skipped`]; a run that matched nothing
/// returns an empty report, not an error.
pub fn count_paths(paths: &[PathBuf], options: &CountOptions) -> Result<Outcome> {
    let scan = filter::collect(paths, options)?;
    let mut skipped = scan.skipped;

    let record_count = scan.records.len();
    let results = if record_count < PARALLEL_THRESHOLD || options.jobs == 1 {
        count_sequential(scan.records, options)
    } else {
        count_parallel(scan.records, options)?
    };

    let mut report = Report::new(options.by_file);
    for counted in results {
        match counted {
            Counted::Done(result) => report.fold(result),
            Counted::Skipped(skip) => skipped.push(skip),
        }
    }
    report.finalize();

    debug!(
        "counted {} of {record_count} files in {} languages",
        report.sum.files,
        report.languages.len()
    );
    Ok(Outcome {
        report,
        skipped,
        ignored: scan.ignored,
    })
}

fn count_sequential(records: Vec<FileRecord>, options: &CountOptions) -> Vec<Counted> {
    records
        .into_iter()
        .filter_map(|record| count_record(record, &options.cancel))
        .collect()
}

fn count_parallel(records: Vec<FileRecord>, options: &CountOptions) -> Result<Vec<Counted>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()
        .map_err(|e| SlocountError::InvalidConfig(format!("worker pool: {e}")))?;

    let cancel = &options.cancel;
    Ok(pool.install(|| {
        records
            .into_par_iter()
            .filter_map(|record| count_record(record, cancel))
            .collect()
    }))
}

/// Count one classified file. Returns `None` when cancellation was
/// requested before this file was dispatched.
fn count_record(record: FileRecord, cancel: &CancelToken) -> Option<Counted> {
    if cancel.is_cancelled() {
        return None;
    }

    // The walk read the file once for hashing; re-reading here keeps
    // records small and bounds memory to one file per worker. A file
    // that vanished in between becomes a skip record like any other
    // read failure.
    let bytes = match std::fs::read(&record.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("read failed while counting {}: {e}", record.path.display());
            return Some(Counted::Skipped(SkippedFile::new(
                record.path,
                SkipReason::Unreadable {
                    message: e.to_string(),
                },
            )));
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let counts = counter::count(&text, record.language);
    Some(Counted::Done(FileResult { record, counts }))
}

/// Classify and count a single file.
///
/// Returns `Ok(None)` when no language claims the file. Unlike
/// [`count_paths`], a read failure here is an error: the caller named
/// this exact file.
pub fn count_file(path: impl AsRef<Path>) -> Result<Option<FileResult>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| SlocountError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let peek = &bytes[..bytes.len().min(filter::CLASSIFY_PEEK_BYTES)];
    let Some(language) = registry().classify(path, peek) else {
        return Ok(None);
    };

    let text = String::from_utf8_lossy(&bytes);
    let counts = counter::count(&text, language);
    Ok(Some(FileResult {
        record: FileRecord {
            path: path.to_path_buf(),
            language,
            size: bytes.len() as u64,
            hash: xxhash_rust::xxh3::xxh3_64(&bytes),
        },
        counts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn counts_a_mixed_directory() {
        let temp = tempdir().unwrap();
        write(temp.path(), "app.py", "# setup\nx = 1\n\n");
        write(temp.path(), "index.js", "// entry\nlet x = 1;\n");

        let options = CountOptions::new().by_file();
        let outcome = count_paths(&[temp.path().to_path_buf()], &options).unwrap();

        let report = &outcome.report;
        assert_eq!(report.languages.len(), 2);
        assert_eq!(report.languages["Python"].files, 1);
        assert_eq!(report.languages["JavaScript"].files, 1);
        assert_eq!(report.files.len(), 2);

        assert_eq!(report.sum.files, 2);
        assert_eq!(report.sum.counts.blank, 1);
        assert_eq!(report.sum.counts.comment, 2);
        assert_eq!(report.sum.counts.code, 2);
    }

    #[test]
    fn nonexistent_input_is_success_with_empty_report() {
        let outcome =
            count_paths(&[PathBuf::from("/no/such/path")], &CountOptions::new()).unwrap();
        assert!(outcome.report.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::NotFound);
    }

    #[test]
    fn empty_directory_is_success_with_empty_report() {
        let temp = tempdir().unwrap();
        let outcome = count_paths(&[temp.path().to_path_buf()], &CountOptions::new()).unwrap();
        assert!(outcome.report.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn duplicate_content_counted_once_by_default() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.py", "x = 1\n");
        write(temp.path(), "b.py", "x = 1\n");

        let outcome = count_paths(&[temp.path().to_path_buf()], &CountOptions::new()).unwrap();
        assert_eq!(outcome.report.languages["Python"].files, 1);

        let options = CountOptions::new().count_duplicates(true);
        let outcome = count_paths(&[temp.path().to_path_buf()], &options).unwrap();
        assert_eq!(outcome.report.languages["Python"].files, 2);
        assert_eq!(outcome.report.languages["Python"].counts.code, 2);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let temp = tempdir().unwrap();
        for i in 0..24 {
            write(
                temp.path(),
                &format!("f{i:02}.py"),
                &format!("# file {i}\nx = {i}\n\n"),
            );
        }

        let sequential =
            count_paths(&[temp.path().to_path_buf()], &CountOptions::new().jobs(1)).unwrap();
        let parallel =
            count_paths(&[temp.path().to_path_buf()], &CountOptions::new().jobs(4)).unwrap();

        assert_eq!(sequential.report.languages, parallel.report.languages);
        assert_eq!(sequential.report.sum, parallel.report.sum);
    }

    #[test]
    fn cancelled_run_finalizes_partial_report() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a.py", "x = 1\n");

        let token = CancelToken::new();
        token.cancel();
        let options = CountOptions::new().cancel_token(token);
        let outcome = count_paths(&[temp.path().to_path_buf()], &options).unwrap();

        // Nothing was dispatched after cancellation, but the run still
        // completed and produced a (here empty) finalized report.
        assert!(outcome.report.is_empty());
    }

    #[test]
    fn count_file_on_unrecognized_returns_none() {
        let temp = tempdir().unwrap();
        write(temp.path(), "notes.txt", "plain text\n");
        let result = count_file(temp.path().join("notes.txt")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn count_file_counts() {
        let temp = tempdir().unwrap();
        write(temp.path(), "lib.rs", "// doc\nfn f() {}\n\n");
        let result = count_file(temp.path().join("lib.rs")).unwrap().unwrap();
        assert_eq!(result.record.language.name, "Rust");
        assert_eq!(result.counts.comment, 1);
        assert_eq!(result.counts.code, 1);
        assert_eq!(result.counts.blank, 1);
    }

    #[test]
    fn count_file_missing_is_an_error() {
        assert!(count_file("/no/such/file.rs").is_err());
    }

    #[test]
    fn golden_mixed_language_tree() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        write(
            temp.path(),
            "src/main.c",
            "#include <stdio.h>\n\n/* entry\n   point */\nint main(void) {\n    return 0; // ok\n}\n",
        );
        write(temp.path(), "build.sh", "#!/bin/sh\n# build it\ncc src/main.c\n");
        write(temp.path(), "README", "not source\n");

        let outcome = count_paths(&[temp.path().to_path_buf()], &CountOptions::new()).unwrap();
        let report = &outcome.report;

        let c = &report.languages["C"];
        assert_eq!((c.counts.blank, c.counts.comment, c.counts.code), (1, 2, 4));

        let sh = &report.languages["Bourne Shell"];
        assert_eq!(
            (sh.counts.blank, sh.counts.comment, sh.counts.code),
            (0, 1, 2)
        );

        assert_eq!(report.sum.files, 2);
        assert_eq!(outcome.ignored.len(), 1);
    }
}
