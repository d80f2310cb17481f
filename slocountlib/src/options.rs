//! Run configuration for counting operations.

use crate::engine::CancelToken;

/// Default ceiling on the size of a single counted file.
///
/// Guards against pathological generated files; override with
/// [`CountOptions::max_file_size`].
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Options controlling a counting run.
#[derive(Debug, Clone)]
pub struct CountOptions {
    /// Glob patterns excluding files or directories by path
    pub exclude: Vec<String>,
    /// Follow symbolic links instead of reporting them as skipped
    pub follow_symlinks: bool,
    /// Skip files larger than this many bytes
    pub max_file_size: u64,
    /// Count files with identical content once per occurrence instead
    /// of only the first
    pub count_duplicates: bool,
    /// Retain per-file results in the report
    pub by_file: bool,
    /// Worker threads for the counting stage; 0 means one per core
    pub jobs: usize,
    /// Cooperative cancellation handle shared with the caller
    pub cancel: CancelToken,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            follow_symlinks: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            count_duplicates: false,
            by_file: false,
            jobs: 0,
            cancel: CancelToken::new(),
        }
    }
}

impl CountOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exclusion glob. Pattern validity is checked when the run
    /// starts, before any filesystem walk.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Follow symbolic links during the walk.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the per-file size ceiling in bytes.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Count duplicate content once per occurrence.
    pub fn count_duplicates(mut self, enabled: bool) -> Self {
        self.count_duplicates = enabled;
        self
    }

    /// Retain per-file results for a per-file breakdown.
    pub fn by_file(mut self) -> Self {
        self.by_file = true;
        self
    }

    /// Set the counting worker count (0 = one per core).
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Attach a cancellation token.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CountOptions::new();
        assert!(options.exclude.is_empty());
        assert!(!options.follow_symlinks);
        assert_eq!(options.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(!options.count_duplicates);
        assert!(!options.by_file);
    }

    #[test]
    fn builder_chains() {
        let options = CountOptions::new()
            .exclude("**/target/**")
            .follow_symlinks(true)
            .max_file_size(1024)
            .count_duplicates(true)
            .by_file()
            .jobs(2);

        assert_eq!(options.exclude, vec!["**/target/**".to_string()]);
        assert!(options.follow_symlinks);
        assert_eq!(options.max_file_size, 1024);
        assert!(options.count_duplicates);
        assert!(options.by_file);
        assert_eq!(options.jobs, 2);
    }
}
