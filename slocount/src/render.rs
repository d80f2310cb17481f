//! Table, CSV and JSON rendering for CLI output

use console::Style;
use slocountlib::{LanguageTally, Outcome, Report, SkippedFile, SUM};
use std::path::{Path, PathBuf};

/// Width of the name column in language tables
const NAME_WIDTH: usize = 22;
/// Width of the name column in per-file tables
const FILE_NAME_WIDTH: usize = 60;
/// Width of each numeric column
const CELL_WIDTH: usize = 10;

/// Truncate a name to fit within max_len, adding ".." prefix if needed
fn truncate_name(name: &str, max_len: usize) -> String {
    if name.len() > max_len {
        format!("..{}", &name[name.len() - max_len + 2..])
    } else {
        name.to_string()
    }
}

/// Convert a path to a relative path from the base directory.
fn make_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string())
}

/// Language rows ordered for display: most code first, name breaks ties.
fn sorted_languages(report: &Report) -> Vec<(&str, &LanguageTally)> {
    let mut rows: Vec<(&str, &LanguageTally)> = report
        .languages
        .iter()
        .map(|(name, tally)| (name.as_str(), tally))
        .collect();
    rows.sort_by(|a, b| b.1.counts.code.cmp(&a.1.counts.code).then(a.0.cmp(b.0)));
    rows
}

fn format_row(name: &str, name_width: usize, tally: &LanguageTally) -> String {
    format!(
        "{:<name_width$} {:>CELL_WIDTH$} {:>CELL_WIDTH$} {:>CELL_WIDTH$} {:>CELL_WIDTH$}",
        truncate_name(name, name_width),
        tally.files,
        tally.counts.blank,
        tally.counts.comment,
        tally.counts.code,
    )
}

fn table_header(name_header: &str, name_width: usize) -> (String, String) {
    let header = format!(
        "{:<name_width$} {:>CELL_WIDTH$} {:>CELL_WIDTH$} {:>CELL_WIDTH$} {:>CELL_WIDTH$}",
        name_header, "Files", "Blank", "Comment", "Code",
    );
    let separator = "-".repeat(name_width + (CELL_WIDTH + 1) * 4);
    (header, separator)
}

/// Render the per-language table with the SUM footer
pub fn render_table(report: &Report) -> String {
    let bold = Style::new().bold();
    let (header, separator) = table_header("Language", NAME_WIDTH);

    let mut output = String::new();
    output.push_str(&format!("{}\n", bold.apply_to(&header)));
    output.push_str(&separator);
    output.push('\n');

    for (name, tally) in sorted_languages(report) {
        output.push_str(&format_row(name, NAME_WIDTH, tally));
        output.push('\n');
    }

    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!(
        "{}\n",
        bold.apply_to(format_row(SUM, NAME_WIDTH, &report.sum))
    ));
    output
}

/// Render the per-file table with the SUM footer
pub fn render_by_file_table(report: &Report, base_path: &Path) -> String {
    let bold = Style::new().bold();
    let (header, separator) = table_header("File", FILE_NAME_WIDTH);

    let mut output = String::new();
    output.push_str(&format!("{}\n", bold.apply_to(&header)));
    output.push_str(&separator);
    output.push('\n');

    for result in &report.files {
        let name = make_relative(&result.record.path, base_path);
        let row = LanguageTally {
            files: 1,
            counts: result.counts,
        };
        output.push_str(&format_row(&name, FILE_NAME_WIDTH, &row));
        output.push('\n');
    }

    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!(
        "{}\n",
        bold.apply_to(format_row(SUM, FILE_NAME_WIDTH, &report.sum))
    ));
    output
}

/// Render the report as CSV
pub fn render_csv(report: &Report, by_file: bool, base_path: &Path) -> String {
    let mut output = String::new();

    if by_file {
        output.push_str("file,language,blank,comment,code\n");
        for result in &report.files {
            output.push_str(&format!(
                "\"{}\",\"{}\",{},{},{}\n",
                make_relative(&result.record.path, base_path),
                result.record.language.name,
                result.counts.blank,
                result.counts.comment,
                result.counts.code,
            ));
        }
        return output;
    }

    output.push_str("language,files,blank,comment,code\n");
    let format_tally = |name: &str, tally: &LanguageTally| -> String {
        format!(
            "\"{}\",{},{},{},{}\n",
            name, tally.files, tally.counts.blank, tally.counts.comment, tally.counts.code
        )
    };
    for (name, tally) in sorted_languages(report) {
        output.push_str(&format_tally(name, tally));
    }
    output.push_str(&format_tally(SUM, &report.sum));
    output
}

/// Render the full outcome as pretty JSON
pub fn render_json(outcome: &Outcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}

/// Render the skip ledger, one file per line with its reason
pub fn render_skipped(skipped: &[SkippedFile], ignored: &[PathBuf], base_path: &Path) -> String {
    let mut output = String::new();
    for skip in skipped {
        output.push_str(&format!(
            "skipped {}: {}\n",
            make_relative(&skip.path, base_path),
            skip.reason
        ));
    }
    for path in ignored {
        output.push_str(&format!(
            "ignored {}: no language recognized\n",
            make_relative(path, base_path)
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use slocountlib::{registry, FileRecord, FileResult, LineCounts, SkipReason};

    fn result(lang: &str, path: &str, blank: u64, comment: u64, code: u64) -> FileResult {
        FileResult {
            record: FileRecord {
                path: PathBuf::from(path),
                language: registry().by_name(lang).unwrap(),
                size: 0,
                hash: 0,
            },
            counts: LineCounts {
                blank,
                comment,
                code,
            },
        }
    }

    fn sample_report() -> Report {
        let mut report = Report::new(false);
        report.fold(result("Python", "a.py", 1, 2, 4));
        report.fold(result("Python", "b.py", 2, 2, 6));
        report.fold(result("Rust", "lib.rs", 1, 2, 20));
        report.finalize();
        report
    }

    #[test]
    fn table_orders_by_code_descending() {
        let output = render_table(&sample_report());
        let rust = output.find("Rust").unwrap();
        let python = output.find("Python").unwrap();
        assert!(rust < python);
        assert!(output.contains(SUM));
    }

    #[test]
    fn csv_has_header_rows_and_sum() {
        let output = render_csv(&sample_report(), false, Path::new("/"));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "language,files,blank,comment,code");
        assert_eq!(lines[1], "\"Rust\",1,1,2,20");
        assert_eq!(lines[2], "\"Python\",2,3,4,10");
        assert_eq!(lines[3], "\"SUM\",3,4,6,30");
    }

    #[test]
    fn truncation_keeps_the_tail() {
        assert_eq!(truncate_name("short", 10), "short");
        assert_eq!(truncate_name("abcdefghij", 8), "..efghij");
    }

    #[test]
    fn skipped_ledger_lists_reasons() {
        let skipped = vec![SkippedFile::new("/base/a.bin", SkipReason::Binary)];
        let ignored = vec![PathBuf::from("/base/notes.txt")];
        let output = render_skipped(&skipped, &ignored, Path::new("/base"));
        assert!(output.contains("skipped a.bin: binary content"));
        assert!(output.contains("ignored notes.txt: no language recognized"));
    }
}
