//! # slocount
//!
//! A CLI tool for counting source lines of code across languages.
//!
//! ## Overview
//!
//! slocount is built on top of slocountlib and provides a command-line
//! interface for measuring codebases. It walks the given paths, detects
//! each file's language, and reports blank, comment, and code lines per
//! language with a grand total.
//!
//! ## Usage
//!
//! ```bash
//! # Count the current directory
//! slocount .
//!
//! # Exclude generated code
//! slocount . --exclude "**/generated/**" --exclude "**/vendor/**"
//!
//! # Per-file breakdown
//! slocount src --by-file
//!
//! # Machine-readable output
//! slocount . --output json
//! slocount . --output csv
//!
//! # Show why files were left out
//! slocount . --skipped
//! ```

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use slocountlib::{count_paths, CountOptions, Outcome};

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("slocount")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Count blank, comment, and code lines across languages")
        .arg(
            Arg::new("paths")
                .help("Files or directories to count (defaults to current directory)")
                .action(ArgAction::Append)
                .default_value("."),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .action(ArgAction::Append)
                .help("Exclude files matching glob pattern (can be repeated)"),
        )
        .arg(
            Arg::new("follow-symlinks")
                .long("follow-symlinks")
                .action(ArgAction::SetTrue)
                .help("Follow symbolic links instead of skipping them"),
        )
        .arg(
            Arg::new("max-file-size")
                .long("max-file-size")
                .value_parser(clap::value_parser!(u64))
                .help("Skip files larger than this many bytes (default 100 MiB)"),
        )
        .arg(
            Arg::new("count-duplicates")
                .long("count-duplicates")
                .action(ArgAction::SetTrue)
                .help("Count files with identical content more than once"),
        )
        .arg(
            Arg::new("by-file")
                .short('f')
                .long("by-file")
                .action(ArgAction::SetTrue)
                .help("Show breakdown by file"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_parser(clap::value_parser!(usize))
                .help("Number of worker threads (default: all cores)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(["table", "csv", "json"])
                .default_value("table")
                .help("Output format"),
        )
        .arg(
            Arg::new("skipped")
                .long("skipped")
                .action(ArgAction::SetTrue)
                .help("List skipped and unrecognized files on stderr"),
        )
}

/// Build count options from matches
fn build_options(matches: &ArgMatches) -> CountOptions {
    let mut options = CountOptions::new()
        .follow_symlinks(matches.get_flag("follow-symlinks"))
        .count_duplicates(matches.get_flag("count-duplicates"));

    if let Some(excludes) = matches.get_many::<String>("exclude") {
        for pattern in excludes {
            options = options.exclude(pattern);
        }
    }
    if let Some(&limit) = matches.get_one::<u64>("max-file-size") {
        options = options.max_file_size(limit);
    }
    if let Some(&jobs) = matches.get_one::<usize>("jobs") {
        options = options.jobs(jobs);
    }
    if matches.get_flag("by-file") {
        options = options.by_file();
    }
    options
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let paths: Vec<PathBuf> = matches
        .get_many::<String>("paths")
        .map(|v| v.map(PathBuf::from).collect())
        .unwrap_or_else(|| vec![PathBuf::from(".")]);
    let options = build_options(matches);

    let outcome = count_paths(&paths, &options).context("counting failed")?;

    // Relative display paths when a single directory was given
    let base_path = if paths.len() == 1 {
        std::fs::canonicalize(&paths[0]).unwrap_or_else(|_| paths[0].clone())
    } else {
        PathBuf::from("")
    };

    if matches.get_flag("skipped") {
        eprint!(
            "{}",
            render::render_skipped(&outcome.skipped, &outcome.ignored, &base_path)
        );
    }

    let by_file = matches.get_flag("by-file");
    print_report(&outcome, matches, by_file, &base_path)?;
    Ok(())
}

fn print_report(
    outcome: &Outcome,
    matches: &ArgMatches,
    by_file: bool,
    base_path: &std::path::Path,
) -> anyhow::Result<()> {
    let format = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or("table");

    match format {
        "json" => {
            let rendered =
                render::render_json(outcome).context("serializing report to JSON")?;
            println!("{rendered}");
        }
        "csv" => {
            print!("{}", render::render_csv(&outcome.report, by_file, base_path));
        }
        _ => {
            if by_file {
                print!("{}", render::render_by_file_table(&outcome.report, base_path));
            } else {
                print!("{}", render::render_table(&outcome.report));
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = build_command().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
