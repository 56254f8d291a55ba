//! Command-line interface: argument parsing and the top-level run loop.

pub mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use regex::Regex;

use crate::discovery::{discover_files, PathFilters};
use crate::engine::{run_paths, RunConfig};
use crate::extract::Filters;
use output::Reporter;

/// Runs `@test` assertions embedded in doc comments against the declarations
/// of the files that carry them.
#[derive(Parser, Debug)]
#[command(name = "glossa", version, about)]
pub struct GlossaArgs {
    /// Files or directories to scan; defaults to the current directory.
    pub paths: Vec<PathBuf>,

    /// Verbosity threshold: 0 debug, 1 info, 2 log, 3 warn, 4 error.
    #[arg(short, long, default_value_t = 2)]
    pub verbosity: u8,

    /// Run each file's suite this many times.
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Continue past failing files instead of halting the run.
    #[arg(long)]
    pub keep_going: bool,

    /// Only run files whose path matches this regex.
    #[arg(long)]
    pub file_filter: Option<String>,

    /// Skip files whose path matches this regex.
    #[arg(long)]
    pub file_ignore: Option<String>,

    /// Only run groups whose documentation text matches this regex.
    #[arg(long)]
    pub doc_filter: Option<String>,

    /// Skip groups whose documentation text matches this regex.
    #[arg(long)]
    pub doc_ignore: Option<String>,

    /// Only run groups whose owning code matches this regex.
    #[arg(long)]
    pub code_filter: Option<String>,

    /// Skip groups whose owning code matches this regex.
    #[arg(long)]
    pub code_ignore: Option<String>,
}

/// Entry point for the binary. Exit codes: 0 success (including files with no
/// tests), 1 at least one file failed, 2 invalid arguments.
pub fn run() -> ExitCode {
    let args = GlossaArgs::parse();
    let mut reporter = Reporter::new(args.verbosity);
    match execute(&args, &mut reporter) {
        Ok(code) | Err(code) => code,
    }
}

fn execute(args: &GlossaArgs, reporter: &mut Reporter) -> Result<ExitCode, ExitCode> {
    let path_filters = PathFilters {
        include: compile(&args.file_filter, "--file-filter", reporter)?,
        exclude: compile(&args.file_ignore, "--file-ignore", reporter)?,
    };
    let filters = Filters {
        doc_filter: compile(&args.doc_filter, "--doc-filter", reporter)?,
        doc_ignore: compile(&args.doc_ignore, "--doc-ignore", reporter)?,
        code_filter: compile(&args.code_filter, "--code-filter", reporter)?,
        code_ignore: compile(&args.code_ignore, "--code-ignore", reporter)?,
    };

    let roots = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths.clone()
    };

    let files = discover_files(&roots, &path_filters, reporter);
    if files.is_empty() {
        reporter.warn("no source files found");
        return Ok(ExitCode::SUCCESS);
    }
    reporter.info(&format!("running {} file(s)", files.len()));

    let config = RunConfig {
        filters,
        halt_on_failure: !args.keep_going,
        repeat: args.repeat,
    };
    let summary = run_paths(&files, &config, reporter);

    reporter.info(&format!(
        "files: {} passed, {} failed, {} without tests",
        summary.files_passed, summary.files_failed, summary.files_no_tests
    ));

    if summary.files_failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn compile(
    pattern: &Option<String>,
    flag: &str,
    reporter: &mut Reporter,
) -> Result<Option<Regex>, ExitCode> {
    match pattern {
        None => Ok(None),
        Some(pattern) => match Regex::new(pattern) {
            Ok(re) => Ok(Some(re)),
            Err(error) => {
                reporter.error(&format!("invalid regex for {}: {}", flag, error));
                Err(ExitCode::from(2))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_behavior() {
        let args = GlossaArgs::parse_from(["glossa"]);
        assert!(args.paths.is_empty());
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.repeat, 1);
        assert!(!args.keep_going);
        assert!(args.file_filter.is_none());
    }

    #[test]
    fn filter_flags_parse() {
        let args = GlossaArgs::parse_from([
            "glossa",
            "tests/",
            "--verbosity",
            "0",
            "--repeat",
            "3",
            "--keep-going",
            "--doc-filter",
            "@test",
            "--code-ignore",
            "internal",
        ]);
        assert_eq!(args.paths, vec![PathBuf::from("tests/")]);
        assert_eq!(args.verbosity, 0);
        assert_eq!(args.repeat, 3);
        assert!(args.keep_going);
        assert_eq!(args.doc_filter.as_deref(), Some("@test"));
        assert_eq!(args.code_ignore.as_deref(), Some("internal"));
    }
}
