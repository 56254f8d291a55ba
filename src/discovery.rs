//! File discovery: walks root directories for `.gls` sources.
//!
//! Discovery is best-effort: unreadable directories or entries produce a
//! warning and are skipped, never a run failure. The result is sorted and
//! deduplicated so runs are deterministic regardless of filesystem order.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::cli::output::Reporter;

const SOURCE_EXTENSION: &str = "gls";

/// Directory fragments never descended into.
const IGNORE_PATTERNS: &[&str] = &["target/", ".git/", "node_modules/"];

/// Include/exclude regex filters over the display form of candidate paths.
#[derive(Debug, Default)]
pub struct PathFilters {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
}

impl PathFilters {
    fn matches(&self, path: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        true
    }
}

/// Collects every matching source file under the given roots.
///
/// A root that is itself a file is taken as-is (extension check still
/// applies); directories are walked recursively.
pub fn discover_files(
    roots: &[PathBuf],
    filters: &PathFilters,
    reporter: &mut Reporter,
) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    reporter.warn(&format!("skipping unreadable entry: {}", error));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !has_source_extension(path) || is_ignored(path) {
                continue;
            }
            if !filters.matches(&path.display().to_string()) {
                continue;
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    files
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}

fn is_ignored(path: &Path) -> bool {
    let display = path.display().to_string();
    IGNORE_PATTERNS
        .iter()
        .any(|pattern| display.contains(pattern))
}
