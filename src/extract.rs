//! Test-group extraction: doc comments to declarations to assertion pairs.
//!
//! The extraction flow over one already-parsed file:
//! 1. Keep comments matching the canonical doc shape and the doc-text filters.
//! 2. For each kept comment, find the owning declaration by minimal absolute
//!    offset distance and cut its code text.
//! 3. Parse annotations; a suppressed comment drops out here.
//! 4. Split every `@test` value into its expression pair.
//!
//! One [`TestGroup`] per qualifying comment, in document order. A group with
//! zero cases is valid and observable - downstream code distinguishes "no
//! tests" from "tests that passed".

use regex::Regex;

use crate::annotations::{Annotations, TEST_TAG};
use crate::cases::{parse_case, TestCase};
use crate::errors::{GlossaError, PhaseContext, SourceContext};
use crate::syntax::{Program, Span};

/// Include/exclude regex filters over documentation text and owning code
/// text. `None` means "no constraint" on that axis.
#[derive(Debug, Default)]
pub struct Filters {
    pub doc_filter: Option<Regex>,
    pub doc_ignore: Option<Regex>,
    pub code_filter: Option<Regex>,
    pub code_ignore: Option<Regex>,
}

impl Filters {
    fn doc_matches(&self, doc: &str) -> bool {
        matches_pair(&self.doc_filter, &self.doc_ignore, doc)
    }

    fn code_matches(&self, code: &str) -> bool {
        matches_pair(&self.code_filter, &self.code_ignore, code)
    }
}

fn matches_pair(include: &Option<Regex>, exclude: &Option<Regex>, text: &str) -> bool {
    if let Some(include) = include {
        if !include.is_match(text) {
            return false;
        }
    }
    if let Some(exclude) = exclude {
        if exclude.is_match(text) {
            return false;
        }
    }
    true
}

/// The ordered assertion pairs tied to one doc comment/declaration pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TestGroup {
    /// Source text from the comment's end through the owning declaration's
    /// end, trimmed. Shown in reports and matched by the code filters.
    pub code: String,
    /// Span of the originating comment, delimiters included.
    pub comment_span: Span,
    pub cases: Vec<TestCase>,
}

/// Returns the element minimizing `score`; ties keep the earliest element.
pub fn arg_min<T>(items: &[T], score: impl Fn(&T) -> usize) -> Option<&T> {
    let mut best: Option<(&T, usize)> = None;
    for item in items {
        let s = score(item);
        match best {
            Some((_, smallest)) if s >= smallest => {}
            _ => best = Some((item, s)),
        }
    }
    best.map(|(item, _)| item)
}

/// Extracts every test group from one already-parsed file.
///
/// A malformed `@test` value aborts the whole file. A file without
/// declarations yields no groups.
pub fn extract_groups(
    source: &str,
    program: &Program,
    ctx: &PhaseContext,
    filters: &Filters,
) -> Result<Vec<TestGroup>, GlossaError> {
    let mut groups = Vec::new();

    for comment in &program.comments {
        if !crate::annotations::is_doc_shape(&comment.text) {
            continue;
        }
        if !filters.doc_matches(&comment.text) {
            continue;
        }

        let annotations = Annotations::parse(&comment.text);
        if annotations.is_suppressed() {
            continue;
        }

        let comment_end = comment.span.end;
        let Some(owner) = arg_min(&program.decls, |d| comment_end.abs_diff(d.span.start)) else {
            continue; // no declarations in the file, nothing to own the comment
        };

        // A comment trailing the last declaration owns no code text.
        let code = if owner.span.end > comment_end {
            source[comment_end..owner.span.end].trim().to_string()
        } else {
            String::new()
        };
        if !filters.code_matches(&code) {
            continue;
        }

        // Pair-parse spans are offsets into the raw value, so each value gets
        // its own snippet context for diagnostics.
        let mut cases = Vec::new();
        for value in annotations.values(TEST_TAG) {
            let value_ctx = PhaseContext::new(
                SourceContext::from_file(format!("{}:@{}", ctx.source.name, TEST_TAG), value),
                "annotation",
            );
            cases.push(parse_case(value, &value_ctx)?);
        }

        groups.push(TestGroup {
            code,
            comment_span: comment.span,
            cases,
        });
    }

    Ok(groups)
}
