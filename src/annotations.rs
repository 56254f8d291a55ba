//! Doc-comment shape checking and annotation scanning.
//!
//! A block comment qualifies as a doc comment when its inner text (delimiters
//! stripped) opens with a line containing only `*` and has at least one
//! further line that starts, after leading whitespace, with `*`. Inside a
//! qualifying comment, tag lines have the exact shape
//! `<ws> * <ws> @name value-to-end-of-line`; the scan is a small hand
//! tokenizer, and its matching rules are a conformance contract the
//! expression-pair parser depends on: tag names are letters, digits and
//! hyphens, and at least one whitespace character separates the `*` from the
//! tag and the tag from its value.

/// Tag whose values carry `{actual} expected` assertion pairs.
pub const TEST_TAG: &str = "test";

/// Reserved tag: its presence anywhere in a comment removes the whole comment
/// from consideration. The explicit escape hatch for documented-but-untested
/// declarations.
pub const SUPPRESS_TAG: &str = "notest";

/// Ordered tag multimap for one doc comment. Duplicate tag names are allowed
/// and order within the comment is preserved; values are trimmed but never
/// re-escaped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    entries: Vec<(String, String)>,
}

impl Annotations {
    /// Scans the comment's inner text line by line, collecting tag lines.
    /// Non-matching lines are ignored.
    pub fn parse(doc: &str) -> Self {
        let entries = doc.lines().filter_map(parse_tag_line).collect();
        Self { entries }
    }

    /// True if the reserved suppression tag occurs anywhere in the comment.
    pub fn is_suppressed(&self) -> bool {
        self.entries.iter().any(|(name, _)| name == SUPPRESS_TAG)
    }

    /// Values for one tag, in the order they appeared.
    pub fn values<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }

    /// All entries in source order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Checks the canonical doc shape on a comment's inner text.
pub fn is_doc_shape(inner: &str) -> bool {
    // First line must be exactly `*`.
    let Some(rest) = inner.strip_prefix('*') else {
        return false;
    };
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    let Some(rest) = rest.strip_prefix('\n') else {
        return false;
    };

    // Some further line must start, after leading whitespace, with `*`.
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return false; // second asterisk must be indented
    }
    match trimmed.strip_prefix('*') {
        Some(tail) => tail.is_empty() || tail.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Parses one comment line as ` * @name value`; returns None when the line is
/// not a tag line.
fn parse_tag_line(line: &str) -> Option<(String, String)> {
    let after_indent = line.trim_start();
    if after_indent.len() == line.len() {
        return None; // tag lines are always indented under the opening `/**`
    }
    let after_star = after_indent.strip_prefix('*')?;

    let after_gap = after_star.trim_start();
    if after_gap.len() == after_star.len() {
        return None; // whitespace between `*` and `@` is required
    }
    let after_at = after_gap.strip_prefix('@')?;

    let name_len = after_at
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(after_at.len());
    if name_len == 0 {
        return None;
    }
    let name = &after_at[..name_len];

    let value = &after_at[name_len..];
    if !value.is_empty() && !value.starts_with(char::is_whitespace) {
        return None; // `@name` must end at whitespace or end-of-line
    }

    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_shape_is_accepted() {
        assert!(is_doc_shape("*\n * Adds numbers.\n "));
        assert!(is_doc_shape("*\r\n * windows line endings\r\n "));
        assert!(is_doc_shape("*\n *\n "));
    }

    #[test]
    fn non_doc_comments_are_rejected() {
        // Single-line block comment.
        assert!(!is_doc_shape(" just a comment "));
        // Opening line carries text.
        assert!(!is_doc_shape("* not on its own line\n * more\n"));
        // No second asterisk line.
        assert!(!is_doc_shape("*\n plain continuation\n"));
        // Second asterisk not indented.
        assert!(!is_doc_shape("*\n* flush left\n"));
        assert!(!is_doc_shape(""));
    }

    #[test]
    fn tag_lines_are_collected_in_order() {
        let doc = "*\n * Frees text.\n * @test {f(1)} 2\n * @param x\n * @test {f(2)} 4\n ";
        let anns = Annotations::parse(doc);
        assert_eq!(
            anns.entries(),
            &[
                ("test".to_string(), "{f(1)} 2".to_string()),
                ("param".to_string(), "x".to_string()),
                ("test".to_string(), "{f(2)} 4".to_string()),
            ]
        );
        let tests: Vec<_> = anns.values(TEST_TAG).collect();
        assert_eq!(tests, vec!["{f(1)} 2", "{f(2)} 4"]);
    }

    #[test]
    fn tag_names_allow_hyphens_and_digits() {
        let anns = Annotations::parse(" * @see-also section2");
        assert_eq!(anns.entries(), &[("see-also".into(), "section2".into())]);
    }

    #[test]
    fn separator_whitespace_is_required() {
        // No whitespace between `*` and `@`.
        assert!(Annotations::parse(" *@test {1} 1").entries().is_empty());
        // Un-indented line.
        assert!(Annotations::parse("* @test {1} 1").entries().is_empty());
        // `@` with no name.
        assert!(Annotations::parse(" * @ {1} 1").entries().is_empty());
        // Name running into other characters.
        assert!(Annotations::parse(" * @test! {1} 1").entries().is_empty());
    }

    #[test]
    fn values_are_trimmed_but_verbatim() {
        let anns = Annotations::parse(" * @test   {a + \"\\n\"} b  ");
        assert_eq!(anns.entries(), &[("test".into(), "{a + \"\\n\"} b".into())]);
    }

    #[test]
    fn bare_tag_has_empty_value() {
        let anns = Annotations::parse(" * @notest");
        assert_eq!(anns.entries(), &[("notest".into(), String::new())]);
        assert!(anns.is_suppressed());
    }

    #[test]
    fn free_text_lines_are_ignored() {
        let doc = "*\n * Plain prose with an email@example.com in it.\n * - bullet\n ";
        assert!(Annotations::parse(doc).entries().is_empty());
    }
}
