//! Expression-pair parsing for `@test` values.
//!
//! A raw value has the shape `{actualExpr} expectedExpr`. Both sides are
//! recovered as exact source substrings by parsing expression prefixes with
//! the full grammar - no brace counting, so braces inside string literals or
//! nested object literals never confuse the split.

use crate::annotations::TEST_TAG;
use crate::errors::{ErrorReporting, GlossaError, PhaseContext};
use crate::syntax::parser;

/// One not-yet-evaluated assertion: two exact source substrings.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub actual: String,
    pub expected: String,
}

/// Splits one raw `@test` value into its actual/expected pair.
///
/// Any failure is a malformed-annotation error naming the side that failed
/// and the offending substring; it is never silently skipped.
pub fn parse_case(raw: &str, ctx: &PhaseContext) -> Result<TestCase, GlossaError> {
    if !raw.starts_with('{') {
        return Err(ctx.malformed_annotation(
            TEST_TAG,
            format!("value must start with '{{', got {:?}", raw),
            (0..raw.len().min(1)).into(),
        ));
    }

    // Opening brace, then optional whitespace before the actual expression.
    let mut pos = 1;
    pos += leading_whitespace(&raw[pos..]);

    let actual_len = match parser::parse_expression_prefix(&raw[pos..], ctx) {
        Ok((_, consumed)) => consumed,
        Err(_) => {
            return Err(ctx.malformed_annotation(
                TEST_TAG,
                format!(
                    "cannot parse actual expression at offset {}: {:?}",
                    pos,
                    &raw[pos..]
                ),
                (pos..raw.len()).into(),
            ));
        }
    };
    let actual = &raw[pos..pos + actual_len];
    pos += actual_len;

    // The wrapper brace closes the actual side; whitespace then separates it
    // from the expected expression.
    pos += leading_whitespace(&raw[pos..]);
    if !raw[pos..].starts_with('}') {
        return Err(ctx.malformed_annotation(
            TEST_TAG,
            format!(
                "expected '}}' after actual expression {:?}, got {:?}",
                actual,
                &raw[pos..]
            ),
            (pos..raw.len()).into(),
        ));
    }
    pos += 1;
    pos += leading_whitespace(&raw[pos..]);

    if pos >= raw.len() {
        return Err(ctx.malformed_annotation(
            TEST_TAG,
            format!("missing expected expression after {{{}}}", actual),
            (raw.len().saturating_sub(1)..raw.len()).into(),
        ));
    }

    let expected_len = match parser::parse_expression_prefix(&raw[pos..], ctx) {
        Ok((_, consumed)) => consumed,
        Err(_) => {
            return Err(ctx.malformed_annotation(
                TEST_TAG,
                format!(
                    "cannot parse expected expression at offset {}: {:?}",
                    pos,
                    &raw[pos..]
                ),
                (pos..raw.len()).into(),
            ));
        }
    };
    let expected = &raw[pos..pos + expected_len];
    let trailing = &raw[pos + expected_len..];
    if !trailing.trim().is_empty() {
        return Err(ctx.malformed_annotation(
            TEST_TAG,
            format!("unexpected trailing text {:?}", trailing.trim()),
            (pos + expected_len..raw.len()).into(),
        ));
    }

    Ok(TestCase {
        actual: normalize_braces(actual),
        expected: normalize_braces(expected),
    })
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// A side that is itself a brace-delimited literal is ambiguous with the
/// `{actual}` wrapper when re-parsed later, so it gets explicit parentheses.
/// Mandatory normalization, not cosmetic.
fn normalize_braces(expr: &str) -> String {
    if expr.starts_with('{') && expr.ends_with('}') {
        format!("({})", expr)
    } else {
        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCategory, SourceContext};

    fn ctx(raw: &str) -> PhaseContext {
        PhaseContext::new(SourceContext::from_file("doc:@test", raw), "annotation")
    }

    fn case(raw: &str) -> TestCase {
        parse_case(raw, &ctx(raw)).unwrap()
    }

    fn malformed(raw: &str) -> GlossaError {
        let err = parse_case(raw, &ctx(raw)).unwrap_err();
        assert_eq!(err.kind.category(), ErrorCategory::Annotation);
        err
    }

    #[test]
    fn recovers_both_sides_exactly() {
        let c = case("{add(2, 3)} 5");
        assert_eq!(c.actual, "add(2, 3)");
        assert_eq!(c.expected, "5");
    }

    #[test]
    fn expected_may_be_any_expression() {
        let c = case("{firsts([1, 2])} [1, 'two', null]");
        assert_eq!(c.actual, "firsts([1, 2])");
        assert_eq!(c.expected, "[1, 'two', null]");
    }

    #[test]
    fn whitespace_around_the_wrapper_is_tolerated() {
        let c = case("{  add(2, 3) } 5");
        assert_eq!(c.actual, "add(2, 3)");
        assert_eq!(c.expected, "5");
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_actual_side() {
        let c = case("{wrap('}')} '{...}'");
        assert_eq!(c.actual, "wrap('}')");
        assert_eq!(c.expected, "'{...}'");
    }

    #[test]
    fn brace_literals_get_paren_wrapped() {
        let c = case("{{ a: 1 }} { b: 2 }");
        assert_eq!(c.actual, "({ a: 1 })");
        assert_eq!(c.expected, "({ b: 2 })");
    }

    #[test]
    fn missing_opening_brace_is_malformed() {
        let err = malformed("add(2, 3)} 5");
        assert!(err.to_string().contains("must start with '{'"));
    }

    #[test]
    fn unbalanced_wrapper_is_malformed() {
        // `{add(2, 3) 5` - the wrapper never closes.
        let err = malformed("{add(2, 3) 5");
        assert!(err.to_string().contains("expected '}'"));
    }

    #[test]
    fn missing_expected_side_is_malformed() {
        let err = malformed("{add(2, 3)}");
        assert!(err.to_string().contains("missing expected expression"));
    }

    #[test]
    fn unparseable_sides_name_the_side() {
        let err = malformed("{+++} 5");
        assert!(err.to_string().contains("actual"));
        let err = malformed("{add(2, 3)} ???");
        assert!(err.to_string().contains("expected"));
    }
}
