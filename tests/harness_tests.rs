//! End-to-end harness behavior over in-memory sources.

use glossa::prelude::*;

fn run(source: &str) -> ExecutionResult {
    let config = RunConfig::default();
    let mut reporter = Reporter::quiet();
    run_source("mem.gls", source, &config, &mut reporter)
}

const ADD: &str = "\
/**
 * Adds two numbers.
 * @test {add(2, 3)} 5
 */
const add = (x, y) => x + y;
";

#[test]
fn passing_assertion_passes_the_file() {
    let result = run(ADD);
    assert_eq!(result.outcome, Outcome::Passed);
    assert_eq!(result.groups_evaluated, 1);
    assert_eq!(result.cases_passed, 1);
    assert_eq!(result.total_cases, 1);
    assert!(result.failure.is_none());
}

#[test]
fn mismatch_fails_with_both_values_reported() {
    let source = "\
/**
 * Adds two numbers.
 * @test {add(2, 3)} 6
 */
const add = (x, y) => x + y;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.cases_passed, 0);

    let error = result.failure.expect("a failed run carries its error");
    assert_eq!(error.kind.category(), ErrorCategory::Assertion);
    let message = error.to_string();
    assert!(message.contains('5'), "actual value missing: {}", message);
    assert!(message.contains('6'), "expected value missing: {}", message);
}

#[test]
fn doc_comment_without_test_tags_is_no_tests() {
    let source = "\
/**
 * Documented but never asserted.
 */
const shrug = (x) => x;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::NoTests);
    assert_eq!(result.groups_evaluated, 1);
    assert_eq!(result.total_cases, 0);
}

#[test]
fn unbalanced_wrapper_fails_before_any_case_runs() {
    let source = "\
/**
 * The wrapper brace never closes.
 * @test {add(2, 3) 5
 */
const add = (x, y) => x + y;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.total_cases, 0);
    assert_eq!(result.cases_passed, 0);

    let error = result.failure.unwrap();
    assert_eq!(error.kind.category(), ErrorCategory::Annotation);
}

#[test]
fn first_failing_case_halts_its_group() {
    let source = "\
/**
 * Adds two numbers.
 * @test {add(1, 1)} 2
 * @test {add(1, 1)} 3
 * @test {add(2, 2)} 4
 */
const add = (x, y) => x + y;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.groups_evaluated, 1);
    assert_eq!(result.cases_passed, 1);
    assert_eq!(result.total_cases, 3);
}

#[test]
fn failing_group_leaves_later_groups_unevaluated() {
    // The second group's case would raise a runtime error if it ever ran;
    // the failure must stay an assertion mismatch from the first group.
    let source = "\
/**
 * Adds two numbers.
 * @test {add(2, 3)} 99
 */
const add = (x, y) => x + y;

/**
 * Would blow up if evaluated.
 * @test {boom()} 1
 */
const boom = () => missing;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.groups_evaluated, 1);
    assert_eq!(result.cases_passed, 0);
    assert_eq!(result.total_cases, 2);
    let error = result.failure.unwrap();
    assert_eq!(error.kind.category(), ErrorCategory::Assertion);
}

#[test]
fn default_halt_policy_skips_later_files() {
    let fixtures = format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"));
    let files = vec![
        std::path::PathBuf::from(format!("{}/failing.gls", fixtures)),
        std::path::PathBuf::from(format!("{}/passing.gls", fixtures)),
    ];
    let config = RunConfig::default();
    let mut reporter = Reporter::quiet();
    let summary = run_paths(&files, &config, &mut reporter);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_passed, 0);
    assert_eq!(summary.files_no_tests, 0);
}

#[test]
fn suppressed_group_does_not_run() {
    let source = "\
/**
 * @notest
 * @test {boom()} 1
 */
const boom = () => missing;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::NoTests);
    assert_eq!(result.groups_evaluated, 0);
}

#[test]
fn declaration_evaluation_error_fails_the_file() {
    let source = "\
/**
 * Never reached.
 * @test {a} 1
 */
const a = missing + 1;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Failed);
    let error = result.failure.unwrap();
    assert_eq!(error.kind.category(), ErrorCategory::Runtime);
}

#[test]
fn reruns_are_identical() {
    let first = run(ADD);
    let second = run(ADD);
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.cases_passed, second.cases_passed);
    assert_eq!(first.total_cases, second.total_cases);
}

#[test]
fn deep_structures_compare_structurally() {
    let source = "\
/**
 * Builds a nested record.
 * @test {record('ada', [1, 2])} { name: 'ada', scores: [1, 2] }
 */
const record = (name, scores) => ({ name: name, scores: scores });
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Passed);
    assert_eq!(result.cases_passed, 1);
}

#[test]
fn later_declarations_are_visible_to_earlier_lambdas() {
    let source = "\
/**
 * Calls a function declared below it.
 * @test {twice(10)} 20
 */
const twice = (n) => double(n);

const double = (n) => n * 2;
";
    let result = run(source);
    assert_eq!(result.outcome, Outcome::Passed);
}

#[test]
fn doc_filter_limits_which_groups_run() {
    let source = "\
/**
 * Tagged: arithmetic.
 * @test {add(1, 2)} 3
 */
const add = (x, y) => x + y;

/**
 * Tagged: strings.
 * @test {shout('hi')} 'hi!'
 */
const shout = (s) => s + '!';
";
    let mut config = RunConfig::default();
    config.filters = Filters {
        doc_filter: Some(regex::Regex::new("arithmetic").unwrap()),
        ..Filters::default()
    };
    let mut reporter = Reporter::quiet();
    let result = run_source("mem.gls", source, &config, &mut reporter);
    assert_eq!(result.outcome, Outcome::Passed);
    assert_eq!(result.groups_evaluated, 1);
    assert_eq!(result.total_cases, 1);
}
