//! Execution engine: the per-file state machine and the multi-file driver.
//!
//! Each file moves through `Idle -> Loaded -> Parsed -> Running` and ends in
//! one of three terminal outcomes: `Passed`, `Failed`, or `NoTests`. All
//! state is rebuilt per file per run; nothing is cached across files or
//! repeated invocations, so re-running an unmodified file yields an identical
//! result.
//!
//! Failure semantics are fail-fast at two levels: the first failing case
//! aborts the rest of its file, and (under the default halt policy) the first
//! failing file aborts the rest of the run.

use std::{fs, path::PathBuf, rc::Rc};

use crate::cli::output::Reporter;
use crate::errors::{
    io_error, print_error, unspanned, ErrorKind, ErrorReporting, GlossaError, PhaseContext,
    SourceContext,
};
use crate::extract::{extract_groups, Filters, TestGroup};
use crate::runtime::{env, eval::Evaluator, Value};
use crate::syntax::{parser, Program};

// ============================================================================
// RESULTS
// ============================================================================

/// Terminal outcome of one file's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    NoTests,
}

/// Per-file result: counts, outcome, and the failing error if any.
#[derive(Debug)]
pub struct ExecutionResult {
    pub groups_evaluated: usize,
    pub cases_passed: usize,
    pub total_cases: usize,
    pub outcome: Outcome,
    pub failure: Option<GlossaError>,
}

impl ExecutionResult {
    fn failed(error: GlossaError) -> Self {
        Self {
            groups_evaluated: 0,
            cases_passed: 0,
            total_cases: 0,
            outcome: Outcome::Failed,
            failure: Some(error),
        }
    }
}

// ============================================================================
// PER-FILE STATE MACHINE
// ============================================================================

/// Observable phase of a [`FileRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Parsed,
    Running,
    Done(Outcome),
}

/// One file's journey through the harness. Methods must be called in phase
/// order; calling them out of order is a caller bug.
pub struct FileRun {
    display_name: String,
    path: Option<PathBuf>,
    phase: Phase,
    source: String,
    program: Option<Program>,
    groups: Vec<TestGroup>,
}

impl FileRun {
    pub fn new(path: PathBuf) -> Self {
        Self {
            display_name: path.display().to_string(),
            path: Some(path),
            phase: Phase::Idle,
            source: String::new(),
            program: None,
            groups: Vec::new(),
        }
    }

    /// An in-memory run, for tests and embedding: starts out already Loaded.
    pub fn from_source(name: &str, source: &str) -> Self {
        Self {
            display_name: name.to_string(),
            path: None,
            phase: Phase::Loaded,
            source: source.to_string(),
            program: None,
            groups: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Idle -> Loaded: read the file from disk.
    pub fn load(&mut self) -> Result<(), GlossaError> {
        debug_assert_eq!(self.phase, Phase::Idle);
        let path = self.path.as_ref().expect("Idle runs always carry a path");
        self.source = fs::read_to_string(path)
            .map_err(|e| io_error(&self.display_name, e.to_string()))?;
        self.phase = Phase::Loaded;
        Ok(())
    }

    /// Loaded -> Parsed: parse the source once and assemble test groups.
    pub fn parse(&mut self, filters: &Filters) -> Result<(), GlossaError> {
        debug_assert_eq!(self.phase, Phase::Loaded);
        let ctx = self.context("parse");
        let program = parser::parse_program(&self.source, &ctx)?;
        self.groups = extract_groups(&self.source, &program, &ctx, filters)?;
        self.program = Some(program);
        self.phase = Phase::Parsed;
        Ok(())
    }

    /// Parsed -> Running -> terminal: evaluate declarations, then every case
    /// in document/annotation order, failing fast on the first mismatch or
    /// evaluation error.
    pub fn execute(&mut self, reporter: &mut Reporter) -> ExecutionResult {
        debug_assert_eq!(self.phase, Phase::Parsed);
        self.phase = Phase::Running;
        let result = self.run_cases(reporter);
        self.phase = Phase::Done(result.outcome);
        result
    }

    fn run_cases(&self, reporter: &mut Reporter) -> ExecutionResult {
        let ctx = self.context("eval");
        let evaluator = Evaluator::new(&ctx);
        let globals = env::with_builtins();

        // The environment exposes every top-level binding of the file, in
        // declaration order, so test expressions can call into the file.
        let program = self.program.as_ref().expect("Parsed runs carry a program");
        for decl in &program.decls {
            match evaluator.eval(&decl.init, &globals) {
                Ok(value) => globals.define(decl.name.clone(), value),
                Err(error) => return ExecutionResult::failed(error),
            }
        }

        let total_cases = self.groups.iter().map(|g| g.cases.len()).sum();
        let mut groups_evaluated = 0;
        let mut cases_passed = 0;

        for group in &self.groups {
            reporter.test_banner(&group.code);
            groups_evaluated += 1;

            for (number, case) in group.cases.iter().enumerate() {
                match self.run_case(&case.actual, &case.expected, &globals) {
                    Ok(()) => {
                        cases_passed += 1;
                        reporter.case_pass(number + 1, &case.actual, &case.expected);
                    }
                    Err(error) => {
                        reporter.error(&format!("actual   {}", case.actual));
                        reporter.error(&format!("expected {}", case.expected));
                        return ExecutionResult {
                            groups_evaluated,
                            cases_passed,
                            total_cases,
                            outcome: Outcome::Failed,
                            failure: Some(error),
                        };
                    }
                }
            }
            if group.cases.is_empty() {
                reporter.warn("no tests");
            }
        }

        let outcome = if total_cases == 0 {
            Outcome::NoTests
        } else {
            Outcome::Passed
        };
        ExecutionResult {
            groups_evaluated,
            cases_passed,
            total_cases,
            outcome,
            failure: None,
        }
    }

    fn run_case(
        &self,
        actual_expr: &str,
        expected_expr: &str,
        globals: &Rc<crate::runtime::env::Env>,
    ) -> Result<(), GlossaError> {
        let actual = self.eval_side(actual_expr, globals)?;
        let expected = self.eval_side(expected_expr, globals)?;

        if actual != expected {
            let ctx = self.context("assert");
            return Err(ctx.report(
                ErrorKind::AssertionFailure {
                    actual_expr: actual_expr.to_string(),
                    expected_expr: expected_expr.to_string(),
                    actual_value: actual.to_string(),
                    expected_value: expected.to_string(),
                },
                unspanned(),
            ));
        }
        Ok(())
    }

    fn eval_side(
        &self,
        expr: &str,
        globals: &Rc<crate::runtime::env::Env>,
    ) -> Result<Value, GlossaError> {
        // Each side gets its own snippet context so diagnostics point into
        // the expression text rather than the whole file.
        let ctx = PhaseContext::new(
            SourceContext::from_file(format!("{}:@test", self.display_name), expr),
            "eval",
        );
        let ast = parser::parse_expression(expr, &ctx)?;
        Evaluator::new(&ctx).eval(&ast, globals)
    }

    fn context(&self, phase: &str) -> PhaseContext {
        PhaseContext::new(
            SourceContext::from_file(self.display_name.clone(), self.source.clone()),
            phase,
        )
    }
}

// ============================================================================
// DRIVER
// ============================================================================

/// Run-level configuration: filters, halt policy, repeat count.
pub struct RunConfig {
    pub filters: Filters,
    /// Stop after the first failing file (the default) or keep going.
    pub halt_on_failure: bool,
    /// Run each file's suite this many times; results must be identical.
    pub repeat: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            halt_on_failure: true,
            repeat: 1,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_passed: usize,
    pub files_failed: usize,
    pub files_no_tests: usize,
}

/// Convenience entry: run one file end to end.
pub fn run_file(path: PathBuf, config: &RunConfig, reporter: &mut Reporter) -> ExecutionResult {
    let mut run = FileRun::new(path);
    if let Err(error) = run.load() {
        return ExecutionResult::failed(error);
    }
    if let Err(error) = run.parse(&config.filters) {
        return ExecutionResult::failed(error);
    }
    run.execute(reporter)
}

/// Convenience entry: run an in-memory source end to end.
pub fn run_source(
    name: &str,
    source: &str,
    config: &RunConfig,
    reporter: &mut Reporter,
) -> ExecutionResult {
    let mut run = FileRun::from_source(name, source);
    if let Err(error) = run.parse(&config.filters) {
        return ExecutionResult::failed(error);
    }
    run.execute(reporter)
}

/// Processes files strictly sequentially: file N finishes (parse, execute,
/// report) before file N+1 begins. Returns the per-outcome file counts.
pub fn run_paths(files: &[PathBuf], config: &RunConfig, reporter: &mut Reporter) -> RunSummary {
    let mut summary = RunSummary::default();

    'files: for path in files {
        reporter.blank();
        reporter.file_banner(&path.display().to_string());
        reporter.start_timer("run");

        let mut file_outcome = Outcome::NoTests;
        for _ in 0..config.repeat.max(1) {
            let result = run_file(path.clone(), config, reporter);
            file_outcome = result.outcome;
            match result.outcome {
                Outcome::Passed => {
                    reporter.pass_banner(result.cases_passed, result.total_cases);
                }
                Outcome::NoTests => {
                    reporter.no_tests_banner();
                }
                Outcome::Failed => {
                    reporter.fail_banner();
                    if let Some(error) = result.failure {
                        print_error(error);
                    }
                    break;
                }
            }
        }
        reporter.end_timer("run");

        match file_outcome {
            Outcome::Passed => summary.files_passed += 1,
            Outcome::NoTests => summary.files_no_tests += 1,
            Outcome::Failed => {
                summary.files_failed += 1;
                if config.halt_on_failure {
                    break 'files;
                }
            }
        }
    }

    summary
}
