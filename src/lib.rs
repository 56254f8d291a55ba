//! Glossa checks executable assertions embedded in documentation.
//!
//! Source files carry block comments of the canonical doc shape; lines of the
//! form `@test {actualExpr} expectedExpr` inside them are assertions against
//! the file's own top-level declarations. The harness parses each file,
//! attaches every qualifying comment to its nearest declaration, evaluates
//! both sides of each assertion in an environment containing exactly the
//! file's declarations plus a small builtin set, and compares them with deep
//! structural equality.
//!
//! The crate is usable as a library (see [`engine::run_source`]) or through
//! the `glossa` binary.

pub mod annotations;
pub mod cases;
pub mod cli;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod runtime;
pub mod syntax;

pub use errors::{print_error, GlossaError};

/// The commonly-needed surface for embedding or testing the harness.
pub mod prelude {
    pub use crate::cli::output::Reporter;
    pub use crate::engine::{
        run_file, run_paths, run_source, ExecutionResult, FileRun, Outcome, RunConfig, RunSummary,
    };
    pub use crate::errors::{ErrorCategory, GlossaError};
    pub use crate::extract::Filters;
    pub use crate::runtime::Value;
}
