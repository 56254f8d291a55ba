//! Glossa Error Handling - Unified Encapsulated API
//!
//! Every failure in the harness flows through a single [`GlossaError`] type
//! carrying its kind, a source snippet for diagnostics, and a stable error code.

use miette::{Diagnostic, SourceSpan};
use miette::{LabeledSpan, NamedSource};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Represents source context for error reporting with explicit hierarchy
/// between real sources (preferred) and fallbacks (tolerated when necessary)
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file or snippet content.
    /// This is the preferred method for error reporting.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable
    /// Use only when real source cannot be obtained
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("// {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

/// The single error type - no wrapper, no variants, just essential data
#[derive(Debug)]
pub struct GlossaError {
    /// What went wrong (type-specific data)
    pub kind: ErrorKind,
    /// Where it happened (context-specific source information)
    pub source_info: SourceInfo,
    /// How to help (auto-populated based on context)
    pub diagnostic_info: DiagnosticInfo,
}

/// All error types as a clean enum - no duplicate fields
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // Parse errors - the scanned file (or an embedded expression) is not
    // syntactically valid
    UnexpectedToken {
        expected: String,
        found: String,
    },
    InvalidLiteral {
        literal_type: String,
        value: String,
    },

    // Annotation errors - a `@test` value that cannot be split into its
    // actual/expected expression pair
    MalformedAnnotation {
        tag: String,
        reason: String,
    },

    // Runtime errors - evaluation failures
    UndefinedSymbol {
        symbol: String,
    },
    TypeMismatch {
        expected: String,
        actual: String,
    },
    ArityMismatch {
        expected: String,
        actual: usize,
    },
    InvalidOperation {
        operation: String,
        operand_type: String,
    },
    MissingKey {
        key: String,
    },
    RecursionLimit,

    // Assertion errors - both sides evaluated, values differ
    AssertionFailure {
        actual_expr: String,
        expected_expr: String,
        actual_value: String,
        expected_value: String,
    },

    // Discovery errors - filesystem access failures
    Io {
        path: String,
        message: String,
    },
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// Context-aware error creation - each context knows how to create appropriate errors
pub trait ErrorReporting {
    /// Create an error with context-appropriate enhancements
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> GlossaError;

    /// Convenience methods for common error types
    fn unexpected_token(&self, expected: &str, found: &str, span: SourceSpan) -> GlossaError {
        self.report(
            ErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: found.into(),
            },
            span,
        )
    }

    fn invalid_literal(&self, literal_type: &str, value: &str, span: SourceSpan) -> GlossaError {
        self.report(
            ErrorKind::InvalidLiteral {
                literal_type: literal_type.into(),
                value: value.into(),
            },
            span,
        )
    }

    fn malformed_annotation(&self, tag: &str, reason: String, span: SourceSpan) -> GlossaError {
        self.report(
            ErrorKind::MalformedAnnotation {
                tag: tag.into(),
                reason,
            },
            span,
        )
    }

    fn undefined_symbol(&self, symbol: &str, span: SourceSpan) -> GlossaError {
        self.report(
            ErrorKind::UndefinedSymbol {
                symbol: symbol.into(),
            },
            span,
        )
    }

    fn type_mismatch(&self, expected: &str, actual: &str, span: SourceSpan) -> GlossaError {
        self.report(
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            },
            span,
        )
    }

    fn arity_mismatch(&self, expected: &str, actual: usize, span: SourceSpan) -> GlossaError {
        self.report(
            ErrorKind::ArityMismatch {
                expected: expected.into(),
                actual,
            },
            span,
        )
    }

    fn invalid_operation(
        &self,
        operation: &str,
        operand_type: &str,
        span: SourceSpan,
    ) -> GlossaError {
        self.report(
            ErrorKind::InvalidOperation {
                operation: operation.into(),
                operand_type: operand_type.into(),
            },
            span,
        )
    }

    fn missing_key(&self, key: &str, span: SourceSpan) -> GlossaError {
        self.report(ErrorKind::MissingKey { key: key.into() }, span)
    }
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnexpectedToken { .. } | Self::InvalidLiteral { .. } => ErrorCategory::Parse,

            Self::MalformedAnnotation { .. } => ErrorCategory::Annotation,

            Self::UndefinedSymbol { .. }
            | Self::TypeMismatch { .. }
            | Self::ArityMismatch { .. }
            | Self::InvalidOperation { .. }
            | Self::MissingKey { .. }
            | Self::RecursionLimit => ErrorCategory::Runtime,

            Self::AssertionFailure { .. } => ErrorCategory::Assertion,

            Self::Io { .. } => ErrorCategory::Discovery,
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnexpectedToken { .. } => "unexpected_token",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::MalformedAnnotation { .. } => "malformed_annotation",
            Self::UndefinedSymbol { .. } => "undefined_symbol",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::InvalidOperation { .. } => "invalid_operation",
            Self::MissingKey { .. } => "missing_key",
            Self::RecursionLimit => "recursion_limit",
            Self::AssertionFailure { .. } => "assertion_failure",
            Self::Io { .. } => "io",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Annotation,
    Runtime,
    Assertion,
    Discovery,
}

impl std::error::Error for GlossaError {}

impl fmt::Display for GlossaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "Parse error: expected {}, found {}", expected, found)
            }
            ErrorKind::InvalidLiteral {
                literal_type,
                value,
            } => {
                write!(f, "Parse error: invalid {} '{}'", literal_type, value)
            }
            ErrorKind::MalformedAnnotation { tag, reason } => {
                write!(f, "Malformed @{} annotation: {}", tag, reason)
            }
            ErrorKind::UndefinedSymbol { symbol } => {
                write!(f, "Evaluation error: undefined symbol '{}'", symbol)
            }
            ErrorKind::TypeMismatch { expected, actual } => {
                write!(f, "Type error: expected {}, got {}", expected, actual)
            }
            ErrorKind::ArityMismatch { expected, actual } => {
                write!(
                    f,
                    "Evaluation error: incorrect arity, expected {} argument(s), got {}",
                    expected, actual
                )
            }
            ErrorKind::InvalidOperation {
                operation,
                operand_type,
            } => {
                write!(
                    f,
                    "Evaluation error: invalid operation '{}' on {}",
                    operation, operand_type
                )
            }
            ErrorKind::MissingKey { key } => {
                write!(f, "Evaluation error: no such key '{}'", key)
            }
            ErrorKind::RecursionLimit => {
                write!(f, "Evaluation error: recursion limit exceeded")
            }
            ErrorKind::AssertionFailure {
                actual_expr,
                expected_expr,
                actual_value,
                expected_value,
            } => {
                write!(
                    f,
                    "Assertion failed: {{{}}} evaluated to {} but {} evaluated to {}",
                    actual_expr, actual_value, expected_expr, expected_value
                )
            }
            ErrorKind::Io { path, message } => {
                write!(f, "I/O error on '{}': {}", path, message)
            }
        }
    }
}

impl Diagnostic for GlossaError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl GlossaError {
    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::UnexpectedToken { .. } => "unexpected token".into(),
            ErrorKind::InvalidLiteral { .. } => "invalid literal".into(),
            ErrorKind::MalformedAnnotation { .. } => "malformed annotation".into(),
            ErrorKind::UndefinedSymbol { .. } => "undefined symbol".into(),
            ErrorKind::TypeMismatch { .. } => "type mismatch".into(),
            ErrorKind::ArityMismatch { .. } => "arity mismatch".into(),
            ErrorKind::InvalidOperation { .. } => "invalid operation".into(),
            ErrorKind::MissingKey { .. } => "missing key".into(),
            ErrorKind::RecursionLimit => "recursion limit exceeded".into(),
            ErrorKind::AssertionFailure { .. } => "assertion failed here".into(),
            ErrorKind::Io { .. } => "I/O failure".into(),
        }
    }
}

/// Standalone constructor for discovery-phase failures, which have no source
/// text to attach. The path itself becomes the snippet so miette still has
/// something to show.
pub fn io_error(path: &str, message: String) -> GlossaError {
    let source = Arc::new(NamedSource::new(path.to_string(), path.to_string()));

    GlossaError {
        kind: ErrorKind::Io {
            path: path.to_string(),
            message,
        },
        source_info: SourceInfo {
            source,
            primary_span: (0..path.len()).into(),
            phase: "discovery".into(),
        },
        diagnostic_info: DiagnosticInfo {
            help: None,
            error_code: "glossa::discovery::io".into(),
        },
    }
}

/// Creates a placeholder span for errors not tied to a specific source code
/// location. This makes the intent of using an empty span explicit and searchable.
pub fn unspanned() -> miette::SourceSpan {
    miette::SourceSpan::from(0..0)
}

/// Converts a Glossa AST Span to a miette SourceSpan.
pub fn to_source_span(span: crate::syntax::Span) -> miette::SourceSpan {
    miette::SourceSpan::from(span.start..span.end)
}

/// General-purpose error creation context used throughout the codebase
/// for creating properly contextualized GlossaError instances
pub struct PhaseContext {
    pub source: SourceContext,
    pub phase: String,
}

impl PhaseContext {
    pub fn new(source: SourceContext, phase: impl Into<String>) -> Self {
        Self {
            source,
            phase: phase.into(),
        }
    }
}

impl ErrorReporting for PhaseContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> GlossaError {
        let error_code = format!("glossa::{}::{}", self.phase, kind.code_suffix());

        GlossaError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: span,
                phase: self.phase.clone(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a GlossaError with full miette diagnostics
///
/// This provides rich error formatting with source spans, suggestions, and context.
/// Use this for user-facing error display in the CLI.
pub fn print_error(error: GlossaError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}
