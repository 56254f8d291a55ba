//! Runtime module for Glossa
//!
//! This module provides the runtime value types for expression evaluation.
//! Values are deeply compositional: lists and maps can contain any other
//! value. Equality between values is the deep structural equality the
//! assertion loop relies on:
//!
//! - lists compare element-wise, maps by key-set and per-key value,
//!   primitives by value;
//! - `Number` follows IEEE semantics, so `NaN` is never equal to anything,
//!   itself included - an assertion whose sides both evaluate to `NaN` fails;
//! - `Null` equals `Null`;
//! - lambdas and native functions compare by identity, never structurally.

use std::{collections::BTreeMap, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::errors::{GlossaError, PhaseContext};
use crate::syntax::{AstNode, Span};

pub mod env;
pub mod eval;

use env::Env;

/// Native (Rust) function signature. Arguments arrive eagerly evaluated;
/// the call span and phase context are for error reporting.
pub type NativeFn = fn(args: &[Value], call_span: Span, ctx: &PhaseContext) -> Result<Value, GlossaError>;

/// Canonical runtime value for Glossa evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Numeric value (floating point).
    Number(f64),
    /// String value.
    String(String),
    /// Boolean value.
    Bool(bool),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Map from string keys to values; ordered for deterministic display.
    Map(BTreeMap<String, Value>),
    /// User-defined lambda (captures its defining scope).
    #[serde(skip)]
    Lambda(Rc<Lambda>),
    /// Native (Rust) function.
    #[serde(skip)]
    NativeFn(NativeFn),
}

/// A user-defined lambda: parameter names, body AST, and the scope it closed
/// over. The scope is held by reference, so bindings defined after the lambda
/// (including the lambda itself) resolve at call time - recursion works.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: AstNode,
    pub env: Rc<Env>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFn(a), Value::NativeFn(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl Value {
    /// Returns the type name of the value as a string (for diagnostics).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Lambda(_) => "Lambda",
            Value::NativeFn(_) => "NativeFn",
        }
    }

    /// Returns true if the value is considered "truthy" in a boolean context.
    /// `null`, `false`, `0`, `NaN` and the empty string are falsy; everything
    /// else (including empty lists and maps) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Returns the contained number if this is a Number value, else None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if is_bare_key(key) {
                        write!(f, "{}: {}", key, value)?;
                    } else {
                        write!(f, "{:?}: {}", key, value)?;
                    }
                }
                write!(f, "}}")
            }
            Value::Lambda(lambda) => write!(f, "<lambda({})>", lambda.params.join(", ")),
            Value::NativeFn(_) => write!(f, "<native fn>"),
        }
    }
}

/// Renders whole numbers without a trailing `.0`, so a passing `5` reads as
/// `5` rather than `5.0` in reports.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
