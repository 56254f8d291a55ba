//! Evaluation environments: a chain of scopes from builtins down to lambda
//! call frames. Scopes use interior mutability so top-level declarations can
//! be filled in one at a time while lambdas already hold a reference to the
//! scope - that is what makes self- and forward-references resolve.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::errors::{ErrorReporting, GlossaError, PhaseContext};
use crate::runtime::Value;
use crate::syntax::Span;

#[derive(Debug, Default)]
pub struct Env {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    /// A fresh root scope with no parent and no bindings.
    pub fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    /// A child scope; lookups fall back to the parent chain.
    pub fn child(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Defines or shadows a binding in this scope.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Looks up a name through the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

/// Builds the evaluation root: a scope holding the builtin functions, with an
/// empty child scope on top for the file's own declarations. The builtins are
/// the whole embedding surface - test expressions cannot reach host I/O.
pub fn with_builtins() -> Rc<Env> {
    let root = Env::root();
    root.define("len", Value::NativeFn(native_len));
    root.define("abs", Value::NativeFn(native_abs));
    root.define("min", Value::NativeFn(native_min));
    root.define("max", Value::NativeFn(native_max));
    root.define("keys", Value::NativeFn(native_keys));
    Env::child(&root)
}

// ============================================================================
// BUILTINS
// ============================================================================

fn expect_arity(
    name: &str,
    expected: usize,
    args: &[Value],
    span: Span,
    ctx: &PhaseContext,
) -> Result<(), GlossaError> {
    if args.len() != expected {
        return Err(ctx.arity_mismatch(
            &format!("{} for '{}'", expected, name),
            args.len(),
            (span.start..span.end).into(),
        ));
    }
    Ok(())
}

fn native_len(args: &[Value], span: Span, ctx: &PhaseContext) -> Result<Value, GlossaError> {
    expect_arity("len", 1, args, span, ctx)?;
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(ctx.type_mismatch(
                "String, List, or Map",
                other.type_name(),
                (span.start..span.end).into(),
            ))
        }
    };
    Ok(Value::Number(n as f64))
}

fn native_abs(args: &[Value], span: Span, ctx: &PhaseContext) -> Result<Value, GlossaError> {
    expect_arity("abs", 1, args, span, ctx)?;
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(n.abs())),
        other => Err(ctx.type_mismatch(
            "Number",
            other.type_name(),
            (span.start..span.end).into(),
        )),
    }
}

fn native_min(args: &[Value], span: Span, ctx: &PhaseContext) -> Result<Value, GlossaError> {
    fold_numbers("min", f64::min, args, span, ctx)
}

fn native_max(args: &[Value], span: Span, ctx: &PhaseContext) -> Result<Value, GlossaError> {
    fold_numbers("max", f64::max, args, span, ctx)
}

fn fold_numbers(
    name: &str,
    fold: fn(f64, f64) -> f64,
    args: &[Value],
    span: Span,
    ctx: &PhaseContext,
) -> Result<Value, GlossaError> {
    if args.is_empty() {
        return Err(ctx.arity_mismatch(
            &format!("at least 1 for '{}'", name),
            0,
            (span.start..span.end).into(),
        ));
    }
    let mut acc: Option<f64> = None;
    for arg in args {
        let Value::Number(n) = arg else {
            return Err(ctx.type_mismatch(
                "Number",
                arg.type_name(),
                (span.start..span.end).into(),
            ));
        };
        acc = Some(match acc {
            Some(a) => fold(a, *n),
            None => *n,
        });
    }
    Ok(Value::Number(acc.unwrap()))
}

fn native_keys(args: &[Value], span: Span, ctx: &PhaseContext) -> Result<Value, GlossaError> {
    expect_arity("keys", 1, args, span, ctx)?;
    match &args[0] {
        Value::Map(entries) => Ok(Value::List(
            entries.keys().cloned().map(Value::String).collect(),
        )),
        other => Err(ctx.type_mismatch(
            "Map",
            other.type_name(),
            (span.start..span.end).into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scopes_shadow_and_fall_back() {
        let root = Env::root();
        root.define("x", Value::Number(1.0));
        let child = Env::child(&root);
        assert_eq!(child.lookup("x"), Some(Value::Number(1.0)));
        child.define("x", Value::Number(2.0));
        assert_eq!(child.lookup("x"), Some(Value::Number(2.0)));
        assert_eq!(root.lookup("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn builtins_are_visible_through_the_globals_scope() {
        let globals = with_builtins();
        assert!(globals.lookup("len").is_some());
        assert!(globals.lookup("keys").is_some());
        assert!(globals.lookup("missing").is_none());
    }
}
