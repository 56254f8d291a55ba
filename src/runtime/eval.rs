//! Tree-walking evaluator for Glossa expressions.
//!
//! Evaluation is pure apart from what the environment exposes: the file's own
//! top-level bindings and the builtin table. A depth guard turns runaway
//! recursion into a reportable error instead of a stack overflow.

use std::{collections::BTreeMap, rc::Rc};

use crate::errors::{to_source_span, ErrorKind, ErrorReporting, GlossaError, PhaseContext};
use crate::runtime::{env::Env, Lambda, Value};
use crate::syntax::{AstNode, BinaryOp, Expr, Span, UnaryOp};

pub struct Evaluator<'c> {
    ctx: &'c PhaseContext,
    max_depth: usize,
}

impl<'c> Evaluator<'c> {
    pub fn new(ctx: &'c PhaseContext) -> Self {
        // Each guarded level costs several native eval_at/eval_call frames,
        // so the limit must trip well before the thread stack runs out.
        Self { ctx, max_depth: 64 }
    }

    pub fn eval(&self, node: &AstNode, env: &Rc<Env>) -> Result<Value, GlossaError> {
        self.eval_at(node, env, 0)
    }

    fn eval_at(&self, node: &AstNode, env: &Rc<Env>, depth: usize) -> Result<Value, GlossaError> {
        if depth > self.max_depth {
            return Err(self
                .ctx
                .report(ErrorKind::RecursionLimit, to_source_span(node.span)));
        }

        match &*node.value {
            Expr::Number(n, _) => Ok(Value::Number(*n)),
            Expr::String(s, _) => Ok(Value::String(s.clone())),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Null(_) => Ok(Value::Null),

            Expr::Ident(name, span) => env
                .lookup(name)
                .ok_or_else(|| self.ctx.undefined_symbol(name, to_source_span(*span))),

            Expr::Array(items, _) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_at(item, env, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }

            Expr::Object(entries, _) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval_at(value, env, depth + 1)?);
                }
                Ok(Value::Map(map))
            }

            Expr::Lambda { params, body, .. } => Ok(Value::Lambda(Rc::new(Lambda {
                params: params.clone(),
                body: (**body).clone(),
                env: Rc::clone(env),
            }))),

            Expr::Call { callee, args, span } => self.eval_call(callee, args, *span, env, depth),

            Expr::Member {
                object,
                property,
                span,
            } => {
                let value = self.eval_at(object, env, depth + 1)?;
                match value {
                    Value::Map(entries) => entries
                        .get(property)
                        .cloned()
                        .ok_or_else(|| self.ctx.missing_key(property, to_source_span(*span))),
                    other => Err(self.ctx.invalid_operation(
                        &format!("member access '.{}'", property),
                        other.type_name(),
                        to_source_span(*span),
                    )),
                }
            }

            Expr::Index {
                object,
                index,
                span,
            } => {
                let value = self.eval_at(object, env, depth + 1)?;
                let key = self.eval_at(index, env, depth + 1)?;
                self.apply_index(value, key, *span)
            }

            Expr::Unary { op, operand, span } => {
                let value = self.eval_at(operand, env, depth + 1)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                    (UnaryOp::Neg, other) => Err(self.ctx.invalid_operation(
                        "-",
                        other.type_name(),
                        to_source_span(*span),
                    )),
                }
            }

            Expr::Binary {
                op,
                left,
                right,
                span,
            } => match op {
                // Short-circuit operators return the deciding operand, JS-style.
                BinaryOp::And => {
                    let lhs = self.eval_at(left, env, depth + 1)?;
                    if lhs.is_truthy() {
                        self.eval_at(right, env, depth + 1)
                    } else {
                        Ok(lhs)
                    }
                }
                BinaryOp::Or => {
                    let lhs = self.eval_at(left, env, depth + 1)?;
                    if lhs.is_truthy() {
                        Ok(lhs)
                    } else {
                        self.eval_at(right, env, depth + 1)
                    }
                }
                _ => {
                    let lhs = self.eval_at(left, env, depth + 1)?;
                    let rhs = self.eval_at(right, env, depth + 1)?;
                    self.apply_binary(*op, lhs, rhs, *span)
                }
            },

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.eval_at(condition, env, depth + 1)?;
                if cond.is_truthy() {
                    self.eval_at(then_branch, env, depth + 1)
                } else {
                    self.eval_at(else_branch, env, depth + 1)
                }
            }
        }
    }

    fn eval_call(
        &self,
        callee: &AstNode,
        args: &[AstNode],
        span: Span,
        env: &Rc<Env>,
        depth: usize,
    ) -> Result<Value, GlossaError> {
        let callee_value = self.eval_at(callee, env, depth + 1)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_at(arg, env, depth + 1)?);
        }

        match callee_value {
            Value::Lambda(lambda) => {
                if lambda.params.len() != arg_values.len() {
                    return Err(self.ctx.arity_mismatch(
                        &lambda.params.len().to_string(),
                        arg_values.len(),
                        to_source_span(span),
                    ));
                }
                let frame = Env::child(&lambda.env);
                for (param, value) in lambda.params.iter().zip(arg_values) {
                    frame.define(param, value);
                }
                self.eval_at(&lambda.body, &frame, depth + 1)
            }
            Value::NativeFn(f) => f(&arg_values, span, self.ctx),
            other => Err(self.ctx.invalid_operation(
                "call",
                other.type_name(),
                to_source_span(span),
            )),
        }
    }

    fn apply_index(&self, value: Value, key: Value, span: Span) -> Result<Value, GlossaError> {
        match (value, key) {
            (Value::List(items), Value::Number(n)) => {
                let valid = n.fract() == 0.0 && n >= 0.0 && (n as usize) < items.len();
                if !valid {
                    return Err(self.ctx.invalid_operation(
                        &format!("index {}", n),
                        &format!("List of length {}", items.len()),
                        to_source_span(span),
                    ));
                }
                Ok(items[n as usize].clone())
            }
            (Value::String(s), Value::Number(n)) => {
                let valid = n.fract() == 0.0 && n >= 0.0;
                let ch = if valid { s.chars().nth(n as usize) } else { None };
                match ch {
                    Some(c) => Ok(Value::String(c.to_string())),
                    None => Err(self.ctx.invalid_operation(
                        &format!("index {}", n),
                        &format!("String of length {}", s.chars().count()),
                        to_source_span(span),
                    )),
                }
            }
            (Value::Map(entries), Value::String(key)) => entries
                .get(&key)
                .cloned()
                .ok_or_else(|| self.ctx.missing_key(&key, to_source_span(span))),
            (value, key) => Err(self.ctx.invalid_operation(
                &format!("index with {}", key.type_name()),
                value.type_name(),
                to_source_span(span),
            )),
        }
    }

    fn apply_binary(
        &self,
        op: BinaryOp,
        left: Value,
        right: Value,
        span: Span,
    ) -> Result<Value, GlossaError> {
        use BinaryOp::*;

        let operands = |l: &Value, r: &Value| format!("{} and {}", l.type_name(), r.type_name());

        match op {
            Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (l, r) => Err(self.ctx.invalid_operation(
                    "+",
                    &operands(&l, &r),
                    to_source_span(span),
                )),
            },
            Sub | Mul | Div | Rem => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(match op {
                    Sub => a - b,
                    Mul => a * b,
                    Div => a / b,
                    _ => a % b,
                })),
                (l, r) => Err(self.ctx.invalid_operation(
                    op.symbol(),
                    &operands(&l, &r),
                    to_source_span(span),
                )),
            },
            Lt | Le | Gt | Ge => {
                let result = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => compare(op, a.partial_cmp(b)),
                    (Value::String(a), Value::String(b)) => compare(op, a.partial_cmp(b)),
                    _ => None,
                };
                result.map(Value::Bool).ok_or_else(|| {
                    self.ctx.invalid_operation(
                        op.symbol(),
                        &operands(&left, &right),
                        to_source_span(span),
                    )
                })
            }
            Eq => Ok(Value::Bool(left == right)),
            Ne => Ok(Value::Bool(left != right)),
            And | Or => unreachable!("short-circuit operators are handled during evaluation"),
        }
    }
}

/// `None` is NaN territory: comparisons involving NaN are false in source
/// semantics, but mixed-type comparisons are errors, so the caller needs to
/// tell those apart. NaN yields `Some(false)` here via the ordering check.
fn compare(op: BinaryOp, ordering: Option<std::cmp::Ordering>) -> Option<bool> {
    use std::cmp::Ordering::*;
    let ordering = match ordering {
        Some(o) => o,
        None => return Some(false), // NaN operand: comparison is false
    };
    Some(match op {
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Le => ordering != Greater,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::Ge => ordering != Less,
        _ => unreachable!("compare only handles ordering operators"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCategory, SourceContext};
    use crate::runtime::env;
    use crate::syntax::parser;

    fn eval_source(source: &str) -> Result<Value, GlossaError> {
        let ctx = PhaseContext::new(SourceContext::from_file("test", source), "eval");
        let ast = parser::parse_expression(source, &ctx)?;
        let globals = env::with_builtins();
        Evaluator::new(&ctx).eval(&ast, &globals)
    }

    fn eval_ok(source: &str) -> Value {
        eval_source(source).unwrap()
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval_ok("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval_ok("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval_ok("7 % 4"), Value::Number(3.0));
        assert_eq!(eval_ok("-2 * -3"), Value::Number(6.0));
    }

    #[test]
    fn string_concat_and_comparison() {
        assert_eq!(eval_ok("'foo' + 'bar'"), Value::String("foobar".into()));
        assert_eq!(eval_ok("'a' < 'b'"), Value::Bool(true));
        assert_eq!(eval_ok("'abc' == 'abc'"), Value::Bool(true));
    }

    #[test]
    fn short_circuit_skips_right_side() {
        // `missing` is undefined; short-circuiting must never evaluate it.
        assert_eq!(eval_ok("false && missing"), Value::Bool(false));
        assert_eq!(eval_ok("1 || missing"), Value::Number(1.0));
        assert!(eval_source("true && missing").is_err());
    }

    #[test]
    fn conditional_uses_truthiness() {
        assert_eq!(eval_ok("0 ? 'yes' : 'no'"), Value::String("no".into()));
        assert_eq!(eval_ok("[] ? 1 : 2"), Value::Number(1.0));
    }

    #[test]
    fn lambda_call_and_closure() {
        assert_eq!(eval_ok("((x, y) => x + y)(2, 3)"), Value::Number(5.0));
        assert_eq!(eval_ok("(x => (y => x + y))(10)(4)"), Value::Number(14.0));
    }

    #[test]
    fn recursion_through_the_global_scope() {
        let source = "fact(5)";
        let ctx = PhaseContext::new(SourceContext::from_file("test", source), "eval");
        let globals = env::with_builtins();
        let evaluator = Evaluator::new(&ctx);

        let def = "n => n < 2 ? 1 : n * fact(n - 1)";
        let def_ctx = PhaseContext::new(SourceContext::from_file("def", def), "eval");
        let lambda = parser::parse_expression(def, &def_ctx).unwrap();
        let value = evaluator.eval(&lambda, &globals).unwrap();
        globals.define("fact", value);

        let call = parser::parse_expression(source, &ctx).unwrap();
        assert_eq!(evaluator.eval(&call, &globals).unwrap(), Value::Number(120.0));
    }

    #[test]
    fn member_and_index_access() {
        assert_eq!(eval_ok("{ a: 1, b: 2 }.b"), Value::Number(2.0));
        assert_eq!(eval_ok("[10, 20, 30][1]"), Value::Number(20.0));
        assert_eq!(eval_ok("{ a: 1 }['a']"), Value::Number(1.0));
        assert_eq!(eval_ok("'abc'[2]"), Value::String("c".into()));
    }

    #[test]
    fn missing_key_and_bad_index_are_errors() {
        let err = eval_source("{ a: 1 }.b").unwrap_err();
        assert_eq!(err.kind.category(), ErrorCategory::Runtime);
        assert!(eval_source("[1, 2][5]").is_err());
        assert!(eval_source("[1, 2][0.5]").is_err());
    }

    #[test]
    fn undefined_symbol_is_an_error() {
        let err = eval_source("nope + 1").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UndefinedSymbol { ref symbol } if symbol == "nope"));
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let err = eval_source("((x, y) => x)(1)").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityMismatch { actual: 1, .. }));
    }

    #[test]
    fn builtins_are_callable() {
        assert_eq!(eval_ok("len('abc')"), Value::Number(3.0));
        assert_eq!(eval_ok("len([1, 2])"), Value::Number(2.0));
        assert_eq!(eval_ok("abs(-4)"), Value::Number(4.0));
        assert_eq!(eval_ok("min(3, 1, 2)"), Value::Number(1.0));
        assert_eq!(eval_ok("max(3, 1, 2)"), Value::Number(3.0));
        assert_eq!(
            eval_ok("keys({ b: 1, a: 2 })"),
            Value::List(vec![Value::String("a".into()), Value::String("b".into())])
        );
    }

    #[test]
    fn runaway_recursion_hits_the_depth_guard() {
        let source = "loop(0)";
        let ctx = PhaseContext::new(SourceContext::from_file("test", source), "eval");
        let globals = env::with_builtins();
        let evaluator = Evaluator::new(&ctx);

        let def = "n => loop(n + 1)";
        let def_ctx = PhaseContext::new(SourceContext::from_file("def", def), "eval");
        let lambda = parser::parse_expression(def, &def_ctx).unwrap();
        globals.define("loop", evaluator.eval(&lambda, &globals).unwrap());

        let call = parser::parse_expression(source, &ctx).unwrap();
        let err = evaluator.eval(&call, &globals).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RecursionLimit));
    }
}
