//! Syntax module for Glossa scripts
//!
//! This module provides the Abstract Syntax Tree types for the small
//! JS-flavoured expression language that scanned files are written in, with
//! source location tracking throughout.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod parser;

/// Represents a span in the source code.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

/// Canonical AST node type with shared ownership, so lambda bodies can be
/// stored in runtime values without cloning whole subtrees.
pub type AstNode = Spanned<Arc<Expr>>;

/// Binary operators, in source notation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// The operator's source spelling, for diagnostics.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// The core AST node for Glossa expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64, Span),
    String(String, Span),
    Bool(bool, Span),
    Null(Span),
    Ident(String, Span),
    Array(Vec<AstNode>, Span),
    Object(Vec<(String, AstNode)>, Span),
    Lambda {
        params: Vec<String>,
        body: Box<AstNode>,
        span: Span,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        span: Span,
    },
    Member {
        object: Box<AstNode>,
        property: String,
        span: Span,
    },
    Index {
        object: Box<AstNode>,
        index: Box<AstNode>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<AstNode>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        span: Span,
    },
    Conditional {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Box<AstNode>,
        span: Span,
    },
}

impl Expr {
    /// Returns the span of this expression.
    pub fn span(&self) -> Span {
        use Expr::*;
        match self {
            Number(_, span)
            | String(_, span)
            | Bool(_, span)
            | Null(span)
            | Ident(_, span)
            | Array(_, span)
            | Object(_, span)
            | Lambda { span, .. }
            | Call { span, .. }
            | Member { span, .. }
            | Index { span, .. }
            | Unary { span, .. }
            | Binary { span, .. }
            | Conditional { span, .. } => *span,
        }
    }
}

/// Helper to wrap an expression into a shared, spanned AST node.
pub fn node(expr: Expr, span: Span) -> AstNode {
    Spanned {
        value: Arc::new(expr),
        span,
    }
}

/// One top-level `const`/`let` declaration. The span covers the whole
/// statement including the trailing semicolon; immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    pub init: AstNode,
    pub span: Span,
}

/// A block comment collected during parsing. `text` is the inner text with
/// the `/*` and `*/` delimiters stripped; `span` covers the delimiters too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockComment {
    pub text: String,
    pub span: Span,
}

/// A parsed source file: top-level declarations in source order plus every
/// block comment encountered, also in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub comments: Vec<BlockComment>,
}
