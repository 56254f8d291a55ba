//! Glossa Parser - Clean, Minimal Implementation
//!
//! Converts Glossa source code into Abstract Syntax Tree nodes with source
//! location tracking. This parser is purely syntactic - no semantic analysis.
//!
//! Two entry points matter to the harness: [`parse_program`] for whole files
//! (declarations plus collected block comments), and
//! [`parse_expression_prefix`] which parses a single expression from the start
//! of a string and reports how many bytes it consumed - the expression-pair
//! parser is built on that.

use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

use crate::errors::{to_source_span, ErrorReporting, GlossaError, PhaseContext};
use crate::syntax::{node, AstNode, BinaryOp, BlockComment, Decl, Expr, Program, Span, UnaryOp};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct GlossaParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a whole Glossa source file into declarations and block comments.
pub fn parse_program(source: &str, ctx: &PhaseContext) -> Result<Program, GlossaError> {
    let mut pairs = GlossaParser::parse(Rule::program, source)
        .map_err(|e| convert_parse_error(e, ctx))?;

    let program = pairs.next().unwrap(); // pest guarantees program rule exists

    // Implicitly-skipped comments surface as bare COMMENT leaf pairs, never
    // as block_comment/line_comment children, so match on the text.
    let mut comments = Vec::new();
    for pair in program.clone().into_inner().flatten() {
        if pair.as_rule() == Rule::COMMENT && pair.as_str().starts_with("/*") {
            let text = pair.as_str();
            comments.push(BlockComment {
                text: text[2..text.len() - 2].to_string(),
                span: get_span(&pair),
            });
        }
    }

    let mut decls = Vec::new();
    for pair in program.into_inner() {
        if pair.as_rule() == Rule::decl {
            decls.push(build_decl(pair, ctx)?);
        }
    }

    Ok(Program { decls, comments })
}

/// Parse one expression from the start of `input`, ignoring whatever follows.
/// Returns the AST node and the number of bytes consumed. Leading whitespace
/// is not skipped; callers track their own offsets. The consumed count never
/// includes trailing whitespace, so `input[..consumed]` is the exact
/// expression text.
pub fn parse_expression_prefix(
    input: &str,
    ctx: &PhaseContext,
) -> Result<(AstNode, usize), GlossaError> {
    let mut pairs =
        GlossaParser::parse(Rule::expr, input).map_err(|e| convert_parse_error(e, ctx))?;
    let pair = pairs.next().unwrap(); // pest guarantees the matched rule exists
    // The pair's span can swallow implicit whitespace past the last token.
    let consumed = input[..pair.as_span().end()].trim_end().len();
    let ast = build_ast_node(pair, ctx)?;
    Ok((ast, consumed))
}

/// Parse `input` as exactly one expression; trailing non-whitespace is an error.
pub fn parse_expression(input: &str, ctx: &PhaseContext) -> Result<AstNode, GlossaError> {
    let (ast, consumed) = parse_expression_prefix(input, ctx)?;
    let rest = &input[consumed..];
    if !rest.trim().is_empty() {
        return Err(ctx.unexpected_token(
            "end of expression",
            rest.trim(),
            (consumed..input.len()).into(),
        ));
    }
    Ok(ast)
}

// ============================================================================
// AST BUILDERS
// ============================================================================

/// Inner pairs of a rule, with interspersed comment pairs filtered out.
/// COMMENT is non-silent in the grammar so comments can show up anywhere.
fn children(pair: Pair<Rule>) -> impl Iterator<Item = Pair<Rule>> {
    pair.into_inner().filter(|p| p.as_rule() != Rule::COMMENT)
}

fn build_decl(pair: Pair<Rule>, ctx: &PhaseContext) -> Result<Decl, GlossaError> {
    let span = get_span(&pair);
    let mut inner = children(pair);
    let _keyword = inner.next().unwrap(); // grammar guarantees decl_kw
    let name = inner.next().unwrap().as_str().to_string(); // grammar guarantees name
    let init = build_ast_node(inner.next().unwrap(), ctx)?; // grammar guarantees initializer
    Ok(Decl { name, init, span })
}

fn build_ast_node(pair: Pair<Rule>, ctx: &PhaseContext) -> Result<AstNode, GlossaError> {
    let span = get_span(&pair);

    match pair.as_rule() {
        Rule::expr | Rule::primary | Rule::literal | Rule::paren => {
            let inner = children(pair).next().unwrap(); // grammar guarantees inner exists
            build_ast_node(inner, ctx)
        }

        Rule::conditional => {
            let mut inner = children(pair);
            let condition = build_ast_node(inner.next().unwrap(), ctx)?;
            match (inner.next(), inner.next()) {
                (Some(then_pair), Some(else_pair)) => {
                    let then_branch = build_ast_node(then_pair, ctx)?;
                    let else_branch = build_ast_node(else_pair, ctx)?;
                    let span = Span {
                        start: condition.span.start,
                        end: else_branch.span.end,
                    };
                    Ok(node(
                        Expr::Conditional {
                            condition: Box::new(condition),
                            then_branch: Box::new(then_branch),
                            else_branch: Box::new(else_branch),
                            span,
                        },
                        span,
                    ))
                }
                _ => Ok(condition),
            }
        }

        Rule::logic_or
        | Rule::logic_and
        | Rule::equality
        | Rule::comparison
        | Rule::term
        | Rule::factor => build_binary_chain(pair, ctx),

        Rule::unary => {
            let pairs: Vec<_> = children(pair).collect();
            let (operand, ops) = pairs.split_last().unwrap(); // grammar guarantees operand
            let mut result = build_ast_node(operand.clone(), ctx)?;
            for op_pair in ops.iter().rev() {
                let op = match op_pair.as_str() {
                    "-" => UnaryOp::Neg,
                    _ => UnaryOp::Not,
                };
                let span = Span {
                    start: op_pair.as_span().start(),
                    end: result.span.end,
                };
                result = node(
                    Expr::Unary {
                        op,
                        operand: Box::new(result),
                        span,
                    },
                    span,
                );
            }
            Ok(result)
        }

        Rule::postfix => {
            let mut inner = children(pair);
            let mut result = build_ast_node(inner.next().unwrap(), ctx)?;
            for op_pair in inner {
                result = build_postfix_op(result, op_pair, ctx)?;
            }
            Ok(result)
        }

        Rule::number => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|_| {
                ctx.invalid_literal("number", text, to_source_span(span))
            })?;
            Ok(node(Expr::Number(value, span), span))
        }

        Rule::string => {
            let content = unescape_string(pair.as_str(), ctx, span)?;
            Ok(node(Expr::String(content, span), span))
        }

        Rule::boolean => {
            let value = pair.as_str() == "true";
            Ok(node(Expr::Bool(value, span), span))
        }

        Rule::null => Ok(node(Expr::Null(span), span)),

        Rule::ident => Ok(node(Expr::Ident(pair.as_str().to_string(), span), span)),

        Rule::array => {
            let items = children(pair)
                .map(|p| build_ast_node(p, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(node(Expr::Array(items, span), span))
        }

        Rule::object => {
            let mut entries = Vec::new();
            for entry in children(pair) {
                let mut kv = children(entry);
                let key = build_object_key(kv.next().unwrap(), ctx)?;
                let value = build_ast_node(kv.next().unwrap(), ctx)?;
                entries.push((key, value));
            }
            Ok(node(Expr::Object(entries, span), span))
        }

        Rule::lambda => {
            let mut inner = children(pair);
            let params = children(inner.next().unwrap())
                .map(|p| p.as_str().to_string())
                .collect();
            let body = build_ast_node(inner.next().unwrap(), ctx)?;
            Ok(node(
                Expr::Lambda {
                    params,
                    body: Box::new(body),
                    span,
                },
                span,
            ))
        }

        rule => unreachable!("unhandled grammar rule {:?}", rule),
    }
}

fn build_binary_chain(pair: Pair<Rule>, ctx: &PhaseContext) -> Result<AstNode, GlossaError> {
    let mut inner = children(pair);
    let mut left = build_ast_node(inner.next().unwrap(), ctx)?;
    while let Some(op_pair) = inner.next() {
        let right = build_ast_node(inner.next().unwrap(), ctx)?; // operand always follows operator
        let op = binary_op(op_pair.as_str());
        let span = Span {
            start: left.span.start,
            end: right.span.end,
        };
        left = node(
            Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            },
            span,
        );
    }
    Ok(left)
}

fn build_postfix_op(
    object: AstNode,
    op_pair: Pair<Rule>,
    ctx: &PhaseContext,
) -> Result<AstNode, GlossaError> {
    let span = Span {
        start: object.span.start,
        end: op_pair.as_span().end(),
    };
    let inner = children(op_pair).next().unwrap(); // grammar guarantees inner exists

    match inner.as_rule() {
        Rule::call_args => {
            let args = children(inner)
                .map(|p| build_ast_node(p, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(node(
                Expr::Call {
                    callee: Box::new(object),
                    args,
                    span,
                },
                span,
            ))
        }
        Rule::member => {
            let property = children(inner).next().unwrap().as_str().to_string();
            Ok(node(
                Expr::Member {
                    object: Box::new(object),
                    property,
                    span,
                },
                span,
            ))
        }
        Rule::index => {
            let index = build_ast_node(children(inner).next().unwrap(), ctx)?;
            Ok(node(
                Expr::Index {
                    object: Box::new(object),
                    index: Box::new(index),
                    span,
                },
                span,
            ))
        }
        rule => unreachable!("unhandled postfix rule {:?}", rule),
    }
}

fn build_object_key(pair: Pair<Rule>, ctx: &PhaseContext) -> Result<String, GlossaError> {
    let inner = children(pair).next().unwrap(); // object_key wraps ident | string
    match inner.as_rule() {
        Rule::string => {
            let span = get_span(&inner);
            unescape_string(inner.as_str(), ctx, span)
        }
        _ => Ok(inner.as_str().to_string()),
    }
}

fn binary_op(symbol: &str) -> BinaryOp {
    match symbol {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "&&" => BinaryOp::And,
        "||" => BinaryOp::Or,
        other => unreachable!("unhandled binary operator {:?}", other),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span {
        start: span.start(),
        end: span.end(),
    }
}

fn unescape_string(
    quoted: &str,
    ctx: &PhaseContext,
    span: Span,
) -> Result<String, GlossaError> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            other => {
                let escape = format!("\\{}", other.map(String::from).unwrap_or_default());
                return Err(ctx.invalid_literal("string escape", &escape, to_source_span(span)));
            }
        }
    }
    Ok(out)
}

fn convert_parse_error(error: pest::error::Error<Rule>, ctx: &PhaseContext) -> GlossaError {
    use pest::error::{ErrorVariant, InputLocation};

    let span = match error.location {
        InputLocation::Pos(p) => miette::SourceSpan::from(p..p),
        InputLocation::Span((s, e)) => miette::SourceSpan::from(s..e),
    };

    match &error.variant {
        ErrorVariant::ParsingError { positives, .. } => {
            let expected = if positives.is_empty() {
                "valid syntax".to_string()
            } else {
                let mut names: Vec<&str> = positives.iter().map(rule_name).collect();
                names.dedup();
                names.join(" or ")
            };
            ctx.unexpected_token(&expected, "unexpected input", span)
        }
        ErrorVariant::CustomError { message } => {
            ctx.unexpected_token(message, "unexpected input", span)
        }
    }
}

fn rule_name(rule: &Rule) -> &'static str {
    match rule {
        Rule::program => "program",
        Rule::decl | Rule::decl_kw => "declaration",
        Rule::expr
        | Rule::conditional
        | Rule::logic_or
        | Rule::logic_and
        | Rule::equality
        | Rule::comparison
        | Rule::term
        | Rule::factor
        | Rule::unary
        | Rule::postfix
        | Rule::primary => "expression",
        Rule::or_op | Rule::and_op | Rule::eq_op | Rule::cmp_op | Rule::add_op | Rule::mul_op
        | Rule::unary_op => "operator",
        Rule::postfix_op | Rule::call_args => "argument list",
        Rule::member => "member access",
        Rule::index => "index",
        Rule::paren => "parenthesized expression",
        Rule::literal => "literal",
        Rule::lambda | Rule::lambda_params => "lambda",
        Rule::array => "array",
        Rule::object | Rule::object_entry | Rule::object_key => "object",
        Rule::number => "number",
        Rule::string | Rule::dq_char | Rule::sq_char => "string",
        Rule::boolean => "boolean",
        Rule::null => "null",
        Rule::ident | Rule::ident_start | Rule::ident_char | Rule::keyword => "identifier",
        Rule::COMMENT | Rule::block_comment | Rule::line_comment => "comment",
        Rule::WHITESPACE => "whitespace",
        Rule::EOI => "end of input",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceContext;

    fn ctx(source: &str) -> PhaseContext {
        PhaseContext::new(SourceContext::from_file("test.gls", source), "parse")
    }

    #[test]
    fn parses_declarations_in_order() {
        let source = "const a = 1;\nlet b = a + 2;\n";
        let program = parse_program(source, &ctx(source)).unwrap();
        assert_eq!(program.decls.len(), 2);
        assert_eq!(program.decls[0].name, "a");
        assert_eq!(program.decls[1].name, "b");
        assert!(program.decls[0].span.start < program.decls[1].span.start);
    }

    #[test]
    fn collects_block_comments_with_spans() {
        let source = "/** doc */ const a = 1; // line\nconst b = 2;";
        let program = parse_program(source, &ctx(source)).unwrap();
        assert_eq!(program.comments.len(), 1);
        assert_eq!(program.comments[0].text, "* doc ");
        assert_eq!(&source[program.comments[0].span.start..program.comments[0].span.end], "/** doc */");
    }

    #[test]
    fn declaration_span_includes_semicolon() {
        let source = "const a = 1 + 2;";
        let program = parse_program(source, &ctx(source)).unwrap();
        assert_eq!(&source[program.decls[0].span.start..program.decls[0].span.end], source);
    }

    #[test]
    fn prefix_parse_stops_at_unconsumed_input() {
        let source = "add(2, 3)} 5";
        let (_, consumed) = parse_expression_prefix(source, &ctx(source)).unwrap();
        assert_eq!(&source[..consumed], "add(2, 3)");
    }

    #[test]
    fn prefix_parse_excludes_trailing_whitespace() {
        let source = "add(2, 3)   } 5";
        let (_, consumed) = parse_expression_prefix(source, &ctx(source)).unwrap();
        assert_eq!(&source[..consumed], "add(2, 3)");

        let source = "1 + 2  ";
        let (_, consumed) = parse_expression_prefix(source, &ctx(source)).unwrap();
        assert_eq!(&source[..consumed], "1 + 2");
    }

    #[test]
    fn line_comments_are_never_collected() {
        let source = "// header\nconst a = 1; // trailing\n/* block */ const b = 2;";
        let program = parse_program(source, &ctx(source)).unwrap();
        assert_eq!(program.comments.len(), 1);
        assert_eq!(program.comments[0].text, " block ");
    }

    #[test]
    fn precedence_multiplication_binds_tighter() {
        let source = "1 + 2 * 3";
        let ast = parse_expression(source, &ctx(source)).unwrap();
        let Expr::Binary { op: BinaryOp::Add, right, .. } = &*ast.value else {
            panic!("expected top-level addition");
        };
        assert!(matches!(&*right.value, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn lambda_and_paren_disambiguate() {
        let source = "(x) => x + 1";
        let ast = parse_expression(source, &ctx(source)).unwrap();
        assert!(matches!(&*ast.value, Expr::Lambda { params, .. } if params == &["x"]));

        let source = "(1 + 2) * 3";
        let ast = parse_expression(source, &ctx(source)).unwrap();
        assert!(matches!(&*ast.value, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn object_literal_parses_bare_and_quoted_keys() {
        let source = "{ a: 1, \"b c\": 2 }";
        let ast = parse_expression(source, &ctx(source)).unwrap();
        let Expr::Object(entries, _) = &*ast.value else {
            panic!("expected object literal");
        };
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[1].0, "b c");
    }

    #[test]
    fn keywords_are_not_identifiers() {
        let source = "const null = 1;";
        assert!(parse_program(source, &ctx(source)).is_err());
    }

    #[test]
    fn unbalanced_input_is_a_parse_error() {
        let source = "const a = (1 + ;";
        let err = parse_program(source, &ctx(source)).unwrap_err();
        assert_eq!(err.kind.category(), crate::errors::ErrorCategory::Parse);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let source = r#""a\n\t\"b\"""#;
        let ast = parse_expression(source, &ctx(source)).unwrap();
        assert!(matches!(&*ast.value, Expr::String(s, _) if s == "a\n\t\"b\""));
    }

    #[test]
    fn trailing_garbage_rejected_by_full_parse() {
        let source = "1 + 2 }";
        assert!(parse_expression(source, &ctx(source)).is_err());
        assert!(parse_expression_prefix(source, &ctx(source)).is_ok());
    }
}
