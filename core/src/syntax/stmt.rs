//! file: core/src/syntax/stmt.rs
//! description: conversion of declaration and statement pairs.
//!
//! Functions here consume `pest` pairs for the compilation unit, function
//! declarations, blocks and statements, and return `SyntaxNode`s carrying the
//! `Location`/`Span` of the rule they came from.
//!
use pest::iterators::Pair;

use crate::source::SourceFile;
use crate::syntax::err::SyntaxError;
use crate::syntax::{CompilationUnit, Rule, SyntaxKind, SyntaxNode, expr, rules};

pub(crate) fn parse_compilation_unit_rule(
    pair: Pair<Rule>,
    source: &SourceFile,
) -> Result<CompilationUnit, SyntaxError> {
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    let module_pair = rules::fetch_next_pair(
        &mut inner_pairs,
        &location,
        &span,
        "trellis.syntax.parse_compilation_unit_rule",
    )?;
    let module_name = module_pair
        .into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();

    let mut unit = CompilationUnit::new(&source.name, &module_name, location);
    for next in inner_pairs {
        match next.as_rule() {
            Rule::function_decl => unit.functions.push(parse_function_rule(next, source)?),
            Rule::EOI => {}
            other => {
                return Err(SyntaxError::with(
                    crate::Level::Error,
                    format!("Unexpected top-level rule: {:?}", other),
                    "trellis.syntax.parse_compilation_unit_rule".into(),
                    rules::get_location_from_pair(&next, source),
                    rules::get_span_from_pair(&next, source),
                ));
            }
        }
    }
    Ok(unit)
}

fn parse_function_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let issuer = "trellis.syntax.parse_function_rule";
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?
        .as_str()
        .to_string();

    // param_list is optional; only consume it if present
    let params = if inner_pairs
        .peek()
        .map(|p| p.as_rule() == Rule::param_list)
        .unwrap_or(false)
    {
        rules::collect_params(inner_pairs.next())
    } else {
        Vec::new()
    };

    let body_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
    let body = parse_block_rule(body_pair, source)?;
    Ok(SyntaxNode::new(SyntaxKind::Function { name, params }, location, span).with_child(body))
}

pub(crate) fn parse_block_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let (inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    let mut statements = Vec::new();
    for stmt_pair in inner_pairs {
        statements.push(parse_statement_rule(stmt_pair, source)?);
    }
    Ok(SyntaxNode::new(SyntaxKind::Block, location, span).with_children(statements))
}

fn parse_statement_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let issuer = "trellis.syntax.parse_statement_rule";
    let rule = pair.as_rule();
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    match rule {
        Rule::let_stmt | Rule::var_stmt | Rule::assign_stmt => {
            let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?
                .as_str()
                .to_string();
            let value_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            let value = expr::parse_expression_rule(value_pair, source)?;
            let kind = match rule {
                Rule::let_stmt => SyntaxKind::Let { name },
                Rule::var_stmt => SyntaxKind::Var { name },
                _ => SyntaxKind::Assign { name },
            };
            Ok(SyntaxNode::new(kind, location, span).with_child(value))
        }
        Rule::return_stmt => {
            let mut node = SyntaxNode::new(SyntaxKind::Return, location, span);
            if let Some(expr_pair) = inner_pairs.next() {
                node = node.with_child(expr::parse_expression_rule(expr_pair, source)?);
            }
            Ok(node)
        }
        Rule::if_stmt => {
            let cond_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            let block_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            let mut node = SyntaxNode::new(SyntaxKind::If, location, span)
                .with_child(expr::parse_expression_rule(cond_pair, source)?)
                .with_child(parse_block_rule(block_pair, source)?);
            if let Some(else_pair) = inner_pairs.next() {
                let else_node = match else_pair.as_rule() {
                    Rule::if_stmt => parse_statement_rule(else_pair, source)?,
                    _ => parse_block_rule(else_pair, source)?,
                };
                node = node.with_child(else_node);
            }
            Ok(node)
        }
        Rule::while_stmt => {
            let cond_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            let block_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            Ok(SyntaxNode::new(SyntaxKind::While, location, span)
                .with_child(expr::parse_expression_rule(cond_pair, source)?)
                .with_child(parse_block_rule(block_pair, source)?))
        }
        Rule::case_stmt => {
            let mut clauses = Vec::new();
            for clause_pair in inner_pairs {
                clauses.push(parse_case_clause_rule(clause_pair, source)?);
            }
            Ok(SyntaxNode::new(SyntaxKind::Case, location, span).with_children(clauses))
        }
        Rule::expression_stmt => {
            let expr_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            expr::parse_expression_rule(expr_pair, source)
        }
        other => Err(SyntaxError::with(
            crate::Level::Error,
            format!("Unexpected statement type: {:?}", other),
            issuer.into(),
            location,
            span,
        )),
    }
}

fn parse_case_clause_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let issuer = "trellis.syntax.parse_case_clause_rule";
    let rule = pair.as_rule();
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    match rule {
        Rule::when_clause => {
            let cond_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            let block_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            Ok(SyntaxNode::new(SyntaxKind::When, location, span)
                .with_child(expr::parse_expression_rule(cond_pair, source)?)
                .with_child(parse_block_rule(block_pair, source)?))
        }
        Rule::otherwise_clause => {
            let block_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            Ok(SyntaxNode::new(SyntaxKind::Otherwise, location, span)
                .with_child(parse_block_rule(block_pair, source)?))
        }
        other => Err(SyntaxError::with(
            crate::Level::Error,
            format!("Unexpected case clause: {:?}", other),
            issuer.into(),
            location,
            span,
        )),
    }
}
