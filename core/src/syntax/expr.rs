use pest::iterators::Pair;

use crate::source::SourceFile;
use crate::syntax::err::SyntaxError;
use crate::syntax::{Rule, SyntaxKind, SyntaxNode, rules, stmt};

pub(crate) fn parse_expression_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let issuer = "trellis.syntax.parse_expression_rule";
    let rule = pair.as_rule();
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    match rule {
        Rule::expression => {
            let next = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            parse_expression_rule(next, source)
        }
        Rule::or_expr | Rule::and_expr | Rule::comparison | Rule::additive | Rule::multiplicative => {
            parse_binary_chain_rule(pair, source)
        }
        Rule::unary => {
            let mut operators = Vec::new();
            let mut operand = None;
            for next in inner_pairs {
                if next.as_rule() == Rule::unary_op {
                    operators.push(next);
                } else {
                    operand = Some(parse_expression_rule(next, source)?);
                }
            }
            let mut node = operand.ok_or_else(|| {
                SyntaxError::with(
                    crate::Level::Error,
                    "Unary expression without an operand.".into(),
                    issuer.into(),
                    location.clone(),
                    span.clone(),
                )
            })?;
            // innermost operator applies first
            for op_pair in operators.into_iter().rev() {
                node = SyntaxNode::new(
                    SyntaxKind::Unary {
                        operator: op_pair.as_str().to_string(),
                    },
                    rules::get_location_from_pair(&op_pair, source),
                    rules::get_span_from_pair(&op_pair, source),
                )
                .with_child(node);
            }
            Ok(node)
        }
        Rule::match_expr => {
            let mut clauses = Vec::new();
            for clause_pair in inner_pairs {
                clauses.push(parse_match_clause_rule(clause_pair, source)?);
            }
            Ok(SyntaxNode::new(SyntaxKind::Match, location, span).with_children(clauses))
        }
        Rule::closure => {
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
            let body = match body_pair.as_rule() {
                Rule::block => stmt::parse_block_rule(body_pair, source)?,
                _ => parse_expression_rule(body_pair, source)?,
            };
            Ok(SyntaxNode::new(SyntaxKind::Closure { params }, location, span).with_child(body))
        }
        Rule::call => {
            let name = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?
                .as_str()
                .to_string();
            let mut args = Vec::new();
            if let Some(arg_list) = inner_pairs.next() {
                for arg_pair in arg_list.into_inner() {
                    args.push(parse_expression_rule(arg_pair, source)?);
                }
            }
            Ok(SyntaxNode::new(SyntaxKind::Call { name }, location, span).with_children(args))
        }
        Rule::identifier => Ok(SyntaxNode::new(
            SyntaxKind::Identifier {
                name: pair.as_str().to_string(),
            },
            location,
            span,
        )),
        Rule::integer => {
            let value = pair.as_str().parse::<i64>().map_err(|e| {
                SyntaxError::with(
                    crate::Level::Error,
                    format!("Invalid integer literal '{}': {}", pair.as_str(), e),
                    issuer.into(),
                    location.clone(),
                    span.clone(),
                )
            })?;
            Ok(SyntaxNode::new(SyntaxKind::Integer { value }, location, span))
        }
        Rule::float => {
            let value = pair.as_str().parse::<f64>().map_err(|e| {
                SyntaxError::with(
                    crate::Level::Error,
                    format!("Invalid float literal '{}': {}", pair.as_str(), e),
                    issuer.into(),
                    location.clone(),
                    span.clone(),
                )
            })?;
            Ok(SyntaxNode::new(SyntaxKind::Float { value }, location, span))
        }
        Rule::string => {
            let raw = inner_pairs.next().map(|p| p.as_str()).unwrap_or("");
            Ok(SyntaxNode::new(
                SyntaxKind::Str {
                    value: unescape(raw),
                },
                location,
                span,
            ))
        }
        Rule::boolean => Ok(SyntaxNode::new(
            SyntaxKind::Bool {
                value: pair.as_str() == "true",
            },
            location,
            span,
        )),
        Rule::null => Ok(SyntaxNode::new(SyntaxKind::Null, location, span)),
        other => Err(SyntaxError::with(
            crate::Level::Error,
            format!("Unexpected expression type: {:?}", other),
            issuer.into(),
            location,
            span,
        )),
    }
}

/// Fold `operand (op operand)*` into left-associative `Binary` nodes.
fn parse_binary_chain_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let issuer = "trellis.syntax.parse_binary_chain_rule";
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);

    let left_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
    let mut node = parse_expression_rule(left_pair, source)?;

    while let Some(op_pair) = inner_pairs.next() {
        let right_pair = match inner_pairs.next() {
            Some(rp) => rp,
            None => {
                return Err(SyntaxError::with(
                    crate::Level::Error,
                    format!("Missing right-hand operand for operator '{}'.", op_pair.as_str()),
                    issuer.into(),
                    location.clone(),
                    span.clone(),
                ));
            }
        };
        let right_node = parse_expression_rule(right_pair, source)?;
        node = SyntaxNode::new(
            SyntaxKind::Binary {
                operator: op_pair.as_str().to_string(),
            },
            rules::get_location_from_pair(&op_pair, source),
            rules::get_span_from_pair(&op_pair, source),
        )
        .with_children(vec![node, right_node]);
    }

    Ok(node)
}

fn parse_match_clause_rule(pair: Pair<Rule>, source: &SourceFile) -> Result<SyntaxNode, SyntaxError> {
    let issuer = "trellis.syntax.parse_match_clause_rule";
    let rule = pair.as_rule();
    let (mut inner_pairs, location, span) = rules::get_data_from_rule(&pair, source);
    match rule {
        Rule::match_when => {
            let cond_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            let value_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            Ok(SyntaxNode::new(SyntaxKind::When, location, span)
                .with_child(parse_expression_rule(cond_pair, source)?)
                .with_child(parse_expression_rule(value_pair, source)?))
        }
        Rule::match_otherwise => {
            let value_pair = rules::fetch_next_pair(&mut inner_pairs, &location, &span, issuer)?;
            Ok(SyntaxNode::new(SyntaxKind::Otherwise, location, span)
                .with_child(parse_expression_rule(value_pair, source)?))
        }
        other => Err(SyntaxError::with(
            crate::Level::Error,
            format!("Unexpected match clause: {:?}", other),
            issuer.into(),
            location,
            span,
        )),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
