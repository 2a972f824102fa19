use pest_derive::Parser;

use crate::location::{Location, Span};
use crate::source::SourceFile;
use crate::syntax::err::SyntaxError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct TrellisParser;

pub(crate) fn fetch_next_pair<'a>(
    pairs: &mut pest::iterators::Pairs<'a, Rule>,
    location: &Option<Location>,
    span: &Option<Span>,
    issuer: &str,
) -> Result<pest::iterators::Pair<'a, Rule>, SyntaxError> {
    match pairs.next() {
        Some(pair) => Ok(pair),
        None => Err(SyntaxError::with(
            crate::Level::Error,
            "Expected more inner pairs but found none.".into(),
            issuer.into(),
            location.clone(),
            span.clone(),
        )),
    }
}

pub(crate) fn get_data_from_rule<'a>(
    rule: &pest::iterators::Pair<'a, Rule>,
    source: &SourceFile,
) -> (
    pest::iterators::Pairs<'a, Rule>,
    Option<Location>,
    Option<Span>,
) {
    let inner_rules = rule.clone().into_inner();
    let span = get_span_from_pair(rule, source);
    let location = get_location_from_pair(rule, source);
    (inner_rules, location, span)
}

pub fn get_location_from_pair(
    rule: &pest::iterators::Pair<Rule>,
    source: &SourceFile,
) -> Option<Location> {
    Some(Location::from_position(&source.name, rule.as_span().start_pos()))
}

pub fn get_span_from_pair(rule: &pest::iterators::Pair<Rule>, source: &SourceFile) -> Option<Span> {
    Some(Span::from_pest(&source.name, rule.as_span()))
}

/// Collect the identifiers of an optional `param_list` pair.
pub(crate) fn collect_params(pair: Option<pest::iterators::Pair<Rule>>) -> Vec<String> {
    match pair {
        Some(p) if p.as_rule() == Rule::param_list => {
            p.into_inner().map(|ident| ident.as_str().to_string()).collect()
        }
        _ => Vec::new(),
    }
}
