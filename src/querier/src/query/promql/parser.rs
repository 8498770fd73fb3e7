//! Series selector parsing
//!
//! Wraps the promql-parser crate and reduces a `match[]` value to the flat
//! list of label matchers the discovery service translates.

use promql_parser::label::{MatchOp, Matcher};
use promql_parser::parser::{self, Expr, VectorSelector};

use super::error::PromQLError;
use super::types::{LabelMatcher, MatcherOp};
use prometheus_api::METRIC_NAME_LABEL;

/// Parse a series selector such as `http_requests_total{job="api"}`
///
/// Only plain instant vector selectors are accepted, which is what the
/// Prometheus discovery endpoints allow for `match[]`.
///
/// A metric name written in front of the braces is returned as an
/// `__name__` equality matcher ahead of the brace matchers.
///
/// # Examples
/// ```ignore
/// let matchers = parse_metric_selector(r#"up{job=~"api.*"}"#)?;
/// assert_eq!(matchers[0], LabelMatcher::equal("__name__", "up"));
/// ```
pub fn parse_metric_selector(selector: &str) -> Result<Vec<LabelMatcher>, PromQLError> {
    let expr = parser::parse(selector).map_err(PromQLError::ParseError)?;

    match expr {
        Expr::VectorSelector(vs) => selector_matchers(&vs),
        Expr::Paren(paren) => match paren.expr.as_ref() {
            Expr::VectorSelector(vs) => selector_matchers(vs),
            _ => Err(not_a_selector(selector)),
        },
        _ => Err(not_a_selector(selector)),
    }
}

fn not_a_selector(selector: &str) -> PromQLError {
    PromQLError::UnsupportedFeature(format!("{selector:?} is not a series selector"))
}

fn selector_matchers(vs: &VectorSelector) -> Result<Vec<LabelMatcher>, PromQLError> {
    if vs.offset.is_some() || vs.at.is_some() {
        return Err(PromQLError::UnsupportedFeature(
            "offset and @ modifiers are not allowed in series selectors".to_string(),
        ));
    }

    if !vs.matchers.or_matchers.is_empty() {
        return Err(PromQLError::UnsupportedFeature(
            "`or` label matchers are not supported".to_string(),
        ));
    }

    let mut result = Vec::with_capacity(vs.matchers.matchers.len() + 1);

    let has_name_matcher = vs
        .matchers
        .matchers
        .iter()
        .any(|m| m.name == METRIC_NAME_LABEL);

    if let Some(name) = vs.name.as_deref()
        && !has_name_matcher
    {
        result.push(LabelMatcher::equal(METRIC_NAME_LABEL, name));
    }

    result.extend(vs.matchers.matchers.iter().map(convert_matcher));
    Ok(result)
}

fn convert_matcher(matcher: &Matcher) -> LabelMatcher {
    let op = match &matcher.op {
        MatchOp::Equal => MatcherOp::Equal,
        MatchOp::NotEqual => MatcherOp::NotEqual,
        MatchOp::Re(_) => MatcherOp::RegexMatch,
        MatchOp::NotRe(_) => MatcherOp::RegexNotMatch,
    };

    LabelMatcher {
        name: matcher.name.clone(),
        op,
        value: matcher.value.clone(),
    }
}
