//! Prometheus matchers to Warp 10 selectors
//!
//! Warp 10 selects series with `class{label=value,label~regex}`. A leading
//! `~` on the class or on a label constraint turns it into a regex match.
//! There is no negative operator, so `!=` and `!~` are encoded as a
//! negative-lookahead regex.
//!
//! Label constraints are stored in their encoded form: an exact value is
//! kept as-is, a regex constraint starts with `~`.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use prometheus_api::METRIC_NAME_LABEL;

use super::promql::{LabelMatcher, MatcherOp};

/// Class selector used when no `__name__` matcher was given
const ANY_CLASS: &str = ".*";

/// Marker prefix of a regex constraint
const REGEX_PREFIX: char = '~';

/// Bytes escaped in selector components
///
/// Warp 10 percent-decodes each component without treating `+` as a space,
/// so spaces must go out as `%20`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// A series selector in Warp 10 vocabulary
///
/// `labels` never contains `__name__`; the metric name always lives in
/// `class_name`. An empty `class_name` matches every class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedSelector {
    pub class_name: String,
    pub labels: BTreeMap<String, String>,
}

/// How the class component is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassMatch {
    /// Exact class unless empty, which selects any class
    #[default]
    AsGiven,
    /// Always a regex, even for a name given with `=`
    ForceRegex,
}

/// Encode a single matcher value as a Warp 10 label constraint
pub fn encode_constraint(op: MatcherOp, value: &str) -> String {
    match op {
        MatcherOp::Equal => value.to_string(),
        MatcherOp::RegexMatch => format!("{REGEX_PREFIX}{value}"),
        MatcherOp::NotEqual | MatcherOp::RegexNotMatch => {
            format!("{REGEX_PREFIX}(?!{value}).*")
        }
    }
}

/// Translate Prometheus matchers into a Warp 10 selector
///
/// When several `__name__` matchers are present the last one wins, and a
/// later matcher on an already seen label replaces the earlier constraint.
/// Regex values are not validated; the backend rejects malformed ones.
pub fn translate(matchers: &[LabelMatcher]) -> TranslatedSelector {
    let mut selector = TranslatedSelector::default();

    for matcher in matchers {
        if matcher.name == METRIC_NAME_LABEL {
            selector.class_name = matcher.value.clone();
            continue;
        }

        selector.labels.insert(
            matcher.name.clone(),
            encode_constraint(matcher.op, &matcher.value),
        );
    }

    selector
}

impl TranslatedSelector {
    /// Require the given label to be present with any value
    pub fn require_label(&mut self, name: &str) {
        self.labels
            .insert(name.to_string(), format!("{REGEX_PREFIX}{ANY_CLASS}"));
    }

    /// Render the Warp 10 selector text
    ///
    /// Class, label names and values are percent-encoded so that `,`, `{`,
    /// `}`, `=` and `~` inside values cannot break the selector grammar.
    /// Labels are emitted in lexical order.
    pub fn build(&self, class_match: ClassMatch) -> String {
        let mut out = String::new();

        match (class_match, self.class_name.is_empty()) {
            (ClassMatch::AsGiven, false) => out.push_str(&encode(&self.class_name)),
            (ClassMatch::ForceRegex, false) => {
                out.push(REGEX_PREFIX);
                out.push_str(&encode(&self.class_name));
            }
            (_, true) => {
                out.push(REGEX_PREFIX);
                out.push_str(&encode(ANY_CLASS));
            }
        }

        out.push('{');
        for (i, (name, constraint)) in self.labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&encode(name));
            match constraint.strip_prefix(REGEX_PREFIX) {
                Some(regex) => {
                    out.push(REGEX_PREFIX);
                    out.push_str(&encode(regex));
                }
                None => {
                    out.push('=');
                    out.push_str(&encode(constraint));
                }
            }
        }
        out.push('}');

        out
    }
}

impl fmt::Display for TranslatedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build(ClassMatch::AsGiven))
    }
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_matchers() {
        let selector = translate(&[]);
        assert_eq!(selector.class_name, "");
        assert!(selector.labels.is_empty());
    }

    #[test]
    fn test_class_name_only() {
        let selector = translate(&[LabelMatcher::equal("__name__", "test_metric")]);
        assert_eq!(selector.class_name, "test_metric");
        assert!(selector.labels.is_empty());
    }

    #[test]
    fn test_labels_only() {
        let selector = translate(&[
            LabelMatcher::equal("env", "prod"),
            LabelMatcher::equal("region", "us-west"),
        ]);
        assert_eq!(selector.class_name, "");
        assert_eq!(
            selector.labels,
            labels(&[("env", "prod"), ("region", "us-west")])
        );
    }

    #[test]
    fn test_class_name_and_labels() {
        let selector = translate(&[
            LabelMatcher::equal("__name__", "test_metric"),
            LabelMatcher::equal("env", "prod"),
        ]);
        assert_eq!(selector.class_name, "test_metric");
        assert_eq!(selector.labels, labels(&[("env", "prod")]));
    }

    #[test]
    fn test_operator_encoding() {
        let cases = [
            (LabelMatcher::equal("env", "prod"), "prod"),
            (LabelMatcher::regex_match("env", "prod|dev"), "~prod|dev"),
            (LabelMatcher::not_equal("env", "prod"), "~(?!prod).*"),
            (
                LabelMatcher::regex_not_match("env", "prod|dev"),
                "~(?!prod|dev).*",
            ),
        ];

        for (matcher, expected) in cases {
            let selector = translate(std::slice::from_ref(&matcher));
            assert_eq!(selector.labels["env"], expected, "{matcher}");
        }
    }

    #[test]
    fn test_mixed_matchers() {
        let selector = translate(&[
            LabelMatcher::equal("__name__", "test_metric"),
            LabelMatcher::equal("env", "prod"),
            LabelMatcher::regex_match("region", "us.*"),
            LabelMatcher::not_equal("cluster", "test"),
        ]);

        assert_eq!(selector.class_name, "test_metric");
        assert_eq!(
            selector.labels,
            labels(&[
                ("env", "prod"),
                ("region", "~us.*"),
                ("cluster", "~(?!test).*"),
            ])
        );
    }

    #[test]
    fn test_last_name_matcher_wins() {
        let selector = translate(&[
            LabelMatcher::equal("__name__", "first"),
            LabelMatcher::regex_match("__name__", "second.*"),
        ]);
        assert_eq!(selector.class_name, "second.*");
        assert!(!selector.labels.contains_key("__name__"));
    }

    #[test]
    fn test_later_label_matcher_overwrites() {
        let selector = translate(&[
            LabelMatcher::equal("env", "prod"),
            LabelMatcher::not_equal("env", "dev"),
        ]);
        assert_eq!(selector.labels, labels(&[("env", "~(?!dev).*")]));
    }

    #[test]
    fn test_translate_is_deterministic() {
        let matchers = vec![
            LabelMatcher::regex_match("__name__", "http_.*"),
            LabelMatcher::equal("job", "api"),
            LabelMatcher::regex_not_match("env", "dev"),
        ];
        assert_eq!(translate(&matchers), translate(&matchers));
    }

    #[test]
    fn test_malformed_regex_passes_through() {
        let selector = translate(&[LabelMatcher::regex_match("env", "(unclosed")]);
        assert_eq!(selector.labels["env"], "~(unclosed");
    }

    #[test]
    fn test_build_exact_class_and_sorted_labels() {
        let selector = translate(&[
            LabelMatcher::equal("__name__", "os.cpu"),
            LabelMatcher::equal("zone", "eu"),
            LabelMatcher::equal("app", "web"),
        ]);
        assert_eq!(selector.build(ClassMatch::AsGiven), "os.cpu{app=web,zone=eu}");
    }

    #[test]
    fn test_build_regex_constraints() {
        let selector = translate(&[
            LabelMatcher::equal("__name__", "up"),
            LabelMatcher::regex_match("env", "prod|dev"),
            LabelMatcher::not_equal("dc", "gra"),
        ]);
        assert_eq!(
            selector.to_string(),
            "up{dc~%28%3F%21gra%29.*,env~prod%7Cdev}"
        );
    }

    #[test]
    fn test_build_empty_class_is_wildcard() {
        let selector = translate(&[LabelMatcher::equal("job", "api")]);
        assert_eq!(selector.build(ClassMatch::AsGiven), "~.*{job=api}");
        assert_eq!(selector.build(ClassMatch::ForceRegex), "~.*{job=api}");
        assert_eq!(translate(&[]).build(ClassMatch::AsGiven), "~.*{}");
    }

    #[test]
    fn test_build_force_regex_class() {
        let selector = translate(&[LabelMatcher::equal("__name__", "http_requests")]);
        assert_eq!(selector.build(ClassMatch::ForceRegex), "~http_requests{}");
    }

    #[test]
    fn test_build_escapes_grammar_characters() {
        let selector = translate(&[LabelMatcher::equal("path", "/a,b{c}=d")]);
        assert_eq!(
            selector.build(ClassMatch::AsGiven),
            "~.*{path=%2Fa%2Cb%7Bc%7D%3Dd}"
        );
    }

    #[test]
    fn test_build_escapes_spaces_and_plus() {
        let selector = translate(&[
            LabelMatcher::equal("job", "my job"),
            LabelMatcher::regex_match("re", "a+b"),
            LabelMatcher::equal("path", "~home"),
        ]);
        assert_eq!(
            selector.build(ClassMatch::AsGiven),
            "~.*{job=my%20job,path=%7Ehome,re~a%2Bb}"
        );
    }

    #[test]
    fn test_parsed_value_with_space() {
        let matchers =
            crate::query::promql::parse_metric_selector(r#"{job="my job", re=~"a+b"}"#).unwrap();
        assert_eq!(translate(&matchers).to_string(), "~.*{job=my%20job,re~a%2Bb}");
    }

    #[test]
    fn test_require_label() {
        let mut selector = translate(&[LabelMatcher::regex_match("__name__", "http.*")]);
        selector.require_label("job");
        assert_eq!(selector.labels["job"], "~.*");
        assert_eq!(selector.build(ClassMatch::ForceRegex), "~http.*{job~.*}");
    }
}
