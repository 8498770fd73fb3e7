//! PromQL-specific error types

use std::fmt;

/// Errors raised while turning a raw `match[]` value into label matchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromQLError {
    /// Error parsing the PromQL query syntax
    ParseError(String),
    /// Syntactically valid PromQL that is not a plain series selector
    UnsupportedFeature(String),
}

impl std::error::Error for PromQLError {}

impl fmt::Display for PromQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError(msg) => write!(f, "invalid matcher format: {msg}"),
            Self::UnsupportedFeature(feature) => {
                write!(f, "invalid matcher format: {feature}")
            }
        }
    }
}
