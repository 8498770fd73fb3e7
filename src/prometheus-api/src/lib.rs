use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reserved label carrying the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Repeated form/query key holding series selectors
pub const MATCH_PARAM: &str = "match[]";

/// Value of the top-level `status` field
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Envelope of every successful discovery response
///
/// See <https://prometheus.io/docs/prometheus/latest/querying/api/#format-overview>
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ApiResponse<T> {
    pub status: Status,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            data,
        }
    }
}

/// A label set as returned by `/api/v1/series`
pub type LabelSet = HashMap<String, String>;

/// GET|POST /api/v1/series
pub type SeriesResponse = ApiResponse<Vec<LabelSet>>;

/// GET /api/v1/labels and GET /api/v1/label/<name>/values
pub type LabelsResponse = ApiResponse<Vec<String>>;

/// Prometheus `errorType` values used by this API
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    BadData,
    Unauthorized,
    Internal,
}

/// Error envelope
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorResponse {
    pub status: Status,
    #[serde(rename = "errorType")]
    pub error_type: ErrorType,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error_type: ErrorType, error: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error_type,
            error: error.into(),
        }
    }
}

/// Discovery parameters shared by the series, labels and label values endpoints
///
/// `match[]` is repeatable, which serde_urlencoded cannot express, so the
/// pairs are walked by hand.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiscoveryParams {
    /// Raw series selectors, in request order
    pub matches: Vec<String>,
    /// Raw `start` value, if any
    pub start: Option<String>,
}

impl DiscoveryParams {
    /// Decode an `application/x-www-form-urlencoded` payload or query string
    pub fn from_urlencoded(input: &[u8]) -> Self {
        let mut params = Self::default();
        params.merge_urlencoded(input);
        params
    }

    /// Merge another encoded payload, e.g. a POST body after the query string
    pub fn merge_urlencoded(&mut self, input: &[u8]) {
        for (key, value) in url::form_urlencoded::parse(input) {
            match key.as_ref() {
                MATCH_PARAM => self.matches.push(value.into_owned()),
                "start" if !value.is_empty() => self.start = Some(value.into_owned()),
                _ => {}
            }
        }
    }
}
