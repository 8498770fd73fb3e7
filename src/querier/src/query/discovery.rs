//! Prometheus discovery endpoints on top of Warp 10 FIND
//!
//! Every endpoint runs the same pipeline:
//!
//! ```text
//! match[] → parse → translate → build selector → FIND → accumulate → dedup
//! ```
//!
//! and differs only in validation and in how records are shaped. All
//! `match[]` values are parsed and validated before the first FIND is
//! issued; the FINDs themselves run concurrently and the first failure
//! cancels the rest.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use prometheus_api::{LabelSet, METRIC_NAME_LABEL};

use common::config::DiscoveryConfig;

use super::backend::{FindParameters, Record, SeriesBackend};
use super::error::{QuerierError, StatusCategory};
use super::promql::{LabelMatcher, parse_metric_selector};
use super::selector::{ClassMatch, translate};
use super::time_window::LookbackWindow;

/// Smallest accepted `__name__` search value, affixes included.
///
/// Grafana wraps the user's search term as `.*term.*`, so seven characters
/// here means three typed by the user.
pub const MIN_NAME_SEARCH_LEN: usize = 7;

/// Policy knobs of the discovery service, resolved from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub default_metric_selector: String,
    pub default_result_cap: usize,
    pub lookback: LookbackWindow,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::from(&DiscoveryConfig::default())
    }
}

impl From<&DiscoveryConfig> for DiscoverySettings {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            default_metric_selector: config.default_metric_selector.clone(),
            default_result_cap: config.default_result_cap,
            lookback: LookbackWindow::from_config(&config.lookback_min, &config.lookback_max),
        }
    }
}

/// Discovery service shared by all HTTP handlers
#[derive(Clone)]
pub struct DiscoveryService {
    backend: Arc<dyn SeriesBackend>,
    settings: DiscoverySettings,
}

impl std::fmt::Debug for DiscoveryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryService")
            .field("backend", &"SeriesBackend")
            .field("settings", &self.settings)
            .finish()
    }
}

impl DiscoveryService {
    pub fn new(backend: Arc<dyn SeriesBackend>, settings: DiscoverySettings) -> Self {
        Self { backend, settings }
    }

    /// `GET /api/v1/series`
    ///
    /// Every record of every selector is returned as-is, without
    /// deduplication across selectors.
    #[tracing::instrument(skip(self, token))]
    pub async fn find_series(
        &self,
        token: &str,
        matches: &[String],
    ) -> Result<Vec<LabelSet>, QuerierError> {
        require_token(token)?;
        if matches.is_empty() {
            return Err(QuerierError::unprocessable("no match[] parameter provided"));
        }

        let selectors = parse_all(matches, StatusCategory::Unprocessable)?
            .iter()
            .map(|matchers| translate(matchers).build(ClassMatch::AsGiven))
            .collect();

        let batches = self
            .find_all(token, selectors, &FindParameters::default())
            .await?;

        Ok(batches
            .iter()
            .flatten()
            .map(|record| {
                let mut series = series_labels(record);
                for (name, value) in &record.attributes {
                    series.insert(name.clone(), value.clone());
                }
                series
            })
            .collect())
    }

    /// `POST /api/v1/series`
    ///
    /// Runs with the metric-name rules (mandatory `__name__` matcher, minimum
    /// search length, regex class, clamped `start`) and returns the label sets
    /// without attributes.
    #[tracing::instrument(skip(self, token))]
    pub async fn find_series_in_window(
        &self,
        token: &str,
        matches: &[String],
        start: Option<&str>,
    ) -> Result<Vec<LabelSet>, QuerierError> {
        require_token(token)?;
        if matches.is_empty() {
            return Err(QuerierError::bad_request("no match[] parameter provided"));
        }

        let start = start.map(parse_start).transpose()?;
        let records = self
            .metric_name_records(token, matches, start, None, Utc::now())
            .await?;

        Ok(records.iter().map(series_labels).collect())
    }

    /// `GET /api/v1/label/<name>/values` for any label but `__name__`
    ///
    /// Only the first `match[]` is evaluated.
    // TODO: confirm with the API owners whether the remaining match[] values should be unioned.
    #[tracing::instrument(skip(self, token))]
    pub async fn find_label_values(
        &self,
        token: &str,
        label: &str,
        matches: &[String],
    ) -> Result<Vec<String>, QuerierError> {
        require_token(token)?;
        if label.is_empty() {
            return Err(QuerierError::bad_request("missing label name"));
        }
        let Some(first) = matches.first() else {
            return Err(QuerierError::bad_request("no match[] parameter provided"));
        };

        let matchers = parse_metric_selector(first)
            .map_err(|e| QuerierError::syntax(e, StatusCategory::BadRequest))?;
        let selector = translate(&matchers).build(ClassMatch::AsGiven);

        let records = self
            .find(token, selector, &FindParameters::default())
            .await?;

        let values = records.iter().filter_map(|record| {
            if label == METRIC_NAME_LABEL {
                Some(record.class_name.clone())
            } else {
                record.labels.get(label).cloned()
            }
        });

        Ok(dedup_preserving_order(values))
    }

    /// `GET|POST /api/v1/labels`
    ///
    /// Without `match[]` nothing is queried and the result is empty: an
    /// unscoped FIND would enumerate every series of the token.
    #[tracing::instrument(skip(self, token))]
    pub async fn find_label_names(
        &self,
        token: &str,
        matches: &[String],
    ) -> Result<Vec<String>, QuerierError> {
        require_token(token)?;
        if matches.is_empty() {
            return Ok(Vec::new());
        }

        let selectors = parse_all(matches, StatusCategory::BadRequest)?
            .iter()
            .map(|matchers| translate(matchers).build(ClassMatch::AsGiven))
            .collect();

        let batches = self
            .find_all(token, selectors, &FindParameters::default())
            .await?;

        let mut names = BTreeSet::from([METRIC_NAME_LABEL.to_string()]);
        for record in batches.iter().flatten() {
            names.extend(record.user_labels().map(|(name, _)| name.clone()));
            names.extend(record.attributes.keys().cloned());
        }

        Ok(names.into_iter().collect())
    }

    /// `GET /api/v1/label/__name__/values`
    ///
    /// `label`, when set to something other than `__name__`, restricts the
    /// lookup to series carrying that label.
    #[tracing::instrument(skip(self, token))]
    pub async fn find_metric_names(
        &self,
        token: &str,
        matches: &[String],
        start: Option<&str>,
        label: Option<&str>,
    ) -> Result<Vec<String>, QuerierError> {
        require_token(token)?;

        let start = start.map(parse_start).transpose()?;
        let records = self
            .metric_name_records(token, matches, start, label, Utc::now())
            .await?;

        Ok(dedup_preserving_order(
            records.into_iter().map(|record| record.class_name),
        ))
    }

    async fn metric_name_records(
        &self,
        token: &str,
        matches: &[String],
        start: Option<DateTime<Utc>>,
        label: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Record>, QuerierError> {
        let mut params = FindParameters {
            active_after: start.map(|start| self.settings.lookback.clamp(start, now)),
            gcount: None,
        };

        let matcher_sets = if matches.is_empty() {
            params.gcount = Some(self.settings.default_result_cap);
            vec![vec![LabelMatcher::regex_match(
                METRIC_NAME_LABEL,
                &self.settings.default_metric_selector,
            )]]
        } else {
            parse_all(matches, StatusCategory::BadRequest)?
        };

        for matchers in &matcher_sets {
            self.validate_name_search(matchers)?;
        }

        let selectors = matcher_sets
            .iter()
            .map(|matchers| {
                let mut selector = translate(matchers);
                if let Some(label) = label.filter(|l| !l.is_empty() && *l != METRIC_NAME_LABEL) {
                    selector.require_label(label);
                }
                selector.build(ClassMatch::ForceRegex)
            })
            .collect();

        let batches = self.find_all(token, selectors, &params).await?;
        Ok(batches.into_iter().flatten().collect())
    }

    fn validate_name_search(&self, matchers: &[LabelMatcher]) -> Result<(), QuerierError> {
        let mut has_name_matcher = false;

        for matcher in matchers.iter().filter(|m| m.is_metric_name()) {
            has_name_matcher = true;
            if matcher.value == self.settings.default_metric_selector {
                continue;
            }
            if matcher.value.trim().chars().count() < MIN_NAME_SEARCH_LEN {
                return Err(QuerierError::bad_request(
                    "search must contain at least 3 characters",
                ));
            }
        }

        if !has_name_matcher {
            return Err(QuerierError::bad_request(
                "query must include a matcher for __name__",
            ));
        }

        Ok(())
    }

    async fn find_all(
        &self,
        token: &str,
        selectors: Vec<String>,
        params: &FindParameters,
    ) -> Result<Vec<Vec<Record>>, QuerierError> {
        try_join_all(
            selectors
                .into_iter()
                .map(|selector| self.find(token, selector, params)),
        )
        .await
    }

    async fn find(
        &self,
        token: &str,
        selector: String,
        params: &FindParameters,
    ) -> Result<Vec<Record>, QuerierError> {
        tracing::debug!(%selector, ?params, "Finding series");

        match self.backend.find(token, &selector, params).await {
            Ok(records) => {
                tracing::debug!(%selector, count = records.len(), "Found series");
                Ok(records)
            }
            Err(source) => {
                tracing::error!(query = %selector, error = %source, "Error finding series");
                Err(QuerierError::Backend { selector, source })
            }
        }
    }
}

fn require_token(token: &str) -> Result<(), QuerierError> {
    if token.is_empty() {
        return Err(QuerierError::AuthMissing);
    }
    Ok(())
}

fn parse_all(
    matches: &[String],
    category: StatusCategory,
) -> Result<Vec<Vec<LabelMatcher>>, QuerierError> {
    matches
        .iter()
        .map(|raw| parse_metric_selector(raw).map_err(|e| QuerierError::syntax(e, category)))
        .collect()
}

/// `__name__` plus the user-visible labels of a record
fn series_labels(record: &Record) -> LabelSet {
    let mut series = LabelSet::with_capacity(record.labels.len() + 1);
    series.insert(METRIC_NAME_LABEL.to_string(), record.class_name.clone());
    for (name, value) in record.user_labels() {
        series.insert(name.clone(), value.clone());
    }
    series
}

fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Parse a Prometheus `start` value: unix seconds (integer or fractional)
/// or RFC 3339
pub fn parse_start(raw: &str) -> Result<DateTime<Utc>, QuerierError> {
    let raw = raw.trim();
    let invalid = || QuerierError::bad_request("failed to parse start time");

    if let Ok(seconds) = raw.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0).ok_or_else(invalid);
    }

    if let Ok(seconds) = raw.parse::<f64>() {
        if !seconds.is_finite() {
            return Err(invalid());
        }
        return DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
            .ok_or_else(invalid);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| invalid())
}
