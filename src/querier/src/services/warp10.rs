use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use common::auth::WARP10_TOKEN_HEADER;

use crate::query::backend::{BackendError, FindParameters, Record, SeriesBackend};

/// Header Warp 10 uses to report why a request failed
const ERROR_MESSAGE_HEADER: &str = "x-warp10-error-message";

/// Series metadata as emitted by `/api/v0/find?format=json`
#[derive(Debug, Deserialize)]
struct GtsMetadata {
    c: String,
    #[serde(default)]
    l: HashMap<String, String>,
    #[serde(default)]
    a: HashMap<String, String>,
}

impl From<GtsMetadata> for Record {
    fn from(gts: GtsMetadata) -> Self {
        Record {
            class_name: gts.c,
            labels: gts.l,
            attributes: gts.a,
        }
    }
}

/// HTTP client for the Warp 10 FIND endpoint
#[derive(Debug, Clone)]
pub struct Warp10Backend {
    find_url: Url,
    http: reqwest::Client,
}

impl Warp10Backend {
    /// Create a client for the Warp 10 instance at `endpoint`
    ///
    /// `timeout` bounds every FIND request end to end.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, BackendError> {
        let find_url = Url::parse(&format!(
            "{}/api/v0/find",
            endpoint.trim_end_matches('/')
        ))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { find_url, http })
    }

    pub fn find_url(&self) -> &Url {
        &self.find_url
    }
}

fn query_pairs(selector: &str, params: &FindParameters) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("selector", selector.to_string()),
        ("format", "json".to_string()),
    ];
    if let Some(active_after) = params.active_after {
        pairs.push(("activeafter", active_after.timestamp_millis().to_string()));
    }
    if let Some(gcount) = params.gcount {
        pairs.push(("gcount", gcount.to_string()));
    }
    pairs
}

fn decode_records(body: &str) -> Result<Vec<Record>, BackendError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let series: Vec<GtsMetadata> = serde_json::from_str(body)?;
    Ok(series.into_iter().map(Record::from).collect())
}

async fn handle_response(resp: reqwest::Response) -> Result<Vec<Record>, BackendError> {
    if resp.status().is_success() {
        let body = resp.text().await?;
        decode_records(&body)
    } else {
        let status = resp.status().as_u16();
        let header_message = resp
            .headers()
            .get(ERROR_MESSAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().await.unwrap_or_else(|e| {
            tracing::debug!(status, error = %e, "Failed to read Warp 10 error body");
            String::new()
        });
        Err(BackendError::Status {
            status,
            message: header_message.unwrap_or(text),
        })
    }
}

#[async_trait]
impl SeriesBackend for Warp10Backend {
    async fn find(
        &self,
        token: &str,
        selector: &str,
        params: &FindParameters,
    ) -> Result<Vec<Record>, BackendError> {
        let resp = self
            .http
            .get(self.find_url.clone())
            .header(WARP10_TOKEN_HEADER, token)
            .query(&query_pairs(selector, params))
            .send()
            .await?;
        handle_response(resp).await
    }
}
