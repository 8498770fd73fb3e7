use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Label Warp 10 adds to every series to record the owning application
pub const APP_LABEL: &str = ".app";

/// A series as returned by a Warp 10 FIND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub class_name: String,
    pub labels: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
}

impl Record {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Labels without Warp 10 housekeeping entries
    pub fn user_labels(&self) -> impl Iterator<Item = (&String, &String)> {
        self.labels.iter().filter(|(name, _)| name.as_str() != APP_LABEL)
    }
}

/// Optional FIND modifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindParameters {
    /// Only series with activity after this instant
    pub active_after: Option<DateTime<Utc>>,
    /// Maximum number of series returned
    pub gcount: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Warp 10 error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("Deserialization error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid Warp 10 endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Series lookup against the time-series store
///
/// Implementations must be cancel-safe: the discovery service drops the
/// returned future when the inbound request goes away.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeriesBackend: Send + Sync {
    async fn find(
        &self,
        token: &str,
        selector: &str,
        params: &FindParameters,
    ) -> Result<Vec<Record>, BackendError>;
}
