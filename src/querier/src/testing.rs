//! In-memory [`SeriesBackend`] for exercising the HTTP surface without Warp 10

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::query::backend::{BackendError, FindParameters, Record, SeriesBackend};

/// A FIND as received by [`StaticBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCall {
    pub token: String,
    pub selector: String,
    pub params: FindParameters,
}

/// Backend answering FINDs from a fixed selector → records table
///
/// Unknown selectors yield no series. Every call is recorded.
#[derive(Debug, Default)]
pub struct StaticBackend {
    series: HashMap<String, Vec<Record>>,
    failure: Option<(u16, String)>,
    calls: Mutex<Vec<FindCall>>,
}

impl StaticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, selector: &str, records: Vec<Record>) -> Self {
        self.series.insert(selector.to_string(), records);
        self
    }

    /// Fail every FIND with the given Warp 10 status
    pub fn failing(mut self, status: u16, message: &str) -> Self {
        self.failure = Some((status, message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<FindCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SeriesBackend for StaticBackend {
    async fn find(
        &self,
        token: &str,
        selector: &str,
        params: &FindParameters,
    ) -> Result<Vec<Record>, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(FindCall {
                token: token.to_string(),
                selector: selector.to_string(),
                params: params.clone(),
            });
        }

        if let Some((status, message)) = &self.failure {
            return Err(BackendError::Status {
                status: *status,
                message: message.clone(),
            });
        }

        Ok(self.series.get(selector).cloned().unwrap_or_default())
    }
}
