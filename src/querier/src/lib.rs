//! Prometheus series discovery backed by Warp 10
//!
//! [`query`] holds the backend-agnostic pipeline (matcher parsing, selector
//! translation, time-window clamping and the [`DiscoveryService`]),
//! [`services`] the Warp 10 HTTP client.

pub mod query;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use query::{
    BackendError, DiscoveryService, DiscoverySettings, FindParameters, QuerierError, Record,
    SeriesBackend, StatusCategory,
};
pub use services::Warp10Backend;
