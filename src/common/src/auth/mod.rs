//! Read-token handling for the Prometheus-compatible API
//!
//! Warp 10 authorizes every FIND with a READ token. Grafana and the
//! Prometheus clients hand that token over in one of several headers; this
//! module normalizes them into a single opaque credential that is forwarded
//! untouched to the backend.

pub mod middleware;

pub use middleware::{ReadToken, extract_read_token};

/// Header carrying a raw Warp 10 token
pub const WARP10_TOKEN_HEADER: &str = "x-warp10-token";
