//! PromQL series selector support
//!
//! The discovery endpoints only ever receive series selectors in `match[]`,
//! never full PromQL expressions:
//!
//! ```text
//! match[] string → parser → Vec<LabelMatcher> → selector translation → Warp 10 FIND
//! ```
//!
//! # Modules
//!
//! - [`parser`] - selector parsing using the promql-parser crate
//! - [`types`] - matcher types independent of the parser crate
//! - [`error`] - error types for selector parsing

pub mod error;
pub mod parser;
pub mod types;

pub use error::PromQLError;
pub use parser::parse_metric_selector;
pub use types::{LabelMatcher, MatcherOp};
