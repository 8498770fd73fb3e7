pub mod backend;
pub mod discovery;
pub mod error;
pub mod promql;
pub mod selector;
pub mod time_window;

pub use backend::{APP_LABEL, BackendError, FindParameters, Record, SeriesBackend};
pub use discovery::{DiscoveryService, DiscoverySettings, parse_start};
pub use error::{QuerierError, StatusCategory};
pub use selector::{ClassMatch, TranslatedSelector, translate};
pub use time_window::LookbackWindow;
