use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use querier::DiscoveryService;
use tower_http::trace::TraceLayer;

pub mod endpoints;

pub trait RouterState: std::fmt::Debug + Clone + Send + Sync + 'static {
    fn discovery(&self) -> &DiscoveryService;
}

/// Shared state handed to every route handler
#[derive(Clone)]
pub struct InMemoryStateImpl {
    discovery: DiscoveryService,
}

impl std::fmt::Debug for InMemoryStateImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateImpl")
            .field("discovery", &self.discovery)
            .finish()
    }
}

impl InMemoryStateImpl {
    pub fn new(discovery: DiscoveryService) -> Self {
        Self { discovery }
    }
}

impl RouterState for InMemoryStateImpl {
    fn discovery(&self) -> &DiscoveryService {
        &self.discovery
    }
}

/// Create a new router instance with all routes configured
pub fn create_router<S: RouterState>(state: S) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", endpoints::prometheus::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
