//! Prometheus HTTP API discovery endpoints
//!
//! See <https://prometheus.io/docs/prometheus/latest/querying/api/#querying-metadata>

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use common::auth::ReadToken;
use prometheus_api::{
    DiscoveryParams, ErrorResponse, ErrorType, LabelsResponse, METRIC_NAME_LABEL, SeriesResponse,
};
use querier::{QuerierError, StatusCategory};

use crate::RouterState;

pub fn router<S: RouterState>() -> Router<S> {
    Router::new()
        .route("/series", get(series::<S>).post(series_in_window::<S>))
        .route("/labels", get(labels::<S>).post(labels_form::<S>))
        .route("/label/{name}/values", get(label_values::<S>))
}

/// Discovery failure rendered as a Prometheus error envelope
#[derive(Debug)]
pub struct ApiError(QuerierError);

impl From<QuerierError> for ApiError {
    fn from(err: QuerierError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self.0.status_category() {
            StatusCategory::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorType::Unauthorized),
            StatusCategory::BadRequest => (StatusCode::BAD_REQUEST, ErrorType::BadData),
            StatusCategory::Unprocessable => (StatusCode::UNPROCESSABLE_ENTITY, ErrorType::BadData),
            StatusCategory::Internal => (StatusCode::INTERNAL_SERVER_ERROR, ErrorType::Internal),
        };

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            tracing::debug!(%status, error = %self.0, "Rejected discovery request");
        }

        (status, Json(ErrorResponse::new(error_type, self.0.to_string()))).into_response()
    }
}

fn query_params(query: Option<String>) -> DiscoveryParams {
    DiscoveryParams::from_urlencoded(query.as_deref().unwrap_or_default().as_bytes())
}

fn form_params(query: Option<String>, body: &[u8]) -> DiscoveryParams {
    let mut params = query_params(query);
    params.merge_urlencoded(body);
    params
}

/// GET /api/v1/series?match[]=<series_selector>
#[tracing::instrument(skip(state, token))]
pub async fn series<S: RouterState>(
    State(state): State<S>,
    ReadToken(token): ReadToken,
    RawQuery(query): RawQuery,
) -> Result<Json<SeriesResponse>, ApiError> {
    let params = query_params(query);
    let data = state
        .discovery()
        .find_series(&token, &params.matches)
        .await?;

    Ok(Json(SeriesResponse::success(data)))
}

/// POST /api/v1/series with `match[]` and `start` as form fields
#[tracing::instrument(skip(state, token, body))]
pub async fn series_in_window<S: RouterState>(
    State(state): State<S>,
    ReadToken(token): ReadToken,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<SeriesResponse>, ApiError> {
    let params = form_params(query, &body);
    let data = state
        .discovery()
        .find_series_in_window(&token, &params.matches, params.start.as_deref())
        .await?;

    Ok(Json(SeriesResponse::success(data)))
}

/// GET /api/v1/labels?match[]=<series_selector>
#[tracing::instrument(skip(state, token))]
pub async fn labels<S: RouterState>(
    State(state): State<S>,
    ReadToken(token): ReadToken,
    RawQuery(query): RawQuery,
) -> Result<Json<LabelsResponse>, ApiError> {
    let params = query_params(query);
    let data = state
        .discovery()
        .find_label_names(&token, &params.matches)
        .await?;

    Ok(Json(LabelsResponse::success(data)))
}

/// POST /api/v1/labels
#[tracing::instrument(skip(state, token, body))]
pub async fn labels_form<S: RouterState>(
    State(state): State<S>,
    ReadToken(token): ReadToken,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<LabelsResponse>, ApiError> {
    let params = form_params(query, &body);
    let data = state
        .discovery()
        .find_label_names(&token, &params.matches)
        .await?;

    Ok(Json(LabelsResponse::success(data)))
}

/// GET /api/v1/label/{name}/values
///
/// `__name__` is served by metric-name discovery, which honours `start`.
#[tracing::instrument(skip(state, token))]
pub async fn label_values<S: RouterState>(
    State(state): State<S>,
    ReadToken(token): ReadToken,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<LabelsResponse>, ApiError> {
    let params = query_params(query);
    let discovery = state.discovery();

    let data = if name == METRIC_NAME_LABEL {
        discovery
            .find_metric_names(
                &token,
                &params.matches,
                params.start.as_deref(),
                Some(name.as_str()),
            )
            .await?
    } else {
        discovery
            .find_label_values(&token, &name, &params.matches)
            .await?
    };

    Ok(Json(LabelsResponse::success(data)))
}
