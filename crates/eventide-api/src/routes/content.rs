//! Routes for the Content context.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use axum::{Json, Router};
use eventide_content::application::command_handlers::handle_parse_bundle;
use eventide_content::application::query_handlers::BundleSummary;
use eventide_content::domain::bundle::BundleFormat;
use eventide_core::error::DomainError;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /
async fn installed_bundle(State(state): State<AppState>) -> Result<Json<BundleSummary>, ApiError> {
    state
        .content()
        .map(Json)
        .ok_or_else(|| DomainError::NotFound("no script bundle installed".to_owned()).into())
}

/// POST /
///
/// The body is a bundle document; a `yaml` content type selects YAML,
/// anything else is read as JSON.
#[instrument(skip(state, headers, body))]
async fn install_bundle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<BundleSummary>, ApiError> {
    let is_yaml = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("yaml"));
    let format = if is_yaml {
        BundleFormat::Yaml
    } else {
        BundleFormat::Json
    };

    let loaded = handle_parse_bundle(&body, format)?;
    let summary = state.install(loaded)?;
    info!(content_hash = %summary.content_hash, "handled install_bundle");
    Ok(Json(summary))
}

/// Returns the router for the content context.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(installed_bundle).post(install_bundle))
}
