//! Routes for the World State context.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use eventide_world_state::application::query_handlers::{WorldStateView, get_world_state};
use eventide_world_state::domain::save::SaveData;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for PUT /switches/{name}.
#[derive(Debug, Deserialize)]
pub struct SetSwitchRequest {
    /// New value.
    pub value: bool,
}

/// Request body for PUT /variables/{name}.
#[derive(Debug, Deserialize)]
pub struct SetVariableRequest {
    /// New value.
    pub value: i64,
}

/// Response body for the write endpoints.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    /// Whether the stored value changed.
    pub changed: bool,
}

/// GET /
async fn world_state(State(state): State<AppState>) -> Json<WorldStateView> {
    Json(get_world_state(state.runtime.state()))
}

/// PUT /switches/{name}
#[instrument(skip(state, request))]
async fn set_switch(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SetSwitchRequest>,
) -> Json<WriteResponse> {
    let changed = state.runtime.state().set_switch(&name, request.value);
    Json(WriteResponse { changed })
}

/// PUT /variables/{name}
#[instrument(skip(state, request))]
async fn set_variable(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SetVariableRequest>,
) -> Json<WriteResponse> {
    let changed = state.runtime.state().set_variable(&name, request.value);
    Json(WriteResponse { changed })
}

/// POST /saves/{slot}
#[instrument(skip(state))]
async fn save(
    State(state): State<AppState>,
    Path(slot): Path<u8>,
) -> Result<Json<SaveData>, ApiError> {
    let data = state.runtime.save(state.saves.as_ref(), slot).await?;
    info!("handled save");
    Ok(Json(data))
}

/// POST /saves/{slot}/load
#[instrument(skip(state))]
async fn load(
    State(state): State<AppState>,
    Path(slot): Path<u8>,
) -> Result<Json<SaveData>, ApiError> {
    let data = state.runtime.load(state.saves.as_ref(), slot).await?;
    info!("handled load");
    Ok(Json(data))
}

/// Returns the router for the world state context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(world_state))
        .route("/switches/{name}", put(set_switch))
        .route("/variables/{name}", put(set_variable))
        .route("/saves/{slot}", post(save))
        .route("/saves/{slot}/load", post(load))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{get_json, post_empty, send_json, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_write_then_read_tables() {
        // Arrange
        let app = router().with_state(test_state());

        // Act
        let raised = serde_json::json!({ "value": true });
        let coins = serde_json::json!({ "value": 12 });
        let (status, switch) = send_json(app.clone(), "PUT", "/switches/bridge_down", &raised).await;
        let (_, variable) = send_json(app.clone(), "PUT", "/variables/coins", &coins).await;
        let (_, view) = get_json(app, "/").await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(switch["changed"], true);
        assert_eq!(variable["changed"], true);
        assert_eq!(view["switches"]["bridge_down"], true);
        assert_eq!(view["variables"]["coins"], 12);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        // Arrange
        let state = test_state();
        let app = router().with_state(state.clone());
        state.runtime.state().set_variable("day", 3);

        // Act
        let (saved_status, saved) = post_empty(app.clone(), "/saves/2").await;
        state.runtime.state().set_variable("day", 9);
        let (loaded_status, _) = post_empty(app, "/saves/2/load").await;

        // Assert
        assert_eq!(saved_status, StatusCode::OK);
        assert_eq!(saved["variables"]["day"], 3);
        assert!(saved["saved_at"].is_string());
        assert_eq!(loaded_status, StatusCode::OK);
        assert_eq!(state.runtime.state().variable("day"), 3);
    }

    #[tokio::test]
    async fn test_load_of_empty_slot_returns_404() {
        // Arrange
        let app = router().with_state(test_state());

        // Act
        let (status, json) = post_empty(app, "/saves/7/load").await;

        // Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }
}
