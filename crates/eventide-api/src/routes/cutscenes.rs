//! Routes for playing and inspecting cutscenes.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use eventide_core::cutscene::CutsceneId;
use eventide_core::mode::ExecutionMode;
use eventide_cutscene::CutscenePhase;
use eventide_runtime::{CutsceneStatus, RuntimeError};
use serde::Serialize;
use tracing::{Instrument, Span, info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// A cutscene currently playing.
#[derive(Debug, Serialize)]
pub struct PlayingCutscene {
    /// Cutscene id.
    pub id: CutsceneId,
    /// Resolved execution mode.
    pub mode: ExecutionMode,
    /// Lifecycle phase, in snake case.
    pub phase: &'static str,
}

impl From<CutsceneStatus> for PlayingCutscene {
    fn from(status: CutsceneStatus) -> Self {
        let phase = match status.phase {
            CutscenePhase::Idle => "idle",
            CutscenePhase::SettingUpActors => "setting_up_actors",
            CutscenePhase::Executing => "executing",
            CutscenePhase::CleaningUp => "cleaning_up",
            CutscenePhase::Completed => "completed",
        };
        Self {
            id: status.id,
            mode: status.mode,
            phase,
        }
    }
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct CutsceneListResponse {
    /// Every loaded cutscene id.
    pub cutscenes: Vec<CutsceneId>,
    /// Cutscenes currently playing.
    pub playing: Vec<PlayingCutscene>,
    /// Whether player input is locked.
    pub input_locked: bool,
}

/// Response body for POST /{cutscene_id}/play.
#[derive(Debug, Serialize)]
pub struct PlayResponse {
    /// The cutscene that was started.
    pub cutscene_id: String,
}

/// Response body for POST /{cutscene_id}/stop.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// The cutscene addressed.
    pub cutscene_id: String,
    /// Whether it was playing.
    pub stopped: bool,
}

/// Response body for GET /{cutscene_id}/timings.
#[derive(Debug, Serialize)]
pub struct CutsceneTimingsResponse {
    /// Whether the cutscene is playing.
    pub playing: bool,
    /// Milliseconds spent in each executed command, keyed by index.
    pub timings_ms: BTreeMap<usize, u128>,
}

/// GET /
async fn list_cutscenes(State(state): State<AppState>) -> Json<CutsceneListResponse> {
    Json(CutsceneListResponse {
        cutscenes: state.runtime.cutscene_ids(),
        playing: state
            .runtime
            .playing_cutscenes()
            .into_iter()
            .map(PlayingCutscene::from)
            .collect(),
        input_locked: state.runtime.is_input_locked(),
    })
}

/// POST /{cutscene_id}/play
///
/// Starts the cutscene in the background and answers immediately.
#[instrument(skip(state))]
async fn play_cutscene(
    State(state): State<AppState>,
    Path(cutscene_id): Path<String>,
) -> Result<(StatusCode, Json<PlayResponse>), ApiError> {
    let id = CutsceneId::new(cutscene_id.as_str());
    if !state.runtime.has_cutscene(&id) {
        return Err(RuntimeError::CutsceneNotFound(id).into());
    }
    if state.runtime.is_cutscene_running(&id) {
        return Err(ApiError::Conflict(format!("cutscene {id} is already playing")));
    }

    let runtime = Arc::clone(&state.runtime);
    tokio::spawn(
        async move {
            match runtime.play_cutscene(&id).await {
                Ok(outcome) => info!(?outcome, "background cutscene finished"),
                Err(error) => warn!(%error, "background cutscene failed"),
            }
        }
        .instrument(Span::current()),
    );

    Ok((StatusCode::ACCEPTED, Json(PlayResponse { cutscene_id })))
}

/// POST /{cutscene_id}/stop
#[instrument(skip(state))]
async fn stop_cutscene(
    State(state): State<AppState>,
    Path(cutscene_id): Path<String>,
) -> Json<StopResponse> {
    let stopped = state
        .runtime
        .stop_cutscene(&CutsceneId::new(cutscene_id.as_str()));
    Json(StopResponse {
        cutscene_id,
        stopped,
    })
}

/// GET /{cutscene_id}/timings
async fn cutscene_timings(
    State(state): State<AppState>,
    Path(cutscene_id): Path<String>,
) -> Json<CutsceneTimingsResponse> {
    let timings = state.runtime.cutscene_timings(&CutsceneId::new(cutscene_id));
    Json(CutsceneTimingsResponse {
        playing: timings.is_some(),
        timings_ms: timings
            .unwrap_or_default()
            .into_iter()
            .map(|(index, elapsed)| (index, elapsed.as_millis()))
            .collect(),
    })
}

/// Returns the router for cutscenes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cutscenes))
        .route("/{cutscene_id}/play", post(play_cutscene))
        .route("/{cutscene_id}/stop", post(stop_cutscene))
        .route("/{cutscene_id}/timings", get(cutscene_timings))
}
