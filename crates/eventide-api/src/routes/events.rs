//! Routes for starting and steering events.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use eventide_core::event::{ActiveEventInstance, EventId};
use eventide_runtime::StartOutcome;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    /// Every loaded event id.
    pub events: Vec<EventId>,
    /// Runs in progress, oldest first.
    pub active: Vec<ActiveEventInstance>,
    /// Autorun events waiting their turn.
    pub queued: Vec<EventId>,
}

/// Response body for POST /{event_id}/start.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// `started`, `queued`, `rejected` or `already_running`.
    pub outcome: &'static str,
    /// Id of the new run, when one began.
    pub run_id: Option<Uuid>,
}

/// Response body for the stop, pause and resume endpoints.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// The event addressed.
    pub event_id: String,
    /// Whether the event was running (or queued, for stop).
    pub applied: bool,
}

/// Response body for GET /{event_id}/timings.
#[derive(Debug, Serialize)]
pub struct TimingsResponse {
    /// Whether the event has a run in progress.
    pub running: bool,
    /// Milliseconds spent in each executed command, keyed by index.
    pub timings_ms: BTreeMap<usize, u128>,
}

/// GET /
async fn list_events(State(state): State<AppState>) -> Json<EventListResponse> {
    Json(EventListResponse {
        events: state.runtime.event_ids(),
        active: state.runtime.active_instances(),
        queued: state.runtime.queued_autoruns(),
    })
}

/// POST /{event_id}/start
#[instrument(skip(state))]
async fn start_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<StartResponse>, ApiError> {
    let outcome = state.runtime.start_event(&EventId::new(event_id))?;
    info!(?outcome, "handled start_event");

    let (outcome, run_id) = match outcome {
        StartOutcome::Started(run_id) => ("started", Some(run_id)),
        StartOutcome::Queued => ("queued", None),
        StartOutcome::Rejected => ("rejected", None),
        StartOutcome::AlreadyRunning => ("already_running", None),
    };
    Ok(Json(StartResponse { outcome, run_id }))
}

/// POST /{event_id}/stop
#[instrument(skip(state))]
async fn stop_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<ControlResponse> {
    let applied = state.runtime.stop_event(&EventId::new(event_id.as_str()));
    Json(ControlResponse { event_id, applied })
}

/// POST /{event_id}/pause
#[instrument(skip(state))]
async fn pause_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<ControlResponse> {
    let applied = state.runtime.pause_event(&EventId::new(event_id.as_str()));
    Json(ControlResponse { event_id, applied })
}

/// POST /{event_id}/resume
#[instrument(skip(state))]
async fn resume_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<ControlResponse> {
    let applied = state.runtime.resume_event(&EventId::new(event_id.as_str()));
    Json(ControlResponse { event_id, applied })
}

/// GET /{event_id}/timings
async fn event_timings(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<TimingsResponse> {
    let timings = state.runtime.event_timings(&EventId::new(event_id));
    Json(TimingsResponse {
        running: timings.is_some(),
        timings_ms: timings
            .unwrap_or_default()
            .into_iter()
            .map(|(index, elapsed)| (index, elapsed.as_millis()))
            .collect(),
    })
}

/// Returns the router for events.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/{event_id}/start", post(start_event))
        .route("/{event_id}/stop", post(stop_event))
        .route("/{event_id}/pause", post(pause_event))
        .route("/{event_id}/resume", post(resume_event))
        .route("/{event_id}/timings", get(event_timings))
}
