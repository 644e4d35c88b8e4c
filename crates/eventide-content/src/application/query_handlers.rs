//! Query handlers for the Content context.

use eventide_core::mode::{ExecutionMode, select_cutscene_mode};
use serde::Serialize;

use super::command_handlers::LoadedBundle;

/// Summary of one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    /// Event id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Number of pages.
    pub pages: usize,
}

/// Summary of one cutscene.
#[derive(Debug, Clone, Serialize)]
pub struct CutsceneSummary {
    /// Cutscene id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Mode the cutscene will play in.
    pub mode: ExecutionMode,
}

/// Read-only view of a loaded bundle.
#[derive(Debug, Clone, Serialize)]
pub struct BundleSummary {
    /// Content hash of the bundle.
    pub content_hash: String,
    /// Events, in authored order.
    pub events: Vec<EventSummary>,
    /// Cutscenes, in authored order.
    pub cutscenes: Vec<CutsceneSummary>,
}

/// Summarizes a loaded bundle.
#[must_use]
pub fn get_bundle_summary(loaded: &LoadedBundle) -> BundleSummary {
    BundleSummary {
        content_hash: loaded.content_hash.clone(),
        events: loaded
            .bundle
            .events
            .iter()
            .map(|event| EventSummary {
                id: event.id.to_string(),
                name: event.name.clone(),
                pages: event.pages.len(),
            })
            .collect(),
        cutscenes: loaded
            .bundle
            .cutscenes
            .iter()
            .map(|cutscene| CutsceneSummary {
                id: cutscene.id.to_string(),
                name: cutscene.name.clone(),
                mode: select_cutscene_mode(cutscene),
            })
            .collect(),
    }
}
