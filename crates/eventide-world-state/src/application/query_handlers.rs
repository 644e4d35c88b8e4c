//! Query handlers for the World State context.
//!
//! This module returns read-only view DTOs of the current tables.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::state::GameState;

/// Read-only view of the world state.
#[derive(Debug, Serialize)]
pub struct WorldStateView {
    /// Global switches.
    pub switches: BTreeMap<String, bool>,
    /// Global variables.
    pub variables: BTreeMap<String, i64>,
    /// Self-switches keyed by event id, then by name.
    pub self_switches: BTreeMap<String, BTreeMap<String, bool>>,
}

/// Returns a view of every table.
#[must_use]
pub fn get_world_state(state: &GameState) -> WorldStateView {
    let snapshot = state.snapshot();
    WorldStateView {
        switches: snapshot.switches,
        variables: snapshot.variables,
        self_switches: snapshot
            .self_switches
            .into_iter()
            .map(|(event_id, switches)| (event_id.0, switches))
            .collect(),
    }
}
