//! Persisted world state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use eventide_core::event::EventId;
use serde::{Deserialize, Serialize};

/// Save data for the world state.
///
/// The maps are stored as-is; self-switches nest by event id, then by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveData {
    /// Global switches.
    #[serde(default)]
    pub switches: BTreeMap<String, bool>,
    /// Global variables.
    #[serde(default)]
    pub variables: BTreeMap<String, i64>,
    /// Self-switches keyed by event, then by name.
    #[serde(default)]
    pub self_switches: BTreeMap<EventId, BTreeMap<String, bool>>,
    /// When the data was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}
