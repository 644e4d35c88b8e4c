//! Event definitions, pages, and live event instances.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::{Command, Condition};
use crate::mode::ExecutionMode;

/// Identifier of an authored event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Creates an event id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// The condition class that starts an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The player presses the action button facing the event.
    #[default]
    ActionButton,
    /// The player walks into the event.
    PlayerTouch,
    /// The event walks into the player.
    EventTouch,
    /// Starts by itself and locks player input; one at a time.
    Autorun,
    /// Runs alongside other events, bounded by the parallel cap.
    Parallel,
}

/// How the event's map sprite moves while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Does not move.
    #[default]
    Fixed,
    /// Wanders randomly.
    Random,
    /// Walks toward the player.
    Approach,
    /// Follows an authored route.
    Custom,
}

/// Sprite shown for a page. Rendering is external; this is carried through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Graphic {
    /// Sprite sheet name. Empty means invisible.
    #[serde(default)]
    pub sprite: String,
    /// Facing direction index.
    #[serde(default)]
    pub direction: u8,
}

/// One conditional variant of an event's behavior.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    /// What starts this page.
    #[serde(default)]
    pub trigger: Trigger,
    /// All conditions must hold for the page to be active.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// The script for this page.
    #[serde(default)]
    pub commands: Vec<Command>,
    /// Idle movement.
    #[serde(default)]
    pub move_type: MoveType,
    /// Map sprite.
    #[serde(default)]
    pub graphic: Graphic,
}

/// An authored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Unique identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Conditional variants, evaluated last to first.
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// Live view of a running event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveEventInstance {
    /// Correlation id of this run.
    pub run_id: Uuid,
    /// The event being run.
    pub event_id: EventId,
    /// Index of the page that was selected at start.
    pub current_page_index: usize,
    /// Trigger of the selected page.
    pub trigger: Trigger,
    /// Mode the page's script classifies as.
    pub execution_mode: ExecutionMode,
    /// Whether the command track is still executing.
    pub is_running: bool,
    /// Index of the command currently executing.
    pub command_index: usize,
    /// Whether the run is paused.
    pub is_paused: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}
