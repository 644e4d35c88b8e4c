//! Cutscene descriptors and synchronization points.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::mode::ExecutionMode;

/// Identifier of an authored cutscene.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CutsceneId(pub String);

impl CutsceneId {
    /// Creates a cutscene id.
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

impl fmt::Display for CutsceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CutsceneId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// An actor that must exist while the cutscene plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorReference {
    /// Binding key used by the timeline and commands.
    pub actor_id: String,
    /// Prefab or template to spawn from.
    pub prefab: String,
    /// Optional named spawn point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_point: Option<String>,
}

/// Camera position, rotation and field of view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    /// World position.
    pub position: [f32; 3],
    /// Euler rotation in degrees.
    pub rotation: [f32; 3],
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
}

/// An authored cutscene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutsceneDescriptor {
    /// Unique identifier.
    pub id: CutsceneId,
    /// Display name.
    pub name: String,
    /// Timeline asset driving the cinematic track, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    /// Command track.
    #[serde(default)]
    pub commands: Vec<Command>,
    /// Actors spawned for the duration of the cutscene.
    #[serde(default)]
    pub actors: Vec<ActorReference>,
    /// Camera pose applied when the cutscene starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_setup: Option<CameraPose>,
    /// Requested execution mode.
    #[serde(default)]
    pub preferred_mode: ExecutionMode,
}

/// What a synchronization point waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncKind {
    /// Sleep for the duration.
    Wait(Duration),
    /// Wait until no other cutscene is active, then play this one.
    Cutscene(CutsceneId),
    /// Wait until the timeline emits the named marker.
    Timeline(String),
}

/// A rendezvous barrier in the command track of a hybrid run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPoint {
    /// Index of the command the barrier guards.
    pub command_index: usize,
    /// Barrier condition.
    pub kind: SyncKind,
}
