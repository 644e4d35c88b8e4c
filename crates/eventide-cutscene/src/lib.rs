//! Eventide — Cutscene context.
//!
//! Plays authored cutscenes: spawns the actors they reference, drives the
//! timeline track and the command track (alone or joined), paces the
//! command track against synchronization points, and keeps the camera pose
//! and player input lock consistent across overlapping cutscenes.

pub mod application;
pub mod domain;

pub use application::controller::{
    CutsceneController, CutsceneOutcome, CutscenePhase, CutsceneServices,
};
pub use domain::bindings::ActorBindings;
pub use domain::collaborators::{ActorHandle, ActorSpawner, CameraRig, TimelinePlayer};
pub use domain::registry::{ActiveCutscene, CutsceneRegistry};
pub use domain::sync::{SyncSchedule, extract_sync_points};
