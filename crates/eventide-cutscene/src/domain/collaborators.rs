//! Engine-side collaborators a cutscene drives.
//!
//! The timeline player, the actor spawner and the camera belong to the host
//! game. Cleanup paths call the synchronous methods from `Drop`, so those
//! must not block.

use async_trait::async_trait;
use eventide_core::cutscene::{ActorReference, CameraPose};
use eventide_core::error::DomainError;

/// Plays timeline assets.
#[async_trait]
pub trait TimelinePlayer: Send + Sync {
    /// Starts playback of `timeline`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the asset does not exist.
    async fn play(&self, timeline: &str) -> Result<(), DomainError>;

    /// Stops playback of `timeline`. Does nothing if it is not playing.
    fn stop(&self, timeline: &str);

    /// Returns `true` while `timeline` is playing.
    fn is_playing(&self, timeline: &str) -> bool;

    /// Resolves when `timeline` emits `marker`, or immediately if playback
    /// has ended or the marker does not exist.
    async fn wait_marker(&self, timeline: &str, marker: &str);
}

/// A spawned actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorHandle {
    /// Binding key from the actor reference.
    pub actor_id: String,
    /// Engine entity identifier.
    pub entity: u64,
}

/// Creates and destroys cutscene actors.
#[async_trait]
pub trait ActorSpawner: Send + Sync {
    /// Spawns the referenced actor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the prefab or spawn point cannot be resolved.
    async fn spawn(&self, actor: &ActorReference) -> Result<ActorHandle, DomainError>;

    /// Destroys a previously spawned actor.
    fn despawn(&self, handle: &ActorHandle);
}

/// The game camera.
pub trait CameraRig: Send + Sync {
    /// Current pose.
    fn pose(&self) -> CameraPose;

    /// Moves the camera.
    fn set_pose(&self, pose: CameraPose);

    /// Applies a cutscene's authored camera setup.
    fn apply_setup(&self, setup: &CameraPose) {
        self.set_pose(*setup);
    }
}
