//! Headless collaborators.
//!
//! Stand-ins for the engine-side timeline player, actor spawner and camera,
//! used when the runtime runs without a game attached (the inspector server,
//! tooling). Timelines finish as soon as they start.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use eventide_core::cutscene::{ActorReference, CameraPose};
use eventide_core::error::DomainError;
use eventide_cutscene::{ActorHandle, ActorSpawner, CameraRig, TimelinePlayer};
use tracing::debug;

/// A timeline player with no playback: every timeline ends immediately and
/// every marker is already reached.
#[derive(Debug, Default)]
pub struct HeadlessTimeline;

#[async_trait]
impl TimelinePlayer for HeadlessTimeline {
    async fn play(&self, timeline: &str) -> Result<(), DomainError> {
        debug!(timeline, "headless timeline played");
        Ok(())
    }

    fn stop(&self, _timeline: &str) {}

    fn is_playing(&self, _timeline: &str) -> bool {
        false
    }

    async fn wait_marker(&self, _timeline: &str, _marker: &str) {}
}

/// An actor spawner that hands out sequential entity ids.
#[derive(Debug, Default)]
pub struct HeadlessActorSpawner {
    next_entity: AtomicU64,
}

#[async_trait]
impl ActorSpawner for HeadlessActorSpawner {
    async fn spawn(&self, actor: &ActorReference) -> Result<ActorHandle, DomainError> {
        let entity = self.next_entity.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(actor_id = %actor.actor_id, entity, "headless actor spawned");
        Ok(ActorHandle {
            actor_id: actor.actor_id.clone(),
            entity,
        })
    }

    fn despawn(&self, handle: &ActorHandle) {
        debug!(actor_id = %handle.actor_id, entity = handle.entity, "headless actor despawned");
    }
}

/// A camera that only remembers its pose.
#[derive(Debug, Default)]
pub struct HeadlessCamera {
    pose: Mutex<CameraPose>,
}

impl CameraRig for HeadlessCamera {
    fn pose(&self) -> CameraPose {
        *self
            .pose
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_pose(&self, pose: CameraPose) {
        *self
            .pose
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = pose;
    }
}
