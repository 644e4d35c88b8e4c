//! Recording actor spawner.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use eventide_core::cutscene::ActorReference;
use eventide_core::error::DomainError;
use eventide_cutscene::{ActorHandle, ActorSpawner};

/// An actor spawner that records spawns and despawns. Prefabs registered
/// with `failing_prefab` fail to spawn.
#[derive(Debug, Default)]
pub struct RecordingActorSpawner {
    next_entity: AtomicU64,
    failing: HashSet<String>,
    spawned: Mutex<Vec<String>>,
    despawned: Mutex<Vec<String>>,
}

impl RecordingActorSpawner {
    /// Create a spawner that accepts every prefab.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `prefab` fail to spawn.
    #[must_use]
    pub fn failing_prefab(mut self, prefab: &str) -> Self {
        self.failing.insert(prefab.to_owned());
        self
    }

    /// Returns the actor ids spawned, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    /// Returns the actor ids despawned, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn despawned(&self) -> Vec<String> {
        self.despawned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActorSpawner for RecordingActorSpawner {
    async fn spawn(&self, actor: &ActorReference) -> Result<ActorHandle, DomainError> {
        if self.failing.contains(&actor.prefab) {
            return Err(DomainError::NotFound(format!("prefab {}", actor.prefab)));
        }
        self.spawned.lock().unwrap().push(actor.actor_id.clone());
        Ok(ActorHandle {
            actor_id: actor.actor_id.clone(),
            entity: self.next_entity.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    fn despawn(&self, handle: &ActorHandle) {
        self.despawned.lock().unwrap().push(handle.actor_id.clone());
    }
}
