//! Actor bindings for one cutscene.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use eventide_core::cutscene::ActorReference;
use tracing::{debug, warn};

use super::collaborators::{ActorHandle, ActorSpawner};

/// Spawned actors keyed by actor id. Every actor is despawned when the
/// bindings are released or dropped.
pub struct ActorBindings {
    spawner: Arc<dyn ActorSpawner>,
    bound: BTreeMap<String, ActorHandle>,
}

impl fmt::Debug for ActorBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorBindings")
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl ActorBindings {
    /// Creates empty bindings backed by `spawner`.
    #[must_use]
    pub fn new(spawner: Arc<dyn ActorSpawner>) -> Self {
        Self {
            spawner,
            bound: BTreeMap::new(),
        }
    }

    /// Spawns and binds every actor. An actor that fails to spawn, or whose
    /// id is already bound, is logged and skipped.
    pub async fn bind_all(&mut self, actors: &[ActorReference]) {
        for actor in actors {
            if self.bound.contains_key(&actor.actor_id) {
                warn!(actor_id = %actor.actor_id, "actor bound twice; skipped");
                continue;
            }
            match self.spawner.spawn(actor).await {
                Ok(handle) => {
                    debug!(actor_id = %actor.actor_id, entity = handle.entity, "actor bound");
                    self.bound.insert(actor.actor_id.clone(), handle);
                }
                Err(error) => {
                    warn!(actor_id = %actor.actor_id, %error, "actor failed to spawn; skipped");
                }
            }
        }
    }

    /// The handle bound to `actor_id`.
    #[must_use]
    pub fn get(&self, actor_id: &str) -> Option<&ActorHandle> {
        self.bound.get(actor_id)
    }

    /// Number of bound actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Despawns every bound actor.
    pub fn release_all(&mut self) {
        for (actor_id, handle) in std::mem::take(&mut self.bound) {
            self.spawner.despawn(&handle);
            debug!(%actor_id, "actor released");
        }
    }
}

impl Drop for ActorBindings {
    fn drop(&mut self) {
        self.release_all();
    }
}
