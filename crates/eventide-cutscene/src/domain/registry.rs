//! Process-wide set of active cutscenes.
//!
//! The camera pose is saved when the first cutscene activates and restored
//! when the last one ends, so overlapping cutscenes restore exactly once.
//! Every active cutscene also holds the player input lock.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eventide_core::cutscene::{CameraPose, CutsceneId};
use eventide_core::input_lock::{InputLock, InputLockGuard};
use tokio::sync::watch;
use tracing::{debug, info};

use super::collaborators::CameraRig;

/// Registry of the cutscenes currently playing.
pub struct CutsceneRegistry {
    camera: Arc<dyn CameraRig>,
    input_lock: Arc<InputLock>,
    saved_pose: Mutex<Option<CameraPose>>,
    active: watch::Sender<BTreeSet<CutsceneId>>,
    // Cutscenes whose command track waits in `wait_for_others`, with a count
    // per waiting chain.
    parked: watch::Sender<BTreeMap<CutsceneId, usize>>,
}

impl fmt::Debug for CutsceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CutsceneRegistry")
            .field("active", &*self.active.borrow())
            .finish_non_exhaustive()
    }
}

impl CutsceneRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(camera: Arc<dyn CameraRig>, input_lock: Arc<InputLock>) -> Arc<Self> {
        let (active, _) = watch::channel(BTreeSet::new());
        let (parked, _) = watch::channel(BTreeMap::new());
        Arc::new(Self {
            camera,
            input_lock,
            saved_pose: Mutex::new(None),
            active,
            parked,
        })
    }

    fn saved_pose(&self) -> MutexGuard<'_, Option<CameraPose>> {
        self.saved_pose.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `id` active and applies its camera setup.
    ///
    /// Returns `None` if `id` is already active. The returned guard
    /// deactivates the cutscene when dropped.
    #[must_use]
    pub fn activate(
        self: &Arc<Self>,
        id: &CutsceneId,
        camera_setup: Option<&CameraPose>,
    ) -> Option<ActiveCutscene> {
        let mut saved_pose = self.saved_pose();

        let mut first = false;
        let inserted = self.active.send_if_modified(|active| {
            first = active.is_empty();
            active.insert(id.clone())
        });
        if !inserted {
            return None;
        }

        if first {
            let pose = self.camera.pose();
            debug!(cutscene_id = %id, ?pose, "camera pose saved");
            *saved_pose = Some(pose);
        }
        if let Some(setup) = camera_setup {
            self.camera.apply_setup(setup);
        }
        drop(saved_pose);

        info!(cutscene_id = %id, "cutscene active");
        Some(ActiveCutscene {
            registry: Arc::clone(self),
            id: id.clone(),
            _input: self.input_lock.acquire(format!("cutscene:{id}")),
        })
    }

    fn deactivate(&self, id: &CutsceneId) {
        let mut saved_pose = self.saved_pose();

        let mut now_empty = false;
        let removed = self.active.send_if_modified(|active| {
            let removed = active.remove(id);
            now_empty = active.is_empty();
            removed
        });
        if !removed {
            return;
        }

        if now_empty {
            if let Some(pose) = saved_pose.take() {
                self.camera.set_pose(pose);
                debug!(cutscene_id = %id, ?pose, "camera pose restored");
            }
        }
        info!(cutscene_id = %id, "cutscene inactive");
    }

    /// Returns `true` if `id` is playing.
    #[must_use]
    pub fn is_active(&self, id: &CutsceneId) -> bool {
        self.active.borrow().contains(id)
    }

    /// Returns `true` if any cutscene is playing.
    #[must_use]
    pub fn is_any_active(&self) -> bool {
        !self.active.borrow().is_empty()
    }

    /// Ids of every playing cutscene, sorted.
    #[must_use]
    pub fn active_ids(&self) -> Vec<CutsceneId> {
        self.active.borrow().iter().cloned().collect()
    }

    /// Resolves once every playing cutscene outside `lineage` has ended or
    /// is itself waiting here.
    ///
    /// `lineage` is the waiting cutscene and the cutscenes enclosing it.
    /// They are blocked on this call, so they never count as playing. Of two
    /// cutscenes waiting on each other, the later one proceeds and the
    /// earlier one waits for it to end.
    pub async fn wait_for_others(&self, lineage: &[CutsceneId]) {
        let _parked = Parked::new(self, lineage);
        let mut active = self.active.subscribe();
        let mut parked = self.parked.subscribe();
        loop {
            let released = {
                let active = active.borrow_and_update();
                let parked = parked.borrow_and_update();
                active
                    .iter()
                    .all(|id| lineage.contains(id) || parked.contains_key(id))
            };
            if released {
                return;
            }
            // Both senders live in `self`, so neither channel can close here.
            tokio::select! {
                _ = active.changed() => {}
                _ = parked.changed() => {}
            }
        }
    }
}

/// Marks a lineage as waiting for the lifetime of one `wait_for_others`.
struct Parked<'a> {
    registry: &'a CutsceneRegistry,
    lineage: &'a [CutsceneId],
}

impl<'a> Parked<'a> {
    fn new(registry: &'a CutsceneRegistry, lineage: &'a [CutsceneId]) -> Self {
        registry.parked.send_modify(|parked| {
            for id in lineage {
                *parked.entry(id.clone()).or_default() += 1;
            }
        });
        Self { registry, lineage }
    }
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        self.registry.parked.send_modify(|parked| {
            for id in self.lineage {
                if let Some(count) = parked.get_mut(id) {
                    *count -= 1;
                    if *count == 0 {
                        parked.remove(id);
                    }
                }
            }
        });
    }
}

/// Guard for an active cutscene. Dropping it deactivates the cutscene,
/// restores the camera if it was the last one, and releases its hold on the
/// input lock.
pub struct ActiveCutscene {
    registry: Arc<CutsceneRegistry>,
    id: CutsceneId,
    _input: InputLockGuard,
}

impl fmt::Debug for ActiveCutscene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveCutscene")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl ActiveCutscene {
    /// The active cutscene's id.
    #[must_use]
    pub fn id(&self) -> &CutsceneId {
        &self.id
    }
}

impl Drop for ActiveCutscene {
    fn drop(&mut self) {
        self.registry.deactivate(&self.id);
    }
}
