//! Recording camera rig.

use std::sync::Mutex;

use eventide_core::cutscene::CameraPose;
use eventide_cutscene::CameraRig;

/// A camera that records every applied setup and every direct pose change.
/// Direct pose changes are what the cutscene registry uses to restore.
#[derive(Debug, Default)]
pub struct RecordingCamera {
    pose: Mutex<CameraPose>,
    applied: Mutex<Vec<CameraPose>>,
    restored: Mutex<Vec<CameraPose>>,
}

impl RecordingCamera {
    /// Create a camera at `pose`.
    #[must_use]
    pub fn at(pose: CameraPose) -> Self {
        Self {
            pose: Mutex::new(pose),
            ..Self::default()
        }
    }

    /// Returns every cutscene setup applied, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn applied(&self) -> Vec<CameraPose> {
        self.applied.lock().unwrap().clone()
    }

    /// Returns every pose restored through `set_pose`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn restored(&self) -> Vec<CameraPose> {
        self.restored.lock().unwrap().clone()
    }
}

impl CameraRig for RecordingCamera {
    fn pose(&self) -> CameraPose {
        *self.pose.lock().unwrap()
    }

    fn set_pose(&self, pose: CameraPose) {
        *self.pose.lock().unwrap() = pose;
        self.restored.lock().unwrap().push(pose);
    }

    fn apply_setup(&self, setup: &CameraPose) {
        *self.pose.lock().unwrap() = *setup;
        self.applied.lock().unwrap().push(*setup);
    }
}
