//! Shared application state.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use eventide_content::application::command_handlers::LoadedBundle;
use eventide_content::application::query_handlers::{BundleSummary, get_bundle_summary};
use eventide_runtime::{EventRuntime, RuntimeError};
use eventide_world_state::domain::repository::SaveRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The event runtime being inspected and driven.
    pub runtime: Arc<EventRuntime>,
    /// Where save slots are persisted.
    pub saves: Arc<dyn SaveRepository>,
    content: Arc<Mutex<Option<BundleSummary>>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state with no bundle installed.
    #[must_use]
    pub fn new(runtime: Arc<EventRuntime>, saves: Arc<dyn SaveRepository>) -> Self {
        Self {
            runtime,
            saves,
            content: Arc::new(Mutex::new(None)),
        }
    }

    /// Loads a bundle into the runtime and remembers its summary.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Domain` if the bundle fails validation.
    pub fn install(&self, loaded: LoadedBundle) -> Result<BundleSummary, RuntimeError> {
        let summary = get_bundle_summary(&loaded);
        self.runtime.load_bundle(loaded.bundle)?;
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
        Ok(summary)
    }

    /// Summary of the most recently installed bundle.
    #[must_use]
    pub fn content(&self) -> Option<BundleSummary> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
