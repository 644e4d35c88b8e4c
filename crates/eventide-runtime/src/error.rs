//! Runtime error types.

use eventide_core::cutscene::CutsceneId;
use eventide_core::error::DomainError;
use eventide_core::event::EventId;
use thiserror::Error;

/// Errors returned by `EventRuntime` operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No event with this id is loaded.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// No cutscene with this id is loaded.
    #[error("cutscene not found: {0}")]
    CutsceneNotFound(CutsceneId),

    /// None of the event's pages has all its conditions satisfied.
    #[error("event {0} has no active page")]
    NoActivePage(EventId),

    /// Content, configuration or persistence failure.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
