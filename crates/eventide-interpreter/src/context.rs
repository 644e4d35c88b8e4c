//! Execution context handed to the interpreter and to each command.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use eventide_core::cutscene::CutsceneId;
use eventide_core::event::EventId;
use eventide_world_state::domain::state::GameState;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CommandError;
use crate::registry::CommandRegistry;

/// Services a command may need from the surrounding runtime.
///
/// This is the seam that replaces global managers: the runtime implements it
/// and passes itself down explicitly.
#[async_trait]
pub trait CommandHost: Send + Sync {
    /// Plays a cutscene and resolves when it has ended.
    ///
    /// `enclosing` lists the cutscenes whose command tracks issued the call,
    /// outermost first; empty when an event plays it directly.
    async fn play_cutscene(
        &self,
        cutscene_id: &CutsceneId,
        enclosing: &[CutsceneId],
    ) -> Result<(), CommandError>;

    /// Shows a message and resolves when the player dismisses it.
    async fn present_message(&self, speaker: Option<&str>, text: &str) -> Result<(), CommandError>;
}

/// A host with no cutscenes and no message UI.
///
/// Messages are logged and dismissed immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

#[async_trait]
impl CommandHost for NullHost {
    async fn play_cutscene(
        &self,
        cutscene_id: &CutsceneId,
        _enclosing: &[CutsceneId],
    ) -> Result<(), CommandError> {
        warn!(%cutscene_id, "no cutscene host configured");
        Err(CommandError::MissingTarget(format!("cutscene {cutscene_id}")))
    }

    async fn present_message(&self, speaker: Option<&str>, text: &str) -> Result<(), CommandError> {
        info!(speaker = speaker.unwrap_or(""), text, "message");
        Ok(())
    }
}

/// Everything an interpreter needs to run a command list.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Dispatch table for non-flow-control commands.
    pub registry: Arc<CommandRegistry>,
    /// Global switches and variables.
    pub state: Arc<GameState>,
    /// Runtime services for commands.
    pub host: Arc<dyn CommandHost>,
    /// The event that owns the script, used for self-switches.
    pub event_id: Option<EventId>,
    /// Cutscenes whose command tracks run this script, outermost first.
    pub cutscenes: Vec<CutsceneId>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("registry", &self.registry)
            .field("event_id", &self.event_id)
            .field("cutscenes", &self.cutscenes)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Creates a context with no owning event.
    #[must_use]
    pub fn new(
        registry: Arc<CommandRegistry>,
        state: Arc<GameState>,
        host: Arc<dyn CommandHost>,
    ) -> Self {
        Self {
            registry,
            state,
            host,
            event_id: None,
            cutscenes: Vec::new(),
        }
    }

    /// Returns a copy of this context owned by `event_id`.
    #[must_use]
    pub fn for_event(&self, event_id: EventId) -> Self {
        Self {
            event_id: Some(event_id),
            ..self.clone()
        }
    }

    /// Returns a copy of this context for the command track of `cutscene_id`.
    #[must_use]
    pub fn within_cutscene(&self, cutscene_id: CutsceneId) -> Self {
        let mut context = self.clone();
        context.cutscenes.push(cutscene_id);
        context
    }
}

/// What a single command sees while it executes.
pub struct CommandContext<'a> {
    /// Global switches and variables.
    pub state: &'a GameState,
    /// Runtime services.
    pub host: &'a dyn CommandHost,
    /// The owning event, if any.
    pub event_id: Option<&'a EventId>,
    /// Cutscenes whose command tracks run this command, outermost first.
    pub cutscenes: &'a [CutsceneId],
    /// Index of the command within its list.
    pub index: usize,
    /// Cancelled when the owning run is stopped.
    pub cancellation: &'a CancellationToken,
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("event_id", &self.event_id)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
