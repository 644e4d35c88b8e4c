//! Command dispatch table.
//!
//! Maps a command type tag to a factory that builds a runnable command from
//! the typed payload. Registered once at startup, then shared read-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use eventide_core::command::{Command, CommandData};

use crate::context::CommandContext;
use crate::error::CommandError;

/// A command ready to execute.
#[async_trait]
pub trait RunnableCommand: Send + Sync {
    /// Performs the command's effect, suspending as long as it needs to.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if the effect could not be applied. The
    /// interpreter logs the error and continues with the next command.
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError>;
}

/// Builds a runnable command from its payload, or `None` if the payload
/// does not belong to this factory.
pub type CommandFactory =
    Arc<dyn Fn(&CommandData) -> Option<Box<dyn RunnableCommand>> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    factory: CommandFactory,
    cutscene_only: bool,
}

/// Dispatch table keyed by command type tag.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("CommandRegistry")
            .field("tags", &tags)
            .finish()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `tag`, replacing any previous entry.
    ///
    /// `cutscene_only` marks commands that only make sense inside a cutscene;
    /// the execution mode selector classifies scripts by it.
    pub fn register<F>(&mut self, tag: impl Into<String>, cutscene_only: bool, factory: F)
    where
        F: Fn(&CommandData) -> Option<Box<dyn RunnableCommand>> + Send + Sync + 'static,
    {
        self.entries.insert(
            tag.into(),
            Entry {
                factory: Arc::new(factory),
                cutscene_only,
            },
        );
    }

    /// Returns `true` if a factory is registered for `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Returns `true` if `tag` is registered as cutscene-only.
    /// Unregistered tags are event commands.
    #[must_use]
    pub fn is_cutscene_only(&self, tag: &str) -> bool {
        self.entries.get(tag).is_some_and(|entry| entry.cutscene_only)
    }

    /// Builds the runnable form of `command`, or `None` if its type is not
    /// registered or the factory rejects the payload.
    #[must_use]
    pub fn construct(&self, command: &Command) -> Option<Box<dyn RunnableCommand>> {
        let entry = self.entries.get(command.command_type())?;
        (entry.factory)(&command.data)
    }
}
