//! Built-in commands.
//!
//! Each built-in is a small `RunnableCommand` built from its typed payload.
//! Commands that need the wider runtime go through the `CommandHost`.

use std::time::Duration;

use async_trait::async_trait;
use eventide_core::command::{self, CommandData, Operand, VariableOperation};
use eventide_core::cutscene::CutsceneId;
use eventide_interpreter::{CommandContext, CommandError, CommandRegistry, RunnableCommand};
use tracing::debug;

struct Wait(Duration);

#[async_trait]
impl RunnableCommand for Wait {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        tokio::select! {
            biased;
            () = ctx.cancellation.cancelled() => Err(CommandError::Cancelled),
            () = tokio::time::sleep(self.0) => Ok(()),
        }
    }
}

struct ShowMessage {
    speaker: Option<String>,
    text: String,
}

#[async_trait]
impl RunnableCommand for ShowMessage {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        ctx.host
            .present_message(self.speaker.as_deref(), &self.text)
            .await
    }
}

struct ControlSwitch {
    name: String,
    value: bool,
}

#[async_trait]
impl RunnableCommand for ControlSwitch {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        ctx.state.set_switch(&self.name, self.value);
        Ok(())
    }
}

struct ControlVariable {
    name: String,
    operation: VariableOperation,
    operand: Operand,
}

#[async_trait]
impl RunnableCommand for ControlVariable {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        ctx.state.apply_variable(&self.name, self.operation, &self.operand);
        Ok(())
    }
}

struct ControlSelfSwitch {
    name: String,
    value: bool,
}

#[async_trait]
impl RunnableCommand for ControlSelfSwitch {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        let event_id = ctx.event_id.ok_or_else(|| {
            CommandError::MissingTarget(format!("self-switch {} outside an event", self.name))
        })?;
        ctx.state.set_self_switch(event_id, &self.name, self.value);
        Ok(())
    }
}

struct PlayCutscene(CutsceneId);

#[async_trait]
impl RunnableCommand for PlayCutscene {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        ctx.host.play_cutscene(&self.0, ctx.cutscenes).await
    }
}

/// Outside a hybrid cutscene there is no timeline to meet.
struct TimelineMarker(String);

#[async_trait]
impl RunnableCommand for TimelineMarker {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        debug!(index = ctx.index, marker = %self.0, "timeline marker outside a timeline");
        Ok(())
    }
}

struct Comment;

#[async_trait]
impl RunnableCommand for Comment {
    async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        Ok(())
    }
}

fn boxed(command: impl RunnableCommand + 'static) -> Option<Box<dyn RunnableCommand>> {
    Some(Box::new(command))
}

/// A registry holding every built-in command. Hosts add their own commands
/// to it before constructing the runtime.
#[must_use]
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register(command::WAIT, false, |data| match data {
        CommandData::Wait { duration_ms } => boxed(Wait(Duration::from_millis(*duration_ms))),
        _ => None,
    });
    registry.register(command::SHOW_MESSAGE, false, |data| match data {
        CommandData::ShowMessage { speaker, text } => boxed(ShowMessage {
            speaker: speaker.clone(),
            text: text.clone(),
        }),
        _ => None,
    });
    registry.register(command::CONTROL_SWITCH, false, |data| match data {
        CommandData::ControlSwitch { name, value } => boxed(ControlSwitch {
            name: name.clone(),
            value: *value,
        }),
        _ => None,
    });
    registry.register(command::CONTROL_VARIABLE, false, |data| match data {
        CommandData::ControlVariable {
            name,
            operation,
            operand,
        } => boxed(ControlVariable {
            name: name.clone(),
            operation: *operation,
            operand: operand.clone(),
        }),
        _ => None,
    });
    registry.register(command::CONTROL_SELF_SWITCH, false, |data| match data {
        CommandData::ControlSelfSwitch { name, value } => boxed(ControlSelfSwitch {
            name: name.clone(),
            value: *value,
        }),
        _ => None,
    });
    registry.register(command::PLAY_CUTSCENE, true, |data| match data {
        CommandData::PlayCutscene { cutscene_id } => {
            boxed(PlayCutscene(CutsceneId::new(cutscene_id.clone())))
        }
        _ => None,
    });
    registry.register(command::TIMELINE_MARKER, true, |data| match data {
        CommandData::TimelineMarker { marker } => boxed(TimelineMarker(marker.clone())),
        _ => None,
    });
    registry.register(command::COMMENT, false, |data| match data {
        CommandData::Comment { .. } => boxed(Comment),
        _ => None,
    });

    registry
}
