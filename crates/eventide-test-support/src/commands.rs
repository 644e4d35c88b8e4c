//! Recording commands — custom commands that log their execution.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eventide_core::command::{Command, CommandData};
use eventide_interpreter::{CommandContext, CommandError, CommandRegistry, RunnableCommand};

/// Type tag of probe commands.
pub const PROBE: &str = "probe";

/// Shared log that probe commands append their labels to.
#[derive(Debug, Clone, Default)]
pub struct ProbeLog(Arc<Mutex<Vec<String>>>);

impl ProbeLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every label logged, in execution order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, label: &str) {
        self.0.lock().unwrap().push(label.to_owned());
    }
}

struct Probe {
    label: String,
    log: ProbeLog,
}

#[async_trait]
impl RunnableCommand for Probe {
    async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        self.log.push(&self.label);
        Ok(())
    }
}

/// A probe command that logs `label` when executed.
#[must_use]
pub fn probe(label: &str) -> Command {
    Command::new(CommandData::Custom {
        tag: PROBE.to_owned(),
        payload: serde_json::json!(label),
    })
}

/// Registers the probe command so its executions land in `log`.
pub fn register_probe(registry: &mut CommandRegistry, log: &ProbeLog) {
    let log = log.clone();
    registry.register(PROBE, false, move |data| {
        let CommandData::Custom { payload, .. } = data else {
            return None;
        };
        let label = payload.as_str()?.to_owned();
        Some(Box::new(Probe {
            label,
            log: log.clone(),
        }) as Box<dyn RunnableCommand>)
    });
}
