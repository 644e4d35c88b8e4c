//! Command execution errors.

use thiserror::Error;

/// Failure of a single command. The interpreter logs it and moves on.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command's target (cutscene, actor, slot) could not be resolved.
    #[error("missing target: {0}")]
    MissingTarget(String),

    /// The command ran but could not complete its effect.
    #[error("command failed: {0}")]
    Failed(String),

    /// The command observed cancellation and stopped early.
    #[error("command cancelled")]
    Cancelled,
}
