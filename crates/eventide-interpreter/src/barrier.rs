//! Pre-command barriers.
//!
//! A barrier lets a caller block the command track before a given index.
//! Hybrid cutscenes use it to pace the command track against the timeline.

use async_trait::async_trait;
use eventide_core::command::Command;

/// Result of passing a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierOutcome {
    /// Run the guarded command normally.
    Proceed,
    /// The barrier already realized the command's effect; skip it.
    Consumed,
}

/// Awaited by the interpreter before each non-flow-control command.
#[async_trait]
pub trait CommandBarrier: Send {
    /// Blocks until the command at `index` may run.
    async fn before_command(&mut self, index: usize, command: &Command) -> BarrierOutcome;
}
