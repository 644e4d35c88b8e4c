//! Eventide — Command Interpreter.
//!
//! Runs one command list as a cancellable, pausable async task: branches,
//! loops, breaks and exits are handled here; every other command is looked
//! up in a `CommandRegistry` by type tag and executed through its
//! `RunnableCommand` implementation.

pub mod barrier;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod registry;

pub use barrier::{BarrierOutcome, CommandBarrier};
pub use context::{CommandContext, CommandHost, ExecutionContext, NullHost};
pub use error::CommandError;
pub use interpreter::{CompletionCallback, Interpreter, RunOutcome};
pub use registry::{CommandFactory, CommandRegistry, RunnableCommand};
