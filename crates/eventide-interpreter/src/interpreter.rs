//! The command interpreter.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use eventide_core::command::{Command, CommandData};
use eventide_core::flow::FlowTable;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::barrier::{BarrierOutcome, CommandBarrier};
use crate::context::{CommandContext, ExecutionContext};

/// How a call to `start_interpretation` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every command ran; control fell off the end of the list.
    Completed,
    /// An `exit_event` command stopped the script. This is a normal finish.
    Exited,
    /// `stop()` cancelled the run.
    Cancelled,
    /// The interpreter was already running; nothing happened.
    AlreadyRunning,
}

impl RunOutcome {
    /// Returns `true` for the outcomes that invoke the completion callback.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Exited)
    }
}

/// Invoked once when a run finishes normally (`Completed` or `Exited`).
/// Never invoked for `Cancelled`.
pub type CompletionCallback = Box<dyn FnOnce(RunOutcome) + Send>;

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    index: usize,
    timings: BTreeMap<usize, Duration>,
    cancel: Option<CancellationToken>,
}

/// Clears the running flag when the run future finishes or is dropped.
struct RunningGuard<'a> {
    interpreter: &'a Interpreter,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut run = self.interpreter.run();
        run.running = false;
        run.cancel = None;
    }
}

/// Sequential executor for one command list at a time.
///
/// The run itself is the future returned by `start_interpretation`; the
/// other methods observe or steer it from outside and may be called while
/// it is suspended.
#[derive(Debug)]
pub struct Interpreter {
    context: ExecutionContext,
    run: Mutex<RunState>,
    paused: watch::Sender<bool>,
}

impl Interpreter {
    /// Creates an idle interpreter.
    #[must_use]
    pub fn new(context: ExecutionContext) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            context,
            run: Mutex::new(RunState::default()),
            paused,
        }
    }

    /// The context commands run against.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn run(&self) -> MutexGuard<'_, RunState> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` while a run is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run().running
    }

    /// Returns `true` while the pause flag is set.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Index of the command currently executing (or about to).
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.run().index
    }

    /// Elapsed time of each executed command, keyed by index. A command
    /// executed more than once (inside a loop) keeps its latest time.
    #[must_use]
    pub fn execution_timings(&self) -> BTreeMap<usize, Duration> {
        self.run().timings.clone()
    }

    /// Sets the pause flag. The current command finishes; the next one waits
    /// until `resume()`.
    ///
    /// The flag outlives runs: pausing an idle interpreter makes the next
    /// run wait before its first command.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// Clears the pause flag.
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Cancels the current run, dropping whatever command is suspended.
    /// Does nothing when idle; calling it twice is harmless.
    pub fn stop(&self) {
        if let Some(cancel) = self.run().cancel.as_ref() {
            cancel.cancel();
        }
    }

    /// Runs `commands` to the end.
    ///
    /// If a run is already in progress this logs a warning and returns
    /// `RunOutcome::AlreadyRunning` without touching it.
    pub async fn start_interpretation(
        &self,
        commands: Arc<[Command]>,
        on_complete: Option<CompletionCallback>,
    ) -> RunOutcome {
        self.run_script(commands, None, on_complete).await
    }

    /// Runs `commands`, passing `barrier` before every non-flow-control
    /// command. Used for the command track of hybrid cutscenes.
    pub async fn start_with_barrier(
        &self,
        commands: Arc<[Command]>,
        barrier: &mut dyn CommandBarrier,
        on_complete: Option<CompletionCallback>,
    ) -> RunOutcome {
        self.run_script(commands, Some(barrier), on_complete).await
    }

    fn begin(&self) -> Option<CancellationToken> {
        let mut run = self.run();
        if run.running {
            return None;
        }
        let cancel = CancellationToken::new();
        run.running = true;
        run.index = 0;
        run.timings.clear();
        run.cancel = Some(cancel.clone());
        Some(cancel)
    }

    async fn run_script(
        &self,
        commands: Arc<[Command]>,
        barrier: Option<&mut dyn CommandBarrier>,
        on_complete: Option<CompletionCallback>,
    ) -> RunOutcome {
        let Some(cancel) = self.begin() else {
            warn!(
                event_id = ?self.context.event_id,
                "interpreter already running; start ignored"
            );
            return RunOutcome::AlreadyRunning;
        };

        debug!(
            event_id = ?self.context.event_id,
            commands = commands.len(),
            "interpretation started"
        );
        if self.is_paused() {
            info!(event_id = ?self.context.event_id, "run starts paused; waiting for resume");
        }

        let outcome = {
            let _running = RunningGuard { interpreter: self };
            self.execute_list(&commands, barrier, &cancel).await
        };

        debug!(event_id = ?self.context.event_id, ?outcome, "interpretation ended");

        if outcome.is_finished() {
            if let Some(on_complete) = on_complete {
                on_complete(outcome);
            }
        }
        outcome
    }

    async fn execute_list(
        &self,
        commands: &[Command],
        mut barrier: Option<&mut dyn CommandBarrier>,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        if commands.is_empty() {
            return RunOutcome::Completed;
        }

        let flow = FlowTable::build(commands);
        for issue in flow.issues() {
            warn!(index = issue.index, "malformed script: {}", issue.message);
        }

        let mut loops: Vec<usize> = Vec::new();
        let mut index = 0;
        while index < commands.len() {
            self.run().index = index;
            // Every step is a suspension point, so command-only loops share the thread.
            tokio::task::yield_now().await;
            if !self.wait_while_paused(cancel).await || cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            let command = &commands[index];
            if !command.enabled {
                index += 1;
                continue;
            }

            let started = Instant::now();
            let next = match &command.data {
                CommandData::ConditionalBranch { condition } => {
                    let event_id = self.context.event_id.as_ref();
                    if self.context.state.evaluate(condition, event_id) {
                        index + 1
                    } else {
                        flow.branch_false_target(index).unwrap_or(index + 1)
                    }
                }
                CommandData::Else => flow.else_exit_target(index).unwrap_or(index + 1),
                CommandData::EndBranch => index + 1,
                CommandData::Loop => {
                    loops.push(index);
                    index + 1
                }
                CommandData::EndLoop => flow.loop_start(index).map_or(index + 1, |start| start + 1),
                CommandData::BreakLoop => {
                    if let Some(start) = loops.pop() {
                        flow.loop_end(start).map_or(commands.len(), |end| end + 1)
                    } else {
                        warn!(index, "break_loop outside of any loop; skipped");
                        index + 1
                    }
                }
                CommandData::ExitEvent => {
                    self.record_timing(index, started.elapsed());
                    info!(index, "exit_event reached; script stopped");
                    return RunOutcome::Exited;
                }
                _ => {
                    if let Some(barrier) = barrier.as_mut() {
                        let passed = tokio::select! {
                            biased;
                            () = cancel.cancelled() => return RunOutcome::Cancelled,
                            passed = barrier.before_command(index, command) => passed,
                        };
                        if passed == BarrierOutcome::Consumed {
                            self.record_timing(index, started.elapsed());
                            index += 1;
                            continue;
                        }
                    }

                    let Some(runnable) = self.context.registry.construct(command) else {
                        warn!(
                            index,
                            command_type = command.command_type(),
                            "no runnable command for type; skipped"
                        );
                        index += 1;
                        continue;
                    };

                    let ctx = CommandContext {
                        state: &self.context.state,
                        host: self.context.host.as_ref(),
                        event_id: self.context.event_id.as_ref(),
                        cutscenes: &self.context.cutscenes,
                        index,
                        cancellation: cancel,
                    };
                    let result = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return RunOutcome::Cancelled,
                        result = runnable.execute(&ctx) => result,
                    };
                    if let Err(error) = result {
                        warn!(
                            index,
                            command_type = command.command_type(),
                            %error,
                            "command failed; continuing"
                        );
                    }
                    index + 1
                }
            };

            self.record_timing(index, started.elapsed());
            index = next;
        }

        RunOutcome::Completed
    }

    fn record_timing(&self, index: usize, elapsed: Duration) {
        self.run().timings.insert(index, elapsed);
    }

    /// Returns `false` if cancelled while paused.
    async fn wait_while_paused(&self, cancel: &CancellationToken) -> bool {
        let mut paused = self.paused.subscribe();
        loop {
            let is_paused = *paused.borrow_and_update();
            if !is_paused {
                return true;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => return false,
                changed = paused.changed() => {
                    if changed.is_err() {
                        return true;
                    }
                }
            }
        }
    }
}
