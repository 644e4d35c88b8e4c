//! Cutscene controller.
//!
//! Drives one cutscene through `Idle → SettingUpActors → Executing →
//! CleaningUp → Completed`. Execution dispatches on the resolved mode:
//! the timeline track alone, the command track alone, or both joined, in
//! which case the cutscene completes only when both tracks have finished.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use eventide_core::command::Command;
use eventide_core::cutscene::CutsceneDescriptor;
use eventide_core::mode::{ExecutionMode, select_cutscene_mode};
use eventide_interpreter::{ExecutionContext, Interpreter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::bindings::ActorBindings;
use crate::domain::collaborators::{ActorSpawner, TimelinePlayer};
use crate::domain::registry::CutsceneRegistry;
use crate::domain::sync::SyncSchedule;

/// Lifecycle phase of a cutscene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutscenePhase {
    /// Not started.
    Idle,
    /// Spawning and binding actors.
    SettingUpActors,
    /// Running the timeline and/or command tracks.
    Executing,
    /// Releasing actors and the camera.
    CleaningUp,
    /// Finished, normally or after `stop()`.
    Completed,
}

/// How a call to `play` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutsceneOutcome {
    /// Every track finished.
    Completed,
    /// `stop()` ended the cutscene early.
    Cancelled,
    /// A cutscene with the same id was already playing; nothing happened.
    AlreadyActive,
}

/// Collaborators a cutscene needs.
#[derive(Clone)]
pub struct CutsceneServices {
    /// Timeline asset player.
    pub timeline: Arc<dyn TimelinePlayer>,
    /// Actor spawner.
    pub actors: Arc<dyn ActorSpawner>,
    /// Active-cutscene registry shared by every controller.
    pub registry: Arc<CutsceneRegistry>,
    /// Context for the command track. Its `cutscenes` are the cutscenes
    /// enclosing this one; the controller appends its own id.
    pub execution: ExecutionContext,
    /// How often the timeline track polls the player.
    pub frame_interval: Duration,
}

impl fmt::Debug for CutsceneServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CutsceneServices")
            .field("registry", &self.registry)
            .field("execution", &self.execution)
            .field("frame_interval", &self.frame_interval)
            .finish_non_exhaustive()
    }
}

/// Stops a timeline that is still playing when the track ends early.
struct PlaybackGuard<'a> {
    player: &'a dyn TimelinePlayer,
    timeline: &'a str,
}

impl Drop for PlaybackGuard<'_> {
    fn drop(&mut self) {
        if self.player.is_playing(self.timeline) {
            self.player.stop(self.timeline);
            debug!(timeline = self.timeline, "timeline stopped");
        }
    }
}

/// Plays one cutscene descriptor.
pub struct CutsceneController {
    descriptor: Arc<CutsceneDescriptor>,
    commands: Arc<[Command]>,
    mode: ExecutionMode,
    services: CutsceneServices,
    interpreter: Interpreter,
    phase: Mutex<CutscenePhase>,
    cancel: CancellationToken,
}

impl fmt::Debug for CutsceneController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CutsceneController")
            .field("id", &self.descriptor.id)
            .field("mode", &self.mode)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl CutsceneController {
    /// Creates a controller and resolves its execution mode.
    #[must_use]
    pub fn new(descriptor: Arc<CutsceneDescriptor>, services: CutsceneServices) -> Self {
        let mode = select_cutscene_mode(&descriptor);
        let commands: Arc<[Command]> = descriptor.commands.clone().into();
        let execution = services.execution.within_cutscene(descriptor.id.clone());
        let interpreter = Interpreter::new(execution);
        Self {
            descriptor,
            commands,
            mode,
            services,
            interpreter,
            phase: Mutex::new(CutscenePhase::Idle),
            cancel: CancellationToken::new(),
        }
    }

    /// The descriptor being played.
    #[must_use]
    pub fn descriptor(&self) -> &CutsceneDescriptor {
        &self.descriptor
    }

    /// Resolved execution mode. Never `Auto`.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Returns `true` when a timeline track is involved.
    #[must_use]
    pub fn is_cutscene_mode(&self) -> bool {
        self.mode.is_cutscene_mode()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> CutscenePhase {
        *self.phase_lock()
    }

    /// Elapsed time of each command-track command, keyed by index.
    #[must_use]
    pub fn execution_timings(&self) -> BTreeMap<usize, Duration> {
        self.interpreter.execution_timings()
    }

    /// Returns `true` once `stop()` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn phase_lock(&self) -> MutexGuard<'_, CutscenePhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: CutscenePhase) {
        *self.phase_lock() = phase;
        debug!(cutscene_id = %self.descriptor.id, ?phase, "cutscene phase");
    }

    /// Force-terminates whichever tracks are active. Idempotent; a
    /// controller stopped before `play` never starts.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!(cutscene_id = %self.descriptor.id, "cutscene stop requested");
        }
        self.cancel.cancel();
        self.interpreter.stop();
    }

    /// Plays the cutscene to the end, or until `stop()`.
    #[instrument(skip(self), fields(cutscene_id = %self.descriptor.id, mode = %self.mode))]
    pub async fn play(&self) -> CutsceneOutcome {
        if self.cancel.is_cancelled() {
            self.set_phase(CutscenePhase::Completed);
            return CutsceneOutcome::Cancelled;
        }

        let Some(active) = self
            .services
            .registry
            .activate(&self.descriptor.id, self.descriptor.camera_setup.as_ref())
        else {
            warn!("cutscene already active; play ignored");
            return CutsceneOutcome::AlreadyActive;
        };

        self.set_phase(CutscenePhase::SettingUpActors);
        let mut bindings = ActorBindings::new(Arc::clone(&self.services.actors));
        let set_up = tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = bindings.bind_all(&self.descriptor.actors) => true,
        };

        let finished = set_up && {
            self.set_phase(CutscenePhase::Executing);
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => false,
                () = self.execute() => true,
            }
        };

        self.set_phase(CutscenePhase::CleaningUp);
        drop(bindings);
        drop(active);
        self.set_phase(CutscenePhase::Completed);

        let outcome = if finished && !self.cancel.is_cancelled() {
            CutsceneOutcome::Completed
        } else {
            CutsceneOutcome::Cancelled
        };
        info!(?outcome, "cutscene ended");
        outcome
    }

    async fn execute(&self) {
        match self.mode {
            ExecutionMode::Auto | ExecutionMode::Command => self.run_command_track().await,
            ExecutionMode::Timeline => self.follow_timeline(self.start_timeline().await).await,
            ExecutionMode::Hybrid => {
                // Playback is running before the first marker barrier asks for it.
                let playback = self.start_timeline().await;
                tokio::join!(
                    self.follow_timeline(playback),
                    self.run_synced_command_track()
                );
            }
        }
    }

    async fn run_command_track(&self) {
        let outcome = self
            .interpreter
            .start_interpretation(Arc::clone(&self.commands), None)
            .await;
        debug!(?outcome, "command track ended");
    }

    async fn run_synced_command_track(&self) {
        let mut schedule = SyncSchedule::new(
            self.interpreter.context().cutscenes.clone(),
            &self.commands,
            self.descriptor.timeline.clone(),
            Arc::clone(&self.services.timeline),
            Arc::clone(&self.services.registry),
        );
        let outcome = self
            .interpreter
            .start_with_barrier(Arc::clone(&self.commands), &mut schedule, None)
            .await;
        debug!(?outcome, "command track ended");
    }

    async fn start_timeline(&self) -> Option<PlaybackGuard<'_>> {
        let Some(timeline) = self.descriptor.timeline.as_deref() else {
            warn!("timeline mode without a timeline reference; track skipped");
            return None;
        };

        let player = self.services.timeline.as_ref();
        if let Err(error) = player.play(timeline).await {
            warn!(timeline, %error, "timeline failed to start; track skipped");
            return None;
        }
        Some(PlaybackGuard { player, timeline })
    }

    async fn follow_timeline(&self, playback: Option<PlaybackGuard<'_>>) {
        let Some(playback) = playback else {
            return;
        };

        let period = self.services.frame_interval.max(Duration::from_millis(1));
        let mut frames = tokio::time::interval(period);
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        while playback.player.is_playing(playback.timeline) {
            frames.tick().await;
        }
        debug!(timeline = playback.timeline, "timeline track ended");
    }
}
