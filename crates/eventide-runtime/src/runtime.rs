//! The event runtime.
//!
//! Starts events under their trigger's concurrency policy: autorun events
//! run one at a time behind a FIFO queue and hold the input lock, parallel
//! events run up to `max_parallel` at once, and every other trigger runs
//! freely. Each run gets its own interpreter on its own task. Cutscenes
//! started directly or through `play_cutscene` commands share one
//! active-cutscene registry.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventide_content::domain::bundle::ScriptBundle;
use eventide_content::domain::validation::validate;
use eventide_core::clock::{Clock, SystemClock};
use eventide_core::command::Command;
use eventide_core::cutscene::{CutsceneDescriptor, CutsceneId};
use eventide_core::event::{ActiveEventInstance, EventDefinition, EventId, Trigger};
use eventide_core::input_lock::{InputLock, InputLockGuard};
use eventide_core::mode::{ExecutionMode, select_mode};
use eventide_cutscene::{
    ActorSpawner, CameraRig, CutsceneController, CutsceneOutcome, CutscenePhase,
    CutsceneRegistry, CutsceneServices, TimelinePlayer,
};
use eventide_interpreter::{
    CommandError, CommandHost, CommandRegistry, ExecutionContext, Interpreter, RunOutcome,
};
use eventide_world_state::application::command_handlers::{handle_load, handle_save};
use eventide_world_state::domain::repository::SaveRepository;
use eventide_world_state::domain::save::SaveData;
use eventide_world_state::domain::state::GameState;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::builtins::default_registry;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::headless::{HeadlessActorSpawner, HeadlessCamera, HeadlessTimeline};
use crate::pages::select_page;

/// Everything the runtime is built from.
pub struct RuntimeServices {
    /// World state shared by every script.
    pub state: Arc<GameState>,
    /// Commands scripts may use.
    pub registry: CommandRegistry,
    /// Timestamps for run starts and saves.
    pub clock: Arc<dyn Clock>,
    /// Engine timeline player.
    pub timeline: Arc<dyn TimelinePlayer>,
    /// Engine actor spawner.
    pub actors: Arc<dyn ActorSpawner>,
    /// Engine camera.
    pub camera: Arc<dyn CameraRig>,
}

impl RuntimeServices {
    /// Built-in commands, the system clock and headless engine stand-ins.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            state: Arc::new(GameState::default()),
            registry: default_registry(),
            clock: Arc::new(SystemClock),
            timeline: Arc::new(HeadlessTimeline),
            actors: Arc::new(HeadlessActorSpawner::default()),
            camera: Arc::new(HeadlessCamera::default()),
        }
    }
}

impl fmt::Debug for RuntimeServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeServices")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Result of `start_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A run began with this id.
    Started(Uuid),
    /// Another autorun event is active; this one waits its turn.
    Queued,
    /// The parallel cap is reached.
    Rejected,
    /// The event already has a run in progress.
    AlreadyRunning,
}

/// A cutscene currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutsceneStatus {
    /// Cutscene id.
    pub id: CutsceneId,
    /// Resolved execution mode.
    pub mode: ExecutionMode,
    /// Lifecycle phase.
    pub phase: CutscenePhase,
}

struct RunningEvent {
    run_id: Uuid,
    event_id: EventId,
    page_index: usize,
    trigger: Trigger,
    mode: ExecutionMode,
    started_at: DateTime<Utc>,
    interpreter: Interpreter,
    cancel: CancellationToken,
    input: Mutex<Option<InputLockGuard>>,
}

impl RunningEvent {
    fn view(&self) -> ActiveEventInstance {
        ActiveEventInstance {
            run_id: self.run_id,
            event_id: self.event_id.clone(),
            current_page_index: self.page_index,
            trigger: self.trigger,
            execution_mode: self.mode,
            is_running: !self.cancel.is_cancelled(),
            command_index: self.interpreter.current_index(),
            is_paused: self.interpreter.is_paused(),
            started_at: self.started_at,
        }
    }

    fn release_input(&self) {
        let guard = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(guard);
    }

    fn cancel(&self) {
        self.cancel.cancel();
        self.interpreter.stop();
    }
}

#[derive(Default)]
struct Inner {
    events: HashMap<EventId, Arc<EventDefinition>>,
    cutscenes: HashMap<CutsceneId, Arc<CutsceneDescriptor>>,
    running: HashMap<EventId, Arc<RunningEvent>>,
    autorun_active: Option<EventId>,
    autorun_queue: VecDeque<EventId>,
    playing: HashMap<CutsceneId, Arc<CutsceneController>>,
}

/// Removes a directly played cutscene from the playing table.
struct PlayingGuard<'a> {
    runtime: &'a EventRuntime,
    controller: Arc<CutsceneController>,
}

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        let id = &self.controller.descriptor().id;
        {
            let mut inner = self.runtime.inner();
            if inner
                .playing
                .get(id)
                .is_some_and(|current| Arc::ptr_eq(current, &self.controller))
            {
                inner.playing.remove(id);
            }
        }
        self.runtime.live.send_modify(|live| *live = live.saturating_sub(1));
    }
}

/// Owns content, world state and every running script.
pub struct EventRuntime {
    config: RuntimeConfig,
    state: Arc<GameState>,
    registry: Arc<CommandRegistry>,
    clock: Arc<dyn Clock>,
    timeline: Arc<dyn TimelinePlayer>,
    actors: Arc<dyn ActorSpawner>,
    input_lock: Arc<InputLock>,
    cutscenes: Arc<CutsceneRegistry>,
    host: Arc<dyn CommandHost>,
    inner: Mutex<Inner>,
    live: watch::Sender<usize>,
}

impl fmt::Debug for EventRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRuntime")
            .field("config", &self.config)
            .field("live", &*self.live.borrow())
            .finish_non_exhaustive()
    }
}

impl EventRuntime {
    /// Builds a runtime with no content loaded.
    #[must_use]
    pub fn new(config: RuntimeConfig, services: RuntimeServices) -> Arc<Self> {
        Arc::new_cyclic(|runtime: &Weak<Self>| {
            let input_lock = InputLock::new();
            let cutscenes = CutsceneRegistry::new(services.camera, Arc::clone(&input_lock));
            let (live, _) = watch::channel(0);
            Self {
                config,
                state: services.state,
                registry: Arc::new(services.registry),
                clock: services.clock,
                timeline: services.timeline,
                actors: services.actors,
                input_lock,
                cutscenes,
                host: Arc::new(RuntimeHost {
                    runtime: runtime.clone(),
                }),
                inner: Mutex::new(Inner::default()),
                live,
            }
        })
    }

    /// Runtime settings.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The world state scripts read and write.
    #[must_use]
    pub fn state(&self) -> &Arc<GameState> {
        &self.state
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Content ---

    /// Adds or replaces event definitions. Returns how many were loaded.
    pub fn load_events(&self, events: impl IntoIterator<Item = EventDefinition>) -> usize {
        let mut inner = self.inner();
        let mut count = 0;
        for event in events {
            inner.events.insert(event.id.clone(), Arc::new(event));
            count += 1;
        }
        info!(count, "events loaded");
        count
    }

    /// Adds or replaces cutscene descriptors. Returns how many were loaded.
    pub fn load_cutscenes(
        &self,
        cutscenes: impl IntoIterator<Item = CutsceneDescriptor>,
    ) -> usize {
        let mut inner = self.inner();
        let mut count = 0;
        for cutscene in cutscenes {
            inner.cutscenes.insert(cutscene.id.clone(), Arc::new(cutscene));
            count += 1;
        }
        info!(count, "cutscenes loaded");
        count
    }

    /// Validates a bundle and loads everything in it.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Domain` with a validation error if the bundle
    /// is malformed; nothing is loaded in that case.
    pub fn load_bundle(&self, bundle: ScriptBundle) -> Result<(), RuntimeError> {
        validate(&bundle)?;
        self.load_events(bundle.events);
        self.load_cutscenes(bundle.cutscenes);
        Ok(())
    }

    /// Ids of every loaded event, sorted.
    #[must_use]
    pub fn event_ids(&self) -> Vec<EventId> {
        let mut ids: Vec<EventId> = self.inner().events.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids of every loaded cutscene, sorted.
    #[must_use]
    pub fn cutscene_ids(&self) -> Vec<CutsceneId> {
        let mut ids: Vec<CutsceneId> = self.inner().cutscenes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns `true` if a cutscene with this id is loaded.
    #[must_use]
    pub fn has_cutscene(&self, id: &CutsceneId) -> bool {
        self.inner().cutscenes.contains_key(id)
    }

    // --- Events ---

    /// Starts the event's highest active page.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::EventNotFound` for an unknown id and
    /// `RuntimeError::NoActivePage` when no page's conditions hold.
    #[instrument(skip(self, id), fields(event_id = %id))]
    pub fn start_event(self: &Arc<Self>, id: &EventId) -> Result<StartOutcome, RuntimeError> {
        let mut inner = self.inner();
        self.try_start(&mut inner, id)
    }

    fn try_start(
        self: &Arc<Self>,
        inner: &mut Inner,
        id: &EventId,
    ) -> Result<StartOutcome, RuntimeError> {
        let definition = inner
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::EventNotFound(id.clone()))?;

        if inner.running.contains_key(id) {
            warn!(event_id = %id, "event already running; start ignored");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let page_index = select_page(&definition, &self.state)
            .ok_or_else(|| RuntimeError::NoActivePage(id.clone()))?;

        match definition.pages[page_index].trigger {
            Trigger::Autorun if inner.autorun_active.is_some() => {
                if !inner.autorun_queue.contains(id) {
                    inner.autorun_queue.push_back(id.clone());
                }
                info!(
                    event_id = %id,
                    queued = inner.autorun_queue.len(),
                    "autorun busy; event queued"
                );
                return Ok(StartOutcome::Queued);
            }
            Trigger::Parallel => {
                let parallel = inner
                    .running
                    .values()
                    .filter(|run| run.trigger == Trigger::Parallel)
                    .count();
                if parallel >= self.config.max_parallel {
                    warn!(
                        event_id = %id,
                        max_parallel = self.config.max_parallel,
                        "parallel cap reached; start rejected"
                    );
                    return Ok(StartOutcome::Rejected);
                }
            }
            _ => {}
        }

        Ok(StartOutcome::Started(self.launch(
            inner,
            &definition,
            page_index,
        )))
    }

    fn launch(
        self: &Arc<Self>,
        inner: &mut Inner,
        definition: &EventDefinition,
        page_index: usize,
    ) -> Uuid {
        let page = &definition.pages[page_index];
        let event_id = definition.id.clone();
        let run_id = Uuid::now_v7();
        let mode = select_mode(ExecutionMode::Auto, &page.commands, |tag| {
            self.registry.is_cutscene_only(tag)
        });

        let input = if page.trigger == Trigger::Autorun {
            inner.autorun_active = Some(event_id.clone());
            Some(self.input_lock.acquire(format!("autorun:{event_id}")))
        } else {
            None
        };

        let context = ExecutionContext::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.state),
            Arc::clone(&self.host),
        )
        .for_event(event_id.clone());
        let run = Arc::new(RunningEvent {
            run_id,
            event_id: event_id.clone(),
            page_index,
            trigger: page.trigger,
            mode,
            started_at: self.clock.now(),
            interpreter: Interpreter::new(context),
            cancel: CancellationToken::new(),
            input: Mutex::new(input),
        });
        inner.running.insert(event_id.clone(), Arc::clone(&run));
        self.live.send_modify(|live| *live += 1);
        info!(
            event_id = %event_id,
            %run_id,
            page = page_index,
            trigger = ?page.trigger,
            %mode,
            "event started"
        );

        let commands: Arc<[Command]> = page.commands.clone().into();
        let runtime = Arc::clone(self);
        let span = info_span!(parent: None, "event_run", event_id = %event_id, %run_id);
        tokio::spawn(
            async move {
                let outcome = tokio::select! {
                    biased;
                    () = run.cancel.cancelled() => RunOutcome::Cancelled,
                    outcome = run.interpreter.start_interpretation(commands, None) => outcome,
                };
                runtime.finish(&run, outcome);
            }
            .instrument(span),
        );
        run_id
    }

    fn finish(self: &Arc<Self>, run: &RunningEvent, outcome: RunOutcome) {
        {
            let mut inner = self.inner();
            if inner
                .running
                .get(&run.event_id)
                .is_some_and(|current| current.run_id == run.run_id)
            {
                inner.running.remove(&run.event_id);
            }
            if inner.autorun_active.as_ref() == Some(&run.event_id) {
                inner.autorun_active = None;
                self.drain_autorun_queue(&mut inner);
            }
        }
        // The next autorun already holds its own guard, so input stays locked.
        run.release_input();
        info!(?outcome, "event ended");
        self.live.send_modify(|live| *live = live.saturating_sub(1));
    }

    fn drain_autorun_queue(self: &Arc<Self>, inner: &mut Inner) {
        while inner.autorun_active.is_none() {
            let Some(next) = inner.autorun_queue.pop_front() else {
                break;
            };
            match self.try_start(inner, &next) {
                Ok(outcome) => debug!(event_id = %next, ?outcome, "queued autorun dequeued"),
                Err(error) => warn!(event_id = %next, %error, "queued autorun could not start"),
            }
        }
    }

    /// Cancels the event's run, or drops it from the autorun queue. Returns
    /// `false` if the event was neither running nor queued.
    pub fn stop_event(&self, id: &EventId) -> bool {
        let (run, was_queued) = {
            let mut inner = self.inner();
            let before = inner.autorun_queue.len();
            inner.autorun_queue.retain(|queued| queued != id);
            let was_queued = inner.autorun_queue.len() != before;
            (inner.running.get(id).cloned(), was_queued)
        };
        match run {
            Some(run) => {
                info!(event_id = %id, run_id = %run.run_id, "event stop requested");
                run.cancel();
                true
            }
            None => was_queued,
        }
    }

    /// Suspends the event before its next command. Returns `false` if it is
    /// not running.
    pub fn pause_event(&self, id: &EventId) -> bool {
        let Some(run) = self.inner().running.get(id).cloned() else {
            return false;
        };
        run.interpreter.pause();
        true
    }

    /// Resumes a paused event. Returns `false` if it is not running.
    pub fn resume_event(&self, id: &EventId) -> bool {
        let Some(run) = self.inner().running.get(id).cloned() else {
            return false;
        };
        run.interpreter.resume();
        true
    }

    /// Returns `true` while the event has a run in progress.
    #[must_use]
    pub fn is_running(&self, id: &EventId) -> bool {
        self.inner().running.contains_key(id)
    }

    /// Every run in progress, oldest first.
    #[must_use]
    pub fn active_instances(&self) -> Vec<ActiveEventInstance> {
        let mut views: Vec<ActiveEventInstance> =
            self.inner().running.values().map(|run| run.view()).collect();
        views.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        views
    }

    /// Autorun events waiting their turn, in start order.
    #[must_use]
    pub fn queued_autoruns(&self) -> Vec<EventId> {
        self.inner().autorun_queue.iter().cloned().collect()
    }

    /// Per-command timings of the event's current run.
    #[must_use]
    pub fn event_timings(&self, id: &EventId) -> Option<BTreeMap<usize, Duration>> {
        let run = self.inner().running.get(id).cloned();
        run.map(|run| run.interpreter.execution_timings())
    }

    // --- Cutscenes ---

    fn cutscene_services(&self, enclosing: &[CutsceneId]) -> CutsceneServices {
        let mut execution = ExecutionContext::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.state),
            Arc::clone(&self.host),
        );
        execution.cutscenes = enclosing.to_vec();
        CutsceneServices {
            timeline: Arc::clone(&self.timeline),
            actors: Arc::clone(&self.actors),
            registry: Arc::clone(&self.cutscenes),
            execution,
            frame_interval: self.config.frame_interval,
        }
    }

    /// Plays a loaded cutscene to the end.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::CutsceneNotFound` for an unknown id.
    pub async fn play_cutscene(&self, id: &CutsceneId) -> Result<CutsceneOutcome, RuntimeError> {
        self.play_within(id, &[]).await
    }

    #[instrument(skip(self, id, enclosing), fields(cutscene_id = %id, depth = enclosing.len()))]
    async fn play_within(
        &self,
        id: &CutsceneId,
        enclosing: &[CutsceneId],
    ) -> Result<CutsceneOutcome, RuntimeError> {
        let controller = {
            let mut inner = self.inner();
            let descriptor = inner
                .cutscenes
                .get(id)
                .cloned()
                .ok_or_else(|| RuntimeError::CutsceneNotFound(id.clone()))?;
            if inner.playing.contains_key(id) {
                warn!("cutscene already playing; play ignored");
                return Ok(CutsceneOutcome::AlreadyActive);
            }
            let controller = Arc::new(CutsceneController::new(
                descriptor,
                self.cutscene_services(enclosing),
            ));
            inner.playing.insert(id.clone(), Arc::clone(&controller));
            self.live.send_modify(|live| *live += 1);
            controller
        };
        let _playing = PlayingGuard {
            runtime: self,
            controller: Arc::clone(&controller),
        };
        Ok(controller.play().await)
    }

    /// Stops a playing cutscene. Returns `false` if it is not playing.
    pub fn stop_cutscene(&self, id: &CutsceneId) -> bool {
        let Some(controller) = self.inner().playing.get(id).cloned() else {
            return false;
        };
        controller.stop();
        true
    }

    /// Returns `true` while the cutscene is active.
    #[must_use]
    pub fn is_cutscene_running(&self, id: &CutsceneId) -> bool {
        self.cutscenes.is_active(id)
    }

    /// Returns `true` while any cutscene is active.
    #[must_use]
    pub fn is_any_cutscene_running(&self) -> bool {
        self.cutscenes.is_any_active()
    }

    /// Every cutscene currently playing, sorted by id.
    #[must_use]
    pub fn playing_cutscenes(&self) -> Vec<CutsceneStatus> {
        let mut statuses: Vec<CutsceneStatus> = self
            .inner()
            .playing
            .values()
            .map(|controller| CutsceneStatus {
                id: controller.descriptor().id.clone(),
                mode: controller.mode(),
                phase: controller.phase(),
            })
            .collect();
        statuses.sort_by(|a, b| a.id.cmp(&b.id));
        statuses
    }

    /// Per-command timings of a playing cutscene's command track.
    #[must_use]
    pub fn cutscene_timings(&self, id: &CutsceneId) -> Option<BTreeMap<usize, Duration>> {
        let controller = self.inner().playing.get(id).cloned();
        controller.map(|controller| controller.execution_timings())
    }

    /// Returns `true` while an autorun event or a cutscene holds player
    /// input.
    #[must_use]
    pub fn is_input_locked(&self) -> bool {
        self.input_lock.is_locked()
    }

    // --- Lifecycle ---

    /// Resolves once no event run and no cutscene is in progress.
    pub async fn wait_until_idle(&self) {
        let mut live = self.live.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = live.wait_for(|count| *count == 0).await;
    }

    /// Captures the world state into `slot`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Domain` if the repository write fails.
    pub async fn save(
        &self,
        repo: &dyn SaveRepository,
        slot: u8,
    ) -> Result<SaveData, RuntimeError> {
        Ok(handle_save(&self.state, slot, self.clock.as_ref(), repo).await?)
    }

    /// Replaces the world state with `slot`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Domain` if the slot is empty or the read fails.
    pub async fn load(
        &self,
        repo: &dyn SaveRepository,
        slot: u8,
    ) -> Result<SaveData, RuntimeError> {
        Ok(handle_load(&self.state, slot, repo).await?)
    }

    /// Clears the autorun queue, stops every run and cutscene, and waits
    /// for them to wind down.
    pub async fn shutdown(&self) {
        let (runs, controllers) = {
            let mut inner = self.inner();
            inner.autorun_queue.clear();
            (
                inner.running.values().cloned().collect::<Vec<_>>(),
                inner.playing.values().cloned().collect::<Vec<_>>(),
            )
        };
        info!(
            events = runs.len(),
            cutscenes = controllers.len(),
            "runtime shutting down"
        );
        for run in runs {
            run.cancel();
        }
        for controller in controllers {
            controller.stop();
        }
        self.wait_until_idle().await;
        info!("runtime shut down");
    }
}

/// Routes host-level commands back into the runtime.
struct RuntimeHost {
    runtime: Weak<EventRuntime>,
}

#[async_trait]
impl CommandHost for RuntimeHost {
    async fn play_cutscene(
        &self,
        cutscene_id: &CutsceneId,
        enclosing: &[CutsceneId],
    ) -> Result<(), CommandError> {
        let runtime = self
            .runtime
            .upgrade()
            .ok_or_else(|| CommandError::Failed("runtime is gone".to_owned()))?;
        match runtime.play_within(cutscene_id, enclosing).await {
            Ok(CutsceneOutcome::Completed | CutsceneOutcome::Cancelled) => Ok(()),
            Ok(CutsceneOutcome::AlreadyActive) => Err(CommandError::Failed(format!(
                "cutscene {cutscene_id} is already playing"
            ))),
            Err(RuntimeError::CutsceneNotFound(id)) => {
                Err(CommandError::MissingTarget(format!("cutscene {id}")))
            }
            Err(error) => Err(CommandError::Failed(error.to_string())),
        }
    }

    async fn present_message(&self, speaker: Option<&str>, text: &str) -> Result<(), CommandError> {
        info!(speaker = speaker.unwrap_or_default(), text, "message shown");
        Ok(())
    }
}
