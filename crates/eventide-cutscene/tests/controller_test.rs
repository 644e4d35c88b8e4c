//! Cutscene controller scenarios against the shared test doubles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eventide_core::command::{Command, CommandData};
use eventide_core::cutscene::{ActorReference, CameraPose, CutsceneDescriptor, CutsceneId};
use eventide_core::input_lock::InputLock;
use eventide_core::mode::ExecutionMode;
use eventide_cutscene::{
    CutsceneController, CutsceneOutcome, CutscenePhase, CutsceneRegistry, CutsceneServices,
};
use eventide_interpreter::{
    CommandContext, CommandError, CommandHost, CommandRegistry, ExecutionContext, NullHost,
    RunnableCommand,
};
use eventide_test_support::{
    ProbeLog, RecordingActorSpawner, RecordingCamera, ScriptedTimeline, probe, register_probe,
};
use eventide_world_state::domain::state::GameState;
use tokio::time::Instant;

const FRAME: Duration = Duration::from_millis(10);

struct Harness {
    timeline: Arc<ScriptedTimeline>,
    actors: Arc<RecordingActorSpawner>,
    camera: Arc<RecordingCamera>,
    input: Arc<InputLock>,
    registry: Arc<CutsceneRegistry>,
    log: ProbeLog,
    services: CutsceneServices,
}

fn harness(timeline: ScriptedTimeline, actors: RecordingActorSpawner) -> Harness {
    let timeline = Arc::new(timeline);
    let actors = Arc::new(actors);
    let camera = Arc::new(RecordingCamera::at(pose(1.0)));
    let input = InputLock::new();
    let registry = CutsceneRegistry::new(camera.clone(), Arc::clone(&input));
    let log = ProbeLog::new();
    let mut commands = CommandRegistry::new();
    register_probe(&mut commands, &log);
    commands.register("play_cutscene", true, |data| match data {
        CommandData::PlayCutscene { cutscene_id } => {
            Some(Box::new(PlayNested(CutsceneId::new(cutscene_id.clone())))
                as Box<dyn RunnableCommand>)
        }
        _ => None,
    });
    let execution = ExecutionContext::new(
        Arc::new(commands),
        Arc::new(GameState::default()),
        Arc::new(NullHost),
    );
    let services = CutsceneServices {
        timeline: timeline.clone(),
        actors: actors.clone(),
        registry: Arc::clone(&registry),
        execution,
        frame_interval: FRAME,
    };
    Harness {
        timeline,
        actors,
        camera,
        input,
        registry,
        log,
        services,
    }
}

struct PlayNested(CutsceneId);

#[async_trait]
impl RunnableCommand for PlayNested {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        ctx.host.play_cutscene(&self.0, ctx.cutscenes).await
    }
}

/// Records nested plays together with the cutscenes enclosing them.
#[derive(Default)]
struct RecordingHost {
    plays: Mutex<Vec<(CutsceneId, Vec<CutsceneId>)>>,
}

impl RecordingHost {
    fn plays(&self) -> Vec<(CutsceneId, Vec<CutsceneId>)> {
        self.plays.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandHost for RecordingHost {
    async fn play_cutscene(
        &self,
        cutscene_id: &CutsceneId,
        enclosing: &[CutsceneId],
    ) -> Result<(), CommandError> {
        self.plays
            .lock()
            .unwrap()
            .push((cutscene_id.clone(), enclosing.to_vec()));
        Ok(())
    }

    async fn present_message(&self, _speaker: Option<&str>, _text: &str) -> Result<(), CommandError> {
        Ok(())
    }
}

fn play(cutscene_id: &str) -> Command {
    Command::new(CommandData::PlayCutscene {
        cutscene_id: cutscene_id.to_owned(),
    })
}

fn pose(x: f32) -> CameraPose {
    CameraPose {
        position: [x, 2.0, -6.0],
        rotation: [10.0, 0.0, 0.0],
        field_of_view: 55.0,
    }
}

fn descriptor(id: &str, timeline: Option<&str>, commands: Vec<Command>) -> Arc<CutsceneDescriptor> {
    Arc::new(CutsceneDescriptor {
        id: CutsceneId::new(id),
        name: id.to_owned(),
        timeline: timeline.map(str::to_owned),
        commands,
        actors: Vec::new(),
        camera_setup: None,
        preferred_mode: ExecutionMode::Auto,
    })
}

fn assert_within_frame(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + FRAME,
        "expected {expected:?} (+ one frame), got {actual:?}"
    );
}

fn wait(duration_ms: u64) -> Command {
    Command::new(CommandData::Wait { duration_ms })
}

fn actor(actor_id: &str, prefab: &str) -> ActorReference {
    ActorReference {
        actor_id: actor_id.to_owned(),
        prefab: prefab.to_owned(),
        spawn_point: None,
    }
}

#[tokio::test]
async fn test_command_cutscene_runs_track_and_cleans_up() {
    // Arrange
    let h = harness(ScriptedTimeline::new(), RecordingActorSpawner::new());
    let mut authored = (*descriptor("meeting", None, vec![probe("a"), probe("b")])).clone();
    authored.actors = vec![actor("hero", "hero_prefab"), actor("elder", "elder_prefab")];
    authored.camera_setup = Some(pose(7.0));
    let controller = CutsceneController::new(Arc::new(authored), h.services.clone());

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert_eq!(controller.mode(), ExecutionMode::Command);
    assert!(!controller.is_cutscene_mode());
    assert_eq!(controller.phase(), CutscenePhase::Completed);
    assert_eq!(h.log.entries(), vec!["a", "b"]);
    assert_eq!(h.actors.spawned(), vec!["hero", "elder"]);
    assert_eq!(h.actors.despawned().len(), 2);
    assert_eq!(h.camera.applied(), vec![pose(7.0)]);
    assert_eq!(h.camera.restored(), vec![pose(1.0)]);
    assert!(!h.registry.is_any_active());
    assert!(!h.input.is_locked());
}

#[tokio::test(start_paused = true)]
async fn test_hybrid_completes_when_slower_command_track_ends() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new().with_timeline("pan", Duration::from_millis(300)),
        RecordingActorSpawner::new(),
    );
    let controller = CutsceneController::new(
        descriptor("hybrid", Some("pan"), vec![wait(500), probe("done")]),
        h.services.clone(),
    );
    let started = Instant::now();

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert_eq!(controller.mode(), ExecutionMode::Hybrid);
    assert_within_frame(started.elapsed(), Duration::from_millis(500));
    assert_eq!(h.log.entries(), vec!["done"]);
}

#[tokio::test(start_paused = true)]
async fn test_hybrid_completes_when_slower_timeline_track_ends() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new().with_timeline("pan", Duration::from_millis(800)),
        RecordingActorSpawner::new(),
    );
    let controller = CutsceneController::new(
        descriptor("hybrid", Some("pan"), vec![wait(200), probe("done")]),
        h.services.clone(),
    );
    let started = Instant::now();

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert_within_frame(started.elapsed(), Duration::from_millis(800));
    assert!(h.timeline.stopped().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeline_marker_paces_command_track() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new()
            .with_timeline("door", Duration::from_millis(400))
            .with_marker("door", "opened", Duration::from_millis(250)),
        RecordingActorSpawner::new(),
    );
    let marker = Command::new(CommandData::TimelineMarker {
        marker: "opened".to_owned(),
    });
    let controller = CutsceneController::new(
        descriptor("door_scene", Some("door"), vec![probe("before"), marker, probe("after")]),
        h.services.clone(),
    );

    // Act
    controller.play().await;

    // Assert
    let timings = controller.execution_timings();
    assert_within_frame(timings[&1], Duration::from_millis(250));
    assert_eq!(h.log.entries(), vec!["before", "after"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_terminates_both_tracks_and_cleans_up() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new().with_timeline("long", Duration::from_secs(10)),
        RecordingActorSpawner::new(),
    );
    let mut authored = (*descriptor("long_scene", Some("long"), vec![wait(5_000), probe("late")]))
        .clone();
    authored.actors = vec![actor("hero", "hero_prefab")];
    let controller = Arc::new(CutsceneController::new(Arc::new(authored), h.services.clone()));
    let playing = Arc::clone(&controller);
    let task = tokio::spawn(async move { playing.play().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.phase(), CutscenePhase::Executing);
    assert!(h.input.is_locked());

    // Act
    controller.stop();
    controller.stop();
    let outcome = task.await.unwrap();

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Cancelled);
    assert_eq!(controller.phase(), CutscenePhase::Completed);
    assert_eq!(h.timeline.stopped(), vec!["long"]);
    assert_eq!(h.actors.despawned(), vec!["hero"]);
    assert!(h.log.entries().is_empty());
    assert!(!h.registry.is_any_active());
    assert!(!h.input.is_locked());
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_cutscenes_restore_camera_after_last_ends() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new()
            .with_timeline("short", Duration::from_millis(300))
            .with_timeline("long", Duration::from_millis(600)),
        RecordingActorSpawner::new(),
    );
    let mut short = (*descriptor("short", Some("short"), Vec::new())).clone();
    short.camera_setup = Some(pose(3.0));
    let mut long = (*descriptor("long", Some("long"), Vec::new())).clone();
    long.camera_setup = Some(pose(5.0));
    let first = Arc::new(CutsceneController::new(Arc::new(short), h.services.clone()));
    let second = Arc::new(CutsceneController::new(Arc::new(long), h.services.clone()));

    // Act
    let first_task = tokio::spawn({
        let first = Arc::clone(&first);
        async move { first.play().await }
    });
    let second_task = tokio::spawn({
        let second = Arc::clone(&second);
        async move { second.play().await }
    });
    first_task.await.unwrap();
    let restored_after_first = h.camera.restored();
    let still_active = h.registry.is_any_active();
    second_task.await.unwrap();

    // Assert
    assert!(restored_after_first.is_empty());
    assert!(still_active);
    assert_eq!(h.camera.restored(), vec![pose(1.0)]);
    assert_eq!(h.camera.applied(), vec![pose(3.0), pose(5.0)]);
}

#[tokio::test]
async fn test_second_play_of_same_cutscene_is_rejected() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new().with_timeline("pan", Duration::from_secs(1)),
        RecordingActorSpawner::new(),
    );
    let _already = h.registry.activate(&CutsceneId::new("intro"), None);
    let controller =
        CutsceneController::new(descriptor("intro", Some("pan"), Vec::new()), h.services.clone());

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::AlreadyActive);
    assert_eq!(controller.phase(), CutscenePhase::Idle);
    assert!(h.timeline.played().is_empty());
}

#[tokio::test]
async fn test_actor_spawn_failure_is_skipped() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new(),
        RecordingActorSpawner::new().failing_prefab("missing_prefab"),
    );
    let mut authored = (*descriptor("crowd", None, vec![probe("line")])).clone();
    authored.actors = vec![actor("ghost", "missing_prefab"), actor("hero", "hero_prefab")];
    let controller = CutsceneController::new(Arc::new(authored), h.services.clone());

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert_eq!(h.actors.spawned(), vec!["hero"]);
    assert_eq!(h.actors.despawned(), vec!["hero"]);
    assert_eq!(h.log.entries(), vec!["line"]);
}

#[tokio::test]
async fn test_timeline_mode_without_timeline_completes_immediately() {
    // Arrange
    let h = harness(ScriptedTimeline::new(), RecordingActorSpawner::new());
    let mut authored = (*descriptor("empty", None, Vec::new())).clone();
    authored.preferred_mode = ExecutionMode::Timeline;
    let controller = CutsceneController::new(Arc::new(authored), h.services.clone());

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert!(controller.is_cutscene_mode());
    assert!(h.timeline.played().is_empty());
}

#[tokio::test]
async fn test_stop_before_play_never_starts() {
    // Arrange
    let h = harness(ScriptedTimeline::new(), RecordingActorSpawner::new());
    let controller =
        CutsceneController::new(descriptor("skipped", None, vec![probe("x")]), h.services.clone());

    // Act
    controller.stop();
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Cancelled);
    assert!(h.log.entries().is_empty());
    assert!(h.camera.applied().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hybrid_cutscene_point_waits_for_others_then_runs_command() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new().with_timeline("pan", Duration::from_millis(100)),
        RecordingActorSpawner::new(),
    );
    let host = Arc::new(RecordingHost::default());
    let mut services = h.services.clone();
    services.execution.host = host.clone();
    let other = h.registry.activate(&CutsceneId::new("storm"), None);
    let controller = Arc::new(CutsceneController::new(
        descriptor("reunion", Some("pan"), vec![probe("before"), play("flashback"), probe("after")]),
        services,
    ));
    let playing = Arc::clone(&controller);
    let task = tokio::spawn(async move { playing.play().await });
    tokio::time::sleep(Duration::from_millis(500)).await;
    let log_while_blocked = h.log.entries();
    let plays_while_blocked = host.plays();

    // Act
    drop(other);
    let outcome = task.await.unwrap();

    // Assert
    assert_eq!(log_while_blocked, vec!["before"]);
    assert!(plays_while_blocked.is_empty());
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert_eq!(
        host.plays(),
        vec![(CutsceneId::new("flashback"), vec![CutsceneId::new("reunion")])]
    );
    assert_eq!(h.log.entries(), vec!["before", "after"]);
}

#[tokio::test(start_paused = true)]
async fn test_nested_hybrid_cutscene_does_not_wait_for_enclosing_cutscene() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new().with_timeline("inner_tl", Duration::from_millis(100)),
        RecordingActorSpawner::new(),
    );
    let host = Arc::new(RecordingHost::default());
    let mut services = h.services.clone();
    services.execution.host = host.clone();
    services.execution.cutscenes = vec![CutsceneId::new("outer")];
    let _outer = h.registry.activate(&CutsceneId::new("outer"), None);
    let controller = CutsceneController::new(
        descriptor("inner", Some("inner_tl"), vec![probe("start"), play("leaf"), probe("end")]),
        services,
    );

    // Act
    let outcome = tokio::time::timeout(Duration::from_secs(60), controller.play()).await;

    // Assert
    assert_eq!(outcome, Ok(CutsceneOutcome::Completed));
    assert_eq!(
        host.plays(),
        vec![(
            CutsceneId::new("leaf"),
            vec![CutsceneId::new("outer"), CutsceneId::new("inner")]
        )]
    );
    assert_eq!(h.log.entries(), vec!["start", "end"]);
    assert!(h.registry.is_active(&CutsceneId::new("outer")));
}

#[tokio::test(start_paused = true)]
async fn test_leading_marker_waits_for_timeline_that_loads_slowly() {
    // Arrange
    let h = harness(
        ScriptedTimeline::new()
            .with_load_delay(Duration::from_millis(100))
            .with_timeline("door", Duration::from_millis(400))
            .with_marker("door", "opened", Duration::from_millis(250)),
        RecordingActorSpawner::new(),
    );
    let marker = Command::new(CommandData::TimelineMarker {
        marker: "opened".to_owned(),
    });
    let controller = CutsceneController::new(
        descriptor("slow_door", Some("door"), vec![marker, probe("after")]),
        h.services.clone(),
    );
    let started = Instant::now();

    // Act
    let outcome = controller.play().await;

    // Assert
    assert_eq!(outcome, CutsceneOutcome::Completed);
    assert_within_frame(controller.execution_timings()[&0], Duration::from_millis(250));
    assert_within_frame(started.elapsed(), Duration::from_millis(500));
    assert_eq!(h.log.entries(), vec!["after"]);
}
