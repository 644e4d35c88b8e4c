//! Event runtime scenarios: trigger policies, nested cutscenes and saves.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use eventide_core::command::{Command, CommandData, Condition, Operand, VariableOperation};
use eventide_core::cutscene::{CameraPose, CutsceneDescriptor, CutsceneId};
use eventide_core::event::{EventDefinition, EventId, Page, Trigger};
use eventide_core::mode::ExecutionMode;
use eventide_cutscene::CutsceneOutcome;
use eventide_runtime::{
    EventRuntime, RuntimeConfig, RuntimeError, RuntimeServices, StartOutcome, default_registry,
};
use eventide_test_support::{
    FixedClock, InMemorySaveRepository, ProbeLog, RecordingCamera, probe, register_probe,
};
use tokio::time::{Instant, sleep};

struct Harness {
    runtime: Arc<EventRuntime>,
    log: ProbeLog,
    camera: Arc<RecordingCamera>,
}

fn harness(config: RuntimeConfig) -> Harness {
    let log = ProbeLog::new();
    let mut registry = default_registry();
    register_probe(&mut registry, &log);
    let camera = Arc::new(RecordingCamera::at(CameraPose::default()));
    let services = RuntimeServices {
        registry,
        clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())),
        camera: camera.clone(),
        ..RuntimeServices::headless()
    };
    Harness {
        runtime: EventRuntime::new(config, services),
        log,
        camera,
    }
}

fn page(trigger: Trigger, commands: Vec<Command>) -> Page {
    Page {
        trigger,
        commands,
        ..Page::default()
    }
}

fn event(id: &str, pages: Vec<Page>) -> EventDefinition {
    EventDefinition {
        id: EventId::new(id),
        name: id.to_owned(),
        pages,
    }
}

fn cutscene(id: &str, commands: Vec<Command>) -> CutsceneDescriptor {
    CutsceneDescriptor {
        id: CutsceneId::new(id),
        name: id.to_owned(),
        timeline: None,
        commands,
        actors: Vec::new(),
        camera_setup: Some(CameraPose {
            position: [0.0, 4.0, -8.0],
            rotation: [20.0, 0.0, 0.0],
            field_of_view: 40.0,
        }),
        preferred_mode: ExecutionMode::Auto,
    }
}

fn wait(duration_ms: u64) -> Command {
    Command::new(CommandData::Wait { duration_ms })
}

fn play(cutscene_id: &str) -> Command {
    Command::new(CommandData::PlayCutscene {
        cutscene_id: cutscene_id.to_owned(),
    })
}

fn id(value: &str) -> EventId {
    EventId::new(value)
}

#[tokio::test(start_paused = true)]
async fn test_autorun_events_run_one_at_a_time_in_fifo_order() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events(["a", "b", "c"].map(|name| {
        event(
            name,
            vec![page(
                Trigger::Autorun,
                vec![probe(&format!("{name}:start")), wait(100), probe(&format!("{name}:end"))],
            )],
        )
    }));

    // Act
    let a = h.runtime.start_event(&id("a")).unwrap();
    let b = h.runtime.start_event(&id("b")).unwrap();
    let c = h.runtime.start_event(&id("c")).unwrap();
    let queued = h.runtime.queued_autoruns();
    let locked_while_running = h.runtime.is_input_locked();
    h.runtime.wait_until_idle().await;

    // Assert
    assert!(matches!(a, StartOutcome::Started(_)));
    assert_eq!(b, StartOutcome::Queued);
    assert_eq!(c, StartOutcome::Queued);
    assert_eq!(queued, vec![id("b"), id("c")]);
    assert!(locked_while_running);
    assert_eq!(
        h.log.entries(),
        vec!["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
    );
    assert!(!h.runtime.is_input_locked());
}

#[tokio::test(start_paused = true)]
async fn test_input_stays_locked_between_queued_autoruns() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events([
        event("first", vec![page(Trigger::Autorun, vec![wait(100)])]),
        event("second", vec![page(Trigger::Autorun, vec![wait(100)])]),
    ]);
    h.runtime.start_event(&id("first")).unwrap();
    h.runtime.start_event(&id("second")).unwrap();

    // Act
    sleep(Duration::from_millis(150)).await;

    // Assert
    assert!(!h.runtime.is_running(&id("first")));
    assert!(h.runtime.is_running(&id("second")));
    assert!(h.runtime.is_input_locked());
    h.runtime.wait_until_idle().await;
    assert!(!h.runtime.is_input_locked());
}

#[tokio::test(start_paused = true)]
async fn test_parallel_events_are_capped() {
    // Arrange
    let config = RuntimeConfig {
        max_parallel: 2,
        ..RuntimeConfig::default()
    };
    let h = harness(config);
    h.runtime.load_events(
        ["rain", "birds", "river"].map(|name| event(name, vec![page(Trigger::Parallel, vec![wait(100)])])),
    );

    // Act
    let rain = h.runtime.start_event(&id("rain")).unwrap();
    let birds = h.runtime.start_event(&id("birds")).unwrap();
    let before_rejection = h.runtime.active_instances();
    let river = h.runtime.start_event(&id("river")).unwrap();
    let after_rejection = h.runtime.active_instances();

    // Assert
    assert!(matches!(rain, StartOutcome::Started(_)));
    assert!(matches!(birds, StartOutcome::Started(_)));
    assert_eq!(river, StartOutcome::Rejected);
    assert_eq!(after_rejection, before_rejection);
    assert_eq!(after_rejection.len(), 2);
    assert!(!h.runtime.is_running(&id("river")));
    assert!(h.runtime.queued_autoruns().is_empty());
    assert!(!h.runtime.is_input_locked());
    h.runtime.wait_until_idle().await;
    let retry = h.runtime.start_event(&id("river")).unwrap();
    assert!(matches!(retry, StartOutcome::Started(_)));
    h.runtime.wait_until_idle().await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_selects_later_page_and_survives_save_load() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    let repo = InMemorySaveRepository::new();
    h.runtime.load_events([event(
        "chest",
        vec![
            page(
                Trigger::ActionButton,
                vec![
                    Command::new(CommandData::ControlSwitch {
                        name: "chest_opened".to_owned(),
                        value: true,
                    }),
                    Command::new(CommandData::ControlVariable {
                        name: "gold".to_owned(),
                        operation: VariableOperation::Add,
                        operand: Operand::Constant(50),
                    }),
                    probe("looted"),
                ],
            ),
            Page {
                conditions: vec![Condition::Switch {
                    name: "chest_opened".to_owned(),
                    value: true,
                }],
                ..page(Trigger::ActionButton, vec![probe("empty")])
            },
        ],
    )]);

    // Act
    h.runtime.start_event(&id("chest")).unwrap();
    h.runtime.wait_until_idle().await;
    let saved = h.runtime.save(&repo, 1).await.unwrap();
    h.runtime.state().set_switch("chest_opened", false);
    h.runtime.state().set_variable("gold", 0);
    h.runtime.load(&repo, 1).await.unwrap();
    h.runtime.start_event(&id("chest")).unwrap();
    h.runtime.wait_until_idle().await;

    // Assert
    assert_eq!(saved.saved_at, Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
    assert_eq!(h.runtime.state().variable("gold"), 50);
    assert_eq!(h.log.entries(), vec!["looted", "empty"]);
}

#[tokio::test]
async fn test_load_of_empty_slot_is_an_error() {
    let h = harness(RuntimeConfig::default());
    let result = h.runtime.load(&InMemorySaveRepository::new(), 3).await;
    assert!(matches!(result, Err(RuntimeError::Domain(_))));
}

#[tokio::test]
async fn test_event_without_active_page_does_not_start() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events([event(
        "door",
        vec![Page {
            conditions: vec![Condition::Switch {
                name: "has_key".to_owned(),
                value: true,
            }],
            ..page(Trigger::ActionButton, vec![probe("opened")])
        }],
    )]);

    // Act
    let result = h.runtime.start_event(&id("door"));

    // Assert
    assert!(matches!(result, Err(RuntimeError::NoActivePage(event)) if event == id("door")));
    assert!(h.runtime.active_instances().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_event_plays_nested_cutscene_to_completion() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_cutscenes([cutscene("awaken", vec![probe("rumble"), wait(200)])]);
    h.runtime.load_events([event(
        "statue",
        vec![page(
            Trigger::ActionButton,
            vec![probe("touch"), play("awaken"), probe("after")],
        )],
    )]);

    // Act
    h.runtime.start_event(&id("statue")).unwrap();
    sleep(Duration::from_millis(50)).await;
    let instances = h.runtime.active_instances();
    let playing = h.runtime.playing_cutscenes();
    let locked_during_cutscene = h.runtime.is_input_locked();
    h.runtime.wait_until_idle().await;

    // Assert
    assert_eq!(instances[0].execution_mode, ExecutionMode::Hybrid);
    assert_eq!(playing.len(), 1);
    assert_eq!(playing[0].id, CutsceneId::new("awaken"));
    assert_eq!(playing[0].mode, ExecutionMode::Command);
    assert!(locked_during_cutscene);
    assert_eq!(h.log.entries(), vec!["touch", "rumble", "after"]);
    assert_eq!(h.camera.restored(), vec![CameraPose::default()]);
    assert!(!h.runtime.is_any_cutscene_running());
    assert!(!h.runtime.is_input_locked());
}

#[tokio::test(start_paused = true)]
async fn test_missing_nested_cutscene_is_skipped() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events([event(
        "sign",
        vec![page(Trigger::ActionButton, vec![play("nowhere"), probe("after")])],
    )]);

    // Act
    h.runtime.start_event(&id("sign")).unwrap();
    h.runtime.wait_until_idle().await;

    // Assert
    assert_eq!(h.log.entries(), vec!["after"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_event_tears_down_nested_cutscene() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_cutscenes([cutscene("vigil", vec![wait(10_000), probe("dawn")])]);
    h.runtime.load_events([event(
        "altar",
        vec![page(Trigger::Autorun, vec![play("vigil"), probe("after")])],
    )]);
    let started = Instant::now();
    h.runtime.start_event(&id("altar")).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(h.runtime.is_cutscene_running(&CutsceneId::new("vigil")));

    // Act
    let stopped = h.runtime.stop_event(&id("altar"));
    h.runtime.wait_until_idle().await;

    // Assert
    assert!(stopped);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(h.log.entries().is_empty());
    assert!(!h.runtime.is_any_cutscene_running());
    assert!(h.runtime.playing_cutscenes().is_empty());
    assert_eq!(h.camera.restored().len(), 1);
    assert!(!h.runtime.is_input_locked());
}

#[tokio::test(start_paused = true)]
async fn test_stop_event_removes_queued_autorun() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events([
        event("intro", vec![page(Trigger::Autorun, vec![wait(100), probe("intro")])]),
        event("tutorial", vec![page(Trigger::Autorun, vec![probe("tutorial")])]),
    ]);
    h.runtime.start_event(&id("intro")).unwrap();
    h.runtime.start_event(&id("tutorial")).unwrap();

    // Act
    let removed = h.runtime.stop_event(&id("tutorial"));
    h.runtime.wait_until_idle().await;

    // Assert
    assert!(removed);
    assert_eq!(h.log.entries(), vec!["intro"]);
    assert!(!h.runtime.stop_event(&id("tutorial")));
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_event() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events([event(
        "guard",
        vec![page(Trigger::ActionButton, vec![wait(100), probe("patrol")])],
    )]);
    h.runtime.start_event(&id("guard")).unwrap();

    // Act
    assert!(h.runtime.pause_event(&id("guard")));
    sleep(Duration::from_millis(500)).await;
    let paused_view = h.runtime.active_instances();
    let log_while_paused = h.log.entries();
    assert!(h.runtime.resume_event(&id("guard")));
    h.runtime.wait_until_idle().await;

    // Assert
    assert!(paused_view[0].is_paused);
    assert!(log_while_paused.is_empty());
    assert_eq!(h.log.entries(), vec!["patrol"]);
    assert!(!h.runtime.pause_event(&id("guard")));
}

#[tokio::test(start_paused = true)]
async fn test_same_cutscene_cannot_play_twice_at_once() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_cutscenes([cutscene("parade", vec![wait(300)])]);
    let parade = CutsceneId::new("parade");

    // Act
    let (first, second) = tokio::join!(h.runtime.play_cutscene(&parade), async {
        sleep(Duration::from_millis(10)).await;
        h.runtime.play_cutscene(&parade).await
    });

    // Assert
    assert_eq!(first.unwrap(), CutsceneOutcome::Completed);
    assert_eq!(second.unwrap(), CutsceneOutcome::AlreadyActive);
}

#[tokio::test]
async fn test_play_unknown_cutscene_is_not_found() {
    let h = harness(RuntimeConfig::default());
    let result = h.runtime.play_cutscene(&CutsceneId::new("credits")).await;
    assert!(matches!(result, Err(RuntimeError::CutsceneNotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_cutscenes([cutscene("storm", vec![wait(60_000)])]);
    h.runtime.load_events([
        event("weather", vec![page(Trigger::Parallel, vec![wait(60_000)])]),
        event("opening", vec![page(Trigger::Autorun, vec![play("storm")])]),
        event("after_opening", vec![page(Trigger::Autorun, vec![probe("never")])]),
    ]);
    h.runtime.start_event(&id("weather")).unwrap();
    h.runtime.start_event(&id("opening")).unwrap();
    h.runtime.start_event(&id("after_opening")).unwrap();
    sleep(Duration::from_millis(10)).await;

    // Act
    let started = Instant::now();
    h.runtime.shutdown().await;

    // Assert
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(h.runtime.active_instances().is_empty());
    assert!(h.runtime.queued_autoruns().is_empty());
    assert!(!h.runtime.is_any_cutscene_running());
    assert!(!h.runtime.is_input_locked());
    assert!(h.log.entries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stopping_active_autorun_drains_queue_in_order() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    h.runtime.load_events([
        event("opening", vec![page(Trigger::Autorun, vec![wait(10_000), probe("opening")])]),
        event("briefing", vec![page(Trigger::Autorun, vec![wait(100), probe("briefing")])]),
        event("tutorial", vec![page(Trigger::Autorun, vec![probe("tutorial")])]),
    ]);
    h.runtime.start_event(&id("opening")).unwrap();
    h.runtime.start_event(&id("briefing")).unwrap();
    h.runtime.start_event(&id("tutorial")).unwrap();
    sleep(Duration::from_millis(10)).await;

    // Act
    let stopped = h.runtime.stop_event(&id("opening"));
    sleep(Duration::from_millis(50)).await;
    let running_after_stop = h.runtime.is_running(&id("briefing"));
    let queued_after_stop = h.runtime.queued_autoruns();
    let locked_after_stop = h.runtime.is_input_locked();
    h.runtime.wait_until_idle().await;

    // Assert
    assert!(stopped);
    assert!(running_after_stop);
    assert_eq!(queued_after_stop, vec![id("tutorial")]);
    assert!(locked_after_stop);
    assert_eq!(h.log.entries(), vec!["briefing", "tutorial"]);
    assert!(!h.runtime.is_input_locked());
}

#[tokio::test(start_paused = true)]
async fn test_command_loop_watching_a_switch_lets_other_events_run() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    let gate_open = Condition::Switch {
        name: "gate_open".to_owned(),
        value: true,
    };
    h.runtime.load_events([
        event(
            "watcher",
            vec![page(
                Trigger::Parallel,
                vec![
                    Command::new(CommandData::Loop),
                    Command::new(CommandData::ConditionalBranch {
                        condition: gate_open,
                    }),
                    Command::new(CommandData::BreakLoop),
                    Command::new(CommandData::EndBranch),
                    Command::new(CommandData::Comment {
                        text: "still closed".to_owned(),
                    }),
                    Command::new(CommandData::EndLoop),
                    probe("watcher:done"),
                ],
            )],
        ),
        event(
            "lever",
            vec![page(
                Trigger::Parallel,
                vec![Command::new(CommandData::ControlSwitch {
                    name: "gate_open".to_owned(),
                    value: true,
                })],
            )],
        ),
    ]);

    // Act
    h.runtime.start_event(&id("watcher")).unwrap();
    h.runtime.start_event(&id("lever")).unwrap();
    h.runtime.wait_until_idle().await;

    // Assert
    assert!(h.runtime.state().switch("gate_open"));
    assert_eq!(h.log.entries(), vec!["watcher:done"]);
}

#[tokio::test(start_paused = true)]
async fn test_hybrid_cutscene_nested_in_cutscene_plays_its_own_nested_cutscene() {
    // Arrange
    let h = harness(RuntimeConfig::default());
    let mut inner = cutscene(
        "inner",
        vec![probe("inner:start"), play("leaf"), probe("inner:end")],
    );
    inner.timeline = Some("inner_tl".to_owned());
    h.runtime.load_cutscenes([
        cutscene("outer", vec![play("inner")]),
        inner,
        cutscene("leaf", vec![probe("leaf")]),
    ]);

    // Act
    let outcome = tokio::time::timeout(
        Duration::from_secs(3_600),
        h.runtime.play_cutscene(&CutsceneId::new("outer")),
    )
    .await;

    // Assert
    assert!(matches!(outcome, Ok(Ok(CutsceneOutcome::Completed))));
    assert_eq!(h.log.entries(), vec!["inner:start", "leaf", "inner:end"]);
    assert!(!h.runtime.is_any_cutscene_running());
    assert!(!h.runtime.is_input_locked());
}
