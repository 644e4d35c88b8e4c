//! Shared test mocks and utilities for the Eventide event engine.

mod actors;
mod camera;
mod clock;
mod commands;
mod repository;
mod rng;
mod timeline;

pub use actors::RecordingActorSpawner;
pub use camera::RecordingCamera;
pub use clock::FixedClock;
pub use commands::{PROBE, ProbeLog, probe, register_probe};
pub use repository::{FailingSaveRepository, InMemorySaveRepository};
pub use rng::{MockRng, SequenceRng};
pub use timeline::ScriptedTimeline;
