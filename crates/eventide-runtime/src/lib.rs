//! Eventide — Trigger & Execution Manager.
//!
//! `EventRuntime` is the single context object a game constructs at startup.
//! It owns authored content, the world state and the input lock, starts
//! events under their per-trigger concurrency policy, plays cutscenes, and
//! exposes the query surface the rest of the game (and the inspector API)
//! reads.

pub mod builtins;
pub mod config;
pub mod error;
pub mod headless;
pub mod pages;
pub mod runtime;

pub use builtins::default_registry;
pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use runtime::{CutsceneStatus, EventRuntime, RuntimeServices, StartOutcome};
