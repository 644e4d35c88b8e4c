//! HTTP route modules.

pub mod content;
pub mod cutscenes;
pub mod events;
pub mod health;
pub mod world_state;
