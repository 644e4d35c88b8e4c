//! Domain model for the Cutscene context.

pub mod bindings;
pub mod collaborators;
pub mod registry;
pub mod sync;
