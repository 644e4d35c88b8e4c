//! Domain model for the World State context.

pub mod events;
pub mod repository;
pub mod save;
pub mod state;
