//! Eventide Core — shared script model and abstractions.
//!
//! This crate defines the authored data model (commands, pages, events,
//! cutscenes), the execution mode selector, and the small runtime
//! abstractions every other crate depends on. It contains no scheduling
//! code.

pub mod clock;
pub mod command;
pub mod cutscene;
pub mod error;
pub mod event;
pub mod flow;
pub mod input_lock;
pub mod mode;
pub mod rng;
