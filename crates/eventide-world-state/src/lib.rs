//! Eventide — World State context.
//!
//! Owns the global named state scripts read and write: boolean switches,
//! integer variables, and per-event self-switches. Publishes change
//! notifications and persists the tables as save data.

pub mod application;
pub mod domain;
