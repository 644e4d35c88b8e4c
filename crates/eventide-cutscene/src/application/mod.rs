//! Application layer for the Cutscene context.

pub mod controller;
