//! Application services for the World State context.

pub mod command_handlers;
pub mod file_repository;
pub mod query_handlers;
