//! Domain model for the Content context.

pub mod bundle;
pub mod validation;
