//! Eventide — Content context.
//!
//! Loads authored script bundles (events and cutscenes) from YAML or JSON,
//! validates their structure, and fingerprints them with a content hash.

pub mod application;
pub mod domain;
