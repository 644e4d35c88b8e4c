//! Command handlers for the Content context.
//!
//! Loading a bundle means: read it, parse it, validate it, then fingerprint
//! it. A bundle that fails any step is rejected as a whole.

use std::path::Path;

use eventide_core::error::DomainError;
use tracing::info;

use crate::domain::bundle::{BundleFormat, ScriptBundle};
use crate::domain::validation::validate;

/// A parsed, validated bundle and its content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBundle {
    /// The bundle.
    pub bundle: ScriptBundle,
    /// Hex SHA-256 of the bundle's canonical JSON form.
    pub content_hash: String,
}

/// Parses and validates a bundle held in memory.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the source does not parse or the
/// bundle is structurally invalid.
pub fn handle_parse_bundle(
    source: &str,
    format: BundleFormat,
) -> Result<LoadedBundle, DomainError> {
    let bundle = ScriptBundle::parse(source, format)?;
    validate(&bundle)?;
    let content_hash = bundle.content_hash()?;

    info!(
        events = bundle.events.len(),
        cutscenes = bundle.cutscenes.len(),
        %content_hash,
        "script bundle loaded"
    );
    Ok(LoadedBundle {
        bundle,
        content_hash,
    })
}

/// Reads, parses and validates the bundle at `path`. The format follows the
/// file extension.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the file cannot be read, and
/// `DomainError::Validation` if it is not a valid bundle.
pub async fn handle_load_bundle(path: &Path) -> Result<LoadedBundle, DomainError> {
    let source = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::Infrastructure(format!("failed to read {}: {e}", path.display()))
    })?;
    handle_parse_bundle(&source, BundleFormat::from_path(path))
}
