//! Script bundles.

use std::fmt::Write as _;
use std::path::Path;

use eventide_core::cutscene::CutsceneDescriptor;
use eventide_core::error::DomainError;
use eventide_core::event::EventDefinition;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Authored events and cutscenes shipped together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptBundle {
    /// Event definitions.
    #[serde(default)]
    pub events: Vec<EventDefinition>,
    /// Cutscene descriptors.
    #[serde(default)]
    pub cutscenes: Vec<CutsceneDescriptor>,
}

/// Source encoding of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
}

impl BundleFormat {
    /// Infers the format from a file extension: `.json` is JSON, anything
    /// else is YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl ScriptBundle {
    /// Parses a bundle.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document does not decode.
    pub fn parse(source: &str, format: BundleFormat) -> Result<Self, DomainError> {
        match format {
            BundleFormat::Yaml => serde_yaml::from_str(source)
                .map_err(|e| DomainError::Validation(format!("invalid YAML bundle: {e}"))),
            BundleFormat::Json => serde_json::from_str(source)
                .map_err(|e| DomainError::Validation(format!("invalid JSON bundle: {e}"))),
        }
    }

    /// Hex SHA-256 of the bundle's canonical JSON encoding. Two bundles with
    /// the same content hash identically regardless of source format.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if serialization fails.
    pub fn content_hash(&self) -> Result<String, DomainError> {
        let canonical = serde_json::to_vec(self)
            .map_err(|e| DomainError::Infrastructure(format!("bundle serialization failed: {e}")))?;
        let digest = Sha256::digest(&canonical);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(hex, "{byte:02x}");
        }
        Ok(hex)
    }
}
