//! JSON file save repository.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use eventide_core::error::DomainError;
use tokio::fs;

use crate::domain::repository::SaveRepository;
use crate::domain::save::SaveData;

/// Stores each slot as `save_NN.json` under a directory.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place, so a
/// crash mid-write never leaves a truncated save behind.
#[derive(Debug, Clone)]
pub struct JsonFileSaveRepository {
    dir: PathBuf,
}

impl JsonFileSaveRepository {
    /// Creates a repository rooted at `dir`. The directory is created on
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `slot`.
    #[must_use]
    pub fn slot_path(&self, slot: u8) -> PathBuf {
        self.dir.join(format!("save_{slot:02}.json"))
    }
}

fn infrastructure(context: &str, path: &Path, error: impl std::fmt::Display) -> DomainError {
    DomainError::Infrastructure(format!("{context} {}: {error}", path.display()))
}

#[async_trait]
impl SaveRepository for JsonFileSaveRepository {
    async fn load(&self, slot: u8) -> Result<Option<SaveData>, DomainError> {
        let path = self.slot_path(slot);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(infrastructure("failed to read", &path, error)),
        };
        let data = serde_json::from_slice(&bytes)
            .map_err(|e| infrastructure("failed to decode", &path, e))?;
        Ok(Some(data))
    }

    async fn store(&self, slot: u8, data: &SaveData) -> Result<(), DomainError> {
        let path = self.slot_path(slot);
        let bytes = serde_json::to_vec_pretty(data)
            .map_err(|e| infrastructure("failed to encode", &path, e))?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| infrastructure("failed to create", &self.dir, e))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| infrastructure("failed to write", &tmp_path, e))?;
        if let Err(error) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(infrastructure("failed to replace", &path, error));
        }
        Ok(())
    }
}
