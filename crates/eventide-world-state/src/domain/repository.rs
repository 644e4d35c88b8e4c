//! Save repository abstraction.

use async_trait::async_trait;
use eventide_core::error::DomainError;

use super::save::SaveData;

/// Repository trait for loading and storing world-state saves by slot.
#[async_trait]
pub trait SaveRepository: Send + Sync {
    /// Loads the save in `slot`, or `None` if the slot is empty.
    async fn load(&self, slot: u8) -> Result<Option<SaveData>, DomainError>;

    /// Stores `data` in `slot`, replacing any previous save.
    async fn store(&self, slot: u8, data: &SaveData) -> Result<(), DomainError>;
}
