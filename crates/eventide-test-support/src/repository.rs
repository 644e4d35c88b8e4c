//! Test repositories — mock `SaveRepository` implementations for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use eventide_core::error::DomainError;
use eventide_world_state::domain::repository::SaveRepository;
use eventide_world_state::domain::save::SaveData;

/// A save repository that keeps every slot in memory and records the order
/// of `store` calls.
#[derive(Debug, Default)]
pub struct InMemorySaveRepository {
    slots: Mutex<BTreeMap<u8, SaveData>>,
    stored: Mutex<Vec<u8>>,
}

impl InMemorySaveRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the save in `slot`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn slot(&self, slot: u8) -> Option<SaveData> {
        self.slots.lock().unwrap().get(&slot).cloned()
    }

    /// Returns every slot written, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored_slots(&self) -> Vec<u8> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl SaveRepository for InMemorySaveRepository {
    async fn load(&self, slot: u8) -> Result<Option<SaveData>, DomainError> {
        Ok(self.slots.lock().unwrap().get(&slot).cloned())
    }

    async fn store(&self, slot: u8, data: &SaveData) -> Result<(), DomainError> {
        self.slots.lock().unwrap().insert(slot, data.clone());
        self.stored.lock().unwrap().push(slot);
        Ok(())
    }
}

/// A save repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingSaveRepository;

#[async_trait]
impl SaveRepository for FailingSaveRepository {
    async fn load(&self, _slot: u8) -> Result<Option<SaveData>, DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }

    async fn store(&self, _slot: u8, _data: &SaveData) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }
}
