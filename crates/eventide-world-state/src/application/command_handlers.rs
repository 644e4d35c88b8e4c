//! Command handlers for the World State context.
//!
//! Save and load orchestrate the store and a `SaveRepository`: capture or
//! restore the tables, then persist or read them.

use eventide_core::clock::Clock;
use eventide_core::error::DomainError;
use tracing::info;

use crate::domain::repository::SaveRepository;
use crate::domain::save::SaveData;
use crate::domain::state::GameState;

/// Captures the world state and stores it in `slot`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository write fails.
pub async fn handle_save(
    state: &GameState,
    slot: u8,
    clock: &dyn Clock,
    repo: &dyn SaveRepository,
) -> Result<SaveData, DomainError> {
    let mut data = state.snapshot();
    data.saved_at = Some(clock.now());

    repo.store(slot, &data).await?;

    info!(
        slot,
        switches = data.switches.len(),
        variables = data.variables.len(),
        "world state saved"
    );
    Ok(data)
}

/// Loads `slot` and replaces the world state with it.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the slot is empty.
/// Returns `DomainError::Infrastructure` if the repository read fails.
pub async fn handle_load(
    state: &GameState,
    slot: u8,
    repo: &dyn SaveRepository,
) -> Result<SaveData, DomainError> {
    let data = repo
        .load(slot)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("save slot {slot}")))?;

    state.restore(&data);

    info!(slot, "world state loaded");
    Ok(data)
}
