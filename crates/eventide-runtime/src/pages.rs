//! Page selection.

use eventide_core::event::EventDefinition;
use eventide_world_state::domain::state::GameState;

/// Index of the page that runs when `definition` starts: the highest-index
/// page whose conditions all hold. Later pages override earlier ones.
#[must_use]
pub fn select_page(definition: &EventDefinition, state: &GameState) -> Option<usize> {
    definition.pages.iter().rposition(|page| {
        page.conditions
            .iter()
            .all(|condition| state.evaluate(condition, Some(&definition.id)))
    })
}
