//! Change notifications for the World State context.

use eventide_core::event::EventId;
use serde::{Deserialize, Serialize};

/// Emitted when a value in the world state actually changes.
///
/// Writes that store the value already present produce no notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StateChange {
    /// A global switch flipped.
    SwitchChanged {
        /// Switch name.
        name: String,
        /// Previous value (unset reads as `false`).
        old: bool,
        /// New value.
        new: bool,
    },
    /// A global variable changed.
    VariableChanged {
        /// Variable name.
        name: String,
        /// Previous value (unset reads as `0`).
        old: i64,
        /// New value.
        new: i64,
    },
    /// A self-switch of one event flipped.
    SelfSwitchChanged {
        /// Owning event.
        event_id: EventId,
        /// Self-switch name.
        name: String,
        /// Previous value.
        old: bool,
        /// New value.
        new: bool,
    },
    /// All tables were replaced from save data.
    Restored,
}

impl StateChange {
    /// Returns the notification type name (used for logging and routing).
    #[must_use]
    pub fn change_type(&self) -> &'static str {
        match self {
            Self::SwitchChanged { .. } => "world_state.switch_changed",
            Self::VariableChanged { .. } => "world_state.variable_changed",
            Self::SelfSwitchChanged { .. } => "world_state.self_switch_changed",
            Self::Restored => "world_state.restored",
        }
    }
}
