//! The world state store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use eventide_core::command::{Condition, Operand, VariableOperation};
use eventide_core::event::EventId;
use eventide_core::rng::{DeterministicRng, SeededRng};
use tokio::sync::broadcast;
use tracing::debug;

use super::events::StateChange;
use super::save::SaveData;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Tables {
    switches: BTreeMap<String, bool>,
    variables: BTreeMap<String, i64>,
    self_switches: BTreeMap<EventId, BTreeMap<String, bool>>,
}

/// Global switches, variables and self-switches.
///
/// Every operation takes the lock for one read-evaluate-write step and never
/// across an `.await`, so steps are atomic with respect to each other.
pub struct GameState {
    tables: Mutex<Tables>,
    rng: Mutex<Box<dyn DeterministicRng>>,
    changes: broadcast::Sender<StateChange>,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Box::new(SeededRng::from_entropy()))
    }
}

impl GameState {
    /// Creates an empty store that draws random operands from `rng`.
    #[must_use]
    pub fn new(rng: Box<dyn DeterministicRng>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tables: Mutex::new(Tables::default()),
            rng: Mutex::new(rng),
            changes,
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, change: StateChange) {
        debug!(change_type = change.change_type(), ?change, "world state changed");
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Reads a switch. Unset switches are `false`.
    #[must_use]
    pub fn switch(&self, name: &str) -> bool {
        self.tables().switches.get(name).copied().unwrap_or(false)
    }

    /// Writes a switch. Returns `true` if the value changed.
    pub fn set_switch(&self, name: &str, value: bool) -> bool {
        let old = {
            let mut tables = self.tables();
            let old = tables.switches.get(name).copied().unwrap_or(false);
            tables.switches.insert(name.to_owned(), value);
            old
        };
        if old == value {
            return false;
        }
        self.publish(StateChange::SwitchChanged {
            name: name.to_owned(),
            old,
            new: value,
        });
        true
    }

    /// Reads a variable. Unset variables are `0`.
    #[must_use]
    pub fn variable(&self, name: &str) -> i64 {
        self.tables().variables.get(name).copied().unwrap_or(0)
    }

    /// Writes a variable. Returns `true` if the value changed.
    pub fn set_variable(&self, name: &str, value: i64) -> bool {
        let old = {
            let mut tables = self.tables();
            let old = tables.variables.get(name).copied().unwrap_or(0);
            tables.variables.insert(name.to_owned(), value);
            old
        };
        self.publish_variable(name, old, value)
    }

    fn publish_variable(&self, name: &str, old: i64, new: i64) -> bool {
        if old == new {
            return false;
        }
        self.publish(StateChange::VariableChanged {
            name: name.to_owned(),
            old,
            new,
        });
        true
    }

    /// Applies `operation` with `operand` to a variable and returns the new
    /// value. The operand, the read and the write share one lock.
    pub fn apply_variable(
        &self,
        name: &str,
        operation: VariableOperation,
        operand: &Operand,
    ) -> i64 {
        let (old, new) = {
            let mut tables = self.tables();
            let rhs = self.resolve_in(&tables, operand);
            let old = tables.variables.get(name).copied().unwrap_or(0);
            let new = operation.apply(old, rhs);
            tables.variables.insert(name.to_owned(), new);
            (old, new)
        };
        self.publish_variable(name, old, new);
        new
    }

    /// Resolves an operand to a concrete value.
    pub fn resolve_operand(&self, operand: &Operand) -> i64 {
        let tables = self.tables();
        self.resolve_in(&tables, operand)
    }

    // Lock order: tables, then rng.
    fn resolve_in(&self, tables: &Tables, operand: &Operand) -> i64 {
        match operand {
            Operand::Constant(value) => *value,
            Operand::Variable(name) => tables.variables.get(name).copied().unwrap_or(0),
            Operand::Random { min, max } => self
                .rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .next_i64_range(*min, *max),
        }
    }

    /// Reads a self-switch of `event_id`. Unset self-switches are `false`.
    #[must_use]
    pub fn self_switch(&self, event_id: &EventId, name: &str) -> bool {
        self.tables()
            .self_switches
            .get(event_id)
            .and_then(|switches| switches.get(name))
            .copied()
            .unwrap_or(false)
    }

    /// Writes a self-switch of `event_id`. Returns `true` if the value
    /// changed.
    pub fn set_self_switch(&self, event_id: &EventId, name: &str, value: bool) -> bool {
        let old = {
            let mut tables = self.tables();
            let switches = tables.self_switches.entry(event_id.clone()).or_default();
            let old = switches.get(name).copied().unwrap_or(false);
            switches.insert(name.to_owned(), value);
            old
        };
        if old == value {
            return false;
        }
        self.publish(StateChange::SelfSwitchChanged {
            event_id: event_id.clone(),
            name: name.to_owned(),
            old,
            new: value,
        });
        true
    }

    /// Evaluates a condition. Self-switch conditions read the switches of
    /// `event_id`; without an event they are `false`.
    #[must_use]
    pub fn evaluate(&self, condition: &Condition, event_id: Option<&EventId>) -> bool {
        match condition {
            Condition::Switch { name, value } => self.switch(name) == *value,
            Condition::Variable {
                name,
                comparison,
                value,
            } => comparison.holds(self.variable(name), *value),
            Condition::SelfSwitch { name, value } => {
                event_id.is_some_and(|id| self.self_switch(id, name) == *value)
            }
            Condition::All(conditions) => conditions.iter().all(|c| self.evaluate(c, event_id)),
            Condition::Any(conditions) => conditions.iter().any(|c| self.evaluate(c, event_id)),
        }
    }

    /// Captures every table. `saved_at` is left unset.
    #[must_use]
    pub fn snapshot(&self) -> SaveData {
        let tables = self.tables();
        SaveData {
            switches: tables.switches.clone(),
            variables: tables.variables.clone(),
            self_switches: tables.self_switches.clone(),
            saved_at: None,
        }
    }

    /// Replaces every table with `data` and publishes `Restored`.
    pub fn restore(&self, data: &SaveData) {
        {
            let mut tables = self.tables();
            tables.switches.clone_from(&data.switches);
            tables.variables.clone_from(&data.variables);
            tables.self_switches.clone_from(&data.self_switches);
        }
        self.publish(StateChange::Restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventide_core::command::Comparison;
    use eventide_test_support::SequenceRng;

    #[test]
    fn test_set_switch_then_get_returns_value() {
        // Arrange
        let state = GameState::default();

        // Act
        let changed = state.set_switch("X", true);

        // Assert
        assert!(changed);
        assert!(state.switch("X"));
        assert!(!state.switch("unset"));
    }

    #[test]
    fn test_notifications_fire_only_on_change() {
        // Arrange
        let state = GameState::default();
        let mut changes = state.subscribe();

        // Act
        state.set_switch("X", true);
        state.set_switch("X", true);
        state.set_variable("gold", 0);
        state.set_variable("gold", 5);
        let event_id = EventId::new("chest");
        state.set_self_switch(&event_id, "A", false);
        state.set_self_switch(&event_id, "A", true);

        // Assert
        assert_eq!(
            changes.try_recv().unwrap(),
            StateChange::SwitchChanged {
                name: "X".to_owned(),
                old: false,
                new: true,
            }
        );
        assert_eq!(
            changes.try_recv().unwrap(),
            StateChange::VariableChanged {
                name: "gold".to_owned(),
                old: 0,
                new: 5,
            }
        );
        assert_eq!(
            changes.try_recv().unwrap(),
            StateChange::SelfSwitchChanged {
                event_id,
                name: "A".to_owned(),
                old: false,
                new: true,
            }
        );
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_self_switches_are_scoped_per_event() {
        // Arrange
        let state = GameState::default();
        let first = EventId::new("first");
        let second = EventId::new("second");

        // Act
        state.set_self_switch(&first, "A", true);

        // Assert
        assert!(state.self_switch(&first, "A"));
        assert!(!state.self_switch(&second, "A"));
    }

    #[test]
    fn test_apply_variable_resolves_operands() {
        // Arrange
        let state = GameState::new(Box::new(SequenceRng::new(vec![4])));
        state.set_variable("base", 10);

        // Act
        let from_variable = state.apply_variable(
            "total",
            VariableOperation::Set,
            &Operand::Variable("base".to_owned()),
        );
        let from_random = state.apply_variable(
            "total",
            VariableOperation::Add,
            &Operand::Random { min: 1, max: 6 },
        );

        // Assert
        assert_eq!(from_variable, 10);
        assert_eq!(from_random, 14);
        assert_eq!(state.variable("total"), 14);
    }

    #[test]
    fn test_evaluate_conditions() {
        // Arrange
        let state = GameState::default();
        let event_id = EventId::new("guard");
        state.set_switch("alarm", true);
        state.set_variable("coins", 3);
        state.set_self_switch(&event_id, "B", true);

        let all = Condition::All(vec![
            Condition::Switch {
                name: "alarm".to_owned(),
                value: true,
            },
            Condition::Variable {
                name: "coins".to_owned(),
                comparison: Comparison::Ge,
                value: 3,
            },
            Condition::SelfSwitch {
                name: "B".to_owned(),
                value: true,
            },
        ]);

        // Act / Assert
        assert!(state.evaluate(&all, Some(&event_id)));
        assert!(!state.evaluate(&all, None));
        assert!(state.evaluate(&Condition::All(vec![]), None));
        assert!(!state.evaluate(&Condition::Any(vec![]), None));
    }

    #[test]
    fn test_snapshot_restore_reproduces_tables() {
        // Arrange
        let original = GameState::default();
        original.set_switch("X", true);
        original.set_variable("gold", 250);
        original.set_self_switch(&EventId::new("chest"), "A", true);
        let data = original.snapshot();

        let restored = GameState::default();
        let mut changes = restored.subscribe();

        // Act
        restored.restore(&data);

        // Assert
        assert_eq!(restored.snapshot(), data);
        assert!(restored.switch("X"));
        assert_eq!(changes.try_recv().unwrap(), StateChange::Restored);
    }

    #[test]
    fn test_concurrent_apply_variable_loses_no_updates() {
        // Arrange
        let state = GameState::default();
        let add_one = Operand::Constant(1);

        // Act
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..2_000 {
                        state.apply_variable("steps", VariableOperation::Add, &add_one);
                    }
                });
            }
        });

        // Assert
        assert_eq!(state.variable("steps"), 16_000);
    }
}
