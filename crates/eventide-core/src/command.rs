//! Authored command model.
//!
//! A command list is an ordered `Vec<Command>`. Each command carries a typed
//! payload keyed by its `type` tag, so parameters are validated when the
//! script is decoded rather than when the command runs.

use serde::{Deserialize, Serialize};

/// Type tag of the `conditional_branch` command.
pub const CONDITIONAL_BRANCH: &str = "conditional_branch";
/// Type tag of the `else` command.
pub const ELSE: &str = "else";
/// Type tag of the `end_branch` command.
pub const END_BRANCH: &str = "end_branch";
/// Type tag of the `loop` command.
pub const LOOP: &str = "loop";
/// Type tag of the `end_loop` command.
pub const END_LOOP: &str = "end_loop";
/// Type tag of the `break_loop` command.
pub const BREAK_LOOP: &str = "break_loop";
/// Type tag of the `exit_event` command.
pub const EXIT_EVENT: &str = "exit_event";
/// Type tag of the `wait` command.
pub const WAIT: &str = "wait";
/// Type tag of the `show_message` command.
pub const SHOW_MESSAGE: &str = "show_message";
/// Type tag of the `control_switch` command.
pub const CONTROL_SWITCH: &str = "control_switch";
/// Type tag of the `control_variable` command.
pub const CONTROL_VARIABLE: &str = "control_variable";
/// Type tag of the `control_self_switch` command.
pub const CONTROL_SELF_SWITCH: &str = "control_self_switch";
/// Type tag of the `play_cutscene` command.
pub const PLAY_CUTSCENE: &str = "play_cutscene";
/// Type tag of the `timeline_marker` command.
pub const TIMELINE_MARKER: &str = "timeline_marker";
/// Type tag of the `comment` command.
pub const COMMENT: &str = "comment";

fn default_enabled() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_enabled(enabled: &bool) -> bool {
    *enabled
}

/// One instruction in an event script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Disabled commands stay in the list but are never executed.
    #[serde(default = "default_enabled", skip_serializing_if = "is_enabled")]
    pub enabled: bool,
    /// Typed payload, tagged by command type.
    #[serde(flatten)]
    pub data: CommandData,
}

impl Command {
    /// Creates an enabled command.
    #[must_use]
    pub fn new(data: CommandData) -> Self {
        Self {
            enabled: true,
            data,
        }
    }

    /// Returns a disabled copy of this command.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The type tag used for dispatch and classification.
    #[must_use]
    pub fn command_type(&self) -> &str {
        self.data.command_type()
    }

    /// Returns `true` if the interpreter handles this command itself.
    #[must_use]
    pub fn is_flow_control(&self) -> bool {
        self.data.is_flow_control()
    }
}

impl From<CommandData> for Command {
    fn from(data: CommandData) -> Self {
        Self::new(data)
    }
}

/// Per-type command payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandData {
    /// Runs the following block only when the condition holds.
    ConditionalBranch {
        /// Condition evaluated against global and self state.
        condition: Condition,
    },
    /// Starts the alternative block of the enclosing branch.
    Else,
    /// Closes a conditional branch.
    EndBranch,
    /// Opens a loop that repeats until broken out of.
    Loop,
    /// Closes a loop; control returns to the loop's first body command.
    EndLoop,
    /// Leaves the innermost enclosing loop.
    BreakLoop,
    /// Stops the script immediately as a normal finish.
    ExitEvent,
    /// Suspends for a fixed duration.
    Wait {
        /// Duration in milliseconds.
        duration_ms: u64,
    },
    /// Shows a message and suspends until it is dismissed.
    ShowMessage {
        /// Optional speaker name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        /// Message body.
        text: String,
    },
    /// Sets a global switch.
    ControlSwitch {
        /// Switch name.
        name: String,
        /// New value.
        value: bool,
    },
    /// Updates a global variable.
    ControlVariable {
        /// Variable name.
        name: String,
        /// Operation applied to the current value.
        operation: VariableOperation,
        /// Right-hand side of the operation.
        operand: Operand,
    },
    /// Sets a self-switch of the running event.
    ControlSelfSwitch {
        /// Self-switch name.
        name: String,
        /// New value.
        value: bool,
    },
    /// Plays another cutscene and suspends until it ends.
    PlayCutscene {
        /// The cutscene to play.
        cutscene_id: String,
    },
    /// Rendezvous with a named timeline marker.
    TimelineMarker {
        /// Marker name emitted by the timeline.
        marker: String,
    },
    /// Author note; does nothing.
    Comment {
        /// Note text.
        text: String,
    },
    /// A host-registered command resolved through the command registry.
    Custom {
        /// Registry key.
        tag: String,
        /// Opaque payload decoded by the registered factory.
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl CommandData {
    /// The type tag used for dispatch and classification.
    #[must_use]
    pub fn command_type(&self) -> &str {
        match self {
            Self::ConditionalBranch { .. } => CONDITIONAL_BRANCH,
            Self::Else => ELSE,
            Self::EndBranch => END_BRANCH,
            Self::Loop => LOOP,
            Self::EndLoop => END_LOOP,
            Self::BreakLoop => BREAK_LOOP,
            Self::ExitEvent => EXIT_EVENT,
            Self::Wait { .. } => WAIT,
            Self::ShowMessage { .. } => SHOW_MESSAGE,
            Self::ControlSwitch { .. } => CONTROL_SWITCH,
            Self::ControlVariable { .. } => CONTROL_VARIABLE,
            Self::ControlSelfSwitch { .. } => CONTROL_SELF_SWITCH,
            Self::PlayCutscene { .. } => PLAY_CUTSCENE,
            Self::TimelineMarker { .. } => TIMELINE_MARKER,
            Self::Comment { .. } => COMMENT,
            Self::Custom { tag, .. } => tag,
        }
    }

    /// Returns `true` for commands the interpreter executes itself.
    #[must_use]
    pub fn is_flow_control(&self) -> bool {
        matches!(
            self,
            Self::ConditionalBranch { .. }
                | Self::Else
                | Self::EndBranch
                | Self::Loop
                | Self::EndLoop
                | Self::BreakLoop
                | Self::ExitEvent
        )
    }
}

/// A boolean test over game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// A global switch equals `value`.
    Switch {
        /// Switch name.
        name: String,
        /// Expected value.
        value: bool,
    },
    /// A global variable compares against a constant.
    Variable {
        /// Variable name.
        name: String,
        /// Comparison operator.
        comparison: Comparison,
        /// Right-hand constant.
        value: i64,
    },
    /// A self-switch of the evaluating event equals `value`.
    SelfSwitch {
        /// Self-switch name.
        name: String,
        /// Expected value.
        value: bool,
    },
    /// Every nested condition holds. An empty list holds.
    All(Vec<Condition>),
    /// At least one nested condition holds. An empty list does not hold.
    Any(Vec<Condition>),
}

/// Comparison operators for variable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Comparison {
    /// Applies the operator as `lhs <op> rhs`.
    #[must_use]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
        }
    }
}

/// Arithmetic applied by `control_variable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableOperation {
    /// Replace the value.
    Set,
    /// Add the operand.
    Add,
    /// Subtract the operand.
    Sub,
    /// Multiply by the operand.
    Mul,
    /// Divide by the operand; division by zero leaves the value unchanged.
    Div,
    /// Remainder by the operand; modulo zero leaves the value unchanged.
    Mod,
}

impl VariableOperation {
    /// Computes the new value. Overflow saturates.
    #[must_use]
    pub fn apply(self, current: i64, operand: i64) -> i64 {
        match self {
            Self::Set => operand,
            Self::Add => current.saturating_add(operand),
            Self::Sub => current.saturating_sub(operand),
            Self::Mul => current.saturating_mul(operand),
            Self::Div => current.checked_div(operand).unwrap_or(current),
            Self::Mod => current.checked_rem(operand).unwrap_or(current),
        }
    }
}

/// Right-hand side of a variable operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A literal value.
    Constant(i64),
    /// The current value of another variable.
    Variable(String),
    /// A random value in `[min, max]` inclusive.
    Random {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
}
