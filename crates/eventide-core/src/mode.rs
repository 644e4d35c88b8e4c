//! Execution mode selection.
//!
//! Both selectors are pure: they look only at the requested mode and the
//! shape of the script.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::cutscene::CutsceneDescriptor;

/// Which engine drives a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Decide from the script's content.
    #[default]
    Auto,
    /// Straight command execution.
    Command,
    /// Timeline playback only.
    Timeline,
    /// Timeline playback and command execution, joined.
    Hybrid,
}

impl ExecutionMode {
    /// Returns `true` when a timeline track is involved.
    #[must_use]
    pub fn is_cutscene_mode(self) -> bool {
        matches!(self, Self::Timeline | Self::Hybrid)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Command => "command",
            Self::Timeline => "timeline",
            Self::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Chooses the mode for a bare command list.
///
/// A non-`Auto` request is returned verbatim. Otherwise each command is
/// classified with `is_cutscene_only` (keyed by type tag): both kinds present
/// selects `Hybrid`, only cutscene commands selects `Timeline`, and anything
/// else (including an empty list) selects `Command`.
pub fn select_mode<F>(
    requested: ExecutionMode,
    commands: &[Command],
    is_cutscene_only: F,
) -> ExecutionMode
where
    F: Fn(&str) -> bool,
{
    if requested != ExecutionMode::Auto {
        return requested;
    }

    let mut has_cutscene = false;
    let mut has_event = false;
    for command in commands {
        if is_cutscene_only(command.command_type()) {
            has_cutscene = true;
        } else {
            has_event = true;
        }
        if has_cutscene && has_event {
            return ExecutionMode::Hybrid;
        }
    }

    if has_cutscene {
        ExecutionMode::Timeline
    } else {
        ExecutionMode::Command
    }
}

/// Chooses the mode for a cutscene descriptor.
///
/// A non-`Auto` preference is returned verbatim. Otherwise a timeline plus a
/// non-empty command list selects `Hybrid`, a timeline alone selects
/// `Timeline`, and commands alone or neither select `Command`.
#[must_use]
pub fn select_cutscene_mode(descriptor: &CutsceneDescriptor) -> ExecutionMode {
    if descriptor.preferred_mode != ExecutionMode::Auto {
        return descriptor.preferred_mode;
    }

    match (descriptor.timeline.is_some(), descriptor.commands.is_empty()) {
        (true, false) => ExecutionMode::Hybrid,
        (true, true) => ExecutionMode::Timeline,
        (false, _) => ExecutionMode::Command,
    }
}
