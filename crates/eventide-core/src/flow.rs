//! Block structure of a command list.
//!
//! Branch and loop commands are matched once, up front, so flow control can
//! jump in constant time. Disabled commands take no part in matching.

use std::collections::HashMap;

use crate::command::{Command, CommandData};

/// A structural defect found while matching blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowIssue {
    /// Index of the offending command.
    pub index: usize,
    /// What is wrong with it.
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
enum OpenBlock {
    Branch { start: usize, else_at: Option<usize> },
    Loop { start: usize },
}

/// Jump targets for every matched branch and loop.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    branch_else: HashMap<usize, usize>,
    branch_end: HashMap<usize, usize>,
    loop_end: HashMap<usize, usize>,
    loop_start: HashMap<usize, usize>,
    issues: Vec<FlowIssue>,
}

impl FlowTable {
    /// Matches the blocks of `commands`.
    #[must_use]
    pub fn build(commands: &[Command]) -> Self {
        let mut table = Self::default();
        let mut open: Vec<OpenBlock> = Vec::new();

        for (index, command) in commands.iter().enumerate() {
            if !command.enabled {
                continue;
            }
            match &command.data {
                CommandData::ConditionalBranch { .. } => {
                    open.push(OpenBlock::Branch {
                        start: index,
                        else_at: None,
                    });
                }
                CommandData::Else => match open.last_mut() {
                    Some(OpenBlock::Branch { start, else_at }) if else_at.is_none() => {
                        *else_at = Some(index);
                        table.branch_else.insert(*start, index);
                    }
                    _ => table.issue(index, "else without an open conditional branch"),
                },
                CommandData::EndBranch => match open.last() {
                    Some(OpenBlock::Branch { start, else_at }) => {
                        table.branch_end.insert(*start, index);
                        if let Some(else_index) = else_at {
                            table.branch_end.insert(*else_index, index);
                        }
                        open.pop();
                    }
                    _ => table.issue(index, "end_branch without an open conditional branch"),
                },
                CommandData::Loop => open.push(OpenBlock::Loop { start: index }),
                CommandData::EndLoop => match open.last() {
                    Some(OpenBlock::Loop { start }) => {
                        table.loop_end.insert(*start, index);
                        table.loop_start.insert(index, *start);
                        open.pop();
                    }
                    _ => table.issue(index, "end_loop without an open loop"),
                },
                _ => {}
            }
        }

        for block in open {
            match block {
                OpenBlock::Branch { start, .. } => {
                    table.issue(start, "conditional branch is never closed");
                }
                OpenBlock::Loop { start } => table.issue(start, "loop is never closed"),
            }
        }

        table
    }

    fn issue(&mut self, index: usize, message: &str) {
        self.issues.push(FlowIssue {
            index,
            message: message.to_owned(),
        });
    }

    /// Where a branch at `index` continues when its condition is false:
    /// past its `else`, or past its `end_branch`, or `None` if unmatched.
    #[must_use]
    pub fn branch_false_target(&self, index: usize) -> Option<usize> {
        self.branch_else
            .get(&index)
            .or_else(|| self.branch_end.get(&index))
            .map(|target| target + 1)
    }

    /// Where control continues when the then-block reaches the `else` at
    /// `index`: past the matching `end_branch`.
    #[must_use]
    pub fn else_exit_target(&self, index: usize) -> Option<usize> {
        self.branch_end.get(&index).map(|end| end + 1)
    }

    /// The `end_loop` matching the loop opened at `index`.
    #[must_use]
    pub fn loop_end(&self, index: usize) -> Option<usize> {
        self.loop_end.get(&index).copied()
    }

    /// The `loop` matching the `end_loop` at `index`.
    #[must_use]
    pub fn loop_start(&self, index: usize) -> Option<usize> {
        self.loop_start.get(&index).copied()
    }

    /// Structural defects, in list order of discovery.
    #[must_use]
    pub fn issues(&self) -> &[FlowIssue] {
        &self.issues
    }
}
