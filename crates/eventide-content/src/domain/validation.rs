//! Structural validation of script bundles.

use std::collections::HashSet;
use std::fmt;

use eventide_core::command::{Command, CommandData};
use eventide_core::error::DomainError;
use eventide_core::flow::FlowTable;

use super::bundle::ScriptBundle;

/// One problem found in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Where the problem is, e.g. `event 'door' page 1 command 4`.
    pub location: String,
    /// What is wrong.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Collects every issue in `bundle`.
#[must_use]
pub fn find_issues(bundle: &ScriptBundle) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let cutscene_ids: HashSet<&str> = bundle.cutscenes.iter().map(|c| c.id.as_str()).collect();

    let mut seen = HashSet::new();
    for event in &bundle.events {
        let location = format!("event '{}'", event.id);
        check_identity(&mut issues, &location, event.id.as_str(), &event.name, &mut seen);
        if event.pages.is_empty() {
            push(&mut issues, &location, "event has no pages");
        }
        for (page_index, page) in event.pages.iter().enumerate() {
            let page_location = format!("{location} page {page_index}");
            check_commands(&mut issues, &page_location, &page.commands, &cutscene_ids);
        }
    }

    let mut seen = HashSet::new();
    for cutscene in &bundle.cutscenes {
        let location = format!("cutscene '{}'", cutscene.id);
        check_identity(&mut issues, &location, cutscene.id.as_str(), &cutscene.name, &mut seen);
        let mut actors = HashSet::new();
        for actor in &cutscene.actors {
            if !actors.insert(actor.actor_id.as_str()) {
                push(
                    &mut issues,
                    &location,
                    &format!("duplicate actor id '{}'", actor.actor_id),
                );
            }
        }
        check_commands(&mut issues, &location, &cutscene.commands, &cutscene_ids);
    }

    issues
}

/// Validates `bundle`.
///
/// # Errors
///
/// Returns `DomainError::Validation` listing every issue found.
pub fn validate(bundle: &ScriptBundle) -> Result<(), DomainError> {
    let issues = find_issues(bundle);
    if issues.is_empty() {
        return Ok(());
    }
    let listed: Vec<String> = issues.iter().map(ToString::to_string).collect();
    Err(DomainError::Validation(listed.join("; ")))
}

fn push(issues: &mut Vec<ValidationIssue>, location: &str, message: &str) {
    issues.push(ValidationIssue {
        location: location.to_owned(),
        message: message.to_owned(),
    });
}

fn check_identity<'a>(
    issues: &mut Vec<ValidationIssue>,
    location: &str,
    id: &'a str,
    name: &str,
    seen: &mut HashSet<&'a str>,
) {
    if id.trim().is_empty() {
        push(issues, location, "id must not be empty");
    } else if !seen.insert(id) {
        push(issues, location, "duplicate id");
    }
    if name.trim().is_empty() {
        push(issues, location, "name must not be empty");
    }
}

fn check_commands(
    issues: &mut Vec<ValidationIssue>,
    location: &str,
    commands: &[Command],
    cutscene_ids: &HashSet<&str>,
) {
    for issue in FlowTable::build(commands).issues() {
        push(
            issues,
            &format!("{location} command {}", issue.index),
            &issue.message,
        );
    }
    for (index, command) in commands.iter().enumerate() {
        if let CommandData::PlayCutscene { cutscene_id } = &command.data {
            if !cutscene_ids.contains(cutscene_id.as_str()) {
                push(
                    issues,
                    &format!("{location} command {index}"),
                    &format!("unknown cutscene '{cutscene_id}'"),
                );
            }
        }
    }
}
