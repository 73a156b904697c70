//! Match resolution: finished command + registry → quick fix actions.

use crate::action::{Activation, QuickFixAction, UriOpener};
use crate::command::FinishedCommand;
use crate::registry::RuleRegistry;
use crate::rule::MatchResult;
use std::collections::HashSet;

/// Actions resolved for one finished command. Never empty.
#[derive(Debug)]
pub struct Resolution {
    actions: Vec<QuickFixAction>,
    expected_commands: HashSet<String>,
    command_line: String,
}

impl Resolution {
    /// Actions in the order their rules were evaluated.
    pub fn actions(&self) -> &[QuickFixAction] {
        &self.actions
    }

    /// Commands that count as "the user took the fix" if run next.
    pub fn expected_commands(&self) -> &HashSet<String> {
        &self.expected_commands
    }

    /// The command line that produced this resolution.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Concatenated action ids, identifying the fix-set that was offered.
    pub fn fix_id(&self) -> String {
        self.actions.iter().map(QuickFixAction::id).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run the action at `index`. `None` if there is no such action.
    pub fn run(&mut self, index: usize, opener: &dyn UriOpener) -> Option<Activation> {
        self.actions.get_mut(index).map(|action| action.run(opener))
    }
}

/// Evaluate every registered rule against `command`.
///
/// Returns `None` when no rule produced an action, so callers never render
/// an empty menu.
pub fn resolve(command: &dyn FinishedCommand, registry: &RuleRegistry) -> Option<Resolution> {
    let command_line = command.command_line();
    let succeeded = command.succeeded();
    let mut actions = Vec::new();
    let mut expected_commands = HashSet::new();

    for rule in registry.iter() {
        if !rule.accepts_exit(succeeded) {
            continue;
        }
        let Some(command_line_match) = rule.command_line_matcher.captures(command_line) else {
            continue;
        };
        let output_match = rule
            .output_matcher
            .as_ref()
            .and_then(|matcher| command.output_match(matcher));
        let matches = MatchResult {
            command_line,
            command_line_match,
            output_match,
        };

        let candidates = rule.candidates(&matches, command);
        tracing::trace!(
            "Quick fix {} matched `{command_line}` with {} candidate(s)",
            rule.id,
            candidates.len()
        );
        for candidate in candidates {
            let action = QuickFixAction::from_candidate(rule, candidate);
            if let Some(cmd) = action.command() {
                expected_commands.insert(cmd.to_string());
            }
            actions.push(action);
        }
    }

    if actions.is_empty() {
        return None;
    }
    tracing::debug!(
        "Resolved {} quick fix(es) for `{command_line}`",
        actions.len()
    );
    Some(Resolution {
        actions,
        expected_commands,
        command_line: command_line.to_string(),
    })
}
