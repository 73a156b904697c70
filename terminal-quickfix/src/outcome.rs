//! Did the user take the fix?
//!
//! ```text
//!            arm(resolution)
//!   Idle ───────────────────────▶ Awaiting
//!    ▲                               │
//!    │  next command finished        │
//!    │  or link/callback completed   │
//!    └───────── QuickFixReport ◀─────┘
//! ```
//!
//! A command finishing while idle produces no report.

use crate::resolver::Resolution;
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of one offered fix-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickFixReport {
    /// Concatenated action ids, or the fired id for link/callback actions.
    pub quick_fix_id: String,
    /// Whether the menu was opened before the outcome was known.
    pub fixes_shown: bool,
    /// `None` when the fix-set had no command actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ran_quick_fix_command: Option<bool>,
}

#[derive(Debug, Default)]
pub enum OutcomeState {
    #[default]
    Idle,
    Awaiting {
        expected_commands: HashSet<String>,
        fix_id: String,
        command_line: String,
    },
}

#[derive(Debug, Default)]
pub struct OutcomeTracker {
    state: OutcomeState,
    fixes_shown: bool,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OutcomeState {
        &self.state
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, OutcomeState::Awaiting { .. })
    }

    pub fn fixes_shown(&self) -> bool {
        self.fixes_shown
    }

    /// Start waiting on the outcome of `resolution`.
    pub fn arm(&mut self, resolution: &Resolution) {
        self.state = OutcomeState::Awaiting {
            expected_commands: resolution.expected_commands().clone(),
            fix_id: resolution.fix_id(),
            command_line: resolution.command_line().to_string(),
        };
        self.fixes_shown = false;
    }

    /// The menu for the current fix-set was opened.
    pub fn mark_shown(&mut self) {
        self.fixes_shown = true;
    }

    /// A command finished. Reports whether it was one of the offered fixes.
    pub fn on_command_finished(&mut self, command_line: &str) -> Option<QuickFixReport> {
        match std::mem::take(&mut self.state) {
            OutcomeState::Idle => {
                self.fixes_shown = false;
                None
            }
            OutcomeState::Awaiting {
                expected_commands,
                fix_id,
                ..
            } => Some(self.report(fix_id, &expected_commands, command_line)),
        }
    }

    /// A link or callback action completed.
    ///
    /// Membership is judged against the command that triggered the fix-set,
    /// since nothing was typed into the terminal.
    pub fn on_action_completed(&mut self, fired_id: &str) -> Option<QuickFixReport> {
        match std::mem::take(&mut self.state) {
            OutcomeState::Idle => None,
            OutcomeState::Awaiting {
                expected_commands,
                command_line,
                ..
            } => Some(self.report(fired_id.to_string(), &expected_commands, &command_line)),
        }
    }

    fn report(
        &mut self,
        quick_fix_id: String,
        expected_commands: &HashSet<String>,
        command_line: &str,
    ) -> QuickFixReport {
        let fixes_shown = std::mem::take(&mut self.fixes_shown);
        QuickFixReport {
            quick_fix_id,
            fixes_shown,
            ran_quick_fix_command: (!expected_commands.is_empty())
                .then(|| expected_commands.contains(command_line)),
        }
    }
}
