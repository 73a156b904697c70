//! Materialized quick fix actions.
//!
//! Each [`QuickFixAction`] runs at most once. Running reports back through
//! the returned [`Activation`] instead of firing an event:
//!
//! - command actions hand a [`RerunRequest`] to the caller, which writes it
//!   to the terminal. The outcome is judged when that command finishes.
//! - link and callback actions complete immediately with a fired id.

use crate::rule::{QuickFixRule, RawCandidate};
use std::fmt;
use url::Url;

/// Id given to every link action.
pub const OPENER_ACTION_ID: &str = "quickFix.opener";

/// Opens links on behalf of link actions.
pub trait UriOpener {
    fn open(&self, uri: &Url);
}

/// Ask the terminal to type (and optionally submit) a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerunRequest {
    pub command: String,
    pub add_newline: bool,
}

/// What an action does when run.
pub enum ActionKind {
    Rerun { command: String, add_newline: bool },
    Open { uri: Url, rule_id: String },
    Callback { run: Box<dyn FnMut()> },
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rerun {
                command,
                add_newline,
            } => f
                .debug_struct("Rerun")
                .field("command", command)
                .field("add_newline", add_newline)
                .finish(),
            Self::Open { uri, rule_id } => f
                .debug_struct("Open")
                .field("uri", &uri.as_str())
                .field("rule_id", rule_id)
                .finish(),
            Self::Callback { .. } => f.write_str("Callback(..)"),
        }
    }
}

/// Result of running an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The caller must send this command to the terminal.
    Rerun(RerunRequest),
    /// The action finished; `fired_id` identifies it for outcome reporting.
    Completed { fired_id: String },
    /// The action was already run once.
    AlreadyConsumed,
    /// The action is disabled and did nothing.
    Disabled,
}

/// A suggestion the user can pick from the quick fix menu.
#[derive(Debug)]
pub struct QuickFixAction {
    id: String,
    label: String,
    tooltip: String,
    enabled: bool,
    kind: ActionKind,
    consumed: bool,
}

impl QuickFixAction {
    /// Build the action for one candidate produced by `rule`.
    pub fn from_candidate(rule: &QuickFixRule, candidate: RawCandidate) -> Self {
        match candidate {
            RawCandidate::Command {
                id,
                command,
                add_newline,
            } => {
                let label = format!("Run: {command}");
                Self {
                    id,
                    tooltip: label.clone(),
                    label,
                    enabled: true,
                    kind: ActionKind::Rerun {
                        command,
                        add_newline,
                    },
                    consumed: false,
                }
            }
            RawCandidate::Link { uri } => {
                let label = format!("Open: {uri}");
                Self {
                    id: OPENER_ACTION_ID.to_string(),
                    tooltip: label.clone(),
                    label,
                    enabled: true,
                    kind: ActionKind::Open {
                        uri,
                        rule_id: rule.id.clone(),
                    },
                    consumed: false,
                }
            }
            RawCandidate::Callback(c) => Self {
                tooltip: c.tooltip.unwrap_or_else(|| c.label.clone()),
                id: c.id,
                label: c.label,
                enabled: c.enabled,
                kind: ActionKind::Callback { run: c.run },
                consumed: false,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The resolved command line, for command actions.
    pub fn command(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Rerun { command, .. } => Some(command),
            _ => None,
        }
    }

    /// The resolved link, for link actions.
    pub fn uri(&self) -> Option<&Url> {
        match &self.kind {
            ActionKind::Open { uri, .. } => Some(uri),
            _ => None,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Run the action. Only the first call has an effect.
    pub fn run(&mut self, opener: &dyn UriOpener) -> Activation {
        if !self.enabled {
            return Activation::Disabled;
        }
        if self.consumed {
            return Activation::AlreadyConsumed;
        }
        self.consumed = true;
        match &mut self.kind {
            ActionKind::Rerun {
                command,
                add_newline,
            } => Activation::Rerun(RerunRequest {
                command: command.clone(),
                add_newline: *add_newline,
            }),
            ActionKind::Open { uri, rule_id } => {
                opener.open(uri);
                // Nothing gets typed into the terminal, so report right away.
                Activation::Completed {
                    fired_id: rule_id.clone(),
                }
            }
            ActionKind::Callback { run } => {
                run();
                Activation::Completed {
                    fired_id: self.id.clone(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::CallbackCandidate;
    use regex::Regex;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingOpener {
        opened: RefCell<Vec<String>>,
    }

    impl UriOpener for RecordingOpener {
        fn open(&self, uri: &Url) {
            self.opened.borrow_mut().push(uri.to_string());
        }
    }

    fn rule() -> QuickFixRule {
        QuickFixRule::link("Docs Link", Regex::new("x").unwrap(), "${group:u}")
    }

    #[test]
    fn command_action_returns_rerun_request_once() {
        let opener = RecordingOpener::default();
        let mut action = QuickFixAction::from_candidate(
            &rule(),
            RawCandidate::Command {
                id: "fix".into(),
                command: "git push --set-upstream origin main".into(),
                add_newline: true,
            },
        );
        assert_eq!(action.label(), "Run: git push --set-upstream origin main");
        assert_eq!(action.tooltip(), action.label());
        assert_eq!(action.command(), Some("git push --set-upstream origin main"));

        assert_eq!(
            action.run(&opener),
            Activation::Rerun(RerunRequest {
                command: "git push --set-upstream origin main".into(),
                add_newline: true,
            })
        );
        assert_eq!(action.run(&opener), Activation::AlreadyConsumed);
        assert!(action.is_consumed());
    }

    #[test]
    fn link_action_opens_and_fires_rule_id() {
        let opener = RecordingOpener::default();
        let uri = Url::parse("https://example.com/issues/42").unwrap();
        let mut action = QuickFixAction::from_candidate(&rule(), RawCandidate::Link { uri });
        assert_eq!(action.id(), OPENER_ACTION_ID);
        assert_eq!(action.label(), "Open: https://example.com/issues/42");

        assert_eq!(
            action.run(&opener),
            Activation::Completed {
                fired_id: "Docs Link".into()
            }
        );
        assert_eq!(
            opener.opened.borrow().as_slice(),
            ["https://example.com/issues/42".to_string()]
        );
    }

    #[test]
    fn callback_action_runs_and_fires_candidate_id() {
        let opener = RecordingOpener::default();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut candidate = CallbackCandidate::new("free-port", "Free port 3000", move || {
            counter.set(counter.get() + 1);
        });
        candidate.tooltip = Some("Kill the process listening on 3000".into());
        let mut action = QuickFixAction::from_candidate(&rule(), RawCandidate::Callback(candidate));
        assert_eq!(action.tooltip(), "Kill the process listening on 3000");

        assert_eq!(
            action.run(&opener),
            Activation::Completed {
                fired_id: "free-port".into()
            }
        );
        action.run(&opener);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn disabled_callback_does_nothing() {
        let opener = RecordingOpener::default();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut candidate = CallbackCandidate::new("x", "X", move || counter.set(counter.get() + 1));
        candidate.enabled = false;
        let mut action = QuickFixAction::from_candidate(&rule(), RawCandidate::Callback(candidate));

        assert_eq!(action.run(&opener), Activation::Disabled);
        assert_eq!(calls.get(), 0);
        assert!(!action.is_consumed());
    }
}
