//! # terminal-quickfix
//!
//! Quick fix suggestions for an integrated terminal.
//!
//! When a shell command finishes, registered rules inspect its command line,
//! exit code and a window of its output, and may offer fixes: re-run a
//! corrected command, open a link, or run host code. The fixes appear behind
//! a gutter marker on the next prompt; picking one runs it, and the crate
//! reports whether the user took the fix.
//!
//! ## Architecture
//!
//! ```text
//! FinishedCommand ─▶ resolve(registry) ─▶ Resolution ─▶ QuickFixController
//!                                                          │        │
//!                                   TerminalSurface / ActionWidget  flume
//!                                                                   (reruns, reports)
//! ```
//!
//! - **RuleRegistry**: Rules bucketed by command-line matcher, in registration order
//! - **resolve**: Matches rules and expands `${group:name}` templates into actions
//! - **OutcomeTracker**: Judges whether the next command was one of the fixes
//! - **QuickFixController**: Drives decoration, menu and activation for one terminal
//! - **QuickFixConfig**: `quickfix.toml` switches and user-contributed rules

pub mod action;
pub mod builtin;
pub mod command;
pub mod config;
pub mod contribution;
pub mod controller;
pub mod outcome;
pub mod registry;
pub mod resolver;
pub mod rule;
pub mod surface;
pub mod telemetry;
pub mod template;

pub use action::{Activation, QuickFixAction, RerunRequest, UriOpener};
pub use command::{FinishedCommand, OutputAnchor, OutputMatch, OutputMatcher, TerminalCommand};
pub use config::QuickFixConfig;
pub use contribution::{ContributedQuickFix, RuleError};
pub use controller::{QuickFixController, QuickFixControllerBuilder};
pub use outcome::{OutcomeTracker, QuickFixReport};
pub use registry::RuleRegistry;
pub use resolver::{resolve, Resolution};
pub use rule::{CallbackCandidate, MatchResult, QuickFixProvider, QuickFixRule, RawCandidate, RuleKind};
pub use surface::{ActionSet, ActionWidget, DecorationId, Rect, ShowOptions, TerminalSurface};
pub use telemetry::TelemetryReporter;
