//! Finished commands and output-window matching.
//!
//! The terminal's command tracking hands us a [`FinishedCommand`] once a shell
//! command completes (OSC 133;D or equivalent). Rules never see the whole
//! scrollback: an [`OutputMatcher`] selects a bounded window of output lines,
//! joins it with `\n` and runs its regex once over that text.
//!
//! ```text
//!  line 0   ┐
//!  line 1   │ anchor = top, offset = 1, length = 2  →  lines 1..3
//!  line 2   ┘
//!  ...
//!  line n-3 ┐
//!  line n-2 │ anchor = bottom, offset = 1, length = 2  →  lines n-3..n-1
//!  line n-1 ┘
//! ```

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of lines searched when a matcher does not say otherwise.
pub const DEFAULT_OUTPUT_WINDOW: usize = 20;

// ─── OutputMatcher ──────────────────────────────────────────────────────

/// Which end of the captured output a window is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputAnchor {
    Top,
    #[default]
    Bottom,
}

/// A regex plus the window of output lines it is tested against.
#[derive(Debug, Clone)]
pub struct OutputMatcher {
    /// Pattern applied to the joined window text. May span lines.
    pub line_matcher: Regex,
    pub anchor: OutputAnchor,
    /// Lines skipped from the anchored end before the window starts.
    pub offset: usize,
    /// Maximum number of lines in the window.
    pub length: usize,
}

impl OutputMatcher {
    /// Bottom-anchored matcher over the last [`DEFAULT_OUTPUT_WINDOW`] lines.
    pub fn new(line_matcher: Regex) -> Self {
        Self {
            line_matcher,
            anchor: OutputAnchor::Bottom,
            offset: 0,
            length: DEFAULT_OUTPUT_WINDOW,
        }
    }

    /// Replace the search window.
    #[must_use]
    pub fn anchored(mut self, anchor: OutputAnchor, offset: usize, length: usize) -> Self {
        self.anchor = anchor;
        self.offset = offset;
        self.length = length;
        self
    }

    /// The slice of `lines` this matcher searches.
    pub fn window<'a>(&self, lines: &'a [String]) -> &'a [String] {
        let total = lines.len();
        match self.anchor {
            OutputAnchor::Top => {
                let start = self.offset.min(total);
                let end = start.saturating_add(self.length).min(total);
                &lines[start..end]
            }
            OutputAnchor::Bottom => {
                let end = total.saturating_sub(self.offset);
                let start = end.saturating_sub(self.length);
                &lines[start..end]
            }
        }
    }

    /// Search the window of `lines`, returning the first match.
    pub fn find(&self, lines: &[String]) -> Option<OutputMatch> {
        let window = self.window(lines);
        if window.is_empty() {
            return None;
        }
        let text = window.join("\n");
        let caps = self.line_matcher.captures(&text)?;
        Some(OutputMatch {
            text: caps
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            groups: named_groups(&self.line_matcher, &caps),
        })
    }
}

// ─── OutputMatch ────────────────────────────────────────────────────────

/// Owned result of an [`OutputMatcher`] hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputMatch {
    /// The full matched text (may contain `\n`).
    pub text: String,
    /// Named capture groups that participated in the match.
    pub groups: BTreeMap<String, String>,
}

impl OutputMatch {
    pub fn group(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(String::as_str)
    }
}

/// Collect the named groups of `re` that participated in `caps`.
///
/// Optional groups that did not match are left out, so a template that
/// references them fails to resolve.
pub fn named_groups(re: &Regex, caps: &Captures<'_>) -> BTreeMap<String, String> {
    re.capture_names()
        .flatten()
        .filter_map(|name| {
            caps.name(name)
                .map(|m| (name.to_string(), m.as_str().to_string()))
        })
        .collect()
}

// ─── FinishedCommand ────────────────────────────────────────────────────

/// Read-only view of a command the shell has finished running.
pub trait FinishedCommand {
    /// The command line as typed by the user.
    fn command_line(&self) -> &str;

    /// Exit code, if the shell integration reported one.
    fn exit_code(&self) -> Option<i32>;

    /// Run `matcher` over this command's output window.
    fn output_match(&self, matcher: &OutputMatcher) -> Option<OutputMatch>;

    /// A missing exit code counts as failure.
    fn succeeded(&self) -> bool {
        self.exit_code() == Some(0)
    }
}

/// A finished command with its captured output held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalCommand {
    pub command: String,
    pub exit_code: Option<i32>,
    /// Output lines, oldest first, without trailing newlines.
    pub output: Vec<String>,
}

impl TerminalCommand {
    pub fn new(command: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            command: command.into(),
            exit_code,
            output: Vec::new(),
        }
    }

    /// Attach output text, split into lines.
    #[must_use]
    pub fn with_output(mut self, text: &str) -> Self {
        self.output = text.lines().map(str::to_string).collect();
        self
    }
}

impl FinishedCommand for TerminalCommand {
    fn command_line(&self) -> &str {
        &self.command
    }

    fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    fn output_match(&self, matcher: &OutputMatcher) -> Option<OutputMatch> {
        matcher.find(&self.output)
    }
}
