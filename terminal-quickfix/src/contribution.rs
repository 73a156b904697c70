//! Externally contributed quick fix descriptors.
//!
//! Extensions and the user's `quickfix.toml` describe rules as plain data.
//! Conversion into a [`QuickFixRule`] compiles the patterns and picks the
//! template kind: `command_to_run` wins over `link_to_open`.
//!
//! ```toml
//! [[rules]]
//! id = "npm.missing-script"
//! command_line_matcher = "npm run"
//! command_to_run = "npm run ${group:script}"
//! exit_status = false
//!
//! [rules.output_matcher]
//! line_matcher = "Did you mean (?<script>\\S+)\\?"
//! anchor = "bottom"
//! length = 5
//! ```

use crate::command::{OutputAnchor, OutputMatcher, DEFAULT_OUTPUT_WINDOW};
use crate::rule::{QuickFixRule, RuleSource};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Errors from converting a [`ContributedQuickFix`].
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("quick fix `{id}` has an invalid {field}: {source}")]
    InvalidPattern {
        id: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("quick fix `{id}` defines neither command_to_run nor link_to_open")]
    NoAction { id: String },
}

/// Output window description for a contributed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributedOutputMatcher {
    pub line_matcher: String,
    #[serde(default)]
    pub anchor: OutputAnchor,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_length")]
    pub length: usize,
}

fn default_length() -> usize {
    DEFAULT_OUTPUT_WINDOW
}

/// A rule descriptor supplied by an extension or configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributedQuickFix {
    pub id: String,
    pub command_line_matcher: String,
    #[serde(default)]
    pub output_matcher: Option<ContributedOutputMatcher>,
    #[serde(default)]
    pub command_to_run: Option<String>,
    #[serde(default)]
    pub link_to_open: Option<String>,
    /// `true` = only on success, `false` = only on failure.
    #[serde(default)]
    pub exit_status: Option<bool>,
    /// Contributing extension; `None` for rules from the config file.
    #[serde(default)]
    pub extension_identifier: Option<String>,
}

impl ContributedQuickFix {
    fn compile(&self, field: &'static str, pattern: &str) -> Result<Regex, RuleError> {
        Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            id: self.id.clone(),
            field,
            source,
        })
    }
}

impl TryFrom<&ContributedQuickFix> for QuickFixRule {
    type Error = RuleError;

    fn try_from(fix: &ContributedQuickFix) -> Result<Self, Self::Error> {
        let matcher = fix.compile("command_line_matcher", &fix.command_line_matcher)?;

        let mut rule = if let Some(command) = &fix.command_to_run {
            QuickFixRule::command(fix.id.clone(), matcher, command.clone())
        } else if let Some(link) = &fix.link_to_open {
            QuickFixRule::link(fix.id.clone(), matcher, link.clone())
        } else {
            return Err(RuleError::NoAction { id: fix.id.clone() });
        };

        if let Some(om) = &fix.output_matcher {
            let line_matcher = fix.compile("output_matcher", &om.line_matcher)?;
            rule = rule.with_output_matcher(
                OutputMatcher::new(line_matcher).anchored(om.anchor, om.offset, om.length),
            );
        }
        if let Some(success) = fix.exit_status {
            rule = rule.with_exit_status(success);
        }
        let source = fix
            .extension_identifier
            .clone()
            .unwrap_or_else(|| "config".to_string());
        Ok(rule.with_source(RuleSource::Contributed(source)))
    }
}

impl TryFrom<ContributedQuickFix> for QuickFixRule {
    type Error = RuleError;

    fn try_from(fix: ContributedQuickFix) -> Result<Self, Self::Error> {
        QuickFixRule::try_from(&fix)
    }
}

/// Convert descriptors in order, logging and skipping the invalid ones.
pub fn convert_all<'a>(fixes: impl IntoIterator<Item = &'a ContributedQuickFix>) -> Vec<QuickFixRule> {
    fixes
        .into_iter()
        .filter_map(|fix| match QuickFixRule::try_from(fix) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!("Skipping contributed quick fix: {e}");
                None
            }
        })
        .collect()
}
