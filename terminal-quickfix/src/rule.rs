//! Quick fix rule definitions and candidate production.
//!
//! A [`QuickFixRule`] pairs a command-line regex with one of three shapes
//! ([`RuleKind`]). Template kinds resolve `${group:<name>}` placeholders
//! themselves; callback kinds hand the match to a [`QuickFixProvider`].
//! Either way the output is a list of [`RawCandidate`]s, which the resolver
//! turns into actions.

use crate::command::{named_groups, FinishedCommand, OutputMatch, OutputMatcher};
use crate::template;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

// ─── Match input ────────────────────────────────────────────────────────

/// What a rule matched against a finished command.
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// The full command line.
    pub command_line: &'a str,
    /// Captures of the rule's command-line matcher.
    pub command_line_match: Captures<'a>,
    /// Output match, when the rule has an output matcher and it hit.
    pub output_match: Option<OutputMatch>,
}

// ─── Raw candidates ─────────────────────────────────────────────────────

/// A free-form action produced by a callback rule.
pub struct CallbackCandidate {
    pub id: String,
    pub label: String,
    pub tooltip: Option<String>,
    pub enabled: bool,
    pub run: Box<dyn FnMut()>,
}

impl CallbackCandidate {
    pub fn new(id: impl Into<String>, label: impl Into<String>, run: impl FnMut() + 'static) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tooltip: None,
            enabled: true,
            run: Box::new(run),
        }
    }
}

impl fmt::Debug for CallbackCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackCandidate")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("tooltip", &self.tooltip)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// One unmaterialized suggestion.
#[derive(Debug)]
pub enum RawCandidate {
    /// Re-run a (corrected) command line.
    Command {
        id: String,
        command: String,
        add_newline: bool,
    },
    /// Open a link.
    Link { uri: Url },
    /// Run arbitrary host code.
    Callback(CallbackCandidate),
}

/// Produces candidates for a callback rule.
///
/// An empty `Vec` means "nothing to suggest"; providers never fail.
pub trait QuickFixProvider {
    fn provide(&self, matches: &MatchResult<'_>, command: &dyn FinishedCommand) -> Vec<RawCandidate>;
}

impl<F> QuickFixProvider for F
where
    F: Fn(&MatchResult<'_>, &dyn FinishedCommand) -> Vec<RawCandidate>,
{
    fn provide(&self, matches: &MatchResult<'_>, command: &dyn FinishedCommand) -> Vec<RawCandidate> {
        self(matches, command)
    }
}

// ─── QuickFixRule ───────────────────────────────────────────────────────

/// How a rule turns a match into candidates.
pub enum RuleKind {
    /// Substitute groups into a command line.
    CommandTemplate { template: String, add_newline: bool },
    /// Substitute groups into a URL.
    LinkTemplate { template: String },
    /// Delegate to host code.
    Callback(Box<dyn QuickFixProvider>),
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandTemplate {
                template,
                add_newline,
            } => f
                .debug_struct("CommandTemplate")
                .field("template", template)
                .field("add_newline", add_newline)
                .finish(),
            Self::LinkTemplate { template } => f
                .debug_struct("LinkTemplate")
                .field("template", template)
                .finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Where a rule came from. Diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Builtin,
    /// Contributed by an extension or the user's config file.
    Contributed(String),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => write!(f, "builtin"),
            Self::Contributed(id) => write!(f, "{id}"),
        }
    }
}

/// A registered quick fix rule. Immutable after registration.
#[derive(Debug)]
pub struct QuickFixRule {
    pub id: String,
    pub command_line_matcher: Regex,
    pub output_matcher: Option<OutputMatcher>,
    /// When set, the rule only applies if `exit code == 0` equals this value.
    pub exit_status: Option<bool>,
    pub kind: RuleKind,
    pub source: RuleSource,
}

impl QuickFixRule {
    fn with_kind(id: impl Into<String>, command_line_matcher: Regex, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            command_line_matcher,
            output_matcher: None,
            exit_status: None,
            kind,
            source: RuleSource::Builtin,
        }
    }

    /// A command-template rule. The resolved command is submitted with a
    /// trailing newline.
    pub fn command(id: impl Into<String>, command_line_matcher: Regex, template: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            command_line_matcher,
            RuleKind::CommandTemplate {
                template: template.into(),
                add_newline: true,
            },
        )
    }

    /// A link-template rule.
    pub fn link(id: impl Into<String>, command_line_matcher: Regex, template: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            command_line_matcher,
            RuleKind::LinkTemplate {
                template: template.into(),
            },
        )
    }

    /// A callback rule.
    pub fn callback(
        id: impl Into<String>,
        command_line_matcher: Regex,
        provider: impl QuickFixProvider + 'static,
    ) -> Self {
        Self::with_kind(id, command_line_matcher, RuleKind::Callback(Box::new(provider)))
    }

    #[must_use]
    pub fn with_output_matcher(mut self, matcher: OutputMatcher) -> Self {
        self.output_matcher = Some(matcher);
        self
    }

    #[must_use]
    pub fn with_exit_status(mut self, success: bool) -> Self {
        self.exit_status = Some(success);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: RuleSource) -> Self {
        self.source = source;
        self
    }

    /// Registry key: the matcher's pattern text.
    pub fn key(&self) -> &str {
        self.command_line_matcher.as_str()
    }

    /// Whether the exit-status filter admits a command with this outcome.
    pub fn accepts_exit(&self, succeeded: bool) -> bool {
        self.exit_status.map_or(true, |wanted| wanted == succeeded)
    }

    /// Produce raw candidates for a match.
    pub fn candidates(&self, matches: &MatchResult<'_>, command: &dyn FinishedCommand) -> Vec<RawCandidate> {
        match &self.kind {
            RuleKind::CommandTemplate {
                template,
                add_newline,
            } => self
                .resolve_template(template, matches)
                .map(|command| RawCandidate::Command {
                    id: self.id.clone(),
                    command,
                    add_newline: *add_newline,
                })
                .into_iter()
                .collect(),
            RuleKind::LinkTemplate { template } => {
                let Some(link) = self.resolve_template(template, matches) else {
                    return Vec::new();
                };
                match Url::parse(&link) {
                    Ok(uri) => vec![RawCandidate::Link { uri }],
                    Err(e) => {
                        tracing::debug!("Quick fix {} resolved an invalid link {link}: {e}", self.id);
                        Vec::new()
                    }
                }
            }
            RuleKind::Callback(provider) => provider.provide(matches, command),
        }
    }

    /// Groups used for template substitution: the output match when the rule
    /// has an output matcher, otherwise the command-line match.
    fn template_groups(&self, matches: &MatchResult<'_>) -> Option<BTreeMap<String, String>> {
        if self.output_matcher.is_some() {
            matches.output_match.as_ref().map(|m| m.groups.clone())
        } else {
            Some(named_groups(
                &self.command_line_matcher,
                &matches.command_line_match,
            ))
        }
    }

    fn resolve_template(&self, template: &str, matches: &MatchResult<'_>) -> Option<String> {
        let groups = self.template_groups(matches)?;
        template::substitute(template, &groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::TerminalCommand;

    fn candidates_for(rule: &QuickFixRule, cmd: &TerminalCommand) -> Vec<RawCandidate> {
        let caps = rule
            .command_line_matcher
            .captures(&cmd.command)
            .expect("command line matches");
        let output_match = rule
            .output_matcher
            .as_ref()
            .and_then(|m| cmd.output_match(m));
        let matches = MatchResult {
            command_line: &cmd.command,
            command_line_match: caps,
            output_match,
        };
        rule.candidates(&matches, cmd)
    }

    #[test]
    fn command_template_uses_output_groups() {
        let rule = QuickFixRule::command(
            "upstream",
            Regex::new(r"git\s+push").unwrap(),
            "git push --set-upstream origin ${group:branch}",
        )
        .with_output_matcher(OutputMatcher::new(
            Regex::new(r"--set-upstream origin (?<branch>\S+)").unwrap(),
        ));
        let cmd = TerminalCommand::new("git push", Some(128))
            .with_output("fatal: no upstream\n    git push --set-upstream origin feat/x");

        let out = candidates_for(&rule, &cmd);
        assert_eq!(out.len(), 1);
        match &out[0] {
            RawCandidate::Command {
                id,
                command,
                add_newline,
            } => {
                assert_eq!(id, "upstream");
                assert_eq!(command, "git push --set-upstream origin feat/x");
                assert!(*add_newline);
            }
            other => panic!("unexpected candidate {other:?}"),
        }
    }

    #[test]
    fn output_matcher_miss_yields_nothing() {
        let rule = QuickFixRule::command("r", Regex::new("make").unwrap(), "make ${group:t}")
            .with_output_matcher(OutputMatcher::new(Regex::new(r"target (?<t>\w+)").unwrap()));
        let cmd = TerminalCommand::new("make", Some(2)).with_output("nothing to see");
        assert!(candidates_for(&rule, &cmd).is_empty());
    }

    #[test]
    fn template_without_output_matcher_uses_command_line_groups() {
        let rule = QuickFixRule::command(
            "sudo",
            Regex::new(r"^apt (?<rest>.+)$").unwrap(),
            "sudo apt ${group:rest}",
        );
        let cmd = TerminalCommand::new("apt install jq", Some(100));
        match candidates_for(&rule, &cmd).as_slice() {
            [RawCandidate::Command { command, .. }] => assert_eq!(command, "sudo apt install jq"),
            other => panic!("unexpected candidates {other:?}"),
        }
    }

    #[test]
    fn link_template_resolves_to_url() {
        let rule = QuickFixRule::link(
            "issue",
            Regex::new("gh").unwrap(),
            "https://example.com/issues/${group:id}",
        )
        .with_output_matcher(OutputMatcher::new(Regex::new(r"issue #(?<id>\d+)").unwrap()));
        let cmd = TerminalCommand::new("gh issue view", Some(1)).with_output("see issue #42");

        match candidates_for(&rule, &cmd).as_slice() {
            [RawCandidate::Link { uri }] => assert_eq!(uri.as_str(), "https://example.com/issues/42"),
            other => panic!("unexpected candidates {other:?}"),
        }
    }

    #[test]
    fn unparsable_link_yields_nothing() {
        let rule = QuickFixRule::link("bad", Regex::new("x").unwrap(), "${group:path}")
            .with_output_matcher(OutputMatcher::new(Regex::new(r"(?<path>/tmp/\S+)").unwrap()));
        let cmd = TerminalCommand::new("x", Some(1)).with_output("/tmp/file");
        assert!(candidates_for(&rule, &cmd).is_empty());
    }

    #[test]
    fn callback_rule_delegates_to_provider() {
        let rule = QuickFixRule::callback(
            "cb",
            Regex::new("cargo").unwrap(),
            |m: &MatchResult<'_>, _: &dyn FinishedCommand| {
                vec![RawCandidate::Callback(CallbackCandidate::new(
                    "cb.action",
                    format!("Fix {}", m.command_line),
                    || {},
                ))]
            },
        );
        let cmd = TerminalCommand::new("cargo build", Some(101));
        match candidates_for(&rule, &cmd).as_slice() {
            [RawCandidate::Callback(c)] => {
                assert_eq!(c.id, "cb.action");
                assert_eq!(c.label, "Fix cargo build");
                assert!(c.enabled);
            }
            other => panic!("unexpected candidates {other:?}"),
        }
    }

    #[test]
    fn exit_filter() {
        let any = QuickFixRule::command("a", Regex::new("x").unwrap(), "y");
        assert!(any.accepts_exit(true));
        assert!(any.accepts_exit(false));

        let on_failure = QuickFixRule::command("f", Regex::new("x").unwrap(), "y").with_exit_status(false);
        assert!(!on_failure.accepts_exit(true));
        assert!(on_failure.accepts_exit(false));
    }

    #[test]
    fn key_is_pattern_text() {
        let rule = QuickFixRule::command("a", Regex::new(r"git\s+push").unwrap(), "y");
        assert_eq!(rule.key(), r"git\s+push");
        assert_eq!(rule.source.to_string(), "builtin");
    }
}
