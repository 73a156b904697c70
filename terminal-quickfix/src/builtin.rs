//! Built-in quick fix rules.
//!
//! - **Git Create Pr**: after a successful `git push`, open the "create pull
//!   request" link GitHub prints in the remote output.
//! - **Git Push Set Upstream**: after a failed `git push`, run the
//!   `--set-upstream` command git suggests.
//! - **Git Similar**: after git rejects a subcommand, offer each "most
//!   similar" subcommand it lists.
//! - **Free Port**: when a server fails with "address already in use", offer
//!   to free the port. Only available when the host can kill the listener.

use crate::command::{FinishedCommand, OutputAnchor, OutputMatcher};
use crate::rule::{CallbackCandidate, MatchResult, QuickFixRule, RawCandidate};
use regex::{NoExpand, Regex};
use std::rc::Rc;
use std::sync::OnceLock;

pub const GIT_SIMILAR_ID: &str = "Git Similar";
pub const GIT_PUSH_SET_UPSTREAM_ID: &str = "Git Push Set Upstream";
pub const GIT_CREATE_PR_ID: &str = "Git Create Pr";
pub const FREE_PORT_ID: &str = "Free Port";

const GIT_COMMAND_LINE: &str = r"git";
const GIT_PUSH_COMMAND_LINE: &str = r"git\s+push";
const ANY_COMMAND_LINE: &str = r".+";

const GIT_SIMILAR_OUTPUT: &str = r"most similar commands? (?:is|are)((?:\n[ \t]+\S+)+)";
const GIT_PUSH_OUTPUT: &str = r"git push --set-upstream origin (?<branchName>[^\s]+)";
const GIT_CREATE_PR_OUTPUT: &str = r"remote:\s*(?<link>https://github\.com/.+/.+/pull/new/.+)";
const FREE_PORT_OUTPUT: &str = concat!(
    r"address already in use (?:0\.0\.0\.0|127\.0\.0\.1|localhost|::):(?<portNumber>\d{4,5})",
    r"|Unable to bind [^ ]*:(?<bindPort>\d{4,5})",
    r"|can't listen on port (?<listenPort>\d{4,5})",
    r"|listen EADDRINUSE [^ ]*:(?<eaddrinusePort>\d{4,5})",
);
const FREE_PORT_GROUPS: [&str; 4] = ["portNumber", "bindPort", "listenPort", "eaddrinusePort"];

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid regex")
}

fn git_subcommand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"git\s+\S+"))
}

/// Open GitHub's "create pull request" link after a successful push.
pub fn git_create_pr() -> QuickFixRule {
    QuickFixRule::link(GIT_CREATE_PR_ID, pattern(GIT_PUSH_COMMAND_LINE), "${group:link}")
        .with_output_matcher(
            OutputMatcher::new(pattern(GIT_CREATE_PR_OUTPUT)).anchored(OutputAnchor::Bottom, 4, 12),
        )
        .with_exit_status(true)
}

/// Run the `git push --set-upstream` command git prints for a new branch.
pub fn git_push_set_upstream() -> QuickFixRule {
    QuickFixRule::command(
        GIT_PUSH_SET_UPSTREAM_ID,
        pattern(GIT_PUSH_COMMAND_LINE),
        "git push --set-upstream origin ${group:branchName}",
    )
    .with_output_matcher(
        OutputMatcher::new(pattern(GIT_PUSH_OUTPUT)).anchored(OutputAnchor::Bottom, 0, 8),
    )
    .with_exit_status(false)
}

/// Offer each subcommand git lists after "The most similar command(s)".
pub fn git_similar() -> QuickFixRule {
    QuickFixRule::callback(GIT_SIMILAR_ID, pattern(GIT_COMMAND_LINE), similar_commands)
        .with_output_matcher(
            OutputMatcher::new(pattern(GIT_SIMILAR_OUTPUT)).anchored(OutputAnchor::Bottom, 0, 10),
        )
        .with_exit_status(false)
}

fn similar_commands(matches: &MatchResult<'_>, _command: &dyn FinishedCommand) -> Vec<RawCandidate> {
    let Some(output) = &matches.output_match else {
        return Vec::new();
    };
    // First line is the "most similar ..." header, the rest are suggestions.
    output
        .text
        .split('\n')
        .skip(1)
        .map(str::trim)
        .filter(|fixed| !fixed.is_empty())
        .map(|fixed| RawCandidate::Command {
            id: GIT_SIMILAR_ID.to_string(),
            command: git_subcommand_re()
                .replace(matches.command_line, NoExpand(&format!("git {fixed}")))
                .into_owned(),
            add_newline: true,
        })
        .collect()
}

/// Offer to free a port that a failed command could not bind.
///
/// `free_port` is called with the port number when the user picks the fix.
pub fn free_port(free_port: Rc<dyn Fn(u16)>) -> QuickFixRule {
    QuickFixRule::callback(
        FREE_PORT_ID,
        pattern(ANY_COMMAND_LINE),
        move |matches: &MatchResult<'_>, _: &dyn FinishedCommand| -> Vec<RawCandidate> {
            let Some(output) = &matches.output_match else {
                return Vec::new();
            };
            let Some(port) = FREE_PORT_GROUPS
                .iter()
                .find_map(|name| output.group(name))
                .and_then(|p| p.parse::<u16>().ok())
            else {
                return Vec::new();
            };
            let handler = Rc::clone(&free_port);
            let mut candidate = CallbackCandidate::new(FREE_PORT_ID, format!("Free port {port}"), move || {
                handler(port)
            });
            candidate.tooltip = Some(format!("Kill the process listening on port {port}"));
            vec![RawCandidate::Callback(candidate)]
        },
    )
    .with_output_matcher(
        OutputMatcher::new(pattern(FREE_PORT_OUTPUT)).anchored(OutputAnchor::Bottom, 0, 30),
    )
    .with_exit_status(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Activation, UriOpener};
    use crate::registry::RuleRegistry;
    use crate::resolver::resolve;
    use crate::command::TerminalCommand;
    use std::cell::Cell;
    use url::Url;

    struct NoopOpener;

    impl UriOpener for NoopOpener {
        fn open(&self, _uri: &Url) {}
    }

    fn registry(rules: impl IntoIterator<Item = QuickFixRule>) -> RuleRegistry {
        let mut reg = RuleRegistry::new();
        reg.register_all(rules);
        reg
    }

    #[test]
    fn set_upstream_from_push_failure() {
        let reg = registry([git_push_set_upstream()]);
        let cmd = TerminalCommand::new("git push", Some(128)).with_output(
            "fatal: The current branch feat/login has no upstream branch.\n\
             To push the current branch and set the remote as upstream, use\n\
             \n\
             \x20   git push --set-upstream origin feat/login\n",
        );
        let res = resolve(&cmd, &reg).unwrap();
        assert_eq!(
            res.actions()[0].command(),
            Some("git push --set-upstream origin feat/login")
        );
    }

    #[test]
    fn create_pr_link_after_successful_push() {
        let reg = registry([git_create_pr(), git_push_set_upstream()]);
        let cmd = TerminalCommand::new("git push -u origin topic", Some(0)).with_output(
            "Enumerating objects: 5, done.\n\
             remote:\n\
             remote: Create a pull request for 'topic' on GitHub by visiting:\n\
             remote:      https://github.com/owner/repo/pull/new/topic\n\
             remote:\n\
             To github.com:owner/repo.git\n\
             \x20* [new branch]      topic -> topic\n\
             branch 'topic' set up to track 'origin/topic'.\n\
             \n",
        );
        let res = resolve(&cmd, &reg).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(
            res.actions()[0].uri().map(Url::as_str),
            Some("https://github.com/owner/repo/pull/new/topic")
        );
        assert!(res.expected_commands().is_empty());
    }

    #[test]
    fn similar_single_suggestion() {
        let reg = registry([git_similar()]);
        let cmd = TerminalCommand::new("git stauts -s", Some(1)).with_output(
            "git: 'stauts' is not a git command. See 'git --help'.\n\
             \n\
             The most similar command is\n\
             \tstatus",
        );
        let res = resolve(&cmd, &reg).unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res.actions()[0].command(), Some("git status -s"));
    }

    #[test]
    fn similar_multiple_suggestions() {
        let reg = registry([git_similar()]);
        let cmd = TerminalCommand::new("git pu", Some(1)).with_output(
            "git: 'pu' is not a git command. See 'git --help'.\n\
             \n\
             The most similar commands are\n\
             \tpull\n\
             \tpush",
        );
        let res = resolve(&cmd, &reg).unwrap();
        let commands: Vec<&str> = res.actions().iter().filter_map(|a| a.command()).collect();
        assert_eq!(commands, vec!["git pull", "git push"]);
        assert_eq!(res.fix_id(), "Git SimilarGit Similar");
    }

    #[test]
    fn similar_stops_at_unindented_line() {
        let reg = registry([git_similar()]);
        let cmd = TerminalCommand::new("git stauts", Some(1)).with_output(
            "git: 'stauts' is not a git command. See 'git --help'.\n\
             \n\
             The most similar command is\n\
             \tstatus\n\
             error: something else",
        );
        let res = resolve(&cmd, &reg).unwrap();
        let commands: Vec<&str> = res.actions().iter().filter_map(|a| a.command()).collect();
        assert_eq!(commands, vec!["git status"]);
        assert_eq!(res.expected_commands().len(), 1);
    }

    #[test]
    fn similar_ignores_successful_commands() {
        let reg = registry([git_similar()]);
        let cmd = TerminalCommand::new("git log", Some(0))
            .with_output("The most similar command is\n\tlog");
        assert!(resolve(&cmd, &reg).is_none());
    }

    #[test]
    fn free_port_invokes_handler() {
        let freed = Rc::new(Cell::new(0u16));
        let sink = Rc::clone(&freed);
        let reg = registry([free_port(Rc::new(move |port| sink.set(port)))]);
        let cmd = TerminalCommand::new("npm start", Some(1))
            .with_output("Error: listen EADDRINUSE: address already in use :::3000");

        let mut res = resolve(&cmd, &reg).unwrap();
        assert_eq!(res.actions()[0].label(), "Free port 3000");
        assert_eq!(
            res.run(0, &NoopOpener),
            Some(Activation::Completed {
                fired_id: FREE_PORT_ID.into()
            })
        );
        assert_eq!(freed.get(), 3000);
    }

    #[test]
    fn free_port_reads_any_alternative() {
        let reg = registry([free_port(Rc::new(|_: u16| {}))]);
        let cmd = TerminalCommand::new("python -m http.server 8000", Some(1))
            .with_output("OSError: Unable to bind 0.0.0.0:8000");
        let res = resolve(&cmd, &reg).unwrap();
        assert_eq!(res.actions()[0].label(), "Free port 8000");
    }
}
