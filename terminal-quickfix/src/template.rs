//! `${group:<name>}` placeholder substitution for command and link templates.
//!
//! A template resolves only if every placeholder names a captured group.
//! Partially substituted text is never returned: a shell must not receive a
//! literal `${group:...}` string.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{group:([^}]*)\}").expect("valid regex"))
}

/// Group names referenced by `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    placeholder_re()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Replace every placeholder in `template` with its captured value.
///
/// Returns `None` when a placeholder has no captured group or the result is
/// empty.
pub fn substitute(template: &str, groups: &BTreeMap<String, String>) -> Option<String> {
    if let Some(name) = placeholders(template)
        .into_iter()
        .find(|name| !groups.contains_key(*name))
    {
        tracing::trace!("Template `{template}` references uncaptured group {name}");
        return None;
    }
    let resolved = placeholder_re().replace_all(template, |caps: &Captures<'_>| {
        groups.get(&caps[1]).cloned().unwrap_or_default()
    });
    if resolved.is_empty() {
        return None;
    }
    Some(resolved.into_owned())
}
