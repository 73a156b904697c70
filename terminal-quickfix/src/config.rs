//! Quick fix configuration from `quickfix.toml`.
//!
//! ```toml
//! enabled = true
//! builtin_rules = true
//! audio_cue = false
//!
//! [[rules]]
//! id = "cargo.add"
//! command_line_matcher = "cargo (build|run)"
//! command_to_run = "cargo add ${group:krate}"
//! exit_status = false
//!
//! [rules.output_matcher]
//! line_matcher = "use of undeclared crate or module `(?<krate>\\w+)`"
//! ```

use crate::contribution::{self, ContributedQuickFix};
use crate::rule::QuickFixRule;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickFixConfig {
    /// When false, finished commands are still tracked but never resolved.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Register the built-in git rules.
    #[serde(default = "default_true")]
    pub builtin_rules: bool,

    /// Play the audio cue when a quick fix marker appears.
    #[serde(default = "default_true")]
    pub audio_cue: bool,

    /// Forward outcome reports to the telemetry channel.
    #[serde(default = "default_true")]
    pub telemetry: bool,

    /// User-contributed rules.
    #[serde(default)]
    pub rules: Vec<ContributedQuickFix>,
}

impl Default for QuickFixConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            builtin_rules: true,
            audio_cue: true,
            telemetry: true,
            rules: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// `<config_dir>/terminal-quickfix/quickfix.toml`.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("terminal-quickfix")
        .join("quickfix.toml")
}

impl QuickFixConfig {
    /// Load configuration from the default config file.
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Load configuration from `path`, falling back to defaults.
    ///
    /// A missing file is silent; an unreadable or malformed one is logged.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring quick fix config {}: {e:#}", path.display());
                Self::default()
            }
        }
    }

    pub fn try_load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Compile the configured rules, skipping invalid ones.
    pub fn contributed_rules(&self) -> Vec<QuickFixRule> {
        contribution::convert_all(&self.rules)
    }
}
