//! Per-terminal quick fix coordinator.
//!
//! Ties the registry, resolver and outcome tracker to the terminal's command
//! lifecycle:
//!
//! ```text
//!  command finished ──▶ report outcome ──▶ resolve ──▶ pending
//!  command started  ──▶ dispose marker ──▶ decorate pending
//!  marker clicked   ──▶ show menu
//!  item selected    ──▶ run action ──▶ rerun request | report + dispose
//! ```
//!
//! Decoration is deferred to the next command start because the buffer is
//! not ready for a marker when the finish event arrives.

use crate::action::{Activation, RerunRequest, UriOpener};
use crate::builtin;
use crate::command::FinishedCommand;
use crate::config::QuickFixConfig;
use crate::outcome::{OutcomeTracker, QuickFixReport};
use crate::registry::RuleRegistry;
use crate::resolver::{resolve, Resolution};
use crate::rule::QuickFixRule;
use crate::surface::{ActionSet, ActionWidget, DecorationId, ShowOptions, TerminalSurface};
use crate::telemetry::TelemetryReporter;
use std::rc::Rc;

/// A marker on the terminal and the fix-set it opens.
#[derive(Debug)]
struct ActiveDecoration {
    id: DecorationId,
    resolution: Resolution,
}

// ─── Builder ────────────────────────────────────────────────────────────

/// Collects the rule sources for a [`QuickFixController`].
pub struct QuickFixControllerBuilder {
    config: QuickFixConfig,
    contributions: Vec<QuickFixRule>,
    free_port: Option<Rc<dyn Fn(u16)>>,
    telemetry: Option<flume::Sender<QuickFixReport>>,
}

impl QuickFixControllerBuilder {
    pub fn new(config: QuickFixConfig) -> Self {
        Self {
            config,
            contributions: Vec::new(),
            free_port: None,
            telemetry: None,
        }
    }

    /// Add an extension-contributed rule. Registered after the configured ones.
    #[must_use]
    pub fn contribute(mut self, rule: QuickFixRule) -> Self {
        self.contributions.push(rule);
        self
    }

    /// Enable the free-port rule, calling `handler` with the port to free.
    #[must_use]
    pub fn free_port_handler(mut self, handler: impl Fn(u16) + 'static) -> Self {
        self.free_port = Some(Rc::new(handler));
        self
    }

    #[must_use]
    pub fn telemetry(mut self, tx: flume::Sender<QuickFixReport>) -> Self {
        self.telemetry = Some(tx);
        self
    }

    pub fn build<S, W, O>(self, widget: W, opener: O) -> QuickFixController<S, W, O>
    where
        S: TerminalSurface,
        W: ActionWidget,
        O: UriOpener,
    {
        let mut registry = RuleRegistry::new();
        if self.config.builtin_rules {
            registry.register(builtin::git_create_pr());
            registry.register(builtin::git_push_set_upstream());
        }
        registry.register_all(self.config.contributed_rules());
        registry.register_all(self.contributions);
        if self.config.builtin_rules {
            registry.register(builtin::git_similar());
        }
        if let Some(handler) = self.free_port {
            registry.register(builtin::free_port(handler));
        }

        let telemetry = match self.telemetry {
            Some(tx) if self.config.telemetry => TelemetryReporter::new(tx),
            _ => TelemetryReporter::disabled(),
        };
        tracing::debug!("Quick fixes ready with {} rule(s)", registry.len());

        QuickFixController {
            enabled: self.config.enabled,
            audio_cue: self.config.audio_cue,
            registry,
            tracker: OutcomeTracker::new(),
            telemetry,
            pending: None,
            decoration: None,
            surface: None,
            widget,
            opener,
            rerun_tx: None,
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────────

pub struct QuickFixController<S, W, O> {
    enabled: bool,
    audio_cue: bool,
    registry: RuleRegistry,
    tracker: OutcomeTracker,
    telemetry: TelemetryReporter,
    /// Resolved on command finish, waiting for the next command start.
    pending: Option<Resolution>,
    decoration: Option<ActiveDecoration>,
    surface: Option<S>,
    widget: W,
    opener: O,
    /// Set once the host asks for rerun requests; until then they are dropped.
    rerun_tx: Option<flume::Sender<RerunRequest>>,
}

impl<S, W, O> QuickFixController<S, W, O>
where
    S: TerminalSurface,
    W: ActionWidget,
    O: UriOpener,
{
    /// Attach the terminal buffer. Until then nothing is decorated.
    pub fn attach(&mut self, surface: S) {
        self.surface = Some(surface);
    }

    pub fn register_rule(&mut self, rule: QuickFixRule) {
        self.registry.register(rule);
    }

    /// Commands the user picked, to be written to the terminal.
    ///
    /// The controller keeps no receiver of its own: requests made before this
    /// is called, or after the receiver is dropped, are discarded. Calling it
    /// again replaces the previous channel.
    pub fn rerun_requests(&mut self) -> flume::Receiver<RerunRequest> {
        let (tx, rx) = flume::unbounded();
        self.rerun_tx = Some(tx);
        rx
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &OutcomeTracker {
        &self.tracker
    }

    pub fn pending(&self) -> Option<&Resolution> {
        self.pending.as_ref()
    }

    /// The fix-set behind the displayed marker.
    pub fn decorated(&self) -> Option<&Resolution> {
        self.decoration.as_ref().map(|d| &d.resolution)
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn on_command_finished(&mut self, command: &dyn FinishedCommand) {
        let command_line = command.command_line();
        if let Some(report) = self.tracker.on_command_finished(command_line) {
            self.telemetry.report(report);
        }
        if !command_line.is_empty() {
            self.dispose_quick_fix();
        }
        self.pending = if self.enabled {
            resolve(command, &self.registry)
        } else {
            None
        };
        if let Some(resolution) = &self.pending {
            self.tracker.arm(resolution);
        }
    }

    pub fn on_command_started(&mut self) {
        self.dispose_quick_fix();
        let Some(resolution) = self.pending.take() else {
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            tracing::trace!("No terminal surface attached; dropping quick fixes");
            return;
        };
        let Some(id) = surface.register_decoration() else {
            tracing::trace!("Terminal refused the quick fix marker");
            return;
        };
        if self.audio_cue {
            surface.play_audio_cue();
        }
        self.decoration = Some(ActiveDecoration { id, resolution });
    }

    /// Open the menu for the displayed marker. Returns whether it was shown.
    pub fn show_menu(&mut self) -> bool {
        self.tracker.mark_shown();
        let (Some(active), Some(surface)) = (&self.decoration, &self.surface) else {
            return false;
        };
        let Some(anchor) = surface.decoration_rect(active.id) else {
            return false;
        };
        let actions = ActionSet::from_actions(active.resolution.actions());
        self.widget.show(anchor, &actions, ShowOptions::lightbulb());
        true
    }

    /// The user picked a menu item, or highlighted it when `preview`.
    ///
    /// `index` is [`ActionItem::index`](crate::surface::ActionItem::index), a
    /// position in `all_actions`. It is not the row within `valid_actions`,
    /// which leaves out disabled items.
    pub fn on_action_selected(&mut self, index: usize, preview: bool) -> Option<Activation> {
        if preview {
            self.widget.preview_selected();
            return None;
        }
        let activation = self
            .decoration
            .as_mut()
            .and_then(|active| active.resolution.run(index, &self.opener));
        match &activation {
            Some(Activation::Rerun(request)) => {
                tracing::debug!("Rerunning quick fix command `{}`", request.command);
                match &self.rerun_tx {
                    Some(tx) if tx.send(request.clone()).is_ok() => {}
                    _ => tracing::debug!("No listener for quick fix rerun requests"),
                }
            }
            Some(Activation::Completed { fired_id }) => {
                if let Some(report) = self.tracker.on_action_completed(fired_id) {
                    self.telemetry.report(report);
                }
                self.dispose_quick_fix();
            }
            Some(Activation::AlreadyConsumed | Activation::Disabled) | None => {}
        }
        self.widget.hide();
        activation
    }

    pub fn on_widget_hidden(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.focus();
        }
    }

    fn dispose_quick_fix(&mut self) {
        let Some(active) = self.decoration.take() else {
            return;
        };
        if let Some(surface) = self.surface.as_mut() {
            surface.dispose_decoration(active.id);
        }
    }
}
