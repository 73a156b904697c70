//! Host seams: the terminal surface that owns decorations and the action
//! widget that renders the quick fix menu.

use crate::action::QuickFixAction;

/// Handle to a gutter decoration registered on the terminal buffer.
pub type DecorationId = u64;

/// Screen rectangle of a decoration, in widget coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The terminal buffer the controller decorates.
pub trait TerminalSurface {
    /// Place a quick fix marker on the last command's line.
    ///
    /// `None` when the buffer has no marker capability right now.
    fn register_decoration(&mut self) -> Option<DecorationId>;

    /// Where the decoration is drawn, if it is currently rendered.
    fn decoration_rect(&self, id: DecorationId) -> Option<Rect>;

    fn dispose_decoration(&mut self, id: DecorationId);

    /// Return keyboard focus to the terminal.
    fn focus(&mut self);

    fn play_audio_cue(&mut self) {}
}

/// The menu widget showing quick fix actions.
pub trait ActionWidget {
    fn show(&mut self, anchor: Rect, actions: &ActionSet, options: ShowOptions);
    fn hide(&mut self);
    /// Ask the widget to preview the highlighted item.
    fn preview_selected(&mut self);
}

// ─── Menu projection ────────────────────────────────────────────────────

/// One menu row. `index` points back into the resolution's action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub tooltip: String,
    pub enabled: bool,
}

/// Documentation entry shown alongside an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documentation {
    pub id: String,
    pub title: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionSet {
    pub documentation: Vec<Documentation>,
    pub all_actions: Vec<ActionItem>,
    /// Enabled actions only.
    pub valid_actions: Vec<ActionItem>,
    pub has_auto_fix: bool,
}

impl ActionSet {
    pub fn from_actions(actions: &[QuickFixAction]) -> Self {
        let all_actions: Vec<ActionItem> = actions
            .iter()
            .enumerate()
            .map(|(index, action)| ActionItem {
                index,
                id: action.id().to_string(),
                label: action.label().to_string(),
                tooltip: action.tooltip().to_string(),
                enabled: action.enabled(),
            })
            .collect();
        let documentation = all_actions
            .iter()
            .map(|item| Documentation {
                id: item.id.clone(),
                title: item.label.clone(),
                tooltip: item.tooltip.clone(),
            })
            .collect();
        let valid_actions = all_actions.iter().filter(|a| a.enabled).cloned().collect();
        Self {
            documentation,
            all_actions,
            valid_actions,
            has_auto_fix: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.valid_actions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOptions {
    pub show_headers: bool,
    pub include_disabled_actions: bool,
    pub from_lightbulb: bool,
}

impl ShowOptions {
    /// Options for a menu opened from the gutter marker.
    pub fn lightbulb() -> Self {
        Self {
            show_headers: true,
            include_disabled_actions: false,
            from_lightbulb: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{CallbackCandidate, QuickFixRule, RawCandidate};
    use regex::Regex;

    #[test]
    fn disabled_actions_are_not_valid() {
        let rule = QuickFixRule::command("r", Regex::new("x").unwrap(), "y");
        let mut off = CallbackCandidate::new("off", "Off", || {});
        off.enabled = false;
        let actions = vec![
            QuickFixAction::from_candidate(
                &rule,
                RawCandidate::Command {
                    id: "r".into(),
                    command: "make clean".into(),
                    add_newline: true,
                },
            ),
            QuickFixAction::from_candidate(&rule, RawCandidate::Callback(off)),
        ];

        let set = ActionSet::from_actions(&actions);
        assert_eq!(set.all_actions.len(), 2);
        assert_eq!(set.valid_actions.len(), 1);
        assert_eq!(set.valid_actions[0].label, "Run: make clean");
        assert_eq!(set.documentation[1].title, "Off");
        assert!(!set.has_auto_fix);
    }
}
