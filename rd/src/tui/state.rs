//! TUI application state
//!
//! Presentation-only data: focus, selection, scroll offsets and overlays.
//! The conversation itself lives in the session store; nothing here is
//! shared with the controller.

use std::collections::VecDeque;
use std::time::Instant;

use rand::seq::IndexedRandom;
use tracing::debug;

use crate::agent::AgentState;
use crate::session::SessionState;

/// Words for the busy indicator while the agent works on a request
pub const BUSY_WORDS: &[&str] = &[
    "Researching",
    "Digging",
    "Reading",
    "Analyzing",
    "Cross-checking",
    "Synthesizing",
    "Drafting",
    "Pondering",
    "Crunching",
    "Thinking",
];

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Chat input (default)
    #[default]
    Input,
    /// Plan list in the sidebar
    Plans,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Self::Input => Self::Plans,
            Self::Plans => Self::Input,
        }
    }
}

/// Canned messages offered in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Help,
    Status,
    ResearchTesla,
    ViewSummary,
}

impl QuickAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Help => "Get Help",
            Self::Status => "Check Status",
            Self::ResearchTesla => "Research Tesla",
            Self::ViewSummary => "View Summary",
        }
    }

    /// Text placed in the input buffer
    pub fn message(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Status => "status",
            Self::ResearchTesla => "Research Tesla",
            Self::ViewSummary => "Show me a summary of the plan",
        }
    }
}

/// Quick actions available for the current session
pub fn quick_actions(session: &SessionState) -> Vec<QuickAction> {
    let mut actions = vec![QuickAction::Help, QuickAction::Status, QuickAction::ResearchTesla];
    if session.offers_summary() {
        actions.push(QuickAction::ViewSummary);
    }
    actions
}

/// Session operation requested by a key press
///
/// The app never touches the session; the runner turns these into
/// controller calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    SetInput(String),
    Send,
    ViewPlan(String),
    ClosePlan,
    Edit { section: String, instructions: String },
    RefreshPlans,
}

/// TUI presentation state
#[derive(Debug)]
pub struct UiState {
    pub focus: Focus,
    /// Cursor position within the input buffer (byte offset)
    pub cursor_pos: usize,
    /// Selected row in the plan list
    pub plan_selected: usize,
    /// Manual transcript scroll; None follows the newest entry
    pub transcript_scroll: Option<usize>,
    /// Cached max scroll offset (updated during render)
    pub transcript_max_scroll: usize,
    pub modal_scroll: usize,
    pub modal_max_scroll: usize,
    pub show_help: bool,
    pub should_quit: bool,
    /// One-line hint shown in the footer until the next key press
    pub notice: Option<String>,
    pub busy_word: String,
    pub busy_since: Option<Instant>,
    pending: VecDeque<UiAction>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        debug!("UiState::new: called");
        Self {
            focus: Focus::Input,
            cursor_pos: 0,
            plan_selected: 0,
            transcript_scroll: None,
            transcript_max_scroll: 0,
            modal_scroll: 0,
            modal_max_scroll: 0,
            show_help: false,
            should_quit: false,
            notice: None,
            busy_word: String::new(),
            busy_since: None,
            pending: VecDeque::new(),
        }
    }

    pub fn push_action(&mut self, action: UiAction) {
        debug!(?action, "UiState::push_action: called");
        self.pending.push_back(action);
    }

    /// Drain queued actions in the order they were requested
    pub fn take_actions(&mut self) -> Vec<UiAction> {
        self.pending.drain(..).collect()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Pick a fresh busy word and restart the timer
    pub fn start_busy(&mut self) {
        let mut rng = rand::rng();
        self.busy_word = BUSY_WORDS.choose(&mut rng).unwrap_or(&"Thinking").to_string();
        self.busy_since = Some(Instant::now());
    }

    pub fn stop_busy(&mut self) {
        self.busy_since = None;
    }

    /// Follow the newest transcript entry again
    pub fn scroll_to_bottom(&mut self) {
        self.transcript_scroll = None;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let current = self.transcript_scroll.unwrap_or(self.transcript_max_scroll);
        self.transcript_scroll = Some(current.saturating_sub(lines));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let current = self.transcript_scroll.unwrap_or(self.transcript_max_scroll);
        let next = current + lines;
        // Reaching the bottom re-enables follow mode
        self.transcript_scroll = if next >= self.transcript_max_scroll { None } else { Some(next) };
    }

    pub fn modal_scroll_up(&mut self, lines: usize) {
        self.modal_scroll = self.modal_scroll.saturating_sub(lines);
    }

    pub fn modal_scroll_down(&mut self, lines: usize) {
        self.modal_scroll = (self.modal_scroll + lines).min(self.modal_max_scroll);
    }

    /// Keep the plan selection inside a list of `count` plans
    pub fn clamp_plan_selection(&mut self, count: usize) {
        self.plan_selected = self.plan_selected.min(count.saturating_sub(1));
    }

    pub fn select_next_plan(&mut self, count: usize) {
        if count > 0 {
            self.plan_selected = (self.plan_selected + 1).min(count - 1);
        }
    }

    pub fn select_prev_plan(&mut self) {
        self.plan_selected = self.plan_selected.saturating_sub(1);
    }
}

/// Badge text for the header
pub fn status_badge(state: &AgentState) -> String {
    state.display_label().to_uppercase()
}
