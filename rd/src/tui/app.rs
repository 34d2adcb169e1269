//! TUI application - key handling
//!
//! The App owns the UiState and translates key presses into UI changes and
//! queued [`UiAction`]s. It reads the session but never writes it, and it
//! does no rendering.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, trace};

use super::state::{Focus, QuickAction, UiAction, UiState, quick_actions};
use crate::session::SessionState;

/// Lines moved per PageUp/PageDown
const PAGE: usize = 10;

/// TUI application
#[derive(Debug, Default)]
pub struct App {
    state: UiState,
}

impl App {
    pub fn new() -> Self {
        debug!("App::new: called");
        Self { state: UiState::new() }
    }

    pub fn state(&self) -> &UiState {
        trace!("App::state: called");
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut UiState {
        trace!("App::state_mut: called");
        &mut self.state
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent, session: &SessionState) -> bool {
        debug!(?key, "App::handle_key: called");
        self.state.clear_notice();

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            debug!("App::handle_key: Ctrl+C - quit");
            self.state.should_quit = true;
            return true;
        }

        // Alt+1..4 trigger quick actions from anywhere
        if key.modifiers.contains(KeyModifiers::ALT)
            && let KeyCode::Char(c) = key.code
            && let Some(digit) = c.to_digit(10)
        {
            self.trigger_quick_action(digit as usize, session);
            return false;
        }

        if self.state.show_help {
            self.handle_help_key(key);
        } else if session.is_plan_modal_open() {
            self.handle_modal_key(key);
        } else {
            match self.state.focus {
                Focus::Input => self.handle_input_key(key, session),
                Focus::Plans => self.handle_plans_key(key, session),
            }
        }

        self.state.should_quit
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::F(1)) {
            debug!("App::handle_help_key: closing help");
            self.state.show_help = false;
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                debug!("App::handle_modal_key: closing plan");
                self.state.push_action(UiAction::ClosePlan);
            }
            KeyCode::Up | KeyCode::Char('k') => self.state.modal_scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.state.modal_scroll_down(1),
            KeyCode::PageUp => self.state.modal_scroll_up(PAGE),
            KeyCode::PageDown | KeyCode::Char(' ') => self.state.modal_scroll_down(PAGE),
            KeyCode::Char('g') | KeyCode::Home => self.state.modal_scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.state.modal_scroll = self.state.modal_max_scroll,
            _ => trace!("App::handle_modal_key: unhandled key"),
        }
    }

    fn handle_plans_key(&mut self, key: KeyEvent, session: &SessionState) {
        let count = session.plans().len();
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => self.state.focus = Focus::Input,
            KeyCode::Up | KeyCode::Char('k') => self.state.select_prev_plan(),
            KeyCode::Down | KeyCode::Char('j') => self.state.select_next_plan(count),
            KeyCode::Enter => {
                if let Some(plan) = session.plans().get(self.state.plan_selected) {
                    debug!(filename = %plan.filename, "App::handle_plans_key: viewing plan");
                    self.state.modal_scroll = 0;
                    self.state.push_action(UiAction::ViewPlan(plan.filename.clone()));
                }
            }
            KeyCode::Char('r') => self.state.push_action(UiAction::RefreshPlans),
            KeyCode::Char('?') | KeyCode::F(1) => self.state.show_help = true,
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(digit) = c.to_digit(10) {
                    self.trigger_quick_action(digit as usize, session);
                }
            }
            _ => trace!("App::handle_plans_key: unhandled key"),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent, session: &SessionState) {
        let input = session.input_buffer();
        let cursor = clamp_cursor(input, self.state.cursor_pos);

        match key.code {
            KeyCode::Enter => self.submit(input, session),
            KeyCode::Esc => {
                if !input.is_empty() {
                    self.set_input(String::new(), 0);
                }
            }
            KeyCode::Tab | KeyCode::BackTab => self.state.focus = Focus::Plans,
            KeyCode::Backspace => {
                if cursor > 0 {
                    let start = prev_char_boundary(input, cursor);
                    let mut next = input.to_string();
                    next.drain(start..cursor);
                    self.set_input(next, start);
                }
            }
            KeyCode::Delete => {
                if cursor < input.len() {
                    let end = next_char_boundary(input, cursor);
                    let mut next = input.to_string();
                    next.drain(cursor..end);
                    self.set_input(next, cursor);
                }
            }
            KeyCode::Left => self.state.cursor_pos = prev_char_boundary(input, cursor),
            KeyCode::Right => self.state.cursor_pos = next_char_boundary(input, cursor),
            KeyCode::Home => self.state.cursor_pos = 0,
            KeyCode::End => self.state.cursor_pos = input.len(),
            KeyCode::PageUp => self.state.scroll_up(PAGE),
            KeyCode::PageDown => self.state.scroll_down(PAGE),
            KeyCode::F(1) => self.state.show_help = !self.state.show_help,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                // Typing is allowed while busy; only sending is gated
                let mut next = input.to_string();
                next.insert(cursor, c);
                self.set_input(next, cursor + c.len_utf8());
            }
            _ => trace!("App::handle_input_key: unhandled key"),
        }
    }

    fn set_input(&mut self, input: String, cursor: usize) {
        self.state.cursor_pos = cursor;
        self.state.push_action(UiAction::SetInput(input));
    }

    fn submit(&mut self, input: &str, session: &SessionState) {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return;
        }

        if trimmed.starts_with('/') {
            self.handle_slash_command(trimmed, session);
            return;
        }

        if session.is_busy() {
            debug!("App::submit: request in flight");
            self.state.set_notice("Waiting for the agent to answer...");
            return;
        }

        self.state.cursor_pos = 0;
        self.state.scroll_to_bottom();
        self.state.push_action(UiAction::Send);
    }

    /// Handle chat slash commands
    fn handle_slash_command(&mut self, input: &str, session: &SessionState) {
        debug!(%input, "App::handle_slash_command: called");
        let mut parts = input.splitn(3, char::is_whitespace);
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "/edit" => {
                let section = parts.next().unwrap_or("").trim();
                let instructions = parts.next().unwrap_or("").trim();
                if section.is_empty() || instructions.is_empty() {
                    self.state.set_notice("Usage: /edit <section> <instructions>");
                    return;
                }
                if session.is_busy() {
                    self.state.set_notice("Waiting for the agent to answer...");
                    return;
                }
                self.state.push_action(UiAction::Edit {
                    section: section.to_string(),
                    instructions: instructions.to_string(),
                });
            }
            "/plans" => self.state.push_action(UiAction::RefreshPlans),
            "/help" | "/h" => self.state.show_help = !self.state.show_help,
            "/quit" | "/q" | "/exit" => self.state.should_quit = true,
            _ => {
                debug!(%cmd, "App::handle_slash_command: unknown command");
                self.state.set_notice(format!("Unknown command: {}", cmd));
                return;
            }
        }

        self.set_input(String::new(), 0);
    }

    /// Prefill the input with the n-th (1-based) quick action
    fn trigger_quick_action(&mut self, n: usize, session: &SessionState) {
        let actions = quick_actions(session);
        let Some(action) = n.checked_sub(1).and_then(|i| actions.get(i)).copied() else {
            debug!(n, "App::trigger_quick_action: no such action");
            return;
        };
        debug!(?action, "App::trigger_quick_action: prefilling input");
        let message = QuickAction::message(action).to_string();
        let cursor = message.len();
        self.set_input(message, cursor);
        self.state.focus = Focus::Input;
    }
}

fn clamp_cursor(input: &str, pos: usize) -> usize {
    let mut pos = pos.min(input.len());
    while pos > 0 && !input.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Find the previous character boundary in the input
fn prev_char_boundary(input: &str, pos: usize) -> usize {
    let mut new_pos = pos.saturating_sub(1);
    while new_pos > 0 && !input.is_char_boundary(new_pos) {
        new_pos -= 1;
    }
    new_pos
}

/// Find the next character boundary in the input
fn next_char_boundary(input: &str, pos: usize) -> usize {
    let mut new_pos = pos + 1;
    while new_pos < input.len() && !input.is_char_boundary(new_pos) {
        new_pos += 1;
    }
    new_pos.min(input.len())
}
