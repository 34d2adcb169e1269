//! TUI Runner - main loop that owns the terminal and the conversation
//!
//! The TuiRunner is responsible for:
//! - Starting and ending the conversation session
//! - Dispatching key events to App and its actions to the controller
//! - Applying background session updates as they arrive
//! - Redrawing after every event

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::state::{UiAction, UiState};
use super::views;
use crate::agent::AgentService;
use crate::controller::{ConversationController, SendOutcome};
use crate::session::SessionEvent;

/// Redraw rate while idle (drives the busy timer)
const TICK_RATE: Duration = Duration::from_millis(250);

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    controller: ConversationController,
    session_events: broadcast::Receiver<SessionEvent>,
    poll_interval: Duration,
}

impl TuiRunner {
    pub fn new(terminal: Tui, agent: Arc<dyn AgentService>, poll_interval: Duration) -> Self {
        debug!(?poll_interval, "TuiRunner::new: called");
        let controller = ConversationController::new(agent);
        let session_events = controller.subscribe();
        Self {
            app: App::new(),
            terminal,
            controller,
            session_events,
            poll_interval,
        }
    }

    /// Run until the user quits
    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: called");
        self.controller.start(self.poll_interval);
        let mut events = EventHandler::new(TICK_RATE);

        let result = self.event_loop(&mut events).await;

        info!("TUI exiting, ending session");
        self.controller.shutdown();
        result
    }

    async fn event_loop(&mut self, events: &mut EventHandler) -> Result<()> {
        loop {
            let (app, controller) = (&mut self.app, &self.controller);
            self.terminal
                .draw(|frame| views::render(app.state_mut(), controller.state(), frame))?;

            tokio::select! {
                event = events.next() => {
                    match event? {
                        Event::Key(key) => {
                            if self.app.handle_key(key, self.controller.state()) {
                                break;
                            }
                            let actions = self.app.state_mut().take_actions();
                            for action in actions {
                                perform(&mut self.controller, self.app.state_mut(), action);
                            }
                        }
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner: resize");
                        }
                        Event::Tick => {}
                    }
                }
                Some(update) = self.controller.next_update() => {
                    self.controller.apply(update);
                }
            }

            self.observe_session();

            if self.app.state().should_quit {
                debug!("TuiRunner::run: should_quit is true, breaking");
                break;
            }
        }
        Ok(())
    }

    /// Fold session change notifications into the presentation state
    fn observe_session(&mut self) {
        loop {
            match self.session_events.try_recv() {
                Ok(event) => observe(self.app.state_mut(), &event),
                Err(TryRecvError::Lagged(skipped)) => {
                    // Rendering reads the store directly, only follow-scroll is lost
                    debug!(skipped, "TuiRunner: session events lagged");
                    self.app.state_mut().scroll_to_bottom();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

/// Carry out one UI action against the session
pub(crate) fn perform(controller: &mut ConversationController, ui: &mut UiState, action: UiAction) {
    debug!(?action, "perform: called");
    match action {
        UiAction::SetInput(text) => controller.set_input(text),
        UiAction::Send => match controller.send_input() {
            SendOutcome::Sent => ui.cursor_pos = 0,
            SendOutcome::Busy => ui.set_notice("Waiting for the agent to answer..."),
            SendOutcome::Empty | SendOutcome::Closed => {}
        },
        UiAction::ViewPlan(filename) => {
            if !controller.view_plan(&filename) {
                ui.set_notice(format!("Plan {} is no longer listed", filename));
            }
        }
        UiAction::ClosePlan => controller.close_plan_modal(),
        UiAction::Edit { section, instructions } => {
            if controller.edit_plan_section(&section, &instructions) == SendOutcome::Busy {
                ui.set_notice("Waiting for the agent to answer...");
            }
        }
        UiAction::RefreshPlans => controller.refresh_plans(),
    }
}

/// Update presentation state for one session change
pub(crate) fn observe(ui: &mut UiState, event: &SessionEvent) {
    match event {
        SessionEvent::EntryAppended { .. } => ui.scroll_to_bottom(),
        SessionEvent::BusyChanged(true) => ui.start_busy(),
        SessionEvent::BusyChanged(false) => ui.stop_busy(),
        SessionEvent::PlansReplaced { count } => ui.clamp_plan_selection(*count),
        SessionEvent::PlanModalOpened => ui.modal_scroll = 0,
        _ => {}
    }
}
