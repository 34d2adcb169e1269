//! ConversationController - the session's single writer

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::messages::{CHAT_ERROR_PREFIX, EDIT_ERROR_PREFIX, SendOutcome, SessionUpdate, chat_display_content};
use super::{UpdateSender, spawn_request};
use crate::agent::{AgentError, AgentService, ChatReply, ChatRequest, EditReply, EditRequest, PlanContentReply};
use crate::directory::PlanDirectory;
use crate::poller::{self, PollerHandle};
use crate::session::{EntryKind, SessionEvent, SessionState, SessionStore};

/// Orchestrates user actions against the agent and owns the session store
pub struct ConversationController {
    store: SessionStore,
    agent: Arc<dyn AgentService>,
    directory: PlanDirectory,
    update_tx: UpdateSender,
    update_rx: mpsc::UnboundedReceiver<SessionUpdate>,
    poller: Option<PollerHandle>,
    /// Plan whose content the modal is waiting for
    pending_plan: Option<String>,
    closed: bool,
}

impl ConversationController {
    pub fn new(agent: Arc<dyn AgentService>) -> Self {
        debug!("ConversationController::new: called");
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let directory = PlanDirectory::new(Arc::clone(&agent), update_tx.clone());
        Self {
            store: SessionStore::new(),
            agent,
            directory,
            update_tx,
            update_rx,
            poller: None,
            pending_plan: None,
            closed: false,
        }
    }

    /// Begin the session: load the plan list and start status polling
    pub fn start(&mut self, poll_interval: Duration) {
        if self.closed || self.poller.is_some() {
            debug!("start: already started or closed");
            return;
        }
        info!("Session starting");
        self.directory.fetch();
        self.poller = Some(poller::spawn(
            Arc::clone(&self.agent),
            poll_interval,
            self.update_tx.clone(),
        ));
    }

    /// End the session
    ///
    /// Polling stops, queued and in-flight results are discarded and every
    /// later action is refused.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        info!("Session ending");
        self.closed = true;
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.update_rx.close();
        let mut discarded = 0;
        while self.update_rx.try_recv().is_ok() {
            discarded += 1;
        }
        debug!(discarded, "shutdown: dropped pending updates");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.subscribe()
    }

    /// Number of plan directory fetches triggered this session
    pub fn plan_fetches(&self) -> usize {
        self.directory.fetches()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        if !self.closed {
            self.store.set_input(input);
        }
    }

    /// Send whatever is in the input buffer
    pub fn send_input(&mut self) -> SendOutcome {
        let text = self.store.state().input_buffer().to_string();
        self.send_message(&text)
    }

    /// Relay a user message to the agent
    ///
    /// Blank text and sends while another request is outstanding are no-ops.
    /// Otherwise the trimmed text is appended as a user entry, the input is
    /// cleared and the session is busy until the reply resolves.
    pub fn send_message(&mut self, text: &str) -> SendOutcome {
        debug!(text_len = text.len(), "send_message: called");
        if self.closed {
            return SendOutcome::Closed;
        }

        let message = text.trim();
        if message.is_empty() {
            debug!("send_message: empty message, ignoring");
            return SendOutcome::Empty;
        }
        if self.store.state().is_busy() {
            debug!("send_message: request in flight, ignoring");
            return SendOutcome::Busy;
        }

        self.store.append_entry(EntryKind::User, message);
        self.store.set_input("");
        self.store.set_busy(true);

        let agent = Arc::clone(&self.agent);
        let request = ChatRequest {
            message: message.to_string(),
        };
        spawn_request(
            self.update_tx.clone(),
            async move { agent.chat(request).await },
            SessionUpdate::ChatResolved,
        );

        SendOutcome::Sent
    }

    /// Load a listed plan and open it in the modal once it arrives
    ///
    /// Returns false without a request when the filename is not in the
    /// current plan list.
    pub fn view_plan(&mut self, filename: &str) -> bool {
        debug!(%filename, "view_plan: called");
        if self.closed {
            return false;
        }
        if self.store.state().find_plan(filename).is_none() {
            warn!(%filename, "view_plan: plan is not listed, skipping fetch");
            return false;
        }

        self.pending_plan = Some(filename.to_string());
        let agent = Arc::clone(&self.agent);
        let requested = filename.to_string();
        let filename = requested.clone();
        spawn_request(
            self.update_tx.clone(),
            async move { agent.plan_content(&requested).await },
            move |result| SessionUpdate::PlanLoaded { filename, result },
        );
        true
    }

    /// Ask the agent to rewrite one section of the current plan
    pub fn edit_plan_section(&mut self, section: &str, instructions: &str) -> SendOutcome {
        debug!(%section, instructions_len = instructions.len(), "edit_plan_section: called");
        if self.closed {
            return SendOutcome::Closed;
        }

        let (section, instructions) = (section.trim(), instructions.trim());
        if section.is_empty() || instructions.is_empty() {
            debug!("edit_plan_section: missing section or instructions, ignoring");
            return SendOutcome::Empty;
        }
        if self.store.state().is_busy() {
            debug!("edit_plan_section: request in flight, ignoring");
            return SendOutcome::Busy;
        }

        self.store.set_busy(true);

        let agent = Arc::clone(&self.agent);
        let request = EditRequest {
            section: section.to_string(),
            instructions: instructions.to_string(),
        };
        spawn_request(
            self.update_tx.clone(),
            async move { agent.edit_plan(request).await },
            SessionUpdate::EditResolved,
        );

        SendOutcome::Sent
    }

    pub fn close_plan_modal(&mut self) {
        self.pending_plan = None;
        self.store.close_plan_modal();
    }

    /// Re-run plan directory sync
    pub fn refresh_plans(&mut self) {
        if !self.closed {
            self.directory.fetch();
        }
    }

    /// Wait for the next background result
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.update_rx.recv().await
    }

    /// Apply every result that has already arrived
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.update_rx.try_recv() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    /// Apply results until no chat or edit request is outstanding
    pub async fn settle(&mut self) {
        while self.store.state().is_busy() && !self.closed {
            match self.update_rx.recv().await {
                Some(update) => self.apply(update),
                None => break,
            }
        }
    }

    /// Fold one background result into the session
    pub fn apply(&mut self, update: SessionUpdate) {
        if self.closed {
            debug!(kind = update.kind(), "apply: session closed, discarding");
            return;
        }
        debug!(kind = update.kind(), "apply: called");

        match update {
            SessionUpdate::StatusPolled(result) => poller::apply_status(&mut self.store, result),
            SessionUpdate::PlansFetched { seq, result } => self.directory.apply(&mut self.store, seq, result),
            SessionUpdate::ChatResolved(result) => self.resolve_chat(result),
            SessionUpdate::PlanLoaded { filename, result } => self.resolve_plan(&filename, result),
            SessionUpdate::EditResolved(result) => self.resolve_edit(result),
        }
    }

    fn resolve_chat(&mut self, result: Result<ChatReply, AgentError>) {
        match result {
            Ok(reply) => {
                self.store.append_entry(EntryKind::Agent, chat_display_content(&reply));
                if let Some(draft) = reply.edit_state() {
                    self.store.set_edit_draft(Some(draft));
                }
                if reply.signals_new_plan() {
                    info!("Chat reply signals a new plan, refreshing plan list");
                    self.directory.fetch();
                }
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                self.store
                    .append_entry(EntryKind::Error, format!("{}{}", CHAT_ERROR_PREFIX, e));
            }
        }
        self.store.set_busy(false);
    }

    fn resolve_plan(&mut self, filename: &str, result: Result<PlanContentReply, AgentError>) {
        // Only the latest request may open the modal, and only if not dismissed since
        if self.pending_plan.as_deref() != Some(filename) {
            debug!(%filename, pending = ?self.pending_plan, "resolve_plan: stale reply dropped");
            return;
        }
        self.pending_plan = None;
        match result {
            Ok(reply) => {
                debug!(%filename, content_len = reply.content.len(), "resolve_plan: opening plan");
                self.store.set_selected_plan(Some(reply.content));
                self.store.open_plan_modal();
            }
            Err(e) => {
                warn!(%filename, error = %e, "Plan fetch failed");
            }
        }
    }

    fn resolve_edit(&mut self, result: Result<EditReply, AgentError>) {
        match result {
            Ok(reply) => {
                self.store.append_entry(EntryKind::Agent, reply.response.clone());
                if reply.succeeded() {
                    info!("Plan edit succeeded, refreshing plan list");
                    self.store.set_edit_draft(None);
                    self.directory.fetch();
                }
            }
            Err(e) => {
                warn!(error = %e, "Edit request failed");
                self.store
                    .append_entry(EntryKind::Error, format!("{}{}", EDIT_ERROR_PREFIX, e));
            }
        }
        self.store.set_busy(false);
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
