//! SessionStore - sole owner of the session state
//!
//! Every update is a total function from old state to new state followed by
//! a notification to subscribers. Nothing else can mutate [`SessionState`].

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::state::{EntryKind, SessionState, TranscriptEntry};
use crate::agent::{AgentState, EditState, PlanSummary};

/// Subscriber channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notification sent after each store update
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    EntryAppended { index: usize, kind: EntryKind },
    InputChanged,
    BusyChanged(bool),
    StatusChanged(AgentState),
    PlansReplaced { count: usize },
    SelectedPlanChanged,
    PlanModalOpened,
    PlanModalClosed,
    EditDraftChanged,
}

/// Owner of the session state
#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        debug!("SessionStore::new: called");
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: SessionState::default(),
            event_tx,
        }
    }

    /// Read access to the current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Subscribe to update notifications
    ///
    /// Only updates made after subscribing are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    fn notify(&self, event: SessionEvent) {
        trace!(?event, "SessionStore::notify");
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Append a transcript entry, returning its index
    pub fn append_entry(&mut self, kind: EntryKind, content: impl Into<String>) -> usize {
        let entry = TranscriptEntry::new(kind, content);
        debug!(?kind, content_len = entry.content.len(), "append_entry: called");
        self.state.transcript.push(entry);
        let index = self.state.transcript.len() - 1;
        self.notify(SessionEvent::EntryAppended { index, kind });
        index
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        let input = input.into();
        if input != self.state.input_buffer {
            self.state.input_buffer = input;
            self.notify(SessionEvent::InputChanged);
        }
    }

    pub fn set_busy(&mut self, busy: bool) {
        debug!(busy, "set_busy: called");
        if busy != self.state.busy {
            self.state.busy = busy;
            self.notify(SessionEvent::BusyChanged(busy));
        }
    }

    /// Merge a status snapshot
    pub fn set_agent_status(&mut self, status: AgentState, current_company: Option<String>, message: Option<String>) {
        debug!(%status, ?current_company, "set_agent_status: called");
        self.state.agent_status = status.clone();
        self.state.current_company = current_company;
        self.state.status_message = message;
        self.notify(SessionEvent::StatusChanged(status));
    }

    /// Replace the plan list wholesale
    ///
    /// Keeps the first summary for each filename.
    pub fn set_plans(&mut self, plans: Vec<PlanSummary>) {
        let mut unique: Vec<PlanSummary> = Vec::with_capacity(plans.len());
        for plan in plans {
            if unique.iter().any(|p| p.filename == plan.filename) {
                debug!(filename = %plan.filename, "set_plans: dropping duplicate filename");
                continue;
            }
            unique.push(plan);
        }
        let count = unique.len();
        debug!(count, "set_plans: called");
        self.state.plans = unique;
        self.notify(SessionEvent::PlansReplaced { count });
    }

    pub fn set_selected_plan(&mut self, content: Option<String>) {
        debug!(has_content = content.is_some(), "set_selected_plan: called");
        self.state.selected_plan_content = content;
        if self.state.selected_plan_content.is_none() && self.state.plan_modal_open {
            self.state.plan_modal_open = false;
            self.notify(SessionEvent::PlanModalClosed);
        }
        self.notify(SessionEvent::SelectedPlanChanged);
    }

    /// Open the plan modal; refused when no plan content is selected
    pub fn open_plan_modal(&mut self) -> bool {
        if self.state.selected_plan_content.is_none() {
            debug!("open_plan_modal: no selected plan, refusing");
            return false;
        }
        if !self.state.plan_modal_open {
            self.state.plan_modal_open = true;
            self.notify(SessionEvent::PlanModalOpened);
        }
        true
    }

    /// Close the plan modal and drop its content
    pub fn close_plan_modal(&mut self) {
        debug!("close_plan_modal: called");
        let was_open = self.state.plan_modal_open;
        self.state.plan_modal_open = false;
        self.state.selected_plan_content = None;
        if was_open {
            self.notify(SessionEvent::PlanModalClosed);
        }
    }

    pub fn set_edit_draft(&mut self, draft: Option<EditState>) {
        debug!(?draft, "set_edit_draft: called");
        if draft != self.state.edit_draft {
            self.state.edit_draft = draft;
            self.notify(SessionEvent::EditDraftChanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(company: &str, filename: &str) -> PlanSummary {
        PlanSummary::new(company, "20240101_120000", filename)
    }

    #[test]
    fn test_append_entry_grows_transcript_in_order() {
        let mut store = SessionStore::new();
        assert_eq!(store.append_entry(EntryKind::User, "hello"), 0);
        assert_eq!(store.append_entry(EntryKind::Agent, "hi"), 1);
        assert_eq!(store.append_entry(EntryKind::Error, "oops"), 2);

        let kinds: Vec<_> = store.state().transcript().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::User, EntryKind::Agent, EntryKind::Error]);
        assert_eq!(store.state().transcript()[1].content, "hi");
    }

    #[test]
    fn test_subscribers_are_notified() {
        let mut store = SessionStore::new();
        let mut rx = store.subscribe();

        store.append_entry(EntryKind::User, "hello");
        store.set_busy(true);
        store.set_busy(true); // no change, no event
        store.set_busy(false);

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::EntryAppended {
                index: 0,
                kind: EntryKind::User
            }
        );
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::BusyChanged(true));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::BusyChanged(false));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_set_plans_replaces_and_dedupes() {
        let mut store = SessionStore::new();
        store.set_plans(vec![plan("Tesla", "a.md"), plan("Ford", "b.md")]);
        assert_eq!(store.state().plans().len(), 2);

        store.set_plans(vec![plan("Apple", "c.md"), plan("Apple again", "c.md")]);
        assert_eq!(store.state().plans().len(), 1);
        assert_eq!(store.state().plans()[0].company, "Apple");
        assert!(store.state().find_plan("a.md").is_none());
        assert!(store.state().find_plan("c.md").is_some());
    }

    #[test]
    fn test_modal_requires_content() {
        let mut store = SessionStore::new();
        assert!(!store.open_plan_modal());
        assert!(!store.state().is_plan_modal_open());

        store.set_selected_plan(Some("# Plan".to_string()));
        assert!(store.open_plan_modal());
        assert!(store.state().is_plan_modal_open());
        assert_eq!(store.state().selected_plan_content(), Some("# Plan"));

        store.close_plan_modal();
        assert!(!store.state().is_plan_modal_open());
        assert!(store.state().selected_plan_content().is_none());
    }

    #[test]
    fn test_clearing_selection_closes_modal() {
        let mut store = SessionStore::new();
        store.set_selected_plan(Some("# Plan".to_string()));
        store.open_plan_modal();
        store.set_selected_plan(None);
        assert!(!store.state().is_plan_modal_open());
    }

    #[test]
    fn test_status_merge() {
        let mut store = SessionStore::new();
        store.set_agent_status(
            AgentState::Researching,
            Some("Tesla".to_string()),
            Some("Gathering sources".to_string()),
        );
        assert_eq!(store.state().agent_status(), &AgentState::Researching);
        assert_eq!(store.state().current_company(), Some("Tesla"));
        assert!(store.state().shows_current_research());
        assert!(!store.state().offers_summary());

        store.set_agent_status(AgentState::Complete, Some("Tesla".to_string()), None);
        assert!(store.state().offers_summary());
        assert!(store.state().status_message().is_none());
    }

    #[test]
    fn test_input_and_edit_draft() {
        let mut store = SessionStore::new();
        let mut rx = store.subscribe();
        store.set_input("help");
        assert_eq!(store.state().input_buffer(), "help");
        store.set_edit_draft(Some(EditState {
            section: "overview".to_string(),
            instructions_pending: true,
        }));
        assert_eq!(store.state().edit_draft().map(|d| d.section.as_str()), Some("overview"));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::InputChanged);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::EditDraftChanged);
    }
}
