//! Session data model
//!
//! Pure data. All mutation goes through [`super::SessionStore`].

use chrono::{DateTime, Local};

use crate::agent::{AgentState, EditState, PlanSummary};

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Agent,
    Error,
}

/// One line of chat history; never changed once appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub content: String,
    pub at: DateTime<Local>,
}

impl TranscriptEntry {
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            at: Local::now(),
        }
    }
}

/// Everything the client knows about the current session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(super) transcript: Vec<TranscriptEntry>,
    pub(super) input_buffer: String,
    pub(super) busy: bool,
    pub(super) agent_status: AgentState,
    pub(super) current_company: Option<String>,
    pub(super) status_message: Option<String>,
    pub(super) plans: Vec<PlanSummary>,
    pub(super) selected_plan_content: Option<String>,
    pub(super) plan_modal_open: bool,
    pub(super) edit_draft: Option<EditState>,
}

impl SessionState {
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// True while a chat or edit request is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn agent_status(&self) -> &AgentState {
        &self.agent_status
    }

    pub fn current_company(&self) -> Option<&str> {
        self.current_company.as_deref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn plans(&self) -> &[PlanSummary] {
        &self.plans
    }

    pub fn find_plan(&self, filename: &str) -> Option<&PlanSummary> {
        self.plans.iter().find(|p| p.filename == filename)
    }

    pub fn selected_plan_content(&self) -> Option<&str> {
        self.selected_plan_content.as_deref()
    }

    pub fn is_plan_modal_open(&self) -> bool {
        self.plan_modal_open
    }

    pub fn edit_draft(&self) -> Option<&EditState> {
        self.edit_draft.as_ref()
    }

    /// Research panel is shown while a company is being worked on
    pub fn shows_current_research(&self) -> bool {
        self.current_company.is_some() && !self.agent_status.is_idle()
    }

    /// "View Summary" quick action is offered once research is complete
    pub fn offers_summary(&self) -> bool {
        self.shows_current_research() && self.agent_status.is_complete()
    }
}
