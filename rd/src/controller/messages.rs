//! Controller messages
//!
//! Background tasks never touch the store; they post one of these and the
//! controller applies it.

use crate::agent::{AgentError, ChatReply, EditReply, PlanContentReply, PlanListReply, StatusReply};

/// Prefix of the error entry for a failed chat round trip
pub const CHAT_ERROR_PREFIX: &str = "Error communicating with agent: ";

/// Prefix of the error entry for a failed plan edit
pub const EDIT_ERROR_PREFIX: &str = "Error editing plan: ";

/// Separator between a chat response and its plan summary
pub const PLAN_SUMMARY_HEADING: &str = "\n\nAccount Plan Summary:\n";

/// Result of a background request, posted to the controller
#[derive(Debug)]
pub enum SessionUpdate {
    /// A status poll finished
    StatusPolled(Result<StatusReply, AgentError>),
    /// A plan directory fetch finished; `seq` is its issue order
    PlansFetched {
        seq: u64,
        result: Result<PlanListReply, AgentError>,
    },
    /// The outstanding chat request resolved
    ChatResolved(Result<ChatReply, AgentError>),
    /// A plan body fetch finished
    PlanLoaded {
        filename: String,
        result: Result<PlanContentReply, AgentError>,
    },
    /// The outstanding edit request resolved
    EditResolved(Result<EditReply, AgentError>),
}

impl SessionUpdate {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusPolled(_) => "status_polled",
            Self::PlansFetched { .. } => "plans_fetched",
            Self::ChatResolved(_) => "chat_resolved",
            Self::PlanLoaded { .. } => "plan_loaded",
            Self::EditResolved(_) => "edit_resolved",
        }
    }

    /// True for the resolution of a busy-gated request
    pub fn releases_busy(&self) -> bool {
        matches!(self, Self::ChatResolved(_) | Self::EditResolved(_))
    }
}

/// What happened to a user-initiated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Request issued; busy until it resolves
    Sent,
    /// Nothing to send after trimming
    Empty,
    /// Another request is still outstanding
    Busy,
    /// The session has ended
    Closed,
}

impl SendOutcome {
    pub fn is_sent(self) -> bool {
        self == Self::Sent
    }
}

/// Build the displayed agent text for a chat reply
pub fn chat_display_content(reply: &ChatReply) -> String {
    match reply.summary() {
        Some(summary) => format!("{}{}{}", reply.response, PLAN_SUMMARY_HEADING, summary),
        None => reply.response.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_display_with_summary() {
        let reply = ChatReply {
            response: "Plan ready.".to_string(),
            plan_summary: Some("X".to_string()),
            ..ChatReply::default()
        };
        let content = chat_display_content(&reply);
        assert_eq!(content, "Plan ready.\n\nAccount Plan Summary:\nX");
        assert!(content.ends_with("\n\nAccount Plan Summary:\nX"));
    }

    #[test]
    fn test_chat_display_without_summary() {
        assert_eq!(chat_display_content(&ChatReply::text("hello")), "hello");
    }

    #[test]
    fn test_releases_busy() {
        assert!(SessionUpdate::ChatResolved(Ok(ChatReply::default())).releases_busy());
        assert!(SessionUpdate::EditResolved(Ok(EditReply::default())).releases_busy());
        assert!(!SessionUpdate::PlansFetched {
            seq: 1,
            result: Ok(PlanListReply::default())
        }.releases_busy());
    }
}
