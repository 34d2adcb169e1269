//! ResearchDesk - terminal client for an account research agent
//!
//! The agent is a remote service that researches companies and writes
//! account plans as markdown files. ResearchDesk keeps one conversation
//! session against it: the user chats, the agent's lifecycle state is
//! polled in the background, and the plan directory is re-synced whenever
//! a new plan may exist.
//!
//! # Core Concepts
//!
//! - **Single Writer**: Only the [`controller::ConversationController`] mutates session state
//! - **One Request at a Time**: Chat and edit requests are gated by a busy flag
//! - **Background Results as Messages**: Network tasks post [`controller::SessionUpdate`]s
//!
//! # Modules
//!
//! - [`agent`] - Agent service trait, wire types and HTTP client
//! - [`session`] - Session state and its observable store
//! - [`poller`] - Periodic status polling
//! - [`directory`] - Plan directory sync
//! - [`controller`] - Conversation controller
//! - [`tui`] - Terminal user interface
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod controller;
pub mod directory;
pub mod poller;
pub mod session;
pub mod tui;

// Re-export commonly used types
pub use agent::{
    AgentError, AgentService, AgentState, ChatReply, EditReply, HttpAgentClient, PlanSummary, StatusReply,
    create_client,
};
pub use config::{AgentConfig, Config, PollConfig};
pub use controller::{ConversationController, SendOutcome, SessionUpdate};
pub use directory::PlanDirectory;
pub use poller::PollerHandle;
pub use session::{EntryKind, SessionEvent, SessionState, SessionStore, TranscriptEntry};
