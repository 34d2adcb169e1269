//! Agent service boundary
//!
//! The research agent is an opaque remote collaborator. This module holds
//! its wire types, the [`AgentService`] trait and the HTTP client.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod http;
mod types;

pub use client::AgentService;
pub use error::AgentError;
pub use http::HttpAgentClient;
pub use types::{
    AgentState, CacheClearReply, CacheStatusReply, ChatReply, ChatRequest, EditReply, EditRequest, EditState,
    HealthReply, PlanContentReply, PlanListReply, PlanSummary, StatusReply, WHOLE_PLAN_SECTION,
};

use crate::config::AgentConfig;

/// Create the agent client described by the configuration
pub fn create_client(config: &AgentConfig) -> Result<Arc<dyn AgentService>, AgentError> {
    debug!(base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(HttpAgentClient::from_config(config)?))
}
