//! Plan directory sync
//!
//! Fetches the full list of plan summaries and swaps it into the store in
//! one step. Failures leave the previous list in place. Fetches may overlap;
//! a reply older than the list already shown is dropped.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::{AgentError, AgentService, PlanListReply};
use crate::controller::{SessionUpdate, UpdateSender, spawn_request};
use crate::session::SessionStore;

/// Triggers plan list fetches and applies their results
pub struct PlanDirectory {
    agent: Arc<dyn AgentService>,
    tx: UpdateSender,
    fetches: usize,
    /// Issue number of the fetch whose list is in the store
    applied: u64,
}

impl PlanDirectory {
    pub fn new(agent: Arc<dyn AgentService>, tx: UpdateSender) -> Self {
        Self {
            agent,
            tx,
            fetches: 0,
            applied: 0,
        }
    }

    /// Start a fetch; the result arrives as [`SessionUpdate::PlansFetched`]
    pub fn fetch(&mut self) {
        self.fetches += 1;
        debug!(fetches = self.fetches, "PlanDirectory::fetch: called");
        let seq = self.fetches as u64;
        let agent = Arc::clone(&self.agent);
        spawn_request(
            self.tx.clone(),
            async move { agent.list_plans().await },
            move |result| SessionUpdate::PlansFetched { seq, result },
        );
    }

    /// Number of fetches triggered so far
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn apply(&mut self, store: &mut SessionStore, seq: u64, result: Result<PlanListReply, AgentError>) {
        if seq < self.applied {
            debug!(seq, applied = self.applied, "PlanDirectory::apply: stale list dropped");
            return;
        }
        match result {
            Ok(reply) => {
                self.applied = seq;
                store.set_plans(reply.plans);
            }
            Err(e) => warn!(error = %e, "Plan list fetch failed"),
        }
    }
}
