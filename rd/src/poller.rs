//! Status poller
//!
//! Queries the agent's status on a fixed interval, starting immediately,
//! for as long as the session lives. Polls may overlap; each posts its
//! result on arrival and the last one applied wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::agent::{AgentError, AgentService, StatusReply};
use crate::controller::{SessionUpdate, UpdateSender};
use crate::session::SessionStore;

/// Default time between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Shortest interval the poller accepts
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running poller; dropping it cancels polling
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancel the poller and any poll still in flight
    pub fn stop(&self) {
        debug!("PollerHandle::stop: called");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start polling the agent status
pub fn spawn(agent: Arc<dyn AgentService>, interval: Duration, tx: UpdateSender) -> PollerHandle {
    let interval = interval.max(MIN_POLL_INTERVAL);
    info!(interval_ms = interval.as_millis() as u64, "Status poller starting");
    PollerHandle {
        task: tokio::spawn(poll_loop(agent, interval, tx)),
    }
}

async fn poll_loop(agent: Arc<dyn AgentService>, interval: Duration, tx: UpdateSender) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Owned here so aborting the loop also aborts outstanding polls
    let mut in_flight = JoinSet::new();

    loop {
        ticker.tick().await;
        while in_flight.try_join_next().is_some() {}

        if tx.is_closed() {
            debug!("poll_loop: session closed, exiting");
            break;
        }

        let agent = Arc::clone(&agent);
        let tx = tx.clone();
        in_flight.spawn(async move {
            let result = agent.status().await;
            if tx.send(SessionUpdate::StatusPolled(result)).is_err() {
                debug!("poll_loop: session closed, discarding poll result");
            }
        });
    }
}

/// Merge a poll result into the store
///
/// A failed poll is logged and leaves the status untouched.
pub fn apply_status(store: &mut SessionStore, result: Result<StatusReply, AgentError>) {
    match result {
        Ok(reply) => {
            debug!(state = %reply.state, "apply_status: merging status");
            store.set_agent_status(reply.state, reply.current_company, reply.status);
        }
        Err(e) => {
            warn!(error = %e, "Status poll failed");
        }
    }
}
