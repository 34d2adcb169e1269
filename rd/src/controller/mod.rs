//! Conversation controller
//!
//! Owns the session store and turns user actions (send, view plan, edit
//! section) into agent round trips. Round trips run as background tasks
//! that post a [`SessionUpdate`]; only the controller applies updates, so
//! the store has a single writer.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::agent::AgentError;

mod core;
mod messages;

pub use core::ConversationController;
pub use messages::{
    CHAT_ERROR_PREFIX, EDIT_ERROR_PREFIX, PLAN_SUMMARY_HEADING, SendOutcome, SessionUpdate, chat_display_content,
};

/// Sending half of the controller's update channel
pub type UpdateSender = mpsc::UnboundedSender<SessionUpdate>;

/// Run one agent request in the background and post its result
///
/// The update is posted even if the request panics, so a busy-gated
/// request always resolves.
pub(crate) fn spawn_request<T, Fut, W>(tx: UpdateSender, request: Fut, wrap: W) -> JoinHandle<()>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, AgentError>> + Send + 'static,
    W: FnOnce(Result<T, AgentError>) -> SessionUpdate + Send + 'static,
{
    tokio::spawn(async move {
        let result = match AssertUnwindSafe(request).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                warn!("Agent request task panicked");
                Err(AgentError::Aborted("request task panicked".to_string()))
            }
        };

        let update = wrap(result);
        let kind = update.kind();
        if tx.send(update).is_err() {
            debug!(kind, "spawn_request: session closed, discarding result");
        }
    })
}
