//! AgentService trait definition

use async_trait::async_trait;

use super::{
    AgentError, CacheClearReply, CacheStatusReply, ChatReply, ChatRequest, EditReply, EditRequest, HealthReply,
    PlanContentReply, PlanListReply, StatusReply,
};

/// Request/reply boundary with the remote research agent
///
/// Every call is a single round trip with no retries; a failed call is
/// final for that attempt.
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Current agent state snapshot
    async fn status(&self) -> Result<StatusReply, AgentError>;

    /// Summaries of every generated plan
    async fn list_plans(&self) -> Result<PlanListReply, AgentError>;

    /// Relay a user message to the agent
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AgentError>;

    /// Full body of one plan
    async fn plan_content(&self, filename: &str) -> Result<PlanContentReply, AgentError>;

    /// Ask the agent to rewrite one plan section
    async fn edit_plan(&self, request: EditRequest) -> Result<EditReply, AgentError>;

    async fn health(&self) -> Result<HealthReply, AgentError>;

    async fn cache_status(&self) -> Result<CacheStatusReply, AgentError>;

    async fn clear_cache(&self) -> Result<CacheClearReply, AgentError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tracing::debug;

    /// Scripted outcome; `Err` carries the message of a 500 reply
    pub type Scripted<T> = Result<T, String>;

    fn next_scripted<T: Clone + Default>(queue: &Mutex<VecDeque<Scripted<T>>>, sticky: bool) -> Result<T, AgentError> {
        let mut queue = queue.lock().unwrap();
        let next = if sticky && queue.len() == 1 {
            queue.front().cloned()
        } else {
            queue.pop_front()
        };
        next.unwrap_or_else(|| Ok(T::default())).map_err(|message| AgentError::Api {
            status: 500,
            message,
        })
    }

    /// Mock agent for unit tests
    ///
    /// Each endpoint pops scripted replies in order and falls back to an
    /// empty default reply. Status replies are sticky: the last scripted one
    /// keeps answering. Chat and edit replies can be held open with
    /// [`MockAgent::gate_replies`] until [`MockAgent::release`] is called.
    #[derive(Default)]
    pub struct MockAgent {
        statuses: Mutex<VecDeque<Scripted<StatusReply>>>,
        plan_lists: Mutex<VecDeque<Scripted<PlanListReply>>>,
        chats: Mutex<VecDeque<Scripted<ChatReply>>>,
        contents: Mutex<VecDeque<Scripted<PlanContentReply>>>,
        edits: Mutex<VecDeque<Scripted<EditReply>>>,
        chat_requests: Mutex<Vec<ChatRequest>>,
        edit_requests: Mutex<Vec<EditRequest>>,
        content_requests: Mutex<Vec<String>>,
        status_calls: AtomicUsize,
        list_calls: AtomicUsize,
        gated: Mutex<bool>,
        gate: Notify,
    }

    impl MockAgent {
        pub fn new() -> Self {
            debug!("MockAgent::new: called");
            Self::default()
        }

        pub fn with_status(self, reply: Scripted<StatusReply>) -> Self {
            self.statuses.lock().unwrap().push_back(reply);
            self
        }

        pub fn with_plans(self, reply: Scripted<PlanListReply>) -> Self {
            self.plan_lists.lock().unwrap().push_back(reply);
            self
        }

        pub fn with_chat(self, reply: Scripted<ChatReply>) -> Self {
            self.chats.lock().unwrap().push_back(reply);
            self
        }

        pub fn with_content(self, reply: Scripted<PlanContentReply>) -> Self {
            self.contents.lock().unwrap().push_back(reply);
            self
        }

        pub fn with_edit(self, reply: Scripted<EditReply>) -> Self {
            self.edits.lock().unwrap().push_back(reply);
            self
        }

        /// Queue another status reply after construction
        pub fn push_status(&self, reply: Scripted<StatusReply>) {
            let mut queue = self.statuses.lock().unwrap();
            queue.clear();
            queue.push_back(reply);
        }

        /// Hold chat and edit replies until released
        pub fn gate_replies(self) -> Self {
            *self.gated.lock().unwrap() = true;
            self
        }

        /// Let one held chat or edit reply through
        pub fn release(&self) {
            self.gate.notify_one();
        }

        pub fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }

        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub fn chat_requests(&self) -> Vec<ChatRequest> {
            self.chat_requests.lock().unwrap().clone()
        }

        pub fn edit_requests(&self) -> Vec<EditRequest> {
            self.edit_requests.lock().unwrap().clone()
        }

        pub fn content_requests(&self) -> Vec<String> {
            self.content_requests.lock().unwrap().clone()
        }

        async fn wait_for_gate(&self) {
            let gated = *self.gated.lock().unwrap();
            if gated {
                debug!("MockAgent: holding reply until released");
                self.gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl AgentService for MockAgent {
        async fn status(&self) -> Result<StatusReply, AgentError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            next_scripted(&self.statuses, true)
        }

        async fn list_plans(&self) -> Result<PlanListReply, AgentError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            next_scripted(&self.plan_lists, true)
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AgentError> {
            debug!(message = %request.message, "MockAgent::chat: called");
            self.chat_requests.lock().unwrap().push(request);
            self.wait_for_gate().await;
            next_scripted(&self.chats, false)
        }

        async fn plan_content(&self, filename: &str) -> Result<PlanContentReply, AgentError> {
            self.content_requests.lock().unwrap().push(filename.to_string());
            next_scripted(&self.contents, false)
        }

        async fn edit_plan(&self, request: EditRequest) -> Result<EditReply, AgentError> {
            self.edit_requests.lock().unwrap().push(request);
            self.wait_for_gate().await;
            next_scripted(&self.edits, false)
        }

        async fn health(&self) -> Result<HealthReply, AgentError> {
            Ok(HealthReply {
                status: "healthy".to_string(),
                timestamp: None,
            })
        }

        async fn cache_status(&self) -> Result<CacheStatusReply, AgentError> {
            Ok(CacheStatusReply::default())
        }

        async fn clear_cache(&self) -> Result<CacheClearReply, AgentError> {
            Ok(CacheClearReply {
                success: true,
                message: Some("Cache cleared".to_string()),
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_returns_scripted_replies_in_order() {
            let agent = MockAgent::new()
                .with_chat(Ok(ChatReply::text("first")))
                .with_chat(Err("boom".to_string()));

            let first = agent
                .chat(ChatRequest {
                    message: "a".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(first.response, "first");

            let second = agent
                .chat(ChatRequest {
                    message: "b".to_string(),
                })
                .await;
            assert!(matches!(second, Err(AgentError::Api { status: 500, .. })));

            // Exhausted queue falls back to a default reply
            let third = agent
                .chat(ChatRequest {
                    message: "c".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(third.response, "");
            assert_eq!(agent.chat_requests().len(), 3);
        }

        #[tokio::test]
        async fn test_mock_status_is_sticky() {
            let agent = MockAgent::new().with_status(Ok(StatusReply {
                state: "researching".into(),
                current_company: Some("Tesla".to_string()),
                status: None,
            }));

            for _ in 0..3 {
                let reply = agent.status().await.unwrap();
                assert_eq!(reply.current_company.as_deref(), Some("Tesla"));
            }
            assert_eq!(agent.status_calls(), 3);
        }
    }
}
