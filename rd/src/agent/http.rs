//! HTTP implementation of the agent service
//!
//! Talks JSON to the research agent's REST API. Non-2xx replies surface as
//! [`AgentError::Api`] carrying the service's `detail` text when it has one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    AgentError, AgentService, CacheClearReply, CacheStatusReply, ChatReply, ChatRequest, EditReply, EditRequest,
    HealthReply, PlanContentReply, PlanListReply, StatusReply,
};
use crate::config::AgentConfig;

/// HTTP client for the research agent
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    base_url: Url,
    http: Client,
    timeout: Duration,
}

impl HttpAgentClient {
    /// Create a client from configuration
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        debug!(?config, "from_config: called");
        let base_url = parse_base_url(&config.base_url)?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(AgentError::Network)?;

        Ok(Self {
            base_url,
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments
    ///
    /// Each segment is percent-encoded on its own, so a plan filename can
    /// never escape its `/plan/` prefix.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AgentError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AgentError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(self.timeout)
        } else {
            AgentError::Network(err)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, AgentError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "get_json: called");
        let response = self.http.get(url).send().await.map_err(|e| self.classify(e))?;
        self.read_json(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, AgentError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "post_json: called");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T, AgentError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "read_json: API error");
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: error_detail(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| AgentError::InvalidResponse(e.to_string()))
    }
}

/// Parse and sanity-check the configured base URL
fn parse_base_url(raw: &str) -> Result<Url, AgentError> {
    let url = Url::parse(raw.trim()).map_err(|e| AgentError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(AgentError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

/// Pull the human-readable reason out of an error body
///
/// The agent answers failures with `{"detail": "..."}`; anything else is
/// passed through verbatim.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl AgentService for HttpAgentClient {
    async fn status(&self) -> Result<StatusReply, AgentError> {
        self.get_json(&["status"]).await
    }

    async fn list_plans(&self) -> Result<PlanListReply, AgentError> {
        self.get_json(&["plans"]).await
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AgentError> {
        self.post_json(&["chat"], &request).await
    }

    async fn plan_content(&self, filename: &str) -> Result<PlanContentReply, AgentError> {
        self.get_json(&["plan", filename]).await
    }

    async fn edit_plan(&self, request: EditRequest) -> Result<EditReply, AgentError> {
        self.post_json(&["edit-plan"], &request).await
    }

    async fn health(&self) -> Result<HealthReply, AgentError> {
        self.get_json(&["health"]).await
    }

    async fn cache_status(&self) -> Result<CacheStatusReply, AgentError> {
        self.get_json(&["cache", "status"]).await
    }

    async fn clear_cache(&self) -> Result<CacheClearReply, AgentError> {
        self.post_json(&["cache", "clear"], &serde_json::json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpAgentClient {
        HttpAgentClient::from_config(&AgentConfig {
            base_url: base_url.to_string(),
            timeout_ms: 1000,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_basic() {
        let c = client("http://localhost:8000");
        assert_eq!(c.endpoint(&["status"]).unwrap().as_str(), "http://localhost:8000/status");
        assert_eq!(
            c.endpoint(&["cache", "status"]).unwrap().as_str(),
            "http://localhost:8000/cache/status"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("https://agents.example.com/research/");
        assert_eq!(
            c.endpoint(&["edit-plan"]).unwrap().as_str(),
            "https://agents.example.com/research/edit-plan"
        );
    }

    #[test]
    fn test_plan_filename_is_one_segment() {
        let c = client("http://localhost:8000");
        let url = c.endpoint(&["plan", "../secrets/a b.md"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/plan/..%2Fsecrets%2Fa%20b.md");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpAgentClient::from_config(&AgentConfig {
            base_url: "not a url".to_string(),
            timeout_ms: 1000,
        })
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidUrl(_)));

        let err = HttpAgentClient::from_config(&AgentConfig {
            base_url: "ftp://localhost".to_string(),
            timeout_ms: 1000,
        })
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidUrl(_)));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail": "Plan not found"}"#), "Plan not found");
        assert_eq!(error_detail("Internal Server Error\n"), "Internal Server Error");
        assert_eq!(error_detail(r#"{"error": "x"}"#), r#"{"error": "x"}"#);
    }
}
