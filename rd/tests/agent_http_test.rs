//! HTTP agent client against a local mock server
//!
//! Checks method and path per exchange, body encoding, reply decoding and
//! how non-2xx statuses surface.

use researchdesk::agent::{AgentError, AgentService, AgentState, ChatRequest, EditRequest, HttpAgentClient};
use researchdesk::config::AgentConfig;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, timeout_ms: u64) -> HttpAgentClient {
    HttpAgentClient::from_config(&AgentConfig {
        base_url: server.uri(),
        timeout_ms,
    })
    .unwrap()
}

#[tokio::test]
async fn test_chat_posts_message_and_decodes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"message": "Research Tesla"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Starting research on Tesla",
            "state": "complete",
            "plan_summary": "Focus on energy storage",
            "current_company": "Tesla"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server, 2000)
        .chat(ChatRequest {
            message: "Research Tesla".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(reply.response, "Starting research on Tesla");
    assert_eq!(reply.state, Some(AgentState::Complete));
    assert_eq!(reply.summary(), Some("Focus on energy storage"));
    assert!(reply.signals_new_plan());
}

#[tokio::test]
async fn test_missing_plan_maps_detail_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plan/Tesla%20Inc.md"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Plan not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 2000).plan_content("Tesla Inc.md").await.unwrap_err();

    match err {
        AgentError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Plan not found");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plan_content_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plan/tesla_20240101.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filename": "tesla_20240101.md",
            "content": "# Tesla Account Plan"
        })))
        .mount(&server)
        .await;

    let reply = client(&server, 2000).plan_content("tesla_20240101.md").await.unwrap();
    assert_eq!(reply.content, "# Tesla Account Plan");
    assert_eq!(reply.filename.as_deref(), Some("tesla_20240101.md"));
}

#[tokio::test]
async fn test_status_keeps_unknown_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "editing",
            "current_company": "Tesla",
            "status": "Rewriting overview"
        })))
        .mount(&server)
        .await;

    let status = client(&server, 2000).status().await.unwrap();
    assert_eq!(status.state, AgentState::Other("editing".to_string()));
    assert_eq!(status.current_company.as_deref(), Some("Tesla"));
    assert_eq!(status.status.as_deref(), Some("Rewriting overview"));
}

#[tokio::test]
async fn test_plan_list_defaults_company() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plans": [
                {"company": "Tesla", "timestamp": "20240101_120000", "filename": "tesla.md"},
                {"filename": "mystery.md"}
            ]
        })))
        .mount(&server)
        .await;

    let reply = client(&server, 2000).list_plans().await.unwrap();
    assert_eq!(reply.plans.len(), 2);
    assert_eq!(reply.plans[0].company, "Tesla");
    assert_eq!(reply.plans[1].company, "Unknown");
}

#[tokio::test]
async fn test_edit_plan_posts_section_and_instructions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/edit-plan"))
        .and(body_json(json!({"section": "overview", "instructions": "make it shorter"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Overview updated",
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server, 2000)
        .edit_plan(EditRequest {
            section: "overview".to_string(),
            instructions: "make it shorter".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(reply.response, "Overview updated");
    assert!(reply.succeeded());
}

#[tokio::test]
async fn test_server_error_without_detail_passes_body_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client(&server, 2000)
        .chat(ChatRequest {
            message: "hi".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API error 500: Internal Server Error");
}

#[tokio::test]
async fn test_malformed_reply_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server, 2000).status().await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_agent_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "healthy"}))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client(&server, 200).health().await.unwrap_err();
    assert!(matches!(err, AgentError::Timeout(_)));
}
