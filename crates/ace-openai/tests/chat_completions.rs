use std::sync::Arc;
use std::time::Duration;

use ace_core::{
    CompletionProvider, PipelineConfig, Playbook, PlaybookEntry, ProviderError, StageName, Task,
    TeamManager, TemplatePrompts,
};
use ace_openai::{OpenAiClient, OpenAiConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig::new("test-key").with_base_url(&server.uri())).unwrap()
}

#[tokio::test]
async fn json_reply_is_decoded_into_response_map() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-mini",
            "temperature": 0.0,
            "response_format": {"type": "json_object"},
            "messages": [{"role": "user", "content": "ping"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"answer": "pong"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("ping").await.unwrap();

    assert_eq!(reply["answer"], "pong");
}

#[tokio::test]
async fn non_json_content_yields_empty_map() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Sure! Here you go.")))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("ping").await.unwrap();

    assert!(reply.is_empty());
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("ping").await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::Authentication("invalid api key".to_string())
    );
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("ping").await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::Status {
            status: 503,
            body: "overloaded".to_string()
        }
    );
}

#[tokio::test]
async fn missing_api_key_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(OpenAiConfig::default().with_base_url(&server.uri())).unwrap();
    let err = client.complete("ping").await.unwrap_err();

    assert!(matches!(err, ProviderError::Configuration(_)));
}

#[tokio::test]
async fn slow_server_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{}"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = OpenAiClient::new(
        OpenAiConfig::new("test-key")
            .with_base_url(&server.uri())
            .with_timeout_secs(1),
    )
    .unwrap();
    let err = client.complete("ping").await.unwrap_err();

    assert_eq!(err, ProviderError::Timeout { after_ms: 1000 });
}

#[tokio::test]
async fn standard_team_runs_over_http() {
    // One payload carrying every stage's fields satisfies all three schemas.
    let payload = json!({
        "reasoning": "sum divided by count",
        "bullet_ids": ["003 formulas_and_calculations"],
        "final_answer": "4.5",
        "error_identification": "none",
        "root_cause_analysis": "none",
        "correct_approach": "as given",
        "key_insight": "divide by the filtered count",
        "bullet_tags": [{"bullet_id": "003 formulas_and_calculations", "tag": "helpful"}],
        "operations": []
    });
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&payload.to_string())))
        .expect(3)
        .mount(&server)
        .await;

    let team = TeamManager::standard(
        Arc::new(client_for(&server)),
        Arc::new(TemplatePrompts::new()),
        &PipelineConfig::default(),
    );
    let task = Task::new(
        "compute average of numeric strings",
        Playbook::new(vec![PlaybookEntry::new(
            "003 formulas_and_calculations",
            "average = sum/count",
        )]),
    );

    let ctx = team.run(&task).await.unwrap();

    assert_eq!(
        ctx.keys(),
        &[StageName::Generator, StageName::Reflector, StageName::Curator]
    );
    assert_eq!(ctx.generator()[0].final_answer, "4.5");
    assert!(ctx.curator()[0].operations.is_empty());
}
