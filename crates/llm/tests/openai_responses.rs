use scout_core::{AppError, LlmSettings, ProviderSettings};
use scout_llm::{GenerationOutput, GenerationRequest, LlmRouter, ProviderName, UsageStats};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Router whose OpenAI client points at the mock server.
fn router_for(server: &MockServer, api_key: Option<&str>, model: &str) -> LlmRouter {
    let mut settings = LlmSettings::default();
    settings.providers.insert(
        "openai".to_string(),
        ProviderSettings {
            api_key: api_key.map(str::to_string),
            api_key_env: Some("SCOUT_TEST_UNSET_OPENAI_KEY".to_string()),
            base_url: Some(format!("{}/v1", server.uri())),
            model: Some(model.to_string()),
        },
    );
    LlmRouter::new(settings)
}

async fn mount_response(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn sent_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.body_json::<Value>().expect("request body is JSON"))
        .collect()
}

#[tokio::test]
async fn free_text_generation_concatenates_output_text_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_123",
            "status": "completed",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "output_text", "text": "Hello " },
                    { "type": "output_text", "text": "World" }
                ]
            }],
            "usage": { "input_tokens": 120, "output_tokens": 30, "reasoning_tokens": 10 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let request = GenerationRequest::new("Say hello").with_system("You are friendly");

    let result = router.generate(&request).await.expect("generation succeeds");

    assert_eq!(result.provider, ProviderName::OpenAI);
    assert_eq!(result.output, GenerationOutput::Text("Hello World".to_string()));
    assert_eq!(
        result.usage,
        Some(UsageStats {
            prompt_tokens: 120,
            completion_tokens: 30,
            total_tokens: 150,
            reasoning_tokens: 10
        })
    );

    let bodies = sent_bodies(&server).await;
    assert_eq!(
        bodies[0],
        json!({
            "model": "gpt-4.1",
            "input": [
                { "role": "developer", "content": "You are friendly" },
                { "role": "user", "content": "Say hello" }
            ],
            "max_output_tokens": 16000,
            "text": { "verbosity": "low" }
        })
    );
}

#[tokio::test]
async fn structured_generation_sends_strict_schema_and_parses_json() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        200,
        json!({
            "output_text": "{\"name\":\"Ada\",\"years\":12}",
            "usage": { "input_tokens": 50, "output_tokens": 8 }
        }),
    )
    .await;

    let router = router_for(&server, Some("test-key"), "gpt-5-mini");
    let schema = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "years": { "type": "integer" }
        },
        "required": ["name"]
    });
    let request = GenerationRequest::new("Parse this resume")
        .with_schema(schema.clone())
        .with_agent_name("resume-parser");

    let result = router.generate(&request).await.expect("generation succeeds");

    assert_eq!(result.output.as_json(), Some(&json!({ "name": "Ada", "years": 12 })));
    assert_eq!(result.usage, Some(UsageStats::new(50, 8, 0)));

    let body = &sent_bodies(&server).await[0];
    let format = &body["text"]["format"];
    assert_eq!(format["type"], json!("json_schema"));
    assert_eq!(format["name"], json!("resume-parser"));
    assert_eq!(format["strict"], json!(true));
    assert_eq!(format["schema"]["additionalProperties"], json!(false));
    assert_eq!(format["schema"]["required"], json!(["name", "years"]));
    assert_eq!(body["text"]["verbosity"], json!("low"));
    // gpt-5 family receives reasoning controls
    assert_eq!(body["reasoning"], json!({ "effort": "medium" }));

    // The caller's schema is untouched
    assert_eq!(request.json_schema, Some(schema));
}

#[tokio::test]
async fn unparsable_structured_output_is_returned_as_raw_text() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        200,
        json!({
            "output": [{ "type": "message", "content": [{ "type": "output_text", "text": "{not json" }] }]
        }),
    )
    .await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let request = GenerationRequest::new("Score")
        .with_schema(json!({ "type": "object", "properties": { "score": { "type": "number" } } }));

    let result = router.generate(&request).await.expect("degraded success");

    assert_eq!(result.output, GenerationOutput::Unparsed("{not json".to_string()));
    assert_eq!(result.output.as_text(), Some("{not json"));
    assert_eq!(result.usage, None);
    assert_eq!(serde_json::to_value(&result).unwrap()["output"], json!("{not json"));
}

#[tokio::test]
async fn payload_without_text_is_an_empty_response() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        200,
        json!({ "id": "resp_1", "status": "completed", "usage": { "input_tokens": 3 } }),
    )
    .await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let result = router.generate(&GenerationRequest::new("hi")).await;

    assert!(matches!(result, Err(AppError::EmptyResponse { .. })));
    assert_eq!(router.usage().totals(ProviderName::OpenAI).calls, 0);
}

#[tokio::test]
async fn text_content_fallback_is_used_last() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        200,
        json!({ "output": [], "text": { "content": "from text.content" } }),
    )
    .await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let result = router.generate(&GenerationRequest::new("hi")).await.unwrap();

    assert_eq!(result.output.as_text(), Some("from text.content"));
}

#[tokio::test]
async fn http_error_carries_status_and_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited: slow down"))
        .mount(&server)
        .await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let result = router.generate(&GenerationRequest::new("hi")).await;

    match result {
        Err(AppError::ProviderHttp {
            provider,
            status,
            body,
        }) => {
            assert_eq!(provider, "openai");
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited: slow down");
        }
        other => panic!("Expected ProviderHttp, got {:?}", other),
    }
}

#[tokio::test]
async fn incomplete_response_still_returns_output() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        200,
        json!({
            "status": "incomplete",
            "incomplete_details": { "reason": "max_output_tokens" },
            "output": [{ "type": "message", "content": "partial answ" }],
            "usage": { "input_tokens": 10, "output_tokens": 16 }
        }),
    )
    .await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let result = router.generate(&GenerationRequest::new("hi")).await.unwrap();

    assert_eq!(result.output.as_text(), Some("partial answ"));
    assert_eq!(result.usage.map(|u| u.total_tokens), Some(26));
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let server = MockServer::start().await;
    mount_response(&server, 200, json!({ "output_text": "never" })).await;

    let router = router_for(&server, None, "gpt-4.1");
    let result = router.generate(&GenerationRequest::new("hi")).await;

    match result {
        Err(AppError::MissingCredentials { provider }) => assert_eq!(provider, "openai"),
        other => panic!("Expected MissingCredentials, got {:?}", other),
    }
    assert!(sent_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn empty_prompt_fails_before_any_request() {
    let server = MockServer::start().await;
    mount_response(&server, 200, json!({ "output_text": "never" })).await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let result = router.generate(&GenerationRequest::new("")).await;

    assert!(matches!(result, Err(AppError::MissingPrompt)));
    assert!(sent_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn unsupported_provider_makes_no_network_calls() {
    let server = MockServer::start().await;
    mount_response(&server, 200, json!({ "output_text": "never" })).await;

    let router = router_for(&server, Some("test-key"), "gpt-4.1");
    let result = router
        .generate(&GenerationRequest::new("hi").with_provider("unknown"))
        .await;

    match result {
        Err(AppError::UnsupportedProvider(name)) => assert_eq!(name, "unknown"),
        other => panic!("Expected UnsupportedProvider, got {:?}", other),
    }
    assert!(sent_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn non_reasoning_model_gets_no_reasoning_field() {
    let server = MockServer::start().await;
    mount_response(&server, 200, json!({ "output_text": "ok" })).await;

    let router = router_for(&server, Some("test-key"), "gpt-5-mini");
    let request = GenerationRequest::new("hi").with_model("gpt-4o-mini");
    router.generate(&request).await.unwrap();

    let body = &sent_bodies(&server).await[0];
    assert_eq!(body["model"], json!("gpt-4o-mini"));
    assert!(body.get("reasoning").is_none());
}
