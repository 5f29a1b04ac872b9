//! OpenAI client against a local stand-in server.

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use futures::StreamExt;
use roadlaw_core::{Content, CoreError, Llm, LlmRequest, collect_response};
use roadlaw_model::openai::{OpenAIClient, OpenAIConfig};
use serde_json::{Value, json};

/// Chunk envelope with the fields every chat-completions chunk carries.
fn chunk(delta: Value, finish_reason: Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "gpt-test",
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

async fn chat_completions(Json(body): Json<Value>) -> axum::response::Response {
    let last = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    if last == "fail" {
        let error = json!({"error": {"message": "model not found", "type": "invalid_request_error"}});
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    }

    if body["stream"] == json!(true) {
        let mut sse = String::new();
        for piece in ["Mức ", "phạt ", "là"] {
            sse.push_str(&format!("data: {}\n\n", chunk(json!({"content": piece}), Value::Null)));
        }
        let call = chunk(
            json!({"tool_calls": [{"index": 0, "id": "call_1", "type": "function",
                "function": {"name": "search_traffic_law_db", "arguments": "{\"query\":"}}]}),
            Value::Null,
        );
        let rest = chunk(
            json!({"tool_calls": [{"index": 0, "function": {"arguments": "\"đèn đỏ\"}"}}]}),
            json!("tool_calls"),
        );
        sse.push_str(&format!("data: {call}\n\ndata: {rest}\n\ndata: [DONE]\n\n"));
        return ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response();
    }

    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": format!("seed={}", body["seed"])},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn spawn_provider() -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new().route("/v1/chat/completions", post(chat_completions));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    (format!("http://{addr}/v1"), handle)
}

#[tokio::test]
async fn streaming_yields_deltas_then_assembled_tool_call() {
    let (base, handle) = spawn_provider().await;
    let client = OpenAIClient::new(OpenAIConfig::compatible("sk-test", base, "gpt-test")).unwrap();

    let stream = client
        .generate_content(LlmRequest::new(vec![Content::user("hỏi")]), true)
        .await
        .unwrap();
    let items: Vec<_> = stream.collect().await;
    let deltas: Vec<String> = items
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .filter(|r| r.partial)
        .map(|r| r.text_content())
        .collect();
    assert_eq!(deltas, vec!["Mức ", "phạt ", "là"]);

    let last = items.last().unwrap().as_ref().unwrap();
    assert!(last.turn_complete);
    let content = last.content.as_ref().unwrap();
    let call = content.function_calls().next().unwrap();
    assert_eq!(call.id, Some("call_1"));
    assert_eq!(call.args, &json!({"query": "đèn đỏ"}));

    handle.abort();
}

#[tokio::test]
async fn non_streaming_forwards_seed() {
    let (base, handle) = spawn_provider().await;
    let client = OpenAIClient::new(OpenAIConfig::compatible("sk-test", base, "gpt-test")).unwrap();

    let request = LlmRequest::new(vec![Content::user("hỏi")])
        .with_config(roadlaw_core::GenerateConfig::deterministic(13));
    let stream = client.generate_content(request, false).await.unwrap();
    let content = collect_response(stream).await.unwrap();
    assert_eq!(content.text(), "seed=13");

    handle.abort();
}

#[tokio::test]
async fn error_status_surfaces_provider_message() {
    let (base, handle) = spawn_provider().await;
    let client = OpenAIClient::new(OpenAIConfig::compatible("sk-test", base, "gpt-test")).unwrap();

    let stream = client
        .generate_content(LlmRequest::new(vec![Content::user("fail")]), false)
        .await
        .unwrap();
    let err = collect_response(stream).await.unwrap_err();
    match err {
        CoreError::Model(message) => assert!(message.contains("model not found"), "{message}"),
        other => panic!("unexpected error {other:?}"),
    }

    handle.abort();
}

#[tokio::test]
async fn error_status_fails_a_streaming_call() {
    let (base, handle) = spawn_provider().await;
    let client = OpenAIClient::new(OpenAIConfig::compatible("sk-test", base, "gpt-test")).unwrap();

    let stream = client
        .generate_content(LlmRequest::new(vec![Content::user("fail")]), true)
        .await
        .unwrap();
    let err = collect_response(stream).await.unwrap_err();
    assert!(matches!(err, CoreError::Model(_)), "{err:?}");

    handle.abort();
}
