//! Integration tests for chatstream against a local SSE server.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::future::pending;
use std::time::Duration;

use chatstream::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ChatClient {
    let config = ClientConfig::new("test-key").with_base_url(format!("{}/v1", server.uri()));
    ChatClient::new(config).unwrap()
}

fn sse(events: &[&str]) -> String {
    events.iter().map(|e| format!("{e}\n\n")).collect()
}

async fn mount_sse(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(server)
        .await;
}

async fn run(client: &ChatClient, mode: ContentMode) -> (Result<SessionOutcome>, String) {
    let mut stream = client.open_stream(&ChatRequest::joke()).await.unwrap();
    let mut out = Vec::new();
    let result = run_session(&mut stream, &mut out, pending::<()>(), mode).await;
    assert!(stream.is_closed());
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_two_fragments_then_exhaustion() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        sse(&[
            r#"data: {"choices":[{"message":{"content":"Why did the chicken..."}}]}"#,
            r#"data: {"choices":[{"message":{"content":" cross the road?"}}]}"#,
        ]),
    )
    .await;

    let (result, out) = run(&client_for(&server), ContentMode::Message).await;

    let outcome = result.unwrap();
    assert_eq!(outcome.end, SessionEnd::Exhausted);
    assert_eq!(outcome.fragments, 2);
    assert_eq!(
        out,
        "Received: Why did the chicken...\nReceived:  cross the road?\n"
    );
    assert!(!out.contains(CLOSING_NOTICE));
}

#[tokio::test]
async fn test_event_without_data_produces_no_line() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        sse(&[
            "event: ping",
            r#"data: {"choices":[{"index":0}]}"#,
            r#"data: {"choices":[{"message":{"content":"still here"}}]}"#,
        ]),
    )
    .await;

    let (result, out) = run(&client_for(&server), ContentMode::Message).await;

    assert_eq!(result.unwrap().fragments, 1);
    assert_eq!(out, "Received: still here\n");
}

#[tokio::test]
async fn test_delta_chunks_until_done() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        sse(&[
            r#"data: {"id":"chatcmpl-1","object":"chat.completion.chunk","model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#,
            r#"data: {"id":"chatcmpl-1","object":"chat.completion.chunk","model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{"content":"Knock"},"finish_reason":null}]}"#,
            r#"data: {"id":"chatcmpl-1","object":"chat.completion.chunk","model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{"content":" knock"},"finish_reason":null}]}"#,
            r#"data: {"id":"chatcmpl-1","object":"chat.completion.chunk","model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            "data: [DONE]",
        ]),
    )
    .await;

    let (result, out) = run(&client_for(&server), ContentMode::Delta).await;

    let outcome = result.unwrap();
    assert_eq!(outcome.end, SessionEnd::Done);
    assert_eq!(outcome.events, 5);
    assert_eq!(out, "Received: Knock\nReceived:  knock\n");
}

#[tokio::test]
async fn test_malformed_payload_is_fatal() {
    let server = MockServer::start().await;
    mount_sse(
        &server,
        sse(&[
            r#"data: {"choices":[{"message":{"content":"before"}}]}"#,
            "data: not json at all",
            r#"data: {"choices":[{"message":{"content":"after"}}]}"#,
        ]),
    )
    .await;

    let (result, out) = run(&client_for(&server), ContentMode::Message).await;

    match result {
        Err(Error::Decode { data, .. }) => assert_eq!(data, "not json at all"),
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(out, "Received: before\n");
}

#[tokio::test]
async fn test_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "stream": true,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Tell me a joke."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(String::new(), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(&client_for(&server), ContentMode::Message).await;

    assert_eq!(result.unwrap().events, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_open_stream_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .open_stream(&ChatRequest::joke())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_open_stream_connection_refused() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let err = client.open_stream(&ChatRequest::joke()).await.unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert!(err.is_retryable());
}

/// Serves one request, then writes `events` one at a time, `gap` apart.
async fn serve_slowly(events: &'static [&'static str], gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let head = b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";
        if socket.write_all(head).await.is_err() {
            return;
        }
        for event in events {
            tokio::time::sleep(gap).await;
            // The client may already have given up.
            if socket.write_all(format!("{event}\n\n").as_bytes()).await.is_err() {
                return;
            }
        }
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/v1")
}

#[tokio::test]
async fn test_timeout_bounds_each_wait_not_the_whole_stream() {
    let base_url = serve_slowly(
        &[
            r#"data: {"choices":[{"message":{"content":"one"}}]}"#,
            r#"data: {"choices":[{"message":{"content":"two"}}]}"#,
            r#"data: {"choices":[{"message":{"content":"three"}}]}"#,
            r#"data: {"choices":[{"message":{"content":"four"}}]}"#,
        ],
        Duration::from_millis(400),
    )
    .await;
    let client = ChatClient::new(
        ClientConfig::new("test-key")
            .with_base_url(base_url)
            .with_timeout(1),
    )
    .unwrap();

    let (result, out) = run(&client, ContentMode::Message).await;

    assert_eq!(result.unwrap().fragments, 4);
    assert_eq!(
        out,
        "Received: one\nReceived: two\nReceived: three\nReceived: four\n"
    );
}

#[tokio::test]
async fn test_timeout_fires_when_the_stream_stalls() {
    let base_url = serve_slowly(
        &[r#"data: {"choices":[{"message":{"content":"late"}}]}"#],
        Duration::from_secs(3),
    )
    .await;
    let client = ChatClient::new(
        ClientConfig::new("test-key")
            .with_base_url(base_url)
            .with_timeout(1),
    )
    .unwrap();

    let (result, out) = run(&client, ContentMode::Message).await;

    assert!(matches!(result, Err(Error::Stream(_))));
    assert!(out.is_empty());
}
