//! Chat-completion client with single-response and streamed modes.

use std::time::{Duration, Instant};

use reqwest::header;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use crate::config::CompletionConfig;
use crate::errors::{CompletionError, CompletionResult, make_snippet};

/// Fixed system instruction sent with every review request.
const SYSTEM_PROMPT: &str =
    "You are a helpful code reviewer. Analyze the following code changes and provide constructive feedback.";

/// Thin client for an OpenAI-style chat-completions API.
///
/// Constructed once at startup from a complete [`CompletionConfig`] and kept
/// alive for the process. Internally owns a preconfigured `reqwest::Client`
/// with bearer auth and a bounded timeout.
#[derive(Debug)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    cfg: CompletionConfig,
    url_chat: String,
}

impl ChatCompletionClient {
    /// Creates a new client, validating the API key and endpoint scheme.
    ///
    /// # Errors
    /// - [`CompletionError::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`CompletionError::InvalidEndpoint`] if the endpoint is not http(s)
    /// - [`CompletionError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: CompletionConfig) -> CompletionResult<Self> {
        let api_key = cfg.api_key.clone().ok_or(CompletionError::MissingApiKey)?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(CompletionError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| CompletionError::Decode(format!("invalid api key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'));

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            stream = cfg.stream,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "ChatCompletionClient initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Sends the diff for review and returns the generated feedback text.
    ///
    /// Uses the streamed or single-response path depending on `cfg.stream`;
    /// both yield the same concatenated text for the same content.
    pub async fn review_diff(&self, diff: &str) -> CompletionResult<String> {
        let prompt = format!("Please review this code diff:\n\n{diff}");
        if self.cfg.stream {
            self.generate_streamed(&prompt, SYSTEM_PROMPT).await
        } else {
            self.generate(&prompt, SYSTEM_PROMPT).await
        }
    }

    /// Single-response chat completion.
    async fn generate(&self, prompt: &str, system: &str) -> CompletionResult<String> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system, false);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                url = %self.url_chat,
                %snippet,
                latency_ms = started.elapsed().as_millis() as u64,
                "chat completion returned non-success status"
            );

            return Err(CompletionError::HttpStatus {
                status: status.as_u16(),
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            CompletionError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(CompletionError::EmptyChoices)?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion completed"
        );

        Ok(content)
    }

    /// Streamed chat completion over SSE.
    ///
    /// Incremental `choices[].delta.content` fragments are concatenated in
    /// arrival order; the `[DONE]` sentinel or stream end terminates.
    async fn generate_streamed(&self, prompt: &str, system: &str) -> CompletionResult<String> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system, true);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            "POST {} (stream)", self.url_chat
        );

        let mut es = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .eventsource()
            .map_err(|e| CompletionError::Stream(e.to_string()))?;

        let mut feedback = String::new();
        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    let data = msg.data.trim();
                    if data.is_empty() {
                        continue;
                    }
                    if data == "[DONE]" {
                        break;
                    }
                    let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| {
                        CompletionError::Decode(format!(
                            "serde error: {e}; expected `choices[0].delta.content`"
                        ))
                    })?;
                    if let Some(fragment) = chunk.choices.into_iter().find_map(|c| c.delta.content)
                    {
                        feedback.push_str(&fragment);
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, resp)) => {
                    let text = resp.text().await.unwrap_or_default();
                    let snippet = make_snippet(&text);
                    error!(%status, url = %self.url_chat, %snippet, "completion stream rejected");
                    es.close();
                    return Err(CompletionError::HttpStatus {
                        status: status.as_u16(),
                        snippet,
                    });
                }
                Err(e) => {
                    es.close();
                    return Err(CompletionError::Stream(e.to_string()));
                }
            }
        }
        es.close();

        if feedback.is_empty() {
            return Err(CompletionError::EmptyChoices);
        }

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis() as u64,
            chars = feedback.len(),
            "streamed chat completion completed"
        );

        Ok(feedback)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `/v1/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a CompletionConfig, prompt: &'a str, system: &'a str, stream: bool) -> Self {
        Self {
            model: &cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Single-response shape (subset of fields we use).
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// One SSE chunk of a streamed response.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg(endpoint: &str, stream: bool) -> CompletionConfig {
        CompletionConfig {
            model: "test-model".into(),
            endpoint: endpoint.into(),
            api_key: Some("test-key".into()),
            temperature: Some(1.0),
            top_p: Some(1.0),
            max_tokens: Some(64),
            timeout_secs: Some(5),
            stream,
        }
    }

    #[test]
    fn new_rejects_missing_api_key() {
        let mut cfg = test_cfg("https://example.com", false);
        cfg.api_key = None;
        assert!(matches!(
            ChatCompletionClient::new(cfg),
            Err(CompletionError::MissingApiKey)
        ));
    }

    #[test]
    fn new_rejects_bad_endpoint_scheme() {
        let cfg = test_cfg("ftp://example.com", false);
        assert!(matches!(
            ChatCompletionClient::new(cfg),
            Err(CompletionError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn sync_review_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Looks good."}}]}"#)
            .create_async()
            .await;

        let client = ChatCompletionClient::new(test_cfg(&server.url(), false)).unwrap();
        let out = client.review_diff("diff --git a/x b/x").await.unwrap();
        assert_eq!(out, "Looks good.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn stalled_endpoint_maps_to_timeout() {
        // Bound but never accepted, so the request hangs until the client
        // timeout fires.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut cfg = test_cfg(&format!("http://{addr}"), false);
        cfg.timeout_secs = Some(1);

        let client = ChatCompletionClient::new(cfg).unwrap();
        let err = client.review_diff("diff").await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout));
    }

    #[tokio::test]
    async fn sync_review_maps_upstream_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ChatCompletionClient::new(test_cfg(&server.url(), false)).unwrap();
        let err = client.review_diff("diff").await.unwrap_err();
        match err {
            CompletionError::HttpStatus { status, snippet } => {
                assert_eq!(status, 500);
                assert_eq!(snippet, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn sync_review_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = ChatCompletionClient::new(test_cfg(&server.url(), false)).unwrap();
        assert!(matches!(
            client.review_diff("diff").await,
            Err(CompletionError::EmptyChoices)
        ));
    }

    #[tokio::test]
    async fn streamed_and_sync_modes_yield_identical_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex(r#""stream":false"#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Looks good to me."}}]}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex(r#""stream":true"#.into()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Looks \"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"good \"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"to me.\"}}]}\n\n",
                "data: [DONE]\n\n",
            ))
            .create_async()
            .await;

        let sync_client = ChatCompletionClient::new(test_cfg(&server.url(), false)).unwrap();
        let stream_client = ChatCompletionClient::new(test_cfg(&server.url(), true)).unwrap();

        let sync_out = sync_client.review_diff("diff").await.unwrap();
        let stream_out = stream_client.review_diff("diff").await.unwrap();
        assert_eq!(sync_out, stream_out);
        assert_eq!(stream_out, "Looks good to me.");
    }

    #[tokio::test]
    async fn streamed_review_maps_rejected_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let client = ChatCompletionClient::new(test_cfg(&server.url(), true)).unwrap();
        let err = client.review_diff("diff").await.unwrap_err();
        match err {
            CompletionError::HttpStatus { status, .. } => assert_eq!(status, 429),
            other => panic!("unexpected error: {other}"),
        }
    }
}
