//! OpenAI chat completions provider.
//!
//! Streaming uses server-sent events terminated by `data: [DONE]`.

use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use crate::lines::{decode_lines, sse_data};
use ragchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    delta: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<Usage> for LlmUsage {
    fn from(usage: Usage) -> Self {
        LlmUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI chat completions client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_OPENAI_URL, api_key)
    }

    /// Point at an OpenAI-compatible server (Azure proxies, vLLM, LM Studio).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client for OpenAI: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn to_openai_request<'a>(
        &self,
        request: &'a LlmRequest,
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            stream,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }

    async fn post(&self, body: &ChatCompletionRequest<'_>) -> AppResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, message
            )));
        }

        Ok(response)
    }
}

/// Map one SSE line of a streamed completion to a chunk.
///
/// Returns `None` for comments and other non-data fields.
fn parse_sse_line(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let data = sse_data(line)?;
    if data == "[DONE]" {
        return None;
    }

    let response: ChatCompletionResponse = match serde_json::from_str(data) {
        Ok(response) => response,
        Err(e) => return Some(Err(AppError::Llm(format!("Failed to parse chunk: {}", e)))),
    };

    // The usage-only chunk arrives last with an empty choice list.
    if response.choices.is_empty() {
        return response
            .usage
            .map(|usage| Ok(LlmStreamChunk::finished(response.model, Some(usage.into()))));
    }

    let choice = &response.choices[0];
    let content = choice
        .delta
        .as_ref()
        .and_then(|d| d.content.clone())
        .unwrap_or_default();

    if content.is_empty() && choice.finish_reason.is_none() {
        return None;
    }

    Some(Ok(LlmStreamChunk {
        content,
        model: response.model,
        done: false,
        usage: None,
    }))
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to OpenAI");
        tracing::debug!(model = %request.model, messages = request.messages.len(), "Request");

        let response = self.post(&self.to_openai_request(request, false)).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| AppError::Llm("OpenAI response contained no choices".to_string()))?;

        Ok(LlmResponse {
            content,
            model: body.model,
            usage: body.usage.map(Into::into).unwrap_or_default(),
            done: true,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming request to OpenAI");
        tracing::debug!(model = %request.model, messages = request.messages.len(), "Request");

        let response = self.post(&self.to_openai_request(request, true)).await?;
        let model = request.model.clone();

        // `[DONE]` is mapped to the terminal chunk here so that servers which
        // skip the usage chunk still signal completion.
        Ok(decode_lines(response.bytes_stream(), move |line| {
            if sse_data(line) == Some("[DONE]") {
                return Some(Ok(LlmStreamChunk::finished(model.clone(), None)));
            }
            parse_sse_line(line)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let client = OpenAiClient::new("sk-test");
        let request = LlmRequest::new(
            vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            "gpt-4o-mini",
        )
        .with_temperature(0.0);

        let json = serde_json::to_value(client.to_openai_request(&request, true)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["stream_options"]["include_usage"], true);
        assert!(json.get("max_tokens").is_none());

        let json = serde_json::to_value(client.to_openai_request(&request, false)).unwrap();
        assert!(json.get("stream_options").is_none());
    }

    #[test]
    fn test_parse_delta_line() {
        let line = r#"data: {"model":"gpt-4o-mini","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.content, "Hel");
        assert!(!chunk.done);
    }

    #[test]
    fn test_role_only_delta_is_skipped() {
        let line = r#"data: {"model":"gpt-4o-mini","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        assert!(parse_sse_line(line).is_none());
    }

    #[test]
    fn test_usage_chunk_finishes() {
        let line = r#"data: {"model":"gpt-4o-mini","choices":[],"usage":{"prompt_tokens":7,"completion_tokens":3,"total_tokens":10}}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.usage, Some(LlmUsage::new(7, 3)));
    }

    #[test]
    fn test_non_data_lines_ignored() {
        assert!(parse_sse_line(": ping").is_none());
        assert!(parse_sse_line("data: [DONE]").is_none());
    }

    #[test]
    fn test_malformed_chunk_is_error() {
        let result = parse_sse_line("data: {not json").unwrap();
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_sse_body_to_stream() {
        use futures::StreamExt;

        let body = futures::stream::iter(vec![
            Ok::<_, String>(
                b"data: {\"model\":\"m\",\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\nda".to_vec(),
            ),
            Ok(b"ta: {\"model\":\"m\",\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\ndata: [DONE]\n\n".to_vec()),
        ]);

        let chunks: Vec<_> = decode_lines(body, |line| {
            if sse_data(line) == Some("[DONE]") {
                return Some(Ok(LlmStreamChunk::finished("m", None)));
            }
            parse_sse_line(line)
        })
        .collect()
        .await;

        let chunks: Vec<LlmStreamChunk> = chunks.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "Hi");
        assert_eq!(chunks[1].content, " there");
        assert!(chunks[2].done);
    }
}
