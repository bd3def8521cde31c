//! OpenAI-compatible chat completions provider
//!
//! Adapter for backends exposing the OpenAI `/chat/completions` wire shape
//! (Cerebras and Groq in the reference deployment). One instance per
//! configured backend; the base URL and model come from configuration.

use crate::error::{CiceroneError, Result};
use crate::providers::base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider for OpenAI-compatible chat completion APIs
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsagePayload>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Deserialize)]
struct ResponseFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct UsagePayload {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

impl OpenAiCompatProvider {
    /// Creates a new OpenAI-compatible provider
    ///
    /// # Arguments
    ///
    /// * `name` - Backend name for logs and errors (e.g. "cerebras")
    /// * `base_url` - API base URL without the `/chat/completions` suffix
    /// * `api_key` - Bearer token for the backend
    /// * `model` - Model identifier to request
    /// * `temperature` - Sampling temperature
    /// * `max_tokens` - Completion token limit
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
            client,
        })
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> CiceroneError {
        let detail = format!("{}: HTTP {} - {}", self.name, status.as_u16(), truncate(body));
        if status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
        {
            CiceroneError::ProviderTransient(detail)
        } else {
            CiceroneError::ProviderPermanent(detail)
        }
    }
}

fn truncate(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages: validate_message_sequence(messages),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.to_vec())
            },
        };

        tracing::debug!(
            backend = %self.name,
            model = %self.model,
            message_count = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    CiceroneError::ProviderTransient(format!("{}: {}", self.name, e))
                } else {
                    CiceroneError::ProviderPermanent(format!("{}: {}", self.name, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify_status(status, &body).into());
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            CiceroneError::ProviderTransient(format!("{}: malformed response: {}", self.name, e))
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            CiceroneError::ProviderTransient(format!("{}: response had no choices", self.name))
        })?;

        let message = match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => Message::assistant_with_tools(
                calls
                    .into_iter()
                    .map(|c| ToolCall {
                        id: c.id,
                        function: FunctionCall {
                            name: c.function.name,
                            arguments: c.function.arguments,
                        },
                    })
                    .collect(),
            ),
            _ => Message::assistant(choice.message.content.unwrap_or_default()),
        };

        let usage = parsed
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        Ok(CompletionResponse { message, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            "test_backend",
            server.uri(),
            "test-key",
            "test-model",
            0.7,
            1024,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_text_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Here is your plan."}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let response = provider
            .complete(&[Message::user("Plan a trip")], &[])
            .await
            .unwrap();

        assert_eq!(
            response.message.content,
            Some("Here is your plan.".to_string())
        );
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_complete_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "search_pois",
                            "arguments": "{\"interests\":[\"culture\"]}"
                        }
                    }]
                }}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let response = provider
            .complete(&[Message::user("Plan a trip")], &[])
            .await
            .unwrap();

        let calls = response.message.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "search_pois");
    }

    #[tokio::test]
    async fn test_rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();

        let cicerone = err.downcast_ref::<CiceroneError>().unwrap();
        assert!(cicerone.is_transient());
    }

    #[tokio::test]
    async fn test_unauthorized_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();

        let cicerone = err.downcast_ref::<CiceroneError>().unwrap();
        assert!(!cicerone.is_transient());
        assert!(matches!(cicerone, CiceroneError::ProviderPermanent(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<CiceroneError>().unwrap().is_transient());
    }
}
