//! Google Gemini provider
//!
//! Adapter for the `generativelanguage` `:generateContent` endpoint. The
//! Gemini wire shape differs from the OpenAI one in three ways that this
//! module papers over: system messages travel as `systemInstruction`, tool
//! schemas as `functionDeclarations`, and tool results as `functionResponse`
//! parts inside a user turn.

use crate::error::{CiceroneError, Result};
use crate::providers::base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Provider for Google Gemini models
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: usize,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: usize,
}

impl GeminiProvider {
    /// Creates a new Gemini provider
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

    /// Builds the Gemini request body from the shared message shape
    ///
    /// System messages are collected into `systemInstruction`; tool-result
    /// messages become `functionResponse` parts; assistant tool calls become
    /// `functionCall` parts. Tool-call names are remembered per id so the
    /// matching `functionResponse` can carry the function name Gemini
    /// requires.
    fn build_request(&self, messages: &[Message], tools: &[Value]) -> Value {
        let mut system_parts: Vec<Value> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();
        let mut call_names: std::collections::HashMap<String, String> =
            std::collections::HashMap::new();

        for message in messages {
            match message.role.as_str() {
                "system" => {
                    if let Some(content) = &message.content {
                        system_parts.push(json!({"text": content}));
                    }
                }
                "assistant" => {
                    let mut parts: Vec<Value> = Vec::new();
                    if let Some(content) = &message.content {
                        if !content.is_empty() {
                            parts.push(json!({"text": content}));
                        }
                    }
                    if let Some(tool_calls) = &message.tool_calls {
                        for call in tool_calls {
                            call_names.insert(call.id.clone(), call.function.name.clone());
                            let args: Value = serde_json::from_str(&call.function.arguments)
                                .unwrap_or_else(|_| json!({}));
                            parts.push(json!({
                                "functionCall": {"name": call.function.name, "args": args}
                            }));
                        }
                    }
                    if !parts.is_empty() {
                        contents.push(json!({"role": "model", "parts": parts}));
                    }
                }
                "tool" => {
                    let name = message
                        .tool_call_id
                        .as_ref()
                        .and_then(|id| call_names.get(id).cloned())
                        .unwrap_or_else(|| "tool".to_string());
                    let payload: Value = message
                        .content
                        .as_deref()
                        .and_then(|c| serde_json::from_str(c).ok())
                        .unwrap_or_else(|| json!({"result": message.content}));
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"functionResponse": {"name": name, "response": payload}}]
                    }));
                }
                _ => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"text": message.content.clone().unwrap_or_default()}]
                    }));
                }
            }
        }

        let mut request = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_tokens,
            }
        });

        if !system_parts.is_empty() {
            request["systemInstruction"] = json!({"parts": system_parts});
        }

        if !tools.is_empty() {
            let declarations: Vec<Value> = tools
                .iter()
                .filter_map(|t| t.get("function").cloned())
                .collect();
            request["tools"] = json!([{"functionDeclarations": declarations}]);
        }

        request
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> CiceroneError {
        let snippet: String = body.chars().take(200).collect();
        let detail = format!("{}: HTTP {} - {}", self.name, status.as_u16(), snippet);
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

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<CompletionResponse> {
        let validated = validate_message_sequence(messages);
        let request = self.build_request(&validated, tools);

        tracing::debug!(
            backend = %self.name,
            model = %self.model,
            "Sending generateContent request"
        );

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
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

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            CiceroneError::ProviderTransient(format!("{}: malformed response: {}", self.name, e))
        })?;

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            CiceroneError::ProviderTransient(format!("{}: response had no candidates", self.name))
        })?;

        let mut text = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        for (index, part) in candidate.content.parts.into_iter().enumerate() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall {
                    // Gemini does not issue call ids; synthesise stable ones
                    id: format!("gemini_call_{}", index),
                    function: FunctionCall {
                        name: call.name,
                        arguments: call.args.to_string(),
                    },
                });
            }
        }

        let message = if tool_calls.is_empty() {
            Message::assistant(text)
        } else {
            Message::assistant_with_tools(tool_calls)
        };

        let usage = parsed
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count));

        Ok(CompletionResponse { message, usage })
    }
}
