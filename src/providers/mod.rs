//! Language-model provider implementations
//!
//! This module contains the provider abstraction and backend adapters:
//! - `base`: common types and the `Provider` trait
//! - `openai_compat`: OpenAI-style `/chat/completions` backends (Cerebras, Groq)
//! - `gemini`: Google Gemini `:generateContent` backend
//! - `chain`: the retry/failover chain the orchestrator calls through

pub mod base;
pub mod chain;
pub mod gemini;
pub mod openai_compat;

pub use base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};
pub use chain::FallbackChain;
pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;

use crate::config::{BackendKind, Config};
use crate::error::{CiceroneError, Result};
use std::time::Duration;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Builds the fallback chain from configuration
///
/// Walks `providers.fallback_order`, constructs an adapter for each backend
/// that has an API key available in its environment variable, and skips (with
/// a warning) those that do not. At least one backend must be usable.
///
/// # Errors
///
/// Returns `CiceroneError::Config` if no backend in the fallback order has a
/// key available
pub fn build_chain(config: &Config) -> Result<FallbackChain> {
    let timeout = Duration::from_secs(config.providers.request_timeout_seconds);
    let mut providers: Vec<Box<dyn Provider>> = Vec::new();

    for name in &config.providers.fallback_order {
        // validate() guarantees the lookup succeeds
        let backend = config.backend(name).ok_or_else(|| {
            CiceroneError::Config(format!("unknown backend '{}' in fallback_order", name))
        })?;

        let Some(api_key) = backend.api_key() else {
            tracing::warn!(
                backend = %backend.name,
                env_var = %backend.api_key_env,
                "No API key in environment, skipping backend"
            );
            continue;
        };

        let provider: Box<dyn Provider> = match backend.kind {
            BackendKind::OpenAiCompat => Box::new(OpenAiCompatProvider::new(
                &backend.name,
                &backend.api_base,
                api_key,
                &backend.model,
                DEFAULT_TEMPERATURE,
                DEFAULT_MAX_TOKENS,
                timeout,
            )?),
            BackendKind::Gemini => Box::new(GeminiProvider::new(
                &backend.name,
                &backend.api_base,
                api_key,
                &backend.model,
                DEFAULT_TEMPERATURE,
                DEFAULT_MAX_TOKENS,
                timeout,
            )?),
        };

        tracing::info!(backend = %backend.name, model = %backend.model, "Registered provider");
        providers.push(provider);
    }

    if providers.is_empty() {
        return Err(CiceroneError::Config(
            "no provider backend has an API key available; set at least one of the \
             configured key environment variables"
                .to_string(),
        )
        .into());
    }

    Ok(FallbackChain::new(
        providers,
        config.providers.max_retries,
        Duration::from_millis(config.providers.backoff_ms),
        timeout,
    ))
}
