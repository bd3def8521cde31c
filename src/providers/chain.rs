//! Provider fallback chain
//!
//! Wraps an ordered list of providers and turns them into one reliable
//! `complete` call. Every top-level call starts at the primary provider, so
//! a transient outage earlier in the conversation never permanently
//! downgrades later turns. Transient failures (timeout, rate limit, 5xx)
//! are retried with exponential backoff and jitter before failing over;
//! permanent failures (bad credentials, malformed request) fail over
//! immediately.

use crate::error::{CiceroneError, Result};
use crate::providers::base::{CompletionResponse, Message, Provider};
use rand::Rng;
use std::time::Duration;

/// Ordered provider chain with retry and failover
pub struct FallbackChain {
    providers: Vec<Box<dyn Provider>>,
    max_retries: u32,
    base_backoff: Duration,
    call_timeout: Duration,
}

impl FallbackChain {
    /// Creates a new fallback chain
    ///
    /// # Arguments
    ///
    /// * `providers` - Providers in preference order, primary first
    /// * `max_retries` - Retries per provider on transient errors
    /// * `base_backoff` - Initial backoff delay (doubled per retry)
    /// * `call_timeout` - Hard deadline for a single provider call
    pub fn new(
        providers: Vec<Box<dyn Provider>>,
        max_retries: u32,
        base_backoff: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            max_retries,
            base_backoff,
            call_timeout,
        }
    }

    /// Names of the providers in chain order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Completes a conversation, walking the chain until a provider succeeds
    ///
    /// # Errors
    ///
    /// Returns `CiceroneError::ProvidersExhausted` when every provider in the
    /// chain has failed for this call
    pub async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let mut last_error: Option<String> = None;

        for provider in &self.providers {
            match self.try_provider(provider.as_ref(), messages, tools).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        backend = provider.name(),
                        error = %e,
                        "Provider failed, moving to next in chain"
                    );
                    last_error = Some(format!("{}: {}", provider.name(), e));
                }
            }
        }

        Err(CiceroneError::ProvidersExhausted(
            last_error.unwrap_or_else(|| "no providers configured".to_string()),
        )
        .into())
    }

    /// Attempts one provider, retrying transient errors with backoff
    async fn try_provider(
        &self,
        provider: &dyn Provider,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let mut attempt: u32 = 0;

        loop {
            let result =
                tokio::time::timeout(self.call_timeout, provider.complete(messages, tools)).await;

            let error = match result {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => e,
                Err(_) => CiceroneError::ProviderTransient(format!(
                    "{}: call exceeded {:?} deadline",
                    provider.name(),
                    self.call_timeout
                ))
                .into(),
            };

            let transient = error
                .downcast_ref::<CiceroneError>()
                .map(CiceroneError::is_transient)
                .unwrap_or(false);

            if !transient || attempt >= self.max_retries {
                return Err(error);
            }

            let delay = self.backoff_delay(attempt);
            tracing::debug!(
                backend = provider.name(),
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Transient provider error, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Exponential backoff with up to 25% random jitter
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_backoff.as_millis() as u64 * 2u64.pow(attempt);
        let jitter = rand::rng().random_range(0..=base / 4);
        Duration::from_millis(base + jitter)
    }
}
