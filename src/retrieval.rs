//! Knowledge retrieval gateway
//!
//! Thin pass-through to the external retrieval service that holds the city
//! knowledge base. The engine never ranks or embeds anything itself; it
//! forwards the query, relays the scored chunks, and turns them into
//! citations.

use crate::config::RetrievalConfig;
use crate::error::{CiceroneError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A scored passage returned by the retriever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Passage text
    pub text: String,
    /// Source document name
    pub source: String,
    /// Source URL
    pub url: String,
    /// Optional section label within the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Relevance score assigned by the retriever
    pub score: f64,
}

/// A source reference surfaced to the user
///
/// Sessions accumulate citations across turns, deduplicated by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Source name
    pub source: String,
    /// Source URL (dedupe key)
    pub url: String,
    /// Optional section label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Names of the itinerary activities this source backs, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<String>,
}

impl From<&Chunk> for Citation {
    fn from(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source.clone(),
            url: chunk.url.clone(),
            section: chunk.section.clone(),
            activities: Vec::new(),
        }
    }
}

/// Retriever of knowledge-base passages
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieves the `top_k` most relevant chunks for a query
    ///
    /// # Errors
    ///
    /// Returns `CiceroneError::RetrievalUnavailable` when the service cannot
    /// be reached; callers surface this as a degraded tool result rather
    /// than failing the turn
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>>;
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    chunks: Vec<Chunk>,
}

/// HTTP implementation of `Retriever`
pub struct HttpRetriever {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRetriever {
    /// Creates a retriever client from configuration
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>> {
        tracing::debug!(query, top_k, "Querying retrieval service");

        let response = self
            .client
            .post(format!("{}/retrieve", self.base_url))
            .json(&RetrieveRequest { query, top_k })
            .send()
            .await
            .map_err(|e| CiceroneError::RetrievalUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CiceroneError::RetrievalUnavailable(format!(
                "retriever returned HTTP {}",
                status.as_u16()
            ))
            .into());
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| CiceroneError::RetrievalUnavailable(format!("malformed response: {}", e)))?;

        tracing::debug!(count = parsed.chunks.len(), "Retrieval complete");
        Ok(parsed.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn retriever_for(server: &MockServer) -> HttpRetriever {
        HttpRetriever::new(&RetrievalConfig {
            api_base: server.uri(),
            default_top_k: 5,
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_returns_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .and(body_partial_json(serde_json::json!({"query": "best time to visit"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chunks": [{
                    "text": "October to March is the pleasant season.",
                    "source": "City Guide",
                    "url": "https://example.org/guide#seasons",
                    "section": "When to visit",
                    "score": 0.91
                }]
            })))
            .mount(&server)
            .await;

        let chunks = retriever_for(&server)
            .retrieve("best time to visit", 3)
            .await
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "City Guide");
        let citation = Citation::from(&chunks[0]);
        assert_eq!(citation.url, "https://example.org/guide#seasons");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = retriever_for(&server)
            .retrieve("anything", 3)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CiceroneError>().unwrap(),
            CiceroneError::RetrievalUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let retriever = HttpRetriever::new(&RetrievalConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            default_top_k: 5,
            timeout_seconds: 1,
        })
        .unwrap();

        let err = retriever.retrieve("anything", 3).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CiceroneError>().unwrap(),
            CiceroneError::RetrievalUnavailable(_)
        ));
    }
}
