//! City guidance retrieval tool
//!
//! The `retrieve_city_guidance` tool: forwards factual questions to the
//! knowledge-base retriever and returns the passages with citations. An
//! unreachable retriever degrades to an error payload so the model can
//! still answer from what it has.

use crate::error::Result;
use crate::retrieval::{Citation, Retriever};
use crate::tools::{Tool, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// The `retrieve_city_guidance` tool
pub struct RetrieveCityGuidanceTool {
    retriever: Arc<dyn Retriever>,
    default_top_k: usize,
    ttl: Duration,
}

impl RetrieveCityGuidanceTool {
    /// Creates the tool over a retriever with the given defaults
    pub fn new(retriever: Arc<dyn Retriever>, default_top_k: usize, ttl: Duration) -> Self {
        Self {
            retriever,
            default_top_k,
            ttl,
        }
    }
}

#[async_trait]
impl ToolExecutor for RetrieveCityGuidanceTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "retrieve_city_guidance".to_string(),
            description: "Look up factual guidance about the city from the curated knowledge \
                          base: opening hours, etiquette, transport, seasons, local customs. \
                          Use this before answering factual questions."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The question to look up"
                    },
                    "top_k": {
                        "type": "integer",
                        "description": "Number of passages to return"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn cache_ttl(&self) -> Option<Duration> {
        Some(self.ttl)
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult> {
        let query = args["query"].as_str().unwrap_or_default();
        let top_k = args["top_k"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(self.default_top_k);

        match self.retriever.retrieve(query, top_k).await {
            Ok(chunks) => {
                let citations: Vec<Citation> = chunks.iter().map(Citation::from).collect();
                Ok(ToolResult::ok(json!({
                    "chunks": chunks,
                    "citations": citations,
                })))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval failed, degrading");
                Ok(ToolResult::error(format!(
                    "the knowledge base is currently unavailable: {}",
                    e
                )))
            }
        }
    }
}
