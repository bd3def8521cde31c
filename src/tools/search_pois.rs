//! POI search tool
//!
//! Wraps the `PoiProvider` behind the `search_pois` tool the model calls
//! when it needs candidate places. Results carry provenance (source name and
//! URL per POI) so the orchestrator can surface citations for them.

use crate::error::Result;
use crate::poi::{PoiConstraints, PoiProvider};
use crate::tools::{Tool, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAX_RESULTS: usize = 20;

/// The `search_pois` tool
pub struct SearchPoisTool {
    provider: Arc<dyn PoiProvider>,
    ttl: Duration,
}

impl SearchPoisTool {
    /// Creates the tool over a POI provider with the given cache TTL
    pub fn new(provider: Arc<dyn PoiProvider>, ttl: Duration) -> Self {
        Self { provider, ttl }
    }
}

#[async_trait]
impl ToolExecutor for SearchPoisTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "search_pois".to_string(),
            description: "Search for points of interest in the city matching the traveller's \
                          interests. Returns candidate places with categories, typical visit \
                          durations, and distances from the city centre."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "interests": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Interest labels, e.g. culture, food, nature, shopping"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of places to return (default 20)"
                    },
                    "budget": {
                        "type": "string",
                        "enum": ["low", "medium", "high"],
                        "description": "Budget hint for the places to prefer"
                    },
                    "indoor_only": {
                        "type": "boolean",
                        "description": "Only indoor places, e.g. for rainy days"
                    },
                    "accessibility": {
                        "type": "boolean",
                        "description": "Prefer step-free, accessible places"
                    }
                },
                "required": ["interests"]
            }),
        }
    }

    fn cache_ttl(&self) -> Option<Duration> {
        // Geography changes slowly; identical searches share results
        Some(self.ttl)
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult> {
        let interests: Vec<String> = args["interests"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let max_results = args["max_results"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_RESULTS);
        let constraints = PoiConstraints {
            budget: args["budget"].as_str().map(str::to_string),
            pace: None,
            indoor_only: args["indoor_only"].as_bool(),
            accessibility: args["accessibility"].as_bool(),
        };

        match self.provider.search(&interests, &constraints, max_results).await {
            Ok(pois) => Ok(ToolResult::ok(json!({
                "count": pois.len(),
                "pois": pois,
            }))),
            Err(e) => {
                tracing::warn!(error = %e, "POI search failed");
                Ok(ToolResult::error(format!("POI search failed: {}", e)))
            }
        }
    }
}
