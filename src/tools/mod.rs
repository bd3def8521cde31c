//! Tool system for Cicerone
//!
//! This module provides the tool abstraction the orchestrator dispatches
//! through: tool definitions, the executor trait, argument validation, the
//! result cache, and the registry of the four built-in tools.

pub mod cache;
pub mod schema;

pub mod build_itinerary;
pub mod clarify;
pub mod retrieve_guidance;
pub mod search_pois;

pub use cache::ToolCache;

use crate::config::Config;
use crate::error::{CiceroneError, Result};
use crate::poi::PoiProvider;
use crate::retrieval::Retriever;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Tool definition advertised to providers
#[derive(Debug, Clone)]
pub struct Tool {
    /// Tool name the model calls
    pub name: String,
    /// What the tool does, for the model
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: Value,
}

impl Tool {
    /// Renders the definition in the function-calling wire shape
    pub fn to_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Outcome of a tool execution
///
/// Both successes and tool-level failures are results: failures are
/// serialised into an error payload and fed back to the provider so the
/// model can react, rather than aborting the turn.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Whether execution succeeded
    pub success: bool,
    /// JSON payload sent back to the provider as the tool-result message
    pub payload: Value,
}

impl ToolResult {
    /// Successful result with a payload
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
        }
    }

    /// Failed result carrying an error message payload
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: json!({"error": message.into()}),
        }
    }
}

/// Trait for executable tools
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The tool's definition (name, description, parameter schema)
    fn definition(&self) -> Tool;

    /// How long results may be cached; `None` disables caching
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }

    /// Executes the tool with validated arguments
    async fn execute(&self, args: &Value) -> Result<ToolResult>;
}

/// The closed set of built-in tools
///
/// Exists so startup can verify the registry covers exactly the tools the
/// system prompt promises the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SearchPois,
    BuildItinerary,
    RetrieveCityGuidance,
    AskClarifyingQuestion,
}

impl ToolKind {
    /// Every built-in tool
    pub const ALL: [ToolKind; 4] = [
        ToolKind::SearchPois,
        ToolKind::BuildItinerary,
        ToolKind::RetrieveCityGuidance,
        ToolKind::AskClarifyingQuestion,
    ];

    /// The registered name of this tool
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SearchPois => "search_pois",
            ToolKind::BuildItinerary => "build_itinerary",
            ToolKind::RetrieveCityGuidance => "retrieve_city_guidance",
            ToolKind::AskClarifyingQuestion => "ask_clarifying_question",
        }
    }
}

/// Registry of available tools with cached dispatch
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
    cache: Arc<ToolCache>,
}

impl ToolRegistry {
    /// Creates an empty registry sharing the given result cache
    pub fn new(cache: Arc<ToolCache>) -> Self {
        Self {
            tools: HashMap::new(),
            cache,
        }
    }

    /// Registers a tool under its definition name
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        let name = executor.definition().name;
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, executor);
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Wire-shape schemas of every registered tool, sorted by name
    pub fn schemas(&self) -> Vec<Value> {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|n| self.tools[n].definition().to_schema())
            .collect()
    }

    /// Invokes a tool by name with schema-validated arguments
    ///
    /// Cacheable tools are memoised on the canonical argument form; only
    /// successful results are stored.
    ///
    /// # Errors
    ///
    /// `CiceroneError::UnknownTool` for unregistered names,
    /// `CiceroneError::InvalidArguments` when the arguments fail validation
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<ToolResult> {
        let executor = self
            .tools
            .get(name)
            .ok_or_else(|| CiceroneError::UnknownTool(name.to_string()))?;

        schema::validate_args(name, &executor.definition().parameters, args)?;

        let cached_key = executor.cache_ttl().map(|ttl| {
            let key = ToolCache::cache_key(name, args);
            (key, ttl)
        });

        if let Some((key, _)) = &cached_key {
            if let Some(payload) = self.cache.get(key) {
                tracing::debug!(tool = name, "Tool cache hit");
                return Ok(ToolResult::ok(payload));
            }
        }

        let result = executor.execute(args).await?;

        if result.success {
            if let Some((key, ttl)) = cached_key {
                self.cache.put(key, result.payload.clone(), ttl);
            }
        }

        Ok(result)
    }
}

/// Builds the registry of all built-in tools
///
/// # Errors
///
/// Returns `CiceroneError::Config` if any `ToolKind` ends up without a
/// registration, which would mean the system prompt advertises a tool the
/// engine cannot execute
pub fn build_registry(
    config: &Config,
    poi_provider: Arc<dyn PoiProvider>,
    retriever: Arc<dyn Retriever>,
    cache: Arc<ToolCache>,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new(cache);

    registry.register(Arc::new(search_pois::SearchPoisTool::new(
        poi_provider.clone(),
        Duration::from_secs(config.cache.poi_search_ttl_hours * 3600),
    )));
    registry.register(Arc::new(build_itinerary::BuildItineraryTool::new(
        poi_provider,
        &config.itinerary,
    )?));
    registry.register(Arc::new(retrieve_guidance::RetrieveCityGuidanceTool::new(
        retriever,
        config.retrieval.default_top_k,
        Duration::from_secs(config.cache.retrieval_ttl_hours * 3600),
    )));
    registry.register(Arc::new(clarify::AskClarifyingQuestionTool));

    for kind in ToolKind::ALL {
        if !registry.contains(kind.name()) {
            return Err(CiceroneError::Config(format!(
                "tool '{}' is missing from the registry",
                kind.name()
            ))
            .into());
        }
    }

    Ok(registry)
}
