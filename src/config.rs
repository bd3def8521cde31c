//! Configuration management for Cicerone
//!
//! This module handles loading, parsing, and validating configuration
//! from a YAML file with CLI overrides. Provider API keys are read from
//! environment variables named in the config rather than stored on disk.

use crate::error::{CiceroneError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Cicerone
///
/// Holds everything the engine needs: the provider fallback chain,
/// orchestrator limits, session lifecycle, itinerary parameters,
/// tool cache TTLs, and the external POI/retrieval endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Language-model provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Orchestrator turn-loop configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Itinerary builder configuration
    #[serde(default)]
    pub itinerary: ItineraryConfig,

    /// Tool cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// POI provider configuration
    #[serde(default)]
    pub poi: PoiConfig,

    /// Knowledge retriever configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Provider fallback-chain configuration
///
/// The chain is attempted in `fallback_order`; every top-level call starts
/// from the first entry so a transient primary outage never downgrades
/// later turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Ordered provider names, preferred first
    #[serde(default = "default_fallback_order")]
    pub fallback_order: Vec<String>,

    /// Per-provider backend settings, keyed by the names above
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,

    /// Retries per provider on transient errors before failing over
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds (doubled per retry, with jitter)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Timeout for a single provider call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_fallback_order() -> Vec<String> {
    vec![
        "cerebras".to_string(),
        "groq".to_string(),
        "gemini".to_string(),
    ]
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig {
            name: "cerebras".to_string(),
            kind: BackendKind::OpenAiCompat,
            api_base: "https://api.cerebras.ai/v1".to_string(),
            api_key_env: "CEREBRAS_API_KEY".to_string(),
            model: "llama-3.3-70b".to_string(),
        },
        BackendConfig {
            name: "groq".to_string(),
            kind: BackendKind::OpenAiCompat,
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
        },
        BackendConfig {
            name: "gemini".to_string(),
            kind: BackendKind::Gemini,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            model: "gemini-2.0-flash".to_string(),
        },
    ]
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            fallback_order: default_fallback_order(),
            backends: default_backends(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Wire protocol a backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI-style `/chat/completions` API (Cerebras, Groq, and friends)
    OpenAiCompat,
    /// Google Gemini `:generateContent` API
    Gemini,
}

/// Settings for a single language-model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name used in `fallback_order`
    pub name: String,
    /// Wire protocol
    pub kind: BackendKind,
    /// API base URL
    pub api_base: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Model identifier to request
    pub model: String,
}

impl BackendConfig {
    /// Reads this backend's API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Orchestrator turn-loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum tool-call rounds per turn before degrading
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Most recent history messages sent to the provider
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_max_tool_rounds() -> usize {
    6
}

fn default_history_window() -> usize {
    20
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            history_window: default_history_window(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity after which a session is evicted
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
}

fn default_idle_timeout() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout(),
        }
    }
}

/// Itinerary builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryConfig {
    /// Upper bound on trip length in days
    #[serde(default = "default_max_duration_days")]
    pub max_duration_days: u8,

    /// Default daily start time, "HH:MM"
    #[serde(default = "default_daily_start")]
    pub daily_start_time: String,

    /// Assumed average in-city travel speed in km/h
    #[serde(default = "default_average_speed")]
    pub average_speed_kmh: f64,
}

fn default_max_duration_days() -> u8 {
    7
}

fn default_daily_start() -> String {
    "09:00".to_string()
}

fn default_average_speed() -> f64 {
    30.0
}

impl Default for ItineraryConfig {
    fn default() -> Self {
        Self {
            max_duration_days: default_max_duration_days(),
            daily_start_time: default_daily_start(),
            average_speed_kmh: default_average_speed(),
        }
    }
}

/// Tool cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached tool results
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,

    /// TTL for POI search results, in hours (geography is stable)
    #[serde(default = "default_poi_ttl_hours")]
    pub poi_search_ttl_hours: u64,

    /// TTL for knowledge-base retrieval results, in hours
    #[serde(default = "default_retrieval_ttl_hours")]
    pub retrieval_ttl_hours: u64,

    /// TTL for memoised opening replies, in minutes
    #[serde(default = "default_reply_ttl_minutes")]
    pub reply_ttl_minutes: u64,
}

fn default_cache_max_entries() -> usize {
    500
}

fn default_poi_ttl_hours() -> u64 {
    24
}

fn default_retrieval_ttl_hours() -> u64 {
    6
}

fn default_reply_ttl_minutes() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_max_entries(),
            poi_search_ttl_hours: default_poi_ttl_hours(),
            retrieval_ttl_hours: default_retrieval_ttl_hours(),
            reply_ttl_minutes: default_reply_ttl_minutes(),
        }
    }
}

/// POI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiConfig {
    /// Overpass API endpoint
    #[serde(default = "default_overpass_url")]
    pub api_base: String,

    /// City centre latitude (reference point for distances)
    #[serde(default = "default_city_lat")]
    pub city_lat: f64,

    /// City centre longitude
    #[serde(default = "default_city_lon")]
    pub city_lon: f64,

    /// Search radius around the city centre, in meters
    #[serde(default = "default_radius_meters")]
    pub radius_meters: u32,

    /// Retries on POI provider failures
    #[serde(default = "default_poi_retries")]
    pub max_retries: u32,
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

// Jaipur city centre
fn default_city_lat() -> f64 {
    26.9124
}

fn default_city_lon() -> f64 {
    75.7873
}

fn default_radius_meters() -> u32 {
    20_000
}

fn default_poi_retries() -> u32 {
    3
}

impl Default for PoiConfig {
    fn default() -> Self {
        Self {
            api_base: default_overpass_url(),
            city_lat: default_city_lat(),
            city_lon: default_city_lon(),
            radius_meters: default_radius_meters(),
            max_retries: default_poi_retries(),
        }
    }
}

/// Knowledge retriever configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the external retriever service
    #[serde(default = "default_retriever_url")]
    pub api_base: String,

    /// Default number of chunks to request
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Timeout for retriever calls, in seconds
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_seconds: u64,
}

fn default_retriever_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_retrieval_timeout() -> u64 {
    15
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_base: default_retriever_url(),
            default_top_k: default_top_k(),
            timeout_seconds: default_retrieval_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file
    ///
    /// Missing files yield the built-in defaults so the CLI works out of
    /// the box; a present-but-invalid file is an error.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `CiceroneError::Config` if any setting is out of range or
    /// the fallback order references an unknown backend
    pub fn validate(&self) -> Result<()> {
        if self.providers.fallback_order.is_empty() {
            return Err(CiceroneError::Config(
                "providers.fallback_order must not be empty".to_string(),
            )
            .into());
        }

        for name in &self.providers.fallback_order {
            if !self.providers.backends.iter().any(|b| &b.name == name) {
                return Err(CiceroneError::Config(format!(
                    "fallback_order references unknown backend '{}'",
                    name
                ))
                .into());
            }
        }

        if self.orchestrator.max_tool_rounds == 0 {
            return Err(CiceroneError::Config(
                "orchestrator.max_tool_rounds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.itinerary.max_duration_days == 0 || self.itinerary.max_duration_days > 7 {
            return Err(CiceroneError::Config(
                "itinerary.max_duration_days must be in 1..=7".to_string(),
            )
            .into());
        }

        if self.itinerary.average_speed_kmh <= 0.0 {
            return Err(CiceroneError::Config(
                "itinerary.average_speed_kmh must be positive".to_string(),
            )
            .into());
        }

        crate::itinerary::parse_time(&self.itinerary.daily_start_time).map_err(|_| {
            CiceroneError::Config(format!(
                "itinerary.daily_start_time '{}' is not a valid HH:MM time",
                self.itinerary.daily_start_time
            ))
        })?;

        Ok(())
    }

    /// Looks up a backend's settings by name
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.providers.backends.iter().find(|b| b.name == name)
    }
}
