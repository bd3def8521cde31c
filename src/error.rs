//! Error types for Cicerone
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Cicerone operations
///
/// This enum encompasses all possible errors that can occur during
/// turn orchestration, provider interactions, tool execution, and
/// itinerary construction.
#[derive(Error, Debug)]
pub enum CiceroneError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient provider errors (timeout, rate limit, 5xx). The fallback
    /// chain retries these with backoff before failing over.
    #[error("Provider error (transient): {0}")]
    ProviderTransient(String),

    /// Permanent provider errors (bad credentials, malformed request).
    /// The fallback chain fails over immediately without retrying.
    #[error("Provider error (permanent): {0}")]
    ProviderPermanent(String),

    /// Every provider in the fallback chain failed for this call
    #[error("All providers exhausted: {0}")]
    ProvidersExhausted(String),

    /// A tool name was requested that is not in the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments did not satisfy the tool's parameter schema
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments {
        /// Name of the tool whose arguments were rejected
        tool: String,
        /// What was wrong with the arguments
        message: String,
    },

    /// Too few candidate POIs to fill the requested days at the requested pace
    #[error("Insufficient candidates: need at least {needed} POIs, got {available}")]
    InsufficientCandidates {
        /// Minimum number of candidates the builder requires
        needed: usize,
        /// Number of candidates actually supplied
        available: usize,
    },

    /// The external knowledge retriever could not be reached
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// General tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CiceroneError {
    /// Returns true if this error should be retried before failing over
    /// to the next provider in the chain.
    pub fn is_transient(&self) -> bool {
        matches!(self, CiceroneError::ProviderTransient(_))
    }
}

/// Result type alias for Cicerone operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
