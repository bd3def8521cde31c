//! # Cicerone
//!
//! A conversational tool-orchestration engine for planning multi-day city
//! itineraries. A language-model provider chain drives the conversation,
//! calling into a small registry of tools (place search, deterministic
//! itinerary construction, knowledge retrieval, clarifying questions) whose
//! results flow back into the dialogue and into per-conversation session
//! state.
//!
//! ## Architecture
//!
//! - **providers**: the `Provider` trait, OpenAI-compatible and Gemini
//!   adapters, and the retry/failover `FallbackChain`
//! - **tools**: tool definitions, argument validation, TTL result cache,
//!   and the four built-in tools
//! - **itinerary**: the pure, deterministic day-by-day scheduler
//! - **poi** / **retrieval**: the external place and knowledge collaborators
//!   behind traits
//! - **session**: per-conversation state with idle eviction
//! - **orchestrator**: the turn loop tying it all together

pub mod cli;
pub mod config;
pub mod error;
pub mod itinerary;
pub mod orchestrator;
pub mod poi;
pub mod prompts;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod tools;

pub use config::Config;
pub use error::{CiceroneError, Result};
pub use orchestrator::{Orchestrator, TurnOutcome};
