//! Turn orchestration
//!
//! Drives one conversational turn: resolve the session, call the provider
//! chain, execute any tool calls it requests, feed results back, and repeat
//! until the model produces a plain reply or the round cap is hit. All
//! session mutation happens on a working copy that is committed in a single
//! assignment once the turn succeeds; a turn that fails outright leaves the
//! session exactly as it was.

use crate::config::{Config, OrchestratorConfig};
use crate::error::{CiceroneError, Result};
use crate::itinerary::Itinerary;
use crate::prompts;
use crate::providers::{FallbackChain, Message, ToolCall};
use crate::retrieval::Citation;
use crate::session::{Session, SessionSnapshot, SessionStore};
use crate::tools::{ToolCache, ToolRegistry, ToolResult};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Reply used when every provider in the chain has failed
const APOLOGY_REPLY: &str =
    "I'm sorry, I'm having trouble reaching my planning services right now. \
     Please try again in a moment.";

/// Reply used when the model keeps calling tools past the round cap and
/// produces no final text
const DEGRADED_REPLY: &str =
    "I couldn't finish putting that together just now. Could you rephrase or \
     try again?";

/// Result of one conversational turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's reply text
    pub reply: String,
    /// The session's itinerary after the turn, if one exists
    pub itinerary: Option<Itinerary>,
    /// Citations accumulated by the session so far
    pub sources: Vec<Citation>,
    /// Session id, for the client to send on the next turn
    pub session_id: String,
}

/// States of the turn loop
enum TurnState {
    /// Waiting on the provider chain for the next assistant message
    AwaitingProviderReply,
    /// Executing the tool calls the model just requested
    ExecutingTools(Vec<ToolCall>),
    /// The model produced a final reply
    Done(String),
}

/// The conversational engine: providers, tools, and sessions wired together
pub struct Orchestrator {
    chain: FallbackChain,
    registry: ToolRegistry,
    sessions: Arc<SessionStore>,
    config: OrchestratorConfig,
    reply_cache: ToolCache,
    reply_ttl: Duration,
}

impl Orchestrator {
    /// Creates an orchestrator from its collaborators
    pub fn new(
        chain: FallbackChain,
        registry: ToolRegistry,
        sessions: Arc<SessionStore>,
        config: &Config,
    ) -> Self {
        Self {
            chain,
            registry,
            sessions,
            config: config.orchestrator.clone(),
            reply_cache: ToolCache::new(config.cache.max_entries),
            reply_ttl: Duration::from_secs(config.cache.reply_ttl_minutes * 60),
        }
    }

    /// Handles one user turn
    ///
    /// Passing `None` for `session_id` (or an unknown/expired id) starts a
    /// fresh session. The session's mutex is held for the whole turn, so a
    /// second turn on the same session waits its turn.
    ///
    /// Provider exhaustion is absorbed: the outcome carries a fixed apology
    /// and the session is left untouched, not even recording the utterance.
    pub async fn handle_turn(
        &self,
        session_id: Option<&str>,
        utterance: &str,
    ) -> Result<TurnOutcome> {
        let (handle, session_id) = self.sessions.resolve_or_create(session_id);
        let mut session = handle.lock().await;

        // Opening turns carry no session state, so an identical utterance
        // gets an identical reply; anything referencing an itinerary or
        // earlier turns must go to the provider.
        let reply_key = (session.history.is_empty() && session.itinerary.is_none()).then(|| {
            ToolCache::cache_key("reply", &json!({"utterance": utterance}))
        });

        if let Some(key) = &reply_key {
            if let Some(hit) = self.reply_cache.get(key) {
                tracing::debug!(session_id = %session_id, "Serving memoised opening reply");
                let reply = hit["reply"].as_str().unwrap_or_default().to_string();
                let sources: Vec<Citation> =
                    serde_json::from_value(hit["sources"].clone()).unwrap_or_default();

                session.history.push(Message::user(utterance));
                session.history.push(Message::assistant(reply.clone()));
                session.merge_sources(&sources);
                session.last_activity = Utc::now();
                return Ok(TurnOutcome {
                    reply,
                    itinerary: None,
                    sources: session.sources.clone(),
                    session_id,
                });
            }
        }

        let mut working = session.clone();
        working.history.push(Message::user(utterance));

        match self.drive_turn(&mut working).await {
            Ok(reply) => {
                working.last_activity = Utc::now();
                // Turns that built an itinerary are never memoised: replaying
                // the reply without the plan would mislead the next caller
                if let Some(key) = reply_key {
                    if working.itinerary.is_none() {
                        self.reply_cache.put(
                            key,
                            json!({"reply": &reply, "sources": &working.sources}),
                            self.reply_ttl,
                        );
                    }
                }
                let outcome = TurnOutcome {
                    reply,
                    itinerary: working.itinerary.clone(),
                    sources: working.sources.clone(),
                    session_id,
                };
                *session = working;
                Ok(outcome)
            }
            Err(e)
                if matches!(
                    e.downcast_ref::<CiceroneError>(),
                    Some(CiceroneError::ProvidersExhausted(_))
                ) =>
            {
                tracing::error!(session_id = %session_id, error = %e, "Turn failed: all providers exhausted");
                Ok(TurnOutcome {
                    reply: APOLOGY_REPLY.to_string(),
                    itinerary: session.itinerary.clone(),
                    sources: session.sources.clone(),
                    session_id,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Read-only session state, without driving a turn
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.sessions.snapshot(session_id).await
    }

    /// Forgets a session entirely
    pub fn reset_session(&self, session_id: &str) -> bool {
        self.sessions.reset(session_id)
    }

    /// Runs the provider/tool loop against the working session copy
    async fn drive_turn(&self, session: &mut Session) -> Result<String> {
        let schemas = self.registry.schemas();
        let mut state = TurnState::AwaitingProviderReply;
        let mut rounds = 0usize;

        loop {
            state = match state {
                TurnState::AwaitingProviderReply => {
                    // Past the round cap the model loses its tools, forcing
                    // it to wrap up with whatever it has
                    let tools: &[Value] = if rounds < self.config.max_tool_rounds {
                        &schemas
                    } else {
                        &[]
                    };

                    let messages = self.compose_messages(session);
                    let response = self.chain.complete(&messages, tools).await?;
                    let message = response.message;

                    match (&message.tool_calls, tools.is_empty()) {
                        (Some(calls), false) if !calls.is_empty() => {
                            let calls = calls.clone();
                            session.history.push(message);
                            TurnState::ExecutingTools(calls)
                        }
                        _ => {
                            let reply = message
                                .content
                                .clone()
                                .filter(|c| !c.trim().is_empty())
                                .unwrap_or_else(|| DEGRADED_REPLY.to_string());
                            session.history.push(Message::assistant(reply.clone()));
                            TurnState::Done(reply)
                        }
                    }
                }
                TurnState::ExecutingTools(calls) => {
                    rounds += 1;
                    for call in calls {
                        let result = self.execute_call(&call).await;
                        self.harvest(session, &result.payload);
                        session
                            .history
                            .push(Message::tool_result(call.id, result.payload.to_string()));
                    }
                    TurnState::AwaitingProviderReply
                }
                TurnState::Done(reply) => return Ok(reply),
            };
        }
    }

    /// Executes one tool call, converting every failure into an error
    /// payload the model can read
    async fn execute_call(&self, call: &ToolCall) -> ToolResult {
        let name = &call.function.name;
        let args: Value = match serde_json::from_str(&call.function.arguments) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool arguments were not valid JSON");
                return ToolResult::error(format!("arguments were not valid JSON: {}", e));
            }
        };

        tracing::info!(tool = %name, "Executing tool call");
        match self.registry.invoke(name, &args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool invocation rejected");
                ToolResult::error(e.to_string())
            }
        }
    }

    /// Pulls itinerary and citation side channels out of a tool payload
    ///
    /// Works on payload shape rather than tool name: anything exposing an
    /// `itinerary` object replaces the session's plan, a `citations` array
    /// is merged, and entries under `pois` contribute provenance citations.
    fn harvest(&self, session: &mut Session, payload: &Value) {
        if let Some(raw) = payload.get("itinerary") {
            match serde_json::from_value::<Itinerary>(raw.clone()) {
                Ok(itinerary) => session.itinerary = Some(itinerary),
                Err(e) => tracing::warn!(error = %e, "Ignoring unparseable itinerary payload"),
            }
        }

        if let Some(raw) = payload.get("citations") {
            if let Ok(citations) = serde_json::from_value::<Vec<Citation>>(raw.clone()) {
                session.merge_sources(&citations);
            }
        }

        if let Some(pois) = payload.get("pois").and_then(Value::as_array) {
            let provenance: Vec<Citation> = pois
                .iter()
                .filter_map(|poi| {
                    let source = poi.get("source")?.as_str()?;
                    let url = poi.get("source_url")?.as_str()?;
                    let name = poi.get("name").and_then(Value::as_str);
                    Some(Citation {
                        source: source.to_string(),
                        url: url.to_string(),
                        section: None,
                        activities: name.map(|n| vec![n.to_string()]).unwrap_or_default(),
                    })
                })
                .collect();
            session.merge_sources(&provenance);
        }
    }

    /// Builds the message list for a provider call: system prompt, current
    /// itinerary context if one exists, then the windowed history
    fn compose_messages(&self, session: &Session) -> Vec<Message> {
        let mut messages = vec![Message::system(prompts::system_prompt())];

        if let Some(itinerary) = &session.itinerary {
            messages.push(Message::system(prompts::itinerary_context(itinerary)));
        }

        let window_start = session
            .history
            .len()
            .saturating_sub(self.config.history_window);
        messages.extend_from_slice(&session.history[window_start..]);
        messages
    }
}
