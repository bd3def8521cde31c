//! End-to-end turn scenarios with scripted providers
//!
//! Drives full conversations through the orchestrator: provider chain,
//! tool registry, cache, and session store are all real; only the language
//! model and the external POI/retrieval services are substituted.

use async_trait::async_trait;
use cicerone::config::Config;
use cicerone::error::{CiceroneError, Result};
use cicerone::itinerary::{BuildParams, Pace};
use cicerone::orchestrator::Orchestrator;
use cicerone::poi::{Coordinate, Poi, PoiConstraints, PoiProvider};
use cicerone::providers::{
    CompletionResponse, FallbackChain, FunctionCall, Message, Provider, ToolCall,
};
use cicerone::retrieval::{Chunk, Retriever};
use cicerone::session::SessionStore;
use cicerone::tools::{build_registry, ToolCache, ToolRegistry};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Provider replaying a fixed script of assistant messages
struct ScriptedProvider {
    name: String,
    script: Mutex<Vec<Message>>,
}

impl ScriptedProvider {
    fn new(name: &str, mut script: Vec<Message>) -> Self {
        script.reverse();
        Self {
            name: name.to_string(),
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[Value],
    ) -> Result<CompletionResponse> {
        let message = self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Message::assistant("script exhausted"));
        Ok(CompletionResponse::new(message))
    }
}

/// Provider that fails every call the same way
struct FailingProvider {
    name: String,
    transient: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[Value],
    ) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.transient {
            Err(CiceroneError::ProviderTransient(format!("{} timed out", self.name)).into())
        } else {
            Err(CiceroneError::ProviderPermanent(format!("{} rejected key", self.name)).into())
        }
    }
}

fn stub_poi(i: usize) -> Poi {
    Poi {
        id: format!("poi_{}", i),
        name: format!("Landmark {}", i),
        location: Coordinate {
            lat: 26.9 + i as f64 * 0.003,
            lon: 75.78 + i as f64 * 0.002,
        },
        category: "attraction".to_string(),
        visit_duration_minutes: 90,
        distance_km: i as f64 * 0.4,
        source: "OpenStreetMap".to_string(),
        source_url: format!("https://osm.example/node/{}", i),
    }
}

struct StubPois;

#[async_trait]
impl PoiProvider for StubPois {
    async fn search(
        &self,
        _interests: &[String],
        _constraints: &PoiConstraints,
        max_results: usize,
    ) -> Result<Vec<Poi>> {
        Ok((0..15.min(max_results)).map(stub_poi).collect())
    }
}

struct StubRetriever;

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<Chunk>> {
        Ok(vec![Chunk {
            text: "Autumn and winter are the comfortable seasons for sightseeing.".to_string(),
            source: "Seasonal Guide".to_string(),
            url: "https://guide.example/seasons".to_string(),
            section: Some("Climate".to_string()),
            score: 0.93,
        }])
    }
}

fn registry(config: &Config) -> ToolRegistry {
    build_registry(
        config,
        Arc::new(StubPois),
        Arc::new(StubRetriever),
        Arc::new(ToolCache::new(config.cache.max_entries)),
    )
    .unwrap()
}

fn orchestrator_over(providers: Vec<Box<dyn Provider>>) -> Orchestrator {
    let config = Config::default();
    let chain = FallbackChain::new(
        providers,
        1,
        Duration::from_millis(1),
        Duration::from_secs(5),
    );
    Orchestrator::new(
        chain,
        registry(&config),
        Arc::new(SessionStore::new(30)),
        &config,
    )
}

fn tool_call(id: &str, name: &str, args: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: args.to_string(),
        },
    }
}

#[tokio::test]
async fn two_day_plan_produces_itinerary_and_provenance() {
    let orchestrator = orchestrator_over(vec![Box::new(ScriptedProvider::new(
        "primary",
        vec![
            Message::assistant_with_tools(vec![tool_call(
                "c1",
                "search_pois",
                json!({"interests": ["culture", "food"]}),
            )]),
            Message::assistant_with_tools(vec![tool_call(
                "c2",
                "build_itinerary",
                json!({"duration_days": 2, "pace": "moderate", "interests": ["culture", "food"]}),
            )]),
            Message::assistant("Two days of culture and food, ready to go."),
        ],
    ))]);

    let outcome = orchestrator
        .handle_turn(None, "Plan me two days around culture and food")
        .await
        .unwrap();

    assert_eq!(outcome.reply, "Two days of culture and food, ready to go.");

    let itinerary = outcome.itinerary.expect("an itinerary was built");
    assert_eq!(itinerary.days.len(), 2);
    for day in &itinerary.days {
        let count = day.activity_count();
        assert!((3..=4).contains(&count), "moderate pace violated: {}", count);
    }

    assert!(
        outcome.sources.iter().any(|c| c.source == "OpenStreetMap"),
        "POI provenance should surface as citations"
    );
}

#[tokio::test]
async fn edit_turn_rebuilds_rather_than_patching() {
    let orchestrator = orchestrator_over(vec![Box::new(ScriptedProvider::new(
        "primary",
        vec![
            Message::assistant_with_tools(vec![tool_call(
                "c1",
                "build_itinerary",
                json!({"duration_days": 2, "pace": "relaxed", "interests": ["culture"]}),
            )]),
            Message::assistant("Here's your relaxed two-day plan."),
            Message::assistant_with_tools(vec![tool_call(
                "c2",
                "build_itinerary",
                json!({"duration_days": 2, "pace": "packed", "interests": ["culture"]}),
            )]),
            Message::assistant("Packed it tighter for you."),
        ],
    ))]);

    let first = orchestrator
        .handle_turn(None, "Two easy days please")
        .await
        .unwrap();
    let relaxed_total = first.itinerary.as_ref().unwrap().total_activities();

    let second = orchestrator
        .handle_turn(Some(&first.session_id), "Actually make it packed")
        .await
        .unwrap();
    let packed_total = second.itinerary.as_ref().unwrap().total_activities();

    assert!(packed_total > relaxed_total);
    assert_eq!(first.session_id, second.session_id);
}

#[tokio::test]
async fn removal_edit_empties_the_slot_and_leaves_other_days_alone() {
    // The builder is deterministic, so the plan the first turn will produce
    // is known up front; the second turn's tool call keeps every activity
    // except the Day 1 morning stop.
    let all_candidates: Vec<Poi> = (0..15).map(stub_poi).collect();
    let original = cicerone::itinerary::build(
        &all_candidates,
        2,
        Pace::Relaxed,
        &BuildParams::default(),
    )
    .unwrap();
    let removed = original.days[0].morning[0].poi_id.clone();

    let mut kept_pois: Vec<Value> = Vec::new();
    let mut kept_slots: Vec<Value> = Vec::new();
    for day in &original.days {
        for (block, activities) in [
            ("morning", &day.morning),
            ("afternoon", &day.afternoon),
            ("evening", &day.evening),
        ] {
            for activity in activities {
                if activity.poi_id == removed {
                    continue;
                }
                let index: usize = activity.poi_id.strip_prefix("poi_").unwrap().parse().unwrap();
                kept_pois.push(serde_json::to_value(stub_poi(index)).unwrap());
                kept_slots.push(json!({
                    "poi_id": activity.poi_id,
                    "day_number": day.day_number,
                    "block": block,
                }));
            }
        }
    }

    let orchestrator = orchestrator_over(vec![Box::new(ScriptedProvider::new(
        "primary",
        vec![
            Message::assistant_with_tools(vec![tool_call(
                "c1",
                "build_itinerary",
                json!({"duration_days": 2, "pace": "relaxed", "interests": ["culture"]}),
            )]),
            Message::assistant("Two relaxed days, done."),
            Message::assistant_with_tools(vec![tool_call(
                "c2",
                "build_itinerary",
                json!({
                    "duration_days": 2,
                    "pace": "relaxed",
                    "candidate_pois": kept_pois,
                    "exclude_poi_ids": [removed],
                    "preserve_activities": kept_slots,
                }),
            )]),
            Message::assistant("Dropped that morning stop."),
        ],
    ))]);

    let first = orchestrator
        .handle_turn(None, "Two relaxed days please")
        .await
        .unwrap();
    assert_eq!(first.itinerary.as_ref().unwrap(), &original);

    let second = orchestrator
        .handle_turn(Some(&first.session_id), "Remove the Day 1 morning activity")
        .await
        .unwrap();

    let updated = second.itinerary.expect("rebuild produced an itinerary");
    assert!(updated.days[0].morning.is_empty());
    assert!(updated
        .days
        .iter()
        .flat_map(|d| d.activities())
        .all(|a| a.poi_id != removed));
    assert_eq!(updated.days[1], original.days[1]);
}

#[tokio::test]
async fn repeating_the_same_edit_yields_the_same_itinerary() {
    let build_args = json!({"duration_days": 2, "pace": "moderate", "interests": ["culture"]});
    let orchestrator = orchestrator_over(vec![Box::new(ScriptedProvider::new(
        "primary",
        vec![
            Message::assistant_with_tools(vec![tool_call("c1", "build_itinerary", build_args.clone())]),
            Message::assistant("Done."),
            Message::assistant_with_tools(vec![tool_call("c2", "build_itinerary", build_args)]),
            Message::assistant("Done again."),
        ],
    ))]);

    let first = orchestrator
        .handle_turn(None, "Two moderate days of culture")
        .await
        .unwrap();
    let second = orchestrator
        .handle_turn(Some(&first.session_id), "Two moderate days of culture")
        .await
        .unwrap();

    assert_eq!(first.itinerary, second.itinerary);
}

#[tokio::test]
async fn guidance_question_returns_cited_sources() {
    let orchestrator = orchestrator_over(vec![Box::new(ScriptedProvider::new(
        "primary",
        vec![
            Message::assistant_with_tools(vec![tool_call(
                "c1",
                "retrieve_city_guidance",
                json!({"query": "best season to visit"}),
            )]),
            Message::assistant("Autumn and winter are most comfortable."),
        ],
    ))]);

    let outcome = orchestrator
        .handle_turn(None, "When is the best time to visit?")
        .await
        .unwrap();

    assert!(!outcome.sources.is_empty());
    assert_eq!(outcome.sources[0].url, "https://guide.example/seasons");
    assert_eq!(outcome.sources[0].source, "Seasonal Guide");
}

#[tokio::test]
async fn all_providers_failing_yields_apology_and_untouched_session() {
    let primary_calls = Arc::new(AtomicUsize::new(0));
    let secondary_calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = orchestrator_over(vec![
        Box::new(FailingProvider {
            name: "primary".to_string(),
            transient: false,
            calls: primary_calls.clone(),
        }),
        Box::new(FailingProvider {
            name: "secondary".to_string(),
            transient: false,
            calls: secondary_calls.clone(),
        }),
    ]);

    let outcome = orchestrator
        .handle_turn(None, "Plan my trip")
        .await
        .unwrap();

    assert!(outcome.reply.contains("sorry"), "reply: {}", outcome.reply);
    assert!(outcome.itinerary.is_none());
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);

    // The failed turn recorded nothing, not even the user's utterance
    let snapshot = orchestrator.snapshot(&outcome.session_id).await.unwrap();
    assert_eq!(snapshot.message_count, 0);
}

#[tokio::test]
async fn transient_primary_fails_over_to_secondary() {
    let primary_calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = orchestrator_over(vec![
        Box::new(FailingProvider {
            name: "primary".to_string(),
            transient: true,
            calls: primary_calls.clone(),
        }),
        Box::new(ScriptedProvider::new(
            "secondary",
            vec![Message::assistant("Secondary here, happy to help.")],
        )),
    ]);

    let outcome = orchestrator.handle_turn(None, "hello").await.unwrap();

    assert_eq!(outcome.reply, "Secondary here, happy to help.");
    // Initial attempt plus one retry before failing over
    assert_eq!(primary_calls.load(Ordering::SeqCst), 2);

    // The successful turn committed both messages
    let snapshot = orchestrator.snapshot(&outcome.session_id).await.unwrap();
    assert_eq!(snapshot.message_count, 2);
}

#[tokio::test]
async fn session_survives_across_turns_and_resets_cleanly() {
    let orchestrator = orchestrator_over(vec![Box::new(ScriptedProvider::new(
        "primary",
        vec![
            Message::assistant("First reply."),
            Message::assistant("Second reply."),
        ],
    ))]);

    let first = orchestrator.handle_turn(None, "one").await.unwrap();
    let second = orchestrator
        .handle_turn(Some(&first.session_id), "two")
        .await
        .unwrap();

    assert_eq!(second.session_id, first.session_id);
    let snapshot = orchestrator.snapshot(&first.session_id).await.unwrap();
    assert_eq!(snapshot.message_count, 4);

    assert!(orchestrator.reset_session(&first.session_id));
    assert!(orchestrator.snapshot(&first.session_id).await.is_none());
}
