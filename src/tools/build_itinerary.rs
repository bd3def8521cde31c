//! Itinerary construction tool
//!
//! The `build_itinerary` tool: gathers candidate POIs (either supplied
//! explicitly or fetched for the requested interests), runs the
//! deterministic builder, and returns the complete schedule as the tool
//! payload. Edits that drop or keep specific stops pass `exclude_poi_ids`
//! and `preserve_activities` so the rebuild respects them. Never cached:
//! the itinerary must always reflect the latest request.

use crate::config::ItineraryConfig;
use crate::error::{CiceroneError, Result};
use crate::itinerary::{self, BuildParams, Pace, Pin};
use crate::poi::{Poi, PoiConstraints, PoiProvider};
use crate::tools::{Tool, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Extra candidates fetched beyond the pace cap, so dedupe and filtering
/// still leave enough to schedule
const CANDIDATE_HEADROOM: usize = 10;

/// The `build_itinerary` tool
pub struct BuildItineraryTool {
    poi_provider: Arc<dyn PoiProvider>,
    params: BuildParams,
}

impl BuildItineraryTool {
    /// Creates the tool from itinerary configuration
    pub fn new(poi_provider: Arc<dyn PoiProvider>, config: &ItineraryConfig) -> Result<Self> {
        let params = BuildParams {
            start_time: itinerary::parse_time(&config.daily_start_time)?,
            average_speed_kmh: config.average_speed_kmh,
            max_duration_days: config.max_duration_days,
        };
        Ok(Self {
            poi_provider,
            params,
        })
    }
}

#[async_trait]
impl ToolExecutor for BuildItineraryTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "build_itinerary".to_string(),
            description: "Build a complete day-by-day itinerary for the trip. Call this \
                          whenever the traveller asks for a plan or wants an existing plan \
                          changed; the result replaces any previous itinerary. To remove a \
                          stop, pass the places to keep as candidate_pois, the dropped id \
                          in exclude_poi_ids, and the kept activities' current slots in \
                          preserve_activities."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "duration_days": {
                        "type": "integer",
                        "description": "Trip length in days"
                    },
                    "pace": {
                        "type": "string",
                        "enum": ["relaxed", "moderate", "packed"],
                        "description": "How full each day should be"
                    },
                    "interests": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Interest labels guiding which places are scheduled; \
                                        required unless candidate_pois is given"
                    },
                    "candidate_pois": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Explicit candidate places, exactly as returned by \
                                        search_pois; when given, no fresh search is run"
                    },
                    "exclude_poi_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Ids of places to leave out of the plan"
                    },
                    "preserve_activities": {
                        "type": "array",
                        "items": {"type": "object"},
                        "description": "Activities to keep in their current slot, each as \
                                        {poi_id, day_number, block} with block one of \
                                        morning, afternoon, evening"
                    },
                    "start_time": {
                        "type": "string",
                        "description": "Daily start time as HH:MM (optional)"
                    }
                },
                "required": ["duration_days", "pace"]
            }),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult> {
        let duration_days = args["duration_days"].as_u64().unwrap_or(0) as u8;
        let pace: Pace = match args["pace"].as_str().unwrap_or_default().parse() {
            Ok(pace) => pace,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };
        let interests: Vec<String> = args["interests"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut params = self.params.clone();
        if let Some(start) = args["start_time"].as_str() {
            match itinerary::parse_time(start) {
                Ok(time) => params.start_time = time,
                Err(_) => {
                    return Ok(ToolResult::error(format!(
                        "start_time '{}' is not a valid HH:MM time",
                        start
                    )))
                }
            }
        }

        let pins: Vec<Pin> = match args.get("preserve_activities") {
            Some(raw) if !raw.is_null() => match serde_json::from_value(raw.clone()) {
                Ok(pins) => pins,
                Err(e) => {
                    return Ok(ToolResult::error(format!(
                        "preserve_activities entries must carry poi_id, day_number, and block: {}",
                        e
                    )))
                }
            },
            _ => Vec::new(),
        };

        let mut pois: Vec<Poi> = match args.get("candidate_pois") {
            Some(raw) if !raw.is_null() => match serde_json::from_value(raw.clone()) {
                Ok(pois) => pois,
                Err(e) => {
                    return Ok(ToolResult::error(format!(
                        "candidate_pois entries must look like search_pois results: {}",
                        e
                    )))
                }
            },
            _ => {
                if interests.is_empty() {
                    return Ok(ToolResult::error(
                        "provide either interests to search for or explicit candidate_pois",
                    ));
                }
                let max_candidates =
                    pace.daily_cap() * duration_days as usize + CANDIDATE_HEADROOM;
                match self
                    .poi_provider
                    .search(&interests, &PoiConstraints::default(), max_candidates)
                    .await
                {
                    Ok(pois) => pois,
                    Err(e) => {
                        tracing::warn!(error = %e, "Candidate search failed during itinerary build");
                        return Ok(ToolResult::error(format!(
                            "could not fetch candidate places: {}",
                            e
                        )));
                    }
                }
            }
        };

        if let Some(excluded) = args["exclude_poi_ids"].as_array() {
            let ids: HashSet<&str> = excluded.iter().filter_map(Value::as_str).collect();
            pois.retain(|p| !ids.contains(p.id.as_str()));
        }

        match itinerary::build_pinned(&pois, duration_days, pace, &params, &pins) {
            Ok(itinerary) => {
                tracing::info!(
                    days = itinerary.days.len(),
                    activities = itinerary.total_activities(),
                    "Built itinerary"
                );
                Ok(ToolResult::ok(json!({"itinerary": itinerary})))
            }
            Err(e) => {
                let message = match e.downcast_ref::<CiceroneError>() {
                    Some(CiceroneError::InsufficientCandidates { needed, available }) => format!(
                        "not enough places found: the requested pace needs at least {} but only {} matched; try broader interests or a shorter trip",
                        needed, available
                    ),
                    _ => e.to_string(),
                };
                Ok(ToolResult::error(message))
            }
        }
    }
}
