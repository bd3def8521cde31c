//! Points of interest
//!
//! Defines the `Poi` data model, the `PoiProvider` trait the search tool
//! calls through, and an Overpass-backed implementation that maps traveller
//! interests to OpenStreetMap tag queries.

use crate::config::PoiConfig;
use crate::error::{CiceroneError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

/// A point of interest returned by a POI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    /// Stable identifier (OSM element id for the Overpass provider)
    pub id: String,
    /// Display name
    pub name: String,
    /// Location
    pub location: Coordinate,
    /// Category label (museum, attraction, restaurant, cafe, park, ...)
    pub category: String,
    /// Estimated visit duration in minutes
    pub visit_duration_minutes: u32,
    /// Distance from the city centre in kilometres
    pub distance_km: f64,
    /// Data source name, for citations
    pub source: String,
    /// Data source URL, for citations
    pub source_url: String,
}

/// Search constraints beyond the interest list
///
/// Providers apply what they can and ignore the rest; the Overpass
/// implementation only knows how to honour `indoor_only`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoiConstraints {
    /// Budget hint ("low", "medium", "high")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Pace hint, forwarded from the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    /// Only include indoor places (rainy-day planning)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indoor_only: Option<bool>,
    /// Prefer step-free, accessible places
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<bool>,
}

/// Provider of POI search results
///
/// The real dataset lives behind this trait; tests substitute fixed
/// candidate lists.
#[async_trait]
pub trait PoiProvider: Send + Sync {
    /// Searches for POIs matching the given interests
    ///
    /// # Arguments
    ///
    /// * `interests` - Interest labels ("culture", "food", "nature", ...)
    /// * `constraints` - Optional distance/category filters
    /// * `max_results` - Upper bound on the number of POIs returned
    async fn search(
        &self,
        interests: &[String],
        constraints: &PoiConstraints,
        max_results: usize,
    ) -> Result<Vec<Poi>>;
}

/// Great-circle distance between two coordinates, in kilometres
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Maps an interest label to Overpass tag filters
///
/// Unknown interests fall back to general tourist attractions.
fn tag_filters_for_interest(interest: &str) -> Vec<&'static str> {
    match interest.to_lowercase().as_str() {
        "culture" | "history" | "heritage" => vec![
            "node[\"tourism\"=\"museum\"]",
            "node[\"historic\"]",
            "node[\"tourism\"=\"gallery\"]",
        ],
        "food" | "dining" => vec![
            "node[\"amenity\"=\"restaurant\"]",
            "node[\"amenity\"=\"cafe\"]",
        ],
        "nature" | "outdoors" => vec!["node[\"leisure\"=\"park\"]", "node[\"leisure\"=\"garden\"]"],
        "shopping" | "markets" => vec![
            "node[\"shop\"=\"mall\"]",
            "node[\"amenity\"=\"marketplace\"]",
        ],
        "religion" | "spiritual" => vec!["node[\"amenity\"=\"place_of_worship\"]"],
        _ => vec!["node[\"tourism\"=\"attraction\"]"],
    }
}

/// Categorises an OSM element from its tags
fn categorize(tags: &Value) -> String {
    let get = |k: &str| tags.get(k).and_then(Value::as_str);

    if get("tourism") == Some("museum") || get("tourism") == Some("gallery") {
        "museum".to_string()
    } else if tags.get("historic").is_some() {
        "attraction".to_string()
    } else if get("amenity") == Some("restaurant") {
        "restaurant".to_string()
    } else if get("amenity") == Some("cafe") {
        "cafe".to_string()
    } else if get("leisure") == Some("park") || get("leisure") == Some("garden") {
        "park".to_string()
    } else if get("amenity") == Some("place_of_worship") {
        "temple".to_string()
    } else if get("shop").is_some() || get("amenity") == Some("marketplace") {
        "market".to_string()
    } else {
        "attraction".to_string()
    }
}

/// Typical visit duration for a category, in minutes
fn visit_duration_for(category: &str) -> u32 {
    match category {
        "museum" | "attraction" => 120,
        "park" | "temple" => 90,
        "market" => 90,
        "restaurant" => 60,
        "cafe" => 30,
        _ => 60,
    }
}

/// POI provider backed by the Overpass OpenStreetMap API
pub struct OverpassPoiProvider {
    config: PoiConfig,
    client: reqwest::Client,
}

impl OverpassPoiProvider {
    /// Creates a new Overpass provider from configuration
    pub fn new(config: PoiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self { config, client })
    }

    /// Builds the Overpass QL query for a set of interests
    fn build_query(&self, interests: &[String]) -> String {
        let centre = format!(
            "around:{},{},{}",
            self.config.radius_meters, self.config.city_lat, self.config.city_lon
        );
        let mut clauses = String::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for interest in interests {
            for filter in tag_filters_for_interest(interest) {
                if seen.insert(filter) {
                    clauses.push_str(&format!("  {}({});\n", filter, centre));
                }
            }
        }
        format!("[out:json][timeout:15];\n(\n{});\nout body 100;", clauses)
    }

    /// Posts a query with bounded retry on transient failures
    async fn run_query(&self, query: &str) -> Result<Value> {
        let mut attempt: u32 = 0;
        loop {
            let outcome = self
                .client
                .post(&self.config.api_base)
                .form(&[("data", query)])
                .send()
                .await;

            let error_text = match outcome {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json::<Value>().await?);
                }
                Ok(response) => format!("Overpass returned HTTP {}", response.status().as_u16()),
                Err(e) => format!("Overpass request failed: {}", e),
            };

            if attempt >= self.config.max_retries {
                return Err(CiceroneError::Tool(error_text).into());
            }

            let delay = Duration::from_millis(500 * 2u64.pow(attempt));
            tracing::debug!(attempt = attempt + 1, error = %error_text, "Retrying POI query");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Converts Overpass elements to POIs, dropping unnamed ones
    fn parse_elements(&self, body: &Value) -> Vec<Poi> {
        let centre = Coordinate {
            lat: self.config.city_lat,
            lon: self.config.city_lon,
        };

        let elements = body
            .get("elements")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut pois = Vec::new();
        for element in &elements {
            let Some(tags) = element.get("tags") else {
                continue;
            };
            let Some(name) = tags.get("name").and_then(Value::as_str) else {
                continue;
            };
            let (Some(lat), Some(lon)) = (
                element.get("lat").and_then(Value::as_f64),
                element.get("lon").and_then(Value::as_f64),
            ) else {
                continue;
            };

            let id = element
                .get("id")
                .and_then(Value::as_u64)
                .map(|i| format!("osm:{}", i))
                .unwrap_or_else(|| format!("osm:{}", name));
            let location = Coordinate { lat, lon };
            let category = categorize(tags);
            let website = tags
                .get("website")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!(
                        "https://www.openstreetmap.org/{}",
                        id.trim_start_matches("osm:")
                    )
                });

            pois.push(Poi {
                id,
                name: name.to_string(),
                location,
                visit_duration_minutes: visit_duration_for(&category),
                distance_km: haversine_km(centre, location),
                category,
                source: "OpenStreetMap".to_string(),
                source_url: website,
            });
        }
        pois
    }
}

#[async_trait]
impl PoiProvider for OverpassPoiProvider {
    async fn search(
        &self,
        interests: &[String],
        constraints: &PoiConstraints,
        max_results: usize,
    ) -> Result<Vec<Poi>> {
        let query = self.build_query(interests);
        tracing::debug!(interests = ?interests, "Running Overpass POI search");
        let body = self.run_query(&query).await?;
        let mut pois = self.parse_elements(&body);

        if constraints.indoor_only == Some(true) {
            const INDOOR: [&str; 4] = ["museum", "restaurant", "cafe", "market"];
            pois.retain(|p| INDOOR.contains(&p.category.as_str()));
        }
        if constraints.budget.is_some() || constraints.accessibility.is_some() {
            // OpenStreetMap data here has no reliable price or accessibility
            // tagging; these hints are left to richer providers
            tracing::debug!("Ignoring budget/accessibility constraints for Overpass search");
        }

        // Dedupe by name, keeping the first occurrence
        let mut seen: HashSet<String> = HashSet::new();
        pois.retain(|p| seen.insert(p.name.to_lowercase()));

        pois.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pois.truncate(max_results);

        tracing::info!(count = pois.len(), "POI search complete");
        Ok(pois)
    }
}
