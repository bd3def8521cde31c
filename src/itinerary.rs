//! Deterministic multi-day itinerary builder
//!
//! Pure scheduling logic: no I/O, no randomness. Given a candidate POI list,
//! a trip length, and a pace, the builder produces the same itinerary every
//! time. Candidates are spread across days with a two-phase least-loaded
//! assignment, then each day's activities get sequential times with a
//! distance-based travel estimate between consecutive stops.

use crate::error::{CiceroneError, Result};
use crate::poi::{haversine_km, Poi};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Nominal start of the afternoon block
const AFTERNOON_FLOOR: (u32, u32) = (13, 0);
/// Nominal start of the evening block
const EVENING_FLOOR: (u32, u32) = (18, 0);
/// Fixed transfer overhead added to every travel estimate, in minutes
const TRAVEL_BUFFER_MINUTES: f64 = 5.0;
/// Travel estimates are clamped into this range, in minutes
const TRAVEL_MIN: u32 = 5;
const TRAVEL_MAX: u32 = 60;

/// Trip pace: how many activities fit into a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    /// 2-3 activities per day
    Relaxed,
    /// 3-4 activities per day
    Moderate,
    /// 4-5 activities per day
    Packed,
}

impl Pace {
    /// Minimum activities per day at this pace
    pub fn daily_min(self) -> usize {
        match self {
            Pace::Relaxed => 2,
            Pace::Moderate => 3,
            Pace::Packed => 4,
        }
    }

    /// Maximum activities per day at this pace
    pub fn daily_cap(self) -> usize {
        match self {
            Pace::Relaxed => 3,
            Pace::Moderate => 4,
            Pace::Packed => 5,
        }
    }

    /// Per-block capacities: morning, afternoon, evening
    pub fn block_caps(self) -> [usize; 3] {
        match self {
            Pace::Relaxed => [1, 1, 1],
            Pace::Moderate => [1, 2, 1],
            Pace::Packed => [2, 2, 1],
        }
    }

    /// Idle buffer between consecutive activities, in minutes
    pub fn buffer_minutes(self) -> u32 {
        match self {
            Pace::Relaxed => 30,
            Pace::Moderate => 20,
            Pace::Packed => 15,
        }
    }
}

impl FromStr for Pace {
    type Err = CiceroneError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relaxed" => Ok(Pace::Relaxed),
            "moderate" => Ok(Pace::Moderate),
            "packed" => Ok(Pace::Packed),
            other => Err(CiceroneError::Tool(format!(
                "unknown pace '{}', expected relaxed, moderate, or packed",
                other
            ))),
        }
    }
}

/// Day block an activity can be scheduled or pinned into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Block {
    Morning,
    Afternoon,
    Evening,
}

impl Block {
    fn index(self) -> usize {
        match self {
            Block::Morning => 0,
            Block::Afternoon => 1,
            Block::Evening => 2,
        }
    }
}

/// An activity held in place while the rest of the plan is rebuilt
///
/// Edits that remove or keep specific stops express the kept ones as pins:
/// the builder seats them first, in their original day and block, then
/// distributes any remaining candidates around them. A day whose pins
/// already satisfy the pace minimum is left alone, which is what lets a
/// removal leave its block empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Candidate POI to hold in place
    pub poi_id: String,
    /// 1-based day to keep it on
    pub day_number: u32,
    /// Block to keep it in
    pub block: Block,
}

/// One scheduled stop in a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    /// POI identifier
    pub poi_id: String,
    /// POI display name
    pub name: String,
    /// POI category
    pub category: String,
    /// Scheduled start time
    pub start_time: NaiveTime,
    /// Scheduled end time
    pub end_time: NaiveTime,
    /// Time spent at the POI, in minutes
    pub visit_duration_minutes: u32,
    /// Estimated travel from the previous stop, in minutes. Zero for the
    /// first activity of a day.
    pub travel_from_previous_minutes: u32,
}

/// One day of the itinerary, split into blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// 1-based day number
    pub day_number: u32,
    /// Morning activities
    pub morning: Vec<ScheduledActivity>,
    /// Afternoon activities (from 13:00 nominally)
    pub afternoon: Vec<ScheduledActivity>,
    /// Evening activities (from 18:00 nominally)
    pub evening: Vec<ScheduledActivity>,
}

impl Day {
    /// All activities of the day in chronological order
    pub fn activities(&self) -> impl Iterator<Item = &ScheduledActivity> {
        self.morning
            .iter()
            .chain(self.afternoon.iter())
            .chain(self.evening.iter())
    }

    /// Number of activities scheduled on this day
    pub fn activity_count(&self) -> usize {
        self.morning.len() + self.afternoon.len() + self.evening.len()
    }
}

/// A complete multi-day itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    /// Days in trip order
    pub days: Vec<Day>,
    /// Pace the itinerary was built at
    pub pace: Pace,
}

impl Itinerary {
    /// Total number of scheduled activities across all days
    pub fn total_activities(&self) -> usize {
        self.days.iter().map(Day::activity_count).sum()
    }
}

/// Builder parameters derived from configuration
#[derive(Debug, Clone)]
pub struct BuildParams {
    /// Time the first activity of each day may start
    pub start_time: NaiveTime,
    /// Assumed average in-city travel speed, km/h
    pub average_speed_kmh: f64,
    /// Upper bound on trip length in days
    pub max_duration_days: u8,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            average_speed_kmh: 30.0,
            max_duration_days: 7,
        }
    }
}

/// Parses an "HH:MM" time string
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| CiceroneError::Config(format!("invalid time '{}': {}", s, e)).into())
}

/// Estimated travel time between two POIs, in minutes
///
/// Straight-line distance at the configured average speed, plus a fixed
/// transfer overhead, clamped into a sane urban range.
fn travel_minutes(from: &Poi, to: &Poi, average_speed_kmh: f64) -> u32 {
    let km = haversine_km(from.location, to.location);
    let minutes = km / average_speed_kmh * 60.0 + TRAVEL_BUFFER_MINUTES;
    (minutes.round() as u32).clamp(TRAVEL_MIN, TRAVEL_MAX)
}

/// Per-day state tracked during candidate assignment
struct DaySlots {
    blocks: [Vec<usize>; 3],
    minutes: u32,
}

impl DaySlots {
    fn count(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    /// First block with free capacity at this pace, if any
    fn open_block(&self, caps: [usize; 3]) -> Option<usize> {
        (0..3).find(|&b| self.blocks[b].len() < caps[b])
    }
}

/// Builds a multi-day itinerary from candidate POIs
///
/// Deterministic: the same inputs always yield the same itinerary.
/// Candidates are consumed in input order, which doubles as their priority:
/// when more candidates arrive than the pace can hold, the excess is dropped
/// from the tail of the list.
///
/// Assignment runs in two phases. Phase one fills every day up to the pace
/// minimum, always choosing the day with the least accumulated visit time
/// (ties go to the lowest day index). Phase two tops days up to the pace
/// cap the same way. Within a day, an activity goes to the earliest block
/// with free capacity.
///
/// # Arguments
///
/// * `pois` - Candidate POIs in priority order
/// * `duration_days` - Trip length
/// * `pace` - Activities-per-day profile
/// * `params` - Start time, travel speed, and duration cap
///
/// # Errors
///
/// `CiceroneError::InsufficientCandidates` if there are fewer POIs than the
/// pace minimum requires across all days; `CiceroneError::Tool` for an
/// out-of-range duration
pub fn build(
    pois: &[Poi],
    duration_days: u8,
    pace: Pace,
    params: &BuildParams,
) -> Result<Itinerary> {
    build_pinned(pois, duration_days, pace, params, &[])
}

/// Builds an itinerary with some activities held in place
///
/// Pins are seated first, in input order, into their named day and block;
/// the remaining candidates then fill the open capacity through the usual
/// two-phase assignment. A pin naming a POI that is not in the candidate
/// list is ignored with a warning, so a removal expressed as "pin everything
/// except the dropped stop" stays robust against stale ids.
///
/// # Errors
///
/// Everything `build` returns, plus `CiceroneError::Tool` when a pin names a
/// day outside the trip or overfills a block for the pace
pub fn build_pinned(
    pois: &[Poi],
    duration_days: u8,
    pace: Pace,
    params: &BuildParams,
    pins: &[Pin],
) -> Result<Itinerary> {
    if duration_days == 0 || duration_days > params.max_duration_days {
        return Err(CiceroneError::Tool(format!(
            "duration_days must be between 1 and {}, got {}",
            params.max_duration_days, duration_days
        ))
        .into());
    }

    let days = duration_days as usize;
    let needed = pace.daily_min() * days;
    if pois.len() < needed {
        return Err(CiceroneError::InsufficientCandidates {
            needed,
            available: pois.len(),
        }
        .into());
    }

    let caps = pace.block_caps();

    let mut slots: Vec<DaySlots> = (0..days)
        .map(|_| DaySlots {
            blocks: [Vec::new(), Vec::new(), Vec::new()],
            minutes: 0,
        })
        .collect();
    let mut used = vec![false; pois.len()];

    for pin in pins {
        let Some(index) = pois
            .iter()
            .enumerate()
            .find(|(i, p)| !used[*i] && p.id == pin.poi_id)
            .map(|(i, _)| i)
        else {
            tracing::warn!(poi_id = %pin.poi_id, "Ignoring pin for a POI not in the candidate list");
            continue;
        };
        if pin.day_number == 0 || pin.day_number as usize > days {
            return Err(CiceroneError::Tool(format!(
                "pinned day {} is outside the {}-day trip",
                pin.day_number, days
            ))
            .into());
        }
        let day_index = pin.day_number as usize - 1;
        let block = pin.block.index();
        if slots[day_index].blocks[block].len() >= caps[block] {
            return Err(CiceroneError::Tool(format!(
                "too many activities pinned to day {} {:?}",
                pin.day_number, pin.block
            ))
            .into());
        }
        slots[day_index].blocks[block].push(index);
        slots[day_index].minutes += pois[index].visit_duration_minutes;
        used[index] = true;
    }

    // Phase one: bring every day up to the pace minimum. Phase two: top up
    // to the cap. Both phases pick the least-loaded eligible day by
    // accumulated visit minutes, lowest index on ties. Pinned candidates
    // already sit in their slots and are skipped here.
    let mut queue = pois.iter().enumerate().filter(|(i, _)| !used[*i]);
    for phase_limit in [pace.daily_min(), pace.daily_cap()] {
        loop {
            let target = slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.count() < phase_limit && s.open_block(caps).is_some())
                .min_by_key(|(i, s)| (s.minutes, *i))
                .map(|(i, _)| i);

            let Some(day_index) = target else { break };
            let Some((candidate_index, poi)) = queue.next() else {
                break;
            };

            let block = slots[day_index]
                .open_block(caps)
                .expect("eligible day has an open block");
            slots[day_index].blocks[block].push(candidate_index);
            slots[day_index].minutes += poi.visit_duration_minutes;
        }
    }

    let itinerary_days = slots
        .iter()
        .enumerate()
        .map(|(day_index, day_slots)| schedule_day(day_index, day_slots, pois, pace, params))
        .collect();

    Ok(Itinerary {
        days: itinerary_days,
        pace,
    })
}

/// Assigns sequential times to one day's activities
fn schedule_day(
    day_index: usize,
    slots: &DaySlots,
    candidates: &[Poi],
    pace: Pace,
    params: &BuildParams,
) -> Day {
    let floors = [
        params.start_time,
        NaiveTime::from_hms_opt(AFTERNOON_FLOOR.0, AFTERNOON_FLOOR.1, 0).unwrap(),
        NaiveTime::from_hms_opt(EVENING_FLOOR.0, EVENING_FLOOR.1, 0).unwrap(),
    ];
    let buffer = chrono::Duration::minutes(pace.buffer_minutes() as i64);

    let mut cursor = params.start_time;
    let mut previous: Option<&Poi> = None;
    let mut blocks: [Vec<ScheduledActivity>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for block_index in 0..3 {
        if cursor < floors[block_index] {
            cursor = floors[block_index];
        }

        for &candidate_index in &slots.blocks[block_index] {
            let poi = &candidates[candidate_index];
            let travel = match previous {
                Some(prev) => travel_minutes(prev, poi, params.average_speed_kmh),
                None => 0,
            };
            let start = cursor + chrono::Duration::minutes(travel as i64);
            let end = start + chrono::Duration::minutes(poi.visit_duration_minutes as i64);

            blocks[block_index].push(ScheduledActivity {
                poi_id: poi.id.clone(),
                name: poi.name.clone(),
                category: poi.category.clone(),
                start_time: start,
                end_time: end,
                visit_duration_minutes: poi.visit_duration_minutes,
                travel_from_previous_minutes: travel,
            });

            cursor = end + buffer;
            previous = Some(poi);
        }
    }

    let [morning, afternoon, evening] = blocks;
    Day {
        day_number: day_index as u32 + 1,
        morning,
        afternoon,
        evening,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::Coordinate;

    fn poi(index: usize, visit_minutes: u32) -> Poi {
        Poi {
            id: format!("poi_{}", index),
            name: format!("Place {}", index),
            location: Coordinate {
                lat: 26.90 + index as f64 * 0.01,
                lon: 75.78 + index as f64 * 0.01,
            },
            category: "attraction".to_string(),
            visit_duration_minutes: visit_minutes,
            distance_km: index as f64,
            source: "OpenStreetMap".to_string(),
            source_url: format!("https://example.org/poi/{}", index),
        }
    }

    fn candidates(n: usize) -> Vec<Poi> {
        (0..n).map(|i| poi(i, 60 + (i as u32 % 3) * 30)).collect()
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("nine").is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let pois = candidates(10);
        let params = BuildParams::default();
        let first = build(&pois, 3, Pace::Moderate, &params).unwrap();
        let second = build(&pois, 3, Pace::Moderate, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insufficient_candidates_rejected() {
        let pois = candidates(5);
        let err = build(&pois, 2, Pace::Packed, &BuildParams::default()).unwrap_err();
        match err.downcast_ref::<CiceroneError>().unwrap() {
            CiceroneError::InsufficientCandidates { needed, available } => {
                assert_eq!(*needed, 8);
                assert_eq!(*available, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duration_out_of_range_rejected() {
        let pois = candidates(30);
        assert!(build(&pois, 0, Pace::Relaxed, &BuildParams::default()).is_err());
        assert!(build(&pois, 8, Pace::Relaxed, &BuildParams::default()).is_err());
    }

    #[test]
    fn test_pace_bounds_hold_for_every_day() {
        for pace in [Pace::Relaxed, Pace::Moderate, Pace::Packed] {
            let pois = candidates(pace.daily_cap() * 3 + 4);
            let itinerary = build(&pois, 3, pace, &BuildParams::default()).unwrap();
            assert_eq!(itinerary.days.len(), 3);
            for day in &itinerary.days {
                let count = day.activity_count();
                assert!(
                    count >= pace.daily_min() && count <= pace.daily_cap(),
                    "{:?}: day {} has {} activities",
                    pace,
                    day.day_number,
                    count
                );
            }
        }
    }

    #[test]
    fn test_block_caps_hold() {
        let pois = candidates(15);
        let itinerary = build(&pois, 3, Pace::Packed, &BuildParams::default()).unwrap();
        let caps = Pace::Packed.block_caps();
        for day in &itinerary.days {
            assert!(day.morning.len() <= caps[0]);
            assert!(day.afternoon.len() <= caps[1]);
            assert!(day.evening.len() <= caps[2]);
        }
    }

    #[test]
    fn test_excess_candidates_dropped_from_tail() {
        // 3 days relaxed holds at most 9 activities; supply 12
        let pois = candidates(12);
        let itinerary = build(&pois, 3, Pace::Relaxed, &BuildParams::default()).unwrap();
        assert_eq!(itinerary.total_activities(), 9);

        let scheduled_ids: Vec<&str> = itinerary
            .days
            .iter()
            .flat_map(|d| d.activities().map(|a| a.poi_id.as_str()))
            .collect();
        for dropped in ["poi_9", "poi_10", "poi_11"] {
            assert!(!scheduled_ids.contains(&dropped));
        }
        assert!(scheduled_ids.contains(&"poi_0"));
    }

    #[test]
    fn test_first_activity_of_each_day_has_no_travel() {
        let pois = candidates(10);
        let itinerary = build(&pois, 2, Pace::Moderate, &BuildParams::default()).unwrap();
        for day in &itinerary.days {
            let first = day.activities().next().unwrap();
            assert_eq!(first.travel_from_previous_minutes, 0);
            for later in day.activities().skip(1) {
                assert!(later.travel_from_previous_minutes >= TRAVEL_MIN);
                assert!(later.travel_from_previous_minutes <= TRAVEL_MAX);
            }
        }
    }

    #[test]
    fn test_times_are_monotonic_within_a_day() {
        let pois = candidates(15);
        let itinerary = build(&pois, 3, Pace::Packed, &BuildParams::default()).unwrap();
        for day in &itinerary.days {
            let mut previous_end: Option<NaiveTime> = None;
            for activity in day.activities() {
                assert!(activity.end_time > activity.start_time);
                if let Some(prev) = previous_end {
                    assert!(activity.start_time >= prev, "overlap on day {}", day.day_number);
                }
                previous_end = Some(activity.end_time);
            }
        }
    }

    #[test]
    fn test_day_starts_at_configured_time() {
        let pois = candidates(6);
        let params = BuildParams {
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            ..BuildParams::default()
        };
        let itinerary = build(&pois, 2, Pace::Relaxed, &params).unwrap();
        for day in &itinerary.days {
            let first = day.activities().next().unwrap();
            assert_eq!(first.start_time, params.start_time);
        }
    }

    #[test]
    fn test_afternoon_block_respects_floor() {
        let pois = candidates(8);
        let itinerary = build(&pois, 2, Pace::Moderate, &BuildParams::default()).unwrap();
        let floor = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        for day in &itinerary.days {
            if let Some(first_afternoon) = day.afternoon.first() {
                assert!(first_afternoon.start_time >= floor);
            }
        }
    }

    #[test]
    fn test_least_loaded_tie_goes_to_lowest_day() {
        // Identical visit durations: assignment should round-robin starting
        // from day 1.
        let pois: Vec<Poi> = (0..6).map(|i| poi(i, 60)).collect();
        let itinerary = build(&pois, 3, Pace::Relaxed, &BuildParams::default()).unwrap();
        assert_eq!(itinerary.days[0].morning[0].poi_id, "poi_0");
        assert_eq!(itinerary.days[1].morning[0].poi_id, "poi_1");
        assert_eq!(itinerary.days[2].morning[0].poi_id, "poi_2");
    }

    fn pins_for(itinerary: &Itinerary, skip_poi_id: &str) -> Vec<Pin> {
        itinerary
            .days
            .iter()
            .flat_map(|day| {
                [
                    (Block::Morning, &day.morning),
                    (Block::Afternoon, &day.afternoon),
                    (Block::Evening, &day.evening),
                ]
                .into_iter()
                .flat_map(move |(block, activities)| {
                    activities.iter().map(move |a| Pin {
                        poi_id: a.poi_id.clone(),
                        day_number: day.day_number,
                        block,
                    })
                })
            })
            .filter(|pin| pin.poi_id != skip_poi_id)
            .collect()
    }

    #[test]
    fn test_pinned_rebuild_leaves_block_empty_and_other_day_unchanged() {
        let pois: Vec<Poi> = (0..6).map(|i| poi(i, 60)).collect();
        let params = BuildParams::default();
        let original = build(&pois, 2, Pace::Relaxed, &params).unwrap();
        let removed = original.days[0].morning[0].poi_id.clone();

        let remaining: Vec<Poi> = pois.iter().filter(|p| p.id != removed).cloned().collect();
        let pins = pins_for(&original, &removed);
        let rebuilt = build_pinned(&remaining, 2, Pace::Relaxed, &params, &pins).unwrap();

        assert!(rebuilt.days[0].morning.is_empty());
        assert_eq!(rebuilt.days[0].activity_count(), 2);
        assert_eq!(rebuilt.days[1], original.days[1]);
    }

    #[test]
    fn test_unpinned_candidates_fill_around_pins() {
        let pois: Vec<Poi> = (0..6).map(|i| poi(i, 60)).collect();
        let pins = vec![Pin {
            poi_id: "poi_5".to_string(),
            day_number: 1,
            block: Block::Morning,
        }];
        let itinerary =
            build_pinned(&pois, 2, Pace::Relaxed, &BuildParams::default(), &pins).unwrap();

        assert_eq!(itinerary.days[0].morning[0].poi_id, "poi_5");
        for day in &itinerary.days {
            let count = day.activity_count();
            assert!(count >= Pace::Relaxed.daily_min() && count <= Pace::Relaxed.daily_cap());
        }
    }

    #[test]
    fn test_pin_for_absent_poi_is_ignored() {
        let pois = candidates(6);
        let pins = vec![Pin {
            poi_id: "poi_99".to_string(),
            day_number: 1,
            block: Block::Evening,
        }];
        let itinerary =
            build_pinned(&pois, 2, Pace::Relaxed, &BuildParams::default(), &pins).unwrap();
        assert!(itinerary
            .days
            .iter()
            .flat_map(Day::activities)
            .all(|a| a.poi_id != "poi_99"));
    }

    #[test]
    fn test_pin_day_out_of_range_rejected() {
        let pois = candidates(6);
        let pins = vec![Pin {
            poi_id: "poi_0".to_string(),
            day_number: 3,
            block: Block::Morning,
        }];
        assert!(build_pinned(&pois, 2, Pace::Relaxed, &BuildParams::default(), &pins).is_err());
    }

    #[test]
    fn test_overfull_block_pins_rejected() {
        let pois = candidates(6);
        // Relaxed mornings hold one activity
        let pins = vec![
            Pin {
                poi_id: "poi_0".to_string(),
                day_number: 1,
                block: Block::Morning,
            },
            Pin {
                poi_id: "poi_1".to_string(),
                day_number: 1,
                block: Block::Morning,
            },
        ];
        assert!(build_pinned(&pois, 2, Pace::Relaxed, &BuildParams::default(), &pins).is_err());
    }

    #[test]
    fn test_travel_minutes_clamped() {
        let near_a = poi(0, 60);
        let mut near_b = poi(1, 60);
        near_b.location = near_a.location;
        assert_eq!(travel_minutes(&near_a, &near_b, 30.0), TRAVEL_MIN);

        let mut far = poi(2, 60);
        far.location = Coordinate {
            lat: near_a.location.lat + 3.0,
            lon: near_a.location.lon + 3.0,
        };
        assert_eq!(travel_minutes(&near_a, &far, 30.0), TRAVEL_MAX);
    }

    #[test]
    fn test_pace_parse() {
        assert_eq!("relaxed".parse::<Pace>().unwrap(), Pace::Relaxed);
        assert_eq!("Moderate".parse::<Pace>().unwrap(), Pace::Moderate);
        assert!("frantic".parse::<Pace>().is_err());
    }

    #[test]
    fn test_itinerary_serializes_to_json() {
        let pois = candidates(6);
        let itinerary = build(&pois, 2, Pace::Relaxed, &BuildParams::default()).unwrap();
        let json = serde_json::to_value(&itinerary).unwrap();
        assert_eq!(json["pace"], "relaxed");
        assert!(json["days"].as_array().unwrap().len() == 2);
    }
}
