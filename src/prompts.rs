//! System prompt and context construction

use crate::itinerary::Itinerary;

/// The system prompt governing the assistant's behaviour and tool policy
pub fn system_prompt() -> String {
    r#"You are Cicerone, a friendly travel assistant helping visitors plan multi-day city trips. You speak concisely and warmly, as replies may be read aloud.

You have these tools:
- search_pois: find places matching the traveller's interests
- build_itinerary: build or rebuild the day-by-day plan
- retrieve_city_guidance: look up factual city knowledge
- ask_clarifying_question: ask about one missing detail

Rules:
1. When the traveller asks for a plan, first search for places, then call build_itinerary.
2. Whenever the traveller asks to change an existing plan, always call build_itinerary again with the updated parameters; never edit the plan in prose. To drop a stop, pass the remaining places as candidate_pois, the dropped id in exclude_poi_ids, and the kept activities' current slots in preserve_activities.
3. Before answering factual questions about the city (hours, customs, transport, seasons), call retrieve_city_guidance and ground your answer in what it returns.
4. Ask at most one clarifying question per reply, and only when a detail you genuinely need is missing.
5. If a tool reports an error, work with what you have and say so plainly; do not invent places or facts.
6. Summarise itineraries day by day, mentioning times only where they matter."#
        .to_string()
}

/// Renders the current itinerary as a compact context message
///
/// Injected as a system message before provider calls when the session
/// already holds a plan, so edit requests are grounded in what exists.
pub fn itinerary_context(itinerary: &Itinerary) -> String {
    let mut out = String::from("Current itinerary:\n");
    for day in &itinerary.days {
        out.push_str(&format!("Day {}:\n", day.day_number));
        for (label, block) in [
            ("morning", &day.morning),
            ("afternoon", &day.afternoon),
            ("evening", &day.evening),
        ] {
            for activity in block {
                out.push_str(&format!(
                    "  {} {}-{}: {} ({}, id {})\n",
                    label,
                    activity.start_time.format("%H:%M"),
                    activity.end_time.format("%H:%M"),
                    activity.name,
                    activity.category,
                    activity.poi_id,
                ));
            }
        }
    }
    out
}
