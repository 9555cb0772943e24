use std::collections::{HashMap, HashSet};

use url::Url;

use crate::models::activity::Activity;
use crate::models::draft::{DraftPlan, DraftSlotName, DraftValidationDay, DraftValidationReport};
use crate::models::trip::Trip;
use crate::services::candidate_scorer::{matches_tokens, normalized_tokens};
use crate::services::distance_service::DistanceService;

/// A day's transfer total may span several legs; warn once it exceeds this
/// many times the single-leg limit.
const DAY_TOTAL_TRANSFER_MULTIPLE: u32 = 3;

const LOW_RATING_THRESHOLD: f64 = 4.0;

/// Checks a saved draft plan against its planning settings: per-day cost and
/// transfer estimates plus a deduplicated trip-level warning list. Derived
/// output only; nothing here mutates the plan.
pub struct PlanValidator;

impl PlanValidator {
    pub fn validate(trip: &Trip, plan: &DraftPlan, generated_at: String) -> DraftValidationReport {
        let settings = &plan.metadata.planning_settings;
        let day_count = trip.day_count();

        if plan.selections.is_empty() {
            return Self::empty_report(trip, day_count, generated_at);
        }

        let mut selections_by_day: HashMap<u32, HashMap<DraftSlotName, &Activity>> = HashMap::new();
        for selection in &plan.selections {
            selections_by_day
                .entry(selection.day)
                .or_default()
                .insert(selection.slot, &selection.activity);
        }

        let must_do_tokens = normalized_tokens(&settings.must_do_places);
        let avoid_tokens = normalized_tokens(&settings.avoid_places);
        let mut matched_must_do: HashSet<String> = HashSet::new();
        let mut matched_avoid: HashSet<String> = HashSet::new();

        let mut days = Vec::with_capacity(day_count as usize);
        let mut overall_warnings: Vec<String> = Vec::new();
        let mut total_cost = 0.0;

        for day in 1..=day_count {
            let slots = selections_by_day.get(&day);
            let ordered: Vec<&Activity> = DraftSlotName::ALL
                .iter()
                .filter_map(|slot| slots.and_then(|s| s.get(slot).copied()))
                .collect();

            let mut warnings: Vec<String> = Vec::new();
            let day_cost: f64 = ordered.iter().map(|a| estimated_cost(a)).sum();
            total_cost += day_cost;

            for activity in &ordered {
                for token in &must_do_tokens {
                    if activity.name.to_lowercase().contains(token) {
                        matched_must_do.insert(token.clone());
                    }
                }
                if matches_tokens(&activity.name, &avoid_tokens) {
                    for token in &avoid_tokens {
                        if activity.name.to_lowercase().contains(token) {
                            matched_avoid.insert(token.clone());
                        }
                    }
                    warnings.push(format!("Includes avoided place hint: {}", activity.name));
                }
                if activity.rating < LOW_RATING_THRESHOLD {
                    warnings.push(format!(
                        "Low-rated stop: {} ({:.1})",
                        activity.name, activity.rating
                    ));
                }
            }

            let mut transfer_total = 0u32;
            let mut max_leg = 0u32;
            for pair in ordered.windows(2) {
                let leg =
                    DistanceService::transfer_minutes(pair[0].coordinates(), pair[1].coordinates());
                transfer_total += leg;
                max_leg = max_leg.max(leg);
            }

            if day_cost > settings.daily_budget_per_person {
                warnings.push(format!(
                    "Over daily budget by ${:.0}",
                    day_cost - settings.daily_budget_per_person
                ));
            }
            if max_leg > settings.max_transfer_minutes {
                warnings.push(format!(
                    "Longest transfer is {} min (limit {} min)",
                    max_leg, settings.max_transfer_minutes
                ));
            }
            let day_total_limit = settings.max_transfer_minutes * DAY_TOTAL_TRANSFER_MULTIPLE;
            if transfer_total > day_total_limit {
                warnings.push(format!(
                    "Total transfers are {} min (limit {} min)",
                    transfer_total, day_total_limit
                ));
            }
            if ordered.len() < DraftSlotName::ALL.len() {
                warnings.push("Day has open slots.".to_string());
            }

            for warning in &warnings {
                overall_warnings.push(format!("Day {}: {}", day, warning));
            }

            days.push(DraftValidationDay {
                day,
                estimated_cost_per_person: price_label_from_value(day_cost).to_string(),
                estimated_cost_value: round2(day_cost),
                transfer_minutes_total: transfer_total,
                max_leg_minutes: max_leg,
                warnings,
                route_map_url: route_map_url(trip, &ordered),
            });
        }

        let missing: Vec<String> = {
            let mut missing: Vec<String> = must_do_tokens
                .iter()
                .filter(|token| !matched_must_do.contains(*token))
                .cloned()
                .collect();
            missing.sort();
            missing
        };
        if !missing.is_empty() {
            overall_warnings.push(format!(
                "Must-do places not included yet: {}",
                missing.join(", ")
            ));
        }
        if !matched_avoid.is_empty() {
            let mut hits: Vec<String> = matched_avoid.into_iter().collect();
            hits.sort();
            overall_warnings.push(format!(
                "Selections include avoided place hints: {}",
                hits.join(", ")
            ));
        }

        DraftValidationReport {
            trip_id: trip.id.clone(),
            generated_at,
            day_count,
            total_estimated_cost_per_person: round2(total_cost),
            days,
            warnings: dedup_preserving_order(overall_warnings),
        }
    }

    /// A plan with no selections reports zeros and exactly one warning, not
    /// one "open slots" warning per day.
    fn empty_report(trip: &Trip, day_count: u32, generated_at: String) -> DraftValidationReport {
        let days = (1..=day_count)
            .map(|day| DraftValidationDay {
                day,
                estimated_cost_per_person: price_label_from_value(0.0).to_string(),
                estimated_cost_value: 0.0,
                transfer_minutes_total: 0,
                max_leg_minutes: 0,
                warnings: Vec::new(),
                route_map_url: None,
            })
            .collect();

        DraftValidationReport {
            trip_id: trip.id.clone(),
            generated_at,
            day_count,
            total_estimated_cost_per_person: 0.0,
            days,
            warnings: vec!["No activities selected yet.".to_string()],
        }
    }
}

/// Per-person dollar estimate for a selection: the catalog's price text when
/// parseable, else the fixed price-level table.
fn estimated_cost(activity: &Activity) -> f64 {
    activity
        .estimated_price
        .as_deref()
        .and_then(parse_price_text)
        .unwrap_or_else(|| activity.price_level_value())
}

/// Parse a price band like "Free", "Under $20", or "$20 - $50" into a single
/// dollar estimate (mean of the amounts mentioned).
pub fn parse_price_text(text: &str) -> Option<f64> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if lowered.contains("free") {
        return Some(0.0);
    }

    let mut amounts: Vec<f64> = Vec::new();
    let mut current = String::new();
    for ch in lowered.chars() {
        if ch.is_ascii_digit() || (ch == '.' && !current.is_empty()) {
            current.push(ch);
        } else if !current.is_empty() {
            if let Ok(value) = current.parse::<f64>() {
                amounts.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(value) = current.parse::<f64>() {
            amounts.push(value);
        }
    }

    if amounts.is_empty() {
        return None;
    }
    Some(amounts.iter().sum::<f64>() / amounts.len() as f64)
}

fn price_label_from_value(value: f64) -> &'static str {
    if value <= 0.0 {
        "Free"
    } else if value <= 20.0 {
        "Under $20"
    } else if value <= 50.0 {
        "$20 - $50"
    } else if value <= 100.0 {
        "$50 - $100"
    } else {
        "$100+"
    }
}

/// Google Maps driving-directions link from the accommodation through the
/// day's stops.
fn route_map_url(trip: &Trip, ordered: &[&Activity]) -> Option<String> {
    let last = ordered.last()?;
    let mut url = Url::parse("https://www.google.com/maps/dir/").ok()?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("api", "1");
        query.append_pair(
            "origin",
            &format!("{},{}", trip.accommodation_lat, trip.accommodation_lng),
        );
        query.append_pair("destination", &format!("{},{}", last.latitude, last.longitude));
        if ordered.len() > 1 {
            let waypoints: Vec<String> = ordered[..ordered.len() - 1]
                .iter()
                .map(|a| format!("{},{}", a.latitude, a.longitude))
                .collect();
            query.append_pair("waypoints", &waypoints.join("|"));
        }
        query.append_pair("travelmode", "driving");
    }
    Some(url.to_string())
}

fn dedup_preserving_order(warnings: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    warnings
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
