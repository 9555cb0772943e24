use std::collections::HashSet;

use crate::models::itinerary::{DayPlan, ItineraryOption};
use crate::models::trip::{GroupProfile, SchedulePreference};
use crate::services::slot_allocator::{pool_for, SlotKind, SlotPool};

/// Density policy for one pacing style. The three styles share one
/// composition algorithm; only the policy differs.
#[derive(Debug, Clone, Copy)]
pub struct StylePolicy {
    pub style: SchedulePreference,
    pub name: &'static str,
}

impl StylePolicy {
    pub const ALL: [StylePolicy; 3] = [
        StylePolicy {
            style: SchedulePreference::Packed,
            name: "Packed Experience",
        },
        StylePolicy {
            style: SchedulePreference::Balanced,
            name: "Balanced Exploration",
        },
        StylePolicy {
            style: SchedulePreference::Chill,
            name: "Relaxed Trip",
        },
    ];

    /// Whether this style wants the given slot filled on the given day.
    /// Packed fills everything; balanced rests on alternating evenings;
    /// chill keeps afternoons and evenings open.
    pub fn fills(&self, day: u32, slot: SlotKind) -> bool {
        match self.style {
            SchedulePreference::Packed => true,
            SchedulePreference::Balanced => !(slot == SlotKind::Evening && day % 2 == 0),
            SchedulePreference::Chill => matches!(slot, SlotKind::Morning | SlotKind::Dinner),
        }
    }
}

/// When nothing could be placed at all, the option still reports a neutral
/// midpoint rather than a misleading zero.
const EMPTY_OPTION_SCORE: f64 = 50.0;

pub struct ItineraryComposer;

impl ItineraryComposer {
    /// Compose one full itinerary option from the allocated pools by taking,
    /// per cell the policy wants filled, the best still-unused candidate.
    pub fn compose(
        policy: &StylePolicy,
        pools: &[SlotPool],
        day_count: u32,
        profile: &GroupProfile,
        destination: &str,
    ) -> ItineraryOption {
        let mut used: HashSet<String> = HashSet::new();
        let mut days = Vec::with_capacity(day_count as usize);
        let mut selected_scores: Vec<f64> = Vec::new();

        for day in 1..=day_count {
            let mut plan = DayPlan {
                day,
                ..Default::default()
            };

            for slot in SlotKind::ALL {
                if !policy.fills(day, slot) {
                    continue;
                }
                let Some(pool) = pool_for(pools, day, slot) else {
                    continue;
                };
                let pick = pool.ranked.iter().find(|c| {
                    !used.contains(&c.scored.activity.name)
                        || c.scored.activity.category.is_repeatable()
                });
                if let Some(candidate) = pick {
                    used.insert(candidate.scored.activity.name.clone());
                    selected_scores.push(candidate.scored.group_fit_score);
                    let activity = candidate.scored.activity.clone();
                    match slot {
                        SlotKind::Morning => plan.morning_activity = Some(activity),
                        SlotKind::Afternoon => plan.afternoon_activity = Some(activity),
                        SlotKind::Dinner => plan.dinner = Some(activity),
                        SlotKind::Evening => plan.evening_option = Some(activity),
                    }
                }
            }

            days.push(plan);
        }

        let group_match_score = if selected_scores.is_empty() {
            EMPTY_OPTION_SCORE
        } else {
            let mean: f64 = selected_scores.iter().sum::<f64>() / selected_scores.len() as f64;
            (mean * 10.0).round() / 10.0
        }
        .clamp(0.0, 100.0);

        ItineraryOption {
            name: policy.name.to_string(),
            style: policy.style,
            group_match_score,
            explanation: deterministic_explanation(policy.name, profile, destination),
            days,
        }
    }
}

/// Template explanation used whenever no external explanation service is
/// configured, or when it fails.
pub fn deterministic_explanation(
    plan_name: &str,
    profile: &GroupProfile,
    destination: &str,
) -> String {
    format!(
        "{} prioritizes {} while fitting a {} pace and {}-start days. \
         Activities are grouped near your stay in {} to reduce cross-city \
         travel and keep days cohesive.",
        plan_name,
        profile.interests.top_dimension(),
        profile.schedule_preference.as_str(),
        profile.wake_preference.as_str(),
        destination
    )
}
