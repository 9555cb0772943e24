use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::activity::{Activity, Category};
use crate::models::draft::PlanningSettings;
use crate::models::trip::{GroupProfile, SchedulePreference};

/// Tunable weights blending similarity, rating, and price pressure into one
/// 0-100 group-fit score. Defaults favor the group's interests over raw
/// catalog rating; the price penalty only bites once an activity's expected
/// cost exceeds its share (one third) of the daily budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the cosine similarity between activity category and group interests.
    pub similarity_weight: f64,
    /// Weight of the normalized catalog rating.
    pub rating_weight: f64,
    /// Weight of the over-budget price penalty (subtracted).
    pub price_penalty_weight: f64,
    /// Floor applied to activities on the must-do list.
    pub must_do_floor: f64,
    /// Multiplier applied to non-repeatable activities already placed elsewhere.
    pub duplicate_multiplier: f64,
    /// Candidates scoring below this after distance adjustment leave a slot open.
    pub minimum_slot_score: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            similarity_weight: 0.5,
            rating_weight: 0.3,
            price_penalty_weight: 0.2,
            must_do_floor: 95.0,
            duplicate_multiplier: 0.05,
            minimum_slot_score: 20.0,
        }
    }
}

impl ScoringWeights {
    /// Read weights from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            similarity_weight: std::env::var("SCORE_SIMILARITY_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.similarity_weight),
            rating_weight: std::env::var("SCORE_RATING_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rating_weight),
            price_penalty_weight: std::env::var("SCORE_PRICE_PENALTY_WEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.price_penalty_weight),
            must_do_floor: std::env::var("SCORE_MUST_DO_FLOOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.must_do_floor),
            duplicate_multiplier: std::env::var("SCORE_DUPLICATE_MULTIPLIER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.duplicate_multiplier),
            minimum_slot_score: std::env::var("SCORE_MINIMUM_SLOT_SCORE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.minimum_slot_score),
        }
    }
}

/// An activity annotated with its fit against the group profile.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredActivity {
    pub activity: Activity,
    /// 0-100.
    pub group_fit_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_summary: Option<String>,
}

pub struct CandidateScorer {
    pub weights: ScoringWeights,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateScorer {
    pub fn new() -> Self {
        Self {
            weights: ScoringWeights::from_env(),
        }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score a candidate pool against the group profile and constraints.
    ///
    /// Avoid-list matches are removed entirely (hard filter). Must-do
    /// matches are floored at `must_do_floor` so they surface at least once.
    /// `used` holds names of activities already placed elsewhere in the
    /// itinerary being built; non-repeatable duplicates collapse to a
    /// near-zero score instead of disappearing, so a caller can still show
    /// why they rank last. Output ordering is deterministic: score desc,
    /// then rating desc, then name asc.
    pub fn score_pool(
        &self,
        profile: &GroupProfile,
        activities: &[Activity],
        settings: &PlanningSettings,
        used: &HashSet<String>,
        style: SchedulePreference,
        destination: &str,
    ) -> Vec<ScoredActivity> {
        let avoid_tokens = normalized_tokens(&settings.avoid_places);
        let must_do_tokens = normalized_tokens(&settings.must_do_places);
        let slot_budget_share = (settings.daily_budget_per_person / 3.0).max(0.0);
        let destination_key = destination.trim().to_lowercase();

        let mut scored: Vec<ScoredActivity> = activities
            .iter()
            .filter(|activity| !matches_tokens(&activity.name, &avoid_tokens))
            .map(|activity| {
                self.score_one(
                    profile,
                    activity,
                    slot_budget_share,
                    &must_do_tokens,
                    used,
                    style,
                    &destination_key,
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.group_fit_score
                .total_cmp(&a.group_fit_score)
                .then(b.activity.rating.total_cmp(&a.activity.rating))
                .then(a.activity.name.cmp(&b.activity.name))
        });
        scored
    }

    fn score_one(
        &self,
        profile: &GroupProfile,
        activity: &Activity,
        slot_budget_share: f64,
        must_do_tokens: &[String],
        used: &HashSet<String>,
        style: SchedulePreference,
        destination_key: &str,
    ) -> ScoredActivity {
        let similarity = cosine_similarity(
            &profile.interests.as_array(),
            &activity.category.interest_weights(),
        );
        let rating_component = (activity.rating / 5.0).clamp(0.0, 1.0);
        let price_penalty = price_pressure(activity.price_level_value(), slot_budget_share);

        let blended = self.weights.similarity_weight * similarity
            + self.weights.rating_weight * rating_component
            - self.weights.price_penalty_weight * price_penalty;
        let mut score = (100.0
            * blended
            * style_category_bias(style, activity.category)
            * destination_category_bias(destination_key, activity.category))
        .clamp(0.0, 100.0);

        let mut conflict = None;
        if price_penalty > 0.0 {
            conflict = Some(format!(
                "{} may stretch the ${:.0}/day budget",
                activity.name,
                slot_budget_share * 3.0
            ));
        }

        if matches_tokens(&activity.name, must_do_tokens) {
            score = score.max(self.weights.must_do_floor);
            conflict = None;
        } else if used.contains(&activity.name) && !activity.category.is_repeatable() {
            score *= self.weights.duplicate_multiplier;
            conflict = Some(format!("{} is already planned elsewhere", activity.name));
        }

        ScoredActivity {
            activity: activity.clone(),
            group_fit_score: score,
            conflict_summary: conflict,
        }
    }
}

const TROPICAL_DESTINATION_KEYWORDS: [&str; 11] = [
    "hawaii", "maui", "oahu", "kauai", "honolulu", "island", "beach", "bali", "maldives",
    "phuket", "cancun",
];

const NATURE_DESTINATION_KEYWORDS: [&str; 7] = [
    "national park",
    "mountain",
    "alps",
    "yosemite",
    "banff",
    "patagonia",
    "iceland",
];

const CITY_DESTINATION_KEYWORDS: [&str; 8] = [
    "new york",
    "paris",
    "tokyo",
    "london",
    "rome",
    "barcelona",
    "berlin",
    "chicago",
];

/// Destination-type bias per category, from keyword heuristics over the
/// destination name: tropical trips favor recovery and the outdoors, nature
/// trips the outdoors, big cities culture and food. Unrecognized
/// destinations stay neutral. Clamped to 0.75-1.4.
pub fn destination_category_bias(destination_key: &str, category: Category) -> f64 {
    let matches = |keywords: &[&str]| keywords.iter().any(|k| destination_key.contains(k));
    let mut bias: f64 = 1.0;

    if matches(&TROPICAL_DESTINATION_KEYWORDS) {
        match category {
            Category::Relaxation => bias = bias.max(1.25),
            Category::Outdoors => bias = bias.max(1.22),
            Category::Culture => bias = bias.min(0.9),
            _ => {}
        }
    }
    if matches(&NATURE_DESTINATION_KEYWORDS) {
        match category {
            Category::Outdoors => bias = bias.max(1.28),
            Category::Relaxation => bias = bias.max(1.12),
            Category::Culture => bias = bias.max(1.1),
            Category::Nightlife => bias = bias.min(0.9),
            _ => {}
        }
    }
    if matches(&CITY_DESTINATION_KEYWORDS) {
        match category {
            Category::Culture => bias = bias.max(1.16),
            Category::Food => bias = bias.max(1.06),
            _ => {}
        }
    }

    bias.clamp(0.75, 1.4)
}

/// Pacing-style bias per category, carried over from production tuning:
/// packed days lean into sights and nightlife, chill days into recovery.
pub fn style_category_bias(style: SchedulePreference, category: Category) -> f64 {
    match style {
        SchedulePreference::Packed => match category {
            Category::Culture | Category::Nightlife => 1.12,
            Category::Relaxation => 0.93,
            _ => 1.0,
        },
        SchedulePreference::Chill => match category {
            Category::Relaxation | Category::Outdoors => 1.15,
            Category::Nightlife => 0.85,
            _ => 1.0,
        },
        SchedulePreference::Balanced => 1.0,
    }
}

fn cosine_similarity(a: &[f64; 5], b: &[f64; 5]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// 0 when the expected cost fits the slot's budget share, growing linearly
/// to 1 as it reaches double the share.
fn price_pressure(price_value: f64, slot_budget_share: f64) -> f64 {
    if slot_budget_share <= 0.0 {
        return if price_value > 0.0 { 1.0 } else { 0.0 };
    }
    ((price_value - slot_budget_share) / slot_budget_share).clamp(0.0, 1.0)
}

/// Lowercased, trimmed, non-empty entries of a place-name list.
pub fn normalized_tokens(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Case-insensitive substring match of any token against a place name.
pub fn matches_tokens(name: &str, tokens: &[String]) -> bool {
    let normalized = name.trim().to_lowercase();
    tokens.iter().any(|token| normalized.contains(token))
}
