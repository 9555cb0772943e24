use serde::{Deserialize, Serialize};

use crate::models::activity::Activity;
use crate::models::trip::SchedulePreference;

/// One calendar day of the trip. Each slot is optional; `None` is an
/// intentionally open slot, not missing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_activity: Option<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon_activity: Option<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinner: Option<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening_option: Option<Activity>,
}

impl DayPlan {
    pub fn selected(&self) -> impl Iterator<Item = &Activity> {
        [
            self.morning_activity.as_ref(),
            self.afternoon_activity.as_ref(),
            self.dinner.as_ref(),
            self.evening_option.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// A full composed itinerary for one pacing style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryOption {
    pub name: String,
    pub style: SchedulePreference,
    /// 0-100 fit against the aggregated group profile.
    pub group_match_score: f64,
    pub explanation: String,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryResult {
    pub trip_id: String,
    pub generated_at: String,
    pub options: Vec<ItineraryOption>,
    /// Set when `options` is empty to distinguish "no data" from an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
