use serde::{Deserialize, Serialize};

use crate::models::draft::{DraftPlan, DraftSelection, PlanningSettings, SlotFeedback};
use crate::models::trip::Trip;

/// The serving layer is stateless: every request carries the full trip
/// snapshot fetched from the Trip Store by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateItineraryRequest {
    pub trip: Trip,
    #[serde(default)]
    pub planning_settings: Option<PlanningSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSlotsRequest {
    pub trip: Trip,
    #[serde(default)]
    pub planning_settings: Option<PlanningSettings>,
    #[serde(default)]
    pub slot_feedback: Vec<SlotFeedback>,
    /// Selections already made in earlier drafting rounds; their activities
    /// are de-prioritised in other slots.
    #[serde(default)]
    pub prior_selections: Vec<DraftSelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateDraftRequest {
    pub trip: Trip,
    pub draft_plan: DraftPlan,
}
