use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::activity::Activity;

/// Time-of-day name for the interactive draft flow. The evening slot is the
/// dinner slot of a composed day plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftSlotName {
    Morning,
    Afternoon,
    Evening,
}

impl DraftSlotName {
    pub const ALL: [DraftSlotName; 3] = [
        DraftSlotName::Morning,
        DraftSlotName::Afternoon,
        DraftSlotName::Evening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftSlotName::Morning => "morning",
            DraftSlotName::Afternoon => "afternoon",
            DraftSlotName::Evening => "evening",
        }
    }
}

/// One drafting cell with up to four ranked candidate choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSlot {
    pub slot_id: String,
    pub day: u32,
    pub slot: DraftSlotName,
    pub candidates: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSchedule {
    pub trip_id: String,
    pub generated_at: String,
    pub slots: Vec<DraftSlot>,
}

/// A participant-agreed pick for one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSelection {
    pub slot_id: String,
    pub day: u32,
    pub slot: DraftSlotName,
    pub activity: Activity,
}

/// Accumulated group feedback for one slot. Vetoes always win: a vote can
/// re-rank a candidate but never resurrect a vetoed one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotFeedback {
    pub slot_id: String,
    /// Vote count per activity name.
    #[serde(default)]
    pub votes: HashMap<String, u32>,
    /// Activity names excluded from future regenerations of this slot.
    #[serde(default)]
    pub vetoes: Vec<String>,
}

/// Hard and soft constraints supplied by the trip owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningSettings {
    pub daily_budget_per_person: f64,
    pub max_transfer_minutes: u32,
    pub dietary_notes: String,
    pub mobility_notes: String,
    pub must_do_places: Vec<String>,
    pub avoid_places: Vec<String>,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            daily_budget_per_person: 75.0,
            max_transfer_minutes: 30,
            dietary_notes: String::new(),
            mobility_notes: String::new(),
            must_do_places: Vec::new(),
            avoid_places: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPlanMetadata {
    pub planning_settings: PlanningSettings,
    #[serde(default)]
    pub slot_feedback: Vec<SlotFeedback>,
    /// Fraction of the trip's slots that carry a selection, 0.0-1.0.
    #[serde(default)]
    pub selection_coverage_ratio: f64,
}

/// The persisted draft: one chosen activity per slot, plus the settings and
/// feedback snapshot taken at save time. Owned by the Trip Store; the engine
/// only computes and validates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPlan {
    pub trip_id: String,
    pub saved_at: String,
    pub selections: Vec<DraftSelection>,
    pub metadata: DraftPlanMetadata,
}

impl DraftPlan {
    /// Assemble the plan echoed back after a save, with the coverage ratio
    /// computed from the selections rather than trusted from the caller.
    pub fn assemble(
        trip_id: String,
        saved_at: String,
        selections: Vec<DraftSelection>,
        planning_settings: PlanningSettings,
        slot_feedback: Vec<SlotFeedback>,
        day_count: u32,
    ) -> Self {
        let selection_coverage_ratio = selection_coverage_ratio(selections.len(), day_count);
        Self {
            trip_id,
            saved_at,
            selections,
            metadata: DraftPlanMetadata {
                planning_settings,
                slot_feedback,
                selection_coverage_ratio,
            },
        }
    }
}

/// Fraction of the trip's drafting cells (three per day) that carry a
/// selection, capped at 1.0.
pub fn selection_coverage_ratio(selection_count: usize, day_count: u32) -> f64 {
    let total_cells = (day_count as usize * DraftSlotName::ALL.len()).max(1);
    (selection_count as f64 / total_cells as f64).min(1.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftValidationDay {
    pub day: u32,
    /// Price band label for the day's estimated cost.
    pub estimated_cost_per_person: String,
    pub estimated_cost_value: f64,
    pub transfer_minutes_total: u32,
    pub max_leg_minutes: u32,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map_url: Option<String>,
}

/// Derived report over a saved draft plan. Recomputed on demand, never the
/// source of truth for the plan itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftValidationReport {
    pub trip_id: String,
    pub generated_at: String,
    pub day_count: u32,
    pub total_estimated_cost_per_person: f64,
    pub days: Vec<DraftValidationDay>,
    pub warnings: Vec<String>,
}
