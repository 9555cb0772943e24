//! Orchestrates one generation pass: aggregate the group profile, fetch
//! candidates, score, allocate, and compose the three styled options. The
//! engine itself is stateless; every call works from the trip payload alone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use log::warn;

use crate::errors::{EngineError, EngineResult};
use crate::models::activity::Activity;
use crate::models::draft::{
    DraftPlan, DraftSchedule, DraftSelection, DraftValidationReport, PlanningSettings,
    SlotFeedback,
};
use crate::models::itinerary::ItineraryResult;
use crate::models::trip::{Trip, MAX_TRIP_DAYS};
use crate::services::candidate_scorer::CandidateScorer;
use crate::services::catalog_service::{ActivityCatalog, PlacesCatalog, StaticCatalog};
use crate::services::draft_slot_service::DraftSlotGenerator;
use crate::services::explanation_service::{
    template_activity_explanation, ExplanationContext, ExplanationService,
};
use crate::services::itinerary_composer::{ItineraryComposer, StylePolicy};
use crate::services::plan_validator::PlanValidator;
use crate::services::preference_aggregator::PreferenceAggregator;
use crate::services::slot_allocator::{SlotAllocator, SlotKind};

/// Drafting uses morning, afternoon, and one dinner-anchored evening cell.
const DRAFT_SLOTS: [SlotKind; 3] = [SlotKind::Morning, SlotKind::Afternoon, SlotKind::Dinner];

pub struct ItineraryEngine {
    catalog: Arc<dyn ActivityCatalog>,
    explainer: Option<Arc<dyn ExplanationService>>,
    scorer: CandidateScorer,
}

impl ItineraryEngine {
    pub fn new(
        catalog: Arc<dyn ActivityCatalog>,
        explainer: Option<Arc<dyn ExplanationService>>,
    ) -> Self {
        Self {
            catalog,
            explainer,
            scorer: CandidateScorer::new(),
        }
    }

    /// Wire up from the environment: Google Places when a key is configured,
    /// the static catalog otherwise; explanations likewise optional.
    pub fn from_env() -> Self {
        let catalog: Arc<dyn ActivityCatalog> = match PlacesCatalog::from_env() {
            Some(places) => Arc::new(places),
            None => Arc::new(StaticCatalog),
        };
        let explainer = crate::services::explanation_service::OpenAiExplanationService::from_env()
            .map(|svc| Arc::new(svc) as Arc<dyn ExplanationService>);
        Self::new(catalog, explainer)
    }

    pub async fn generate(
        &self,
        trip: &Trip,
        settings: &PlanningSettings,
    ) -> EngineResult<ItineraryResult> {
        validate_trip_dates(trip)?;
        let profile = PreferenceAggregator::aggregate(&trip.participants)?;
        let activities = self.fetch_with_fallback(trip).await;
        let generated_at = Utc::now().to_rfc3339();

        if activities.is_empty() {
            return Ok(ItineraryResult {
                trip_id: trip.id.clone(),
                generated_at,
                options: Vec::new(),
                reason: Some(format!("No activities available for {}", trip.destination)),
            });
        }

        let day_count = trip.day_count();
        let allocator = SlotAllocator::new(&self.scorer.weights);
        let used = HashSet::new();
        let mut options = Vec::with_capacity(StylePolicy::ALL.len());

        for policy in &StylePolicy::ALL {
            let scored = self.scorer.score_pool(
                &profile,
                &activities,
                settings,
                &used,
                policy.style,
                &trip.destination,
            );
            if scored.is_empty() {
                return Err(EngineError::ConstraintInfeasible(format!(
                    "planning settings exclude all {} candidate activities",
                    activities.len()
                )));
            }
            let pools = allocator.allocate(
                &scored,
                trip.basecamp(),
                day_count,
                settings,
                &SlotKind::ALL,
            );
            let mut option =
                ItineraryComposer::compose(policy, &pools, day_count, &profile, &trip.destination);

            let ctx = ExplanationContext {
                plan_name: policy.name,
                style: policy.style.as_str(),
                destination: &trip.destination,
                profile: &profile,
            };
            if let Some(explainer) = &self.explainer {
                match explainer.explain_plan(&ctx).await {
                    Ok(text) => option.explanation = text,
                    Err(e) => warn!("Explanation fallback for '{}': {}", policy.name, e),
                }
            }

            let selected: Vec<Activity> = option
                .days
                .iter()
                .flat_map(|day| day.selected().cloned())
                .collect();
            let explanations = self.activity_explanations(&selected, &ctx).await;
            for day in &mut option.days {
                let slots = [
                    day.morning_activity.as_mut(),
                    day.afternoon_activity.as_mut(),
                    day.dinner.as_mut(),
                    day.evening_option.as_mut(),
                ];
                for activity in slots.into_iter().flatten() {
                    activity.explanation = explanations.get(&activity.name).cloned();
                }
            }
            options.push(option);
        }

        Ok(ItineraryResult {
            trip_id: trip.id.clone(),
            generated_at,
            options,
            reason: None,
        })
    }

    /// Build the interactive drafting schedule using the group's dominant
    /// pacing style. Prior selections stay available but are de-prioritised
    /// so later slots headline something new.
    pub async fn generate_slot_draft(
        &self,
        trip: &Trip,
        settings: &PlanningSettings,
        feedback: &[SlotFeedback],
        prior_selections: &[DraftSelection],
    ) -> EngineResult<DraftSchedule> {
        validate_trip_dates(trip)?;
        let profile = PreferenceAggregator::aggregate(&trip.participants)?;
        let activities = self.fetch_with_fallback(trip).await;
        let generated_at = Utc::now().to_rfc3339();

        if activities.is_empty() {
            return Ok(DraftSchedule {
                trip_id: trip.id.clone(),
                generated_at,
                slots: Vec::new(),
            });
        }

        let used: HashSet<String> = prior_selections
            .iter()
            .map(|s| s.activity.name.clone())
            .collect();
        let scored = self.scorer.score_pool(
            &profile,
            &activities,
            settings,
            &used,
            profile.schedule_preference,
            &trip.destination,
        );
        if scored.is_empty() {
            return Err(EngineError::ConstraintInfeasible(format!(
                "planning settings exclude all {} candidate activities",
                activities.len()
            )));
        }

        let day_count = trip.day_count();
        let pools = SlotAllocator::new(&self.scorer.weights).allocate(
            &scored,
            trip.basecamp(),
            day_count,
            settings,
            &DRAFT_SLOTS,
        );

        let mut schedule = DraftSlotGenerator::build_schedule(
            &trip.id,
            generated_at,
            &pools,
            day_count,
            feedback,
        );

        // One explanation per unique candidate, shared across the cells that
        // offer the same place.
        let mut seen: HashSet<String> = HashSet::new();
        let unique: Vec<Activity> = schedule
            .slots
            .iter()
            .flat_map(|slot| slot.candidates.iter())
            .filter(|c| seen.insert(c.name.clone()))
            .cloned()
            .collect();
        let policy = StylePolicy::ALL
            .iter()
            .find(|p| p.style == profile.schedule_preference)
            .unwrap_or(&StylePolicy::ALL[1]);
        let ctx = ExplanationContext {
            plan_name: policy.name,
            style: policy.style.as_str(),
            destination: &trip.destination,
            profile: &profile,
        };
        let explanations = self.activity_explanations(&unique, &ctx).await;
        for slot in &mut schedule.slots {
            for candidate in &mut slot.candidates {
                candidate.explanation = explanations.get(&candidate.name).cloned();
            }
        }

        Ok(schedule)
    }

    pub fn validate_plan(&self, trip: &Trip, plan: &DraftPlan) -> EngineResult<DraftValidationReport> {
        validate_trip_dates(trip)?;
        Ok(PlanValidator::validate(trip, plan, Utc::now().to_rfc3339()))
    }

    /// One short explanation per activity name. The external service is
    /// best-effort; on failure or when none is configured every activity
    /// gets the deterministic template.
    async fn activity_explanations(
        &self,
        activities: &[Activity],
        ctx: &ExplanationContext<'_>,
    ) -> HashMap<String, String> {
        if let Some(explainer) = &self.explainer {
            match explainer.explain_activities(activities, ctx).await {
                Ok(map) => return map,
                Err(e) => warn!(
                    "Activity explanation fallback for '{}': {}",
                    ctx.plan_name, e
                ),
            }
        }
        activities
            .iter()
            .map(|a| (a.name.clone(), template_activity_explanation(a, ctx.destination)))
            .collect()
    }

    /// A catalog failure downgrades to the static catalog rather than
    /// failing the request; a partial itinerary beats none.
    async fn fetch_with_fallback(&self, trip: &Trip) -> Vec<crate::models::activity::Activity> {
        match self
            .catalog
            .fetch_activities(
                &trip.destination,
                trip.accommodation_lat,
                trip.accommodation_lng,
            )
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                warn!(
                    "Catalog lookup failed for '{}', using static fallback: {}",
                    trip.destination, e
                );
                StaticCatalog
                    .fetch_activities(
                        &trip.destination,
                        trip.accommodation_lat,
                        trip.accommodation_lng,
                    )
                    .await
                    .unwrap_or_default()
            }
        }
    }
}

fn validate_trip_dates(trip: &Trip) -> EngineResult<()> {
    if trip.end_date < trip.start_date {
        return Err(EngineError::MissingInput(format!(
            "trip end date {} precedes start date {}",
            trip.end_date, trip.start_date
        )));
    }
    let day_count = trip.day_count();
    if day_count > MAX_TRIP_DAYS {
        return Err(EngineError::MissingInput(format!(
            "trip spans {} days, maximum is {}",
            day_count, MAX_TRIP_DAYS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::models::activity::{Activity, Category};
    use crate::models::trip::{InterestVector, Participant, SchedulePreference, WakePreference};

    struct EmptyCatalog;

    #[async_trait]
    impl ActivityCatalog for EmptyCatalog {
        async fn fetch_activities(
            &self,
            _destination: &str,
            _lat: f64,
            _lng: f64,
        ) -> EngineResult<Vec<Activity>> {
            Ok(Vec::new())
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl ActivityCatalog for FailingCatalog {
        async fn fetch_activities(
            &self,
            _destination: &str,
            _lat: f64,
            _lng: f64,
        ) -> EngineResult<Vec<Activity>> {
            Err(EngineError::ExternalService("boom".to_string()))
        }
    }

    fn participant(schedule: SchedulePreference) -> Participant {
        Participant {
            name: "p".to_string(),
            interest_vector: InterestVector::from_array([4.0, 2.0, 3.0, 3.0, 2.0]),
            schedule_preference: schedule,
            wake_preference: WakePreference::Normal,
        }
    }

    fn trip(days: u64) -> Trip {
        let start = NaiveDate::from_ymd_opt(2026, 9, 4).unwrap();
        Trip {
            id: "trip-1".to_string(),
            destination: "new york".to_string(),
            start_date: start,
            end_date: start + chrono::Days::new(days - 1),
            accommodation_address: "Midtown".to_string(),
            accommodation_lat: 40.7424,
            accommodation_lng: -74.0060,
            participants: vec![participant(SchedulePreference::Balanced)],
        }
    }

    fn engine(catalog: Arc<dyn ActivityCatalog>) -> ItineraryEngine {
        ItineraryEngine::new(catalog, None)
    }

    #[actix_rt::test]
    async fn test_generate_produces_three_styled_options() {
        let engine = engine(Arc::new(StaticCatalog));
        let result = engine
            .generate(&trip(3), &PlanningSettings::default())
            .await
            .unwrap();
        assert_eq!(result.options.len(), 3);
        assert!(result.reason.is_none());
        let names: Vec<&str> = result.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Packed Experience", "Balanced Exploration", "Relaxed Trip"]
        );
        for option in &result.options {
            assert_eq!(option.days.len(), 3);
            assert!((0.0..=100.0).contains(&option.group_match_score));
            assert!(!option.explanation.is_empty());
        }
    }

    #[actix_rt::test]
    async fn test_empty_catalog_reports_reason_not_error() {
        let engine = engine(Arc::new(EmptyCatalog));
        let result = engine
            .generate(&trip(2), &PlanningSettings::default())
            .await
            .unwrap();
        assert!(result.options.is_empty());
        assert!(result.reason.is_some());
    }

    #[actix_rt::test]
    async fn test_catalog_failure_falls_back_to_static() {
        let engine = engine(Arc::new(FailingCatalog));
        let result = engine
            .generate(&trip(2), &PlanningSettings::default())
            .await
            .unwrap();
        assert_eq!(result.options.len(), 3);
    }

    #[actix_rt::test]
    async fn test_no_participants_is_insufficient_data() {
        let engine = engine(Arc::new(StaticCatalog));
        let mut trip = trip(2);
        trip.participants.clear();
        let err = engine
            .generate(&trip, &PlanningSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[actix_rt::test]
    async fn test_reversed_dates_rejected() {
        let engine = engine(Arc::new(StaticCatalog));
        let mut trip = trip(2);
        trip.end_date = trip.start_date - chrono::Days::new(1);
        let err = engine
            .generate(&trip, &PlanningSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingInput(_)));
    }

    #[actix_rt::test]
    async fn test_avoid_everything_is_infeasible() {
        let engine = engine(Arc::new(StaticCatalog));
        let settings = PlanningSettings {
            // Every curated new york entry contains one of these fragments.
            avoid_places: vec![
                "market".to_string(),
                "museum".to_string(),
                "park".to_string(),
                "bridge".to_string(),
                "rooftop".to_string(),
                "soho".to_string(),
                "trattoria".to_string(),
                "brasserie".to_string(),
                "bistro".to_string(),
            ],
            ..Default::default()
        };
        let err = engine.generate(&trip(2), &settings).await.unwrap_err();
        assert!(matches!(err, EngineError::ConstraintInfeasible(_)));
    }

    #[actix_rt::test]
    async fn test_draft_skips_evening_nightlife() {
        let engine = engine(Arc::new(StaticCatalog));
        let schedule = engine
            .generate_slot_draft(&trip(2), &PlanningSettings::default(), &[], &[])
            .await
            .unwrap();
        assert!(!schedule.slots.is_empty());
        for slot in &schedule.slots {
            assert!(slot.candidates.len() <= 4);
            if slot.slot == crate::models::draft::DraftSlotName::Evening {
                assert!(slot
                    .candidates
                    .iter()
                    .all(|c| c.category == Category::Food));
            }
        }
    }

    #[actix_rt::test]
    async fn test_selected_activities_carry_template_explanations() {
        let engine = engine(Arc::new(StaticCatalog));
        let result = engine
            .generate(&trip(2), &PlanningSettings::default())
            .await
            .unwrap();
        for option in &result.options {
            for day in &option.days {
                for activity in day.selected() {
                    let explanation = activity.explanation.as_deref().unwrap_or("");
                    assert!(!explanation.is_empty(), "{} unexplained", activity.name);
                    assert!(explanation.contains("new york"));
                    assert!(explanation.contains(activity.category.as_str()));
                }
            }
        }
    }

    #[actix_rt::test]
    async fn test_draft_candidates_carry_template_explanations() {
        let engine = engine(Arc::new(StaticCatalog));
        let schedule = engine
            .generate_slot_draft(&trip(2), &PlanningSettings::default(), &[], &[])
            .await
            .unwrap();
        assert!(!schedule.slots.is_empty());
        for slot in &schedule.slots {
            for candidate in &slot.candidates {
                let explanation = candidate.explanation.as_deref().unwrap_or("");
                assert!(!explanation.is_empty(), "{} unexplained", candidate.name);
                assert!(explanation.contains("new york"));
            }
        }
    }

    #[actix_rt::test]
    async fn test_draft_is_deterministic() {
        let engine = engine(Arc::new(StaticCatalog));
        let first = engine
            .generate_slot_draft(&trip(2), &PlanningSettings::default(), &[], &[])
            .await
            .unwrap();
        let second = engine
            .generate_slot_draft(&trip(2), &PlanningSettings::default(), &[], &[])
            .await
            .unwrap();
        let names = |s: &DraftSchedule| -> Vec<Vec<String>> {
            s.slots
                .iter()
                .map(|slot| slot.candidates.iter().map(|c| c.name.clone()).collect())
                .collect()
        };
        assert_eq!(names(&first), names(&second));
    }
}
