//! Partitions scored candidates into per-(day, slot) ranked pools. Each day
//! carries a geographic anchor: day 1 anchors at the trip basecamp, later
//! days at the previous day's last placed candidate, which keeps consecutive
//! days spatially coherent without any external routing call.

use chrono::NaiveTime;

use crate::models::activity::Category;
use crate::models::draft::{DraftSlotName, PlanningSettings};
use crate::services::candidate_scorer::{ScoredActivity, ScoringWeights};
use crate::services::distance_service::DistanceService;

/// Points subtracted from a candidate's score when it sits a full
/// `max_transfer_minutes` away from the day's anchor.
const DISTANCE_PENALTY_POINTS: f64 = 25.0;

/// The four time-of-day slots of a composed day. Windows are disjoint by
/// construction, so two filled slots can never overlap in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Morning,
    Afternoon,
    Dinner,
    Evening,
}

impl SlotKind {
    pub const ALL: [SlotKind; 4] = [
        SlotKind::Morning,
        SlotKind::Afternoon,
        SlotKind::Dinner,
        SlotKind::Evening,
    ];

    /// Implied time window for the slot.
    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        match self {
            SlotKind::Morning => (hm(9, 0), hm(12, 0)),
            SlotKind::Afternoon => (hm(13, 0), hm(17, 0)),
            SlotKind::Dinner => (hm(18, 0), hm(20, 0)),
            SlotKind::Evening => (hm(20, 0), hm(23, 0)),
        }
    }

    pub fn window_minutes(&self) -> u32 {
        let (start, end) = self.window();
        (end - start).num_minutes().max(0) as u32
    }

    /// Category eligibility per slot. Dinner insists on food unless the
    /// whole pool has none; daytime slots exclude nightlife; the evening
    /// slot takes nightlife, a second meal, or something restful.
    pub fn admits(&self, category: Category, pool_has_food: bool) -> bool {
        match self {
            SlotKind::Morning | SlotKind::Afternoon => category != Category::Nightlife,
            SlotKind::Dinner => {
                category == Category::Food || (!pool_has_food && category != Category::Nightlife)
            }
            SlotKind::Evening => matches!(
                category,
                Category::Nightlife | Category::Relaxation | Category::Food
            ),
        }
    }
}

impl From<DraftSlotName> for SlotKind {
    fn from(slot: DraftSlotName) -> Self {
        match slot {
            DraftSlotName::Morning => SlotKind::Morning,
            DraftSlotName::Afternoon => SlotKind::Afternoon,
            // The draft flow's evening slot is the dinner slot.
            DraftSlotName::Evening => SlotKind::Dinner,
        }
    }
}

/// A candidate inside one pool: the profile-fit score stays untouched while
/// `effective_score` folds in the distance penalty for this day's anchor.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub scored: ScoredActivity,
    pub effective_score: f64,
}

/// Ranked candidate pool for one (day, slot) cell. An empty pool means the
/// slot stays open rather than taking a poor fit.
#[derive(Debug, Clone)]
pub struct SlotPool {
    pub day: u32,
    pub slot: SlotKind,
    pub ranked: Vec<RankedCandidate>,
}

pub struct SlotAllocator {
    minimum_slot_score: f64,
}

impl SlotAllocator {
    pub fn new(weights: &ScoringWeights) -> Self {
        Self {
            minimum_slot_score: weights.minimum_slot_score,
        }
    }

    /// Build one ranked pool per (day, slot) cell over `day_count` days.
    /// `slots` selects which cells exist (the composer uses all four, the
    /// draft flow morning/afternoon/dinner).
    pub fn allocate(
        &self,
        scored: &[ScoredActivity],
        basecamp: (f64, f64),
        day_count: u32,
        settings: &PlanningSettings,
        slots: &[SlotKind],
    ) -> Vec<SlotPool> {
        let pool_has_food = scored
            .iter()
            .any(|s| s.activity.category == Category::Food);
        let max_transfer = settings.max_transfer_minutes.max(1) as f64;

        let mut pools = Vec::with_capacity(day_count as usize * slots.len());
        let mut anchor = basecamp;

        for day in 1..=day_count {
            let mut last_top: Option<(f64, f64)> = None;

            for slot in slots {
                let window_minutes = slot.window_minutes();
                let mut ranked: Vec<RankedCandidate> = scored
                    .iter()
                    .filter(|s| slot.admits(s.activity.category, pool_has_food))
                    .filter(|s| s.activity.typical_visit_duration <= window_minutes)
                    .map(|s| {
                        let minutes =
                            DistanceService::transfer_minutes(anchor, s.activity.coordinates());
                        let penalty = (minutes as f64 / max_transfer) * DISTANCE_PENALTY_POINTS;
                        RankedCandidate {
                            scored: s.clone(),
                            effective_score: s.group_fit_score - penalty,
                        }
                    })
                    .filter(|c| c.effective_score >= self.minimum_slot_score)
                    .collect();

                ranked.sort_by(|a, b| {
                    b.effective_score
                        .total_cmp(&a.effective_score)
                        .then(b.scored.activity.rating.total_cmp(&a.scored.activity.rating))
                        .then(a.scored.activity.name.cmp(&b.scored.activity.name))
                });

                if let Some(top) = ranked.first() {
                    last_top = Some(top.scored.activity.coordinates());
                }

                pools.push(SlotPool {
                    day,
                    slot: *slot,
                    ranked,
                });
            }

            // Next day anchors where this day is expected to end.
            if let Some(coords) = last_top {
                anchor = coords;
            }
        }

        pools
    }
}

/// Lookup helper over the allocated grid.
pub fn pool_for(pools: &[SlotPool], day: u32, slot: SlotKind) -> Option<&SlotPool> {
    pools.iter().find(|p| p.day == day && p.slot == slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::Activity;

    fn scored(name: &str, category: Category, score: f64, lat: f64, lng: f64) -> ScoredActivity {
        scored_with_duration(name, category, score, lat, lng, 90)
    }

    fn scored_with_duration(
        name: &str,
        category: Category,
        score: f64,
        lat: f64,
        lng: f64,
        duration: u32,
    ) -> ScoredActivity {
        ScoredActivity {
            activity: Activity {
                name: name.to_string(),
                category,
                rating: 4.5,
                price_level: 1,
                latitude: lat,
                longitude: lng,
                typical_visit_duration: duration,
                explanation: None,
                image_url: None,
                activity_url: None,
                estimated_price: None,
                price_confidence: None,
            },
            group_fit_score: score,
            conflict_summary: None,
        }
    }

    fn allocator() -> SlotAllocator {
        SlotAllocator::new(&ScoringWeights::default())
    }

    const BASE: (f64, f64) = (40.7424, -74.0060);

    #[test]
    fn test_dinner_pool_prefers_food() {
        let pool = vec![
            scored("Museum", Category::Culture, 90.0, 40.743, -74.005),
            scored("Trattoria", Category::Food, 60.0, 40.744, -74.004),
        ];
        let pools = allocator().allocate(
            &pool,
            BASE,
            1,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        let dinner = pool_for(&pools, 1, SlotKind::Dinner).unwrap();
        assert_eq!(dinner.ranked.len(), 1);
        assert_eq!(dinner.ranked[0].scored.activity.name, "Trattoria");
    }

    #[test]
    fn test_dinner_pool_falls_back_without_food() {
        let pool = vec![scored("Garden", Category::Outdoors, 80.0, 40.743, -74.005)];
        let pools = allocator().allocate(
            &pool,
            BASE,
            1,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        let dinner = pool_for(&pools, 1, SlotKind::Dinner).unwrap();
        assert_eq!(dinner.ranked.len(), 1, "non-nightlife fallback fills a foodless pool");
        assert_eq!(dinner.ranked[0].scored.activity.name, "Garden");
    }

    #[test]
    fn test_nightlife_kept_out_of_daytime() {
        let pool = vec![
            scored("Night Club", Category::Nightlife, 95.0, 40.743, -74.005),
            scored("Park Loop", Category::Outdoors, 70.0, 40.744, -74.004),
        ];
        let pools = allocator().allocate(
            &pool,
            BASE,
            1,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        let morning = pool_for(&pools, 1, SlotKind::Morning).unwrap();
        assert!(morning
            .ranked
            .iter()
            .all(|c| c.scored.activity.category != Category::Nightlife));
        let evening = pool_for(&pools, 1, SlotKind::Evening).unwrap();
        assert_eq!(evening.ranked[0].scored.activity.name, "Night Club");
    }

    #[test]
    fn test_low_scores_leave_slot_open() {
        let pool = vec![scored("Meh Stop", Category::Culture, 10.0, 40.743, -74.005)];
        let pools = allocator().allocate(
            &pool,
            BASE,
            1,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        let morning = pool_for(&pools, 1, SlotKind::Morning).unwrap();
        assert!(morning.ranked.is_empty());
    }

    #[test]
    fn test_overlong_visit_excluded_from_short_window() {
        // 150-minute visit cannot fit the 120-minute dinner window but fits
        // the afternoon window.
        let pool = vec![scored_with_duration(
            "Supper Club",
            Category::Food,
            85.0,
            40.743,
            -74.005,
            150,
        )];
        let pools = allocator().allocate(
            &pool,
            BASE,
            1,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        assert!(pool_for(&pools, 1, SlotKind::Dinner).unwrap().ranked.is_empty());
        assert!(!pool_for(&pools, 1, SlotKind::Afternoon).unwrap().ranked.is_empty());
    }

    #[test]
    fn test_distance_penalty_reranks_far_candidates() {
        // Same score: the nearby one must outrank the one ~20 km away.
        let pool = vec![
            scored("Far Museum", Category::Culture, 80.0, 40.92, -74.0060),
            scored("Near Museum", Category::Culture, 80.0, 40.7430, -74.0055),
        ];
        let pools = allocator().allocate(
            &pool,
            BASE,
            1,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        let morning = pool_for(&pools, 1, SlotKind::Morning).unwrap();
        assert_eq!(morning.ranked[0].scored.activity.name, "Near Museum");
    }

    #[test]
    fn test_second_day_anchors_at_previous_end() {
        // Two clusters ~10 km apart; day 2's anchor should move toward
        // wherever day 1 ends, changing penalties between runs only via the
        // anchor (the allocation itself stays deterministic).
        let pool = vec![
            scored("North Diner", Category::Food, 80.0, 40.83, -74.0),
            scored("South Diner", Category::Food, 80.0, 40.7425, -74.006),
        ];
        let pools = allocator().allocate(
            &pool,
            BASE,
            2,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        let first = allocator().allocate(
            &pool,
            BASE,
            2,
            &PlanningSettings::default(),
            &SlotKind::ALL,
        );
        // Deterministic across runs.
        for (a, b) in pools.iter().zip(&first) {
            let names_a: Vec<_> = a.ranked.iter().map(|c| c.scored.activity.name.clone()).collect();
            let names_b: Vec<_> = b.ranked.iter().map(|c| c.scored.activity.name.clone()).collect();
            assert_eq!(names_a, names_b);
        }
    }
}
