use std::collections::{HashMap, HashSet};

use crate::models::draft::{DraftSchedule, DraftSlot, DraftSlotName, SlotFeedback};
use crate::services::slot_allocator::{pool_for, RankedCandidate, SlotKind, SlotPool};

/// Ranked choices offered per drafting cell.
pub const CHOICES_PER_SLOT: usize = 4;

/// Effective-score boost per accumulated vote. Votes re-rank; they never
/// override a veto.
const VOTE_WEIGHT: f64 = 2.0;

/// Produces the interactive drafting schedule: exactly four ranked
/// candidates per (day, slot) cell, fewer only when the pool itself is
/// smaller. Pure function of its inputs, so regenerating with the same
/// profile, settings, and feedback yields the same schedule.
pub struct DraftSlotGenerator;

impl DraftSlotGenerator {
    pub fn build_schedule(
        trip_id: &str,
        generated_at: String,
        pools: &[SlotPool],
        day_count: u32,
        feedback: &[SlotFeedback],
    ) -> DraftSchedule {
        let feedback_by_slot: HashMap<&str, &SlotFeedback> = feedback
            .iter()
            .map(|f| (f.slot_id.as_str(), f))
            .collect();

        let mut slots = Vec::new();
        // Top picks of earlier slots; later cells rank them behind fresh
        // candidates so the same place is not the headline choice twice.
        let mut primary_used: HashSet<String> = HashSet::new();

        for day in 1..=day_count {
            for slot_name in DraftSlotName::ALL {
                let slot_id = format!("day-{}-{}", day, slot_name.as_str());
                let Some(pool) = pool_for(pools, day, SlotKind::from(slot_name)) else {
                    continue;
                };

                let slot_feedback = feedback_by_slot.get(slot_id.as_str()).copied();
                let ranked = Self::rank_candidates(&pool.ranked, slot_feedback, &primary_used);
                if ranked.is_empty() {
                    continue;
                }

                let candidates: Vec<_> = ranked
                    .into_iter()
                    .take(CHOICES_PER_SLOT)
                    .map(|c| c.scored.activity.clone())
                    .collect();
                primary_used.insert(candidates[0].name.clone());

                slots.push(DraftSlot {
                    slot_id,
                    day,
                    slot: slot_name,
                    candidates,
                });
            }
        }

        DraftSchedule {
            trip_id: trip_id.to_string(),
            generated_at,
            slots,
        }
    }

    /// Apply feedback and the primary-used filter to one pool. Candidates
    /// already leading another slot are only pulled back in when fewer than
    /// four fresh ones remain.
    fn rank_candidates<'a>(
        pool: &'a [RankedCandidate],
        feedback: Option<&SlotFeedback>,
        primary_used: &HashSet<String>,
    ) -> Vec<&'a RankedCandidate> {
        let vetoed: Vec<String> = feedback
            .map(|f| {
                f.vetoes
                    .iter()
                    .map(|name| name.trim().to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        // Vote keys are matched the same way vetoes are: trimmed and
        // case-insensitive.
        let mut votes: HashMap<String, u32> = HashMap::new();
        if let Some(f) = feedback {
            for (name, count) in &f.votes {
                *votes.entry(name.trim().to_lowercase()).or_insert(0) += count;
            }
        }

        let boosted_score = |candidate: &RankedCandidate| {
            let count = votes
                .get(&candidate.scored.activity.name.trim().to_lowercase())
                .copied()
                .unwrap_or(0);
            candidate.effective_score + count as f64 * VOTE_WEIGHT
        };

        let is_vetoed = |candidate: &RankedCandidate| {
            vetoed.contains(&candidate.scored.activity.name.trim().to_lowercase())
        };

        let mut fresh: Vec<&RankedCandidate> = pool
            .iter()
            .filter(|c| !is_vetoed(c))
            .filter(|c| !primary_used.contains(&c.scored.activity.name))
            .collect();

        if fresh.len() < CHOICES_PER_SLOT {
            let mut seen: HashSet<&str> = fresh
                .iter()
                .map(|c| c.scored.activity.name.as_str())
                .collect();
            for candidate in pool.iter().filter(|c| !is_vetoed(c)) {
                if seen.insert(candidate.scored.activity.name.as_str()) {
                    fresh.push(candidate);
                }
            }
        }

        fresh.sort_by(|a, b| {
            boosted_score(b)
                .total_cmp(&boosted_score(a))
                .then(b.scored.activity.rating.total_cmp(&a.scored.activity.rating))
                .then(a.scored.activity.name.cmp(&b.scored.activity.name))
        });
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::{Activity, Category};
    use crate::services::candidate_scorer::ScoredActivity;

    fn candidate(name: &str, score: f64) -> RankedCandidate {
        RankedCandidate {
            scored: ScoredActivity {
                activity: Activity {
                    name: name.to_string(),
                    category: Category::Food,
                    rating: 4.5,
                    price_level: 2,
                    latitude: 40.74,
                    longitude: -74.0,
                    typical_visit_duration: 90,
                    explanation: None,
                    image_url: None,
                    activity_url: None,
                    estimated_price: None,
                    price_confidence: None,
                },
                group_fit_score: score,
                conflict_summary: None,
            },
            effective_score: score,
        }
    }

    fn one_day_pools(names_scores: &[(&str, f64)]) -> Vec<SlotPool> {
        let ranked: Vec<RankedCandidate> = names_scores
            .iter()
            .map(|(name, score)| candidate(name, *score))
            .collect();
        vec![
            SlotPool {
                day: 1,
                slot: SlotKind::Morning,
                ranked: ranked.clone(),
            },
            SlotPool {
                day: 1,
                slot: SlotKind::Afternoon,
                ranked: ranked.clone(),
            },
            SlotPool {
                day: 1,
                slot: SlotKind::Dinner,
                ranked,
            },
        ]
    }

    #[test]
    fn test_four_candidates_per_slot() {
        let pools = one_day_pools(&[
            ("A", 90.0),
            ("B", 85.0),
            ("C", 80.0),
            ("D", 75.0),
            ("E", 70.0),
        ]);
        let schedule =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &[]);
        assert_eq!(schedule.slots.len(), 3);
        for slot in &schedule.slots {
            assert_eq!(slot.candidates.len(), CHOICES_PER_SLOT);
        }
    }

    #[test]
    fn test_smaller_pool_yields_fewer_candidates() {
        let pools = one_day_pools(&[("A", 90.0), ("B", 85.0)]);
        let schedule =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &[]);
        assert_eq!(schedule.slots[0].candidates.len(), 2);
    }

    #[test]
    fn test_vetoed_candidates_never_reappear() {
        let pools = one_day_pools(&[("A", 90.0), ("B", 85.0), ("C", 80.0), ("D", 75.0), ("E", 70.0)]);
        let feedback = vec![SlotFeedback {
            slot_id: "day-1-morning".to_string(),
            votes: HashMap::new(),
            vetoes: vec!["A".to_string()],
        }];
        let schedule =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &feedback);
        let morning = &schedule.slots[0];
        assert_eq!(morning.slot_id, "day-1-morning");
        assert!(morning.candidates.iter().all(|c| c.name != "A"));
        assert_eq!(morning.candidates.len(), CHOICES_PER_SLOT);
    }

    #[test]
    fn test_votes_boost_but_never_override_veto() {
        let pools = one_day_pools(&[("A", 90.0), ("B", 85.0), ("C", 80.0), ("D", 75.0)]);
        let mut votes = HashMap::new();
        votes.insert("D".to_string(), 10u32);
        votes.insert("A".to_string(), 50u32);
        let feedback = vec![SlotFeedback {
            slot_id: "day-1-morning".to_string(),
            votes,
            vetoes: vec!["a".to_string()],
        }];
        let schedule =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &feedback);
        let morning = &schedule.slots[0];
        // 10 votes * 2.0 lifts D from 75 past B's 85.
        assert_eq!(morning.candidates[0].name, "D");
        // 50 votes cannot resurrect the vetoed A (veto matching is
        // case-insensitive).
        assert!(morning.candidates.iter().all(|c| c.name != "A"));
    }

    #[test]
    fn test_vote_keys_match_case_insensitively() {
        let pools = one_day_pools(&[("A", 90.0), ("B", 85.0), ("C", 80.0), ("D", 75.0)]);
        let mut votes = HashMap::new();
        votes.insert("  d ".to_string(), 10u32);
        let feedback = vec![SlotFeedback {
            slot_id: "day-1-morning".to_string(),
            votes,
            vetoes: Vec::new(),
        }];
        let schedule =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &feedback);
        // 10 votes * 2.0 lifts D from 75 past A's 90 despite the casing.
        assert_eq!(schedule.slots[0].candidates[0].name, "D");
    }

    #[test]
    fn test_regeneration_is_idempotent() {
        let pools = one_day_pools(&[("A", 90.0), ("B", 85.0), ("C", 80.0), ("D", 75.0), ("E", 70.0)]);
        let mut votes = HashMap::new();
        votes.insert("C".to_string(), 3u32);
        let feedback = vec![SlotFeedback {
            slot_id: "day-1-afternoon".to_string(),
            votes,
            vetoes: vec!["B".to_string()],
        }];
        let first =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &feedback);
        let second =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &feedback);
        let names = |s: &DraftSchedule| -> Vec<Vec<String>> {
            s.slots
                .iter()
                .map(|slot| slot.candidates.iter().map(|c| c.name.clone()).collect())
                .collect()
        };
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_top_pick_deprioritised_in_later_slots() {
        let pools = one_day_pools(&[("A", 90.0), ("B", 85.0), ("C", 80.0), ("D", 75.0), ("E", 70.0)]);
        let schedule =
            DraftSlotGenerator::build_schedule("trip-1", "now".to_string(), &pools, 1, &[]);
        // A headlines the morning; the afternoon's top choice must differ.
        assert_eq!(schedule.slots[0].candidates[0].name, "A");
        assert_ne!(schedule.slots[1].candidates[0].name, "A");
    }
}
