use crate::errors::{EngineError, EngineResult};
use crate::models::trip::{
    GroupProfile, InterestVector, Participant, SchedulePreference, WakePreference,
};

/// Combines per-participant interest vectors and pacing/wake preferences
/// into a single group profile. Pure: the same participant set always yields
/// the same profile regardless of ordering, and nothing is mutated.
pub struct PreferenceAggregator;

impl PreferenceAggregator {
    pub fn aggregate(participants: &[Participant]) -> EngineResult<GroupProfile> {
        if participants.is_empty() {
            return Err(EngineError::InsufficientData(
                "at least one participant is required to build a group profile".to_string(),
            ));
        }

        let mut sums = [0.0f64; 5];
        for participant in participants {
            let values = participant.interest_vector.as_array();
            for (sum, value) in sums.iter_mut().zip(values) {
                *sum += value;
            }
        }
        let count = participants.len() as f64;
        for sum in sums.iter_mut() {
            *sum /= count;
        }

        Ok(GroupProfile {
            interests: InterestVector::from_array(sums),
            schedule_preference: Self::dominant_schedule(participants),
            wake_preference: Self::dominant_wake(participants),
        })
    }

    /// Majority vote; ties resolve to the earlier variant in declaration
    /// order (packed > balanced > chill).
    fn dominant_schedule(participants: &[Participant]) -> SchedulePreference {
        let mut counts = [0usize; 3];
        for participant in participants {
            let idx = SchedulePreference::ALL
                .iter()
                .position(|p| *p == participant.schedule_preference)
                .unwrap_or(0);
            counts[idx] += 1;
        }
        Self::argmax(&counts, &SchedulePreference::ALL)
    }

    /// Majority vote; ties resolve early > normal > late.
    fn dominant_wake(participants: &[Participant]) -> WakePreference {
        let mut counts = [0usize; 3];
        for participant in participants {
            let idx = WakePreference::ALL
                .iter()
                .position(|p| *p == participant.wake_preference)
                .unwrap_or(0);
            counts[idx] += 1;
        }
        Self::argmax(&counts, &WakePreference::ALL)
    }

    fn argmax<T: Copy>(counts: &[usize; 3], variants: &[T; 3]) -> T {
        let mut best = 0;
        for idx in 1..counts.len() {
            if counts[idx] > counts[best] {
                best = idx;
            }
        }
        variants[best]
    }
}
