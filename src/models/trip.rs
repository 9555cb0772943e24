use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Interest dimension names, in the order used by every weight vector.
pub const INTEREST_KEYS: [&str; 5] = ["food", "nightlife", "culture", "outdoors", "relaxation"];

pub const MAX_TRIP_DAYS: u32 = 30;

/// Pacing preference. Declaration order doubles as the deterministic
/// tie-break priority when a group vote is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePreference {
    Packed,
    Balanced,
    Chill,
}

impl SchedulePreference {
    pub const ALL: [SchedulePreference; 3] = [
        SchedulePreference::Packed,
        SchedulePreference::Balanced,
        SchedulePreference::Chill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulePreference::Packed => "packed",
            SchedulePreference::Balanced => "balanced",
            SchedulePreference::Chill => "chill",
        }
    }
}

/// Wake-up preference. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakePreference {
    Early,
    Normal,
    Late,
}

impl WakePreference {
    pub const ALL: [WakePreference; 3] = [
        WakePreference::Early,
        WakePreference::Normal,
        WakePreference::Late,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WakePreference::Early => "early",
            WakePreference::Normal => "normal",
            WakePreference::Late => "late",
        }
    }
}

/// Five bounded (0-5) interest dimensions submitted by each participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestVector {
    pub food: f64,
    pub nightlife: f64,
    pub culture: f64,
    pub outdoors: f64,
    pub relaxation: f64,
}

impl InterestVector {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.food,
            self.nightlife,
            self.culture,
            self.outdoors,
            self.relaxation,
        ]
    }

    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            food: values[0],
            nightlife: values[1],
            culture: values[2],
            outdoors: values[3],
            relaxation: values[4],
        }
    }

    /// Name of the strongest dimension; earlier key wins a tie.
    pub fn top_dimension(&self) -> &'static str {
        let values = self.as_array();
        let mut best = 0;
        for idx in 1..values.len() {
            if values[idx] > values[best] {
                best = idx;
            }
        }
        INTEREST_KEYS[best]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub interest_vector: InterestVector,
    pub schedule_preference: SchedulePreference,
    pub wake_preference: WakePreference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub accommodation_address: String,
    pub accommodation_lat: f64,
    pub accommodation_lng: f64,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Trip {
    /// Inclusive day count; a trip starting and ending on the same date is one day.
    pub fn day_count(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days() + 1;
        days.max(1) as u32
    }

    pub fn basecamp(&self) -> (f64, f64) {
        (self.accommodation_lat, self.accommodation_lng)
    }
}

/// Aggregated preferences for the whole group. Derived per generation call,
/// never persisted or cached across participant changes.
#[derive(Debug, Clone, Serialize)]
pub struct GroupProfile {
    pub interests: InterestVector,
    pub schedule_preference: SchedulePreference,
    pub wake_preference: WakePreference,
}
