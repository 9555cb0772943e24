use serde::{Deserialize, Serialize};

/// Coarse activity category. Catalog sources with finer place types are
/// mapped onto these six values before entering the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Nightlife,
    Culture,
    Outdoors,
    Relaxation,
    Other,
}

impl Category {
    /// Weight of this category against the five interest dimensions
    /// (food, nightlife, culture, outdoors, relaxation). `Other` spreads a
    /// small uniform weight so uncategorised places never dominate.
    pub fn interest_weights(&self) -> [f64; 5] {
        match self {
            Category::Food => [1.0, 0.0, 0.0, 0.0, 0.0],
            Category::Nightlife => [0.0, 1.0, 0.0, 0.0, 0.0],
            Category::Culture => [0.0, 0.0, 1.0, 0.0, 0.0],
            Category::Outdoors => [0.0, 0.0, 0.0, 1.0, 0.0],
            Category::Relaxation => [0.0, 0.0, 0.0, 0.0, 1.0],
            Category::Other => [0.2, 0.2, 0.2, 0.2, 0.2],
        }
    }

    /// Relaxation places (parks, spas, beaches) are the one class worth
    /// recommending twice on a longer trip.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Category::Relaxation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Nightlife => "nightlife",
            Category::Culture => "culture",
            Category::Outdoors => "outdoors",
            Category::Relaxation => "relaxation",
            Category::Other => "other",
        }
    }
}

/// Whether the catalog reported the price or the engine inferred it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceConfidence {
    Verified,
    Inferred,
}

/// Read-only activity snapshot supplied by the catalog. Optional fields
/// degrade gracefully: a missing `estimated_price` falls back to the
/// price-level table, missing links and images are simply omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub category: Category,
    /// 0-5 catalog rating.
    pub rating: f64,
    /// Ordinal 0 (free) to 4 (premium).
    pub price_level: u8,
    pub latitude: f64,
    pub longitude: f64,
    /// Typical visit duration in minutes.
    pub typical_visit_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_confidence: Option<PriceConfidence>,
}

impl Activity {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn price_level_value(&self) -> f64 {
        price_level_value(self.price_level)
    }
}

/// Fixed price-level to per-person dollar-amount table.
pub fn price_level_value(price_level: u8) -> f64 {
    match price_level.min(4) {
        0 => 0.0,
        1 => 12.0,
        2 => 35.0,
        3 => 75.0,
        _ => 130.0,
    }
}

/// Human-readable price band for a price level.
pub fn price_label(price_level: u8) -> &'static str {
    match price_level.min(4) {
        0 => "Free",
        1 => "Under $20",
        2 => "$20 - $50",
        3 => "$50 - $100",
        _ => "$100+",
    }
}
