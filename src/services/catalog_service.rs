//! Activity supply. The engine only sees the `ActivityCatalog` trait; behind
//! it sit a curated static catalog (always available, no credentials) and a
//! Google Places nearby-search client with an in-process TTL cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::warn;
use url::Url;

use crate::errors::{EngineError, EngineResult};
use crate::models::activity::{price_label, Activity, Category, PriceConfidence};

#[async_trait]
pub trait ActivityCatalog: Send + Sync {
    async fn fetch_activities(
        &self,
        destination: &str,
        lat: f64,
        lng: f64,
    ) -> EngineResult<Vec<Activity>>;
}

type StaticEntry = (&'static str, Category, f64, u8, f64, f64, u32, &'static str);

const NEW_YORK_LIBRARY: &[StaticEntry] = &[
    ("Chelsea Market", Category::Food, 4.7, 2, 40.7424, -74.0060, 90, "https://images.unsplash.com/photo-1546411516-72879ef7bf8d?w=800&q=80"),
    ("Metropolitan Museum of Art", Category::Culture, 4.8, 3, 40.7794, -73.9632, 150, "https://images.unsplash.com/photo-1545624783-a912bb31c9a0?w=800&q=80"),
    ("Central Park Loop", Category::Outdoors, 4.8, 0, 40.7812, -73.9665, 120, "https://images.unsplash.com/photo-1498144846853-6cc3a433230a?w=800&q=80"),
    ("Brooklyn Bridge Walk", Category::Culture, 4.7, 0, 40.7061, -73.9969, 90, "https://images.unsplash.com/photo-1496442226666-8d4d0e62e6e9?w=800&q=80"),
    ("Williamsburg Rooftop", Category::Nightlife, 4.6, 3, 40.7188, -73.9570, 120, "https://images.unsplash.com/photo-1514362545857-3bc16c4c7d1b?w=800&q=80"),
    ("SoHo Food Crawl", Category::Food, 4.6, 2, 40.7233, -74.0030, 120, "https://images.unsplash.com/photo-1511795409834-ef04bbd61622?w=800&q=80"),
    ("West Village Trattoria", Category::Food, 4.6, 2, 40.7344, -74.0027, 100, "https://images.unsplash.com/photo-1515669097368-22e68427d265?w=800&q=80"),
    ("Union Square Brasserie", Category::Food, 4.5, 3, 40.7369, -73.9903, 95, "https://images.unsplash.com/photo-1466978913421-dad2ebd01d17?w=800&q=80"),
    ("Lower East Side Bistro", Category::Food, 4.5, 2, 40.7175, -73.9859, 100, "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?w=800&q=80"),
    ("Prospect Park Picnic", Category::Relaxation, 4.6, 1, 40.6602, -73.9690, 120, "https://images.unsplash.com/photo-1506501139174-099022df5260?w=800&q=80"),
];

const PARIS_LIBRARY: &[StaticEntry] = &[
    ("Louvre Museum", Category::Culture, 4.8, 3, 48.8606, 2.3376, 180, "https://images.unsplash.com/photo-1499856871958-5b9627545d1a?w=800&q=80"),
    ("Le Marais Food Walk", Category::Food, 4.7, 2, 48.8578, 2.3622, 120, "https://images.unsplash.com/photo-1555396273-367ea4eb4db5?w=800&q=80"),
    ("Saint-Germain Bistro", Category::Food, 4.6, 3, 48.8531, 2.3333, 95, "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=800&q=80"),
    ("Canal Brasserie", Category::Food, 4.5, 2, 48.8721, 2.3631, 90, "https://images.unsplash.com/photo-1528605248644-14dd04022da1?w=800&q=80"),
    ("Rue Cler Dinner Spot", Category::Food, 4.5, 2, 48.8558, 2.3056, 90, "https://images.unsplash.com/photo-1559339352-11d035aa65de?w=800&q=80"),
    ("Seine Sunset Cruise", Category::Relaxation, 4.6, 3, 48.8584, 2.2945, 90, "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?w=800&q=80"),
    ("Montmartre Streets", Category::Culture, 4.6, 1, 48.8867, 2.3431, 120, "https://images.unsplash.com/photo-1522083111812-dbfbc72b226e?w=800&q=80"),
    ("Luxembourg Gardens", Category::Outdoors, 4.7, 0, 48.8462, 2.3371, 90, "https://images.unsplash.com/photo-1581404179352-87db3bb75de5?w=800&q=80"),
    ("Latin Quarter Jazz Bar", Category::Nightlife, 4.5, 2, 48.8493, 2.3470, 120, "https://images.unsplash.com/photo-1543362906-acfc16c67564?w=800&q=80"),
];

const TOKYO_LIBRARY: &[StaticEntry] = &[
    ("Tsukiji Outer Market", Category::Food, 4.7, 2, 35.6655, 139.7708, 120, "https://images.unsplash.com/photo-1528151528657-8ba2baf8ce16?w=800&q=80"),
    ("Ginza Izakaya Dinner", Category::Food, 4.6, 3, 35.6717, 139.7650, 100, "https://images.unsplash.com/photo-1552566626-52f8b828add9?w=800&q=80"),
    ("Shinjuku Yakitori Alley", Category::Food, 4.6, 2, 35.6938, 139.7034, 90, "https://images.unsplash.com/photo-1504674900247-0877df9cc836?w=800&q=80"),
    ("Asakusa Local Dining", Category::Food, 4.5, 2, 35.7134, 139.7966, 95, "https://images.unsplash.com/photo-1541544741938-0af808871cc0?w=800&q=80"),
    ("Meiji Shrine", Category::Culture, 4.7, 1, 35.6764, 139.6993, 90, "https://images.unsplash.com/photo-1531518326284-95438ee2b8af?w=800&q=80"),
    ("Shinjuku Gyoen", Category::Outdoors, 4.7, 1, 35.6852, 139.7100, 120, "https://images.unsplash.com/photo-1558862141-8631bfa2a912?w=800&q=80"),
    ("Shibuya Night Crawl", Category::Nightlife, 4.6, 3, 35.6595, 139.7005, 150, "https://images.unsplash.com/photo-1540959733332-eab4deabeeaf?w=800&q=80"),
    ("Asakusa Temple District", Category::Culture, 4.7, 1, 35.7148, 139.7967, 120, "https://images.unsplash.com/photo-1554797589-7241f4bade8f?w=800&q=80"),
    ("Odaiba Onsen Style Spa", Category::Relaxation, 4.5, 3, 35.6142, 139.7768, 120, "https://images.unsplash.com/photo-1544465544-1b71aee9dfa3?w=800&q=80"),
];

/// Curated city libraries plus a basecamp-relative fallback set, so the
/// engine always has something to plan with.
pub struct StaticCatalog;

impl StaticCatalog {
    fn library_for(destination: &str) -> Option<&'static [StaticEntry]> {
        match destination.trim().to_lowercase().as_str() {
            "new york" => Some(NEW_YORK_LIBRARY),
            "paris" => Some(PARIS_LIBRARY),
            "tokyo" => Some(TOKYO_LIBRARY),
            _ => None,
        }
    }

    /// Generic set offset around the accommodation for destinations with no
    /// curated library.
    fn fallback_set(lat: f64, lng: f64) -> Vec<Activity> {
        let entries: [(&str, Category, f64, u8, f64, f64, u32, &str); 10] = [
            ("Neighborhood Food Hall", Category::Food, 4.4, 2, lat + 0.010, lng + 0.010, 90, "https://images.unsplash.com/photo-1555396273-367ea4eb4db5?w=800&q=80"),
            ("Old Quarter Bistro", Category::Food, 4.4, 2, lat + 0.007, lng + 0.013, 95, "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?w=800&q=80"),
            ("Riverside Dinner House", Category::Food, 4.5, 3, lat - 0.004, lng + 0.016, 100, "https://images.unsplash.com/photo-1504674900247-0877df9cc836?w=800&q=80"),
            ("Local Market Kitchen", Category::Food, 4.5, 2, lat + 0.011, lng - 0.004, 90, "https://images.unsplash.com/photo-1528605248644-14dd04022da1?w=800&q=80"),
            ("City History Museum", Category::Culture, 4.5, 2, lat - 0.012, lng + 0.008, 120, "https://images.unsplash.com/photo-1545624783-a912bb31c9a0?w=800&q=80"),
            ("Riverside Park", Category::Outdoors, 4.6, 0, lat + 0.008, lng - 0.012, 90, "https://images.unsplash.com/photo-1498144846853-6cc3a433230a?w=800&q=80"),
            ("Old Town Walking Route", Category::Culture, 4.5, 1, lat - 0.015, lng - 0.010, 120, "https://images.unsplash.com/photo-1496442226666-8d4d0e62e6e9?w=800&q=80"),
            ("Sunset Lounge", Category::Nightlife, 4.3, 3, lat + 0.005, lng + 0.018, 120, "https://images.unsplash.com/photo-1514362545857-3bc16c4c7d1b?w=800&q=80"),
            ("Urban Wellness Spa", Category::Relaxation, 4.4, 3, lat - 0.009, lng + 0.014, 90, "https://images.unsplash.com/photo-1544465544-1b71aee9dfa3?w=800&q=80"),
            ("Local Bistro", Category::Food, 4.5, 2, lat + 0.002, lng - 0.006, 90, "https://images.unsplash.com/photo-1511795409834-ef04bbd61622?w=800&q=80"),
        ];
        entries.iter().map(build_static_activity).collect()
    }
}

fn build_static_activity(entry: &(&str, Category, f64, u8, f64, f64, u32, &str)) -> Activity {
    let (name, category, rating, price_level, lat, lng, duration, image) = *entry;
    Activity {
        name: name.to_string(),
        category,
        rating,
        price_level,
        latitude: lat,
        longitude: lng,
        typical_visit_duration: duration,
        explanation: None,
        image_url: Some(image.to_string()),
        activity_url: search_link(name),
        estimated_price: Some(price_label(price_level).to_string()),
        price_confidence: Some(PriceConfidence::Inferred),
    }
}

fn search_link(name: &str) -> Option<String> {
    let mut url = Url::parse("https://www.google.com/maps/search/").ok()?;
    url.query_pairs_mut()
        .append_pair("api", "1")
        .append_pair("query", name);
    Some(url.to_string())
}

#[async_trait]
impl ActivityCatalog for StaticCatalog {
    async fn fetch_activities(
        &self,
        destination: &str,
        lat: f64,
        lng: f64,
    ) -> EngineResult<Vec<Activity>> {
        if let Some(library) = Self::library_for(destination) {
            return Ok(library.iter().map(build_static_activity).collect());
        }
        Ok(Self::fallback_set(lat, lng))
    }
}

/// In-process TTL cache for catalog lookups, keyed on destination plus
/// coordinates rounded to three decimals (roughly a city block).
struct CatalogCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Vec<Activity>)>>,
}

impl CatalogCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(destination: &str, lat: f64, lng: f64) -> String {
        format!("{}:{:.3}:{:.3}", destination.trim().to_lowercase(), lat, lng)
    }

    fn get(&self, key: &str) -> Option<Vec<Activity>> {
        let entries = self.entries.lock().ok()?;
        let (stored_at, activities) = entries.get(key)?;
        if stored_at.elapsed() < self.ttl {
            Some(activities.clone())
        } else {
            None
        }
    }

    fn put(&self, key: String, activities: Vec<Activity>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, (Instant::now(), activities));
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacesCatalogConfig {
    pub api_key: String,
    pub radius_meters: u32,
    pub max_results_per_type: usize,
    pub max_total_results: usize,
    pub timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
}

impl PlacesCatalogConfig {
    /// `None` without an API key, in which case the engine plans from the
    /// static catalog alone.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GOOGLE_PLACES_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let parse = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };
        Some(Self {
            api_key,
            radius_meters: parse("GOOGLE_PLACES_RADIUS_METERS", 6000) as u32,
            max_results_per_type: parse("GOOGLE_PLACES_MAX_RESULTS_PER_TYPE", 8) as usize,
            max_total_results: parse("GOOGLE_PLACES_MAX_TOTAL_RESULTS", 40) as usize,
            timeout_seconds: parse("GOOGLE_PLACES_TIMEOUT_SECONDS", 6),
            cache_ttl_seconds: parse("GOOGLE_PLACES_CACHE_TTL_SECONDS", 6 * 60 * 60),
        })
    }
}

const NEARBY_SEARCH_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Google place types queried per destination, with the category and typical
/// visit length each maps to.
const PLACE_TYPES: [(&str, Category, u32); 6] = [
    ("restaurant", Category::Food, 90),
    ("bar", Category::Nightlife, 120),
    ("museum", Category::Culture, 150),
    ("tourist_attraction", Category::Culture, 120),
    ("park", Category::Outdoors, 90),
    ("spa", Category::Relaxation, 90),
];

const FAST_FOOD_KEYWORDS: [&str; 16] = [
    "mcdonald",
    "burger king",
    "kfc",
    "taco bell",
    "wendy's",
    "popeyes",
    "subway",
    "domino",
    "pizza hut",
    "chipotle",
    "five guys",
    "in-n-out",
    "shake shack",
    "dunkin",
    "starbucks",
    "fast food",
];

const DISALLOWED_RESTAURANT_TYPES: [&str; 4] = [
    "meal_takeaway",
    "meal_delivery",
    "convenience_store",
    "gas_station",
];

const FREE_NAME_HINTS: [&str; 10] = [
    "park",
    "beach",
    "trail",
    "hike",
    "lookout",
    "viewpoint",
    "promenade",
    "boardwalk",
    "waterfall",
    "garden",
];

const DEFAULT_PLACE_RATING: f64 = 4.2;

/// Google Places nearby-search catalog. Queries each place type around the
/// accommodation, filters fast food out of restaurant results, and caches the
/// merged result per destination.
pub struct PlacesCatalog {
    config: PlacesCatalogConfig,
    http: reqwest::Client,
    cache: CatalogCache,
}

impl PlacesCatalog {
    pub fn new(config: PlacesCatalogConfig) -> Self {
        let cache = CatalogCache::new(Duration::from_secs(config.cache_ttl_seconds));
        Self {
            config,
            http: reqwest::Client::new(),
            cache,
        }
    }

    pub fn from_env() -> Option<Self> {
        PlacesCatalogConfig::from_env().map(Self::new)
    }

    async fn nearby_search(
        &self,
        lat: f64,
        lng: f64,
        place_type: &str,
    ) -> EngineResult<Vec<serde_json::Value>> {
        let response = self
            .http
            .get(NEARBY_SEARCH_ENDPOINT)
            .query(&[
                ("location", format!("{},{}", lat, lng)),
                ("radius", self.config.radius_meters.to_string()),
                ("type", place_type.to_string()),
                ("key", self.config.api_key.clone()),
            ])
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| {
                EngineError::ExternalService(format!(
                    "places request failed for type '{}': {}",
                    place_type, e
                ))
            })?;

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            EngineError::ExternalService(format!(
                "places response invalid for type '{}': {}",
                place_type, e
            ))
        })?;

        let status = payload["status"].as_str().unwrap_or("");
        if status != "OK" && status != "ZERO_RESULTS" {
            return Err(EngineError::ExternalService(format!(
                "places returned status '{}' for type '{}'",
                status, place_type
            )));
        }

        Ok(payload["results"].as_array().cloned().unwrap_or_default())
    }

    fn parse_place(
        &self,
        place: &serde_json::Value,
        category: Category,
        google_type: &str,
        duration: u32,
    ) -> Option<(String, Activity)> {
        let place_id = place["place_id"].as_str()?;
        let name = place["name"].as_str()?;
        let lat = place["geometry"]["location"]["lat"].as_f64()?;
        let lng = place["geometry"]["location"]["lng"].as_f64()?;

        let place_types: Vec<String> = place["types"]
            .as_array()
            .map(|types| {
                types
                    .iter()
                    .filter_map(|t| t.as_str())
                    .map(|t| t.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();
        if google_type == "restaurant" && is_fast_food(name, &place_types) {
            return None;
        }

        let rating = place["rating"].as_f64().unwrap_or(DEFAULT_PLACE_RATING);
        let raw_price = place["price_level"].as_u64();
        let price_level = raw_price
            .map(|p| p.min(4) as u8)
            .unwrap_or_else(|| infer_price_level(category, name));
        let price_confidence = if raw_price.is_some() {
            PriceConfidence::Verified
        } else {
            PriceConfidence::Inferred
        };

        let activity_url = format!(
            "https://www.google.com/maps/search/?api=1&query={},{}&query_place_id={}",
            lat, lng, place_id
        );
        let image_url = place["photos"][0]["photo_reference"].as_str().map(|photo| {
            format!(
                "https://maps.googleapis.com/maps/api/place/photo?maxwidth=800&photo_reference={}&key={}",
                photo, self.config.api_key
            )
        });

        Some((
            place_id.to_string(),
            Activity {
                name: name.to_string(),
                category,
                rating,
                price_level,
                latitude: lat,
                longitude: lng,
                typical_visit_duration: duration,
                explanation: None,
                image_url,
                activity_url: Some(activity_url),
                estimated_price: Some(price_label(price_level).to_string()),
                price_confidence: Some(price_confidence),
            },
        ))
    }
}

fn is_fast_food(name: &str, place_types: &[String]) -> bool {
    let lowered = name.trim().to_lowercase();
    if FAST_FOOD_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return true;
    }
    place_types
        .iter()
        .any(|t| DISALLOWED_RESTAURANT_TYPES.contains(&t.as_str()))
}

/// Price guess for places Google reports no price level for.
fn infer_price_level(category: Category, name: &str) -> u8 {
    let lowered = name.trim().to_lowercase();
    match category {
        Category::Outdoors => 0,
        _ if FREE_NAME_HINTS.iter().any(|hint| lowered.contains(hint)) => 0,
        Category::Culture => 1,
        Category::Food => 2,
        Category::Nightlife | Category::Relaxation => 3,
        Category::Other => 1,
    }
}

#[async_trait]
impl ActivityCatalog for PlacesCatalog {
    async fn fetch_activities(
        &self,
        destination: &str,
        lat: f64,
        lng: f64,
    ) -> EngineResult<Vec<Activity>> {
        let cache_key = CatalogCache::key(destination, lat, lng);
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let mut by_place_id: HashMap<String, Activity> = HashMap::new();
        for (google_type, category, duration) in PLACE_TYPES {
            let results = match self.nearby_search(lat, lng, google_type).await {
                Ok(results) => results,
                Err(e) => {
                    warn!("Skipping place type '{}': {}", google_type, e);
                    continue;
                }
            };
            for place in results.iter().take(self.config.max_results_per_type) {
                let Some((place_id, activity)) =
                    self.parse_place(place, category, google_type, duration)
                else {
                    continue;
                };
                let keep = by_place_id
                    .get(&place_id)
                    .map_or(true, |existing| activity.rating > existing.rating);
                if keep {
                    by_place_id.insert(place_id, activity);
                }
            }
        }

        if by_place_id.is_empty() {
            return Err(EngineError::ExternalService(
                "places search returned no usable activities".to_string(),
            ));
        }

        let mut activities: Vec<Activity> = by_place_id.into_values().collect();
        activities.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then(a.name.cmp(&b.name))
        });
        activities.truncate(self.config.max_total_results);

        self.cache.put(cache_key, activities.clone());
        Ok(activities)
    }
}
