use std::sync::Arc;

use actix_web::{web, App};
use async_trait::async_trait;
use chrono::NaiveDate;

use grouptrip_api::errors::EngineResult;
use grouptrip_api::models::activity::{Activity, Category};
use grouptrip_api::models::trip::{
    InterestVector, Participant, SchedulePreference, Trip, WakePreference,
};
use grouptrip_api::routes;
use grouptrip_api::services::catalog_service::ActivityCatalog;
use grouptrip_api::services::itinerary_engine::ItineraryEngine;

/// Fixed candidate set clustered around a midtown basecamp, with enough
/// variety to fill every slot kind.
pub struct FixtureCatalog;

#[async_trait]
impl ActivityCatalog for FixtureCatalog {
    async fn fetch_activities(
        &self,
        _destination: &str,
        _lat: f64,
        _lng: f64,
    ) -> EngineResult<Vec<Activity>> {
        Ok(fixture_activities())
    }
}

pub fn fixture_activities() -> Vec<Activity> {
    vec![
        activity("Harbor Food Hall", Category::Food, 4.7, 2, 40.7430, -74.0055, 90),
        activity("Corner Trattoria", Category::Food, 4.5, 2, 40.7440, -74.0040, 95),
        activity("Dockside Brasserie", Category::Food, 4.4, 3, 40.7410, -74.0070, 100),
        activity("City Art Museum", Category::Culture, 4.8, 2, 40.7460, -74.0020, 150),
        activity("Old Town Walk", Category::Culture, 4.6, 0, 40.7400, -74.0080, 90),
        activity("Harbor Park Loop", Category::Outdoors, 4.7, 0, 40.7450, -74.0030, 120),
        activity("Botanic Garden", Category::Outdoors, 4.6, 1, 40.7470, -74.0010, 90),
        activity("Loud Bar", Category::Nightlife, 4.9, 2, 40.7420, -74.0065, 120),
        activity("Quiet Jazz Club", Category::Nightlife, 4.5, 3, 40.7435, -74.0050, 120),
        activity("Riverside Spa", Category::Relaxation, 4.4, 3, 40.7415, -74.0075, 90),
    ]
}

pub fn activity(
    name: &str,
    category: Category,
    rating: f64,
    price_level: u8,
    lat: f64,
    lng: f64,
    duration: u32,
) -> Activity {
    Activity {
        name: name.to_string(),
        category,
        rating,
        price_level,
        latitude: lat,
        longitude: lng,
        typical_visit_duration: duration,
        explanation: None,
        image_url: None,
        activity_url: None,
        estimated_price: None,
        price_confidence: None,
    }
}

pub fn participant(
    name: &str,
    interests: [f64; 5],
    schedule: SchedulePreference,
    wake: WakePreference,
) -> Participant {
    Participant {
        name: name.to_string(),
        interest_vector: InterestVector::from_array(interests),
        schedule_preference: schedule,
        wake_preference: wake,
    }
}

pub fn fixture_trip(days: u64, participants: Vec<Participant>) -> Trip {
    let start = NaiveDate::from_ymd_opt(2026, 9, 4).unwrap();
    Trip {
        id: "trip-fixture".to_string(),
        destination: "harborville".to_string(),
        start_date: start,
        end_date: start + chrono::Days::new(days - 1),
        accommodation_address: "12 Harbor St".to_string(),
        accommodation_lat: 40.7424,
        accommodation_lng: -74.0060,
        participants,
    }
}

pub fn fixture_engine() -> web::Data<ItineraryEngine> {
    web::Data::new(ItineraryEngine::new(Arc::new(FixtureCatalog), None))
}

pub fn create_app(
    engine: web::Data<ItineraryEngine>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(engine)
        .route("/health", web::get().to(routes::health::health_check))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/itinerary")
                        .route("/generate", web::post().to(routes::itinerary::generate)),
                )
                .service(
                    web::scope("/draft")
                        .route("/slots", web::post().to(routes::draft::slots))
                        .route("/validate", web::post().to(routes::draft::validate)),
                ),
        )
}
