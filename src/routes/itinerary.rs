use actix_web::{web, HttpResponse};

use crate::errors::EngineError;
use crate::models::requests::GenerateItineraryRequest;
use crate::services::itinerary_engine::ItineraryEngine;

/*
    /api/itinerary/generate
*/
pub async fn generate(
    body: web::Json<GenerateItineraryRequest>,
    engine: web::Data<ItineraryEngine>,
) -> Result<HttpResponse, EngineError> {
    let request = body.into_inner();
    let settings = request.planning_settings.unwrap_or_default();
    let result = engine.generate(&request.trip, &settings).await?;
    Ok(HttpResponse::Ok().json(result))
}
