use actix_web::{web, HttpResponse};

use crate::errors::EngineError;
use crate::models::requests::{DraftSlotsRequest, ValidateDraftRequest};
use crate::services::itinerary_engine::ItineraryEngine;

/*
    /api/draft/slots
*/
pub async fn slots(
    body: web::Json<DraftSlotsRequest>,
    engine: web::Data<ItineraryEngine>,
) -> Result<HttpResponse, EngineError> {
    let request = body.into_inner();
    let settings = request.planning_settings.unwrap_or_default();
    let schedule = engine
        .generate_slot_draft(
            &request.trip,
            &settings,
            &request.slot_feedback,
            &request.prior_selections,
        )
        .await?;
    Ok(HttpResponse::Ok().json(schedule))
}

/*
    /api/draft/validate
*/
pub async fn validate(
    body: web::Json<ValidateDraftRequest>,
    engine: web::Data<ItineraryEngine>,
) -> Result<HttpResponse, EngineError> {
    let request = body.into_inner();
    let report = engine.validate_plan(&request.trip, &request.draft_plan)?;
    Ok(HttpResponse::Ok().json(report))
}
