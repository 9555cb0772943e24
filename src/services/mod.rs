pub mod candidate_scorer;
pub mod catalog_service;
pub mod distance_service;
pub mod draft_slot_service;
pub mod explanation_service;
pub mod itinerary_composer;
pub mod itinerary_engine;
pub mod plan_validator;
pub mod preference_aggregator;
pub mod slot_allocator;
