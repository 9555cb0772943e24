pub mod activity;
pub mod draft;
pub mod itinerary;
pub mod requests;
pub mod trip;
