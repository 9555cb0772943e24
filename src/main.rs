use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use grouptrip_api::routes;
use grouptrip_api::services::itinerary_engine::ItineraryEngine;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

fn build_cors() -> Cors {
    let origins = std::env::var("CORS_ALLOW_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let mut cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        cors = cors.allowed_origin(origin);
    }
    cors
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let engine = web::Data::new(ItineraryEngine::from_env());
    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(build_cors())
            .app_data(engine.clone())
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
    })
    .bind((host, port))?
    .run()
    .await
}
