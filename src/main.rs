use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use intern_match::config::{LoggingSettings, Settings};
use intern_match::core::{Matcher, Recommender};
use intern_match::errors::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use intern_match::routes::{self, AppState};
use intern_match::services::{JwtManager, PostgresClient};

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());
    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging);

    info!("Starting InternMatch service...");

    if settings.auth.jwt_secret.trim().is_empty() {
        error!("auth.jwt_secret is empty; set JWT_SECRET");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "JWT secret required"));
    }

    let postgres = Arc::new(PostgresClient::from_settings(&settings.database).await.map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?);

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    let weights = settings.scoring_weights();
    let matcher = Matcher::new(weights, settings.scoring.high_demand_skills.clone());

    info!("Matcher initialized with weights: {:?}", weights);

    let recommender = Recommender::new(Arc::clone(&postgres), matcher, settings.matching.fetch_concurrency);

    let app_state = AppState {
        postgres,
        recommender,
        matching: settings.matching.clone(),
    };
    let jwt = web::Data::new(JwtManager::new(&settings.auth.jwt_secret, settings.auth.token_ttl_hours));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(jwt.clone())
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
