pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::services::generate::{FlashcardGenerator, HttpGenerator, UnconfiguredGenerator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub generator: Arc<dyn FlashcardGenerator>,
}

/// Build the API router for the given state.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/flashcards/sets", get(routes::sets::list))
        .route("/api/v1/flashcards/sets", post(routes::sets::create))
        .route("/api/v1/flashcards/sets/{id}", get(routes::sets::get_one))
        .route(
            "/api/v1/flashcards/sets/{id}",
            delete(routes::sets::delete_one),
        )
        .route(
            "/api/v1/flashcards/sets/{id}/randomized",
            get(routes::sets::randomized),
        )
        .route("/api/v1/generate", post(routes::generate::generate))
        .route("/api/v1/auth/session", delete(routes::auth::revoke))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/login/start", post(routes::auth::start_login))
        .route("/api/v1/auth/callback", post(routes::auth::callback))
        .merge(protected_routes)
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://studycards.db?mode=rwc".to_string());

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Applying schema...");
    db.apply_schema().await?;

    let generator: Arc<dyn FlashcardGenerator> = match std::env::var("GENERATOR_URL") {
        Ok(url) => Arc::new(HttpGenerator::new(&url)),
        Err(_) => {
            tracing::warn!("GENERATOR_URL not set, generation endpoint disabled");
            Arc::new(UnconfiguredGenerator)
        }
    };

    let state = AppState {
        db: Arc::new(db),
        generator,
    };

    let app = build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
