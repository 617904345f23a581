// src/main.rs
use std::process::ExitCode;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{error, info};
use wiki_survey::config::Config;
use wiki_survey::store::PgStore;
use wiki_survey::{db, routes, Survey};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok(); // Load environment variables from .env file

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting wiki-survey v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // No storage, no service: refuse to start rather than serve failures.
    let pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to the database: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = db::init_schema(&pool).await {
        error!("Failed to prepare the database schema: {e}");
        return ExitCode::FAILURE;
    }

    let survey = Survey::new(Arc::new(PgStore::new(pool)));
    let routes = routes::create_routes(survey);

    let addr = config.socket_addr();
    info!("Listening on http://{addr}");
    if let Err(e) = axum_server::bind(addr)
        .serve(routes.into_make_service())
        .await
    {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
