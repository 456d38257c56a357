mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use messagely_api::auth::AppStateInner;
use messagely_db::Database;

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str =
    "messagely_server=debug,messagely_api=debug,messagely_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == "dev-secret-change-me" {
        warn!("MESSAGELY_JWT_SECRET not set, using the development secret");
    }

    // Init database
    let db = Database::open(&config.db_path)?;

    let state = AppStateInner::new(db, &config.jwt_secret, config.hash_cost)?;

    let app = messagely_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Messagely server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
