use messaging::core::db;
use messaging::{AppState, Config, create_router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().inspect_err(|e| error!("Invalid configuration: {}", e))?;
    config.print_info();

    let pool = db::connect(&config)
        .await
        .inspect_err(|e| error!("Unable to open the database: {}", e))?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = Arc::new(AppState::new(pool, config));

    let app = create_router(state).layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
