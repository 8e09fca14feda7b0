//! Paygate server binary.
//!
//! Loads configuration, wires adapters to ports, and serves the API.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paygate::adapters::http::{api_router, AppState};
use paygate::adapters::postgres::{PgPartnerDirectory, PgPaymentRepository};
use paygate::adapters::provider::build_provider;
use paygate::adapters::webhook::ReqwestWebhookTransport;
use paygate::application::handlers::webhooks::WebhookDispatcher;
use paygate::config::AppConfig;
use paygate::domain::webhook::SignatureCodec;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .json()
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let repository = Arc::new(PgPaymentRepository::new(pool.clone()));
    let directory = Arc::new(PgPartnerDirectory::new(
        pool,
        config.webhook.suspension_threshold,
    ));
    let provider = build_provider(&config.provider, &config.webhook);
    let transport = Arc::new(ReqwestWebhookTransport::new());
    let codec = SignatureCodec::new(config.webhook.replay_window_secs);
    let dispatcher = Arc::new(WebhookDispatcher::new(
        directory.clone(),
        transport.clone(),
        codec.clone(),
        config.webhook.clone(),
    ));

    let state = AppState {
        repository,
        provider,
        directory,
        dispatcher,
        transport,
        codec,
        webhook_config: config.webhook.clone(),
    };

    let app = api_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(std::time::Duration::from_secs(
                config.server.request_timeout_secs,
            ))),
    );

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "Starting paygate");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
