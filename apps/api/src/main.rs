mod alerts;
mod config;
mod db;
mod errors;
mod jobs;
mod mailer;
mod models;
mod routes;
mod state;
mod subscribers;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::corpus::PgJobCorpus;
use crate::mailer::BrevoMailer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::subscribers::store::PgSubscriberStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter_directive(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job-alerts API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config).await?;

    // Initialize the Brevo mailer
    let mailer = Arc::new(BrevoMailer::new(&config));
    info!("Mailer initialized (from: {})", config.from_email);

    // Build app state
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        subscribers: Arc::new(PgSubscriberStore::new(db.clone())),
        corpus: Arc::new(PgJobCorpus::new(db)),
        mailer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Default `EnvFilter` directive when `RUST_LOG` is unset. Tracing targets
/// use the crate name (underscores), not the package name (hyphens), so the
/// directive must be built from `CARGO_CRATE_NAME`.
fn default_filter_directive(level: &str) -> String {
    format!("{}={level}", env!("CARGO_CRATE_NAME"))
}
