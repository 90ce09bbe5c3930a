pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::alerts::handlers as alert_handlers;
use crate::jobs::handlers as job_handlers;
use crate::state::AppState;
use crate::subscribers::handlers as subscriber_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job-alert subscriptions
        .route(
            "/api/v1/job-alerts/subscribe",
            post(subscriber_handlers::handle_subscribe),
        )
        .route(
            "/api/v1/job-alerts/unsubscribe",
            post(subscriber_handlers::handle_unsubscribe),
        )
        .route(
            "/api/v1/job-alerts/preferences",
            get(subscriber_handlers::handle_get_preferences),
        )
        // Dispatch trigger (operator-facing)
        .route(
            "/api/v1/job-alerts/send",
            post(alert_handlers::handle_send_alerts).get(alert_handlers::handle_send_alerts_get),
        )
        // Ingested job corpus
        .route("/api/v1/jobs/ingest", post(job_handlers::handle_ingest_job))
        .route("/api/v1/jobs/search", get(job_handlers::handle_search_jobs))
        .route(
            "/api/v1/jobs/maintenance",
            post(job_handlers::handle_maintenance),
        )
        .with_state(state)
}
