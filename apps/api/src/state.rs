use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::jobs::corpus::JobCorpus;
use crate::mailer::Mailer;
use crate::subscribers::store::SubscriberStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Subscription persistence. Production: `PgSubscriberStore`.
    pub subscribers: Arc<dyn SubscriberStore>,
    /// Merged curated + ingested candidate source. Production: `PgJobCorpus`.
    pub corpus: Arc<dyn JobCorpus>,
    /// Transactional email transport. Production: `BrevoMailer`.
    pub mailer: Arc<dyn Mailer>,
}
