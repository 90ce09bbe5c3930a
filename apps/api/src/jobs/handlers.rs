use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::ingested::{
    mark_expired, purge_old, search_ingested_jobs, upsert_ingested_job, IngestJobRequest,
    PostedWithin, SearchFilters, SearchPage,
};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub job_id: String,
    pub created: bool,
}

/// POST /api/v1/jobs/ingest
pub async fn handle_ingest_job(
    State(state): State<AppState>,
    Json(req): Json<IngestJobRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    if req.job_id.trim().is_empty() {
        return Err(AppError::Validation("job_id is required".to_string()));
    }
    let created =
        upsert_ingested_job(&state.db, state.config.job_ingest_expire_days, &req).await?;
    Ok(Json(IngestResponse {
        success: true,
        job_id: req.job_id,
        created,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub location: Option<String>,
    /// Comma-separated canonical codes, e.g. `full_time,contract`.
    pub employment_type: Option<String>,
    #[serde(default)]
    pub remote: bool,
    pub posted_within: Option<PostedWithin>,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/v1/jobs/search
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchPage>, AppError> {
    let filters = SearchFilters {
        query: params.q,
        location: params.location,
        employment_types: params
            .employment_type
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        remote_only: params.remote,
        posted_within: params.posted_within,
    };
    let page = search_ingested_jobs(&state.db, &filters, params.page, params.limit).await?;
    Ok(Json(page))
}

#[derive(Serialize)]
pub struct MaintenanceResponse {
    pub expired: u64,
    pub purged: u64,
}

/// POST /api/v1/jobs/maintenance
///
/// Runs the ingested-corpus housekeeping pass: flags active jobs past the
/// expiry window, then hard-deletes jobs past the retention window. Both
/// steps are idempotent; rerunning is safe.
pub async fn handle_maintenance(
    State(state): State<AppState>,
) -> Result<Json<MaintenanceResponse>, AppError> {
    let expired = mark_expired(&state.db, state.config.job_ingest_expire_days).await?;
    let purged = purge_old(&state.db, state.config.job_ingest_purge_days).await?;
    Ok(Json(MaintenanceResponse { expired, purged }))
}
