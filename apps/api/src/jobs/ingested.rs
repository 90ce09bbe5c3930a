//! Ingested job collection — externally sourced postings, deduplicated by
//! the provider's `job_id`, with TTL-style expiry and eventual purge.
//!
//! Expiry (`mark_expired`) and purge (`purge_old`) are maintenance
//! operations; the matching path only ever reads `status = 'active'` rows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use crate::errors::AppError;
use crate::models::job::IngestedJobRow;

/// One job as delivered by the external feed.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestJobRequest {
    pub job_id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
    pub apply_url: Option<String>,
    pub posted_at: DateTime<Utc>,
}

/// Upserts one ingested job, keyed by `job_id`. Re-ingesting refreshes the
/// content fields, `ingested_at`, and `expires_at`, reactivates the row,
/// and preserves the original `created_at`. Returns true when the row was
/// newly created.
pub async fn upsert_ingested_job(
    pool: &PgPool,
    expire_days: i32,
    job: &IngestJobRequest,
) -> Result<bool, AppError> {
    let expires_at = job.posted_at + Duration::days(expire_days as i64);

    let (created,): (bool,) = sqlx::query_as(
        r#"
        INSERT INTO ingested_jobs
            (job_id, title, company, location, description, skills,
             employment_type, seniority, is_remote, apply_url,
             posted_at, ingested_at, expires_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), $12, 'active')
        ON CONFLICT (job_id) DO UPDATE SET
            title = EXCLUDED.title,
            company = EXCLUDED.company,
            location = EXCLUDED.location,
            description = EXCLUDED.description,
            skills = EXCLUDED.skills,
            employment_type = EXCLUDED.employment_type,
            seniority = EXCLUDED.seniority,
            is_remote = EXCLUDED.is_remote,
            apply_url = EXCLUDED.apply_url,
            posted_at = EXCLUDED.posted_at,
            ingested_at = NOW(),
            expires_at = EXCLUDED.expires_at,
            status = 'active'
        RETURNING (xmax = 0) AS created
        "#,
    )
    .bind(&job.job_id)
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.location)
    .bind(&job.description)
    .bind(&job.skills)
    .bind(&job.employment_type)
    .bind(&job.seniority)
    .bind(job.is_remote)
    .bind(&job.apply_url)
    .bind(job.posted_at)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

/// Posted-within windows accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostedWithin {
    Today,
    #[serde(rename = "3days")]
    ThreeDays,
    Week,
    Month,
    All,
}

impl PostedWithin {
    /// The oldest `posted_at` admitted by this window, or `None` for `all`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            PostedWithin::Today => Some(now - Duration::days(1)),
            PostedWithin::ThreeDays => Some(now - Duration::days(3)),
            PostedWithin::Week => Some(now - Duration::days(7)),
            PostedWithin::Month => Some(now - Duration::days(30)),
            PostedWithin::All => None,
        }
    }
}

/// Maps a canonical employment-type code to the display label stored on job
/// rows. Unrecognized input is passed through unchanged so already-labeled
/// values keep working.
pub fn employment_type_label(code: &str) -> String {
    match code.trim().to_lowercase().as_str() {
        "full_time" | "full-time" | "fulltime" => "Full-time".to_string(),
        "part_time" | "part-time" | "parttime" => "Part-time".to_string(),
        "contract" => "Contract".to_string(),
        "internship" => "Internship".to_string(),
        "temporary" => "Temporary".to_string(),
        _ => code.trim().to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub location: Option<String>,
    /// Canonical codes; mapped to display labels before the query runs.
    pub employment_types: Vec<String>,
    pub remote_only: bool,
    pub posted_within: Option<PostedWithin>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub jobs: Vec<IngestedJobRow>,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

fn text_vector_sql() -> &'static str {
    "to_tsvector('english', title || ' ' || company || ' ' || description)"
}

/// Deep pagination past this point serves nobody; capping the page also
/// keeps the OFFSET product far from i64 overflow.
const MAX_PAGE: i64 = 10_000;

/// Bounds untrusted paging parameters so `page * limit` is always a valid,
/// non-negative OFFSET.
fn clamp_paging(page: i64, limit: i64) -> (i64, i64) {
    (page.clamp(0, MAX_PAGE), limit.clamp(1, 100))
}

/// Paged search over active ingested jobs. Sorted by text-match rank when a
/// free-text query is present, else by `posted_at` descending. `has_more`
/// is computed by fetching one row past the page and trimming.
pub async fn search_ingested_jobs(
    pool: &PgPool,
    filters: &SearchFilters,
    page: i64,
    limit: i64,
) -> Result<SearchPage, AppError> {
    let (page, limit) = clamp_paging(page, limit);

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM ingested_jobs WHERE status = 'active'");

    let query = filters
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    if let Some(q) = query {
        qb.push(" AND ");
        qb.push(text_vector_sql());
        qb.push(" @@ plainto_tsquery('english', ");
        qb.push_bind(q.to_string());
        qb.push(")");
    }

    if let Some(location) = filters
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        qb.push(" AND location ILIKE ");
        qb.push_bind(format!("%{location}%"));
    }

    if !filters.employment_types.is_empty() {
        let labels: Vec<String> = filters
            .employment_types
            .iter()
            .map(|c| employment_type_label(c))
            .collect();
        qb.push(" AND employment_type = ANY(");
        qb.push_bind(labels);
        qb.push(")");
    }

    if filters.remote_only {
        qb.push(" AND is_remote = TRUE");
    }

    if let Some(cutoff) = filters
        .posted_within
        .and_then(|w| w.cutoff(Utc::now()))
    {
        qb.push(" AND posted_at >= ");
        qb.push_bind(cutoff);
    }

    match query {
        Some(q) => {
            qb.push(" ORDER BY ts_rank(");
            qb.push(text_vector_sql());
            qb.push(", plainto_tsquery('english', ");
            qb.push_bind(q.to_string());
            qb.push(")) DESC, posted_at DESC");
        }
        None => {
            qb.push(" ORDER BY posted_at DESC");
        }
    }

    qb.push(" LIMIT ");
    qb.push_bind(limit + 1);
    qb.push(" OFFSET ");
    qb.push_bind(page * limit);

    let mut jobs: Vec<IngestedJobRow> = qb.build_query_as().fetch_all(pool).await?;

    let has_more = jobs.len() as i64 > limit;
    jobs.truncate(limit as usize);

    Ok(SearchPage {
        jobs,
        page,
        limit,
        has_more,
    })
}

/// True when a job posted at `posted_at` has outlived the active window.
pub fn is_past_expiry(posted_at: DateTime<Utc>, expire_days: i32, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(posted_at) > Duration::days(expire_days as i64)
}

/// Flags active jobs past their posting window as expired.
/// Idempotent; safe to run repeatedly.
pub async fn mark_expired(pool: &PgPool, expire_days: i32) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE ingested_jobs
        SET status = 'expired'
        WHERE status = 'active' AND posted_at < NOW() - make_interval(days => $1)
        "#,
    )
    .bind(expire_days)
    .execute(pool)
    .await?;

    let expired = result.rows_affected();
    if expired > 0 {
        info!("Marked {expired} ingested jobs as expired");
    }
    Ok(expired)
}

/// Hard-deletes jobs older than the retention window, regardless of status.
/// Irreversible.
pub async fn purge_old(pool: &PgPool, purge_days: i32) -> Result<u64, AppError> {
    let result = sqlx::query(
        "DELETE FROM ingested_jobs WHERE posted_at < NOW() - make_interval(days => $1)",
    )
    .bind(purge_days)
    .execute(pool)
    .await?;

    let purged = result.rows_affected();
    if purged > 0 {
        info!("Purged {purged} ingested jobs past retention");
    }
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posted_within_cutoffs() {
        let now = Utc::now();
        assert_eq!(PostedWithin::Today.cutoff(now), Some(now - Duration::days(1)));
        assert_eq!(
            PostedWithin::ThreeDays.cutoff(now),
            Some(now - Duration::days(3))
        );
        assert_eq!(PostedWithin::Week.cutoff(now), Some(now - Duration::days(7)));
        assert_eq!(PostedWithin::Month.cutoff(now), Some(now - Duration::days(30)));
        assert_eq!(PostedWithin::All.cutoff(now), None);
    }

    #[test]
    fn test_employment_type_label_maps_codes() {
        assert_eq!(employment_type_label("full_time"), "Full-time");
        assert_eq!(employment_type_label("part_time"), "Part-time");
        assert_eq!(employment_type_label("contract"), "Contract");
        assert_eq!(employment_type_label("internship"), "Internship");
        assert_eq!(employment_type_label("temporary"), "Temporary");
    }

    #[test]
    fn test_employment_type_label_passes_through_labels() {
        assert_eq!(employment_type_label("Full-time"), "Full-time");
        assert_eq!(employment_type_label("Freelance"), "Freelance");
    }

    #[test]
    fn test_clamp_paging_bounds_hostile_input() {
        assert_eq!(clamp_paging(-5, 0), (0, 1));
        assert_eq!(clamp_paging(3, 250), (3, 100));

        // An absurd page must neither overflow nor produce a negative OFFSET.
        let (page, limit) = clamp_paging(i64::MAX, i64::MAX);
        let offset = page.checked_mul(limit).unwrap();
        assert!(offset >= 0);
        assert_eq!((page, limit), (MAX_PAGE, 100));
    }

    #[test]
    fn test_expiry_predicate_boundary() {
        let now = Utc::now();
        let expire_days = 30;

        let fresh = now - Duration::days(29);
        let stale = now - Duration::days(31);
        assert!(!is_past_expiry(fresh, expire_days, now));
        assert!(is_past_expiry(stale, expire_days, now));
    }

    #[test]
    fn test_expiry_predicate_is_stable_over_reruns() {
        // Monotone: once past expiry, a job stays past expiry as time advances.
        let now = Utc::now();
        let posted = now - Duration::days(40);
        assert!(is_past_expiry(posted, 30, now));
        assert!(is_past_expiry(posted, 30, now + Duration::days(1)));
    }
}
