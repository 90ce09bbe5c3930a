//! Job Corpus — merged read access to the curated and ingested job
//! collections, normalized to the canonical `Job` shape for scoring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::alerts::scoring::MatchProfile;
use crate::errors::AppError;
use crate::models::job::{CuratedJobRow, IngestedJobRow, Job};

/// Read access to the candidate pool for one subscriber.
///
/// Carried in `AppState` as `Arc<dyn JobCorpus>` so dispatch tests can run
/// against a static in-memory corpus.
#[async_trait]
pub trait JobCorpus: Send + Sync {
    /// Returns up to `limit` active jobs matching any of the profile's soft
    /// criteria (keywords, locations, employment types, seniority), newest
    /// first. `remote_only` and `since` are hard filters. A profile with no
    /// criteria at all yields no candidates.
    async fn fetch_candidates(
        &self,
        profile: &MatchProfile,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Job>, AppError>;
}

/// PostgreSQL corpus over `curated_jobs` and `ingested_jobs`.
pub struct PgJobCorpus {
    pool: PgPool,
}

impl PgJobCorpus {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobCorpus for PgJobCorpus {
    async fn fetch_candidates(
        &self,
        profile: &MatchProfile,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Job>, AppError> {
        if profile.is_empty() {
            return Ok(Vec::new());
        }

        let mut curated_query = candidate_query("curated_jobs", profile, since, limit);
        let curated: Vec<CuratedJobRow> = curated_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut ingested_query = candidate_query("ingested_jobs", profile, since, limit);
        let ingested: Vec<IngestedJobRow> = ingested_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut jobs: Vec<Job> = curated
            .into_iter()
            .map(CuratedJobRow::into_job)
            .chain(ingested.into_iter().map(IngestedJobRow::into_job))
            .collect();

        // Both sources are individually capped at `limit`; cap the merge too.
        jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        jobs.truncate(limit as usize);

        Ok(jobs)
    }
}

/// Builds the per-table candidate query. Hard filters (status, remote,
/// since) are ANDed; the preference criteria form one OR group so that a job
/// matching any criterion becomes a candidate and the scorer decides rank.
fn candidate_query(
    table: &str,
    profile: &MatchProfile,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT * FROM {table} WHERE status = 'active'"));

    if profile.remote_only {
        qb.push(" AND is_remote = TRUE");
    }

    if let Some(since) = since {
        qb.push(" AND posted_at > ");
        qb.push_bind(since);
    }

    let keyword_patterns: Vec<String> = profile
        .keywords
        .iter()
        .map(|k| format!("%{k}%"))
        .collect();
    let location_patterns: Vec<String> = profile
        .locations
        .iter()
        .map(|l| format!("%{l}%"))
        .collect();

    let mut first = true;

    if !keyword_patterns.is_empty() {
        or_sep(&mut qb, &mut first);
        qb.push("(title ILIKE ANY(");
        qb.push_bind(keyword_patterns.clone());
        qb.push(") OR company ILIKE ANY(");
        qb.push_bind(keyword_patterns.clone());
        qb.push(") OR description ILIKE ANY(");
        qb.push_bind(keyword_patterns.clone());
        qb.push(") OR array_to_string(skills, ' ') ILIKE ANY(");
        qb.push_bind(keyword_patterns);
        qb.push("))");
    }

    if !location_patterns.is_empty() {
        or_sep(&mut qb, &mut first);
        qb.push("location ILIKE ANY(");
        qb.push_bind(location_patterns);
        qb.push(")");
    }

    if !profile.employment_types.is_empty() {
        or_sep(&mut qb, &mut first);
        qb.push("LOWER(COALESCE(employment_type, '')) = ANY(");
        qb.push_bind(profile.employment_types.clone());
        qb.push(")");
    }

    if !profile.seniority.is_empty() {
        or_sep(&mut qb, &mut first);
        qb.push("LOWER(COALESCE(seniority, '')) = ANY(");
        qb.push_bind(profile.seniority.clone());
        qb.push(")");
    }

    // `remote_only` alone is a valid profile; it contributes no OR branch.
    if !first {
        qb.push(")");
    }

    qb.push(" ORDER BY posted_at DESC LIMIT ");
    qb.push_bind(limit);

    qb
}

/// Opens the OR group on first use, separates branches afterwards.
fn or_sep(qb: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    qb.push(if std::mem::take(first) { " AND (" } else { " OR " });
}
