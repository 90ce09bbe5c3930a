use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which physical collection a job came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOrigin {
    Curated,
    Ingested,
}

/// Canonical job shape seen by the matching engine and the mailer.
///
/// The two physical sources (curated and ingested) are differently shaped;
/// each is normalized into this record by its adapter so that scoring only
/// ever deals with one layout.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub origin: JobOrigin,
    /// Curated: the row UUID. Ingested: the external `job_id`.
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub skills: Vec<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub is_remote: bool,
    pub apply_url: Option<String>,
    pub posted_at: DateTime<Utc>,
}

/// A job decorated with its relevance score for one subscriber.
/// Request-scoped only; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob {
    #[serde(flatten)]
    pub job: Job,
    pub relevance_score: u32,
}

/// Row shape of the administratively curated job collection.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CuratedJobRow {
    pub id: Uuid,
    pub status: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub skills: Vec<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub is_remote: bool,
    pub apply_url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CuratedJobRow {
    pub fn into_job(self) -> Job {
        Job {
            origin: JobOrigin::Curated,
            id: self.id.to_string(),
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            skills: self.skills,
            employment_type: self.employment_type,
            seniority: self.seniority,
            is_remote: self.is_remote,
            apply_url: self.apply_url,
            posted_at: self.posted_at,
        }
    }
}

/// Row shape of the externally ingested job collection.
/// Keyed by the external `job_id`; carries expiry bookkeeping the curated
/// collection does not have.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IngestedJobRow {
    pub id: Uuid,
    pub job_id: String,
    pub status: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub skills: Vec<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub is_remote: bool,
    pub apply_url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl IngestedJobRow {
    pub fn into_job(self) -> Job {
        Job {
            origin: JobOrigin::Ingested,
            id: self.job_id,
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            skills: self.skills,
            employment_type: self.employment_type,
            seniority: self.seniority,
            is_remote: self.is_remote,
            apply_url: self.apply_url,
            posted_at: self.posted_at,
        }
    }
}

#[cfg(test)]
pub mod test_fixtures {
    use super::*;

    /// Builds a minimal canonical job for scoring/dispatch tests.
    pub fn make_job(title: &str, posted_at: DateTime<Utc>) -> Job {
        Job {
            origin: JobOrigin::Curated,
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            company: "Acme Corp".to_string(),
            location: "Remote".to_string(),
            description: "We are hiring.".to_string(),
            skills: vec![],
            employment_type: None,
            seniority: None,
            is_remote: false,
            apply_url: None,
            posted_at,
        }
    }
}
