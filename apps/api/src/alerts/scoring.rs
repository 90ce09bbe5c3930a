//! Matching/Scoring Engine — relevance of one job for one subscriber.
//!
//! The score is an additive, order-independent integer. Contributions:
//! keyword hits weighted by field (title > company > skills > description),
//! a location hit, flat bonuses for remote/employment-type/seniority
//! preference matches, and a tiered recency bonus. Jobs that match nothing
//! (score 0) are excluded from results entirely.

use chrono::{DateTime, Utc};

use crate::models::job::{Job, ScoredJob};
use crate::models::subscriber::SubscriberRow;

// Keyword weights by field. Relative ordering is the contract;
// the absolute values mirror the reference weights.
const TITLE_KEYWORD_POINTS: u32 = 10;
const COMPANY_KEYWORD_POINTS: u32 = 8;
const SKILLS_KEYWORD_POINTS: u32 = 6;
const DESCRIPTION_KEYWORD_POINTS: u32 = 5;

const LOCATION_POINTS: u32 = 7;
const REMOTE_BONUS: u32 = 5;
const EMPLOYMENT_TYPE_BONUS: u32 = 3;
const SENIORITY_BONUS: u32 = 3;

// Recency tiers are mutually exclusive; only the freshest applicable
// tier contributes.
const RECENCY_1_DAY_BONUS: u32 = 5;
const RECENCY_3_DAY_BONUS: u32 = 3;
const RECENCY_7_DAY_BONUS: u32 = 1;

/// A subscriber's preference profile, pre-lowercased for matching.
#[derive(Debug, Clone, Default)]
pub struct MatchProfile {
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    pub remote_only: bool,
    pub employment_types: Vec<String>,
    pub seniority: Vec<String>,
}

impl MatchProfile {
    pub fn from_subscriber(sub: &SubscriberRow) -> Self {
        let lower = |v: &[String]| -> Vec<String> {
            v.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        MatchProfile {
            keywords: lower(&sub.keywords),
            locations: lower(&sub.locations),
            remote_only: sub.remote_only,
            employment_types: lower(&sub.employment_types),
            seniority: lower(&sub.seniority),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.locations.is_empty()
            && !self.remote_only
            && self.employment_types.is_empty()
            && self.seniority.is_empty()
    }
}

/// Computes the relevance score of `job` for `profile` as of `now`.
pub fn score(job: &Job, profile: &MatchProfile, now: DateTime<Utc>) -> u32 {
    let title = job.title.to_lowercase();
    let company = job.company.to_lowercase();
    let description = job.description.to_lowercase();
    let skills = job.skills.join(" ").to_lowercase();
    let location = job.location.to_lowercase();

    let mut points = 0u32;

    for keyword in &profile.keywords {
        if title.contains(keyword.as_str()) {
            points += TITLE_KEYWORD_POINTS;
        }
        if company.contains(keyword.as_str()) {
            points += COMPANY_KEYWORD_POINTS;
        }
        if skills.contains(keyword.as_str()) {
            points += SKILLS_KEYWORD_POINTS;
        }
        if description.contains(keyword.as_str()) {
            points += DESCRIPTION_KEYWORD_POINTS;
        }
    }

    for preferred in &profile.locations {
        if location.contains(preferred.as_str()) {
            points += LOCATION_POINTS;
        }
    }

    if profile.remote_only && job.is_remote {
        points += REMOTE_BONUS;
    }

    if let Some(employment_type) = &job.employment_type {
        let employment_type = employment_type.to_lowercase();
        if profile.employment_types.iter().any(|t| *t == employment_type) {
            points += EMPLOYMENT_TYPE_BONUS;
        }
    }

    if let Some(seniority) = &job.seniority {
        let seniority = seniority.to_lowercase();
        if profile.seniority.iter().any(|s| *s == seniority) {
            points += SENIORITY_BONUS;
        }
    }

    // Freshness sweetens an existing match; it never creates one, so a job
    // matching zero criteria stays at score 0 and is excluded downstream.
    if points == 0 {
        return 0;
    }
    points + recency_bonus(job.posted_at, now)
}

/// Tiered freshness bonus: ≤1 day +5, ≤3 days +3, ≤7 days +1, else 0.
fn recency_bonus(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let age = now.signed_duration_since(posted_at);
    if age <= chrono::Duration::days(1) {
        RECENCY_1_DAY_BONUS
    } else if age <= chrono::Duration::days(3) {
        RECENCY_3_DAY_BONUS
    } else if age <= chrono::Duration::days(7) {
        RECENCY_7_DAY_BONUS
    } else {
        0
    }
}

/// Scores `jobs`, drops anything without a strictly positive score, and
/// orders the rest by score descending. Ties break on `posted_at`
/// descending so the ordering is deterministic.
pub fn filter_and_rank(jobs: Vec<Job>, profile: &MatchProfile, now: DateTime<Utc>) -> Vec<ScoredJob> {
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .filter_map(|job| {
            let relevance_score = score(&job, profile, now);
            (relevance_score > 0).then_some(ScoredJob {
                job,
                relevance_score,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.relevance_score
            .cmp(&a.relevance_score)
            .then(b.job.posted_at.cmp(&a.job.posted_at))
    });

    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::test_fixtures::make_job;
    use crate::models::job::Job;

    fn profile(keywords: &[&str]) -> MatchProfile {
        MatchProfile {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            ..MatchProfile::default()
        }
    }

    fn old_job(title: &str, now: DateTime<Utc>) -> Job {
        // 30 days old: outside every recency tier.
        make_job(title, now - chrono::Duration::days(30))
    }

    #[test]
    fn test_title_keyword_scores_highest() {
        let now = Utc::now();
        let mut job = old_job("Senior Rust Engineer", now);
        job.company = "Ferrous Systems".to_string();
        job.description = "Work on compilers".to_string();

        let s = score(&job, &profile(&["rust"]), now);
        assert_eq!(s, TITLE_KEYWORD_POINTS);
    }

    #[test]
    fn test_keyword_hits_accumulate_across_fields() {
        let now = Utc::now();
        let mut job = old_job("Rust Engineer", now);
        job.company = "Rust Foundation".to_string();
        job.description = "Write Rust all day".to_string();
        job.skills = vec!["rust".to_string(), "tokio".to_string()];

        let s = score(&job, &profile(&["rust"]), now);
        assert_eq!(
            s,
            TITLE_KEYWORD_POINTS
                + COMPANY_KEYWORD_POINTS
                + SKILLS_KEYWORD_POINTS
                + DESCRIPTION_KEYWORD_POINTS
        );
    }

    #[test]
    fn test_score_is_case_insensitive() {
        let now = Utc::now();
        let job = old_job("SENIOR ENGINEER", now);
        assert!(score(&job, &profile(&["engineer"]), now) > 0);
    }

    #[test]
    fn test_adding_matching_keyword_never_decreases_score() {
        let now = Utc::now();
        let mut job = old_job("Senior Backend Engineer", now);
        job.description = "Kubernetes and Postgres".to_string();

        let base = score(&job, &profile(&["engineer"]), now);
        let extended = score(&job, &profile(&["engineer", "kubernetes"]), now);
        assert!(extended >= base);
    }

    #[test]
    fn test_location_match_adds_points() {
        let now = Utc::now();
        let mut job = old_job("Engineer", now);
        job.location = "Berlin, Germany".to_string();

        let p = MatchProfile {
            locations: vec!["berlin".to_string()],
            ..MatchProfile::default()
        };
        assert_eq!(score(&job, &p, now), LOCATION_POINTS);
    }

    #[test]
    fn test_remote_bonus_requires_both_sides() {
        let now = Utc::now();
        let mut job = old_job("Writer", now);
        job.is_remote = true;

        let p = MatchProfile {
            remote_only: true,
            ..MatchProfile::default()
        };
        assert_eq!(score(&job, &p, now), REMOTE_BONUS);

        job.is_remote = false;
        assert_eq!(score(&job, &p, now), 0);
    }

    #[test]
    fn test_employment_type_and_seniority_bonuses() {
        let now = Utc::now();
        let mut job = old_job("Analyst", now);
        job.employment_type = Some("Full-time".to_string());
        job.seniority = Some("Senior".to_string());

        let p = MatchProfile {
            employment_types: vec!["full-time".to_string()],
            seniority: vec!["senior".to_string()],
            ..MatchProfile::default()
        };
        assert_eq!(score(&job, &p, now), EMPLOYMENT_TYPE_BONUS + SENIORITY_BONUS);
    }

    #[test]
    fn test_recency_tiers_are_mutually_exclusive() {
        let now = Utc::now();
        assert_eq!(recency_bonus(now - chrono::Duration::hours(12), now), 5);
        assert_eq!(recency_bonus(now - chrono::Duration::days(2), now), 3);
        assert_eq!(recency_bonus(now - chrono::Duration::days(5), now), 1);
        assert_eq!(recency_bonus(now - chrono::Duration::days(10), now), 0);
    }

    #[test]
    fn test_zero_score_jobs_are_excluded() {
        let now = Utc::now();
        let job = old_job("Gardener", now);
        let ranked = filter_and_rank(vec![job], &profile(&["engineer"]), now);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ranking_is_descending_with_posted_at_tiebreak() {
        let now = Utc::now();
        let old_days = chrono::Duration::days(30);

        let mut strong = old_job("Engineer", now);
        strong.company = "Engineer Collective".to_string(); // title + company hits
        let weak_newer = make_job("Engineer", now - old_days + chrono::Duration::days(1));
        let weak_older = old_job("Engineer", now);

        // weak_newer and weak_older score identically on keywords; the newer
        // one must rank first.
        let p = profile(&["engineer"]);
        let ranked = filter_and_rank(
            vec![weak_older.clone(), strong.clone(), weak_newer.clone()],
            &p,
            now,
        );

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].job.company, "Engineer Collective");
        assert!(ranked[1].job.posted_at >= ranked[2].job.posted_at);
        assert!(ranked[0].relevance_score >= ranked[1].relevance_score);
    }

    #[test]
    fn test_reference_scenario_remote_engineer_scores_at_least_20() {
        // Subscriber {keywords:["engineer"], remoteOnly:true} vs a fresh
        // remote "Senior Engineer" posting: 10 (title) + 5 (remote) +
        // 5 (recency) = 20 minimum.
        let now = Utc::now();
        let mut job = make_job("Senior Engineer", now);
        job.is_remote = true;

        let p = MatchProfile {
            keywords: vec!["engineer".to_string()],
            locations: vec!["remote".to_string()],
            remote_only: true,
            ..MatchProfile::default()
        };
        let s = score(&job, &p, now);
        assert!(s >= 20, "expected ≥20, got {s}");
    }
}
