//! Dispatch Orchestrator — one run over the active subscriber list.
//!
//! Per subscriber the pipeline is strictly sequential:
//! throttle check → fetch candidates → score/filter → novelty check →
//! send → record. A failure in any stage is recorded against that
//! subscriber and the run moves on; only a failure to load the subscriber
//! list at all is fatal. The run result is returned to the caller and
//! never persisted — operators re-derive history from `last_sent_at` /
//! `total_sent` and provider logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alerts::scoring::{filter_and_rank, MatchProfile};
use crate::errors::AppError;
use crate::jobs::corpus::JobCorpus;
use crate::mailer::{JobAlertMessage, Mailer, SendOutcome};
use crate::models::job::ScoredJob;
use crate::models::subscriber::{normalize_email, Frequency, SubscriberRow};
use crate::subscribers::store::SubscriberStore;

/// Candidate cap per subscriber, after merging both corpus sources.
const MAX_CANDIDATES: i64 = 20;
/// Courtesy pacing between subscribers so the email provider is not
/// hammered. Not a rate limiter.
const INTER_SEND_DELAY: std::time::Duration = std::time::Duration::from_millis(100);
/// Upper bound on one subscriber's whole pipeline. A timeout is that
/// subscriber's error, never a fatal run error.
const SUBSCRIBER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub test_mode: bool,
    pub test_email: Option<String>,
    pub max_users: Option<usize>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkipEntry {
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub email: String,
    pub error: String,
}

/// Aggregate outcome of one dispatch run. Transient by design.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRunResult {
    pub total_users: usize,
    pub emails_sent: usize,
    pub errors: Vec<ErrorEntry>,
    pub skipped: Vec<SkipEntry>,
}

/// Failures that abort the whole run.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Test email {0} not found in subscribers")]
    TestEmailNotFound(String),

    #[error("{0}")]
    Fatal(String),
}

enum SubscriberOutcome {
    Sent { job_count: usize },
    Skipped(String),
}

/// Why a subscriber is throttled right now, if at all.
fn throttle_reason(
    frequency: Frequency,
    last_sent_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<&'static str> {
    let interval = frequency.min_interval()?;
    let last = last_sent_at?;
    if now.signed_duration_since(last) < interval {
        match frequency {
            Frequency::Daily => Some("Daily frequency limit not reached"),
            Frequency::Weekly => Some("Weekly frequency limit not reached"),
            Frequency::Immediate => None,
        }
    } else {
        None
    }
}

/// Best-effort novelty check: true when at least one candidate was posted
/// after the last alert. Compares job-posting clocks against alert clocks,
/// so it can under- or over-skip under skew; kept as the reference behaves.
fn has_new_jobs(jobs: &[ScoredJob], last_sent_at: Option<DateTime<Utc>>) -> bool {
    match last_sent_at {
        None => true,
        Some(last) => jobs.iter().any(|j| j.job.posted_at > last),
    }
}

/// Executes one dispatch run across the active subscriber list.
pub async fn run_dispatch(
    store: &dyn SubscriberStore,
    corpus: &dyn JobCorpus,
    mailer: &dyn Mailer,
    options: &DispatchOptions,
) -> Result<DispatchRunResult, DispatchError> {
    let mut subscribers = store
        .get_active_subscribers()
        .await
        .map_err(|e| DispatchError::Fatal(format!("Failed to load subscribers: {e}")))?;

    if options.test_mode {
        if let Some(test_email) = &options.test_email {
            let wanted = normalize_email(test_email);
            subscribers.retain(|s| s.email == wanted);
            if subscribers.is_empty() {
                return Err(DispatchError::TestEmailNotFound(test_email.clone()));
            }
        }
    }

    if let Some(max_users) = options.max_users {
        subscribers.truncate(max_users);
    }

    info!(
        "Dispatch run started: {} subscriber(s), dry_run={}",
        subscribers.len(),
        options.dry_run
    );

    let mut result = DispatchRunResult {
        total_users: subscribers.len(),
        ..DispatchRunResult::default()
    };

    for subscriber in &subscribers {
        let processed = tokio::time::timeout(
            SUBSCRIBER_TIMEOUT,
            process_subscriber(subscriber, store, corpus, mailer, options.dry_run),
        )
        .await;

        match processed {
            Ok(Ok(SubscriberOutcome::Sent { job_count })) => {
                debug!("Sent {job_count} job(s) to {}", subscriber.email);
                result.emails_sent += 1;
            }
            Ok(Ok(SubscriberOutcome::Skipped(reason))) => {
                debug!("Skipped {}: {reason}", subscriber.email);
                result.skipped.push(SkipEntry {
                    email: subscriber.email.clone(),
                    reason,
                });
            }
            Ok(Err(e)) => {
                warn!("Failed to process {}: {e}", subscriber.email);
                result.errors.push(ErrorEntry {
                    email: subscriber.email.clone(),
                    error: e.to_string(),
                });
            }
            Err(_elapsed) => {
                warn!("Timed out processing {}", subscriber.email);
                result.errors.push(ErrorEntry {
                    email: subscriber.email.clone(),
                    error: format!(
                        "Timed out after {}s",
                        SUBSCRIBER_TIMEOUT.as_secs()
                    ),
                });
            }
        }

        tokio::time::sleep(INTER_SEND_DELAY).await;
    }

    info!(
        "Dispatch run finished: {} sent, {} skipped, {} errors",
        result.emails_sent,
        result.skipped.len(),
        result.errors.len()
    );

    Ok(result)
}

async fn process_subscriber(
    subscriber: &SubscriberRow,
    store: &dyn SubscriberStore,
    corpus: &dyn JobCorpus,
    mailer: &dyn Mailer,
    dry_run: bool,
) -> Result<SubscriberOutcome, AppError> {
    let now = Utc::now();

    if let Some(reason) = throttle_reason(subscriber.frequency(), subscriber.last_sent_at, now) {
        return Ok(SubscriberOutcome::Skipped(reason.to_string()));
    }

    let profile = MatchProfile::from_subscriber(subscriber);
    let candidates = corpus
        .fetch_candidates(&profile, None, MAX_CANDIDATES)
        .await?;
    let jobs = filter_and_rank(candidates, &profile, now);

    if jobs.is_empty() {
        return Ok(SubscriberOutcome::Skipped(
            "No matching jobs found".to_string(),
        ));
    }

    if !has_new_jobs(&jobs, subscriber.last_sent_at) {
        return Ok(SubscriberOutcome::Skipped(
            "No new jobs since last alert".to_string(),
        ));
    }

    let job_count = jobs.len();

    if dry_run {
        debug!(
            "Dry run: would send {job_count} job(s) to {}",
            subscriber.email
        );
        return Ok(SubscriberOutcome::Sent { job_count });
    }

    let message = JobAlertMessage {
        to_email: subscriber.email.clone(),
        to_name: subscriber.name.clone(),
        jobs,
        keywords_summary: subscriber.keywords.join(", "),
        locations_summary: subscriber.locations.join(", "),
        unsubscribe_token: subscriber.unsubscribe_token.clone(),
    };

    match mailer
        .send_job_alert(&message)
        .await
        .map_err(|e| AppError::Email(e.to_string()))?
    {
        SendOutcome::Sent { .. } => {
            // Bookkeeping only after a confirmed send.
            store
                .record_send(&subscriber.email, job_count as i32)
                .await?;
            Ok(SubscriberOutcome::Sent { job_count })
        }
        SendOutcome::NothingToSend => Ok(SubscriberOutcome::Skipped(
            "Nothing to send".to_string(),
        )),
    }
}
