//! Subscriber Store — persistence for job-alert subscriptions.
//!
//! Subscriptions are keyed by normalized email. Re-subscribing overwrites
//! preferences in place but preserves the original unsubscribe token, which
//! is the sole credential for unauthenticated unsubscribe/preference lookup.
//! Unsubscribe flips `is_active`; records are retained, never hard-deleted.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscriber::{normalize_email, Frequency, SubscriberRow};

/// Validated subscription preferences, ready to upsert.
#[derive(Debug, Clone)]
pub struct SubscriberProfile {
    pub email: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    pub remote_only: bool,
    pub employment_types: Vec<String>,
    pub seniority: Vec<String>,
    pub frequency: Frequency,
}

/// Outcome of a subscribe upsert.
#[derive(Debug, Clone)]
pub struct SubscribeReceipt {
    pub unsubscribe_token: String,
    pub is_new: bool,
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Upserts the full preference set and reactivates the subscription.
    /// A fresh unsubscribe token is assigned only on first creation.
    async fn subscribe(&self, profile: &SubscriberProfile) -> Result<SubscribeReceipt, AppError>;

    /// Deactivates the subscription identified by `token`.
    async fn unsubscribe(&self, token: &str) -> Result<(), AppError>;

    async fn get_active_subscribers(&self) -> Result<Vec<SubscriberRow>, AppError>;

    async fn get_by_token(&self, token: &str) -> Result<SubscriberRow, AppError>;

    /// Point lookup by email; inactive records are treated as absent.
    async fn get_preferences(&self, email: &str) -> Result<SubscriberRow, AppError>;

    /// Records a confirmed successful send. Must be called after the send,
    /// not before. `job_count` is the number of jobs in the email.
    async fn record_send(&self, email: &str, job_count: i32) -> Result<(), AppError>;
}

/// PostgreSQL-backed store.
pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    async fn subscribe(&self, profile: &SubscriberProfile) -> Result<SubscribeReceipt, AppError> {
        let email = normalize_email(&profile.email);

        // Single conditional upsert so the database enforces token stability:
        // `unsubscribe_token` is only written on INSERT, never on conflict.
        let (unsubscribe_token, is_new): (String, bool) = sqlx::query_as(
            r#"
            INSERT INTO subscribers
                (email, name, keywords, locations, remote_only,
                 employment_types, seniority, frequency, is_active, unsubscribe_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                keywords = EXCLUDED.keywords,
                locations = EXCLUDED.locations,
                remote_only = EXCLUDED.remote_only,
                employment_types = EXCLUDED.employment_types,
                seniority = EXCLUDED.seniority,
                frequency = EXCLUDED.frequency,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING unsubscribe_token, (xmax = 0) AS is_new
            "#,
        )
        .bind(&email)
        .bind(&profile.name)
        .bind(&profile.keywords)
        .bind(&profile.locations)
        .bind(profile.remote_only)
        .bind(&profile.employment_types)
        .bind(&profile.seniority)
        .bind(profile.frequency.as_str())
        .bind(Uuid::new_v4().simple().to_string())
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Subscription upsert for {email}: {}",
            if is_new { "created" } else { "updated" }
        );

        Ok(SubscribeReceipt {
            unsubscribe_token,
            is_new,
        })
    }

    async fn unsubscribe(&self, token: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE subscribers SET is_active = FALSE, updated_at = NOW() WHERE unsubscribe_token = $1",
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "No subscription found for this token".to_string(),
            ));
        }

        info!("Subscriber unsubscribed via token");
        Ok(())
    }

    async fn get_active_subscribers(&self) -> Result<Vec<SubscriberRow>, AppError> {
        Ok(sqlx::query_as::<_, SubscriberRow>(
            "SELECT * FROM subscribers WHERE is_active = TRUE",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_by_token(&self, token: &str) -> Result<SubscriberRow, AppError> {
        sqlx::query_as::<_, SubscriberRow>(
            "SELECT * FROM subscribers WHERE unsubscribe_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription found for this token".to_string()))
    }

    async fn get_preferences(&self, email: &str) -> Result<SubscriberRow, AppError> {
        let email = normalize_email(email);
        sqlx::query_as::<_, SubscriberRow>(
            "SELECT * FROM subscribers WHERE email = $1 AND is_active = TRUE",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No active subscription for {email}")))
    }

    async fn record_send(&self, email: &str, job_count: i32) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE subscribers
            SET last_sent_at = NOW(), total_sent = total_sent + $2, updated_at = NOW()
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(job_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
