use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How often a subscriber may receive an alert email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Immediate,
    Daily,
    Weekly,
}

impl Frequency {
    /// Lenient parse of the stored text value. Unknown values fall back to
    /// `Immediate`, which never throttles, so a bad value degrades to
    /// "send whenever there is something to send" rather than silence.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            _ => Frequency::Immediate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Immediate => "immediate",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    /// Minimum spacing between sends; `None` means no throttling.
    pub fn min_interval(&self) -> Option<chrono::Duration> {
        match self {
            Frequency::Immediate => None,
            Frequency::Daily => Some(chrono::Duration::hours(24)),
            Frequency::Weekly => Some(chrono::Duration::hours(168)),
        }
    }
}

/// One job-alert subscription, unique per email address.
///
/// Preference sets are stored as free text arrays; enum-ish fields
/// (`frequency`, employment types, seniority) are parsed leniently at use
/// sites so a malformed record never poisons a dispatch run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriberRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    pub remote_only: bool,
    pub employment_types: Vec<String>,
    pub seniority: Vec<String>,
    pub frequency: String,
    pub is_active: bool,
    pub unsubscribe_token: String,
    pub last_sent_at: Option<DateTime<Utc>>,
    /// Count of jobs (not emails) delivered historically.
    pub total_sent: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriberRow {
    pub fn frequency(&self) -> Frequency {
        Frequency::parse(&self.frequency)
    }
}

/// Normalizes an email for use as the subscriber key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
