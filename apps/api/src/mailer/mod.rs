//! Notification Sender — formats and transmits job-alert emails.
//!
//! ARCHITECTURAL RULE: all outbound email goes through this module. The
//! only contract the rest of the service relies on is "accepts a
//! sender/recipient/subject/html/text payload and returns a provider
//! message id or an error".

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod templates;

use crate::config::Config;
use crate::models::job::ScoredJob;

const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Everything needed to compose one alert email.
#[derive(Debug, Clone)]
pub struct JobAlertMessage {
    pub to_email: String,
    pub to_name: String,
    pub jobs: Vec<ScoredJob>,
    pub keywords_summary: String,
    pub locations_summary: String,
    pub unsubscribe_token: String,
}

/// Outcome of a send attempt. `NothingToSend` (empty job list) is a
/// distinct non-failure so callers never log a no-op as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { message_id: String },
    NothingToSend,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_job_alert(&self, message: &JobAlertMessage) -> Result<SendOutcome, MailerError>;
}

#[derive(Debug, Serialize)]
struct BrevoParty<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoRequest<'a> {
    sender: BrevoParty<'a>,
    to: Vec<BrevoParty<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoResponse {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct BrevoError {
    message: String,
}

/// Transactional email via the Brevo REST API.
pub struct BrevoMailer {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
    app_url: String,
}

impl BrevoMailer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: config.brevo_api_key.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            app_url: config.app_url.clone(),
        }
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send_job_alert(&self, message: &JobAlertMessage) -> Result<SendOutcome, MailerError> {
        if message.jobs.is_empty() {
            debug!("No jobs for {} — nothing to send", message.to_email);
            return Ok(SendOutcome::NothingToSend);
        }

        let subject = templates::subject_line(message.jobs.len());
        let html = templates::render_html(message, &self.app_url);
        let text = templates::render_text(message, &self.app_url);

        let request_body = BrevoRequest {
            sender: BrevoParty {
                email: &self.from_email,
                name: &self.from_name,
            },
            to: vec![BrevoParty {
                email: &message.to_email,
                name: &message.to_name,
            }],
            subject: &subject,
            html_content: &html,
            text_content: &text,
        };

        let response = self
            .client
            .post(BREVO_API_URL)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<BrevoError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let brevo: BrevoResponse = response.json().await?;
        info!(
            "Sent job alert to {} ({} jobs, message id {})",
            message.to_email,
            message.jobs.len(),
            brevo.message_id
        );

        Ok(SendOutcome::Sent {
            message_id: brevo.message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_message() -> JobAlertMessage {
        JobAlertMessage {
            to_email: "jane@example.com".to_string(),
            to_name: "Jane".to_string(),
            jobs: vec![],
            keywords_summary: String::new(),
            locations_summary: String::new(),
            unsubscribe_token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_job_list_is_nothing_to_send_without_network() {
        let config = Config {
            database_url: String::new(),
            database_max_connections: 10,
            brevo_api_key: "key".to_string(),
            from_email: "alerts@example.com".to_string(),
            from_name: "Alerts".to_string(),
            app_url: "https://example.com".to_string(),
            job_ingest_expire_days: 30,
            job_ingest_purge_days: 180,
            port: 8080,
            rust_log: "info".to_string(),
        };
        let mailer = BrevoMailer::new(&config);
        let outcome = mailer.send_job_alert(&empty_message()).await.unwrap();
        assert_eq!(outcome, SendOutcome::NothingToSend);
    }
}
