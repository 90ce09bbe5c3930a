use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub brevo_api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub app_url: String,
    /// Days an ingested job stays `active` after its posting date.
    pub job_ingest_expire_days: i32,
    /// Days after which an ingested job is hard-deleted, regardless of status.
    pub job_ingest_purge_days: i32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: env_i32("DATABASE_MAX_CONNECTIONS", 10)?.max(1) as u32,
            brevo_api_key: require_env("BREVO_API_KEY")?,
            from_email: require_env("JOB_ALERTS_FROM_EMAIL")?,
            from_name: require_env("JOB_ALERTS_FROM_NAME")?,
            app_url: require_env("APP_URL")?,
            job_ingest_expire_days: env_i32("JOB_INGEST_EXPIRE_DAYS", 30)?,
            job_ingest_purge_days: env_i32("JOB_INGEST_PURGE_DAYS", 180)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_i32(key: &str, default: i32) -> Result<i32> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<i32>()
            .with_context(|| format!("{key} must be a whole number of days")),
        Err(_) => Ok(default),
    }
}
