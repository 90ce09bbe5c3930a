use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::subscriber::{Frequency, SubscriberRow};
use crate::state::AppState;
use crate::subscribers::store::SubscriberProfile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub remote_only: bool,
    #[serde(default)]
    pub employment_types: Vec<String>,
    #[serde(default)]
    pub seniority: Vec<String>,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
}

fn default_frequency() -> Frequency {
    Frequency::Immediate
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    pub unsubscribe_token: String,
    pub is_new_user: bool,
}

/// POST /api/v1/job-alerts/subscribe
pub async fn handle_subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, AppError> {
    if req.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let profile = SubscriberProfile {
        email: req.email,
        name: req.name,
        keywords: req.keywords,
        locations: req.locations,
        remote_only: req.remote_only,
        employment_types: req.employment_types,
        seniority: req.seniority,
        frequency: req.frequency,
    };

    let receipt = state.subscribers.subscribe(&profile).await?;

    let message = if receipt.is_new {
        "Subscribed to job alerts".to_string()
    } else {
        "Job alert preferences updated".to_string()
    };

    Ok(Json(SubscribeResponse {
        success: true,
        message,
        unsubscribe_token: receipt.unsubscribe_token,
        is_new_user: receipt.is_new,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct UnsubscribeResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/job-alerts/unsubscribe
pub async fn handle_unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<UnsubscribeResponse>, AppError> {
    state.subscribers.unsubscribe(&req.token).await?;
    Ok(Json(UnsubscribeResponse {
        success: true,
        message: "You have been unsubscribed from job alerts".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PreferencesQuery {
    pub token: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub email: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    pub remote_only: bool,
    pub employment_types: Vec<String>,
    pub seniority: Vec<String>,
    pub frequency: String,
    pub is_active: bool,
}

impl From<SubscriberRow> for PreferencesResponse {
    fn from(row: SubscriberRow) -> Self {
        PreferencesResponse {
            email: row.email,
            name: row.name,
            keywords: row.keywords,
            locations: row.locations,
            remote_only: row.remote_only,
            employment_types: row.employment_types,
            seniority: row.seniority,
            frequency: row.frequency,
            is_active: row.is_active,
        }
    }
}

/// GET /api/v1/job-alerts/preferences?token=… (or ?email=…)
pub async fn handle_get_preferences(
    State(state): State<AppState>,
    Query(params): Query<PreferencesQuery>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let row = match (params.token, params.email) {
        (Some(token), _) => state.subscribers.get_by_token(&token).await?,
        (None, Some(email)) => state.subscribers.get_preferences(&email).await?,
        (None, None) => {
            return Err(AppError::Validation(
                "Either 'token' or 'email' is required".to_string(),
            ))
        }
    };
    Ok(Json(row.into()))
}
