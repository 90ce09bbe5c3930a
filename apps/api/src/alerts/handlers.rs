use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::alerts::dispatch::{run_dispatch, DispatchError, DispatchOptions};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendAlertsRequest {
    pub test_mode: bool,
    pub test_email: Option<String>,
    pub max_users: Option<usize>,
    pub dry_run: bool,
}

/// POST /api/v1/job-alerts/send
///
/// Always responds 200 with a detailed results breakdown unless the run
/// could not start at all: 404 for an unknown test email, 500 for a fatal
/// failure. The response envelope is `{success, results}` /
/// `{success:false, error}` rather than the generic error shape, since the
/// operator consumes it directly.
pub async fn handle_send_alerts(
    State(state): State<AppState>,
    Json(req): Json<SendAlertsRequest>,
) -> Response {
    let options = DispatchOptions {
        test_mode: req.test_mode,
        test_email: req.test_email,
        max_users: req.max_users,
        dry_run: req.dry_run,
    };
    dispatch_response(&state, options).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAlertsQuery {
    pub test_email: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    pub max_users: Option<usize>,
}

/// GET /api/v1/job-alerts/send?testEmail=…&dryRun=…
/// Convenience variant that re-invokes the POST contract.
pub async fn handle_send_alerts_get(
    State(state): State<AppState>,
    Query(params): Query<SendAlertsQuery>,
) -> Response {
    let options = DispatchOptions {
        test_mode: params.test_email.is_some(),
        test_email: params.test_email,
        max_users: params.max_users,
        dry_run: params.dry_run,
    };
    dispatch_response(&state, options).await
}

async fn dispatch_response(state: &AppState, options: DispatchOptions) -> Response {
    match run_dispatch(
        state.subscribers.as_ref(),
        state.corpus.as_ref(),
        state.mailer.as_ref(),
        &options,
    )
    .await
    {
        Ok(results) => Json(json!({ "success": true, "results": results })).into_response(),
        Err(e @ DispatchError::TestEmailNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
        Err(DispatchError::Fatal(message)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": message })),
        )
            .into_response(),
    }
}
