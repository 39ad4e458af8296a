// HTTP route handlers for the campus judge API

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Form,
};
use campus_common::types::{Challenge, NewChallenge, Submission, SubmissionResult};
use campus_judge::{evaluate, EvaluationError, SubmitCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::{Identity, Role};
use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
pub struct SubmitCodeBody {
    pub challenge_id: Option<u64>,
    pub code: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

/// POST /submit_code - Run a student's code against a challenge
pub async fn submit_code(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    body: Result<Json<SubmitCodeBody>, JsonRejection>,
) -> Result<Json<SubmissionResult>, ApiError> {
    identity.require(Role::Student)?;

    let Json(body) = body.map_err(|rejection| {
        warn!(error = %rejection, "Malformed submission body");
        ApiError::from(EvaluationError::InvalidRequest)
    })?;

    let (challenge_id, code) = match (body.challenge_id, body.code) {
        (Some(challenge_id), Some(code)) => (challenge_id, code),
        _ => return Err(EvaluationError::InvalidRequest.into()),
    };

    let submission = SubmitCode {
        user_id: identity.user_id,
        challenge_id,
        code,
        input_data: body.input.unwrap_or_default(),
        language: body.language,
    };

    let started = Instant::now();
    let result = evaluate(state.store.as_ref(), state.judge.as_ref(), submission).await?;
    metrics::EVALUATION_SECONDS.observe(started.elapsed().as_secs_f64());

    metrics::SUBMISSIONS_TOTAL
        .with_label_values(&[result.recorded_status.label()])
        .inc();
    if !result.success {
        metrics::JUDGE_FAILURES_TOTAL
            .with_label_values(&[result.status.as_str()])
            .inc();
    }

    info!(
        user_id = identity.user_id,
        submission_id = result.submission_id,
        status = %result.status,
        is_correct = result.is_correct,
        "Submission answered"
    );

    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct StudentChallenge {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub input_format: String,
}

impl From<Challenge> for StudentChallenge {
    fn from(c: Challenge) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            input_format: c.input_format,
        }
    }
}

/// GET /get_challenges - Challenge list for the student workspace
pub async fn student_challenges(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    identity.require(Role::Student)?;

    let challenges: Vec<StudentChallenge> = state
        .store
        .list_challenges()
        .await?
        .into_iter()
        .map(StudentChallenge::from)
        .collect();

    Ok(Json(serde_json::json!({ "challenges": challenges })))
}

#[derive(Debug, Serialize)]
pub struct ChallengeSummary {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub input_format: String,
    pub created_at: String,
}

impl From<Challenge> for ChallengeSummary {
    fn from(c: Challenge) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            input_format: c.input_format,
            created_at: c.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// GET /api/coding-challenges - Catalog listing for any logged in user
pub async fn list_challenges(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
) -> Result<Json<Vec<ChallengeSummary>>, ApiError> {
    let challenges = state.store.list_challenges().await?;
    Ok(Json(challenges.into_iter().map(ChallengeSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub input_format: Option<String>,
    pub expected_output: Option<String>,
}

impl ChallengeForm {
    fn into_new_challenge(self) -> Option<NewChallenge> {
        let present = |field: Option<String>| field.filter(|v| !v.is_empty());
        Some(NewChallenge {
            title: present(self.title)?,
            description: present(self.description)?,
            input_format: present(self.input_format)?,
            expected_output: present(self.expected_output)?,
        })
    }
}

/// POST /api/coding-challenges - Admin adds a challenge
pub async fn create_challenge(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    form: Result<Form<ChallengeForm>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require(Role::Admin)?;

    let new_challenge = form
        .ok()
        .and_then(|Form(form)| form.into_new_challenge())
        .ok_or_else(|| ApiError::BadRequest("All fields are required".to_string()))?;

    let challenge = state.store.create_challenge(new_challenge).await?;
    info!(challenge_id = challenge.id, title = %challenge.title, "Challenge created");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Challenge added successfully",
        "id": challenge.id,
    })))
}

/// DELETE /api/coding-challenges/:id - Admin removes a challenge and its submissions
pub async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(challenge_id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require(Role::Admin)?;

    if !state.store.delete_challenge(challenge_id).await? {
        return Err(EvaluationError::ChallengeNotFound(challenge_id).into());
    }
    info!(challenge_id, "Challenge deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Challenge {} deleted successfully", challenge_id),
    })))
}

/// GET /api/submissions - The caller's own submission history, newest first
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let submissions = state.store.list_user_submissions(identity.user_id).await?;
    Ok(Json(submissions))
}

/// GET /status - Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_report() -> impl IntoResponse {
    match metrics::encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::Internal(format!("Failed to encode metrics: {}", e)).into_response(),
    }
}
