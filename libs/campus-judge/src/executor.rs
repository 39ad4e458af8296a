/// Submission Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Run one challenge submission end to end.
///
/// **Flow:**
/// 1. Validate the request and resolve the language
/// 2. Load the challenge's expected output (store)
/// 3. Run the code on the remote judge (engine.rs)
/// 4. Apply the correctness policy (evaluator.rs)
/// 5. Persist exactly one submission row, whatever the judge said
/// 6. Shape the client-facing `SubmissionResult`
///
/// This module is the glue layer - it knows nothing about:
/// - How the judge is reached (engine's job)
/// - How correctness is decided (evaluator's job)
/// - How rows are stored (store's job)

use crate::engine::Judge;
use crate::error::{EvaluationError, ExecutionError};
use crate::evaluator::{self, Verdict};
use campus_common::store::{Store, StoreError};
use campus_common::types::{
    ExecutionOutcome, ExecutionRequest, Language, NewSubmission, SubmissionResult,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// One submission as handed over by the web layer. `user_id` is already
/// authenticated.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCode {
    pub user_id: u64,
    pub challenge_id: u64,
    pub code: String,
    #[serde(default)]
    pub input_data: String,
    pub language: String,
}

/// Evaluate one submission
///
/// Judge failures do not produce an `Err`: they are recorded as a submission
/// with a "Judge Unreachable" / "Judge Rejected" status and returned with
/// `success: false`. Only caller mistakes and storage failures are errors.
#[instrument(
    skip_all,
    fields(
        user_id = submission.user_id,
        challenge_id = submission.challenge_id,
        language = %submission.language,
    )
)]
pub async fn evaluate<S, J>(
    store: &S,
    judge: &J,
    submission: SubmitCode,
) -> Result<SubmissionResult, EvaluationError>
where
    S: Store + ?Sized,
    J: Judge + ?Sized,
{
    if submission.challenge_id == 0 || submission.code.trim().is_empty() {
        return Err(EvaluationError::InvalidRequest);
    }

    let language = Language::from_name(&submission.language)
        .ok_or_else(|| EvaluationError::UnsupportedLanguage(submission.language.clone()))?;

    let challenge = store
        .get_challenge(submission.challenge_id)
        .await?
        .ok_or(EvaluationError::ChallengeNotFound(submission.challenge_id))?;

    let request = ExecutionRequest::new(submission.code.as_str(), language, submission.input_data.as_str());
    let judged = judge.execute(&request).await;

    let verdict = match &judged {
        Ok(outcome) => evaluator::judge_outcome(outcome, &challenge.expected_output),
        Err(e) => {
            warn!(kind = %e.kind, detail = %e.detail, "Judge produced no verdict");
            evaluator::judge_failure(e)
        }
    };

    let output = judged
        .as_ref()
        .map(|outcome| outcome.stdout.clone())
        .unwrap_or_default();

    let stored = store
        .insert_submission(NewSubmission {
            user_id: submission.user_id,
            challenge_id: challenge.id,
            code: submission.code,
            input_data: submission.input_data,
            output,
            expected_output: challenge.expected_output,
            submitted_at: Utc::now(),
            status: verdict.status.clone(),
            language,
        })
        .await
        .map_err(|e| match e {
            StoreError::ChallengeMissing(id) => EvaluationError::ChallengeNotFound(id),
            other => EvaluationError::PersistenceFailure(other),
        })?;

    info!(
        submission_id = stored.id,
        status = %stored.status,
        is_correct = verdict.is_correct,
        "Submission evaluated"
    );

    Ok(shape_result(stored.id, &judged, &verdict))
}

/// Build the client-facing result; stderr and compile output only when present
fn shape_result(
    submission_id: u64,
    judged: &Result<ExecutionOutcome, ExecutionError>,
    verdict: &Verdict,
) -> SubmissionResult {
    match judged {
        Ok(outcome) => SubmissionResult {
            submission_id,
            success: true,
            status: outcome.status_label.clone(),
            recorded_status: verdict.status.clone(),
            output: outcome.stdout.clone(),
            is_correct: verdict.is_correct,
            execution_time: format!("{} seconds", outcome.time_seconds),
            memory_used: format!("{} KB", outcome.memory_kb),
            error_output: non_empty(&outcome.stderr),
            compile_output: non_empty(&outcome.compile_output),
        },
        Err(e) => SubmissionResult {
            submission_id,
            success: false,
            status: verdict.status.label().to_string(),
            recorded_status: verdict.status.clone(),
            output: String::new(),
            is_correct: false,
            execution_time: "0 seconds".to_string(),
            memory_used: "0 KB".to_string(),
            error_output: Some(e.detail.clone()),
            compile_output: None,
        },
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
