use campus_common::store::StoreError;
use std::fmt;

/// Why a remote execution produced no verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// Connection failure, timeout or non-2xx response
    JudgeUnreachable,
    /// The judge answered but gave no usable job token
    JudgeRejected,
}

impl ExecutionErrorKind {
    /// Label persisted as the submission status
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionErrorKind::JudgeUnreachable => "Judge Unreachable",
            ExecutionErrorKind::JudgeRejected => "Judge Rejected",
        }
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub detail: String,
}

impl ExecutionError {
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::JudgeUnreachable,
            detail: detail.into(),
        }
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::JudgeRejected,
            detail: detail.into(),
        }
    }
}

/// Failures of one evaluation call that leave no verdict for the caller
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Missing required fields")]
    InvalidRequest,

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Challenge not found")]
    ChallengeNotFound(u64),

    #[error("storage failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}
