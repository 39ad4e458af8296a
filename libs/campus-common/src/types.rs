use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed CPU limit sent with every execution request
pub const CPU_TIME_LIMIT_SECONDS: u32 = 5;
/// Fixed memory limit sent with every execution request (256 MB)
pub const MEMORY_LIMIT_KB: u32 = 256_000;

/// Judge status code for a clean, successful run
pub const ACCEPTED_STATUS_ID: i32 = 3;
pub const UNKNOWN_STATUS: &str = "Unknown Status";

/// Judge0 status labels, indexed by `status_id - 1`
const STATUS_LABELS: [&str; 14] = [
    "In Queue",
    "Processing",
    "Accepted",
    "Wrong Answer",
    "Time Limit Exceeded",
    "Compilation Error",
    "Runtime Error (SIGSEGV)",
    "Runtime Error (SIGXFSZ)",
    "Runtime Error (SIGFPE)",
    "Runtime Error (SIGABRT)",
    "Runtime Error (NZEC)",
    "Runtime Error (Other)",
    "Internal Error",
    "Exec Format Error",
];

/// Map a judge status code to its label. Total: unknown codes get `UNKNOWN_STATUS`.
pub fn status_label(status_id: i32) -> &'static str {
    usize::try_from(status_id)
        .ok()
        .and_then(|id| id.checked_sub(1))
        .and_then(|idx| STATUS_LABELS.get(idx))
        .copied()
        .unwrap_or(UNKNOWN_STATUS)
}

/// True while the judge has not finished the job yet (In Queue / Processing)
pub fn is_pending_status(status_id: i32) -> bool {
    status_id == 1 || status_id == 2
}

/// Languages the judge accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Cpp,
    C,
    JavaScript,
    CSharp,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::JavaScript,
        Language::CSharp,
    ];

    /// Judge0 language id
    pub fn judge_id(&self) -> u32 {
        match self {
            Language::Python => 71,     // Python 3
            Language::Java => 62,       // Java 13
            Language::Cpp => 54,        // C++ 17
            Language::C => 50,          // C (GCC 9.2.0)
            Language::JavaScript => 63, // Node.js
            Language::CSharp => 51,     // C# Mono
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::JavaScript => "javascript",
            Language::CSharp => "csharp",
        }
    }

    /// Resolve a human-readable language name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.iter().copied().find(|lang| lang.as_str() == name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Payload for one remote execution. Source and stdin travel as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    #[serde(rename = "cpu_time_limit")]
    pub cpu_time_limit_seconds: u32,
    #[serde(rename = "memory_limit")]
    pub memory_limit_kb: u32,
}

impl ExecutionRequest {
    pub fn new(source_code: impl Into<String>, language: Language, stdin: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            language_id: language.judge_id(),
            stdin: stdin.into(),
            cpu_time_limit_seconds: CPU_TIME_LIMIT_SECONDS,
            memory_limit_kb: MEMORY_LIMIT_KB,
        }
    }
}

/// Normalized result of one remote execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub status_id: i32,
    pub status_label: String,
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    pub time_seconds: f64,
    pub memory_kb: u64,
    pub succeeded: bool,
}

impl ExecutionOutcome {
    /// Derives `status_label` and `succeeded` from the status code
    pub fn new(
        status_id: i32,
        stdout: String,
        stderr: String,
        compile_output: String,
        time_seconds: f64,
        memory_kb: u64,
    ) -> Self {
        Self {
            status_id,
            status_label: status_label(status_id).to_string(),
            stdout,
            stderr,
            compile_output,
            time_seconds,
            memory_kb,
            succeeded: status_id == ACCEPTED_STATUS_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub input_format: String,
    pub expected_output: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub input_format: String,
    pub expected_output: String,
}

/// Persisted submission status: `Correct`, `Incorrect`, or the judge's failure label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SubmissionStatus {
    Correct,
    Incorrect,
    Failed(String),
}

impl SubmissionStatus {
    pub fn label(&self) -> &str {
        match self {
            SubmissionStatus::Correct => "Correct",
            SubmissionStatus::Incorrect => "Incorrect",
            SubmissionStatus::Failed(label) => label,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for SubmissionStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Correct" => SubmissionStatus::Correct,
            "Incorrect" => SubmissionStatus::Incorrect,
            _ => SubmissionStatus::Failed(label),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(status: SubmissionStatus) -> Self {
        status.label().to_string()
    }
}

/// Submission row before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub user_id: u64,
    pub challenge_id: u64,
    pub code: String,
    pub input_data: String,
    pub output: String,
    pub expected_output: String,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    pub user_id: u64,
    pub challenge_id: u64,
    pub code: String,
    pub input_data: String,
    pub output: String,
    pub expected_output: String,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub language: Language,
}

impl Submission {
    pub fn from_new(id: u64, new: NewSubmission) -> Self {
        Self {
            id,
            user_id: new.user_id,
            challenge_id: new.challenge_id,
            code: new.code,
            input_data: new.input_data,
            output: new.output,
            expected_output: new.expected_output,
            submitted_at: new.submitted_at,
            status: new.status,
            language: new.language,
        }
    }
}

/// Client-facing result of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub submission_id: u64,
    pub success: bool,
    /// Judge status label, or the failure label when the judge gave no verdict
    pub status: String,
    /// Status written to the submission row
    pub recorded_status: SubmissionStatus,
    pub output: String,
    pub is_correct: bool,
    pub execution_time: String,
    pub memory_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_output: Option<String>,
}
