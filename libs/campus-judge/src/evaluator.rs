/// Submission Evaluator - Correctness Policy
///
/// **Core Responsibility:**
/// Decide the persisted status of a submission from the judge's verdict and
/// the challenge's expected output.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP
/// - Knows nothing about Redis
/// - Pure function: (judge outcome, expected output) → verdict
///
/// **Rules:**
/// - Correct iff the judge accepted the run AND trimmed stdout equals the
///   trimmed expected output
/// - Accepted but different output → Incorrect
/// - Any other judge status → that status label (Compilation Error, ...)
/// - No verdict at all (judge unreachable / rejected) → the failure label
///
/// **Normalization Rules:**
/// - Trim leading and trailing whitespace: YES
/// - Internal whitespace: significant
/// - Case sensitivity: YES (exact match required)

use crate::error::ExecutionError;
use campus_common::types::{ExecutionOutcome, SubmissionStatus};

/// Status and correctness of one evaluated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: SubmissionStatus,
    pub is_correct: bool,
}

/// Normalize output string for comparison
///
/// **Preserves:**
/// - Internal whitespace
/// - Case sensitivity
/// - Empty lines within content
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

/// Apply the correctness policy to a judge outcome
pub fn judge_outcome(outcome: &ExecutionOutcome, expected_output: &str) -> Verdict {
    if !outcome.succeeded {
        return Verdict {
            status: SubmissionStatus::Failed(outcome.status_label.clone()),
            is_correct: false,
        };
    }

    if outputs_match(&outcome.stdout, expected_output) {
        Verdict {
            status: SubmissionStatus::Correct,
            is_correct: true,
        }
    } else {
        Verdict {
            status: SubmissionStatus::Incorrect,
            is_correct: false,
        }
    }
}

/// Verdict for an attempt the judge never ran
pub fn judge_failure(error: &ExecutionError) -> Verdict {
    Verdict {
        status: SubmissionStatus::Failed(error.kind.label().to_string()),
        is_correct: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_common::types::status_label;

    fn make_outcome(status_id: i32, stdout: &str) -> ExecutionOutcome {
        ExecutionOutcome::new(status_id, stdout.to_string(), String::new(), String::new(), 0.01, 1024)
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("  hello  "), "hello");
        assert_eq!(normalize_output("hello\n"), "hello");
        assert_eq!(normalize_output("\r\nhello\r\n"), "hello");
        assert_eq!(normalize_output("  hello world  \n"), "hello world");
        assert_eq!(normalize_output(""), "");
        assert_eq!(normalize_output("   "), "");
    }

    #[test]
    fn test_expected_output_with_trailing_newline() {
        let verdict = judge_outcome(&make_outcome(3, "Hello"), "Hello\n");
        assert_eq!(verdict.status, SubmissionStatus::Correct);
        assert!(verdict.is_correct);
    }

    #[test]
    fn test_accepted_with_mismatch_is_incorrect() {
        let verdict = judge_outcome(&make_outcome(3, "actual"), "expected");
        assert_eq!(verdict.status, SubmissionStatus::Incorrect);
        assert!(!verdict.is_correct);
    }

    #[test]
    fn test_internal_whitespace_is_significant() {
        let verdict = judge_outcome(&make_outcome(3, "1  2"), "1 2");
        assert_eq!(verdict.status, SubmissionStatus::Incorrect);
    }

    #[test]
    fn test_case_sensitivity() {
        let verdict = judge_outcome(&make_outcome(3, "hello"), "Hello");
        assert_eq!(verdict.status, SubmissionStatus::Incorrect);
    }

    #[test]
    fn test_multiline_output() {
        let verdict = judge_outcome(&make_outcome(3, "line1\nline2\nline3\n"), "line1\nline2\nline3");
        assert!(verdict.is_correct);
    }

    #[test]
    fn test_empty_expected_output() {
        let verdict = judge_outcome(&make_outcome(3, "   \n"), "");
        assert!(verdict.is_correct);
    }

    #[test]
    fn test_non_accepted_status_uses_judge_label() {
        // Output matching is irrelevant once the run itself failed
        for status_id in [1, 2, 4, 5, 6, 7, 11, 13, 14, 99] {
            let verdict = judge_outcome(&make_outcome(status_id, "Hello"), "Hello");
            assert!(!verdict.is_correct);
            assert_eq!(
                verdict.status,
                SubmissionStatus::Failed(status_label(status_id).to_string())
            );
        }
    }

    #[test]
    fn test_compilation_error_label() {
        let verdict = judge_outcome(&make_outcome(6, ""), "anything");
        assert_eq!(verdict.status.label(), "Compilation Error");
    }

    #[test]
    fn test_judge_failure_labels() {
        let verdict = judge_failure(&ExecutionError::rejected("no token"));
        assert_eq!(verdict.status.label(), "Judge Rejected");
        assert!(!verdict.is_correct);

        let verdict = judge_failure(&ExecutionError::unreachable("connection refused"));
        assert_eq!(verdict.status.label(), "Judge Unreachable");
    }
}
