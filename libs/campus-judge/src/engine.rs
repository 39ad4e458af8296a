/// Judge Client - Remote Code Execution
///
/// **Core Responsibility:**
/// Send source code to the remote judge and turn its answer into an
/// `ExecutionOutcome`.
///
/// **Boundary:**
/// - Knows HOW to talk to the judge (Judge0 HTTP API)
/// - Does NOT know expected outputs or correctness rules
/// - Does NOT touch storage
///
/// Failures are returned as `ExecutionError`, never panics, so the caller can
/// still record the attempt.

use crate::error::ExecutionError;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use campus_common::config::JudgeConfig;
use campus_common::types::{is_pending_status, ExecutionOutcome, ExecutionRequest};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Execution seam: the evaluator only sees this trait
#[async_trait]
pub trait Judge: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecutionError>;
}

#[derive(Debug, Deserialize)]
struct CreatedSubmission {
    #[serde(default)]
    token: Option<String>,
}

/// Judge0 submission as returned with `base64_encoded=true`
#[derive(Debug, Default, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub memory: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawStatus {
    #[serde(default)]
    pub id: Option<i32>,
}

/// HTTP client for a Judge0-compatible service
#[derive(Debug, Clone)]
pub struct Judge0Client {
    client: reqwest::Client,
    config: JudgeConfig,
}

impl Judge0Client {
    pub fn new(config: JudgeConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.header(CONTENT_TYPE, "application/json");
        if let Some(key) = &self.config.api_key {
            builder = builder.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.config.api_host {
            builder = builder.header("X-RapidAPI-Host", host);
        }
        builder
    }

    /// POST /submissions, returns the job token
    async fn create_submission(&self, request: &ExecutionRequest) -> Result<String, ExecutionError> {
        let url = format!("{}/submissions", self.config.base_url);

        let response = self
            .with_headers(self.client.post(&url))
            .json(request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExecutionError::unreachable(format!("submission failed: {}", e)))?;

        let created: CreatedSubmission = response
            .json()
            .await
            .map_err(|e| ExecutionError::rejected(format!("unreadable submission response: {}", e)))?;

        created
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ExecutionError::rejected("judge returned no submission token"))
    }

    /// GET /submissions/{token} with base64-encoded output fields
    async fn fetch_submission(&self, token: &str) -> Result<RawSubmission, ExecutionError> {
        let url = format!("{}/submissions/{}", self.config.base_url, token);

        self.with_headers(self.client.get(&url))
            .query(&[("base64_encoded", "true"), ("fields", "*")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExecutionError::unreachable(format!("result retrieval failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ExecutionError::unreachable(format!("unreadable result: {}", e)))
    }
}

#[async_trait]
impl Judge for Judge0Client {
    /// Submit, wait, fetch.
    ///
    /// With the default `poll_attempts = 1` this is a single fixed wait then
    /// one fetch. With more attempts the wait doubles while the job is still
    /// In Queue / Processing. A job still pending after the last fetch is
    /// reported with that status rather than as an error.
    #[instrument(skip(self, request), fields(language_id = request.language_id))]
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecutionError> {
        let token = self.create_submission(request).await?;
        debug!(token = %token, "Submission accepted by judge");

        let mut delay = self.config.poll_delay;
        let mut attempt = 1;
        loop {
            tokio::time::sleep(delay).await;

            let outcome = normalize_result(self.fetch_submission(&token).await?);

            if !is_pending_status(outcome.status_id) || attempt >= self.config.poll_attempts {
                info!(
                    token = %token,
                    status = %outcome.status_label,
                    attempts = attempt,
                    time_seconds = outcome.time_seconds,
                    memory_kb = outcome.memory_kb,
                    "Judge verdict received"
                );
                return Ok(outcome);
            }

            debug!(token = %token, attempt, status = %outcome.status_label, "Job still pending");
            attempt += 1;
            delay = delay.saturating_mul(2);
        }
    }
}

/// Turn a raw Judge0 result into an `ExecutionOutcome`
///
/// - missing status → id 0 → "Unknown Status"
/// - output fields are base64-decoded; absent fields become ""
/// - `time` may arrive as a string ("0.012") or a number; absent → 0
pub fn normalize_result(raw: RawSubmission) -> ExecutionOutcome {
    let status_id = raw.status.and_then(|s| s.id).unwrap_or(0);

    ExecutionOutcome::new(
        status_id,
        decode_output(raw.stdout.as_deref()),
        decode_output(raw.stderr.as_deref()),
        decode_output(raw.compile_output.as_deref()),
        parse_time(raw.time.as_ref()),
        parse_memory(raw.memory.as_ref()),
    )
}

/// Decode one base64 output field
///
/// Line breaks inside the encoding are ignored. Invalid UTF-8 becomes U+FFFD.
/// Text that is not base64 at all is kept as-is.
pub fn decode_output(field: Option<&str>) -> String {
    let Some(encoded) = field.filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(error = %e, "Judge output is not valid base64; keeping raw text");
            encoded.to_string()
        }
    }
}

fn parse_time(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_memory(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(text: &str) -> String {
        general_purpose::STANDARD.encode(text)
    }

    #[test]
    fn test_decode_absent_field_is_empty() {
        assert_eq!(decode_output(None), "");
        assert_eq!(decode_output(Some("")), "");
    }

    #[test]
    fn test_decode_plain_base64() {
        assert_eq!(decode_output(Some(&encode("Hello\n"))), "Hello\n");
    }

    #[test]
    fn test_decode_ignores_line_wrapping() {
        // Judge0 wraps long base64 payloads at 60 columns
        let text = "a fairly long line of output that will wrap when encoded by the judge";
        let encoded = encode(text);
        let wrapped = format!("{}\n{}\n", &encoded[..60], &encoded[60..]);
        assert_eq!(decode_output(Some(&wrapped)), text);
    }

    #[test]
    fn test_decode_invalid_utf8_uses_replacement_char() {
        let encoded = general_purpose::STANDARD.encode([0x68, 0x69, 0xff, 0xfe]);
        assert_eq!(decode_output(Some(&encoded)), "hi\u{fffd}\u{fffd}");
    }

    #[test]
    fn test_decode_non_base64_keeps_raw_text() {
        assert_eq!(decode_output(Some("not base64!")), "not base64!");
    }

    #[test]
    fn test_normalize_accepted_result() {
        let raw: RawSubmission = serde_json::from_value(json!({
            "status": { "id": 3, "description": "Accepted" },
            "stdout": encode("42\n"),
            "stderr": null,
            "compile_output": null,
            "time": "0.012",
            "memory": 3180
        }))
        .unwrap();

        let outcome = normalize_result(raw);

        assert!(outcome.succeeded);
        assert_eq!(outcome.status_label, "Accepted");
        assert_eq!(outcome.stdout, "42\n");
        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.compile_output, "");
        assert_eq!(outcome.time_seconds, 0.012);
        assert_eq!(outcome.memory_kb, 3180);
    }

    #[test]
    fn test_normalize_compilation_error() {
        let raw: RawSubmission = serde_json::from_value(json!({
            "status": { "id": 6 },
            "compile_output": encode("main.c:1: error: expected ';'"),
        }))
        .unwrap();

        let outcome = normalize_result(raw);

        assert!(!outcome.succeeded);
        assert_eq!(outcome.status_label, "Compilation Error");
        assert_eq!(outcome.compile_output, "main.c:1: error: expected ';'");
        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.time_seconds, 0.0);
        assert_eq!(outcome.memory_kb, 0);
    }

    #[test]
    fn test_normalize_missing_or_unknown_status() {
        let outcome = normalize_result(RawSubmission::default());
        assert_eq!(outcome.status_id, 0);
        assert_eq!(outcome.status_label, "Unknown Status");
        assert!(!outcome.succeeded);

        let raw: RawSubmission = serde_json::from_value(json!({ "status": { "id": 42 } })).unwrap();
        assert_eq!(normalize_result(raw).status_label, "Unknown Status");
    }

    #[test]
    fn test_time_and_memory_parsing() {
        assert_eq!(parse_time(Some(&json!(0.5))), 0.5);
        assert_eq!(parse_time(Some(&json!("1.25"))), 1.25);
        assert_eq!(parse_time(Some(&json!("garbage"))), 0.0);
        assert_eq!(parse_time(Some(&Value::Null)), 0.0);
        assert_eq!(parse_memory(Some(&json!(2048))), 2048);
        assert_eq!(parse_memory(Some(&json!("512"))), 512);
        assert_eq!(parse_memory(None), 0);
    }
}
