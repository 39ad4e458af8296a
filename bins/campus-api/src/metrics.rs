//! Process-wide prometheus registry served on `/metrics`.
use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("campus_submissions_total", "Evaluated submissions by stored status"),
        &["status"]
    )
    .expect("metric can be created");
    pub static ref JUDGE_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("campus_judge_failures_total", "Submissions the judge produced no verdict for"),
        &["kind"]
    )
    .expect("metric can be created");
    pub static ref EVALUATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("campus_evaluation_seconds", "Time spent evaluating one submission")
            .buckets(vec![0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0])
    )
    .expect("metric can be created");
}

pub fn register() -> prometheus::Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
        Box::new(SUBMISSIONS_TOTAL.clone()),
        Box::new(JUDGE_FAILURES_TOTAL.clone()),
        Box::new(EVALUATION_SECONDS.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

pub fn encode() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        register().unwrap();
        register().unwrap();
    }

    #[test]
    fn test_encode_lists_submission_counter() {
        register().unwrap();
        SUBMISSIONS_TOTAL.with_label_values(&["Correct"]).inc();

        let text = encode().unwrap();
        assert!(text.contains("campus_submissions_total"));
        assert!(text.contains("status=\"Correct\""));
    }
}
