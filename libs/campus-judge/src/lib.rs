//! Coding-challenge evaluation: remote judge client, correctness policy and
//! the submission pipeline that ties them to storage.

pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;


pub use engine::{Judge, Judge0Client};
pub use error::{EvaluationError, ExecutionError, ExecutionErrorKind};
pub use executor::{evaluate, SubmitCode};
