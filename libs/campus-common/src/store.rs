//! Storage seam for the challenge catalog and the submission log
//!
//! The evaluator only needs `get_challenge` and `insert_submission`; the rest
//! backs the catalog endpoints and the CLI. Production uses `RedisStore`
//! (see `redis.rs`), tests use `MemoryStore`.

use crate::types::{Challenge, NewChallenge, NewSubmission, Submission};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("challenge {0} no longer exists")]
    ChallengeMissing(u64),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_challenge(&self, id: u64) -> StoreResult<Option<Challenge>>;

    /// Newest first
    async fn list_challenges(&self) -> StoreResult<Vec<Challenge>>;

    async fn create_challenge(&self, challenge: NewChallenge) -> StoreResult<Challenge>;

    /// Removes the challenge and every submission made against it.
    /// Returns false when the challenge did not exist.
    async fn delete_challenge(&self, id: u64) -> StoreResult<bool>;

    /// Append one submission row; all-or-nothing. Fails with
    /// `ChallengeMissing` when the challenge was deleted in the meantime.
    async fn insert_submission(&self, submission: NewSubmission) -> StoreResult<Submission>;

    /// Newest first
    async fn list_user_submissions(&self, user_id: u64) -> StoreResult<Vec<Submission>>;
}

#[derive(Default)]
struct MemoryState {
    challenges: BTreeMap<u64, Challenge>,
    submissions: Vec<Submission>,
    next_challenge_id: u64,
    next_submission_id: u64,
}

/// In-process store; ids start at 1 like the Redis sequences
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All submissions in insertion order
    pub fn submissions(&self) -> StoreResult<Vec<Submission>> {
        Ok(self.lock()?.submissions.clone())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_challenge(&self, id: u64) -> StoreResult<Option<Challenge>> {
        Ok(self.lock()?.challenges.get(&id).cloned())
    }

    async fn list_challenges(&self) -> StoreResult<Vec<Challenge>> {
        let state = self.lock()?;
        let mut challenges: Vec<Challenge> = state.challenges.values().cloned().collect();
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(challenges)
    }

    async fn create_challenge(&self, challenge: NewChallenge) -> StoreResult<Challenge> {
        let mut state = self.lock()?;
        state.next_challenge_id += 1;
        let created = Challenge {
            id: state.next_challenge_id,
            title: challenge.title,
            description: challenge.description,
            input_format: challenge.input_format,
            expected_output: challenge.expected_output,
            created_at: Utc::now(),
        };
        state.challenges.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_challenge(&self, id: u64) -> StoreResult<bool> {
        let mut state = self.lock()?;
        state.submissions.retain(|s| s.challenge_id != id);
        Ok(state.challenges.remove(&id).is_some())
    }

    async fn insert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let mut state = self.lock()?;
        if !state.challenges.contains_key(&submission.challenge_id) {
            return Err(StoreError::ChallengeMissing(submission.challenge_id));
        }
        state.next_submission_id += 1;
        let stored = Submission::from_new(state.next_submission_id, submission);
        state.submissions.push(stored.clone());
        Ok(stored)
    }

    async fn list_user_submissions(&self, user_id: u64) -> StoreResult<Vec<Submission>> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, SubmissionStatus};

    fn new_challenge(title: &str) -> NewChallenge {
        NewChallenge {
            title: title.to_string(),
            description: "Print a greeting".to_string(),
            input_format: "none".to_string(),
            expected_output: "Hello".to_string(),
        }
    }

    fn new_submission(user_id: u64, challenge_id: u64) -> NewSubmission {
        NewSubmission {
            user_id,
            challenge_id,
            code: "print('Hello')".to_string(),
            input_data: String::new(),
            output: "Hello\n".to_string(),
            expected_output: "Hello".to_string(),
            submitted_at: Utc::now(),
            status: SubmissionStatus::Correct,
            language: Language::Python,
        }
    }

    #[tokio::test]
    async fn test_memory_store_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store.create_challenge(new_challenge("a")).await.unwrap();
        let second = store.create_challenge(new_challenge("b")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let listed = store.list_challenges().await.unwrap();
        assert_eq!(listed[0].id, 2, "newest challenge first");
    }

    #[tokio::test]
    async fn test_memory_store_delete_cascades_to_submissions() {
        let store = MemoryStore::new();
        let keep = store.create_challenge(new_challenge("keep")).await.unwrap();
        let removed = store.create_challenge(new_challenge("drop")).await.unwrap();
        store.insert_submission(new_submission(7, keep.id)).await.unwrap();
        store.insert_submission(new_submission(7, removed.id)).await.unwrap();

        assert!(store.delete_challenge(removed.id).await.unwrap());
        assert!(!store.delete_challenge(removed.id).await.unwrap());

        let remaining = store.list_user_submissions(7).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].challenge_id, keep.id);
    }

    #[tokio::test]
    async fn test_memory_store_user_history_is_newest_first() {
        let store = MemoryStore::new();
        let challenge = store.create_challenge(new_challenge("c")).await.unwrap();
        let first = store.insert_submission(new_submission(1, challenge.id)).await.unwrap();
        let second = store.insert_submission(new_submission(1, challenge.id)).await.unwrap();
        store.insert_submission(new_submission(2, challenge.id)).await.unwrap();

        let history = store.list_user_submissions(1).await.unwrap();
        let ids: Vec<u64> = history.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_submission_for_deleted_challenge() {
        let store = MemoryStore::new();
        let challenge = store.create_challenge(new_challenge("gone")).await.unwrap();
        assert!(store.delete_challenge(challenge.id).await.unwrap());

        let err = store
            .insert_submission(new_submission(3, challenge.id))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ChallengeMissing(id) if id == challenge.id));
        assert!(store.submissions().unwrap().is_empty());
    }
}
