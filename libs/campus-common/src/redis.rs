use crate::store::{Store, StoreError, StoreResult};
use crate::types::{Challenge, NewChallenge, NewSubmission, Submission};
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

// Redis key layout - the API and the CLI share these, so rows written by one
// are always readable by the other.
//
// - `campus:seq:*` are INCR counters handing out row ids
// - challenge and submission rows are JSON strings
// - `campus:challenges` is a ZSET scored by id (newest = highest)
// - per-user history is a LIST (LPUSH, newest first)
// - per-challenge submission ids are a SET, used for cascading deletes

pub const KEY_PREFIX: &str = "campus";
pub const CHALLENGE_SEQ_KEY: &str = "campus:seq:challenge";
pub const SUBMISSION_SEQ_KEY: &str = "campus:seq:submission";
pub const CHALLENGE_INDEX_KEY: &str = "campus:challenges";

// KEYS: challenge, submission row, user list, challenge set. ARGV: row, id.
// Writes nothing once the challenge is gone.
const INSERT_SUBMISSION_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('SET', KEYS[2], ARGV[1])
redis.call('LPUSH', KEYS[3], ARGV[2])
redis.call('SADD', KEYS[4], ARGV[2])
return 1
"#;

// KEYS: challenge, challenge set, challenge index. ARGV: id.
// Returns the submission ids that belonged to the challenge, or nil if absent.
const DETACH_CHALLENGE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
local ids = redis.call('SMEMBERS', KEYS[2])
redis.call('DEL', KEYS[1], KEYS[2])
redis.call('ZREM', KEYS[3], ARGV[1])
return ids
"#;

pub fn challenge_key(id: u64) -> String {
    format!("{}:challenge:{}", KEY_PREFIX, id)
}

pub fn challenge_submissions_key(challenge_id: u64) -> String {
    format!("{}:challenge:{}:submissions", KEY_PREFIX, challenge_id)
}

pub fn submission_key(id: u64) -> String {
    format!("{}:submission:{}", KEY_PREFIX, id)
}

pub fn user_submissions_key(user_id: u64) -> String {
    format!("{}:user:{}:submissions", KEY_PREFIX, user_id)
}

/// Redis-backed store. Multi-key writes go through MULTI/EXEC or a Lua script
/// so a failed write leaves nothing behind.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Fetch and decode many JSON rows at once; missing keys are skipped
    async fn load_rows<T: DeserializeOwned>(&self, keys: Vec<String>) -> StoreResult<Vec<T>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let payloads: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut rows = Vec::with_capacity(payloads.len());
        for (key, payload) in keys.iter().zip(payloads) {
            match payload {
                Some(data) => rows.push(serde_json::from_str(&data)?),
                None => warn!(key = %key, "Indexed row is missing"),
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get_challenge(&self, id: u64) -> StoreResult<Option<Challenge>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(challenge_key(id)).await?;

        match payload {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn list_challenges(&self) -> StoreResult<Vec<Challenge>> {
        let mut conn = self.conn.clone();
        let ids: Vec<u64> = conn.zrevrange(CHALLENGE_INDEX_KEY, 0, -1).await?;
        self.load_rows(ids.into_iter().map(challenge_key).collect())
            .await
    }

    async fn create_challenge(&self, challenge: NewChallenge) -> StoreResult<Challenge> {
        let mut conn = self.conn.clone();
        let id: u64 = conn.incr(CHALLENGE_SEQ_KEY, 1).await?;

        let created = Challenge {
            id,
            title: challenge.title,
            description: challenge.description,
            input_format: challenge.input_format,
            expected_output: challenge.expected_output,
            created_at: Utc::now(),
        };
        let payload = serde_json::to_string(&created)?;

        let _: () = redis::pipe()
            .atomic()
            .set(challenge_key(id), payload)
            .ignore()
            .zadd(CHALLENGE_INDEX_KEY, id, id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(challenge_id = id, "Challenge stored");
        Ok(created)
    }

    async fn delete_challenge(&self, id: u64) -> StoreResult<bool> {
        let mut conn = self.conn.clone();

        // Detach the challenge first: once it is gone no new submission can
        // be attached to it, so the id set below is complete.
        let detached: Option<Vec<u64>> = redis::Script::new(DETACH_CHALLENGE_SCRIPT)
            .key(challenge_key(id))
            .key(challenge_submissions_key(id))
            .key(CHALLENGE_INDEX_KEY)
            .arg(id)
            .invoke_async(&mut conn)
            .await?;

        let Some(submission_ids) = detached else {
            return Ok(false);
        };

        let submissions: Vec<Submission> = self
            .load_rows(submission_ids.iter().copied().map(submission_key).collect())
            .await?;

        if !submissions.is_empty() {
            let mut pipe = redis::pipe();
            pipe.atomic();
            for submission in &submissions {
                pipe.del(submission_key(submission.id))
                    .ignore()
                    .lrem(user_submissions_key(submission.user_id), 0, submission.id)
                    .ignore();
            }
            let _: () = pipe.query_async(&mut conn).await?;
        }

        debug!(
            challenge_id = id,
            removed_submissions = submissions.len(),
            "Challenge deleted"
        );
        Ok(true)
    }

    async fn insert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let mut conn = self.conn.clone();
        let id: u64 = conn.incr(SUBMISSION_SEQ_KEY, 1).await?;

        let stored = Submission::from_new(id, submission);
        let payload = serde_json::to_string(&stored)?;

        let written: i64 = redis::Script::new(INSERT_SUBMISSION_SCRIPT)
            .key(challenge_key(stored.challenge_id))
            .key(submission_key(id))
            .key(user_submissions_key(stored.user_id))
            .key(challenge_submissions_key(stored.challenge_id))
            .arg(payload)
            .arg(id)
            .invoke_async(&mut conn)
            .await?;

        if written == 0 {
            warn!(challenge_id = stored.challenge_id, "Challenge vanished before submission was stored");
            return Err(StoreError::ChallengeMissing(stored.challenge_id));
        }

        debug!(submission_id = id, status = %stored.status, "Submission stored");
        Ok(stored)
    }

    async fn list_user_submissions(&self, user_id: u64) -> StoreResult<Vec<Submission>> {
        let mut conn = self.conn.clone();
        let ids: Vec<u64> = conn.lrange(user_submissions_key(user_id), 0, -1).await?;
        self.load_rows(ids.into_iter().map(submission_key).collect())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, SubmissionStatus};

    #[test]
    fn test_key_naming() {
        assert_eq!(challenge_key(7), "campus:challenge:7");
        assert_eq!(submission_key(42), "campus:submission:42");
        assert_eq!(user_submissions_key(3), "campus:user:3:submissions");
        assert_eq!(challenge_submissions_key(7), "campus:challenge:7:submissions");
    }

    #[test]
    fn test_keys_are_deterministic() {
        assert_eq!(submission_key(9), submission_key(9));
        assert_ne!(challenge_key(9), challenge_submissions_key(9));
    }

    /// Requires a running Redis at REDIS_URL (or localhost)
    #[tokio::test]
    #[ignore]
    async fn test_redis_store_roundtrip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let store = RedisStore::connect(&url).await.expect("Failed to connect to Redis");

        let challenge = store
            .create_challenge(NewChallenge {
                title: "Echo".into(),
                description: "Echo the input".into(),
                input_format: "one line".into(),
                expected_output: "ping".into(),
            })
            .await
            .unwrap();

        let user_id = challenge.id + 1_000_000;
        let stored = store
            .insert_submission(NewSubmission {
                user_id,
                challenge_id: challenge.id,
                code: "print(input())".into(),
                input_data: "ping".into(),
                output: "ping\n".into(),
                expected_output: "ping".into(),
                submitted_at: Utc::now(),
                status: SubmissionStatus::Correct,
                language: Language::Python,
            })
            .await
            .unwrap();

        let history = store.list_user_submissions(user_id).await.unwrap();
        assert_eq!(history.first().map(|s| s.id), Some(stored.id));

        assert!(store.delete_challenge(challenge.id).await.unwrap());
        assert!(store.get_challenge(challenge.id).await.unwrap().is_none());
        assert!(store.list_user_submissions(user_id).await.unwrap().is_empty());
        assert!(!store.delete_challenge(challenge.id).await.unwrap());

        let late = store
            .insert_submission(NewSubmission {
                user_id,
                challenge_id: challenge.id,
                code: "print(input())".into(),
                input_data: "ping".into(),
                output: "ping\n".into(),
                expected_output: "ping".into(),
                submitted_at: Utc::now(),
                status: SubmissionStatus::Correct,
                language: Language::Python,
            })
            .await
            .unwrap_err();
        assert!(matches!(late, StoreError::ChallengeMissing(_)));
        assert!(store.list_user_submissions(user_id).await.unwrap().is_empty());
    }
}
