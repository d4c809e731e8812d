//! JSON-file feedback store.
//!
//! The whole store is one document of the form
//! `{ "<username>": { "<prompt>": [RatingRecord, ...] } }`. Every mutation
//! is a read-modify-write under an in-process lock, and the document is
//! replaced atomically by writing a sibling temp file and renaming it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fonteval_core::rating::{validate_rating, RatingRecord, UserFeedback};
use indexmap::IndexMap;
use tokio::sync::Mutex;

use crate::store::{require_username, FeedbackStore, StoreError, UpsertOutcome};

type FeedbackDocument = IndexMap<String, UserFeedback>;

pub struct FileFeedbackStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileFeedbackStore {
    /// Open the store at `path`.
    ///
    /// A missing, empty, or unparseable file is (re)initialized to `{}`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        match tokio::fs::read_to_string(&store.path).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(path = %store.path.display(), "Feedback file is empty, initializing");
                store.write_document(&FeedbackDocument::new()).await?;
            }
            Ok(text) => {
                if let Err(e) = serde_json::from_str::<FeedbackDocument>(&text) {
                    tracing::warn!(
                        path = %store.path.display(),
                        error = %e,
                        "Feedback file is not valid feedback JSON, reinitializing",
                    );
                    store.write_document(&FeedbackDocument::new()).await?;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %store.path.display(), "Feedback file missing, creating");
                store.write_document(&FeedbackDocument::new()).await?;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(path = %store.path.display(), "File feedback store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<FeedbackDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(FeedbackDocument::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FeedbackDocument::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &FeedbackDocument) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for FileFeedbackStore {
    async fn list_for_user(&self, username: &str) -> Result<UserFeedback, StoreError> {
        let username = require_username(username)?;
        let mut document = self.read_document().await?;
        Ok(document.shift_remove(username).unwrap_or_default())
    }

    async fn upsert(&self, record: &RatingRecord) -> Result<UpsertOutcome, StoreError> {
        validate_rating(record)?;
        let username = require_username(&record.username)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        let ratings = document
            .entry(username.to_string())
            .or_default()
            .entry(record.prompt_name.clone())
            .or_default();

        let is_new = match ratings.iter_mut().find(|r| r.font_key == record.font_key) {
            Some(existing) => {
                *existing = record.clone();
                false
            }
            None => {
                ratings.push(record.clone());
                true
            }
        };

        self.write_document(&document).await?;
        tracing::debug!(
            username = %username,
            prompt = %record.prompt_name,
            font_key = %record.font_key,
            is_new,
            "Feedback saved",
        );
        Ok(UpsertOutcome { is_new })
    }

    async fn delete_prompt(&self, username: &str, prompt: &str) -> Result<usize, StoreError> {
        let username = require_username(username)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        let removed = document
            .get_mut(username)
            .and_then(|prompts| prompts.shift_remove(prompt))
            .map(|ratings| ratings.len());

        let Some(removed) = removed else {
            return Ok(0);
        };
        self.write_document(&document).await?;
        tracing::info!(username = %username, prompt = %prompt, removed, "Prompt feedback deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use fonteval_core::error::CoreError;
    use fonteval_core::score::Score;

    fn record(user: &str, prompt: &str, key: &str, score: Score, reason: &str) -> RatingRecord {
        RatingRecord {
            prompt_id: None,
            prompt_name: prompt.into(),
            font_key: key.into(),
            family_name: format!("Family {key}"),
            score,
            reason: reason.into(),
            username: user.into(),
            email: String::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    async fn store() -> (tempfile::TempDir, FileFeedbackStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFeedbackStore::open(dir.path().join("feedback.json"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_missing_file() {
        let (_dir, store) = store().await;
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.trim(), "{}");
    }

    #[tokio::test]
    async fn open_reinitializes_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, "not json at all").unwrap();
        let store = FileFeedbackStore::open(&path).await.unwrap();
        assert!(store.list_for_user("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_twice_keeps_one_record() {
        let (_dir, store) = store().await;
        let r = record("alice", "p", "k1", Score::GoodMatch, "");
        assert!(store.upsert(&r).await.unwrap().is_new);
        assert!(!store.upsert(&r).await.unwrap().is_new);

        let feedback = store.list_for_user("alice").await.unwrap();
        assert_eq!(feedback["p"].len(), 1);
    }

    #[tokio::test]
    async fn rerating_replaces_in_place() {
        let (_dir, store) = store().await;
        store.upsert(&record("alice", "p", "k1", Score::GoodMatch, "")).await.unwrap();
        store.upsert(&record("alice", "p", "k2", Score::GoodMatch, "")).await.unwrap();
        store
            .upsert(&record("alice", "p", "k1", Score::BadMatch, "too narrow"))
            .await
            .unwrap();

        let feedback = store.list_for_user("alice").await.unwrap();
        let ratings = &feedback["p"];
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].font_key, "k1");
        assert_eq!(ratings[0].score, Score::BadMatch);
        assert_eq!(ratings[0].reason, "too narrow");
    }

    #[tokio::test]
    async fn users_are_partitioned() {
        let (_dir, store) = store().await;
        store.upsert(&record("alice", "p", "k1", Score::GoodMatch, "")).await.unwrap();
        store.upsert(&record("bob", "p", "k1", Score::BadMatch, "no")).await.unwrap();

        let alice = store.list_for_user("alice").await.unwrap();
        assert_eq!(alice["p"][0].score, Score::GoodMatch);
        assert!(store.list_for_user("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_prompt_only_touches_one_user() {
        let (_dir, store) = store().await;
        store.upsert(&record("alice", "p", "k1", Score::GoodMatch, "")).await.unwrap();
        store.upsert(&record("alice", "p", "k2", Score::GoodMatch, "")).await.unwrap();
        store.upsert(&record("alice", "q", "k1", Score::GoodMatch, "")).await.unwrap();
        store.upsert(&record("bob", "p", "k1", Score::GoodMatch, "")).await.unwrap();

        assert_eq!(store.delete_prompt("alice", "p").await.unwrap(), 2);

        let alice = store.list_for_user("alice").await.unwrap();
        assert!(!alice.contains_key("p"));
        assert!(alice.contains_key("q"));
        assert_eq!(store.list_for_user("bob").await.unwrap()["p"].len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_prompt_is_zero() {
        let (_dir, store) = store().await;
        assert_eq!(store.delete_prompt("alice", "nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_record_rejected() {
        let (_dir, store) = store().await;
        let result = store.upsert(&record("alice", "p", "k1", Score::AverageMatch, "")).await;
        assert_matches!(result, Err(StoreError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_username_rejected() {
        let (_dir, store) = store().await;
        assert_matches!(
            store.list_for_user("  ").await,
            Err(StoreError::Core(CoreError::Validation(_)))
        );
    }

    #[tokio::test]
    async fn concurrent_upserts_are_all_kept() {
        let (_dir, store) = store().await;
        let store = std::sync::Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .upsert(&record("alice", "p", &format!("k{i}"), Score::GoodMatch, ""))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.list_for_user("alice").await.unwrap()["p"].len(), 10);
    }

    #[tokio::test]
    async fn stored_file_uses_wire_shape() {
        let (_dir, store) = store().await;
        store
            .upsert(&record("alice", "fonts from helvetica", "abc", Score::AverageMatch, "meh"))
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let stored = &json["alice"]["fonts from helvetica"][0];
        assert_eq!(stored["md5"], "abc");
        assert_eq!(stored["score"], "Average Match");
        assert_eq!(stored["familyName"], "Family abc");
    }
}
