//! Per-font ordered rating submission.
//!
//! Writes for the same (user, prompt, font) never overlap and never land
//! out of order: each slot has its own lock, and a write that is still
//! waiting when a newer one for the same slot arrives is dropped.
//!
//! Every write for a (user, prompt) holds that prompt's gate shared. A
//! reset holds it exclusively through [`SubmissionQueue::lock_prompt`], so
//! it waits for writes already in flight and writes queued behind it can
//! be discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fonteval_core::rating::RatingRecord;
use fonteval_db::{FeedbackStore, StoreError, UpsertOutcome};
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};

type GateKey = (String, String);

#[derive(Default)]
struct Slot {
    /// Highest sequence submitted for this slot.
    latest: AtomicU64,
    in_flight: Mutex<()>,
}

/// Writes for one (user, prompt).
#[derive(Default)]
struct PromptGate {
    writes: Arc<RwLock<()>>,
    /// Writes numbered at or below this were cleared by a reset.
    discarded_through: AtomicU64,
    /// Slots with a write in flight or queued, by font key.
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl PromptGate {
    async fn claim(&self, font_key: &str, sequence: u64) -> Arc<Slot> {
        let mut slots = self.slots.lock().await;
        let slot = Arc::clone(slots.entry(font_key.to_string()).or_default());
        slot.latest.fetch_max(sequence, Ordering::SeqCst);
        slot
    }

    /// Forget the slot once no newer write for it is waiting.
    async fn release(&self, font_key: &str, sequence: u64) {
        let mut slots = self.slots.lock().await;
        if slots
            .get(font_key)
            .is_some_and(|slot| slot.latest.load(Ordering::SeqCst) == sequence)
        {
            slots.remove(font_key);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Stored(UpsertOutcome),
    /// A newer write for the same font replaced this one before it ran.
    Superseded,
    /// A reset of the prompt cleared this write before it ran.
    Discarded,
}

/// Exclusive hold on a prompt's writes; see [`SubmissionQueue::lock_prompt`].
pub struct PromptLock {
    gate: Arc<PromptGate>,
    _writes: OwnedRwLockWriteGuard<()>,
}

impl PromptLock {
    /// Drop every write numbered at or below `sequence` that has not run
    /// yet. Takes effect for writes that resume after this lock is released.
    pub fn discard_through(&self, sequence: u64) {
        self.gate
            .discarded_through
            .fetch_max(sequence, Ordering::SeqCst);
    }
}

pub struct SubmissionQueue {
    store: Arc<dyn FeedbackStore>,
    gates: Mutex<HashMap<GateKey, Arc<PromptGate>>>,
}

impl SubmissionQueue {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self {
            store,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Submit `record` as write number `sequence` for its slot.
    ///
    /// Sequences must increase with submission order.
    pub async fn submit(
        &self,
        record: &RatingRecord,
        sequence: u64,
    ) -> Result<SubmitOutcome, StoreError> {
        let gate = self.gate_for(&record.username, &record.prompt_name).await;
        let slot = gate.claim(&record.font_key, sequence).await;
        let result = self.write(&gate, &slot, record, sequence).await;
        gate.release(&record.font_key, sequence).await;
        result
    }

    /// Wait for every write in flight for (`username`, `prompt`) and hold
    /// off new ones until the returned lock is dropped.
    pub async fn lock_prompt(&self, username: &str, prompt: &str) -> PromptLock {
        let gate = self.gate_for(username, prompt).await;
        let writes = Arc::clone(&gate.writes).write_owned().await;
        PromptLock {
            gate,
            _writes: writes,
        }
    }

    /// Number of fonts with a write in flight or queued for the prompt.
    pub async fn pending_slots(&self, username: &str, prompt: &str) -> usize {
        let gate = self.gate_for(username, prompt).await;
        let slots = gate.slots.lock().await;
        slots.len()
    }

    async fn write(
        &self,
        gate: &PromptGate,
        slot: &Slot,
        record: &RatingRecord,
        sequence: u64,
    ) -> Result<SubmitOutcome, StoreError> {
        let _open = gate.writes.read().await;
        let _in_flight = slot.in_flight.lock().await;

        if gate.discarded_through.load(Ordering::SeqCst) >= sequence {
            tracing::debug!(font_key = %record.font_key, sequence, "Dropping rating write cleared by reset");
            return Ok(SubmitOutcome::Discarded);
        }
        if slot.latest.load(Ordering::SeqCst) > sequence {
            tracing::debug!(font_key = %record.font_key, sequence, "Dropping superseded rating write");
            return Ok(SubmitOutcome::Superseded);
        }

        let outcome = self.store.upsert(record).await?;
        Ok(SubmitOutcome::Stored(outcome))
    }

    async fn gate_for(&self, username: &str, prompt: &str) -> Arc<PromptGate> {
        let key = (username.to_string(), prompt.to_string());
        Arc::clone(self.gates.lock().await.entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use async_trait::async_trait;
    use fonteval_core::rating::UserFeedback;
    use fonteval_core::score::Score;

    /// Records upserts in arrival order; the first call is slow.
    #[derive(Default)]
    struct SlowFirstStore {
        writes: Mutex<Vec<Score>>,
    }

    #[async_trait]
    impl FeedbackStore for SlowFirstStore {
        async fn list_for_user(&self, _username: &str) -> Result<UserFeedback, StoreError> {
            Ok(UserFeedback::new())
        }

        async fn upsert(&self, record: &RatingRecord) -> Result<UpsertOutcome, StoreError> {
            let first = self.writes.lock().await.is_empty();
            if first {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.writes.lock().await.push(record.score);
            Ok(UpsertOutcome { is_new: first })
        }

        async fn delete_prompt(&self, _username: &str, _prompt: &str) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    fn record(score: Score) -> RatingRecord {
        RatingRecord {
            prompt_id: None,
            prompt_name: "p".into(),
            font_key: "k".into(),
            family_name: "K".into(),
            score,
            reason: if score.requires_reason() { "r".into() } else { String::new() },
            username: "alice".into(),
            email: String::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn later_write_lands_last() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = Arc::new(SubmissionQueue::new(store.clone()));

        let q = Arc::clone(&queue);
        let first = tokio::spawn(async move { q.submit(&record(Score::GoodMatch), 1).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = queue.submit(&record(Score::BadMatch), 2).await.unwrap();

        assert!(matches!(first.await.unwrap().unwrap(), SubmitOutcome::Stored(_)));
        assert!(matches!(second, SubmitOutcome::Stored(_)));
        assert_eq!(*store.writes.lock().await, vec![Score::GoodMatch, Score::BadMatch]);
    }

    #[tokio::test]
    async fn queued_write_superseded_by_newer() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = Arc::new(SubmissionQueue::new(store.clone()));

        let q1 = Arc::clone(&queue);
        let first = tokio::spawn(async move { q1.submit(&record(Score::GoodMatch), 1).await });
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Both wait behind the slow first write; only the newest runs.
        let q2 = Arc::clone(&queue);
        let second = tokio::spawn(async move { q2.submit(&record(Score::AverageMatch), 2).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let third = queue.submit(&record(Score::BadMatch), 3).await.unwrap();

        first.await.unwrap().unwrap();
        assert_eq!(second.await.unwrap().unwrap(), SubmitOutcome::Superseded);
        assert!(matches!(third, SubmitOutcome::Stored(_)));
        assert_eq!(*store.writes.lock().await, vec![Score::GoodMatch, Score::BadMatch]);
        assert_eq!(queue.pending_slots("alice", "p").await, 0);
    }

    #[tokio::test]
    async fn finished_slots_are_released() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = SubmissionQueue::new(store);

        for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
            let mut r = record(Score::GoodMatch);
            r.font_key = key.into();
            queue.submit(&r, i as u64 + 1).await.unwrap();
        }
        assert_eq!(queue.pending_slots("alice", "p").await, 0);
    }

    #[tokio::test]
    async fn prompt_lock_waits_for_write_in_flight() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = Arc::new(SubmissionQueue::new(store.clone()));

        let q = Arc::clone(&queue);
        let write = tokio::spawn(async move { q.submit(&record(Score::GoodMatch), 1).await });
        tokio::time::sleep(Duration::from_millis(5)).await;

        let lock = queue.lock_prompt("alice", "p").await;
        // The slow write finished before the lock was granted.
        assert_eq!(*store.writes.lock().await, vec![Score::GoodMatch]);
        drop(lock);
        assert!(matches!(write.await.unwrap().unwrap(), SubmitOutcome::Stored(_)));
    }

    #[tokio::test]
    async fn writes_queued_behind_reset_are_discarded() {
        let store = Arc::new(SlowFirstStore::default());
        let queue = Arc::new(SubmissionQueue::new(store.clone()));

        let lock = queue.lock_prompt("alice", "p").await;
        let q1 = Arc::clone(&queue);
        let cleared = tokio::spawn(async move { q1.submit(&record(Score::GoodMatch), 1).await });
        let q2 = Arc::clone(&queue);
        let mut later = record(Score::BadMatch);
        later.font_key = "other".into();
        let kept = tokio::spawn(async move { q2.submit(&later, 2).await });
        tokio::time::sleep(Duration::from_millis(5)).await;

        lock.discard_through(1);
        drop(lock);

        assert_eq!(cleared.await.unwrap().unwrap(), SubmitOutcome::Discarded);
        assert!(matches!(kept.await.unwrap().unwrap(), SubmitOutcome::Stored(_)));
        assert_eq!(*store.writes.lock().await, vec![Score::BadMatch]);
    }
}
