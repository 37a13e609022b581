use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::database::Database;
use crate::ids::next_id;
use crate::models::{Record, RecordId};

use super::{
    Backend, BatchOutcome, BoxFuture, FailureReason, Latency, RecordFailure, StoreResult, pause,
};

/// Collection held in memory for the process lifetime and written through to SQLite.
///
/// Every mutation builds the next collection, persists it, and only then swaps it in, so a
/// failed write leaves the in-memory state unchanged.
pub struct LocalBackend<R: Record> {
    db: Arc<Database>,
    records: Mutex<Vec<R>>,
    latency: Latency,
}

impl<R: Record> LocalBackend<R> {
    /// Loads the stored collection, falling back to `seed` when nothing was stored yet.
    pub fn open(db: Arc<Database>, seed: Vec<R>, latency: Latency) -> StoreResult<Self> {
        let records = match db.load_collection(R::STORAGE_KEY)? {
            Some(raw) => {
                let records: Vec<R> = serde_json::from_str(&raw)?;
                tracing::debug!(kind = R::KIND, count = records.len(), "Loaded stored collection.");
                records
            }
            None => {
                tracing::info!(kind = R::KIND, count = seed.len(), "No stored collection, using bundled defaults.");
                seed
            }
        };

        Ok(Self {
            db,
            records: Mutex::new(records),
            latency,
        })
    }

    fn persist(&self, records: &[R]) -> StoreResult<()> {
        let raw = serde_json::to_string(records)?;
        self.db.save_collection(R::STORAGE_KEY, &raw)?;
        tracing::debug!(kind = R::KIND, count = records.len(), "Persisted collection.");
        Ok(())
    }

    fn insert(records: &mut Vec<R>, draft: R::Draft, now: DateTime<Utc>) -> StoreResult<R> {
        let record = R::from_draft(next_id(records), draft, now)?;
        records.push(record.clone());
        Ok(record)
    }

    fn modify(records: &mut [R], id: RecordId, patch: R::Patch, now: DateTime<Utc>) -> Option<R> {
        let record = records.iter_mut().find(|record| record.id() == id)?;
        record.apply_patch(patch, now);
        Some(record.clone())
    }

    fn remove(records: &mut Vec<R>, id: RecordId) -> bool {
        match records.iter().position(|record| record.id() == id) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<R: Record> Backend<R> for LocalBackend<R> {
    fn get_all(&self) -> BoxFuture<'_, StoreResult<Vec<R>>> {
        Box::pin(async move {
            pause(self.latency.get_all).await;
            Ok(self.records.lock().await.clone())
        })
    }

    fn get_by_id(&self, id: RecordId) -> BoxFuture<'_, StoreResult<Option<R>>> {
        Box::pin(async move {
            pause(self.latency.get_by_id).await;
            let records = self.records.lock().await;
            Ok(records.iter().find(|record| record.id() == id).cloned())
        })
    }

    fn create(&self, draft: R::Draft, now: DateTime<Utc>) -> BoxFuture<'_, StoreResult<R>> {
        Box::pin(async move {
            pause(self.latency.create).await;
            let mut records = self.records.lock().await;
            let mut next = records.clone();
            let created = Self::insert(&mut next, draft, now)?;
            self.persist(&next)?;
            *records = next;
            tracing::info!(kind = R::KIND, id = created.id(), "Created record.");
            Ok(created)
        })
    }

    fn update(
        &self,
        id: RecordId,
        patch: R::Patch,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<R>>> {
        Box::pin(async move {
            pause(self.latency.update).await;
            let mut records = self.records.lock().await;
            let mut next = records.clone();
            let Some(updated) = Self::modify(&mut next, id, patch, now) else {
                return Ok(None);
            };
            self.persist(&next)?;
            *records = next;
            tracing::info!(kind = R::KIND, id, "Updated record.");
            Ok(Some(updated))
        })
    }

    fn delete(&self, id: RecordId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            pause(self.latency.delete).await;
            let mut records = self.records.lock().await;
            let mut next = records.clone();
            if !Self::remove(&mut next, id) {
                return Ok(false);
            }
            self.persist(&next)?;
            *records = next;
            tracing::info!(kind = R::KIND, id, "Deleted record.");
            Ok(true)
        })
    }

    fn create_many(
        &self,
        drafts: Vec<R::Draft>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<BatchOutcome<R>>> {
        Box::pin(async move {
            pause(self.latency.create).await;
            let mut records = self.records.lock().await;
            let mut next = records.clone();
            let mut outcome = BatchOutcome::default();
            for (index, draft) in drafts.into_iter().enumerate() {
                match Self::insert(&mut next, draft, now) {
                    Ok(record) => outcome.succeeded.push(record),
                    Err(err) => outcome.failed.push(RecordFailure {
                        index,
                        id: None,
                        reason: FailureReason::Rejected(err.to_string()),
                    }),
                }
            }
            if !outcome.succeeded.is_empty() {
                self.persist(&next)?;
                *records = next;
            }
            Ok(outcome)
        })
    }

    fn update_many(
        &self,
        changes: Vec<(RecordId, R::Patch)>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<BatchOutcome<R>>> {
        Box::pin(async move {
            pause(self.latency.update).await;
            let mut records = self.records.lock().await;
            let mut next = records.clone();
            let mut outcome = BatchOutcome::default();
            for (index, (id, patch)) in changes.into_iter().enumerate() {
                match Self::modify(&mut next, id, patch, now) {
                    Some(record) => outcome.succeeded.push(record),
                    None => outcome.failed.push(RecordFailure {
                        index,
                        id: Some(id),
                        reason: FailureReason::NotFound,
                    }),
                }
            }
            if !outcome.succeeded.is_empty() {
                self.persist(&next)?;
                *records = next;
            }
            Ok(outcome)
        })
    }

    fn delete_many(&self, ids: Vec<RecordId>) -> BoxFuture<'_, StoreResult<BatchOutcome<RecordId>>> {
        Box::pin(async move {
            pause(self.latency.delete).await;
            let mut records = self.records.lock().await;
            let mut next = records.clone();
            let mut outcome = BatchOutcome::default();
            for (index, id) in ids.into_iter().enumerate() {
                if Self::remove(&mut next, id) {
                    outcome.succeeded.push(id);
                } else {
                    outcome.failed.push(RecordFailure {
                        index,
                        id: Some(id),
                        reason: FailureReason::NotFound,
                    });
                }
            }
            if !outcome.succeeded.is_empty() {
                self.persist(&next)?;
                *records = next;
            }
            Ok(outcome)
        })
    }
}
